//! Conversation controller: one open assistant widget.
//!
//! Owns the message log, the active language and the turn state machine:
//! - Idle -> AwaitingReply (submission accepted, user message appended)
//! - AwaitingReply -> Idle (assistant message appended)
//!
//! The controller runs on the host's event loop. Remote dispatch happens on a
//! spawned task that reports back over a channel; the controller only mutates
//! state when the host drives it via [`ConversationController::next_event`] or
//! [`ConversationController::settle`]. Dropping the controller aborts any
//! in-flight dispatch, so nothing is appended after close.

use std::fmt;

use counselor_core::config::AssistantConfig;
use counselor_core::{Category, Language, Message, MessageId, Sender};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::catalog::ResponseCatalog;
use crate::classifier::IntentClassifier;
use crate::dispatcher::{DispatchOutcome, RemoteDispatcher};
use crate::error::ChatError;
use crate::speech::{CaptureOutcome, CaptureState, SpeechInput, SpeechOutput};
use crate::store::{MessageDraft, MessageStore};

/// Turn state of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingReply,
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationState::Idle => write!(f, "Idle"),
            ConversationState::AwaitingReply => write!(f, "AwaitingReply"),
        }
    }
}

impl ConversationState {
    pub fn can_transition_to(&self, target: &ConversationState) -> bool {
        matches!(
            (self, target),
            (ConversationState::Idle, ConversationState::AwaitingReply)
                | (ConversationState::AwaitingReply, ConversationState::Idle)
        )
    }
}

/// Per-widget options.
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub language: Language,
    pub greeting: bool,
    pub auto_speak: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from(&AssistantConfig::default())
    }
}

impl From<&AssistantConfig> for ControllerOptions {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            language: config.default_language,
            greeting: config.greeting,
            auto_speak: config.auto_speak,
        }
    }
}

/// Something the controller did in response to an asynchronous source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A pending turn settled and its assistant message was appended.
    ReplyAppended { message: Message, fallback: bool },
    /// A speech transcript was accepted as a user message.
    TranscriptSubmitted(Message),
    /// A speech capture ended without producing a submission.
    CaptureEnded,
}

/// Dispatch result routed back to the controller.
struct SettledTurn {
    turn: u64,
    outcome: DispatchOutcome,
}

struct PendingTurn {
    turn: u64,
    text: String,
    language: Language,
    task: JoinHandle<()>,
}

enum Wake {
    Reply(SettledTurn),
    Speech(CaptureOutcome),
}

/// Orchestrates submissions, replies, language switching and speech for one
/// open conversation.
pub struct ConversationController {
    id: Uuid,
    store: MessageStore,
    state: ConversationState,
    language: Language,
    auto_speak: bool,
    dispatcher: RemoteDispatcher,
    speech_input: SpeechInput,
    speech_output: SpeechOutput,
    settled_tx: mpsc::UnboundedSender<SettledTurn>,
    settled_rx: mpsc::UnboundedReceiver<SettledTurn>,
    pending: Option<PendingTurn>,
    turns: u64,
}

impl fmt::Debug for ConversationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationController")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("language", &self.language)
            .field("messages", &self.store.len())
            .field("speech_input", &self.speech_input)
            .field("speech_output", &self.speech_output)
            .finish()
    }
}

impl ConversationController {
    /// Open a conversation. Speech capabilities start out absent; attach them
    /// with [`with_speech_input`](Self::with_speech_input) and
    /// [`with_speech_output`](Self::with_speech_output).
    pub fn open(options: ControllerOptions, dispatcher: RemoteDispatcher) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let controller = Self {
            id: Uuid::new_v4(),
            store: MessageStore::new(),
            state: ConversationState::Idle,
            language: options.language,
            auto_speak: options.auto_speak,
            dispatcher,
            speech_input: SpeechInput::unavailable(),
            speech_output: SpeechOutput::unavailable(),
            settled_tx,
            settled_rx,
            pending: None,
            turns: 0,
        };

        if options.greeting {
            let greeting = ResponseCatalog::greeting(options.language);
            if let Err(e) = controller
                .store
                .append(MessageDraft::assistant(greeting, options.language))
            {
                tracing::warn!(error = %e, "Failed to seed greeting");
            }
        }

        tracing::info!(
            conversation = %controller.id,
            language = %controller.language,
            "Conversation opened"
        );
        controller
    }

    pub fn with_speech_input(mut self, speech_input: SpeechInput) -> Self {
        self.speech_input = speech_input;
        self
    }

    pub fn with_speech_output(mut self, speech_output: SpeechOutput) -> Self {
        self.speech_output = speech_output;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// Drives the typing indicator.
    pub fn is_awaiting_reply(&self) -> bool {
        self.state == ConversationState::AwaitingReply
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Another handle to the message log for rendering.
    pub fn store(&self) -> MessageStore {
        self.store.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.store.all()
    }

    pub fn placeholder(&self) -> &'static str {
        ResponseCatalog::placeholder(self.language)
    }

    pub fn speech_input_available(&self) -> bool {
        self.speech_input.is_available()
    }

    pub fn speech_output_available(&self) -> bool {
        self.speech_output.is_available()
    }

    pub fn capture_state(&self) -> CaptureState {
        self.speech_input.state()
    }

    // -------------------------------------------------------------------------
    // Submissions
    // -------------------------------------------------------------------------

    /// Submit user text.
    ///
    /// On acceptance the user message is appended immediately, a dispatch is
    /// started and the appended message is returned. Blank text, or any
    /// submission while a reply is pending, is ignored and returns `None`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&mut self, raw_text: &str) -> Option<Message> {
        match self.accept(raw_text) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!(conversation = %self.id, error = %e, "Submission dropped");
                None
            }
        }
    }

    /// Submit the quick prompt for a support topic.
    pub fn submit_topic(&mut self, category: Category) -> Option<Message> {
        self.submit(&ResponseCatalog::quick_prompt(category))
    }

    /// Resubmit the most recent user message as a new turn.
    pub fn retry(&mut self) -> Option<Message> {
        let last = self.store.last_from(Sender::User)?;
        self.submit(&last.text)
    }

    fn accept(&mut self, raw_text: &str) -> Result<Message, ChatError> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(ChatError::RedundantSubmission {
                reason: "empty message",
            });
        }
        if self.state != ConversationState::Idle {
            return Err(ChatError::RedundantSubmission {
                reason: "reply pending",
            });
        }

        let language = self.language;
        let message = self.store.append(MessageDraft::user(text, language))?;
        self.transition(ConversationState::AwaitingReply);

        self.turns += 1;
        let turn = self.turns;
        let dispatcher = self.dispatcher.clone();
        let settled_tx = self.settled_tx.clone();
        let request = text.to_string();
        let task = tokio::spawn(async move {
            let outcome = dispatcher.dispatch(&request, language).await;
            let _ = settled_tx.send(SettledTurn { turn, outcome });
        });

        self.pending = Some(PendingTurn {
            turn,
            text: text.to_string(),
            language,
            task,
        });
        tracing::info!(conversation = %self.id, turn, %language, "Turn started");
        Ok(message)
    }

    // -------------------------------------------------------------------------
    // Settlement
    // -------------------------------------------------------------------------

    /// Wait for the next asynchronous event and apply it.
    ///
    /// Pends forever while no reply is outstanding and no capture is running,
    /// so hosts can `select!` on it alongside their own input.
    pub async fn next_event(&mut self) -> ControllerEvent {
        loop {
            let wake = tokio::select! {
                Some(settled) = self.settled_rx.recv() => Wake::Reply(settled),
                outcome = self.speech_input.next_outcome() => Wake::Speech(outcome),
            };

            match wake {
                Wake::Reply(settled) => {
                    if let Some(event) = self.apply_reply(settled) {
                        return event;
                    }
                }
                Wake::Speech(CaptureOutcome::Transcript(text)) => {
                    return match self.submit(&text) {
                        Some(message) => ControllerEvent::TranscriptSubmitted(message),
                        None => ControllerEvent::CaptureEnded,
                    };
                }
                Wake::Speech(CaptureOutcome::Failed(e)) => {
                    tracing::debug!(conversation = %self.id, error = %e, "Capture ended without input");
                    return ControllerEvent::CaptureEnded;
                }
            }
        }
    }

    /// Wait for the pending turn, if any, and return its assistant message.
    pub async fn settle(&mut self) -> Option<Message> {
        while self.is_awaiting_reply() {
            let settled = self.settled_rx.recv().await?;
            if let Some(ControllerEvent::ReplyAppended { message, .. }) = self.apply_reply(settled)
            {
                return Some(message);
            }
        }
        None
    }

    fn apply_reply(&mut self, settled: SettledTurn) -> Option<ControllerEvent> {
        let pending = match self.pending.take() {
            Some(p) if p.turn == settled.turn => p,
            other => {
                self.pending = other;
                tracing::debug!(turn = settled.turn, "Discarding stale reply");
                return None;
            }
        };

        let fallback = settled.outcome.is_fallback();
        let text = match settled.outcome {
            DispatchOutcome::Reply(text) => text,
            DispatchOutcome::Fallback(_) => {
                let category = IntentClassifier::classify(&pending.text, pending.language);
                tracing::debug!(turn = pending.turn, %category, "Using fallback reply");
                ResponseCatalog::lookup(pending.language, category).to_string()
            }
        };

        let message = match self
            .store
            .append(MessageDraft::assistant(text, pending.language))
        {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to append reply");
                self.transition(ConversationState::Idle);
                return None;
            }
        };
        self.transition(ConversationState::Idle);
        tracing::info!(
            conversation = %self.id,
            turn = pending.turn,
            fallback,
            "Turn settled"
        );

        if self.auto_speak {
            self.speech_output.speak(&message.text, self.language);
        }
        Some(ControllerEvent::ReplyAppended { message, fallback })
    }

    // -------------------------------------------------------------------------
    // Side channels
    // -------------------------------------------------------------------------

    /// Switch the language used for future messages, fallback replies and
    /// speech. Existing history is left as is.
    pub fn set_language(&mut self, language: Language) {
        if self.language != language {
            tracing::info!(conversation = %self.id, from = %self.language, to = %language, "Language switched");
            self.language = language;
        }
    }

    pub fn toggle_language(&mut self) -> Language {
        self.set_language(self.language.toggled());
        self.language
    }

    /// Narrate an assistant message in the active language.
    ///
    /// Returns `false` when nothing was handed to speech output: user
    /// messages, unknown ids, or no synthesizer attached.
    pub fn speak_message(&self, id: MessageId) -> bool {
        if !self.speech_output.is_available() {
            return false;
        }
        match self.store.get(id) {
            Some(message) if message.is_from_assistant() => {
                self.speech_output.speak(&message.text, self.language);
                true
            }
            _ => false,
        }
    }

    /// Narrate the latest assistant message.
    pub fn speak_last(&self) -> bool {
        match self.store.last_from(Sender::Assistant) {
            Some(message) => self.speak_message(message.id),
            None => false,
        }
    }

    pub fn start_listening(&mut self) -> bool {
        self.speech_input.start(self.language)
    }

    pub fn stop_listening(&mut self) -> bool {
        self.speech_input.stop()
    }

    /// Close the widget. Any pending reply is abandoned.
    pub fn close(self) {
        tracing::info!(
            conversation = %self.id,
            messages = self.store.len(),
            "Conversation closed"
        );
    }

    fn transition(&mut self, target: ConversationState) {
        debug_assert!(self.state.can_transition_to(&target));
        tracing::debug!("Conversation state: {} -> {}", self.state, target);
        self.state = target;
    }
}

impl Drop for ConversationController {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
            tracing::debug!(turn = pending.turn, "Abandoned pending turn");
        }
    }
}
