//! Capability-gated speech capture and playback.
//!
//! The host injects a [`SpeechRecognizer`] and/or a [`SpeechSynthesizer`] when
//! the platform supports them. Absence is an explicit `None`, which leaves the
//! corresponding adapter permanently disabled instead of erroring.
//!
//! Capture follows a two-state machine:
//! - Idle -> Capturing (start)
//! - Capturing -> Idle (transcript delivered, error, or stop)

use std::fmt;
use std::sync::Arc;

use counselor_core::Language;
use tokio::sync::mpsc;

use crate::error::ChatError;

// =============================================================================
// Capability interfaces
// =============================================================================

/// Event emitted by a recognizer for the capture it was started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Transcript(String),
    Error(String),
}

/// Platform speech capture.
///
/// `start` must not block; results are delivered on `events`. After `stop`
/// the recognizer may still send, but those events are discarded.
pub trait SpeechRecognizer: Send + Sync {
    fn start(
        &self,
        locale: &str,
        events: mpsc::UnboundedSender<RecognitionEvent>,
    ) -> Result<(), ChatError>;

    fn stop(&self);
}

/// Platform speech synthesis. `speak` must return without waiting for playback.
pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, text: &str, locale: &str) -> Result<(), ChatError>;
}

// =============================================================================
// Capture state machine
// =============================================================================

/// Operational state of speech capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureState {
    /// Not capturing. Ready to start.
    #[default]
    Idle,
    /// Waiting for the recognizer to deliver a transcript.
    Capturing,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "Idle"),
            CaptureState::Capturing => write!(f, "Capturing"),
        }
    }
}

impl CaptureState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &CaptureState) -> bool {
        matches!(
            (self, target),
            (CaptureState::Idle, CaptureState::Capturing)
                | (CaptureState::Capturing, CaptureState::Idle)
        )
    }
}

/// How a capture ended.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// Non-empty transcript, ready to be submitted as typed text.
    Transcript(String),
    /// The recognizer failed or delivered nothing usable.
    Failed(ChatError),
}

// =============================================================================
// SpeechInput
// =============================================================================

/// Speech capture adapter owned by the conversation controller.
pub struct SpeechInput {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    state: CaptureState,
    events: Option<mpsc::UnboundedReceiver<RecognitionEvent>>,
}

impl fmt::Debug for SpeechInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechInput")
            .field("available", &self.is_available())
            .field("state", &self.state)
            .finish()
    }
}

impl Default for SpeechInput {
    fn default() -> Self {
        Self::unavailable()
    }
}

impl SpeechInput {
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>) -> Self {
        Self {
            recognizer,
            state: CaptureState::Idle,
            events: None,
        }
    }

    pub fn with_recognizer(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self::new(Some(recognizer))
    }

    /// Adapter for a host without speech capture.
    pub fn unavailable() -> Self {
        Self::new(None)
    }

    /// Whether the host provides speech capture. The mic control should be
    /// disabled when this is false.
    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    /// Begin capturing in `language`'s locale.
    ///
    /// Returns `true` if a capture started. Unavailable capability, an
    /// already-running capture, or a recognizer refusing to start are no-ops.
    pub fn start(&mut self, language: Language) -> bool {
        let Some(recognizer) = self.recognizer.clone() else {
            tracing::debug!("Speech capture unavailable, ignoring start");
            return false;
        };
        if self.is_capturing() {
            tracing::debug!("Speech capture already running, ignoring start");
            return false;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        if let Err(e) = recognizer.start(language.locale(), tx) {
            tracing::debug!(error = %e, "Speech recognizer refused to start");
            return false;
        }
        self.events = Some(rx);
        self.transition(CaptureState::Capturing);
        tracing::info!(locale = language.locale(), "Speech capture started");
        true
    }

    /// Cancel the running capture. Any transcript still in flight is dropped.
    pub fn stop(&mut self) -> bool {
        if !self.is_capturing() {
            return false;
        }
        if let Some(recognizer) = &self.recognizer {
            recognizer.stop();
        }
        self.finish();
        tracing::info!("Speech capture stopped");
        true
    }

    /// Wait for the running capture to end.
    ///
    /// Pends forever while no capture is running, so it can sit in a
    /// `select!` alongside other event sources.
    pub async fn next_outcome(&mut self) -> CaptureOutcome {
        let event = match self.events.as_mut() {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        };
        self.finish();

        match event {
            Some(RecognitionEvent::Transcript(text)) if !text.trim().is_empty() => {
                tracing::debug!(len = text.len(), "Speech transcript received");
                CaptureOutcome::Transcript(text.trim().to_string())
            }
            Some(RecognitionEvent::Transcript(_)) => {
                tracing::debug!("Speech capture produced an empty transcript");
                CaptureOutcome::Failed(ChatError::RecognitionError("empty transcript".to_string()))
            }
            Some(RecognitionEvent::Error(reason)) => {
                tracing::debug!(%reason, "Speech capture failed");
                CaptureOutcome::Failed(ChatError::RecognitionError(reason))
            }
            None => {
                tracing::debug!("Speech recognizer ended without a result");
                CaptureOutcome::Failed(ChatError::RecognitionError(
                    "recognizer closed without a result".to_string(),
                ))
            }
        }
    }

    fn finish(&mut self) {
        self.events = None;
        if self.is_capturing() {
            self.transition(CaptureState::Idle);
        }
    }

    fn transition(&mut self, target: CaptureState) {
        debug_assert!(self.state.can_transition_to(&target));
        tracing::debug!("Capture state: {} -> {}", self.state, target);
        self.state = target;
    }
}

impl Drop for SpeechInput {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// SpeechOutput
// =============================================================================

/// Fire-and-forget speech playback adapter.
#[derive(Clone, Default)]
pub struct SpeechOutput {
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl fmt::Debug for SpeechOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechOutput")
            .field("available", &self.is_available())
            .finish()
    }
}

impl SpeechOutput {
    pub fn new(synthesizer: Option<Arc<dyn SpeechSynthesizer>>) -> Self {
        Self { synthesizer }
    }

    pub fn with_synthesizer(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self::new(Some(synthesizer))
    }

    pub fn unavailable() -> Self {
        Self::new(None)
    }

    pub fn is_available(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Narrate `text` in `language`. Silent no-op when unavailable; synthesis
    /// errors are logged and swallowed.
    pub fn speak(&self, text: &str, language: Language) {
        let Some(synthesizer) = &self.synthesizer else {
            return;
        };
        if let Err(e) = synthesizer.speak(text, language.locale()) {
            tracing::debug!(error = %e, "Speech synthesis failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Recognizer that records calls and hands its sender to the test.
    #[derive(Default)]
    struct ManualRecognizer {
        locales: Mutex<Vec<String>>,
        sender: Mutex<Option<mpsc::UnboundedSender<RecognitionEvent>>>,
        stops: Mutex<usize>,
        refuse: bool,
    }

    impl ManualRecognizer {
        fn emit(&self, event: RecognitionEvent) {
            if let Some(tx) = self.sender.lock().unwrap().as_ref() {
                let _ = tx.send(event);
            }
        }
    }

    impl SpeechRecognizer for ManualRecognizer {
        fn start(
            &self,
            locale: &str,
            events: mpsc::UnboundedSender<RecognitionEvent>,
        ) -> Result<(), ChatError> {
            if self.refuse {
                return Err(ChatError::RecognitionError("not-allowed".to_string()));
            }
            self.locales.lock().unwrap().push(locale.to_string());
            *self.sender.lock().unwrap() = Some(events);
            Ok(())
        }

        fn stop(&self) {
            *self.stops.lock().unwrap() += 1;
        }
    }

    #[derive(Default)]
    struct RecordingSynthesizer {
        spoken: Mutex<Vec<(String, String)>>,
    }

    impl SpeechSynthesizer for RecordingSynthesizer {
        fn speak(&self, text: &str, locale: &str) -> Result<(), ChatError> {
            self.spoken
                .lock()
                .unwrap()
                .push((text.to_string(), locale.to_string()));
            Ok(())
        }
    }

    struct BrokenSynthesizer;

    impl SpeechSynthesizer for BrokenSynthesizer {
        fn speak(&self, _text: &str, _locale: &str) -> Result<(), ChatError> {
            Err(ChatError::SynthesisError("no voice installed".to_string()))
        }
    }

    #[test]
    fn test_capture_state_transitions() {
        assert!(CaptureState::Idle.can_transition_to(&CaptureState::Capturing));
        assert!(CaptureState::Capturing.can_transition_to(&CaptureState::Idle));
        assert!(!CaptureState::Idle.can_transition_to(&CaptureState::Idle));
        assert!(!CaptureState::Capturing.can_transition_to(&CaptureState::Capturing));
        assert_eq!(CaptureState::Capturing.to_string(), "Capturing");
    }

    #[test]
    fn test_unavailable_input_is_a_no_op() {
        let mut input = SpeechInput::unavailable();
        assert!(!input.is_available());
        assert!(!input.start(Language::En));
        assert_eq!(input.state(), CaptureState::Idle);
        assert!(!input.stop());
    }

    #[test]
    fn test_start_uses_language_locale() {
        let recognizer = Arc::new(ManualRecognizer::default());
        let mut input = SpeechInput::with_recognizer(recognizer.clone());
        assert!(input.start(Language::Hi));
        assert!(input.is_capturing());
        assert_eq!(*recognizer.locales.lock().unwrap(), vec!["hi-IN".to_string()]);
    }

    #[test]
    fn test_start_while_capturing_is_a_no_op() {
        let recognizer = Arc::new(ManualRecognizer::default());
        let mut input = SpeechInput::with_recognizer(recognizer.clone());
        assert!(input.start(Language::En));
        assert!(!input.start(Language::En));
        assert_eq!(recognizer.locales.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_refused_start_stays_idle() {
        let recognizer = Arc::new(ManualRecognizer {
            refuse: true,
            ..Default::default()
        });
        let mut input = SpeechInput::with_recognizer(recognizer);
        assert!(!input.start(Language::En));
        assert_eq!(input.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_transcript_completes_capture() {
        let recognizer = Arc::new(ManualRecognizer::default());
        let mut input = SpeechInput::with_recognizer(recognizer.clone());
        input.start(Language::En);
        recognizer.emit(RecognitionEvent::Transcript("  career advice ".to_string()));

        match input.next_outcome().await {
            CaptureOutcome::Transcript(text) => assert_eq!(text, "career advice"),
            other => panic!("expected transcript, got {:?}", other),
        }
        assert_eq!(input.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_error_resets_to_idle() {
        let recognizer = Arc::new(ManualRecognizer::default());
        let mut input = SpeechInput::with_recognizer(recognizer.clone());
        input.start(Language::En);
        recognizer.emit(RecognitionEvent::Error("no-speech".to_string()));

        let outcome = input.next_outcome().await;
        assert!(matches!(
            outcome,
            CaptureOutcome::Failed(ChatError::RecognitionError(ref r)) if r == "no-speech"
        ));
        assert_eq!(input.state(), CaptureState::Idle);
        // Capture can be restarted afterwards.
        assert!(input.start(Language::En));
    }

    #[tokio::test]
    async fn test_empty_transcript_is_a_failure() {
        let recognizer = Arc::new(ManualRecognizer::default());
        let mut input = SpeechInput::with_recognizer(recognizer.clone());
        input.start(Language::En);
        recognizer.emit(RecognitionEvent::Transcript("   ".to_string()));
        assert!(matches!(input.next_outcome().await, CaptureOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_stop_discards_late_transcript() {
        let recognizer = Arc::new(ManualRecognizer::default());
        let mut input = SpeechInput::with_recognizer(recognizer.clone());
        input.start(Language::En);
        assert!(input.stop());
        assert_eq!(*recognizer.stops.lock().unwrap(), 1);
        assert_eq!(input.state(), CaptureState::Idle);

        recognizer.emit(RecognitionEvent::Transcript("too late".to_string()));
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), input.next_outcome()).await;
        assert!(waited.is_err(), "stopped capture must not yield an outcome");
    }

    #[test]
    fn test_drop_stops_running_capture() {
        let recognizer = Arc::new(ManualRecognizer::default());
        {
            let mut input = SpeechInput::with_recognizer(recognizer.clone());
            input.start(Language::En);
        }
        assert_eq!(*recognizer.stops.lock().unwrap(), 1);
    }

    #[test]
    fn test_speech_output_uses_locale() {
        let synth = Arc::new(RecordingSynthesizer::default());
        let output = SpeechOutput::with_synthesizer(synth.clone());
        output.speak("नमस्ते", Language::Hi);
        output.speak("hello", Language::En);
        let spoken = synth.spoken.lock().unwrap();
        assert_eq!(spoken[0], ("नमस्ते".to_string(), "hi-IN".to_string()));
        assert_eq!(spoken[1], ("hello".to_string(), "en-US".to_string()));
    }

    #[test]
    fn test_speech_output_absent_or_failing_is_silent() {
        SpeechOutput::unavailable().speak("hello", Language::En);
        SpeechOutput::with_synthesizer(Arc::new(BrokenSynthesizer)).speak("hello", Language::En);
        assert!(!SpeechOutput::unavailable().is_available());
    }
}
