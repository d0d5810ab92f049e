//! Bilingual conversational assistant.
//!
//! Provides the conversation controller, keyword intent classification, the
//! canned bilingual reply catalog, best-effort remote dispatch with a local
//! fallback, and capability-gated speech capture and playback.

pub mod catalog;
pub mod classifier;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod speech;
pub mod store;

pub use catalog::ResponseCatalog;
pub use classifier::IntentClassifier;
pub use controller::{ControllerEvent, ControllerOptions, ConversationController, ConversationState};
pub use dispatcher::{
    Credential, CredentialSource, DispatchOutcome, EnvCredential, HttpReplyClient, RemoteDispatcher,
    ReplyBody, ReplyClient, ReplyRequest, StaticCredential,
};
pub use error::ChatError;
pub use speech::{
    CaptureOutcome, CaptureState, RecognitionEvent, SpeechInput, SpeechOutput, SpeechRecognizer,
    SpeechSynthesizer,
};
pub use store::{MessageDraft, MessageStore};
