//! Error types for the conversational assistant.

use std::time::Duration;

use counselor_core::error::CounselorError;

/// Errors from the assistant core.
///
/// None of these reach the end user. Dispatch failures are absorbed by the
/// local fallback, recognition failures reset capture silently, and redundant
/// submissions are dropped.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("submission ignored: {reason}")]
    RedundantSubmission { reason: &'static str },
    #[error("no credential available for the reply endpoint")]
    CredentialMissing,
    #[error("transport failure: {0}")]
    TransportFailure(String),
    #[error("reply endpoint returned status {status}")]
    ServerError { status: u16 },
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("malformed reply: {0}")]
    MalformedReply(String),
    #[error("reply endpoint returned an empty response")]
    EmptyReply,
    #[error("speech recognition error: {0}")]
    RecognitionError(String),
    #[error("speech synthesis error: {0}")]
    SynthesisError(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl ChatError {
    /// Whether this error routes the turn to the local fallback reply.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            ChatError::CredentialMissing
                | ChatError::TransportFailure(_)
                | ChatError::ServerError { .. }
                | ChatError::Timeout(_)
                | ChatError::MalformedReply(_)
                | ChatError::EmptyReply
        )
    }
}

impl From<CounselorError> for ChatError {
    fn from(err: CounselorError) -> Self {
        ChatError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::RedundantSubmission {
                reason: "reply pending"
            }
            .to_string(),
            "submission ignored: reply pending"
        );
        assert_eq!(
            ChatError::CredentialMissing.to_string(),
            "no credential available for the reply endpoint"
        );
        assert_eq!(
            ChatError::TransportFailure("connection refused".to_string()).to_string(),
            "transport failure: connection refused"
        );
        assert_eq!(
            ChatError::ServerError { status: 502 }.to_string(),
            "reply endpoint returned status 502"
        );
        assert_eq!(
            ChatError::Timeout(Duration::from_millis(250)).to_string(),
            "no reply within 250ms"
        );
        assert_eq!(
            ChatError::RecognitionError("no-speech".to_string()).to_string(),
            "speech recognition error: no-speech"
        );
    }

    #[test]
    fn test_dispatch_failures_trigger_fallback() {
        let failures = vec![
            ChatError::CredentialMissing,
            ChatError::TransportFailure("dns".to_string()),
            ChatError::ServerError { status: 500 },
            ChatError::Timeout(Duration::from_secs(1)),
            ChatError::MalformedReply("missing field `response`".to_string()),
            ChatError::EmptyReply,
        ];
        for err in failures {
            assert!(err.triggers_fallback(), "{} should fall back", err);
        }
    }

    #[test]
    fn test_local_errors_do_not_trigger_fallback() {
        assert!(!ChatError::EmptyMessage.triggers_fallback());
        assert!(!ChatError::RedundantSubmission { reason: "busy" }.triggers_fallback());
        assert!(!ChatError::RecognitionError("aborted".to_string()).triggers_fallback());
        assert!(!ChatError::SynthesisError("no voice".to_string()).triggers_fallback());
    }

    #[test]
    fn test_chat_error_from_counselor_error() {
        let err: ChatError = CounselorError::Config("bad endpoint".to_string()).into();
        assert!(matches!(err, ChatError::Config(_)));
        assert!(err.to_string().contains("bad endpoint"));
    }
}
