//! Speech capabilities backed by external programs.
//!
//! Both adapters take an argv from `[speech]` in the config and append the
//! BCP-47 locale tag as the final argument.

use std::process::Stdio;
use std::sync::Mutex;

use counselor_chat::{ChatError, RecognitionEvent, SpeechRecognizer, SpeechSynthesizer};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn split_argv(argv: &[String]) -> Result<(String, Vec<String>), ChatError> {
    match argv.split_first() {
        Some((program, args)) if !program.trim().is_empty() => {
            Ok((program.clone(), args.to_vec()))
        }
        _ => Err(ChatError::Config("speech command must not be empty".to_string())),
    }
}

// =============================================================================
// Recognizer
// =============================================================================

/// Runs a capture program per listening session. The first line it prints is
/// the transcript.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    running: Mutex<Option<JoinHandle<()>>>,
}

impl CommandRecognizer {
    pub fn from_argv(argv: &[String]) -> Result<Self, ChatError> {
        let (program, args) = split_argv(argv)?;
        Ok(Self {
            program,
            args,
            running: Mutex::new(None),
        })
    }

    async fn capture(mut command: Command) -> RecognitionEvent {
        let output = match command.output().await {
            Ok(output) => output,
            Err(e) => return RecognitionEvent::Error(format!("failed to run recognizer: {}", e)),
        };
        if !output.status.success() {
            return RecognitionEvent::Error(format!("recognizer exited with {}", output.status));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        match stdout.lines().next().map(str::trim) {
            Some(line) if !line.is_empty() => RecognitionEvent::Transcript(line.to_string()),
            _ => RecognitionEvent::Error("recognizer produced no transcript".to_string()),
        }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn start(
        &self,
        locale: &str,
        events: mpsc::UnboundedSender<RecognitionEvent>,
    ) -> Result<(), ChatError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ChatError::RecognitionError(e.to_string()))?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(locale)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!(program = %self.program, locale, "Starting recognizer command");
        let task = runtime.spawn(async move {
            let event = Self::capture(command).await;
            let _ = events.send(event);
        });

        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = running.replace(task) {
            previous.abort();
        }
        Ok(())
    }

    fn stop(&self) {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = running.take() {
            // Dropping the aborted future kills the child.
            task.abort();
            tracing::debug!(program = %self.program, "Recognizer command cancelled");
        }
    }
}

// =============================================================================
// Synthesizer
// =============================================================================

/// Pipes text to a playback program's stdin without waiting for it to finish.
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
}

impl CommandSynthesizer {
    pub fn from_argv(argv: &[String]) -> Result<Self, ChatError> {
        let (program, args) = split_argv(argv)?;
        Ok(Self { program, args })
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn speak(&self, text: &str, locale: &str) -> Result<(), ChatError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ChatError::SynthesisError(e.to_string()))?;
        // `spawn` needs the runtime's reactor for the child's pipes.
        let _guard = runtime.enter();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(locale)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ChatError::SynthesisError(format!("failed to run synthesizer: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ChatError::SynthesisError("synthesizer stdin unavailable".to_string()))?;
        let text = text.to_string();
        let program = self.program.clone();
        runtime.spawn(async move {
            if let Err(e) = stdin.write_all(text.as_bytes()).await {
                tracing::debug!(%program, error = %e, "Failed to write to synthesizer");
            }
            drop(stdin);
            match child.wait().await {
                Ok(status) if !status.success() => {
                    tracing::debug!(%program, %status, "Synthesizer exited with failure")
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(%program, error = %e, "Synthesizer did not finish"),
            }
        });
        Ok(())
    }
}
