//! Counselor application binary - terminal host for one conversation.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Build the remote dispatcher and optional command-backed speech
//! 3. Open the conversation and interleave typed lines with controller events

mod cli;
mod platform;

use std::sync::Arc;

use clap::Parser;
use counselor_chat::{
    ControllerEvent, ControllerOptions, ConversationController, RemoteDispatcher, SpeechInput,
    SpeechOutput, SpeechRecognizer, SpeechSynthesizer,
};
use counselor_core::{Category, CounselorConfig, Message, MessageId, Sender};
use tokio::io::{AsyncBufReadExt, BufReader};

use cli::{CliArgs, HostCommand, HELP};
use platform::{CommandRecognizer, CommandSynthesizer};

fn print_message(message: &Message) {
    let who = match message.sender {
        Sender::User => "you",
        Sender::Assistant => "counselor",
    };
    println!("[{}] {}: {}", message.id, who, message.text);
}

fn print_topics() {
    for (i, category) in Category::SUPPORT_TOPICS.iter().enumerate() {
        println!("  /topic {}  {}", i + 1, category.label());
    }
}

fn build_speech(config: &CounselorConfig) -> (SpeechInput, SpeechOutput) {
    let recognizer = config.speech.recognizer_command.as_deref().and_then(|argv| {
        match CommandRecognizer::from_argv(argv) {
            Ok(r) => Some(Arc::new(r) as Arc<dyn SpeechRecognizer>),
            Err(e) => {
                tracing::warn!(error = %e, "Speech capture disabled");
                None
            }
        }
    });
    let synthesizer = config.speech.synthesizer_command.as_deref().and_then(|argv| {
        match CommandSynthesizer::from_argv(argv) {
            Ok(s) => Some(Arc::new(s) as Arc<dyn SpeechSynthesizer>),
            Err(e) => {
                tracing::warn!(error = %e, "Speech playback disabled");
                None
            }
        }
    });
    (SpeechInput::new(recognizer), SpeechOutput::new(synthesizer))
}

/// Apply one typed line. Returns `false` when the host should close.
fn handle_line(controller: &mut ConversationController, line: &str) -> bool {
    let command = match line.parse::<HostCommand>() {
        Ok(command) => command,
        Err(e) => {
            println!("{}", e);
            return true;
        }
    };

    match command {
        HostCommand::Submit(text) => {
            if controller.is_awaiting_reply() {
                println!("(still waiting for a reply)");
            } else if controller.submit(&text).is_some() {
                println!("counselor is typing...");
            }
        }
        HostCommand::Language(target) => {
            match target {
                Some(language) => controller.set_language(language),
                None => {
                    controller.toggle_language();
                }
            }
            println!("language: {}", controller.language());
            println!("({})", controller.placeholder());
        }
        HostCommand::Topic(category) => {
            if let Some(message) = controller.submit_topic(category) {
                print_message(&message);
                println!("counselor is typing...");
            }
        }
        HostCommand::Speak(id) => {
            let spoken = match id {
                Some(id) => controller.speak_message(MessageId(id)),
                None => controller.speak_last(),
            };
            if !spoken {
                println!("(nothing to read aloud)");
            }
        }
        HostCommand::Listen => {
            if !controller.speech_input_available() {
                println!("(speech input is not configured)");
            } else if controller.start_listening() {
                println!("listening...");
            }
        }
        HostCommand::Stop => {
            if controller.stop_listening() {
                println!("(stopped listening)");
            }
        }
        HostCommand::Retry => {
            if let Some(message) = controller.retry() {
                print_message(&message);
                println!("counselor is typing...");
            }
        }
        HostCommand::History => controller.messages().iter().for_each(print_message),
        HostCommand::Help => {
            println!("{}", HELP);
            print_topics();
        }
        HostCommand::Close => return false,
    }
    true
}

fn handle_event(event: ControllerEvent) {
    match event {
        ControllerEvent::ReplyAppended { message, fallback } => {
            tracing::debug!(id = %message.id, fallback, "Reply rendered");
            print_message(&message);
        }
        ControllerEvent::TranscriptSubmitted(message) => {
            print_message(&message);
            println!("counselor is typing...");
        }
        ControllerEvent::CaptureEnded => println!("(didn't catch that)"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = CounselorConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Counselor v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");
    config.validate()?;

    // Dispatcher.
    let dispatcher = RemoteDispatcher::from_config(&config.remote)?;
    tracing::info!(
        endpoint = %config.remote.endpoint,
        timeout_ms = config.remote.timeout_ms,
        "Remote dispatcher ready"
    );

    // Speech.
    let (speech_input, speech_output) = build_speech(&config);

    let mut controller =
        ConversationController::open(ControllerOptions::from(&config.assistant), dispatcher)
            .with_speech_input(speech_input)
            .with_speech_output(speech_output);

    println!("{}", HELP);
    print_topics();
    controller.messages().iter().for_each(print_message);
    println!("({})", controller.placeholder());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !handle_line(&mut controller, &line) {
                        break;
                    }
                }
                None => break,
            },
            event = controller.next_event() => handle_event(event),
        }
    }

    controller.close();
    Ok(())
}
