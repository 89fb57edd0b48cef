use lexchat::adapters::TungsteniteConnector;
use lexchat::app::{App, AppEvent, UserCommand};
use lexchat::backend::BackendClient;
use lexchat::cli::{help_text, parse_args, parse_input, usage, version_string, CliCommand, PromptInput};
use lexchat::config::ClientConfig;
use lexchat::models::{Message, Role, SessionEntry};

use color_eyre::Result;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_message(message: &Message) {
    let speaker = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    println!("[{}] {}", speaker, message.text);
}

fn print_catalog(entries: &[SessionEntry]) {
    if entries.is_empty() {
        println!("(no sessions)");
        return;
    }
    for entry in entries {
        println!(
            "  {}  {}  ({})",
            entry.id,
            entry.title,
            entry.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}

/// Render App events on stdout.
///
/// Fragments are printed as they arrive; the committed assistant message
/// only ends the line, since its text is already on screen.
/// The catalog is only listed when the user asked for it with `/sessions`.
async fn print_events(
    mut events: mpsc::UnboundedReceiver<AppEvent>,
    list_requested: Arc<AtomicBool>,
) {
    let mut streaming = false;
    while let Some(event) = events.recv().await {
        match event {
            AppEvent::Fragment(text) => {
                if !streaming {
                    print!("[assistant] ");
                    streaming = true;
                }
                print!("{}", text);
                let _ = std::io::stdout().flush();
            }
            AppEvent::MessageAppended(message) => {
                match message.role {
                    Role::Assistant if streaming => println!(),
                    // Already echoed at the prompt
                    Role::User => {}
                    Role::Assistant => print_message(&message),
                }
                streaming = false;
            }
            AppEvent::Status(status) => println!("-- {}", status),
            AppEvent::Error(error) => {
                if streaming {
                    println!();
                    streaming = false;
                }
                println!("!! {}", error);
            }
            AppEvent::SessionChanged(Some(id)) => println!("-- session {}", id),
            AppEvent::SessionChanged(None) => println!("-- new conversation"),
            AppEvent::CatalogUpdated(_) => {}
            AppEvent::SessionsRefreshed(entries) => {
                if list_requested.swap(false, Ordering::SeqCst) {
                    print_catalog(&entries);
                }
            }
            AppEvent::Transcript(messages) => {
                streaming = false;
                for message in &messages {
                    print_message(message);
                }
            }
        }
    }
}

/// Read prompt lines from stdin and forward them to the App.
async fn read_commands(
    commands: mpsc::UnboundedSender<UserCommand>,
    list_requested: Arc<AtomicBool>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read stdin: {}", e);
                break;
            }
        };

        match parse_input(&line) {
            PromptInput::Empty => {}
            PromptInput::Help => println!("{}", help_text()),
            PromptInput::Invalid(message) => println!("!! {}", message),
            PromptInput::Command(UserCommand::RefreshSessions) => {
                list_requested.store(true, Ordering::SeqCst);
                if commands.send(UserCommand::RefreshSessions).is_err() {
                    break;
                }
            }
            PromptInput::Command(command) => {
                let quit = command == UserCommand::Shutdown;
                if commands.send(command).is_err() || quit {
                    break;
                }
            }
        }
    }
    let _ = commands.send(UserCommand::Shutdown);
}

fn main() -> Result<()> {
    match parse_args(std::env::args()) {
        CliCommand::Version => {
            println!("{}", version_string());
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", usage());
            return Ok(());
        }
        CliCommand::Run => {}
    }

    color_eyre::install()?;
    init_tracing();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = ClientConfig::from_env();
        let backend = Arc::new(BackendClient::new(config.clone()));
        if !backend.health_check().await {
            tracing::warn!("Backend at {} is not healthy", config.http_base_url);
            println!("!! Backend at {} did not answer its health check", config.http_base_url);
        }

        let (app, events) = App::new(config, backend, Arc::new(TungsteniteConnector::new()));
        let list_requested = Arc::new(AtomicBool::new(false));
        let printer = tokio::spawn(print_events(events, Arc::clone(&list_requested)));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(read_commands(command_tx, list_requested));

        println!("{}", help_text());
        app.run(command_rx).await;

        printer.abort();
        Ok(())
    })
}
