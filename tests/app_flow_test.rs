//! End-to-end App tests over in-memory transports.
//!
//! The App runs on its own task exactly as the binary runs it; tests drive it
//! through `UserCommand`s and the mock socket, and watch the `AppEvent`s.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use lexchat::adapters::mock::{MockConnector, MockHttpClient, MockResponse};
use lexchat::app::{App, AppEvent, UserCommand};
use lexchat::backend::BackendClient;
use lexchat::config::ClientConfig;
use lexchat::models::{Role, SessionId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const BASE: &str = "http://backend";

struct Running {
    commands: mpsc::UnboundedSender<UserCommand>,
    events: mpsc::UnboundedReceiver<AppEvent>,
    http: MockHttpClient,
    connector: MockConnector,
    handle: JoinHandle<()>,
}

impl Running {
    /// Wait for the first event matching `pred`, skipping the rest.
    async fn expect<F>(&mut self, mut pred: F) -> AppEvent
    where
        F: FnMut(&AppEvent) -> bool,
    {
        let deadline = Duration::from_secs(30);
        tokio::time::timeout(deadline, async {
            loop {
                let event = self.events.recv().await.expect("event channel closed");
                if pred(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    fn send(&self, command: UserCommand) {
        self.commands.send(command).unwrap();
    }
}

/// Start an App whose backend knows no sessions and wait for it to settle.
async fn start() -> Running {
    let http = MockHttpClient::new();
    http.set_response(
        &format!("{}/sessions", BASE),
        MockResponse::json(200, r#"{"status": "success", "sessions": []}"#),
    );
    let connector = MockConnector::new();

    let config = ClientConfig::new()
        .with_http_base_url(BASE)
        .with_ws_url("ws://backend/ws/chat");
    let backend = Arc::new(BackendClient::with_http(config.clone(), Arc::new(http.clone())));
    let (app, events) = App::new(config, backend, Arc::new(connector.clone()));

    let (commands, command_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(app.run(command_rx));

    let mut running = Running {
        commands,
        events,
        http,
        connector,
        handle,
    };
    running
        .expect(|e| matches!(e, AppEvent::CatalogUpdated(_)))
        .await;
    running
}

#[tokio::test]
async fn test_upload_without_session_ends_with_one_catalog_entry() {
    let mut app = start().await;
    app.http.set_response(
        &format!("{}/upload", BASE),
        MockResponse::chunks([
            "data: {\"status\": \"session_id\", \"session_id\": \"S1\"}\n",
            "data: {\"status\": \"summary_chunk\", \"content\": \"Part A. \"}\n",
            "data: {\"status\": \"summary_chunk\", \"content\": \"Part B.\"}\n",
        ]),
    );

    let mut file = tempfile::Builder::new()
        .prefix("lease")
        .suffix(".pdf")
        .tempfile()
        .unwrap();
    file.write_all(b"%PDF-1.4").unwrap();
    app.send(UserCommand::Upload(file.path().to_path_buf()));

    let user = app
        .expect(|e| matches!(e, AppEvent::MessageAppended(m) if m.role == Role::User))
        .await;
    match user {
        AppEvent::MessageAppended(m) => assert!(m.text.starts_with("Uploaded document: lease")),
        other => panic!("unexpected {:?}", other),
    }

    let summary = app
        .expect(|e| matches!(e, AppEvent::MessageAppended(m) if m.role == Role::Assistant))
        .await;
    match summary {
        AppEvent::MessageAppended(m) => assert_eq!(m.text, "Part A. Part B."),
        other => panic!("unexpected {:?}", other),
    }

    app.expect(|e| *e == AppEvent::SessionChanged(Some(SessionId::new("S1"))))
        .await;
    let catalog = app
        .expect(|e| matches!(e, AppEvent::CatalogUpdated(_)))
        .await;
    match catalog {
        AppEvent::CatalogUpdated(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].id, SessionId::new("S1"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_upload_of_missing_file_reports_error() {
    let mut app = start().await;
    app.send(UserCommand::Upload("/definitely/not/here.pdf".into()));

    app.expect(|e| matches!(e, AppEvent::Error(_))).await;
    assert!(app
        .http
        .get_requests()
        .iter()
        .all(|request| request.method != "POST"));
}

#[tokio::test(start_paused = true)]
async fn test_streamed_reply_commits_after_silence() {
    let mut app = start().await;
    app.send(UserCommand::Send("hi".to_string()));
    app.expect(|e| matches!(e, AppEvent::MessageAppended(m) if m.role == Role::User))
        .await;

    let socket = app.connector.last_socket().unwrap();
    socket.push_text("Hel");
    app.expect(|e| *e == AppEvent::Fragment("Hel".to_string()))
        .await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    socket.push_text("lo");
    app.expect(|e| *e == AppEvent::Fragment("lo".to_string()))
        .await;
    let last_fragment = Instant::now();

    let reply = app
        .expect(|e| matches!(e, AppEvent::MessageAppended(m) if m.role == Role::Assistant))
        .await;
    match reply {
        AppEvent::MessageAppended(m) => assert_eq!(m.text, "Hello"),
        other => panic!("unexpected {:?}", other),
    }
    let waited = last_fragment.elapsed();
    assert!(waited >= Duration::from_millis(1000), "committed after {:?}", waited);
    assert!(waited < Duration::from_millis(1100), "committed after {:?}", waited);
}

#[tokio::test(start_paused = true)]
async fn test_chat_adopts_asserted_session() {
    let mut app = start().await;
    app.send(UserCommand::Send("Can I break my lease?".to_string()));
    app.expect(|e| matches!(e, AppEvent::MessageAppended(_))).await;

    let socket = app.connector.last_socket().unwrap();
    socket.push_text(r#"{"session_id": "S9", "info": "New session created"}"#);

    app.expect(|e| *e == AppEvent::Status("New session created".to_string()))
        .await;
    app.expect(|e| *e == AppEvent::SessionChanged(Some(SessionId::new("S9"))))
        .await;

    socket.push_text(r#"{"title": "Lease Break"}"#);
    let catalog = app
        .expect(|e| matches!(e, AppEvent::CatalogUpdated(entries) if entries.iter().any(|s| s.title == "Lease Break")))
        .await;
    match catalog {
        AppEvent::CatalogUpdated(entries) => assert_eq!(entries.len(), 1),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_abnormal_close_reconnects() {
    let mut app = start().await;
    app.send(UserCommand::Send("hi".to_string()));
    app.expect(|e| matches!(e, AppEvent::MessageAppended(_))).await;
    assert_eq!(app.connector.connect_count(), 1);

    app.connector.last_socket().unwrap().close(Some(1006));
    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(app.connector.connect_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_channel_normally() {
    let app = start().await;
    app.send(UserCommand::Send("hi".to_string()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    let socket = app.connector.last_socket().unwrap();

    app.send(UserCommand::Shutdown);
    app.handle.await.unwrap();

    assert!(socket.was_closed_locally());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_commands_stops_the_app() {
    let Running {
        commands, handle, ..
    } = start().await;
    drop(commands);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}
