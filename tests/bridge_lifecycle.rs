//! End-to-end bridge lifecycle tests.
//!
//! Drives a full [`Bridge`] the way the host does: chat events and ticks on
//! the calling thread, HTTP clients against the real listener.

use std::path::Path;
use std::sync::Mutex;

use serde_json::{json, Value};
use xivchat_bridge::{
    Bridge, BridgePaths, ChatDispatcher, ChatKind, Config, InputChannel, NewMessageRequest,
    TickContext,
};

#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<(usize, NewMessageRequest)>>,
}

impl ChatDispatcher for Recorder {
    fn dispatch(&self, ui_module: usize, request: &NewMessageRequest) {
        self.sent.lock().unwrap().push((ui_module, request.clone()));
    }
}

fn start(dir: &Path) -> Bridge<Recorder> {
    let ui = dir.join("ui");
    std::fs::create_dir_all(&ui).unwrap();
    std::fs::write(ui.join("index.html"), "<html></html>").unwrap();

    let mut config = Config::default();
    config.server.port = 0;
    let paths = BridgePaths::new(dir, ui);
    Bridge::new(config, paths, |_| Recorder::default()).unwrap()
}

fn url(bridge: &Bridge<Recorder>, path: &str) -> String {
    format!("http://{}{}", bridge.server_addr().unwrap(), path)
}

fn get_messages(bridge: &Bridge<Recorder>) -> Vec<Value> {
    let url = url(bridge, "/messages");
    bridge.runtime_handle().block_on(async move {
        reqwest::get(url).await.unwrap().json().await.unwrap()
    })
}

fn post_message(bridge: &Bridge<Recorder>, body: Value) -> u16 {
    let url = url(bridge, "/messages");
    bridge.runtime_handle().block_on(async move {
        reqwest::Client::new()
            .post(url)
            .json(&body)
            .send()
            .await
            .unwrap()
            .status()
            .as_u16()
    })
}

#[test]
fn test_received_lines_are_served() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = start(dir.path());

    bridge.on_chat_message(ChatKind::Say.code(), "Y'shtola Rhul", "hello");
    bridge.on_chat_message(ChatKind::TellIncoming.code(), "G'raha Tia", "psst");

    let body = get_messages(&bridge);
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["senderName"], "Y'shtola Rhul");
    assert_eq!(body[1]["type"], ChatKind::TellIncoming.as_str());
}

#[test]
fn test_posted_message_waits_for_session() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = start(dir.path());

    assert_eq!(post_message(&bridge, json!({ "type": "fc", "text": "hi" })), 201);

    assert_eq!(bridge.on_tick(TickContext::new(0, true)), 0);
    assert_eq!(bridge.on_tick(TickContext::new(42, false)), 0);
    assert_eq!(bridge.queue().len(), 1);

    assert_eq!(bridge.on_tick(TickContext::new(42, true)), 1);
    let sent = bridge.dispatcher().unwrap().sent.lock().unwrap().clone();
    assert_eq!(
        sent,
        vec![(42, NewMessageRequest::new(InputChannel::FreeCompany, "hi"))]
    );
    assert!(bridge.queue().is_empty());
}

#[test]
fn test_rejected_post_is_not_queued() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = start(dir.path());

    assert_eq!(post_message(&bridge, json!({ "type": "say" })), 400);
    assert_eq!(post_message(&bridge, json!({ "type": "say", "text": "" })), 400);
    assert!(bridge.queue().is_empty());
}

#[test]
fn test_filter_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut bridge = start(dir.path());
        assert!(bridge.set_chat_type_enabled(ChatKind::Shout, false).unwrap());
        assert!(!bridge.set_chat_type_enabled(ChatKind::Shout, false).unwrap());
        bridge.shutdown();
    }

    let config = Config::load(dir.path().join(xivchat_bridge::CONFIG_FILE_NAME)).unwrap();
    let paths = BridgePaths::new(dir.path(), dir.path().join("ui"));
    let bridge = Bridge::new(config, paths, |_| Recorder::default()).unwrap();
    assert!(!bridge.on_chat_message(ChatKind::Shout.code(), "a", "wts"));
    assert!(bridge.on_chat_message(ChatKind::Say.code(), "a", "hi"));
}

#[test]
fn test_history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let bridge = start(dir.path());
        bridge.on_chat_message(ChatKind::Party.code(), "a", "first");
        bridge.on_chat_message(ChatKind::Party.code(), "b", "second");
        bridge.shutdown();
    }

    let bridge = start(dir.path());
    let texts: Vec<String> = get_messages(&bridge)
        .into_iter()
        .map(|m| m["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["first", "second"]);
}

#[test]
fn test_configure_server_rebinds() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = start(dir.path());
    bridge.on_chat_message(ChatKind::Say.code(), "a", "kept");

    bridge.configure_server(0, false).unwrap();

    let after = bridge.server_addr().unwrap();
    assert!(after.ip().is_loopback());
    assert_eq!(get_messages(&bridge).len(), 1);

    let saved = Config::load(dir.path().join(xivchat_bridge::CONFIG_FILE_NAME)).unwrap();
    assert_eq!(saved.server.port, 0);
    assert!(!saved.server.allow_non_local_access);
}

#[test]
fn test_shutdown_stops_listener() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = start(dir.path());
    let addr = bridge.server_addr().unwrap();
    bridge.shutdown();

    assert!(std::net::TcpStream::connect(addr).is_err());
}
