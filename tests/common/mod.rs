//! Test helpers for bridge integration tests.
//!
//! Builds the HTTP router over a fresh store and queue, plus a temporary
//! companion UI directory.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum_test::TestServer;
use tempfile::TempDir;

use xivchat_bridge::web::create_router;
use xivchat_bridge::{AppState, ChatKind, ChatMessage, InjectionQueue, MessageStore};

/// Everything a router test needs to inspect.
pub struct TestBridge {
    pub server: TestServer,
    pub store: Arc<MessageStore>,
    pub queue: Arc<InjectionQueue>,
    pub assets: TempDir,
}

/// Options for [`create_test_bridge`].
pub struct TestOptions {
    pub capacity: usize,
    pub pending_limit: usize,
    pub cors_origins: Vec<String>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            capacity: 100,
            pending_limit: 16,
            cors_origins: Vec::new(),
        }
    }
}

/// Write a small companion UI into `dir`.
pub fn write_assets(dir: &Path) {
    std::fs::write(dir.join("index.html"), "<!doctype html><title>bridge</title>").unwrap();
    std::fs::write(dir.join("app.js"), "console.log('bridge');").unwrap();
    std::fs::write(dir.join("app_bg.wasm"), [0x00, 0x61, 0x73, 0x6d]).unwrap();
    std::fs::write(dir.join("style.css"), "body { margin: 0; }").unwrap();
    std::fs::create_dir_all(dir.join("pkg")).unwrap();
    std::fs::write(dir.join("pkg").join("nested.js"), "export {};").unwrap();
}

/// Create a router-backed test server with default options.
pub fn create_test_bridge() -> TestBridge {
    create_test_bridge_with(TestOptions::default())
}

/// Create a router-backed test server.
pub fn create_test_bridge_with(options: TestOptions) -> TestBridge {
    let assets = tempfile::tempdir().expect("Failed to create asset dir");
    write_assets(assets.path());

    let store = Arc::new(MessageStore::new(options.capacity));
    let queue = Arc::new(InjectionQueue::new(options.pending_limit));
    let state = Arc::new(AppState::new(
        store.clone(),
        queue.clone(),
        assets.path().to_path_buf(),
    ));

    let router = create_router(state, &options.cors_origins);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestBridge {
        server,
        store,
        queue,
        assets,
    }
}

/// A received chat line.
pub fn chat(kind: ChatKind, sender: &str, text: &str) -> ChatMessage {
    ChatMessage::new(kind, sender, text)
}
