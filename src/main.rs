//! Development server: runs the bridge outside the game.
//!
//! Usage: `xivchat-devserver [CONFIG_DIR] [ASSETS_DIR]`
//!
//! A simulated frame loop drains the send queue and echoes every message back
//! into the chat log, so the companion UI can be developed against a live
//! `/messages` endpoint.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use xivchat_bridge::native::compose_text;
use xivchat_bridge::{
    Bridge, BridgePaths, ChatDispatcher, ChatKind, ChatMessage, Config, MessageStore,
    NewMessageRequest, TickContext,
};

/// Roughly one frame at 60 fps.
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Handle the simulated session reports for the UI module.
const FAKE_UI_MODULE: usize = 1;

/// Writes sent messages straight back into the store.
struct EchoDispatcher {
    store: Arc<MessageStore>,
}

impl ChatDispatcher for EchoDispatcher {
    fn dispatch(&self, _ui_module: usize, request: &NewMessageRequest) {
        let text = compose_text(&request.text, request.channel, None);
        info!(channel = %request.channel, "echo: {}", text);
        self.store
            .append(ChatMessage::new(ChatKind::Echo, "devserver", text));
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let config_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let assets_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir.join("ui"));
    let paths = BridgePaths::new(config_dir, assets_dir);

    // Load configuration
    let config = match Config::load(paths.config_file()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", paths.config_file().display());
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    xivchat_bridge::logging::init_console_only(&config.logging.level);

    info!("XIV Chat Bridge development server");
    info!("Serving companion UI from {}", paths.assets_dir.display());

    let bridge = match Bridge::new(config, paths, |store| EchoDispatcher {
        store: store.clone(),
    }) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("Failed to start bridge: {}", e);
            std::process::exit(1);
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        bridge.runtime_handle().spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    let ctx = TickContext::new(FAKE_UI_MODULE, true);
    while !stop.load(Ordering::SeqCst) {
        bridge.on_tick(ctx);
        std::thread::sleep(TICK_INTERVAL);
    }

    info!("Shutting down");
    bridge.shutdown();
}
