//! The bridge instance owned by the host plugin.
//!
//! Everything here runs on the host's frame-loop thread. The HTTP server
//! runs on its own tokio runtime and only shares the message store and the
//! injection queue with it.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};
use tracing::{debug, error, info, warn};

use crate::chat::{
    ChatFilter, ChatKind, ChatMessage, InjectionQueue, MessageArchive, MessageStore,
};
use crate::config::Config;
use crate::dispatch::{process_pending, ChatDispatcher, TickContext};
use crate::web::{AppState, BridgeServer, ServerHandle};
use crate::{BridgeError, Result};

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "xivchat-bridge.toml";

/// Directories handed over by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgePaths {
    /// Writable directory for configuration, archive and log.
    pub config_dir: PathBuf,
    /// Root of the companion UI files.
    pub assets_dir: PathBuf,
}

impl BridgePaths {
    /// Create a new set of paths.
    pub fn new(config_dir: impl Into<PathBuf>, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            assets_dir: assets_dir.into(),
        }
    }

    /// Path of the configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}

/// A loaded bridge.
pub struct Bridge<D: ChatDispatcher> {
    config: Config,
    paths: BridgePaths,
    store: Arc<MessageStore>,
    queue: Arc<InjectionQueue>,
    filter: ChatFilter,
    archive: MessageArchive,
    dispatcher: Option<D>,
    runtime: Runtime,
    server: Option<ServerHandle>,
    closed: bool,
}

impl<D: ChatDispatcher> Bridge<D> {
    /// Load the configuration from `paths` and start the bridge.
    pub fn load(
        paths: BridgePaths,
        make_dispatcher: impl FnOnce(&Arc<MessageStore>) -> D,
    ) -> Result<Self> {
        let config = Config::load_or_default(paths.config_file());
        Self::new(config, paths, make_dispatcher)
    }

    /// Start the bridge: restore archived messages, build the dispatcher and
    /// start the HTTP server.
    ///
    /// A server that fails to bind is logged and left stopped; the rest of
    /// the bridge keeps working.
    pub fn new(
        config: Config,
        paths: BridgePaths,
        make_dispatcher: impl FnOnce(&Arc<MessageStore>) -> D,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("xivchat-http")
            .enable_all()
            .build()?;

        let store = Arc::new(MessageStore::new(config.messages.capacity()));
        let archive = MessageArchive::in_dir(&paths.config_dir);
        if config.messages.persist {
            store.restore(archive.load());
        }

        let queue = Arc::new(InjectionQueue::new(config.messages.pending_limit));
        let filter = ChatFilter::new(config.chat.enabled_types.iter().copied());
        let dispatcher = make_dispatcher(&store);

        let mut bridge = Self {
            config,
            paths,
            store,
            queue,
            filter,
            archive,
            dispatcher: Some(dispatcher),
            runtime,
            server: None,
            closed: false,
        };
        if let Err(e) = bridge.start_server() {
            error!("{}", e);
        }
        Ok(bridge)
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Host-provided directories.
    pub fn paths(&self) -> &BridgePaths {
        &self.paths
    }

    /// The received message store.
    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    /// The outbound queue.
    pub fn queue(&self) -> &Arc<InjectionQueue> {
        &self.queue
    }

    /// The dispatcher, until shutdown.
    pub fn dispatcher(&self) -> Option<&D> {
        self.dispatcher.as_ref()
    }

    /// Address the HTTP server is bound to, if it is running.
    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(ServerHandle::local_addr)
    }

    /// Handle of the runtime the HTTP server runs on.
    pub fn runtime_handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    /// Per-frame callback: deliver queued messages when the session allows.
    pub fn on_tick(&self, ctx: TickContext) -> usize {
        match &self.dispatcher {
            Some(dispatcher) => process_pending(&self.queue, dispatcher, ctx),
            None => 0,
        }
    }

    /// Chat event from the host. Returns whether the line was stored.
    ///
    /// Unknown classification codes and disabled classifications are dropped.
    pub fn on_chat_message(&self, code: u16, sender: &str, text: &str) -> bool {
        let Some(kind) = ChatKind::from_code(code) else {
            return false;
        };
        if !self.filter.allows(kind) {
            return false;
        }
        self.store.append(ChatMessage::new(kind, sender, text));
        true
    }

    /// Enable or disable recording of a classification and save the choice.
    pub fn set_chat_type_enabled(&mut self, kind: ChatKind, enabled: bool) -> Result<bool> {
        if !self.filter.set_enabled(kind, enabled) {
            return Ok(false);
        }
        info!(%kind, enabled, "chat type filter changed");
        self.config.chat.enabled_types = self.filter.enabled_kinds();
        self.save_config()?;
        Ok(true)
    }

    /// Change the listen port and scope, save them and restart the server.
    ///
    /// The settings are saved even when the new address cannot be bound.
    pub fn configure_server(&mut self, port: u16, allow_non_local_access: bool) -> Result<()> {
        self.config.server.port = port;
        self.config.server.allow_non_local_access = allow_non_local_access;
        self.save_config()?;
        self.restart_server()
    }

    /// Stop and start the HTTP server with the current configuration.
    ///
    /// On a bind failure the server stays stopped.
    pub fn restart_server(&mut self) -> Result<()> {
        self.stop_server();
        self.start_server()
    }

    /// Persist messages, stop the server and release the dispatcher.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn save_config(&self) -> Result<()> {
        self.config.save(self.paths.config_file())
    }

    fn start_server(&mut self) -> Result<()> {
        let state = Arc::new(AppState::new(
            self.store.clone(),
            self.queue.clone(),
            self.paths.assets_dir.clone(),
        ));
        let server = BridgeServer::new(&self.config.server, state);
        let addr = server.addr();
        let handle = self
            .runtime
            .block_on(server.run_with_addr())
            .map_err(|e| BridgeError::Server(format!("failed to bind {}: {}", addr, e)))?;
        self.server = Some(handle);
        Ok(())
    }

    fn stop_server(&mut self) {
        if let Some(handle) = self.server.take() {
            self.runtime.block_on(handle.stop());
        }
    }

    fn persist(&self) {
        if !self.config.messages.persist {
            return;
        }
        let messages = self.store.snapshot();
        match self.archive.save(&messages) {
            Ok(()) => debug!(count = messages.len(), "messages archived"),
            Err(e) => warn!("Failed to archive messages: {}", e),
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.stop_server();
        self.persist();
        self.dispatcher = None;
        info!("bridge shut down");
    }
}

impl<D: ChatDispatcher> Drop for Bridge<D> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resolve a directory handed over by the host, rejecting empty paths.
pub fn host_dir(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(Path::new(trimmed).to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{InputChannel, NewMessageRequest};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
    }

    impl ChatDispatcher for Recorder {
        fn dispatch(&self, _ui_module: usize, request: &NewMessageRequest) {
            self.sent.lock().unwrap().push(request.text.clone());
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.server.port = 0;
        config
    }

    fn test_bridge(dir: &Path) -> Bridge<Recorder> {
        let paths = BridgePaths::new(dir, dir.join("ui"));
        Bridge::new(test_config(), paths, |_| Recorder::default()).unwrap()
    }

    #[test]
    fn test_server_starts_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = test_bridge(dir.path());
        let addr = bridge.server_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn test_bind_failure_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let mut config = test_config();
        config.server.port = port;
        let paths = BridgePaths::new(dir.path(), dir.path().join("ui"));
        let mut bridge = Bridge::new(config, paths, |_| Recorder::default()).unwrap();
        assert!(bridge.server_addr().is_none());

        let result = bridge.restart_server();
        assert!(matches!(result, Err(BridgeError::Server(_))));

        let result = bridge.configure_server(port, false);
        assert!(matches!(result, Err(BridgeError::Server(_))));
        assert!(bridge.server_addr().is_none());
        assert_eq!(bridge.config().server.port, port);

        bridge.configure_server(0, false).unwrap();
        assert!(bridge.server_addr().is_some());
    }

    #[test]
    fn test_chat_messages_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = test_bridge(dir.path());

        assert!(bridge.on_chat_message(ChatKind::Say.code(), "a", "hello"));
        assert!(!bridge.on_chat_message(ChatKind::SystemMessage.code(), "", "system"));
        assert!(!bridge.on_chat_message(9999, "a", "unknown"));
        assert_eq!(bridge.store().len(), 1);
    }

    #[test]
    fn test_set_chat_type_enabled_saves_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut bridge = test_bridge(dir.path());

        assert!(bridge.set_chat_type_enabled(ChatKind::Say, false).unwrap());
        assert!(!bridge.on_chat_message(ChatKind::Say.code(), "a", "hello"));

        let saved = Config::load(bridge.paths().config_file()).unwrap();
        assert!(!saved.chat.enabled_types.contains(&ChatKind::Say));
        assert!(saved.chat.enabled_types.contains(&ChatKind::Party));
    }

    #[test]
    fn test_tick_delivers_queue() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = test_bridge(dir.path());
        bridge
            .queue()
            .enqueue(NewMessageRequest::new(InputChannel::Say, "hi"))
            .unwrap();

        assert_eq!(bridge.on_tick(TickContext::new(1, false)), 0);
        assert_eq!(bridge.on_tick(TickContext::new(1, true)), 1);
        assert_eq!(
            *bridge.dispatcher().unwrap().sent.lock().unwrap(),
            vec!["hi".to_string()]
        );
    }

    #[test]
    fn test_shutdown_persists_and_reload_restores() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = test_bridge(dir.path());
        bridge.on_chat_message(ChatKind::Party.code(), "a", "one");
        bridge.on_chat_message(ChatKind::Party.code(), "b", "two");
        bridge.shutdown();

        let bridge = test_bridge(dir.path());
        let texts: Vec<String> = bridge
            .store()
            .snapshot()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_no_persistence_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.messages.persist = false;
        let paths = BridgePaths::new(dir.path(), dir.path());
        let bridge = Bridge::new(config, paths, |_| Recorder::default()).unwrap();
        bridge.on_chat_message(ChatKind::Say.code(), "a", "x");
        bridge.shutdown();

        assert!(!MessageArchive::in_dir(dir.path()).path().exists());
    }

    #[test]
    fn test_host_dir() {
        assert_eq!(host_dir("  "), None);
        assert_eq!(host_dir("C:/plugins"), Some(PathBuf::from("C:/plugins")));
    }
}
