//! C entry points called by the host's plugin loader.
//!
//! The loader calls these on its frame-loop thread. No panic crosses the
//! boundary: each entry point catches it, logs it and returns a neutral value.

use std::ffi::{c_char, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use tracing::{debug, error, warn};

use crate::bridge::{host_dir, Bridge, BridgePaths};
use crate::chat::ChatKind;
use crate::config::Config;
use crate::dispatch::TickContext;
use crate::logging;
use crate::native::GameFunctions;

/// Startup data passed by the host.
#[repr(C)]
#[derive(Debug)]
pub struct HostInit {
    /// Base address of the host's main module, 0 if unknown.
    pub module_base: usize,
    /// NUL-terminated UTF-8 path of a writable config directory.
    pub config_dir: *const c_char,
    /// NUL-terminated UTF-8 path of the companion UI directory.
    pub assets_dir: *const c_char,
}

/// Opaque handle returned to the host.
pub struct PluginHandle {
    bridge: Bridge<GameFunctions>,
}

fn guard<T>(entry: &'static str, fallback: T, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error!(entry, "panic caught at the host boundary");
            fallback
        }
    }
}

/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn host_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: upheld by the caller.
    let raw = unsafe { CStr::from_ptr(ptr) };
    Some(raw.to_string_lossy().into_owned())
}

/// # Safety
///
/// `handle` must be null or a live pointer from [`xivchat_bridge_load`].
unsafe fn handle_mut<'a>(handle: *mut PluginHandle) -> Option<&'a mut PluginHandle> {
    // SAFETY: upheld by the caller.
    unsafe { handle.as_mut() }
}

/// Load the bridge. Returns null if the directories are missing or invalid.
///
/// # Safety
///
/// `init` must be null or point to a valid [`HostInit`] whose strings are
/// NUL-terminated, and `module_base` must be 0 or the host module's base.
#[no_mangle]
pub unsafe extern "C" fn xivchat_bridge_load(init: *const HostInit) -> *mut PluginHandle {
    guard("load", ptr::null_mut(), || {
        // SAFETY: upheld by the caller.
        let Some(init) = (unsafe { init.as_ref() }) else {
            return ptr::null_mut();
        };
        // SAFETY: upheld by the caller.
        let (config_dir, assets_dir) =
            unsafe { (host_str(init.config_dir), host_str(init.assets_dir)) };
        let (Some(config_dir), Some(assets_dir)) = (
            config_dir.as_deref().and_then(host_dir),
            assets_dir.as_deref().and_then(host_dir),
        ) else {
            return ptr::null_mut();
        };

        let paths = BridgePaths::new(config_dir, assets_dir);
        let config = Config::load_or_default(paths.config_file());
        if let Err(e) = logging::init(&config.logging, &paths.config_dir) {
            // A reload keeps the subscriber installed by the first load.
            debug!("logging already initialized: {}", e);
        }

        let module_base = init.module_base;
        let bridge = Bridge::new(config, paths, |_| {
            if module_base == 0 {
                warn!("no module base given; chat injection disabled");
                return GameFunctions::detached();
            }
            // SAFETY: the host passes its main module base, and load runs on
            // its frame-loop thread.
            unsafe { GameFunctions::attach(module_base) }
        });

        match bridge {
            Ok(bridge) => Box::into_raw(Box::new(PluginHandle { bridge })),
            Err(e) => {
                error!("Failed to start bridge: {}", e);
                ptr::null_mut()
            }
        }
    })
}

/// Per-frame callback. Returns the number of messages sent this tick.
///
/// # Safety
///
/// `handle` must be null or a live pointer from [`xivchat_bridge_load`], and
/// `ui_module` must be 0 or the host's current UI module.
#[no_mangle]
pub unsafe extern "C" fn xivchat_bridge_tick(
    handle: *mut PluginHandle,
    ui_module: usize,
    local_player_present: bool,
) -> u32 {
    guard("tick", 0, || {
        // SAFETY: upheld by the caller.
        let Some(handle) = (unsafe { handle_mut(handle) }) else {
            return 0;
        };
        let ctx = TickContext::new(ui_module, local_player_present);
        u32::try_from(handle.bridge.on_tick(ctx)).unwrap_or(u32::MAX)
    })
}

/// Chat event. Returns whether the line was stored.
///
/// # Safety
///
/// `handle` must be null or a live pointer from [`xivchat_bridge_load`];
/// `sender` and `text` must be null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn xivchat_bridge_chat_message(
    handle: *mut PluginHandle,
    kind: u16,
    sender: *const c_char,
    text: *const c_char,
) -> bool {
    guard("chat_message", false, || {
        // SAFETY: upheld by the caller.
        let Some(handle) = (unsafe { handle_mut(handle) }) else {
            return false;
        };
        // SAFETY: upheld by the caller.
        let (sender, text) = unsafe { (host_str(sender), host_str(text)) };
        let Some(text) = text else {
            return false;
        };
        handle
            .bridge
            .on_chat_message(kind, sender.as_deref().unwrap_or(""), &text)
    })
}

/// Enable or disable recording of a chat type. Returns whether it changed.
///
/// # Safety
///
/// `handle` must be null or a live pointer from [`xivchat_bridge_load`].
#[no_mangle]
pub unsafe extern "C" fn xivchat_bridge_set_chat_type_enabled(
    handle: *mut PluginHandle,
    kind: u16,
    enabled: bool,
) -> bool {
    guard("set_chat_type_enabled", false, || {
        // SAFETY: upheld by the caller.
        let Some(handle) = (unsafe { handle_mut(handle) }) else {
            return false;
        };
        let Some(kind) = ChatKind::from_code(kind) else {
            return false;
        };
        match handle.bridge.set_chat_type_enabled(kind, enabled) {
            Ok(changed) => changed,
            Err(e) => {
                warn!("Failed to save chat type setting: {}", e);
                true
            }
        }
    })
}

/// Change the listen port and scope and restart the server.
///
/// # Safety
///
/// `handle` must be null or a live pointer from [`xivchat_bridge_load`].
#[no_mangle]
pub unsafe extern "C" fn xivchat_bridge_configure_server(
    handle: *mut PluginHandle,
    port: u16,
    allow_non_local_access: bool,
) -> bool {
    guard("configure_server", false, || {
        // SAFETY: upheld by the caller.
        let Some(handle) = (unsafe { handle_mut(handle) }) else {
            return false;
        };
        match handle.bridge.configure_server(port, allow_non_local_access) {
            Ok(()) => handle.bridge.server_addr().is_some(),
            Err(e) => {
                warn!("Failed to apply server settings: {}", e);
                false
            }
        }
    })
}

/// Shut the bridge down and free the handle.
///
/// # Safety
///
/// `handle` must be null or a pointer from [`xivchat_bridge_load`] that has
/// not been unloaded yet. It is invalid afterwards.
#[no_mangle]
pub unsafe extern "C" fn xivchat_bridge_unload(handle: *mut PluginHandle) {
    guard("unload", (), || {
        if handle.is_null() {
            return;
        }
        // SAFETY: upheld by the caller; ownership returns to Rust here.
        let handle = unsafe { Box::from_raw(handle) };
        handle.bridge.shutdown();
    })
}
