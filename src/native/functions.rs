//! Host functions the bridge calls and hooks.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::hooks::{
    self, channel_change_detour, input_afk_detour, input_detour, ChannelChangeFn, HookState,
    InputAfkFn, InputFn, Originals,
};
use super::image::ModuleText;
use super::interceptor::Hook;
use super::payload::{ChatPayload, NativeString, ScratchText};
use crate::chat::{InputChannel, NewMessageRequest};
use crate::dispatch::ChatDispatcher;

/// Host entry point that processes a submitted chat line.
pub type ProcessChatFn =
    unsafe extern "C" fn(ui_module: usize, payload: *const u8, unused: usize, a4: u8);

/// Host entry point that switches the active chat channel.
pub type ChannelSwitchFn = unsafe extern "C" fn(
    manager: usize,
    channel: i32,
    linkshell_index: u32,
    tell_target: *const NativeString,
    can_change: u8,
) -> usize;

const PROCESS_CHAT: &str = "ProcessChat";
const INPUT: &str = "Input";
const INPUT_AFK: &str = "InputAfk";
const CHANNEL_CHANGE: &str = "ChannelChange";
const CHANNEL_COMMAND: &str = "ChannelCommand";

/// Name and byte pattern of every host function the bridge uses.
pub const SIGNATURES: [(&str, &str); 5] = [
    (
        PROCESS_CHAT,
        "48 89 5C 24 ?? 57 48 83 EC 20 48 8B FA 48 8B D9 45 84 C9",
    ),
    (INPUT, "E8 ?? ?? ?? ?? 4D 8B 47 18 84 C0"),
    (INPUT_AFK, "E8 ?? ?? ?? ?? 41 83 7F ?? ?? 4C 8D 2D"),
    (CHANNEL_CHANGE, "E8 ?? ?? ?? ?? E9 ?? ?? ?? ?? 85 D2 BB"),
    (CHANNEL_COMMAND, "E8 ?? ?? ?? ?? 0F B7 44 37"),
];

/// Text to submit for `text` aimed at `requested` while `current` is active.
///
/// Lines that already start with a slash command go through untouched, as do
/// lines for the channel that is already active.
pub fn compose_text(
    text: &str,
    requested: InputChannel,
    current: Option<InputChannel>,
) -> Cow<'_, str> {
    if text.starts_with('/') || current == Some(requested) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{} {}", requested.command_prefix(), text))
    }
}

/// Submits chat lines through the host's chat processing.
#[derive(Debug)]
pub struct ChatInjector {
    process_chat: Option<ProcessChatFn>,
    state: Arc<HookState>,
}

impl ChatInjector {
    /// Create an injector. `None` makes every injection a no-op.
    pub fn new(process_chat: Option<ProcessChatFn>, state: Arc<HookState>) -> Self {
        Self {
            process_chat,
            state,
        }
    }

    /// Whether the host entry point was resolved.
    pub fn is_available(&self) -> bool {
        self.process_chat.is_some()
    }

    /// Submit `text` as if the user typed it. Returns whether the host was called.
    pub fn inject(&self, ui_module: usize, text: &str) -> bool {
        let Some(process_chat) = self.process_chat else {
            return false;
        };
        if ui_module == 0 {
            return false;
        }

        let scratch = ScratchText::new(text);
        let block = ChatPayload::for_text(&scratch).to_block();
        self.state.suppress_next_input();
        // SAFETY: the entry point was resolved from the host image, and the
        // block and scratch text outlive the call.
        unsafe { process_chat(ui_module, block.as_ptr(), 0, 0) };
        true
    }
}

/// Switches the host's active chat channel.
#[derive(Debug)]
pub struct ChannelChangeInvoker {
    change_channel: Option<ChannelSwitchFn>,
    empty_target: Box<NativeString>,
    state: Arc<HookState>,
}

impl ChannelChangeInvoker {
    /// Create an invoker. `None` makes every switch a no-op.
    pub fn new(change_channel: Option<ChannelSwitchFn>, state: Arc<HookState>) -> Self {
        Self {
            change_channel,
            empty_target: NativeString::empty(),
            state,
        }
    }

    /// Whether the host entry point was resolved.
    pub fn is_available(&self) -> bool {
        self.change_channel.is_some()
    }

    /// Make `channel` active. Returns whether the host was called.
    ///
    /// Needs a chat manager pointer observed by the channel-change hook.
    pub fn change(&self, channel: InputChannel) -> bool {
        let (Some(change_channel), Some(manager)) = (self.change_channel, self.state.chat_manager())
        else {
            return false;
        };

        // SAFETY: the entry point was resolved from the host image, the
        // manager pointer came from the host, and the empty string is boxed.
        unsafe {
            change_channel(
                manager,
                channel.id() as i32,
                channel.linkshell_index(),
                self.empty_target.as_ptr(),
                1,
            );
        }
        true
    }
}

#[derive(Debug, Default)]
struct InstalledHooks {
    channel_change: Option<Hook<ChannelChangeFn>>,
    input: Option<Hook<InputFn>>,
    input_afk: Option<Hook<InputAfkFn>>,
}

impl InstalledHooks {
    fn originals(&self) -> Originals {
        Originals {
            channel_change: self.channel_change.as_ref().map(Hook::original),
            input: self.input.as_ref().map(Hook::original),
            input_afk: self.input_afk.as_ref().map(Hook::original),
        }
    }

    fn is_empty(&self) -> bool {
        self.channel_change.is_none() && self.input.is_none() && self.input_afk.is_none()
    }
}

/// Resolved host functions plus the installed hooks.
///
/// Dropping it disables the hooks. It must be created and dropped on the
/// host's frame-loop thread.
#[derive(Debug)]
pub struct GameFunctions {
    state: Arc<HookState>,
    injector: ChatInjector,
    invoker: ChannelChangeInvoker,
    hooks: InstalledHooks,
}

fn resolve(text: &ModuleText<'_>, name: &'static str) -> Option<usize> {
    let pattern = SIGNATURES
        .iter()
        .find(|(sig_name, _)| *sig_name == name)
        .map(|(_, pattern)| *pattern)?;
    match text.resolve(name, pattern) {
        Ok(address) => {
            debug!(signature = name, address = format_args!("{address:#x}"), "resolved");
            Some(address)
        }
        Err(e) => {
            warn!(signature = name, "{}; dependent feature disabled", e);
            None
        }
    }
}

/// # Safety
///
/// `address` must be the entry point of a function of type `F`.
unsafe fn install_hook<F: Copy>(
    name: &'static str,
    address: Option<usize>,
    replacement: F,
) -> Option<Hook<F>> {
    let address = address?;
    // SAFETY: upheld by the caller.
    match unsafe { Hook::install(name, address, replacement) } {
        Ok(hook) => Some(hook),
        Err(e) => {
            warn!(hook = name, "failed to install hook: {}", e);
            None
        }
    }
}

/// # Safety
///
/// Must run on the host's frame-loop thread.
unsafe fn enable_hook<F: Copy>(slot: &mut Option<Hook<F>>) {
    let Some(hook) = slot.as_ref() else {
        return;
    };
    // SAFETY: upheld by the caller.
    if let Err(e) = unsafe { hook.enable() } {
        warn!(hook = hook.name(), "failed to enable hook: {}", e);
        *slot = None;
    }
}

impl GameFunctions {
    /// Build from already known entry points, without hooks.
    pub fn from_parts(
        process_chat: Option<ProcessChatFn>,
        change_channel: Option<ChannelSwitchFn>,
        state: Arc<HookState>,
    ) -> Self {
        Self {
            injector: ChatInjector::new(process_chat, state.clone()),
            invoker: ChannelChangeInvoker::new(change_channel, state.clone()),
            state,
            hooks: InstalledHooks::default(),
        }
    }

    /// No host access at all; every dispatch is a no-op.
    pub fn detached() -> Self {
        Self::from_parts(None, None, Arc::new(HookState::new()))
    }

    /// Resolve every signature in the module at `module_base` and install
    /// the hooks. Anything that fails is logged once and left disabled.
    ///
    /// # Safety
    ///
    /// `module_base` must be the base of the host's main module, mapped in
    /// this process, and the call must happen on the host's frame-loop thread.
    pub unsafe fn attach(module_base: usize) -> Self {
        // SAFETY: upheld by the caller.
        let text = match unsafe { ModuleText::from_module_base(module_base) } {
            Ok(text) => text,
            Err(e) => {
                warn!("cannot scan host module: {}; chat injection disabled", e);
                return Self::detached();
            }
        };

        let process_chat = resolve(&text, PROCESS_CHAT);
        let input = resolve(&text, INPUT);
        let input_afk = resolve(&text, INPUT_AFK);
        let channel_change = resolve(&text, CHANNEL_CHANGE);
        let channel_command = resolve(&text, CHANNEL_COMMAND);

        // SAFETY: resolved addresses are entry points of the named functions.
        let (process_chat, change_channel) = unsafe {
            (
                process_chat.map(|a| std::mem::transmute::<usize, ProcessChatFn>(a)),
                channel_command.map(|a| std::mem::transmute::<usize, ChannelSwitchFn>(a)),
            )
        };

        let mut functions =
            Self::from_parts(process_chat, change_channel, Arc::new(HookState::new()));

        // SAFETY: each address matches the detour's signature.
        functions.hooks = unsafe {
            InstalledHooks {
                channel_change: install_hook(
                    CHANNEL_CHANGE,
                    channel_change,
                    channel_change_detour as ChannelChangeFn,
                ),
                input: install_hook(INPUT, input, input_detour as InputFn),
                input_afk: install_hook(INPUT_AFK, input_afk, input_afk_detour as InputAfkFn),
            }
        };

        if !functions.hooks.is_empty() {
            hooks::bind(functions.state.clone(), functions.hooks.originals());
            // SAFETY: the binding is in place before any detour can run.
            unsafe {
                enable_hook(&mut functions.hooks.channel_change);
                enable_hook(&mut functions.hooks.input);
                enable_hook(&mut functions.hooks.input_afk);
            }
        }

        info!(
            inject = functions.injector.is_available(),
            switch_channel = functions.invoker.is_available(),
            hooks = functions.hook_count(),
            "host functions attached"
        );
        functions
    }

    /// State observed through the hooks.
    pub fn state(&self) -> &Arc<HookState> {
        &self.state
    }

    /// The chat injector.
    pub fn injector(&self) -> &ChatInjector {
        &self.injector
    }

    /// The channel switcher.
    pub fn invoker(&self) -> &ChannelChangeInvoker {
        &self.invoker
    }

    /// Number of hooks currently enabled.
    pub fn hook_count(&self) -> usize {
        [
            self.hooks.channel_change.as_ref().map(Hook::is_enabled),
            self.hooks.input.as_ref().map(Hook::is_enabled),
            self.hooks.input_afk.as_ref().map(Hook::is_enabled),
        ]
        .into_iter()
        .filter(|enabled| *enabled == Some(true))
        .count()
    }

    /// Send one request: switch channel when needed, then submit the line.
    pub fn send(&self, ui_module: usize, request: &NewMessageRequest) {
        let needs_switch = !request.has_command_prefix()
            && request.channel.is_switchable()
            && self.state.current_channel() != Some(request.channel);
        if needs_switch && self.invoker.change(request.channel) {
            debug!(channel = %request.channel, "switched chat channel");
        }

        // The channel-change hook reports a successful switch synchronously.
        let text = compose_text(&request.text, request.channel, self.state.current_channel());
        if !self.injector.inject(ui_module, &text) {
            debug!("chat injection unavailable; dropping message");
        }
    }
}

impl ChatDispatcher for GameFunctions {
    fn dispatch(&self, ui_module: usize, request: &NewMessageRequest) {
        self.send(ui_module, request);
    }
}

impl Drop for GameFunctions {
    fn drop(&mut self) {
        if self.hooks.is_empty() {
            return;
        }
        // SAFETY: dropped on the frame-loop thread, see the type docs.
        unsafe {
            if let Some(hook) = &self.hooks.channel_change {
                hook.disable();
            }
            if let Some(hook) = &self.hooks.input {
                hook.disable();
            }
            if let Some(hook) = &self.hooks.input_afk {
                hook.disable();
            }
        }
        hooks::unbind();
        debug!("host hooks removed");
    }
}
