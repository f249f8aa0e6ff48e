//! Hook-observed state and the detour functions the host calls into.
//!
//! [`HookState`] is written only from detours running on the host thread and
//! from the injector right before it submits a line. Detours find the state
//! and the original functions through a process-wide binding, since the
//! host calls them with no user data.

use std::sync::atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::chat::InputChannel;

/// Host callback fired whenever the active chat channel changes.
pub type ChannelChangeFn = unsafe extern "C" fn(manager: usize, channel: u32) -> u8;
/// Host poll asking whether text input is pending.
pub type InputFn = unsafe extern "C" fn(a1: usize) -> u8;
/// Host poll asking whether input happened, for the idle timer.
pub type InputAfkFn = unsafe extern "C" fn() -> u8;

const NO_CHANNEL: u32 = u32::MAX;

/// Which input poll a suppression flag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Text input poll.
    Normal,
    /// Idle-timer input poll.
    Afk,
}

impl InputSource {
    fn bit(self) -> u8 {
        match self {
            InputSource::Normal => 0b01,
            InputSource::Afk => 0b10,
        }
    }
}

/// State reported by the host through the hooks.
#[derive(Debug)]
pub struct HookState {
    chat_manager: AtomicUsize,
    current_channel: AtomicU32,
    suppression: AtomicU8,
}

impl Default for HookState {
    fn default() -> Self {
        Self::new()
    }
}

impl HookState {
    /// Nothing observed yet.
    pub fn new() -> Self {
        Self {
            chat_manager: AtomicUsize::new(0),
            current_channel: AtomicU32::new(NO_CHANNEL),
            suppression: AtomicU8::new(0),
        }
    }

    /// Record a channel change seen by the channel-change hook.
    pub fn record_channel_change(&self, manager: usize, channel: u32) {
        self.chat_manager.store(manager, Ordering::Release);
        self.current_channel.store(channel, Ordering::Release);
    }

    /// Last chat manager pointer the host passed, if any.
    pub fn chat_manager(&self) -> Option<usize> {
        match self.chat_manager.load(Ordering::Acquire) {
            0 => None,
            manager => Some(manager),
        }
    }

    /// Last active channel the host reported.
    pub fn current_channel(&self) -> Option<InputChannel> {
        match self.current_channel.load(Ordering::Acquire) {
            NO_CHANNEL => None,
            id => InputChannel::from_id(id),
        }
    }

    /// Arm both suppression flags for the synthetic submit keystroke.
    pub fn suppress_next_input(&self) {
        self.suppression.fetch_or(
            InputSource::Normal.bit() | InputSource::Afk.bit(),
            Ordering::AcqRel,
        );
    }

    /// Consume the flag for `source`. Returns whether it was set.
    pub fn take_suppression(&self, source: InputSource) -> bool {
        let bit = source.bit();
        self.suppression.fetch_and(!bit, Ordering::AcqRel) & bit != 0
    }

    /// Whether the flag for `source` is set.
    pub fn is_suppressed(&self, source: InputSource) -> bool {
        self.suppression.load(Ordering::Acquire) & source.bit() != 0
    }
}

/// Original implementations the detours call through to.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Originals {
    pub channel_change: Option<ChannelChangeFn>,
    pub input: Option<InputFn>,
    pub input_afk: Option<InputAfkFn>,
}

#[derive(Debug, Clone)]
struct Binding {
    state: Arc<HookState>,
    originals: Originals,
}

static BINDING: RwLock<Option<Binding>> = RwLock::new(None);

/// Point the detours at `state` and `originals`.
pub(crate) fn bind(state: Arc<HookState>, originals: Originals) {
    let mut binding = BINDING.write().unwrap_or_else(PoisonError::into_inner);
    *binding = Some(Binding { state, originals });
}

/// Detach the detours. Later calls pass straight through to nothing.
pub(crate) fn unbind() {
    let mut binding = BINDING.write().unwrap_or_else(PoisonError::into_inner);
    *binding = None;
}

fn current() -> Option<Binding> {
    BINDING
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replacement for the host's channel-change callback.
pub(crate) unsafe extern "C" fn channel_change_detour(manager: usize, channel: u32) -> u8 {
    let Some(binding) = current() else {
        return 0;
    };
    binding.state.record_channel_change(manager, channel);
    match binding.originals.channel_change {
        // SAFETY: the original was produced by the installed hook.
        Some(original) => unsafe { original(manager, channel) },
        None => 0,
    }
}

/// Replacement for the host's text input poll.
pub(crate) unsafe extern "C" fn input_detour(a1: usize) -> u8 {
    let Some(binding) = current() else {
        return 0;
    };
    if binding.state.take_suppression(InputSource::Normal) {
        return 1;
    }
    match binding.originals.input {
        // SAFETY: the original was produced by the installed hook.
        Some(original) => unsafe { original(a1) },
        None => 0,
    }
}

/// Replacement for the host's idle-timer input poll.
pub(crate) unsafe extern "C" fn input_afk_detour() -> u8 {
    let Some(binding) = current() else {
        return 0;
    };
    if binding.state.take_suppression(InputSource::Afk) {
        return 1;
    }
    match binding.originals.input_afk {
        // SAFETY: the original was produced by the installed hook.
        Some(original) => unsafe { original() },
        None => 0,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Serializes tests that touch the process-wide binding.
    pub(crate) static BINDING_GUARD: Mutex<()> = Mutex::new(());

    static ORIGINAL_CALLS: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn fake_channel_change(_manager: usize, channel: u32) -> u8 {
        ORIGINAL_CALLS.fetch_add(1, Ordering::SeqCst);
        channel as u8
    }

    unsafe extern "C" fn fake_input(_a1: usize) -> u8 {
        ORIGINAL_CALLS.fetch_add(1, Ordering::SeqCst);
        7
    }

    unsafe extern "C" fn fake_input_afk() -> u8 {
        ORIGINAL_CALLS.fetch_add(1, Ordering::SeqCst);
        9
    }

    fn fake_originals() -> Originals {
        Originals {
            channel_change: Some(fake_channel_change),
            input: Some(fake_input),
            input_afk: Some(fake_input_afk),
        }
    }

    #[test]
    fn test_initial_state() {
        let state = HookState::new();
        assert_eq!(state.chat_manager(), None);
        assert_eq!(state.current_channel(), None);
        assert!(!state.is_suppressed(InputSource::Normal));
        assert!(!state.take_suppression(InputSource::Afk));
    }

    #[test]
    fn test_record_channel_change() {
        let state = HookState::new();
        state.record_channel_change(0xdead_0000, InputChannel::Party.id());
        assert_eq!(state.chat_manager(), Some(0xdead_0000));
        assert_eq!(state.current_channel(), Some(InputChannel::Party));

        // Ids the channel table does not know read back as unknown.
        state.record_channel_change(0xdead_0000, 17);
        assert_eq!(state.current_channel(), None);
    }

    #[test]
    fn test_suppression_flags_are_independent() {
        let state = HookState::new();
        state.suppress_next_input();

        assert!(state.take_suppression(InputSource::Normal));
        assert!(!state.take_suppression(InputSource::Normal));
        assert!(state.is_suppressed(InputSource::Afk));
        assert!(state.take_suppression(InputSource::Afk));
        assert!(!state.take_suppression(InputSource::Afk));
    }

    #[test]
    fn test_detours_consume_each_flag_once() {
        let _guard = BINDING_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
        let state = Arc::new(HookState::new());
        bind(state.clone(), fake_originals());
        ORIGINAL_CALLS.store(0, Ordering::SeqCst);

        state.suppress_next_input();
        unsafe {
            assert_eq!(input_detour(0), 1);
            assert_eq!(input_detour(0), 7);
            assert_eq!(input_afk_detour(), 1);
            assert_eq!(input_afk_detour(), 9);
        }
        assert_eq!(ORIGINAL_CALLS.load(Ordering::SeqCst), 2);

        unbind();
    }

    #[test]
    fn test_channel_change_detour_records_and_calls_through() {
        let _guard = BINDING_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
        let state = Arc::new(HookState::new());
        bind(state.clone(), fake_originals());

        let result = unsafe { channel_change_detour(0x1000, InputChannel::Shout.id()) };
        assert_eq!(result, InputChannel::Shout.id() as u8);
        assert_eq!(state.chat_manager(), Some(0x1000));
        assert_eq!(state.current_channel(), Some(InputChannel::Shout));

        unbind();
    }

    #[test]
    fn test_unbound_detours_do_nothing() {
        let _guard = BINDING_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
        unbind();
        unsafe {
            assert_eq!(input_detour(0), 0);
            assert_eq!(input_afk_detour(), 0);
            assert_eq!(channel_change_detour(1, 1), 0);
        }
    }
}
