//! Function detours.
//!
//! On Windows detours are installed with MinHook; elsewhere every install
//! fails with [`NativeError::Unsupported`] so the rest of the bridge can still
//! be built and tested.

use std::mem::{size_of, transmute_copy};

use super::NativeError;

/// An installed detour redirecting one host function.
pub struct Detour {
    #[cfg(windows)]
    target: usize,
    #[cfg(windows)]
    trampoline: usize,
    #[cfg(windows)]
    enabled: std::sync::atomic::AtomicBool,
    #[cfg(not(windows))]
    never: std::convert::Infallible,
}

impl std::fmt::Debug for Detour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detour")
            .field("enabled", &self.is_enabled())
            .field("trampoline", &format_args!("{:#x}", self.trampoline()))
            .finish()
    }
}

#[cfg(windows)]
impl Detour {
    /// Prepare a detour from `target` to `detour`. It starts disabled.
    ///
    /// # Safety
    ///
    /// `target` must be the entry point of a function in this process and
    /// `detour` a function with an identical signature and calling convention.
    pub unsafe fn new(target: usize, detour: usize) -> Result<Self, NativeError> {
        use std::ffi::c_void;

        // SAFETY: upheld by the caller.
        let trampoline =
            unsafe { minhook::MinHook::create_hook(target as *mut c_void, detour as *mut c_void) }
                .map_err(|e| NativeError::Hook(format!("create_hook: {:?}", e)))?;
        Ok(Self {
            target,
            trampoline: trampoline as usize,
            enabled: std::sync::atomic::AtomicBool::new(false),
        })
    }

    /// Start redirecting calls.
    ///
    /// # Safety
    ///
    /// No thread may be executing the patched prologue while it is written.
    pub unsafe fn enable(&self) -> Result<(), NativeError> {
        // SAFETY: upheld by the caller.
        unsafe { minhook::MinHook::enable_hook(self.target as *mut std::ffi::c_void) }
            .map_err(|e| NativeError::Hook(format!("enable_hook: {:?}", e)))?;
        self.enabled
            .store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    /// Restore the original prologue.
    ///
    /// # Safety
    ///
    /// Same as [`Detour::enable`].
    pub unsafe fn disable(&self) -> Result<(), NativeError> {
        // SAFETY: upheld by the caller.
        unsafe { minhook::MinHook::disable_hook(self.target as *mut std::ffi::c_void) }
            .map_err(|e| NativeError::Hook(format!("disable_hook: {:?}", e)))?;
        self.enabled
            .store(false, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    /// Whether calls are currently redirected.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Address that runs the original function.
    pub fn trampoline(&self) -> usize {
        self.trampoline
    }
}

#[cfg(windows)]
impl Drop for Detour {
    fn drop(&mut self) {
        // SAFETY: drop happens on the frame-loop thread that created the hook.
        let target = self.target as *mut std::ffi::c_void;
        let removed = unsafe { minhook::MinHook::remove_hook(target) };
        if let Err(e) = removed {
            tracing::warn!(
                target = format_args!("{:#x}", self.target),
                "failed to remove hook: {:?}",
                e
            );
        }
    }
}

#[cfg(not(windows))]
impl Detour {
    /// Detours need Windows; this always fails.
    ///
    /// # Safety
    ///
    /// Kept `unsafe` to match the Windows signature.
    pub unsafe fn new(_target: usize, _detour: usize) -> Result<Self, NativeError> {
        Err(NativeError::Unsupported)
    }

    /// Unreachable: no `Detour` can exist on this platform.
    ///
    /// # Safety
    ///
    /// Kept `unsafe` to match the Windows signature.
    pub unsafe fn enable(&self) -> Result<(), NativeError> {
        match self.never {}
    }

    /// Unreachable: no `Detour` can exist on this platform.
    ///
    /// # Safety
    ///
    /// Kept `unsafe` to match the Windows signature.
    pub unsafe fn disable(&self) -> Result<(), NativeError> {
        match self.never {}
    }

    /// Unreachable: no `Detour` can exist on this platform.
    pub fn is_enabled(&self) -> bool {
        match self.never {}
    }

    /// Unreachable: no `Detour` can exist on this platform.
    pub fn trampoline(&self) -> usize {
        match self.never {}
    }
}

/// A typed detour. `F` is the `extern "C" fn` type of the hooked function.
pub struct Hook<F: Copy> {
    name: &'static str,
    detour: Detour,
    original: F,
}

impl<F: Copy> std::fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("detour", &self.detour)
            .finish()
    }
}

impl<F: Copy> Hook<F> {
    /// Prepare a detour from `target` to `replacement`. It starts disabled.
    ///
    /// # Safety
    ///
    /// `target` must be a function of type `F` in this process, and the
    /// caller must be on the thread that owns the host's frame loop.
    pub unsafe fn install(
        name: &'static str,
        target: usize,
        replacement: F,
    ) -> Result<Self, NativeError> {
        if size_of::<F>() != size_of::<usize>() {
            return Err(NativeError::Hook(format!(
                "{name}: hook type is not a function pointer"
            )));
        }
        // SAFETY: F is pointer-sized, checked above.
        let replacement: usize = unsafe { transmute_copy(&replacement) };
        // SAFETY: upheld by the caller.
        let detour = unsafe { Detour::new(target, replacement) }?;
        let trampoline = detour.trampoline();
        // SAFETY: the trampoline has the same signature as `target`.
        let original: F = unsafe { transmute_copy(&trampoline) };
        tracing::debug!(hook = name, target = format_args!("{target:#x}"), "hook created");

        Ok(Self {
            name,
            detour,
            original,
        })
    }

    /// Hook name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Callable original implementation.
    pub fn original(&self) -> F {
        self.original
    }

    /// Whether calls are currently redirected.
    pub fn is_enabled(&self) -> bool {
        self.detour.is_enabled()
    }

    /// Start redirecting calls.
    ///
    /// # Safety
    ///
    /// Must run on the host's frame-loop thread, after everything the
    /// replacement reads has been set up.
    pub unsafe fn enable(&self) -> Result<(), NativeError> {
        // SAFETY: upheld by the caller.
        unsafe { self.detour.enable() }
    }

    /// Stop redirecting calls.
    ///
    /// # Safety
    ///
    /// Must run on the host's frame-loop thread.
    pub unsafe fn disable(&self) {
        // SAFETY: upheld by the caller.
        if let Err(e) = unsafe { self.detour.disable() } {
            tracing::warn!(hook = self.name, "failed to disable hook: {}", e);
        }
    }
}
