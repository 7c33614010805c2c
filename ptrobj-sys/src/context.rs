//! Context allocation, release and option storage.

use crate::{
    PTO_ALGORITHM_TEST1, PTO_ALGORITHM_TEST5, PTO_SILENCE_THRESHOLD_MAX, PTO_VERSION_MAJOR,
    PTO_VERSION_MINOR, PTOContext, PTOContextFlags, PTOContextSettings, PTOerror,
};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::sync::atomic::{AtomicUsize, Ordering};

static LIVE_CONTEXTS: AtomicUsize = AtomicUsize::new(0);

/// What a [`PTOContext`] points to.
#[derive(Debug)]
struct ContextState {
    algorithm: c_int,
    flags: PTOContextFlags,
    silence_threshold: c_int,
}

impl ContextState {
    /// # Safety
    ///
    /// `context` must be null or a live handle returned by [`ptoContextCreate`].
    unsafe fn from_handle<'a>(context: PTOContext) -> Option<&'a mut Self> {
        unsafe { context.cast::<ContextState>().as_mut() }
    }

    fn validating(&self) -> bool {
        self.flags.0 & PTOContextFlags::PTO_CONTEXTFLAGS_VALIDATION.0 != 0
    }
}

fn version_compatible(version: u32) -> bool {
    let major = version >> 16;
    let minor = (version >> 8) & 0xff;
    major == PTO_VERSION_MAJOR && minor <= PTO_VERSION_MINOR
}

/// Creates a context.
///
/// On success `*context` receives the new handle. The caller owns it and must pass it to [`ptoContextRelease`] exactly once.
///
/// # Errors
///
/// - `PTO_STATUS_FAILURE` if `settings` or `context` is null.
/// - `PTO_STATUS_INITIALIZATION` if `settings.version` is not compatible with this library.
/// - `PTO_STATUS_INVALIDARGUMENT` if `settings.algorithm` is unknown.
///
/// # Safety
///
/// `settings` and `context` must be null or valid for reads and writes respectively.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ptoContextCreate(
    settings: *const PTOContextSettings,
    context: *mut PTOContext,
) -> PTOerror {
    if settings.is_null() || context.is_null() {
        return PTOerror::PTO_STATUS_FAILURE;
    }

    let settings = unsafe { &*settings };

    if !version_compatible(settings.version) {
        return PTOerror::PTO_STATUS_INITIALIZATION;
    }

    if !(PTO_ALGORITHM_TEST1..=PTO_ALGORITHM_TEST5).contains(&settings.algorithm) {
        return PTOerror::PTO_STATUS_INVALIDARGUMENT;
    }

    let state = Box::new(ContextState {
        algorithm: settings.algorithm,
        flags: settings.flags,
        silence_threshold: 0,
    });

    LIVE_CONTEXTS.fetch_add(1, Ordering::SeqCst);

    unsafe { *context = Box::into_raw(state).cast() };

    PTOerror::PTO_STATUS_SUCCESS
}

/// Frees a context and nulls the caller's handle.
///
/// Passing a null pointer, or a pointer to a null handle, does nothing.
///
/// # Safety
///
/// `*context` must be null or a live handle returned by [`ptoContextCreate`] that has not been released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ptoContextRelease(context: *mut PTOContext) {
    if context.is_null() {
        return;
    }

    let handle = unsafe { std::mem::replace(&mut *context, std::ptr::null_mut()) };
    if handle.is_null() {
        return;
    }

    drop(unsafe { Box::from_raw(handle.cast::<ContextState>()) });

    LIVE_CONTEXTS.fetch_sub(1, Ordering::SeqCst);
}

/// Returns the algorithm the context was created with, or -1 for a null handle.
///
/// # Safety
///
/// `context` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ptoContextGetAlgorithm(context: PTOContext) -> c_int {
    match unsafe { ContextState::from_handle(context) } {
        Some(state) => state.algorithm,
        None => -1,
    }
}

/// Returns the flags the context was created with. A null handle yields no flags.
///
/// # Safety
///
/// `context` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ptoContextGetFlags(context: PTOContext) -> PTOContextFlags {
    match unsafe { ContextState::from_handle(context) } {
        Some(state) => state.flags,
        None => PTOContextFlags::default(),
    }
}

/// Sets a named integer option.
///
/// The only known option is `silence_threshold`, valid between 0 and [`PTO_SILENCE_THRESHOLD_MAX`].
/// Out-of-range values are clamped, unless the context was created with `PTO_CONTEXTFLAGS_VALIDATION`, in which case they are rejected.
///
/// # Safety
///
/// `context` must be null or a live handle, `name` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ptoContextSetOption(
    context: PTOContext,
    name: *const c_char,
    value: c_int,
) -> PTOerror {
    let Some(state) = (unsafe { ContextState::from_handle(context) }) else {
        return PTOerror::PTO_STATUS_FAILURE;
    };
    if name.is_null() {
        return PTOerror::PTO_STATUS_FAILURE;
    }

    match unsafe { CStr::from_ptr(name) }.to_bytes() {
        b"silence_threshold" => {
            let in_range = (0..=PTO_SILENCE_THRESHOLD_MAX).contains(&value);
            if !in_range && state.validating() {
                return PTOerror::PTO_STATUS_INVALIDARGUMENT;
            }
            state.silence_threshold = value.clamp(0, PTO_SILENCE_THRESHOLD_MAX);
            PTOerror::PTO_STATUS_SUCCESS
        }
        _ => PTOerror::PTO_STATUS_INVALIDARGUMENT,
    }
}

/// Reads a named integer option into `*value`.
///
/// # Safety
///
/// `context` must be null or a live handle, `name` must be null or a valid NUL-terminated string, `value` must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ptoContextGetOption(
    context: PTOContext,
    name: *const c_char,
    value: *mut c_int,
) -> PTOerror {
    let Some(state) = (unsafe { ContextState::from_handle(context) }) else {
        return PTOerror::PTO_STATUS_FAILURE;
    };
    if name.is_null() || value.is_null() {
        return PTOerror::PTO_STATUS_FAILURE;
    }

    match unsafe { CStr::from_ptr(name) }.to_bytes() {
        b"silence_threshold" => {
            unsafe { *value = state.silence_threshold };
            PTOerror::PTO_STATUS_SUCCESS
        }
        _ => PTOerror::PTO_STATUS_INVALIDARGUMENT,
    }
}

/// Number of contexts created and not yet released.
#[unsafe(no_mangle)]
pub extern "C" fn ptoContextLiveCount() -> usize {
    LIVE_CONTEXTS.load(Ordering::SeqCst)
}
