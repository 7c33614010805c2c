/*!
# ptrobj-sys

A small native context library exposing a C ABI.
This crate is not meant to be used directly; most users should use `ptrobj`, a safe wrapper built on top of `ptrobj-sys`.

## Overview

`ptrobj-sys` allocates an opaque context structure and hands it out as a raw pointer ([`PTOContext`]).
Every function is inherently unsafe: the library trusts the caller to pass handles it created and to release each of them exactly once.
For a safe API that enforces those rules, refer to `ptrobj`.

## Lifecycle

1. Fill a [`PTOContextSettings`] and call [`ptoContextCreate`].
2. Query or configure the context with the `ptoContextGet*` / `ptoContextSet*` functions.
3. Call [`ptoContextRelease`] once. The handle is nulled and must not be used again.

[`ptoContextLiveCount`] reports how many contexts are currently allocated, which makes leaks and double frees observable from tests.
*/

#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]

mod context;

pub use context::{
    ptoContextCreate, ptoContextGetAlgorithm, ptoContextGetFlags, ptoContextGetOption,
    ptoContextLiveCount, ptoContextRelease, ptoContextSetOption,
};

use std::os::raw::{c_char, c_int};

pub const PTO_VERSION_MAJOR: u32 = 0;
pub const PTO_VERSION_MINOR: u32 = 3;
pub const PTO_VERSION_PATCH: u32 = 0;
pub const PTO_VERSION: u32 =
    (PTO_VERSION_MAJOR << 16) | (PTO_VERSION_MINOR << 8) | PTO_VERSION_PATCH;

pub const PTO_ALGORITHM_TEST1: c_int = 0;
pub const PTO_ALGORITHM_TEST2: c_int = 1;
pub const PTO_ALGORITHM_TEST3: c_int = 2;
pub const PTO_ALGORITHM_TEST4: c_int = 3;
pub const PTO_ALGORITHM_TEST5: c_int = 4;
pub const PTO_ALGORITHM_DEFAULT: c_int = PTO_ALGORITHM_TEST2;

/// Upper bound accepted for the `silence_threshold` option.
pub const PTO_SILENCE_THRESHOLD_MAX: c_int = 32767;

/// Status codes returned by the library.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PTOerror {
    PTO_STATUS_SUCCESS = 0,
    PTO_STATUS_FAILURE = 1,
    PTO_STATUS_OUTOFMEMORY = 2,
    PTO_STATUS_INITIALIZATION = 3,
    PTO_STATUS_INVALIDARGUMENT = 4,
}

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct PTOContextFlags(pub u32);

impl PTOContextFlags {
    /// Reject out-of-range option values instead of clamping them.
    pub const PTO_CONTEXTFLAGS_VALIDATION: PTOContextFlags = PTOContextFlags(1 << 0);
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct PTOContextSettings {
    pub version: u32,
    pub algorithm: c_int,
    pub flags: PTOContextFlags,
}

#[repr(C)]
#[derive(Debug)]
pub struct _PTOContext_t {
    _unused: [u8; 0],
}

pub type PTOContext = *mut _PTOContext_t;

/// Library version string, e.g. `"0.3.0"`.
///
/// The returned string is static and must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn ptoGetVersion() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
