#![allow(dead_code)]

use ptrobj::{Class, NativeError, NativeHandle};
use std::ffi::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const BOX_CLASS: &str = "Test::Box";

pub type BoxAllocator = fn(&u64) -> Result<*mut c_void, NativeError>;

// Stands in for a native library: resources are boxed `u64`s.
pub fn allocate_box(value: &u64) -> Result<*mut c_void, NativeError> {
    Ok(Box::into_raw(Box::new(*value)).cast::<c_void>())
}

pub fn read_box(handle: NativeHandle) -> u64 {
    unsafe { *handle.cast::<u64>() }
}

/// Frees boxed `u64`s and counts the calls.
#[derive(Debug, Default)]
pub struct BoxClass {
    released: AtomicUsize,
}

impl BoxClass {
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl Class for BoxClass {
    fn name(&self) -> &str {
        BOX_CLASS
    }

    unsafe fn release(&self, handle: NativeHandle) {
        drop(unsafe { Box::from_raw(handle.cast::<u64>()) });
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
