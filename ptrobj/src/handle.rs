//! Opaque native handles.

use std::ffi::c_void;
use std::ptr::NonNull;

/// An opaque, non-null pointer to a resource owned by native code.
///
/// The binding layer never looks behind the pointer.
/// A [`NativeHandle`] is a plain value: copying it does not duplicate the resource, and holding one does not keep the resource alive.
/// Ownership lives in [`HandleWrapper`](crate::HandleWrapper), which only ever hands out copies, so the stored value itself can never be overwritten from outside.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NativeHandle(NonNull<c_void>);

// Only an address; dereferencing it already requires `unsafe`.
unsafe impl Send for NativeHandle {}
unsafe impl Sync for NativeHandle {}

impl NativeHandle {
    /// Returns `None` if `ptr` is null.
    pub fn new<T>(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr.cast::<c_void>()).map(Self)
    }

    /// The raw pointer.
    pub const fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// The raw pointer, cast to the native type it actually points to.
    pub const fn cast<T>(self) -> *mut T {
        self.0.as_ptr().cast()
    }

    /// The address as a pointer-sized integer.
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl std::fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NativeHandle").field(&self.0).finish()
    }
}

impl std::fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.addr())
    }
}
