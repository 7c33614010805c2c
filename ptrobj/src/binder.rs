//! Ties native allocation to wrapper construction.

use crate::class::{Class, isa};
use crate::error::{BindingError, NativeError};
use crate::handle::NativeHandle;
use crate::wrapper::HandleWrapper;
use std::ffi::c_void;
use std::sync::Arc;

/// Produces native resources from construction arguments.
///
/// Any `Fn(&Args) -> Result<*mut c_void, NativeError>` is an allocator.
pub trait Allocator<Args: ?Sized> {
    /// Allocates exactly one native resource. The caller owns the returned pointer.
    fn allocate(&self, args: &Args) -> Result<*mut c_void, NativeError>;
}

impl<Args, F> Allocator<Args> for F
where
    Args: ?Sized,
    F: Fn(&Args) -> Result<*mut c_void, NativeError>,
{
    fn allocate(&self, args: &Args) -> Result<*mut c_void, NativeError> {
        self(args)
    }
}

/// A handle that has been allocated but not yet handed to a [`HandleWrapper`].
///
/// Dropping it releases the handle, so every early exit between allocation and wrapping frees the resource.
pub(crate) struct PendingRelease {
    handle: NativeHandle,
    class: Arc<dyn Class>,
    armed: bool,
}

impl PendingRelease {
    pub(crate) fn new(handle: NativeHandle, class: Arc<dyn Class>) -> Self {
        Self {
            handle,
            class,
            armed: true,
        }
    }

    pub(crate) fn handle(&self) -> NativeHandle {
        self.handle
    }

    pub(crate) fn class(&self) -> &dyn Class {
        self.class.as_ref()
    }

    /// Hands the handle over to its new owner.
    pub(crate) fn disarm(mut self) -> (NativeHandle, Arc<dyn Class>) {
        self.armed = false;
        (self.handle, self.class.clone())
    }

    /// Gives up on the handle without releasing it, because someone else owns it.
    pub(crate) fn abandon(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingRelease {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(
                class = self.class.name(),
                handle = %self.handle,
                "releasing native handle of an unfinished construction"
            );
            unsafe { self.class.release(self.handle) }
        }
    }
}

/// Pairs an [`Allocator`] with the [`Class`] its resources are blessed into.
///
/// Construction is atomic: [`Self::construct`] either returns a fully bound wrapper or an error, and in the error case no resource is left behind.
pub struct Binder<A> {
    allocator: A,
    class: Arc<dyn Class>,
}

impl<A> Binder<A> {
    /// # Safety
    ///
    /// `class` must be able to release every resource `allocator` produces.
    pub unsafe fn new(allocator: A, class: Arc<dyn Class>) -> Self {
        Self { allocator, class }
    }

    /// The class constructed wrappers are blessed into.
    pub fn class(&self) -> &dyn Class {
        self.class.as_ref()
    }

    /// A binder over the same allocator that blesses into `class` instead.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::TypeMismatch`] if `class` does not derive from this binder's class.
    pub fn bless(&self, class: Arc<dyn Class>) -> Result<Binder<A>, BindingError>
    where
        A: Clone,
    {
        if !isa(class.as_ref(), self.class.name()) {
            return Err(BindingError::TypeMismatch {
                expected: self.class.name().to_string(),
                actual: class.name().to_string(),
            });
        }

        Ok(Binder {
            allocator: self.allocator.clone(),
            class,
        })
    }

    /// Allocates a native resource from `args` and wraps it.
    ///
    /// # Errors
    ///
    /// - [`BindingError::Allocation`] if the allocator fails.
    /// - [`BindingError::InvalidHandle`] if the allocator reports success but returns null.
    /// - Any error of [`HandleWrapper::wrap`]. A rejected handle is released before returning.
    pub fn construct<Args>(&self, args: &Args) -> Result<HandleWrapper, BindingError>
    where
        Args: ?Sized,
        A: Allocator<Args>,
    {
        let ptr = self.allocator.allocate(args).map_err(|error| {
            tracing::debug!(class = self.class.name(), %error, "native allocation failed");
            BindingError::Allocation(error)
        })?;

        let handle = NativeHandle::new(ptr).ok_or(BindingError::InvalidHandle)?;
        tracing::debug!(class = self.class.name(), %handle, "allocated native handle");

        HandleWrapper::adopt(PendingRelease::new(handle, self.class.clone()))
    }
}

impl<A> std::fmt::Debug for Binder<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("class", &self.class.name())
            .finish_non_exhaustive()
    }
}
