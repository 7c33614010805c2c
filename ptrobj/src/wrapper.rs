//! Owned wrappers around native handles.

use crate::binder::PendingRelease;
use crate::class::{Class, isa};
use crate::error::BindingError;
use crate::handle::NativeHandle;
use crate::registry::{BindingKey, registry};
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;

/// Lifecycle state of a [`HandleWrapper`].
///
/// A wrapper only exists once its handle is allocated; construction that fails never produces one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HandleState {
    /// The wrapper owns a live native resource.
    Allocated,

    /// The native destructor has run. This state is terminal.
    Released,
}

/// The sole owner of a native handle, blessed into a [`Class`].
///
/// The handle is released through the wrapper's class, exactly once: either by an explicit call to [`Self::release`] or when the wrapper is dropped, whichever comes first.
/// Any method dispatched after that fails with [`BindingError::UseAfterRelease`].
///
/// A wrapper can be moved to another thread but not shared between threads.
pub struct HandleWrapper {
    handle: Option<NativeHandle>,
    class: Arc<dyn Class>,
    key: BindingKey,
    _not_sync: PhantomData<Cell<()>>,
}

impl HandleWrapper {
    /// Takes ownership of `ptr` and blesses it into `class`.
    ///
    /// # Errors
    ///
    /// - [`BindingError::InvalidHandle`] if `ptr` is null.
    /// - [`BindingError::Rejected`] if `class` refuses the handle. The handle is released.
    /// - [`BindingError::AlreadyBound`] if another live wrapper owns the same handle. The handle is left untouched.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live resource that `class` knows how to release, and nothing else may release it.
    pub unsafe fn wrap<T>(ptr: *mut T, class: Arc<dyn Class>) -> Result<Self, BindingError> {
        let handle = NativeHandle::new(ptr).ok_or(BindingError::InvalidHandle)?;
        Self::adopt(PendingRelease::new(handle, class))
    }

    pub(crate) fn adopt(pending: PendingRelease) -> Result<Self, BindingError> {
        let handle = pending.handle();

        if !pending.class().accepts(handle) {
            let class = pending.class().name().to_string();
            tracing::warn!(%class, %handle, "class rejected native handle");
            return Err(BindingError::Rejected { class });
        }

        let bound = registry().bind(handle, pending.class().name());
        let key = match bound {
            Ok(key) => key,
            Err(error) => {
                tracing::warn!(%handle, %error, "refusing to wrap a handle twice");
                pending.abandon();
                return Err(error);
            }
        };

        let (handle, class) = pending.disarm();
        tracing::debug!(class = class.name(), %handle, "bound native handle");

        Ok(Self {
            handle: Some(handle),
            class,
            key,
            _not_sync: PhantomData,
        })
    }

    /// Returns the stored handle for call forwarding. Ownership stays with the wrapper.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::UseAfterRelease`] once the wrapper has been released.
    pub fn raw_handle(&self) -> Result<NativeHandle, BindingError> {
        self.handle.ok_or(BindingError::UseAfterRelease)
    }

    /// Forwards a call to the native library.
    pub fn dispatch<R>(&self, call: impl FnOnce(NativeHandle) -> R) -> Result<R, BindingError> {
        self.raw_handle().map(call)
    }

    /// Forwards a call, provided this wrapper is an `expected` or derives from it.
    ///
    /// # Errors
    ///
    /// - [`BindingError::UseAfterRelease`] once the wrapper has been released.
    /// - [`BindingError::TypeMismatch`] if the wrapper's class does not derive from `expected`.
    pub fn dispatch_as<R>(
        &self,
        expected: &str,
        call: impl FnOnce(NativeHandle) -> R,
    ) -> Result<R, BindingError> {
        let handle = self.raw_handle()?;

        if !self.isa(expected) {
            return Err(BindingError::TypeMismatch {
                expected: expected.to_string(),
                actual: self.class.name().to_string(),
            });
        }

        Ok(call(handle))
    }

    /// Runs the native destructor through the wrapper's class.
    ///
    /// Calling this more than once does nothing.
    pub fn release(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        registry().unbind(self.key);

        tracing::debug!(class = self.class.name(), %handle, "releasing native handle");
        unsafe { self.class.release(handle) }
    }

    /// Blesses the wrapper into `class`, which must derive from the current class and accept the handle.
    ///
    /// On error the wrapper keeps its current class and still owns the handle.
    ///
    /// # Errors
    ///
    /// - [`BindingError::UseAfterRelease`] once the wrapper has been released.
    /// - [`BindingError::TypeMismatch`] if `class` does not derive from the current class.
    /// - [`BindingError::Rejected`] if `class` refuses the handle.
    pub fn rebless(&mut self, class: Arc<dyn Class>) -> Result<(), BindingError> {
        let handle = self.raw_handle()?;

        if !isa(class.as_ref(), self.class.name()) {
            return Err(BindingError::TypeMismatch {
                expected: self.class.name().to_string(),
                actual: class.name().to_string(),
            });
        }

        if !class.accepts(handle) {
            let class = class.name().to_string();
            tracing::warn!(%class, %handle, "class rejected native handle");
            return Err(BindingError::Rejected { class });
        }

        registry().rebless(self.key, class.name());
        tracing::debug!(from = self.class.name(), to = class.name(), "reblessed wrapper");
        self.class = class;

        Ok(())
    }

    pub fn state(&self) -> HandleState {
        match self.handle {
            Some(_) => HandleState::Allocated,
            None => HandleState::Released,
        }
    }

    pub fn is_released(&self) -> bool {
        self.state() == HandleState::Released
    }

    /// The class the wrapper is currently blessed into.
    pub fn class(&self) -> &dyn Class {
        self.class.as_ref()
    }

    /// Whether the wrapper's class is `name` or derives from it.
    pub fn isa(&self, name: &str) -> bool {
        isa(self.class.as_ref(), name)
    }
}

impl Drop for HandleWrapper {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for HandleWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleWrapper")
            .field("handle", &self.handle)
            .field("class", &self.class.name())
            .finish()
    }
}
