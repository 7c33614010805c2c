//! Process-wide table of live bindings.
//!
//! Every live [`HandleWrapper`](crate::HandleWrapper) has exactly one entry here, keyed by the handle's address.
//! Binding an address that already has an entry fails, which is what keeps two wrappers from ever owning the same native resource.

use crate::error::BindingError;
use crate::handle::NativeHandle;
use slotmap::SlotMap;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

slotmap::new_key_type! {
    /// Identifies a binding for as long as its wrapper is live.
    pub(crate) struct BindingKey;
}

#[derive(Debug)]
struct Binding {
    address: usize,
    class: String,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    bindings: SlotMap<BindingKey, Binding>,
    by_address: HashMap<usize, BindingKey>,
}

impl Registry {
    pub(crate) fn bind(
        &mut self,
        handle: NativeHandle,
        class: &str,
    ) -> Result<BindingKey, BindingError> {
        if let Some(owner) = self.class_of(handle) {
            return Err(BindingError::AlreadyBound {
                handle,
                class: owner.to_string(),
            });
        }

        let key = self.bindings.insert(Binding {
            address: handle.addr(),
            class: class.to_string(),
        });
        self.by_address.insert(handle.addr(), key);

        Ok(key)
    }

    pub(crate) fn unbind(&mut self, key: BindingKey) {
        if let Some(binding) = self.bindings.remove(key) {
            self.by_address.remove(&binding.address);
        }
    }

    pub(crate) fn rebless(&mut self, key: BindingKey, class: &str) {
        if let Some(binding) = self.bindings.get_mut(key) {
            binding.class = class.to_string();
        }
    }

    fn class_of(&self, handle: NativeHandle) -> Option<&str> {
        let key = self.by_address.get(&handle.addr())?;
        self.bindings.get(*key).map(|binding| binding.class.as_str())
    }

    fn len(&self) -> usize {
        self.bindings.len()
    }
}

static REGISTRY: LazyLock<Mutex<Registry>> = LazyLock::new(Mutex::default);

/// Locks the global registry. A panic while holding the lock cannot leave it half-updated, so poisoning is ignored.
pub(crate) fn registry() -> MutexGuard<'static, Registry> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Whether a live wrapper currently owns `handle`.
pub fn is_bound(handle: NativeHandle) -> bool {
    registry().class_of(handle).is_some()
}

/// The class of the live wrapper owning `handle`, if any.
pub fn class_of(handle: NativeHandle) -> Option<String> {
    registry().class_of(handle).map(str::to_string)
}

/// Number of live wrappers in the process.
pub fn live_count() -> usize {
    registry().len()
}
