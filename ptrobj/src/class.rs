//! Classes: the runtime type a handle is blessed into.
//!
//! A class decides how a handle is released. Wrappers hold their class as an `Arc<dyn Class>`, so release always goes through the class the wrapper was actually built with, never through a statically assumed one.

use crate::handle::NativeHandle;
use std::sync::Arc;

/// Runtime type information for a wrapped handle.
pub trait Class: Send + Sync + 'static {
    /// Fully qualified class name, e.g. `"PtrObj::Context"`.
    fn name(&self) -> &str;

    /// The class this one derives from, if any.
    fn parent(&self) -> Option<&dyn Class> {
        None
    }

    /// Whether a freshly allocated handle may be adopted by this class.
    ///
    /// A handle refused here is released immediately.
    fn accepts(&self, handle: NativeHandle) -> bool {
        let _ = handle;
        true
    }

    /// Runs the native destructor.
    ///
    /// # Safety
    ///
    /// `handle` must have been produced by the allocator this class belongs to, and must not be used again afterwards.
    /// The binding layer calls this at most once per handle.
    unsafe fn release(&self, handle: NativeHandle);
}

impl std::fmt::Debug for dyn Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name())
            .field("parent", &self.parent().map(|parent| parent.name()))
            .finish()
    }
}

/// Whether `class` is the class called `name`, or derives from it.
pub fn isa(class: &dyn Class, name: &str) -> bool {
    let mut current = Some(class);
    while let Some(class) = current {
        if class.name() == name {
            return true;
        }
        current = class.parent();
    }
    false
}

type ReleaseHook = Box<dyn Fn(NativeHandle) + Send + Sync>;

/// A class deriving from another one.
///
/// Releasing a handle blessed into a [`Subclass`] first runs its own release hook, if any, then the parent's release.
/// The parent still frees the native resource, even if the hook panics; the hook only adds behaviour on top.
/// To replace release entirely, implement [`Class`] directly instead.
pub struct Subclass {
    name: String,
    parent: Arc<dyn Class>,
    on_release: Option<ReleaseHook>,
}

impl Subclass {
    pub fn new(name: impl Into<String>, parent: Arc<dyn Class>) -> Self {
        Self {
            name: name.into(),
            parent,
            on_release: None,
        }
    }

    /// Sets a hook that runs right before the parent releases the handle.
    pub fn on_release<F>(mut self, hook: F) -> Self
    where
        F: Fn(NativeHandle) + Send + Sync + 'static,
    {
        self.on_release = Some(Box::new(hook));
        self
    }
}

impl Class for Subclass {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<&dyn Class> {
        Some(self.parent.as_ref())
    }

    fn accepts(&self, handle: NativeHandle) -> bool {
        self.parent.accepts(handle)
    }

    unsafe fn release(&self, handle: NativeHandle) {
        let _parent = ParentRelease {
            parent: self.parent.as_ref(),
            handle,
        };

        if let Some(hook) = &self.on_release {
            hook(handle);
        }
    }
}

/// Runs the parent's release on drop, so it also runs while unwinding out of a panicking hook.
struct ParentRelease<'a> {
    parent: &'a dyn Class,
    handle: NativeHandle,
}

impl Drop for ParentRelease<'_> {
    fn drop(&mut self) {
        unsafe { self.parent.release(self.handle) }
    }
}

impl std::fmt::Debug for Subclass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subclass")
            .field("name", &self.name)
            .field("parent", &self.parent.name())
            .field("on_release", &self.on_release.as_ref().map(|_| "<closure>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        released: Mutex<Vec<usize>>,
    }

    struct Base(Arc<Recorder>);

    impl Class for Base {
        fn name(&self) -> &str {
            "Base"
        }

        unsafe fn release(&self, handle: NativeHandle) {
            self.0.released.lock().unwrap().push(handle.addr());
        }
    }

    fn handle(addr: usize) -> NativeHandle {
        NativeHandle::new(addr as *mut u8).unwrap()
    }

    #[test]
    fn test_isa_walks_parents() {
        let base: Arc<dyn Class> = Arc::new(Base(Arc::default()));
        let child: Arc<dyn Class> = Arc::new(Subclass::new("Child", base.clone()));
        let grandchild = Subclass::new("Grandchild", child.clone());

        assert!(isa(&grandchild, "Grandchild"));
        assert!(isa(&grandchild, "Child"));
        assert!(isa(&grandchild, "Base"));
        assert!(!isa(base.as_ref(), "Child"));
        assert!(!isa(&grandchild, "Unrelated"));
    }

    #[test]
    fn test_subclass_hook_runs_before_parent() {
        let recorder = Arc::new(Recorder::default());
        let base: Arc<dyn Class> = Arc::new(Base(recorder.clone()));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let hook_seen = seen.clone();
        let hook_recorder = recorder.clone();
        let child = Subclass::new("Child", base).on_release(move |handle| {
            // Parent has not released yet.
            assert!(hook_recorder.released.lock().unwrap().is_empty());
            hook_seen.lock().unwrap().push(handle.addr());
        });

        unsafe { child.release(handle(0x40)) };

        assert_eq!(*seen.lock().unwrap(), vec![0x40]);
        assert_eq!(*recorder.released.lock().unwrap(), vec![0x40]);
    }

    #[test]
    fn test_panicking_hook_still_releases_through_parent() {
        let recorder = Arc::new(Recorder::default());
        let base: Arc<dyn Class> = Arc::new(Base(recorder.clone()));
        let child = Subclass::new("Child", base).on_release(|_| panic!("hook failed"));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| unsafe {
            child.release(handle(0x50))
        }));

        assert!(result.is_err());
        assert_eq!(*recorder.released.lock().unwrap(), vec![0x50]);
    }

    #[test]
    fn test_debug_names_the_class() {
        let base: Arc<dyn Class> = Arc::new(Base(Arc::default()));
        let child: Arc<dyn Class> = Arc::new(Subclass::new("Child", base));

        let debug = format!("{:?}", child);
        assert!(debug.contains("Child"));
        assert!(debug.contains("Base"));
    }
}
