/*!
# ptrobj

Owned Rust objects for opaque native pointers.

A native library hands out a raw pointer to a resource it allocated; `ptrobj` turns that pointer into a value with a lifetime:

- [`Binder`] allocates the resource and wraps it atomically. Construction yields either a fully bound [`HandleWrapper`] or an error, never a half-built object holding a dangling pointer.
- [`HandleWrapper`] owns exactly one [`NativeHandle`]. It forwards method calls to the native library and runs the native destructor exactly once, on [`HandleWrapper::release`] or on drop.
- A [`Class`] is the runtime type a handle is blessed into. It decides how the handle is released, so a derived class's release override is always the one that runs.

[`Context`] shows the pattern end to end against the `ptrobj-sys` native library.

## Example

```
use ptrobj::{BindingError, Context, ContextSettings};

let mut context = Context::try_new(&ContextSettings::default())?;
context.set_option("silence_threshold", 100)?;
assert_eq!(context.option("silence_threshold")?, 100);

context.release();
context.release(); // no-op
assert_eq!(context.option("silence_threshold"), Err(BindingError::UseAfterRelease));
# Ok::<(), BindingError>(())
```

## Logging

Allocation, binding and release are reported through [`tracing`] at debug level; refused handles are reported at warn level.
The crate never installs a subscriber.
*/

mod binder;
pub use binder::{Allocator, Binder};

mod class;
pub use class::{Class, Subclass, isa};

mod context;
pub use context::{Algorithm, Context, ContextClass, ContextFlags, ContextSettings};

mod error;
pub use error::{BindingError, NativeError, to_option_error};

mod handle;
pub use handle::NativeHandle;

pub mod registry;

pub mod version;
pub use version::{Version, native_version};

mod wrapper;
pub use wrapper::{HandleState, HandleWrapper};
