//! A native context, bound through [`Binder`].

use crate::binder::Binder;
use crate::class::Class;
use crate::error::{BindingError, NativeError, to_option_error};
use crate::handle::NativeHandle;
use crate::version::Version;
use crate::wrapper::HandleWrapper;
use std::ffi::{CString, c_void};
use std::os::raw::c_int;
use std::sync::Arc;

type AllocateFn = fn(&ContextSettings) -> Result<*mut c_void, NativeError>;

/// The class native contexts are blessed into by default.
///
/// Releasing a handle of this class calls `ptoContextRelease`.
/// Derived context classes must have it as an ancestor, typically through [`Subclass`](crate::Subclass).
#[derive(Debug, Default, Copy, Clone)]
pub struct ContextClass;

impl ContextClass {
    pub const NAME: &'static str = "PtrObj::Context";
}

impl Class for ContextClass {
    fn name(&self) -> &str {
        Self::NAME
    }

    unsafe fn release(&self, handle: NativeHandle) {
        let mut context: ptrobj_sys::PTOContext = handle.cast();
        unsafe { ptrobj_sys::ptoContextRelease(&mut context) }
    }
}

fn allocate(settings: &ContextSettings) -> Result<*mut c_void, NativeError> {
    let settings = ptrobj_sys::PTOContextSettings::try_from(settings)?;
    let mut context: ptrobj_sys::PTOContext = std::ptr::null_mut();

    let status = unsafe { ptrobj_sys::ptoContextCreate(&settings, &mut context) };

    if let Some(error) = to_option_error(status) {
        return Err(error);
    }

    Ok(context.cast())
}

/// A native context object.
///
/// The context owns one `PTOContext` allocated by the native library.
/// It is released when [`Self::release`] is called or when the context is dropped; methods called after that fail with [`BindingError::UseAfterRelease`].
#[derive(Debug)]
pub struct Context {
    wrapper: HandleWrapper,
}

impl Context {
    /// Creates a context blessed into [`ContextClass`].
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Allocation`] if the native library refuses the settings.
    pub fn try_new(settings: &ContextSettings) -> Result<Self, BindingError> {
        Self::try_with_class(settings, Arc::new(ContextClass))
    }

    /// Creates a context blessed into `class`, which must derive from [`ContextClass`].
    ///
    /// # Errors
    ///
    /// - [`BindingError::TypeMismatch`] if `class` does not derive from [`ContextClass`]. Nothing is allocated.
    /// - [`BindingError::Allocation`] if the native library refuses the settings.
    pub fn try_with_class(
        settings: &ContextSettings,
        class: Arc<dyn Class>,
    ) -> Result<Self, BindingError> {
        let base = unsafe { Binder::new(allocate as AllocateFn, Arc::new(ContextClass)) };
        let wrapper = base.bless(class)?.construct(settings)?;

        Ok(Self { wrapper })
    }

    /// The algorithm the context was created with.
    pub fn algorithm(&self) -> Result<Algorithm, BindingError> {
        let raw = self.wrapper.dispatch_as(ContextClass::NAME, |handle| unsafe {
            ptrobj_sys::ptoContextGetAlgorithm(handle.cast())
        })?;

        Algorithm::try_from(raw).map_err(|_| BindingError::Native(NativeError::Unspecified))
    }

    /// The flags the context was created with.
    pub fn flags(&self) -> Result<ContextFlags, BindingError> {
        let flags = self.wrapper.dispatch_as(ContextClass::NAME, |handle| unsafe {
            ptrobj_sys::ptoContextGetFlags(handle.cast())
        })?;

        Ok(flags.into())
    }

    /// Reads a named option.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Native`] with [`NativeError::InvalidArgument`] for an unknown option.
    pub fn option(&self, name: &str) -> Result<i32, BindingError> {
        let name = option_name(name)?;
        let mut value: c_int = 0;

        let status = self.wrapper.dispatch_as(ContextClass::NAME, |handle| unsafe {
            ptrobj_sys::ptoContextGetOption(handle.cast(), name.as_ptr(), &mut value)
        })?;

        if let Some(error) = to_option_error(status) {
            return Err(BindingError::Native(error));
        }

        Ok(value)
    }

    /// Sets a named option.
    ///
    /// Out-of-range values are clamped, unless the context was created with [`ContextFlags::VALIDATION`].
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Native`] with [`NativeError::InvalidArgument`] for an unknown option, or for an out-of-range value under validation.
    pub fn set_option(&mut self, name: &str, value: i32) -> Result<(), BindingError> {
        let name = option_name(name)?;

        let status = self.wrapper.dispatch_as(ContextClass::NAME, |handle| unsafe {
            ptrobj_sys::ptoContextSetOption(handle.cast(), name.as_ptr(), value)
        })?;

        match to_option_error(status) {
            Some(error) => Err(BindingError::Native(error)),
            None => Ok(()),
        }
    }

    /// Releases the native context. Calling this more than once does nothing.
    pub fn release(&mut self) {
        self.wrapper.release();
    }

    pub fn is_released(&self) -> bool {
        self.wrapper.is_released()
    }

    /// Blesses the context into a class deriving from its current one.
    pub fn rebless(&mut self, class: Arc<dyn Class>) -> Result<(), BindingError> {
        self.wrapper.rebless(class)
    }

    /// Returns the raw native handle.
    ///
    /// This is intended for internal use and advanced scenarios.
    pub fn raw_handle(&self) -> Result<NativeHandle, BindingError> {
        self.wrapper.raw_handle()
    }

    pub fn wrapper(&self) -> &HandleWrapper {
        &self.wrapper
    }
}

fn option_name(name: &str) -> Result<CString, BindingError> {
    CString::new(name).map_err(|_| BindingError::InvalidOptionName(name.to_string()))
}

/// Settings used to create a [`Context`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ContextSettings {
    /// The API version.
    ///
    /// Context creation will fail if the native library does not implement a compatible version of the API.
    /// Typically, this should be left at its default.
    pub version: Version,

    /// The algorithm preset stored in the context.
    pub algorithm: Algorithm,

    /// Additional flags for modifying the behavior of the created context.
    pub flags: ContextFlags,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            version: Version::default(),
            algorithm: Algorithm::default(),
            flags: ContextFlags::empty(),
        }
    }
}

impl TryFrom<&ContextSettings> for ptrobj_sys::PTOContextSettings {
    type Error = NativeError;

    /// Fails with [`NativeError::Initialization`] if the version cannot be packed, the same error an incompatible version gets.
    fn try_from(settings: &ContextSettings) -> Result<Self, Self::Error> {
        let version = u32::try_from(settings.version).map_err(|version| {
            tracing::warn!(?version, "context version does not fit the packed format");
            NativeError::Initialization
        })?;

        Ok(Self {
            version,
            algorithm: settings.algorithm.into(),
            flags: settings.flags.into(),
        })
    }
}

/// Algorithm presets known to the native library.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Algorithm {
    Test1,
    #[default]
    Test2,
    Test3,
    Test4,
    Test5,
}

impl From<Algorithm> for c_int {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Test1 => ptrobj_sys::PTO_ALGORITHM_TEST1,
            Algorithm::Test2 => ptrobj_sys::PTO_ALGORITHM_TEST2,
            Algorithm::Test3 => ptrobj_sys::PTO_ALGORITHM_TEST3,
            Algorithm::Test4 => ptrobj_sys::PTO_ALGORITHM_TEST4,
            Algorithm::Test5 => ptrobj_sys::PTO_ALGORITHM_TEST5,
        }
    }
}

impl TryFrom<c_int> for Algorithm {
    type Error = c_int;

    fn try_from(raw: c_int) -> Result<Self, Self::Error> {
        match raw {
            ptrobj_sys::PTO_ALGORITHM_TEST1 => Ok(Self::Test1),
            ptrobj_sys::PTO_ALGORITHM_TEST2 => Ok(Self::Test2),
            ptrobj_sys::PTO_ALGORITHM_TEST3 => Ok(Self::Test3),
            ptrobj_sys::PTO_ALGORITHM_TEST4 => Ok(Self::Test4),
            ptrobj_sys::PTO_ALGORITHM_TEST5 => Ok(Self::Test5),
            other => Err(other),
        }
    }
}

bitflags::bitflags! {
    /// Flags for creating a [`Context`].
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct ContextFlags: u32 {
        /// Reject out-of-range option values instead of clamping them.
        const VALIDATION = ptrobj_sys::PTOContextFlags::PTO_CONTEXTFLAGS_VALIDATION.0;
    }
}

impl From<ContextFlags> for ptrobj_sys::PTOContextFlags {
    fn from(context_flags: ContextFlags) -> Self {
        Self(context_flags.bits())
    }
}

impl From<ptrobj_sys::PTOContextFlags> for ContextFlags {
    fn from(flags: ptrobj_sys::PTOContextFlags) -> Self {
        Self::from_bits_truncate(flags.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_round_trip() {
        for algorithm in [
            Algorithm::Test1,
            Algorithm::Test2,
            Algorithm::Test3,
            Algorithm::Test4,
            Algorithm::Test5,
        ] {
            assert_eq!(Algorithm::try_from(c_int::from(algorithm)), Ok(algorithm));
        }
        assert_eq!(Algorithm::try_from(42), Err(42));
    }

    #[test]
    fn test_settings_to_ffi() {
        let settings = ContextSettings {
            algorithm: Algorithm::Test5,
            flags: ContextFlags::VALIDATION,
            ..Default::default()
        };

        let ffi = ptrobj_sys::PTOContextSettings::try_from(&settings).unwrap();

        assert_eq!(ffi.version, ptrobj_sys::PTO_VERSION);
        assert_eq!(ffi.algorithm, ptrobj_sys::PTO_ALGORITHM_TEST5);
        assert_eq!(
            ffi.flags,
            ptrobj_sys::PTOContextFlags::PTO_CONTEXTFLAGS_VALIDATION
        );
    }

    #[test]
    fn test_settings_with_unpackable_version() {
        let settings = ContextSettings {
            version: Version {
                major: 0,
                minor: u32::MAX,
                patch: u32::MAX,
            },
            ..Default::default()
        };

        assert_eq!(
            ptrobj_sys::PTOContextSettings::try_from(&settings).unwrap_err(),
            NativeError::Initialization
        );
    }

    #[test]
    fn test_option_name_with_nul() {
        assert_eq!(
            option_name("silence\0threshold").unwrap_err(),
            BindingError::InvalidOptionName("silence\0threshold".to_string())
        );
    }
}
