use crate::handle::NativeHandle;

/// An error reported by the native library.
#[derive(Debug, PartialEq, Eq, Copy, Clone, thiserror::Error)]
pub enum NativeError {
    /// An unspecified error occurred.
    #[error("unspecified error")]
    Unspecified,

    /// The system ran out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// The library could not be initialized, typically because of an incompatible API version.
    #[error("error while initializing the native library")]
    Initialization,

    /// An argument was outside of the range the library accepts.
    #[error("invalid argument")]
    InvalidArgument,
}

/// An error raised by the binding layer.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum BindingError {
    /// The native allocator failed; no resource was created.
    #[error("allocation failed: {0}")]
    Allocation(NativeError),

    /// Attempted to wrap a null handle.
    #[error("cannot wrap a null native handle")]
    InvalidHandle,

    /// A method was dispatched on a wrapper whose handle has been released.
    #[error("native handle used after release")]
    UseAfterRelease,

    /// Another live wrapper already owns this handle.
    #[error("native handle {handle} is already owned by a live `{class}` wrapper")]
    AlreadyBound { handle: NativeHandle, class: String },

    /// The class refused to adopt the handle.
    #[error("native handle rejected by class `{class}`")]
    Rejected { class: String },

    /// The wrapper is not of, nor derived from, the expected class.
    #[error("object is of class `{actual}`, which does not derive from `{expected}`")]
    TypeMismatch { expected: String, actual: String },

    /// A forwarded native call failed.
    #[error("native call failed: {0}")]
    Native(NativeError),

    /// An option name could not be passed to the native library.
    #[error("invalid option name {0:?}")]
    InvalidOptionName(String),
}

pub const fn to_option_error(status: ptrobj_sys::PTOerror) -> Option<NativeError> {
    match status {
        ptrobj_sys::PTOerror::PTO_STATUS_SUCCESS => None,
        ptrobj_sys::PTOerror::PTO_STATUS_FAILURE => Some(NativeError::Unspecified),
        ptrobj_sys::PTOerror::PTO_STATUS_OUTOFMEMORY => Some(NativeError::OutOfMemory),
        ptrobj_sys::PTOerror::PTO_STATUS_INITIALIZATION => Some(NativeError::Initialization),
        ptrobj_sys::PTOerror::PTO_STATUS_INVALIDARGUMENT => Some(NativeError::InvalidArgument),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_is_not_an_error() {
        assert_eq!(
            to_option_error(ptrobj_sys::PTOerror::PTO_STATUS_SUCCESS),
            None
        );
        assert_eq!(
            to_option_error(ptrobj_sys::PTOerror::PTO_STATUS_INVALIDARGUMENT),
            Some(NativeError::InvalidArgument)
        );
    }

    #[test]
    fn test_display() {
        let error = BindingError::Allocation(NativeError::OutOfMemory);
        assert_eq!(error.to_string(), "allocation failed: out of memory");

        let error = BindingError::TypeMismatch {
            expected: "Base".to_string(),
            actual: "Other".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "object is of class `Other`, which does not derive from `Base`"
        );
    }
}
