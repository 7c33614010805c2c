use ptrobj::*;
use serial_test::{parallel, serial};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn live_contexts() -> usize {
    ptrobj_sys::ptoContextLiveCount()
}

#[test]
#[serial]
fn test_drop_releases_native_context() {
    let before = live_contexts();

    let context = Context::try_new(&ContextSettings::default()).unwrap();
    assert_eq!(live_contexts(), before + 1);

    drop(context);
    assert_eq!(live_contexts(), before);
}

#[test]
#[serial]
fn test_release_is_idempotent() {
    let before = live_contexts();
    let mut context = Context::try_new(&ContextSettings::default()).unwrap();

    context.release();
    assert_eq!(live_contexts(), before);
    context.release();
    drop(context);

    assert_eq!(live_contexts(), before);
}

#[test]
#[serial]
fn test_incompatible_version_allocates_nothing() {
    let before = live_contexts();
    let settings = ContextSettings {
        version: Version {
            major: version::PTO_VERSION_MAJOR + 1,
            minor: 0,
            patch: 0,
        },
        ..Default::default()
    };

    let result = Context::try_new(&settings);

    assert_eq!(
        result.unwrap_err(),
        BindingError::Allocation(NativeError::Initialization)
    );
    assert_eq!(live_contexts(), before);
}

#[test]
#[serial]
fn test_unpackable_version_is_an_allocation_error() {
    let before = live_contexts();

    for version in [
        Version {
            major: 0,
            minor: u32::MAX,
            patch: u32::MAX,
        },
        Version {
            major: 0,
            minor: 256,
            patch: 0,
        },
        Version {
            major: u32::MAX,
            minor: 0,
            patch: 0,
        },
    ] {
        let settings = ContextSettings {
            version,
            ..Default::default()
        };

        assert_eq!(
            Context::try_new(&settings).unwrap_err(),
            BindingError::Allocation(NativeError::Initialization)
        );
    }
    assert_eq!(live_contexts(), before);
}

#[test]
#[serial]
fn test_derived_class_release_frees_native_context() {
    let before = live_contexts();
    let hooked = Arc::new(AtomicUsize::new(0));
    let counter = hooked.clone();
    let class = Subclass::new("PtrObj::Context::Traced", Arc::new(ContextClass)).on_release(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    let context = Context::try_with_class(&ContextSettings::default(), Arc::new(class)).unwrap();
    assert!(context.wrapper().isa(ContextClass::NAME));
    assert_eq!(context.algorithm(), Ok(Algorithm::default()));

    drop(context);

    assert_eq!(hooked.load(Ordering::SeqCst), 1);
    assert_eq!(live_contexts(), before);
}

#[test]
#[serial]
fn test_unrelated_class_is_refused_before_allocation() {
    struct Unrelated;

    impl Class for Unrelated {
        fn name(&self) -> &str {
            "Test::Unrelated"
        }

        unsafe fn release(&self, _handle: NativeHandle) {}
    }

    let before = live_contexts();

    let result = Context::try_with_class(&ContextSettings::default(), Arc::new(Unrelated));

    assert_eq!(
        result.unwrap_err(),
        BindingError::TypeMismatch {
            expected: ContextClass::NAME.to_string(),
            actual: "Test::Unrelated".to_string(),
        }
    );
    assert_eq!(live_contexts(), before);
}

#[test]
#[parallel]
fn test_methods_forward_to_native_context() {
    let settings = ContextSettings {
        algorithm: Algorithm::Test4,
        flags: ContextFlags::VALIDATION,
        ..Default::default()
    };
    let mut context = Context::try_new(&settings).unwrap();

    assert_eq!(context.algorithm(), Ok(Algorithm::Test4));
    assert_eq!(context.flags(), Ok(ContextFlags::VALIDATION));
    assert_eq!(context.option("silence_threshold"), Ok(0));

    context.set_option("silence_threshold", 250).unwrap();
    assert_eq!(context.option("silence_threshold"), Ok(250));
}

#[test]
#[parallel]
fn test_option_errors() {
    let mut validating = Context::try_new(&ContextSettings {
        flags: ContextFlags::VALIDATION,
        ..Default::default()
    })
    .unwrap();

    assert_eq!(
        validating.set_option("silence_threshold", -1),
        Err(BindingError::Native(NativeError::InvalidArgument))
    );
    assert_eq!(
        validating.option("no_such_option"),
        Err(BindingError::Native(NativeError::InvalidArgument))
    );
    assert_eq!(
        validating.set_option("bad\0name", 1),
        Err(BindingError::InvalidOptionName("bad\0name".to_string()))
    );

    let mut clamping = Context::try_new(&ContextSettings::default()).unwrap();
    clamping.set_option("silence_threshold", 1_000_000).unwrap();
    assert_eq!(
        clamping.option("silence_threshold"),
        Ok(ptrobj_sys::PTO_SILENCE_THRESHOLD_MAX)
    );
}

#[test]
#[parallel]
fn test_methods_after_release() {
    let mut context = Context::try_new(&ContextSettings::default()).unwrap();
    let handle = context.raw_handle().unwrap();
    assert!(registry::is_bound(handle));

    context.release();

    assert!(context.is_released());
    assert_eq!(context.algorithm(), Err(BindingError::UseAfterRelease));
    assert_eq!(context.flags(), Err(BindingError::UseAfterRelease));
    assert_eq!(
        context.option("silence_threshold"),
        Err(BindingError::UseAfterRelease)
    );
    assert_eq!(
        context.set_option("silence_threshold", 1),
        Err(BindingError::UseAfterRelease)
    );
    assert_eq!(context.raw_handle(), Err(BindingError::UseAfterRelease));
}

#[test]
#[parallel]
fn test_rebless_context() {
    let mut context = Context::try_new(&ContextSettings::default()).unwrap();

    let derived = Subclass::new("PtrObj::Context::Derived", Arc::new(ContextClass));
    context.rebless(Arc::new(derived)).unwrap();

    assert_eq!(context.wrapper().class().name(), "PtrObj::Context::Derived");
    assert_eq!(context.algorithm(), Ok(Algorithm::default()));
}
