use ptrobj::{Context, ContextClass, ContextFlags, ContextSettings, Subclass};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), ptrobj::BindingError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demo=info,ptrobj=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("native library version {}", ptrobj::native_version());

    // A context blessed into a derived class; its hook runs before the base release.
    let class = Subclass::new("Demo::Context", Arc::new(ContextClass)).on_release(|handle| {
        info!(%handle, "Demo::Context is going away");
    });

    let settings = ContextSettings {
        flags: ContextFlags::VALIDATION,
        ..Default::default()
    };
    let mut context = Context::try_with_class(&settings, Arc::new(class))?;

    context.set_option("silence_threshold", 120)?;
    info!(
        algorithm = ?context.algorithm()?,
        silence_threshold = context.option("silence_threshold")?,
        "context configured"
    );

    if let Err(error) = context.set_option("silence_threshold", -3) {
        info!(%error, "out-of-range value refused");
    }

    context.release();
    context.release();

    match context.algorithm() {
        Ok(algorithm) => tracing::warn!(?algorithm, "released context still answered"),
        Err(error) => info!(%error, "call after release refused"),
    }

    info!(live = ptrobj::registry::live_count(), "done");

    Ok(())
}
