//! Structured logging setup, following the usual `tracing` +
//! `tracing-subscriber` split: build a subscriber, then install it as the
//! global default exactly once per process.

use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

/// Compose a subscriber that logs to stdout, filtered by `RUST_LOG` if set
/// or `default_level` otherwise.
pub fn get_subscriber(default_level: String) -> impl Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let formatting_layer = tracing_subscriber::fmt::layer().with_target(false);
    Registry::default().with(env_filter).with(formatting_layer)
}

/// Install `subscriber` as the global default, and route `log` records
/// (from dependencies that haven't migrated to `tracing`) through it.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    tracing_log::LogTracer::init().expect("Failed to set logger");
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set subscriber");
}
