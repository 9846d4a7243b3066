//! Logging setup
//!
//! `RUST_LOG` wins when set; otherwise the filter depends on the environment.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppEnvironment;

pub fn default_filter(environment: AppEnvironment) -> &'static str {
    match environment {
        AppEnvironment::Development => "emsi=debug,tower_http=debug,sqlx=info,info",
        AppEnvironment::Production => "emsi=info,tower_http=info,sqlx=warn,warn",
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(environment: AppEnvironment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(environment)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
