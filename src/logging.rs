use crate::config::Settings;
use crate::statics;
use tracing_subscriber::{
    EnvFilter, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Filter for the crate's own events; `RUST_LOG` still wins when set.
pub fn filter_for(settings: &Settings) -> EnvFilter {
    let directive = if settings.debug {
        statics::LOG_DIRECTIVE_DEBUG
    } else {
        statics::LOG_DIRECTIVE_DEFAULT
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

/// Lets the debug toggle change the log level of a running process.
#[derive(Debug, Clone)]
pub struct LogHandle(reload::Handle<EnvFilter, Registry>);

impl LogHandle {
    pub fn apply(&self, settings: &Settings) {
        if let Err(e) = self.0.reload(filter_for(settings)) {
            tracing::warn!("could not change log level: {e}");
        }
    }
}

/// Installs the global subscriber. Returns `None` if one was already installed.
pub fn init(settings: &Settings) -> Option<LogHandle> {
    let (filter, handle) = reload::Layer::new(filter_for(settings));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .ok()?;
    Some(LogHandle(handle))
}
