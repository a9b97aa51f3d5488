//! Optional debug tracing (feature `debug-log`): a stderr `fmt` subscriber
//! filtered by `LUNA_LOG` (tracing-subscriber `EnvFilter` syntax).

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: OnceCell<()> = OnceCell::new();

/// Install the subscriber once. Silent unless `LUNA_LOG` is set, so notices
/// stay the only output in normal use.
pub fn telemetry_init() {
    INIT.get_or_init(|| {
        let Ok(spec) = std::env::var("LUNA_LOG") else {
            return;
        };
        let filter = EnvFilter::try_new(spec.trim()).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
