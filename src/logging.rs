use env_logger::{Builder, Env};
use std::env;

const DEFAULT_FILTER: &str = "info";
const PATIENCE_LOG: &str = "PATIENCE_LOG";

/// Log to stderr. `PATIENCE_LOG` wins over `RUST_LOG` when both are set.
pub fn init() {
    let var = if env::var_os(PATIENCE_LOG).is_some() {
        PATIENCE_LOG
    } else {
        "RUST_LOG"
    };
    let _ = Builder::from_env(Env::default().filter_or(var, DEFAULT_FILTER))
        .format_timestamp_millis()
        .try_init();
}
