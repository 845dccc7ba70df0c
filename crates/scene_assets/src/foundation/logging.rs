//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize logging with a default level that `RUST_LOG` can still override
///
/// Returns `false` when a logger was already installed, which happens when
/// several tests or tools race to initialize it.
pub fn init_with_level(level: log::LevelFilter) -> bool {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        init_with_level(log::LevelFilter::Debug);
        assert!(!init_with_level(log::LevelFilter::Trace));
        info!("logger installed");
    }
}
