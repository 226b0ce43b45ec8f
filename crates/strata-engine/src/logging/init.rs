use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` uses the `env_logger` filter syntax, e.g.
/// `"strata_engine=debug"` to see buffer growth and group splits.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Route output through the test harness capture.
    pub is_test: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            is_test: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    pub fn for_tests(mut self) -> Self {
        self.is_test = true;
        self
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls are ignored.
///
/// Filter precedence: `config.env_filter`, then `RUST_LOG`, then `info`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.write_style(config.write_style).is_test(config.is_test);

        // Another logger may already be installed by the host.
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized");
    });
}
