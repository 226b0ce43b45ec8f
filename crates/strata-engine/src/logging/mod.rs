//! Logging setup.
//!
//! Library code only emits through the `log` facade. Binaries and tests call
//! [`init_logging`] once to install an `env_logger` backend.

mod init;

pub use init::{LoggingConfig, init_logging};
