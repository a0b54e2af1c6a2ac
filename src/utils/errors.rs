use thiserror::Error;

/// Errors surfaced by the simulation core.
///
/// The core has no recoverable per-tick failures; everything here is a
/// startup-time rejection of malformed configuration.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Config error: {0}")]
    InvalidConfig(String),
}
