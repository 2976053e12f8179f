//! Core infrastructure for the inverse design engine.
//!
//! - [`types`]: model kinds and index aliases
//! - [`constants`]: defaults for the search, the trainer and the bounds policy
//! - [`error`]: the crate error type and `Result` alias
//! - [`numeric`]: non-finite value handling shared by every stage

pub mod constants;
pub mod error;
pub mod numeric;
pub mod types;

pub use constants::*;
pub use error::{InverseDesignError, Result};
pub use types::*;

use std::sync::Once;

static CORE_INIT: Once = Once::new();

/// Initialize the logging subsystem.
///
/// Defaults `RUST_LOG` to `info` when it is unset. Calling this more than once
/// is harmless, and so is calling it after the host application has already
/// installed a logger.
pub fn initialize_core() -> Result<()> {
    CORE_INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", "info");
        }
        let _ = env_logger::try_init();
        log::debug!("Inverse design core initialized");
    });
    Ok(())
}

/// Check whether [`initialize_core`] has run.
pub fn is_core_initialized() -> bool {
    CORE_INIT.is_completed()
}
