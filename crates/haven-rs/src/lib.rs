//! Public SDK surface for Haven.
//!
//! This crate re-exports the core building blocks and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use haven_rs_config as config;
pub use haven_rs_core as core;
/// Re-export for convenience.
pub use haven_rs_memory as memory;
pub use haven_rs_rag as rag;
pub use haven_rs_speech as speech;

pub use haven_rs_config::HavenConfig;
pub use haven_rs_core::{HavenCoreError, Orchestrator};
pub use haven_rs_memory::ConversationState;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Filtering follows `RUST_LOG`.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
