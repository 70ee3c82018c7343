//! Test doubles for the engine's collaborators: an in-memory candidate store with the same conditional-update
//! semantics as the SQLite backend, a scriptable gateway, and a recording notification channel. Available to
//! downstream crates behind the `test_utils` feature.
mod artifacts;
mod gateway;
mod memory;
mod notifier;

pub use artifacts::{NullRenderer, StaticArtifactStore};
pub use gateway::ScriptedGateway;
pub use memory::MemoryCandidateStore;
pub use notifier::{RecordingChannel, SentMessage};

/// Load the local environment and initialize logging for a test. Safe to call repeatedly.
pub fn prepare_env() {
    let _ = dotenvy::dotenv();
    let _ = env_logger::try_init();
}
