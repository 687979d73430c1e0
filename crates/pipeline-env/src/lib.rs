//! Common pipeline environment (CPE) for piper-rs.
//!
//! Steps share state through files below `<env root>/commonPipelineEnvironment`.
//! [`read_pipeline_env`] renders that state for consumers outside the
//! pipeline, encrypted when a secret is configured.

use piper_core::Result;
use piper_orchestrator::Orchestrator;
use std::path::Path;
use tracing::debug;

pub mod cpe;
pub mod crypto;

pub use cpe::CpeMap;
pub use crypto::{decrypt, encrypt};

/// Directory below the env root holding the CPE.
pub const CPE_DIR: &str = "commonPipelineEnvironment";

/// Render the CPE below `env_root`.
///
/// With a non-empty `secret` the JSON is encrypted, except on Jenkins where
/// the output stays inside the controller. Otherwise the result is
/// tab-indented JSON.
///
/// # Errors
///
/// Returns an error when the CPE cannot be loaded or encrypted.
pub fn read_pipeline_env(
    env_root: &Path,
    secret: Option<&str>,
    orchestrator: Orchestrator,
) -> Result<String> {
    let cpe = CpeMap::load_from_disk(&env_root.join(CPE_DIR))?;

    match secret {
        Some(secret) if !secret.is_empty() && orchestrator != Orchestrator::Jenkins => {
            debug!("Pipeline environment secret set, encrypting CPE");
            let json = serde_json::to_vec(&cpe)?;
            encrypt(secret.as_bytes(), &json)
        }
        _ => cpe.to_indented_json(),
    }
}
