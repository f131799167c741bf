// context.rs — Trusted CI execution context
//
// Parsed from the GITHUB_CONTEXT JSON the platform injects into the
// job. Every field here is trusted because the platform sets it, with
// one exception: the context carries the job's auth token, which must
// never reach the predicate or disk. The token is cleared at parse time
// and excluded from serialization.

use serde::{Deserialize, Serialize};

use crate::provenance::error::ProvenanceError;

/// Env variable holding the CI context JSON.
pub const CONTEXT_ENV_KEY: &str = "GITHUB_CONTEXT";

/// Fields of the GitHub Actions context used for provenance.
/// https://docs.github.com/en/actions/learn-github-actions/contexts#github-context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubContext {
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub workflow: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default, rename = "event")]
    pub event_payload: serde_json::Value,
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub ref_type: String,
    #[serde(default, rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub base_ref: String,
    #[serde(default)]
    pub head_ref: String,
    #[serde(default)]
    pub actor: String,
    #[serde(default)]
    pub run_number: String,
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub run_attempt: String,
    #[serde(default)]
    pub server_url: String,
    #[serde(default, skip_serializing)]
    token: Option<String>,
}

impl GithubContext {
    /// Parse the raw context JSON and strip the auth token.
    pub fn from_json(raw: &str) -> Result<Self, ProvenanceError> {
        let mut gh: GithubContext = serde_json::from_str(raw)
            .map_err(|e| ProvenanceError::MissingCiContext(e.to_string()))?;
        gh.token = None;
        Ok(gh)
    }
}
