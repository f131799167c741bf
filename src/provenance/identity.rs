// identity.rs — Builder identity via OIDC token exchange
//
// Exchanges the CI-issued bearer token for an identity token scoped to
// this builder, then extracts the job_workflow_ref claim from the
// token's payload segment.
//
// TRUST NOTE: the token's signature is deliberately NOT verified. The
// claim is trusted because the token-issuing endpoint is reached over
// the platform-provided authenticated HTTPS channel, not because the
// token is independently verified here. A stricter deployment would
// check the signature against the issuer's published keys.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::provenance::error::ProvenanceError;

const REQUEST_TOKEN_ENV_KEY: &str = "ACTIONS_ID_TOKEN_REQUEST_TOKEN";
const REQUEST_URL_ENV_KEY: &str = "ACTIONS_ID_TOKEN_REQUEST_URL";
const AUDIENCE: &str = "provwrap/slsa-builder";

#[derive(Deserialize)]
struct TokenResponse {
    value: String,
}

#[derive(Deserialize)]
struct IdentityClaims {
    #[serde(default)]
    job_workflow_ref: String,
}

/// Fetch the builder identity for this run.
///
/// One blocking round trip per predicate generation, no retry: a
/// transient failure surfaces to the caller, which decides whether to
/// retry the whole build.
pub fn fetch_builder_identity() -> Result<String, ProvenanceError> {
    let url = std::env::var(REQUEST_URL_ENV_KEY)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ProvenanceError::MissingToken(REQUEST_URL_ENV_KEY))?;

    let bearer = Zeroizing::new(
        std::env::var(REQUEST_TOKEN_ENV_KEY)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ProvenanceError::MissingToken(REQUEST_TOKEN_ENV_KEY))?,
    );

    let request_url = format!("{url}&audience={AUDIENCE}");
    let response: TokenResponse = reqwest::blocking::Client::new()
        .get(&request_url)
        .header(
            reqwest::header::AUTHORIZATION,
            format!("bearer {}", bearer.as_str()),
        )
        .send()?
        .error_for_status()?
        .json()?;

    workflow_ref_from_token(&response.value)
}

/// Extract the `job_workflow_ref` claim from a structurally well-formed
/// (but unverified) JWT.
pub fn workflow_ref_from_token(token: &str) -> Result<String, ProvenanceError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ProvenanceError::MalformedToken(format!(
            "found {} segments, want 3",
            parts.len()
        )));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| ProvenanceError::MalformedToken(format!("payload base64: {e}")))?;

    let claims: IdentityClaims = serde_json::from_slice(&payload)
        .map_err(|e| ProvenanceError::MalformedToken(format!("payload json: {e}")))?;

    if claims.job_workflow_ref.is_empty() {
        return Err(ProvenanceError::MissingClaim);
    }

    Ok(claims.job_workflow_ref)
}
