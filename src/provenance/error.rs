use thiserror::Error;

/// Error kinds for the trust-boundary checks.
///
/// Every variant is fatal to the current invocation: the wrapper never
/// degrades to a partial result when an untrusted input fails a check.
#[derive(Debug, Error)]
pub enum ProvenanceError {
    #[error("invalid env argument (want NAME=VALUE): {0}")]
    InvalidEnvArgument(String),

    #[error("env variable not allowed: {0}")]
    EnvVariableNotAllowed(String),

    #[error("argument not supported: {0}")]
    UnsupportedArgument(String),

    #[error("invalid registry: {0}")]
    InvalidRegistry(String),

    #[error("sha256 digest is not valid: {0}")]
    InvalidDigest(String),

    #[error("invalid list encoding: {0}")]
    InvalidEncoding(String),

    #[error("environment variable {0} not present")]
    MissingToken(&'static str),

    #[error("malformed identity token: {0}")]
    MalformedToken(String),

    #[error("job_workflow_ref claim is empty")]
    MissingClaim,

    #[error("CI context missing or unparsable: {0}")]
    MissingCiContext(String),

    #[error("token exchange request failed: {0}")]
    TokenExchange(#[from] reqwest::Error),
}
