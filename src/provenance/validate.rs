// validate.rs — Untrusted parameter validation
//
// Everything a build request supplies crosses the trust boundary here.
// The validator is the only place a ValidatedCommand is constructed:
// downstream code (command synthesis, predicate assembly) can rely on
// every entry having passed the allow-list.
//
// Validation fails closed. An input outside the allow-list is an error,
// never silently dropped.

use crate::provenance::error::ProvenanceError;
use crate::provenance::policy::AllowListPolicy;

/// Flags and env assignments that passed the allow-list checks.
///
/// Env assignments are kept as an ordered association list, not a map,
/// so iteration order is deterministic all the way into the serialized
/// predicate. A duplicate name overwrites the earlier value in place.
#[derive(Debug, Clone, Default)]
pub struct ValidatedCommand {
    flags: Vec<String>,
    env: Vec<(String, String)>,
}

impl ValidatedCommand {
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Validate a raw flag string (space-separated tokens) and a raw env
/// string (comma-separated `NAME=VALUE` pairs) against the policy.
pub fn validate(
    policy: &AllowListPolicy,
    build_args: &str,
    env_args: &str,
) -> Result<ValidatedCommand, ProvenanceError> {
    let mut out = ValidatedCommand::default();

    for token in build_args.split_whitespace() {
        if !policy.allows_flag(token) {
            return Err(ProvenanceError::UnsupportedArgument(token.to_string()));
        }
        out.flags.push(token.to_string());
    }

    if !env_args.is_empty() {
        for pair in env_args.split(',') {
            let pair = pair.trim();
            let parts: Vec<&str> = pair.split('=').collect();
            if parts.len() != 2 {
                return Err(ProvenanceError::InvalidEnvArgument(pair.to_string()));
            }
            let name = parts[0].trim();
            let value = parts[1].trim();
            if !policy.allows_env(name) {
                return Err(ProvenanceError::EnvVariableNotAllowed(name.to_string()));
            }
            match out.env.iter_mut().find(|(n, _)| n == name) {
                // Last write wins, position of the first assignment kept.
                Some(slot) => slot.1 = value.to_string(),
                None => out.env.push((name.to_string(), value.to_string())),
            }
        }
    }

    Ok(out)
}
