// command.rs — Build tool command synthesis
//
// Turns a ValidatedCommand into the exact argv and environment handed
// to the build tool, plus the derived registry destination. The dry-run
// path serializes these outputs (wire.rs encoding) so the trusted
// metadata is captured BEFORE the untrusted build step runs; the real
// run replaces the wrapper's process image with the build tool so no
// attacker-controlled process outlives the trusted wrapper.

use std::process::Command;

use crate::provenance::error::ProvenanceError;
use crate::provenance::validate::ValidatedCommand;
use crate::provenance::wire;

/// Fixed path of the wrapped build tool inside the builder image.
pub const DEFAULT_TOOL_PATH: &str = "/usr/local/bin/ko";

const PUBLISH_SUBCOMMAND: &str = "publish";

/// The single env variable the registry destination is derived from.
const REGISTRY_ENV_VAR: &str = "KO_DOCKER_REPO";

/// Destination when no registry variable is set, or when the value is a
/// bare username (ko's docker.io shorthand).
const DEFAULT_REGISTRY: &str = "docker.io";

/// Serialized dry-run outputs, ready to hand to the calling CI job.
#[derive(Debug)]
pub struct DryRunOutputs {
    /// base64(JSON array) of the full argv.
    pub command: String,
    /// base64(JSON array) of the validated `NAME=VALUE` assignments.
    pub envs: String,
    pub registry: String,
}

/// A synthesized invocation of the build tool.
pub struct BuildCommand<'a> {
    tool: String,
    cmd: &'a ValidatedCommand,
}

impl<'a> BuildCommand<'a> {
    pub fn new(tool: impl Into<String>, cmd: &'a ValidatedCommand) -> Self {
        BuildCommand {
            tool: tool.into(),
            cmd,
        }
    }

    /// Full argument vector: tool path, fixed subcommand, then the user
    /// flags in caller order. ko is flag-position-sensitive, so flags
    /// are never reordered.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.tool.clone(), PUBLISH_SUBCOMMAND.to_string()];
        argv.extend(self.cmd.flags().iter().cloned());
        argv
    }

    /// The validated assignments as `NAME=VALUE` strings, in list order.
    pub fn command_env(&self) -> Vec<String> {
        self.cmd
            .env()
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect()
    }

    /// Full environment vector: process-inherited variables first, then
    /// the validated assignments (later entries override same names at
    /// the consuming process's discretion).
    pub fn full_env(&self) -> Vec<String> {
        let mut env: Vec<String> = std::env::vars().map(|(n, v)| format!("{n}={v}")).collect();
        env.extend(self.command_env());
        env
    }

    /// Derive the registry destination from the validated environment.
    pub fn registry(&self) -> Result<String, ProvenanceError> {
        match self.cmd.env_value(REGISTRY_ENV_VAR) {
            None => Ok(DEFAULT_REGISTRY.to_string()),
            Some(value) => derive_registry(value),
        }
    }

    /// Serialize the trusted invocation metadata without running the
    /// build tool.
    pub fn dry_run_outputs(&self) -> Result<DryRunOutputs, ProvenanceError> {
        Ok(DryRunOutputs {
            command: wire::marshall_list(&self.argv()),
            envs: wire::marshall_list(&self.command_env()),
            registry: self.registry()?,
        })
    }

    /// Replace the current process image with the build tool.
    ///
    /// Only returns on failure: on success the wrapper ceases to exist,
    /// so none of its in-memory state remains reachable by the build
    /// beyond the environment passed here.
    #[cfg(unix)]
    pub fn exec(&self) -> std::io::Error {
        use std::os::unix::process::CommandExt;

        Command::new(&self.tool)
            .arg(PUBLISH_SUBCOMMAND)
            .args(self.cmd.flags())
            .envs(self.cmd.env().iter().cloned())
            .exec()
    }

    #[cfg(not(unix))]
    pub fn exec(&self) -> std::io::Error {
        std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "process-image replacement requires a Unix platform",
        )
    }
}

/// Split a destination value into registry and namespace.
///
/// `registry/namespace` yields the registry; a bare `username` is ko's
/// docker.io shorthand; more than one separator is malformed.
fn derive_registry(value: &str) -> Result<String, ProvenanceError> {
    let parts: Vec<&str> = value.trim().split('/').collect();

    if parts.len() > 2 {
        return Err(ProvenanceError::InvalidRegistry(value.trim().to_string()));
    }
    if parts.len() == 1 {
        return Ok(DEFAULT_REGISTRY.to_string());
    }

    Ok(parts[0].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::policy::AllowListPolicy;
    use crate::provenance::validate::validate;

    fn validated(build_args: &str, env_args: &str) -> ValidatedCommand {
        validate(&AllowListPolicy::ko_default(), build_args, env_args).unwrap()
    }

    #[test]
    fn argv_is_tool_subcommand_then_flags_in_order() {
        let v = validated("--bare --platform=linux/amd64", "");
        let build = BuildCommand::new("ko", &v);
        assert_eq!(
            build.argv(),
            &["ko", "publish", "--bare", "--platform=linux/amd64"]
        );
    }

    #[test]
    fn command_env_formats_assignments_in_order() {
        let v = validated("", "GOOS=linux, GOARCH=x86");
        let build = BuildCommand::new("ko", &v);
        assert_eq!(build.command_env(), &["GOOS=linux", "GOARCH=x86"]);
    }

    #[test]
    fn full_env_appends_assignments_after_process_env() {
        let v = validated("", "GOOS=linux");
        let build = BuildCommand::new("ko", &v);
        let env = build.full_env();
        assert_eq!(env.last().map(String::as_str), Some("GOOS=linux"));
        assert_eq!(env.len(), std::env::vars().count() + 1);
    }

    #[test]
    fn registry_defaults_when_variable_absent() {
        let v = validated("", "GOOS=linux");
        let build = BuildCommand::new("ko", &v);
        assert_eq!(build.registry().unwrap(), "docker.io");
    }

    #[test]
    fn registry_derivation_vectors() {
        let cases = [
            ("docker.io/username", "docker.io"),
            ("username", "docker.io"),
            ("ghcr.io/username", "ghcr.io"),
            ("any/username", "any"),
            (" any/username ", "any"),
        ];
        for (input, expected) in cases {
            assert_eq!(derive_registry(input).unwrap(), expected, "input: {input:?}");
        }
    }

    #[test]
    fn multi_segment_registry_is_rejected() {
        let err = derive_registry("too/many/names").unwrap_err();
        assert!(matches!(err, ProvenanceError::InvalidRegistry(_)));
    }

    #[test]
    fn registry_reads_validated_destination() {
        let v = validated("", "KO_DOCKER_REPO=ghcr.io/org");
        let build = BuildCommand::new("ko", &v);
        assert_eq!(build.registry().unwrap(), "ghcr.io");
    }

    #[test]
    fn dry_run_outputs_round_trip() {
        let v = validated("--bare", "KO_DOCKER_REPO=docker.io/user, GOOS=linux");
        let build = BuildCommand::new("/usr/local/bin/ko", &v);
        let outputs = build.dry_run_outputs().unwrap();

        let command = wire::unmarshall_list(&outputs.command).unwrap();
        assert_eq!(command, &["/usr/local/bin/ko", "publish", "--bare"]);

        let envs = wire::unmarshall_list(&outputs.envs).unwrap();
        assert_eq!(envs, &["KO_DOCKER_REPO=docker.io/user", "GOOS=linux"]);

        assert_eq!(outputs.registry, "docker.io");
    }
}
