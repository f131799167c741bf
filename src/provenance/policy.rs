// policy.rs — Allow-list tables for untrusted build parameters
//
// The policy is read-only data injected into the validator at
// construction. Tests substitute their own tables; nothing here is
// package-level mutable state.

/// Allow-lists for build flags (exact match) and environment variable
/// names (prefix match).
#[derive(Debug, Clone)]
pub struct AllowListPolicy {
    flags: Vec<String>,
    env_prefixes: Vec<String>,
}

/// Flags `ko publish` accepts from an untrusted build request.
const KO_PUBLISH_FLAGS: &[&str] = &[
    "--bare",
    "--base-import-paths",
    "--preserve-import-paths",
    "--image-label",
    "--image-refs",
    "--platform",
    "--push",
    "--sbom",
    "--tags",
    "--tag-only",
    "--tarball",
    "--insecure-registry",
    "--local",
    "--disable-optimizations",
];

/// Env variable name prefixes the Go/ko toolchain understands.
const KO_ENV_PREFIXES: &[&str] = &["KO_", "GO", "CGO_", "SOURCE_DATE_EPOCH"];

impl AllowListPolicy {
    pub fn new<S: Into<String>>(
        flags: impl IntoIterator<Item = S>,
        env_prefixes: impl IntoIterator<Item = S>,
    ) -> Self {
        AllowListPolicy {
            flags: flags.into_iter().map(Into::into).collect(),
            env_prefixes: env_prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// The default policy for the wrapped ko build tool.
    pub fn ko_default() -> Self {
        Self::new(KO_PUBLISH_FLAGS.iter().copied(), KO_ENV_PREFIXES.iter().copied())
    }

    /// Exact-match membership test for a flag name (the token up to the
    /// first `=`, so `--platform=linux/amd64` matches `--platform`).
    pub fn allows_flag(&self, token: &str) -> bool {
        let name = token.split('=').next().unwrap_or(token);
        self.flags.iter().any(|f| f == name)
    }

    /// Prefix-match membership test for an env variable name.
    pub fn allows_env(&self, name: &str) -> bool {
        !name.is_empty() && self.env_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}
