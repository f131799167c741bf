// predicate.rs — SLSA provenance predicate assembly
//
// Merges trusted CI context, the builder identity, and the validated
// command/env captured at dry-run time into the final versioned
// document. Every untrusted value embedded here (artifact digest,
// command, environment) has already passed validation; the predicate is
// immutable once constructed, and a new build always produces a new
// predicate.
//
// Field order is fixed by the struct definitions and BTreeMap keys, so
// identical inputs serialize to identical bytes.
// Spec: https://slsa.dev/provenance/v0.2

use std::collections::BTreeMap;

use serde::Serialize;

use crate::provenance::context::GithubContext;
use crate::provenance::error::ProvenanceError;
use crate::provenance::wire;

/// Identifies provwrap-generated builds to downstream consumers.
const BUILD_TYPE: &str = "https://github.com/provwrap/slsa-build-wrapper@v1";

// The two schema versions evolve independently: one for the trigger
// parameters, one for the build-config step list.
const PARAMETERS_VERSION: u32 = 1;
const BUILD_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenancePredicate {
    pub builder: Builder,
    pub build_type: String,
    pub invocation: Invocation,
    pub build_config: BuildConfig,
    pub materials: Vec<Material>,
}

#[derive(Debug, Serialize)]
pub struct Builder {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    pub config_source: ConfigSource,
    pub parameters: Parameters,
    /// Non user-controllable variables needed to reproduce the build.
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSource {
    pub uri: String,
    pub digest: BTreeMap<String, String>,
    pub entry_point: String,
}

/// Parameters coming from the trigger event.
#[derive(Debug, Serialize)]
pub struct Parameters {
    pub version: u32,
    pub event_name: String,
    pub event_payload: serde_json::Value,
    pub ref_type: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub base_ref: String,
    pub head_ref: String,
    pub actor: String,
    pub sha1: String,
}

#[derive(Debug, Serialize)]
pub struct BuildConfig {
    pub version: u32,
    pub steps: Vec<Step>,
}

#[derive(Debug, Serialize)]
pub struct Step {
    pub command: Vec<String>,
    pub env: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Material {
    pub uri: String,
    pub digest: BTreeMap<String, String>,
}

/// Assemble a predicate from already-validated parts.
pub fn assemble(
    artifact_digest: &str,
    gh: &GithubContext,
    builder_ref: &str,
    command: Vec<String>,
    env: Vec<String>,
) -> Result<ProvenancePredicate, ProvenanceError> {
    // The artifact digest is the one piece of untrusted artifact
    // identity allowed into the trusted record, and only after this
    // shape check.
    if artifact_digest.len() != 64
        || !artifact_digest.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(ProvenanceError::InvalidDigest(artifact_digest.to_string()));
    }

    let sha1_digest = |sha: &str| {
        let mut digest = BTreeMap::new();
        digest.insert("sha1".to_string(), sha.to_string());
        digest
    };

    let mut environment = BTreeMap::new();
    environment.insert("arch".to_string(), "amd64".to_string());
    environment.insert("os".to_string(), "ubuntu".to_string());
    environment.insert("github_event_name".to_string(), gh.event_name.clone());
    environment.insert("github_run_number".to_string(), gh.run_number.clone());
    environment.insert("github_run_id".to_string(), gh.run_id.clone());
    environment.insert("github_run_attempt".to_string(), gh.run_attempt.clone());

    Ok(ProvenancePredicate {
        builder: Builder {
            // Identifies the reusable workflow; matches job_workflow_ref.
            id: format!("https://github.com/{builder_ref}"),
        },
        build_type: BUILD_TYPE.to_string(),
        invocation: Invocation {
            config_source: ConfigSource {
                uri: format!("git+{}{}@{}.git", gh.server_url, gh.repository, gh.git_ref),
                digest: sha1_digest(&gh.sha),
                entry_point: gh.workflow.clone(),
            },
            parameters: Parameters {
                version: PARAMETERS_VERSION,
                event_name: gh.event_name.clone(),
                event_payload: gh.event_payload.clone(),
                ref_type: gh.ref_type.clone(),
                git_ref: gh.git_ref.clone(),
                base_ref: gh.base_ref.clone(),
                head_ref: gh.head_ref.clone(),
                actor: gh.actor.clone(),
                sha1: gh.sha.clone(),
            },
            environment,
        },
        build_config: BuildConfig {
            version: BUILD_CONFIG_VERSION,
            // Single step: the command and env actually passed to the
            // build tool.
            steps: vec![Step { command, env }],
        },
        materials: vec![Material {
            uri: format!("git+{}.git", gh.repository),
            digest: sha1_digest(&gh.sha),
        }],
    })
}

/// Decode the wire-encoded command/env, parse the CI context, assemble
/// the predicate, and serialize it.
pub fn generate(
    artifact_digest: &str,
    raw_context: &str,
    command_b64: &str,
    env_b64: &str,
    builder_ref: &str,
) -> Result<Vec<u8>, ProvenanceError> {
    let gh = GithubContext::from_json(raw_context)?;
    let command = wire::unmarshall_list(command_b64)?;
    let env = wire::unmarshall_list(env_b64)?;

    let predicate = assemble(artifact_digest, &gh, builder_ref, command, env)?;

    serde_json::to_vec(&predicate)
        .map_err(|e| ProvenanceError::InvalidEncoding(format!("predicate json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str =
        "0000000000000000000000000000000000000000000000000000000000000000";
    const BUILDER_REF: &str = "org/repo/.github/workflows/build.yml@refs/heads/main";

    fn test_context() -> GithubContext {
        GithubContext::from_json(
            r#"{
                "repository": "org/repo",
                "workflow": "build.yml",
                "event_name": "push",
                "event": {"head_commit": "abc"},
                "sha": "abc4567890abcdef",
                "ref": "refs/heads/main",
                "ref_type": "branch",
                "actor": "octocat",
                "run_number": "7",
                "run_id": "123456",
                "run_attempt": "1",
                "server_url": "https://github.com/"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn digest_must_be_64_hex_chars() {
        let gh = test_context();

        assert!(assemble(DIGEST, &gh, BUILDER_REF, vec![], vec![]).is_ok());

        let short = &DIGEST[..63];
        assert!(matches!(
            assemble(short, &gh, BUILDER_REF, vec![], vec![]).unwrap_err(),
            ProvenanceError::InvalidDigest(_)
        ));

        let non_hex = format!("{}g", &DIGEST[..63]);
        assert!(matches!(
            assemble(&non_hex, &gh, BUILDER_REF, vec![], vec![]).unwrap_err(),
            ProvenanceError::InvalidDigest(_)
        ));
    }

    #[test]
    fn end_to_end_predicate_shape() {
        let gh = test_context();
        let predicate = assemble(
            DIGEST,
            &gh,
            BUILDER_REF,
            vec!["go".to_string(), "build".to_string()],
            vec![],
        )
        .unwrap();

        assert_eq!(
            predicate.invocation.config_source.uri,
            "git+https://github.com/org/repo@refs/heads/main.git"
        );
        assert_eq!(predicate.invocation.config_source.entry_point, "build.yml");
        assert_eq!(
            predicate.invocation.config_source.digest["sha1"],
            "abc4567890abcdef"
        );
        assert_eq!(
            predicate.builder.id,
            format!("https://github.com/{BUILDER_REF}")
        );

        assert_eq!(predicate.build_config.steps.len(), 1);
        assert_eq!(predicate.build_config.steps[0].command, &["go", "build"]);
        assert!(predicate.build_config.steps[0].env.is_empty());

        assert_eq!(predicate.materials.len(), 1);
        assert_eq!(predicate.materials[0].uri, "git+org/repo.git");

        assert_eq!(predicate.invocation.parameters.version, 1);
        assert_eq!(predicate.build_config.version, 1);
        assert_eq!(predicate.invocation.parameters.actor, "octocat");
    }

    #[test]
    fn serialized_field_names_follow_slsa_schema() {
        let gh = test_context();
        let predicate =
            assemble(DIGEST, &gh, BUILDER_REF, vec!["go".to_string()], vec![]).unwrap();
        let json = serde_json::to_string(&predicate).unwrap();

        for key in [
            r#""buildType""#,
            r#""configSource""#,
            r#""entryPoint""#,
            r#""buildConfig""#,
            r#""materials""#,
            r#""event_name""#,
            r#""ref""#,
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
        assert!(!json.contains(r#""git_ref""#));
    }

    #[test]
    fn identical_inputs_serialize_identically() {
        let gh = test_context();
        let bytes_a = serde_json::to_vec(
            &assemble(DIGEST, &gh, BUILDER_REF, vec!["go".to_string()], vec![]).unwrap(),
        )
        .unwrap();
        let bytes_b = serde_json::to_vec(
            &assemble(DIGEST, &gh, BUILDER_REF, vec!["go".to_string()], vec![]).unwrap(),
        )
        .unwrap();
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn generate_decodes_wire_inputs() {
        let command = wire::marshall_list(&["go".to_string(), "build".to_string()]);
        let raw_context = r#"{
            "repository": "org/repo",
            "workflow": "build.yml",
            "sha": "abc",
            "ref": "refs/heads/main",
            "event_name": "push",
            "server_url": "https://github.com/"
        }"#;

        let bytes = generate(DIGEST, raw_context, &command, "", BUILDER_REF).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            value["buildConfig"]["steps"][0]["command"],
            serde_json::json!(["go", "build"])
        );
        assert_eq!(
            value["buildConfig"]["steps"][0]["env"],
            serde_json::json!([])
        );
        assert_eq!(
            value["invocation"]["configSource"]["uri"],
            "git+https://github.com/org/repo@refs/heads/main.git"
        );
    }

    #[test]
    fn generate_rejects_bad_wire_encoding() {
        let raw_context = r#"{"repository": "org/repo"}"#;
        let err = generate(DIGEST, raw_context, "!!!", "", BUILDER_REF).unwrap_err();
        assert!(matches!(err, ProvenanceError::InvalidEncoding(_)));
    }

    #[test]
    fn generate_rejects_missing_context() {
        let err = generate(DIGEST, "", "", "", BUILDER_REF).unwrap_err();
        assert!(matches!(err, ProvenanceError::MissingCiContext(_)));
    }

    #[test]
    fn predicate_never_contains_context_token() {
        let raw_context = r#"{
            "repository": "org/repo",
            "ref": "refs/heads/main",
            "server_url": "https://github.com/",
            "token": "ghs_supersecret"
        }"#;
        let bytes = generate(DIGEST, raw_context, "", "", BUILDER_REF).unwrap();
        let json = String::from_utf8(bytes).unwrap();
        assert!(!json.contains("supersecret"));
    }
}
