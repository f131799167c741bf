// main.rs — provwrap CLI entry point
//
// Three subcommands, mirroring the two phases of an attested build:
//   build     — validate untrusted params, then dry-run (capture trusted
//               metadata) or exec the build tool
//   registry  — print the registry destination for the CI job
//   predicate — after the artifact exists, exchange the CI token for a
//               builder identity and write the provenance predicate
//
// Every validation failure exits non-zero with a message naming the
// failed check; the calling pipeline owns any retry.

mod cli;
mod hash;
mod provenance;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use cli::{Cli, Commands};
use provenance::command::{BuildCommand, DEFAULT_TOOL_PATH};
use provenance::context::CONTEXT_ENV_KEY;
use provenance::error::ProvenanceError;
use provenance::policy::AllowListPolicy;
use provenance::{identity, predicate, validate};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            dry,
            build_args,
            env_args,
        } => cmd_build(dry, &build_args, &env_args),
        Commands::Registry { env_args } => cmd_registry(&env_args),
        Commands::Predicate {
            artifact_name,
            digest,
            command,
            env,
        } => cmd_predicate(&artifact_name, &digest, &command, &env),
    }
}

fn cmd_build(dry: bool, build_args: &str, env_args: &str) -> Result<()> {
    let policy = AllowListPolicy::ko_default();
    let validated =
        validate::validate(&policy, build_args, env_args).context("validating build parameters")?;
    let build = BuildCommand::new(DEFAULT_TOOL_PATH, &validated);

    if dry {
        // Capture the trusted metadata before any untrusted build step
        // runs; the CI job carries these outputs to the predicate step.
        let outputs = build.dry_run_outputs().context("synthesizing dry-run outputs")?;
        println!("::set-output name=command::{}", outputs.command);
        println!("::set-output name=envs::{}", outputs.envs);
        println!("::set-output name=registry::{}", outputs.registry);
        return Ok(());
    }

    eprintln!("[provwrap] exec: {}", build.argv().join(" "));

    // exec replaces the process image; reaching the line below means it
    // failed.
    let err = build.exec();
    Err(err).context(format!("executing {DEFAULT_TOOL_PATH}"))
}

fn cmd_registry(env_args: &str) -> Result<()> {
    let policy = AllowListPolicy::ko_default();
    let validated =
        validate::validate(&policy, "", env_args).context("validating env parameters")?;
    let build = BuildCommand::new(DEFAULT_TOOL_PATH, &validated);

    println!("{}", build.registry().context("deriving registry")?);
    Ok(())
}

fn cmd_predicate(artifact_name: &str, digest: &str, command: &str, env: &str) -> Result<()> {
    let raw_context = std::env::var(CONTEXT_ENV_KEY)
        .map_err(|_| ProvenanceError::MissingCiContext(format!("{CONTEXT_ENV_KEY} not present")))?;

    let builder_ref = identity::fetch_builder_identity().context("exchanging identity token")?;

    let bytes = predicate::generate(digest, &raw_context, command, env, &builder_ref)
        .context("assembling predicate")?;

    let filename = predicate_filename(artifact_name);
    let path = write_predicate(Path::new("."), &filename, &bytes)
        .with_context(|| format!("writing {filename}"))?;

    eprintln!("[provwrap] predicate written to {}", path.display());
    eprintln!("[provwrap] predicate sha256: {}", hash::sha256_hex(&bytes));
    println!("::set-output name=predicate::{filename}");

    Ok(())
}

/// Derive the output filename from the untrusted artifact name, with
/// path separators and colons replaced by filesystem-safe characters.
fn predicate_filename(artifact_name: &str) -> String {
    let name = artifact_name.replace('/', "-").replace(':', "--");
    format!("{name}.intoto.jsonl")
}

fn write_predicate(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(filename);
    fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_replaces_separators_and_colons() {
        assert_eq!(
            predicate_filename("ghcr.io/org/app:v1"),
            "ghcr.io-org-app--v1.intoto.jsonl"
        );
        assert_eq!(predicate_filename("app"), "app.intoto.jsonl");
    }

    #[test]
    fn writes_predicate_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_predicate(dir.path(), "app.intoto.jsonl", b"{}").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");
    }
}
