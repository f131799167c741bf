// cli.rs — Command-line interface definitions (clap derive)
//
// Defines the `provwrap` command tree:
//   provwrap build     — validate params and run (or dry-run) the build tool
//   provwrap registry  — print the registry derived from the env args
//   provwrap predicate — assemble and write the provenance predicate

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "provwrap")]
#[command(about = "provwrap CLI — SLSA build provenance wrapper")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate untrusted build parameters and invoke the build tool
    Build {
        /// Capture the trusted invocation metadata without running the
        /// build tool
        #[arg(long)]
        dry: bool,

        /// Space-separated flags for the build tool
        #[arg(long, default_value = "")]
        build_args: String,

        /// Comma-separated NAME=VALUE env assignments for the build tool
        #[arg(long, default_value = "")]
        env_args: String,
    },

    /// Print the registry destination derived from the env args
    Registry {
        /// Comma-separated NAME=VALUE env assignments for the build tool
        #[arg(long, default_value = "")]
        env_args: String,
    },

    /// Assemble the provenance predicate for a built artifact
    Predicate {
        /// Untrusted artifact name (used only for the output filename)
        #[arg(long)]
        artifact_name: String,

        /// SHA-256 hex digest of the artifact
        #[arg(long)]
        digest: String,

        /// base64(JSON array) command captured at dry-run time
        #[arg(long)]
        command: String,

        /// base64(JSON array) env captured at dry-run time
        #[arg(long, default_value = "")]
        env: String,
    },
}
