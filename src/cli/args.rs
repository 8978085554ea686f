//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--home <dir>`: Local state directory (default `~/.lodestar`)
//!
//! Every subcommand parses into its own argument struct, built fresh for
//! each invocation.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Lodestar - Help guide your applications through their environments
#[derive(Parser, Debug)]
#[command(name = "lodestar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Local state directory holding registered apps and settings
    #[arg(long, global = true, env = "LODESTAR_HOME", value_name = "DIR")]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage application image tags
    App {
        #[command(subcommand)]
        action: AppAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for Lodestar commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash
    lodestar completion bash > ~/.local/share/bash-completion/completions/lodestar

    # Zsh
    lodestar completion zsh > ~/.zfunc/_lodestar

    # Fish
    lodestar completion fish > ~/.config/fish/completions/lodestar.fish

    # PowerShell
    lodestar completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// App subcommands
#[derive(Subcommand, Debug)]
pub enum AppAction {
    /// Update an app environment's configuration file with a new tag
    #[command(
        long_about = "Update an app environment's configuration file with a new tag.\n\n\
            Identify the app either by a name registered in the Lodestar home \
            directory or by an explicit config file path.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Push to a registered app
    lodestar app push --name api --env dev --tag v2 -u ci -t $TOKEN

    # Push using a config file
    lodestar app push --config-path ./api.yaml --env dev --tag v2"
    )]
    Push(PushArgs),

    /// Promote an image tag from one environment to another
    #[command(
        long_about = "Promote an image tag from one environment to another.\n\n\
            Reads the tag recorded in the source environment's configuration \
            file and records it in the destination's. The source is never modified."
    )]
    Promote(PromoteArgs),

    /// List all registered apps
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the configuration file for a registered app
    Show {
        /// The name of an app
        #[arg(long)]
        name: String,
    },
}

/// Which app to operate on.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct AppTarget {
    /// The name of a registered app
    #[arg(long)]
    pub name: Option<String>,

    /// The path to the app configuration file
    #[arg(long, value_name = "PATH")]
    pub config_path: Option<PathBuf>,
}

/// Credentials for the version control account that can access the repository.
#[derive(Args, Debug, Clone)]
pub struct CredentialArgs {
    /// Username for the version control account
    #[arg(short, long, env = "GIT_USER", hide = true)]
    pub username: String,

    /// Token for the version control account
    #[arg(short, long, env = "GIT_TOKEN", hide = true, hide_env_values = true)]
    pub token: String,
}

/// Arguments for `app push`.
#[derive(Args, Debug, Clone)]
pub struct PushArgs {
    #[command(flatten)]
    pub target: AppTarget,

    /// The environment the tag will be pushed to
    #[arg(long, visible_alias = "env")]
    pub environment: String,

    /// The tag for the new image
    #[arg(long)]
    pub tag: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

/// Arguments for `app promote`.
#[derive(Args, Debug, Clone)]
pub struct PromoteArgs {
    #[command(flatten)]
    pub target: AppTarget,

    /// The name of the source environment
    #[arg(long)]
    pub src_env: String,

    /// The name of the destination environment
    #[arg(long)]
    pub dest_env: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn push_by_name() {
        let cli = Cli::try_parse_from([
            "lodestar", "app", "push", "--name", "api", "--env", "dev", "--tag", "v2", "-u",
            "ci", "-t", "secret",
        ])
        .unwrap();

        match cli.command {
            Command::App {
                action: AppAction::Push(args),
            } => {
                assert_eq!(args.target.name.as_deref(), Some("api"));
                assert!(args.target.config_path.is_none());
                assert_eq!(args.environment, "dev");
                assert_eq!(args.tag, "v2");
                assert_eq!(args.credentials.username, "ci");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn promote_by_config_path() {
        let cli = Cli::try_parse_from([
            "lodestar",
            "app",
            "promote",
            "--config-path",
            "api.yaml",
            "--src-env",
            "dev",
            "--dest-env",
            "prod",
            "--username",
            "ci",
            "--token",
            "secret",
        ])
        .unwrap();

        match cli.command {
            Command::App {
                action: AppAction::Promote(args),
            } => {
                assert_eq!(args.target.config_path, Some(PathBuf::from("api.yaml")));
                assert_eq!(args.src_env, "dev");
                assert_eq!(args.dest_env, "prod");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn name_and_config_path_conflict() {
        let result = Cli::try_parse_from([
            "lodestar",
            "app",
            "push",
            "--name",
            "api",
            "--config-path",
            "api.yaml",
            "--env",
            "dev",
            "--tag",
            "v2",
            "-u",
            "ci",
            "-t",
            "secret",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn target_required() {
        let result = Cli::try_parse_from([
            "lodestar", "app", "push", "--env", "dev", "--tag", "v2", "-u", "ci", "-t", "secret",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lodestar", "app", "list", "--json", "-q", "--home", "/tmp/h",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/h")));
    }
}
