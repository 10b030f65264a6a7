//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::{GeneralConfig, OutputFormat};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// profilewatch - submit and track profile analysis jobs
///
/// Starts analysis jobs on the analysis service, follows them until they
/// finish and renders the results in the terminal, as Markdown or as JSON.
///
/// Examples:
///   profilewatch submit --platform instagram --profile-id jane.doe --watch
///   profilewatch watch 42
///   profilewatch show 42 --format markdown --output report.md
///   profilewatch cancel 42
///   profilewatch init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .profilewatch.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base URL of the analysis service
    #[arg(long, value_name = "URL", env = "PROFILEWATCH_URL", global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start a new profile analysis
    Submit(SubmitArgs),

    /// Follow a task until it finishes, then render its result
    Watch(WatchArgs),

    /// Print the current status of a task once
    Status {
        /// Task identifier
        task_id: String,
    },

    /// Cancel a running task
    Cancel {
        /// Task identifier
        task_id: String,
    },

    /// Fetch and render the result of a task
    Show(ShowArgs),

    /// Generate a default .profilewatch.toml configuration file
    InitConfig,
}

/// Output options shared by commands that render a result.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Output format (terminal, markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the rendered result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SubmitArgs {
    /// Platform the profile lives on (e.g. instagram, twitter)
    #[arg(long)]
    pub platform: String,

    /// Profile identifier or handle on that platform
    #[arg(long)]
    pub profile_id: String,

    /// Extra form field, repeatable
    ///
    /// Example: --field depth=full --field language=en
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Form action (path on the service or absolute URL)
    #[arg(long, value_name = "URL")]
    pub action: Option<String>,

    /// Keep following the task after it has been created
    #[arg(long)]
    pub watch: bool,

    /// Delay between status requests when watching
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct WatchArgs {
    /// Task identifier
    pub task_id: String,

    /// Delay between status requests
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Send a cancel request when interrupted with Ctrl-C
    #[arg(long)]
    pub cancel_on_interrupt: bool,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ShowArgs {
    /// Task identifier
    pub task_id: String,

    #[command(flatten)]
    pub render: RenderArgs,
}

/// Parse a `key=value` form field.
fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

impl Command {
    /// Polling interval given on the command line, if any.
    pub fn interval_ms(&self) -> Option<u64> {
        match self {
            Command::Submit(args) => args.interval_ms,
            Command::Watch(args) => args.interval_ms,
            _ => None,
        }
    }

    /// Form action given on the command line, if any.
    pub fn action(&self) -> Option<&str> {
        match self {
            Command::Submit(args) => args.action.as_deref(),
            _ => None,
        }
    }

    fn render_args(&self) -> Option<&RenderArgs> {
        match self {
            Command::Submit(args) => Some(&args.render),
            Command::Watch(args) => Some(&args.render),
            Command::Show(args) => Some(&args.render),
            _ => None,
        }
    }

    /// Output format given on the command line, if any.
    pub fn format(&self) -> Option<OutputFormat> {
        self.render_args().and_then(|r| r.format)
    }

}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref base_url) = self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(interval) = self.command.interval_ms() {
            if interval == 0 {
                return Err("Polling interval must be at least 1 ms".to_string());
            }
        }

        if let Command::Submit(ref submit) = self.command {
            if submit.platform.trim().is_empty() {
                return Err("--platform must not be empty".to_string());
            }
            if submit.profile_id.trim().is_empty() {
                return Err("--profile-id must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `general.verbose` from the config file turns on debug logging like
    /// `--verbose` does; `--quiet` still wins.
    pub fn log_level(&self, general: &GeneralConfig) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("profilewatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_submit_requires_platform_and_profile() {
        let result = Args::try_parse_from(["profilewatch", "submit", "--platform", "instagram"]);
        assert!(result.is_err());

        let args = parse(&[
            "submit",
            "--platform",
            "instagram",
            "--profile-id",
            "jane.doe",
            "--field",
            "depth=full",
            "--watch",
        ]);
        match args.command {
            Command::Submit(submit) => {
                assert_eq!(submit.platform, "instagram");
                assert_eq!(submit.profile_id, "jane.doe");
                assert_eq!(
                    submit.fields,
                    vec![("depth".to_string(), "full".to_string())]
                );
                assert!(submit.watch);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("lang=en=US"),
            Ok(("lang".to_string(), "en=US".to_string()))
        );
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=value").is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = parse(&["status", "42"]);
        args.base_url = Some("localhost:5000".to_string());
        assert!(args.validate().is_err());

        args.base_url = Some("http://localhost:5000".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_interval() {
        let args = parse(&["watch", "42", "--interval-ms", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_blank_profile() {
        let args = parse(&["submit", "--platform", "x", "--profile-id", "  "]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = parse(&["status", "42"]);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_render_options() {
        let args = parse(&["show", "42", "--format", "json", "-o", "out.json"]);
        assert_eq!(args.command.format(), Some(OutputFormat::Json));
        match args.command {
            Command::Show(ref show) => {
                assert_eq!(show.render.output, Some(PathBuf::from("out.json")))
            }
            ref other => panic!("unexpected command: {:?}", other),
        }

        let args = parse(&["cancel", "42"]);
        assert_eq!(args.command.format(), None);
    }

    #[test]
    fn test_log_level() {
        let quiet_file = GeneralConfig::default();
        let verbose_file = GeneralConfig { verbose: true };

        let mut args = parse(&["status", "42"]);
        assert_eq!(args.log_level(&quiet_file), tracing::Level::INFO);
        assert_eq!(args.log_level(&verbose_file), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(&quiet_file), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(&verbose_file), tracing::Level::ERROR);
    }
}
