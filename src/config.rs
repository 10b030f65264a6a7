//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.profilewatch.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".profilewatch.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analysis service connection.
    #[serde(default)]
    pub server: ServerConfig,

    /// Status polling.
    #[serde(default)]
    pub poll: PollConfig,

    /// Start-analysis form.
    #[serde(default)]
    pub submit: SubmitConfig,

    /// Dashboard route templates.
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Result rendering.
    #[serde(default)]
    pub render: RenderConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Analysis service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the analysis service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("profilewatch/{}", env!("CARGO_PKG_VERSION"))
}

/// Status polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between two status requests, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    2000
}

/// Start-analysis form settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    /// Form action: a path on the service or an absolute URL.
    #[serde(default = "default_action")]
    pub action: String,

    /// Fields that must be present and non-blank before submitting.
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            action: default_action(),
            required_fields: default_required_fields(),
        }
    }
}

fn default_action() -> String {
    "/api/analyze".to_string()
}

fn default_required_fields() -> Vec<String> {
    vec!["platform".to_string(), "profile_id".to_string()]
}

/// Dashboard route templates; `{id}` is replaced by the task id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_task_view")]
    pub task_view: String,

    #[serde(default = "default_result_view")]
    pub result_view: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            task_view: default_task_view(),
            result_view: default_result_view(),
        }
    }
}

fn default_task_view() -> String {
    "/tasks/{id}".to_string()
}

fn default_result_view() -> String {
    "/results/{id}".to_string()
}

/// Output format for rendered results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text with bar charts (default)
    #[default]
    Terminal,
    /// Markdown document
    Markdown,
    /// Raw task document as JSON
    Json,
}

/// Chart used to draw an analysis category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Radar,
    Doughnut,
}

/// Result rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Width of a full bar, in characters.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,

    /// Maximum number of predicted interests to list.
    #[serde(default = "default_max_interests")]
    pub max_interests: usize,

    /// Chart kind per analysis category; unlisted categories use bars.
    #[serde(default)]
    pub charts: BTreeMap<String, ChartKind>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            bar_width: default_bar_width(),
            max_interests: default_max_interests(),
            charts: BTreeMap::new(),
        }
    }
}

impl RenderConfig {
    /// Chart kind configured for a category.
    pub fn chart_for(&self, category: &str) -> ChartKind {
        self.charts.get(category).copied().unwrap_or_default()
    }
}

fn default_bar_width() -> usize {
    30
}

fn default_max_interests() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.profilewatch.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_url) = args.base_url {
            self.server.base_url = base_url.clone();
        }

        if let Some(timeout) = args.timeout {
            self.server.timeout_seconds = timeout;
        }

        if let Some(interval) = args.command.interval_ms() {
            self.poll.interval_ms = interval;
        }

        if let Some(action) = args.command.action() {
            self.submit.action = action.to_string();
        }

        if let Some(format) = args.command.format() {
            self.render.format = format;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check the merged configuration before anything talks to the service.
    pub fn validate(&self) -> Result<()> {
        let base_url = &self.server.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!(
                "server.base_url must start with 'http://' or 'https://', got '{}'",
                base_url
            );
        }

        if self.server.timeout_seconds == 0 {
            bail!("server.timeout_seconds must be at least 1");
        }

        if self.poll.interval_ms == 0 {
            bail!("poll.interval_ms must be at least 1");
        }

        for (name, template) in [
            ("routes.task_view", &self.routes.task_view),
            ("routes.result_view", &self.routes.result_view),
        ] {
            if !template.contains("{id}") {
                bail!("{} must contain '{{id}}', got '{}'", name, template);
            }
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://localhost:5000");
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.submit.required_fields, vec!["platform", "profile_id"]);
        assert_eq!(config.routes.task_view, "/tasks/{id}");
        assert_eq!(config.render.format, OutputFormat::Terminal);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[server]
base_url = "https://analysis.example.com"
timeout_seconds = 10

[poll]
interval_ms = 500

[routes]
result_view = "/result/{id}"

[render]
format = "markdown"
max_interests = 3

[render.charts]
sentiment = "doughnut"
personality = "radar"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.base_url, "https://analysis.example.com");
        assert_eq!(config.server.timeout_seconds, 10);
        assert_eq!(config.poll.interval_ms, 500);
        assert_eq!(config.routes.task_view, "/tasks/{id}");
        assert_eq!(config.routes.result_view, "/result/{id}");
        assert_eq!(config.render.format, OutputFormat::Markdown);
        assert_eq!(config.render.max_interests, 3);
        assert_eq!(config.render.chart_for("sentiment"), ChartKind::Doughnut);
        assert_eq!(config.render.chart_for("personality"), ChartKind::Radar);
        assert_eq!(config.render.chart_for("topics"), ChartKind::Bar);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[submit]\naction = \"/analyze\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.submit.action, "/analyze");

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[poll\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let args = Args::try_parse_from([
            "profilewatch",
            "--base-url",
            "http://10.0.0.5:8000",
            "watch",
            "42",
            "--interval-ms",
            "250",
        ])
        .unwrap();

        let mut config = Config::default();
        config.server.timeout_seconds = 99;
        config.merge_with_args(&args);

        assert_eq!(config.server.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.server.timeout_seconds, 99);
        assert_eq!(config.poll.interval_ms, 250);
        assert_eq!(config.submit.action, "/api/analyze");
    }

    #[test]
    fn test_validate_rejects_zero_values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "[poll]\ninterval_ms = 0\n").unwrap();
        let config = Config::load(&path).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll.interval_ms"));

        std::fs::write(&path, "[server]\ntimeout_seconds = 0\n").unwrap();
        let config = Config::load(&path).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.timeout_seconds"));
    }

    #[test]
    fn test_validate_after_merge() {
        let mut config: Config = toml::from_str("[poll]\ninterval_ms = 0\n").unwrap();
        let args =
            Args::try_parse_from(["profilewatch", "watch", "42", "--interval-ms", "500"]).unwrap();
        config.merge_with_args(&args);
        assert!(config.validate().is_ok());

        config.server.base_url = "localhost:5000".to_string();
        assert!(config.validate().is_err());

        config.server.base_url = "http://localhost:5000".to_string();
        config.routes.result_view = "/results".to_string();
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_verbose_from_file_or_flag() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert!(config.general.verbose);

        let args = Args::try_parse_from(["profilewatch", "-v", "status", "42"]).unwrap();
        let mut from_flag = Config::default();
        from_flag.merge_with_args(&args);
        assert!(from_flag.general.verbose);

        let args = Args::try_parse_from(["profilewatch", "status", "42"]).unwrap();
        config.merge_with_args(&args);
        assert!(config.general.verbose);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[poll]"));
        assert!(toml_str.contains("[routes]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.poll.interval_ms, 2000);
    }
}
