use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::NotepadError;

pub const DEFAULT_BASE_URL: &str = "https://open.maimemo.com/open/api/v1";
pub const DEFAULT_PAGE_LIMIT: u32 = 5;
pub const DEFAULT_QUIET_PERIOD_MS: u64 = 20_000;
pub const DEFAULT_DELIMITER: &str = "\n";

#[derive(Parser, Debug)]
#[command(name = "potmemo")]
#[command(about = "Collects words into a Maimemo cloud notepad", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,

    /// Words to collect. Read from stdin, one per line, when omitted.
    pub words: Vec<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".potmemo")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Maimemo {
    pub auth_token: String,
    pub notepad_title: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Api {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

impl Default for Api {
    fn default() -> Self {
        Api {
            base_url: default_base_url(),
            page_limit: default_page_limit(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct Collector {
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for Collector {
    fn default() -> Self {
        Collector {
            quiet_period_ms: default_quiet_period_ms(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_quiet_period_ms() -> u64 {
    DEFAULT_QUIET_PERIOD_MS
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

impl Collector {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub maimemo: Maimemo,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub collector: Collector,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let yaml_str =
            fs::read_to_string(path).with_context(|| format!("reading config file {}", path))?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env).context("parsing config yaml")?;
        if config.collector.delimiter.is_empty() {
            anyhow::bail!("collector.delimiter must not be empty");
        }
        Ok(config)
    }

    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            auth_token: self.maimemo.auth_token.clone(),
            notepad_title: self.maimemo.notepad_title.clone(),
        }
    }

    /// Expands `${VAR}` and `${VAR:-default}`. An unset variable without a
    /// default expands to an empty string.
    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut out = String::with_capacity(yaml_str.len());
        let mut rest = yaml_str;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            // Placeholders never span lines.
            let line_end = after.find('\n').unwrap_or(after.len());
            let Some(end) = after[..line_end].find('}') else {
                let consumed = yaml_str.len() - rest.len() + start;
                let line = yaml_str[..consumed].matches('\n').count() + 1;
                anyhow::bail!("unterminated ${{ on line {} of config", line);
            };

            let expr = &after[..end];
            let (name, default) = match expr.split_once(":-") {
                Some((name, default)) => (name, Some(default)),
                None => (expr, None),
            };
            if name.trim().is_empty() {
                anyhow::bail!("empty variable name in ${{{}}}", expr);
            }

            match (env::var(name), default) {
                (Ok(value), _) => out.push_str(&value),
                (Err(_), Some(default)) => out.push_str(default),
                (Err(_), None) => tracing::warn!("environment variable '{}' not found", name),
            }
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Per-call settings handed over by the host runtime in `options.config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOptions {
    pub auth_token: String,
    pub notepad_title: String,
}

impl CollectOptions {
    pub fn from_host_config(config: &HashMap<String, Value>) -> Result<Self, NotepadError> {
        Ok(CollectOptions {
            auth_token: required_option(config, "auth_token")?,
            notepad_title: required_option(config, "notepad_title")?,
        })
    }
}

fn required_option(config: &HashMap<String, Value>, key: &'static str) -> Result<String, NotepadError> {
    match config.get(key).and_then(Value::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
        _ => Err(NotepadError::MissingOption(key)),
    }
}
