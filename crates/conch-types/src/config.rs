//! Shell configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! a working shell.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::desc::{ArgDesc, CmdDesc};
use crate::error::{ConchError, Result};
use crate::style::StyledLine;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "CONCH_CONFIG";

/// Config file picked up from the working directory when nothing else is named.
pub const DEFAULT_CONFIG_FILE: &str = "conch.toml";

/// Which externally supplied completer to combine with the registry completers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalCompleter {
    #[default]
    None,
    /// Fixed word list (`simple_words`).
    Simple,
    /// Nested `Command1 Option1 Param1|Param2` tree.
    Tree,
    /// Context-dependent parameter completer.
    Param,
}

/// Settings for a periodic background task.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: default_interval_ms(),
        }
    }
}

/// One argument entry of a static tail-tip.
#[derive(Debug, Clone, Deserialize)]
pub struct TipArgConfig {
    pub name: String,
    #[serde(default)]
    pub description: Vec<String>,
}

/// Static tail-tip for one command name.
#[derive(Debug, Clone, Deserialize)]
pub struct TipConfig {
    pub name: String,
    #[serde(default)]
    pub main: Vec<String>,
    #[serde(default)]
    pub args: Vec<TipArgConfig>,
    #[serde(default)]
    pub options: HashMap<String, Vec<String>>,
}

impl TipConfig {
    /// Convert into a structured description.
    pub fn to_cmd_desc(&self) -> CmdDesc {
        let main = self.main.iter().map(StyledLine::plain).collect();
        let args = self
            .args
            .iter()
            .map(|a| ArgDesc::new(&a.name, a.description.iter().map(StyledLine::plain).collect()))
            .collect();
        let opts = self
            .options
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().map(StyledLine::plain).collect()))
            .collect();
        CmdDesc::new(main, args, opts)
    }
}

/// Top-level shell configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Primary prompt.
    pub prompt: String,
    /// Optional right-hand prompt, printed after the echo line.
    pub right_prompt: Option<String>,
    /// Maximum description lines shown by the tool-tip.
    pub tip_lines: usize,
    /// Longest source the default signature lookup will analyze.
    pub method_source_limit: usize,
    /// Keywords that suppress the method tool-tip when they end the head.
    pub control_keywords: Vec<String>,
    /// Signatures reported by the default signature lookup.
    pub method_signatures: Vec<String>,
    /// External completer combined with the registry completers.
    pub completer: ExternalCompleter,
    /// Words offered by the `simple` external completer.
    pub simple_words: Vec<String>,
    /// Duration of the demo `sleep` command.
    pub sleep_secs: u64,
    /// Report unclosed quotes/brackets as incomplete and read more lines.
    pub multiline: bool,
    /// Status-line counter task.
    pub status: TickerConfig,
    /// Recurring announcement task.
    pub timer: TickerConfig,
    /// Static tail-tips taking precedence over registry descriptions.
    pub tips: Vec<TipConfig>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "prompt> ".to_string(),
            right_prompt: None,
            tip_lines: 5,
            method_source_limit: 20,
            control_keywords: vec!["if".into(), "while".into(), "for".into()],
            method_signatures: vec![
                "method1(int arg1, List<String> arg2)".into(),
                "method1(int arg1, Map<String,Object> arg2)".into(),
            ],
            completer: ExternalCompleter::None,
            simple_words: vec!["foo".into(), "bar".into(), "baz".into()],
            sleep_secs: 3,
            multiline: false,
            status: TickerConfig::default(),
            timer: TickerConfig::default(),
            tips: Vec::new(),
        }
    }
}

fn default_interval_ms() -> u64 {
    1000
}

impl ShellConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ShellConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Resolve the config to use.
    ///
    /// Resolution order:
    /// 1. `explicit` path (e.g. the first CLI argument)
    /// 2. Path in `$CONCH_CONFIG`
    /// 3. `./conch.toml` if it exists
    /// 4. Built-in defaults
    pub fn resolve(explicit: Option<&str>) -> Result<Self> {
        let named = explicit
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_ENV).ok());
        if let Some(name) = named {
            let path = Path::new(&name);
            if path.is_file() {
                log::info!("Loading config from {}", path.display());
                return Self::from_file(path);
            }
            log::warn!("Config '{name}' not found -- using defaults");
            return Ok(Self::default());
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            log::info!("Loading config from {DEFAULT_CONFIG_FILE}");
            return Self::from_file(local);
        }
        Ok(Self::default())
    }

    /// Static tail-tips keyed by command name.
    pub fn tip_table(&self) -> HashMap<String, CmdDesc> {
        self.tips
            .iter()
            .map(|t| (t.name.clone(), t.to_cmd_desc()))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.tip_lines == 0 {
            return Err(ConchError::Config("tip_lines must be at least 1".into()));
        }
        for ticker in [&self.status, &self.timer] {
            if ticker.enabled && ticker.interval_ms == 0 {
                return Err(ConchError::Config(
                    "ticker interval_ms must be non-zero".into(),
                ));
            }
        }
        if let Some(tip) = self.tips.iter().find(|t| t.name.trim().is_empty()) {
            return Err(ConchError::Config(format!(
                "tail-tip with empty name (main: {:?})",
                tip.main
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = ShellConfig::from_toml("").unwrap();
        assert_eq!(config.prompt, "prompt> ");
        assert_eq!(config.tip_lines, 5);
        assert_eq!(config.method_source_limit, 20);
        assert_eq!(config.control_keywords, vec!["if", "while", "for"]);
        assert_eq!(config.completer, ExternalCompleter::None);
        assert!(!config.status.enabled);
    }

    #[test]
    fn partial_override() {
        let config = ShellConfig::from_toml(
            r#"
            prompt = "conch> "
            completer = "tree"

            [timer]
            enabled = true
            interval_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.prompt, "conch> ");
        assert_eq!(config.completer, ExternalCompleter::Tree);
        assert!(config.timer.enabled);
        assert_eq!(config.timer.interval_ms, 250);
        assert_eq!(config.status.interval_ms, 1000);
    }

    #[test]
    fn tips_convert_to_descriptions() {
        let config = ShellConfig::from_toml(
            r#"
            [[tips]]
            name = "foo11"
            options = { "--optionA" = ["optionA description..."] }

            [[tips.args]]
            name = "param1"
            description = ["Param1 description...", "line 2"]

            [[tips.args]]
            name = "param3"
            "#,
        )
        .unwrap();
        let table = config.tip_table();
        let desc = &table["foo11"];
        assert!(desc.is_valid());
        assert_eq!(desc.arg_desc().len(), 2);
        assert_eq!(desc.arg_desc()[0].description.len(), 2);
        assert!(desc.arg_desc()[1].description.is_empty());
        assert_eq!(desc.opt_desc()["--optionA"][0].text, "optionA description...");
    }

    #[test]
    fn zero_tip_lines_rejected() {
        let err = ShellConfig::from_toml("tip_lines = 0").unwrap_err();
        assert!(matches!(err, ConchError::Config(_)));
    }

    #[test]
    fn zero_interval_rejected_when_enabled() {
        let err = ShellConfig::from_toml("[status]\nenabled = true\ninterval_ms = 0").unwrap_err();
        assert!(matches!(err, ConchError::Config(_)));
    }

    #[test]
    fn unknown_completer_is_parse_error() {
        let err = ShellConfig::from_toml("completer = \"files\"").unwrap_err();
        assert!(matches!(err, ConchError::TomlParse(_)));
    }

    #[test]
    fn missing_explicit_file_falls_back() {
        let config = ShellConfig::resolve(Some("/nonexistent/conch.toml")).unwrap();
        assert_eq!(config.prompt, "prompt> ");
    }
}
