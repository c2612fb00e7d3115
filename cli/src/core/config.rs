//! # gitabot Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module implements the configuration system for gitabot, handling loading,
//! merging, validation, and access to configuration data. It supports a multi-level
//! configuration approach that combines defaults, user settings, project-specific
//! overrides and secrets taken from the environment.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence, highest first):
//! 1. Command-line flags of the individual commands (applied by the commands)
//! 2. Environment variables for secrets (`WHATSAPP_*`, `EMBEDDING_API_KEY`)
//! 3. Project-specific `.gitabot.toml` in current directory or ancestors,
//!    or an explicit `--config <path>`
//! 4. User-specific `<config dir>/gitabot/config.toml`
//! 5. Default values defined in the code
//!
//! File layers are deep-merged table by table before deserialization, so a
//! project file only needs to name the keys it overrides.
//!
//! ## Examples
//!
//! ```rust,no_run
//! # use gitabot::core::config;
//! # fn main() -> anyhow::Result<()> {
//! let cfg = config::load_config(None)?;
//!
//! let dataset_path = &cfg.dataset.path;
//! let languages = &cfg.bot.languages;
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::{GitabotError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Mood label -> keywords. `None` keeps the built-in mood table.
    #[serde(default)]
    pub moods: Option<BTreeMap<String, Vec<String>>>,
}

/// Location of the scripture dataset.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_path")]
    pub path: String,
}

/// Location of the persisted user-state file.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: String,
}

/// Listen address and middleware switches for `gitabot serve`.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

/// Chat behavior knobs.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Meaning / word-meaning languages rendered, in order.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Chapters sampled by the `random` command (1..=chapter_count).
    #[serde(default = "default_chapter_count")]
    pub chapter_count: u32,
    /// Cap on formatted verses per direct-reference message.
    #[serde(default = "default_max_references")]
    pub max_references: usize,
    /// Number of verses returned by the mood and semantic tiers.
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,
    /// Bounded retry count for the `random` command.
    #[serde(default = "default_random_attempts")]
    pub random_attempts: u32,
}

/// WhatsApp Cloud API settings. Secrets normally come from the environment.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    #[serde(default)]
    pub verify_token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
    #[serde(default = "default_whatsapp_api_base")]
    pub api_base: String,
    #[serde(default = "default_whatsapp_api_version")]
    pub api_version: String,
}

/// Settings for the OpenAI-compatible embedding endpoint used by the semantic tier.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_dataset_path() -> String {
    "dataset_english.json".to_string()
}
fn default_state_path() -> String {
    "user_state.json".to_string()
}
fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}
fn default_port() -> u16 {
    5000
}
fn default_true() -> bool {
    true
}
fn default_languages() -> Vec<String> {
    vec!["english".to_string()]
}
fn default_chapter_count() -> u32 {
    18
}
fn default_max_references() -> usize {
    5
}
fn default_results_per_query() -> usize {
    3
}
fn default_random_attempts() -> u32 {
    5
}
fn default_whatsapp_api_base() -> String {
    "https://graph.facebook.com".to_string()
}
fn default_whatsapp_api_version() -> String {
    "v19.0".to_string()
}
fn default_embedding_endpoint() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_batch_size() -> usize {
    64
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: true,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            chapter_count: default_chapter_count(),
            max_references: default_max_references(),
            results_per_query: default_results_per_query(),
            random_attempts: default_random_attempts(),
        }
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: None,
            access_token: None,
            phone_number_id: None,
            api_base: default_whatsapp_api_base(),
            api_version: default_whatsapp_api_version(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            api_key: None,
            batch_size: default_batch_size(),
        }
    }
}

const PROJECT_CONFIG_FILENAME: &str = ".gitabot.toml";

/// Environment variables that override secret settings.
const ENV_VERIFY_TOKEN: &str = "WHATSAPP_VERIFY_TOKEN";
const ENV_ACCESS_TOKEN: &str = "WHATSAPP_ACCESS_TOKEN";
const ENV_PHONE_NUMBER_ID: &str = "WHATSAPP_PHONE_NUMBER_ID";
const ENV_EMBEDDING_API_KEY: &str = "EMBEDDING_API_KEY";

/// # Load Configuration (`load_config`)
///
/// Loads the user file, then either the explicit `config_path` or the nearest
/// `.gitabot.toml`, merges them, applies environment overrides, expands paths
/// and validates the result.
///
/// ## Errors
///
/// Returns an error if a file cannot be read or parsed, if an explicit
/// `config_path` does not exist, or if validation fails.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let mut layers = Vec::new();
    if let Some(user) = load_user_layer()? {
        layers.push(user);
    }
    if let Some(project) = load_project_layer(config_path)? {
        layers.push(project);
    }
    let mut config = build_config(layers)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    expand_config_paths(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", config);
    Ok(config)
}

fn load_user_layer() -> Result<Option<toml::Value>> {
    let Some(proj_dirs) = ProjectDirs::from("com", "Gitabot", "gitabot") else {
        debug!("Could not determine user config directory.");
        return Ok(None);
    };
    let config_path = proj_dirs.config_dir().join("config.toml");
    if config_path.exists() {
        info!("Loading user configuration from: {}", config_path.display());
        load_layer_from_path(&config_path).map(Some)
    } else {
        debug!(
            "User configuration file not found at {}",
            config_path.display()
        );
        Ok(None)
    }
}

fn load_project_layer(explicit: Option<&Path>) -> Result<Option<toml::Value>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(anyhow!(GitabotError::Config(format!(
                "Configuration file '{}' does not exist.",
                path.display()
            ))));
        }
        info!("Loading configuration from: {}", path.display());
        return load_layer_from_path(path).map(Some);
    }
    match find_project_config_path()? {
        Some(path) => {
            info!("Loading project configuration from: {}", path.display());
            load_layer_from_path(&path).map(Some)
        }
        None => {
            debug!("No project configuration file (.gitabot.toml) found in current directory or ancestors.");
            Ok(None)
        }
    }
}

fn find_project_config_path() -> Result<Option<PathBuf>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let mut path: &Path = &current_dir;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Ok(Some(project_config));
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return Ok(None);
        }
        match path.parent() {
            Some(parent) => path = parent,
            None => break,
        }
    }
    Ok(None)
}

fn load_layer_from_path(path: &Path) -> Result<toml::Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Deep-merges the layers (later wins) and deserializes the result.
pub fn build_config(layers: Vec<toml::Value>) -> Result<Config> {
    let merged = layers
        .into_iter()
        .fold(toml::Value::Table(toml::Table::new()), merge_values);
    merged
        .try_into()
        .context("Failed to interpret merged configuration")
}

fn merge_values(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            toml::Value::Table(base)
        }
        (_, overlay) => overlay,
    }
}

/// Applies secret overrides. `lookup` abstracts the environment for tests.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    if let Some(v) = non_empty(ENV_VERIFY_TOKEN) {
        config.whatsapp.verify_token = Some(v);
    }
    if let Some(v) = non_empty(ENV_ACCESS_TOKEN) {
        config.whatsapp.access_token = Some(v);
    }
    if let Some(v) = non_empty(ENV_PHONE_NUMBER_ID) {
        config.whatsapp.phone_number_id = Some(v);
    }
    if let Some(v) = non_empty(ENV_EMBEDDING_API_KEY) {
        config.embedding.api_key = Some(v);
    }
}

fn expand_config_paths(config: &mut Config) {
    config.dataset.path = shellexpand::tilde(&config.dataset.path).into_owned();
    config.state.path = shellexpand::tilde(&config.state.path).into_owned();
    debug!(
        "Expanded dataset path: {}, state path: {}",
        config.dataset.path, config.state.path
    );
}

/// Checks the invariants the rest of the service relies on.
pub fn validate_config(config: &Config) -> Result<()> {
    let invalid = |msg: String| Err(anyhow!(GitabotError::Config(msg)));
    if config.dataset.path.trim().is_empty() {
        return invalid("dataset.path cannot be empty.".into());
    }
    if config.state.path.trim().is_empty() {
        return invalid("state.path cannot be empty.".into());
    }
    if config.bot.languages.iter().all(|l| l.trim().is_empty()) {
        return invalid("bot.languages must name at least one language.".into());
    }
    if config.bot.chapter_count == 0 {
        return invalid("bot.chapter_count must be at least 1.".into());
    }
    if config.bot.max_references == 0 {
        return invalid("bot.max_references must be at least 1.".into());
    }
    if config.bot.results_per_query == 0 {
        return invalid("bot.results_per_query must be at least 1.".into());
    }
    if config.bot.random_attempts == 0 {
        return invalid("bot.random_attempts must be at least 1.".into());
    }
    if config.embedding.batch_size == 0 {
        return invalid("embedding.batch_size must be at least 1.".into());
    }
    if let Some(moods) = &config.moods {
        for (label, keywords) in moods {
            if keywords.iter().all(|k| k.trim().is_empty()) {
                return invalid(format!("Mood '{}' has no keywords.", label));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_layers() {
        let config = build_config(Vec::new()).unwrap();
        assert_eq!(config.dataset.path, "dataset_english.json");
        assert_eq!(config.server.port, 5000);
        assert!(config.server.enable_cors);
        assert_eq!(config.bot.languages, vec!["english"]);
        assert_eq!(config.bot.chapter_count, 18);
        assert_eq!(config.bot.max_references, 5);
        assert_eq!(config.bot.results_per_query, 3);
        assert!(!config.embedding.enabled);
        assert!(config.moods.is_none());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_deserialize_basic_toml() {
        let toml_content = r#"
            [dataset]
            path = "/srv/gita/dataset.json"

            [server]
            host = "0.0.0.0"
            port = 8080

            [bot]
            languages = ["english", "hindi"]

            [moods]
            peace = ["peace", "calm"]
        "#;

        let value: toml::Value = toml::from_str(toml_content).expect("Failed to parse TOML");
        let config = build_config(vec![value]).unwrap();

        assert_eq!(config.dataset.path, "/srv/gita/dataset.json");
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.bot.languages, vec!["english", "hindi"]);
        assert_eq!(config.bot.max_references, 5); // Default
        assert_eq!(
            config.moods.unwrap().get("peace").unwrap(),
            &vec!["peace".to_string(), "calm".to_string()]
        );
    }

    #[test]
    fn test_project_layer_overrides_user_layer_per_key() {
        let user: toml::Value = toml::from_str(
            r#"
            [server]
            port = 7000
            enable_cors = false
            [whatsapp]
            api_version = "v18.0"
        "#,
        )
        .unwrap();
        let project: toml::Value = toml::from_str(
            r#"
            [server]
            port = 9000
        "#,
        )
        .unwrap();

        let config = build_config(vec![user, project]).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(!config.server.enable_cors); // Kept from the user layer
        assert_eq!(config.whatsapp.api_version, "v18.0");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let value: toml::Value = toml::from_str("[server]\nprot = 1").unwrap();
        assert!(build_config(vec![value]).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("WHATSAPP_ACCESS_TOKEN", "secret-token"),
            ("WHATSAPP_VERIFY_TOKEN", "verify-me"),
            ("WHATSAPP_PHONE_NUMBER_ID", "   "),
        ]);
        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.whatsapp.access_token.as_deref(), Some("secret-token"));
        assert_eq!(config.whatsapp.verify_token.as_deref(), Some("verify-me"));
        assert!(config.whatsapp.phone_number_id.is_none()); // Blank values ignored
        assert!(config.embedding.api_key.is_none());
    }

    #[test]
    fn test_path_expansion() {
        let mut config = Config::default();
        config.state.path = "~/gitabot/state.json".into();
        config.dataset.path = "/absolute/dataset.json".into();
        expand_config_paths(&mut config);

        assert!(!config.state.path.starts_with('~'));
        assert!(config.state.path.ends_with("gitabot/state.json"));
        assert_eq!(config.dataset.path, "/absolute/dataset.json");
    }

    #[test]
    fn test_validate_config_rejects_zero_limits() {
        let mut config = Config::default();
        config.bot.max_references = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_references"));

        let mut config = Config::default();
        config.bot.languages = vec![" ".into()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_rejects_empty_mood() {
        let mut config = Config::default();
        config.moods = Some(BTreeMap::from([("joy".to_string(), Vec::new())]));
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("Mood 'joy'"));
    }

    #[test]
    fn test_explicit_missing_config_file_is_error() {
        let result = load_project_layer(Some(Path::new("/definitely/not/here.toml")));
        assert!(result.is_err());
    }
}
