use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::model::RequestItem;

/// Startup configuration: HTTP templates and the placeholder environment.
/// Loaded once and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhantomConfig {
    pub source: Option<String>,
    pub templates: Vec<RequestItem>,
    pub environment: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PhantomConfigFile {
    #[serde(default)]
    http: HttpSection,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct HttpSection {
    #[serde(default)]
    templates: Vec<TemplateSpec>,
    #[serde(default, alias = "env")]
    environment: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct TemplateSpec {
    #[serde(default)]
    name: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    headers: String,
    #[serde(default)]
    body: String,
}

fn default_method() -> String {
    "GET".to_string()
}

pub fn parse_config(raw: &str) -> Result<PhantomConfig> {
    let parsed: PhantomConfigFile =
        serde_yaml::from_str(raw).context("failed to parse phantom config")?;

    let templates = parsed
        .http
        .templates
        .into_iter()
        .map(|template| RequestItem {
            name: template.name,
            method: template.method,
            url: template.url,
            headers: template.headers,
            body: template.body,
        })
        .collect::<Vec<_>>();

    let environment = parsed
        .http
        .environment
        .into_iter()
        .filter_map(|(key, value)| scalar_to_string(value).map(|value| (key, value)))
        .collect::<HashMap<_, _>>();

    Ok(PhantomConfig {
        source: None,
        templates,
        environment,
    })
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub fn load_config(path: &Path) -> Result<PhantomConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let mut config =
        parse_config(&raw).with_context(|| format!("invalid config {}", path.display()))?;
    config.source = Some(path.display().to_string());
    Ok(config)
}

/// Missing or malformed config degrades to empty defaults.
pub fn load_or_default(explicit: Option<&Path>) -> PhantomConfig {
    let Some(path) = discover_config_path(explicit) else {
        info!("no phantom config found, using defaults");
        return PhantomConfig::default();
    };

    match load_config(&path) {
        Ok(config) => {
            info!(
                "loaded {} templates and {} environment keys from {}",
                config.templates.len(),
                config.environment.len(),
                path.display()
            );
            config
        }
        Err(error) => {
            warn!("{error:#}; using defaults");
            PhantomConfig::default()
        }
    }
}

pub fn discover_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("PHANTOM_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("phantom.yaml"),
        PathBuf::from("phantom.yml"),
        PathBuf::from(".phantom.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/phantom/config.yaml"),
            PathBuf::from(&home).join(".config/phantom/config.yml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}
