use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

pub const RC_ENV_VAR: &str = "IMMACULATERRC";

const DEFAULTS: [(&str, &str); 7] = [
    ("pjax.form_class", "i-pjax-form"),
    ("pjax.autosubmit_class", "i-submits-when-changed"),
    ("pjax.container", "#main"),
    ("pjax.method", "POST"),
    ("pjax.push", "off"),
    ("pjax.cache", "off"),
    ("tooltip.selector", r#"[data-toggle="tooltip"]"#),
];

/// Flat `key = value` settings, seeded with defaults and layered with rc
/// files and overrides.
#[derive(Debug, Clone)]
pub struct Config {
    map: HashMap<String, String>,
    pub loaded_files: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map: DEFAULTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            loaded_files: vec![],
        }
    }
}

impl Config {
    #[tracing::instrument(skip(rcfile_override))]
    pub fn load(rcfile_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Config::default();

        let rcfile = resolve_rcfile_path(rcfile_override)?;
        if let Some(path) = rcfile {
            info!(rcfile = %path.display(), "loading rc file");
            cfg.load_file(&path, &mut Vec::new())?;
        } else {
            debug!("no rc file found; using defaults");
        }

        Ok(cfg)
    }

    /// Defaults layered with rc text that has no file behind it. Includes are
    /// rejected since there is no directory to resolve them against.
    pub fn from_rc_str(text: &str) -> anyhow::Result<Self> {
        let mut cfg = Config::default();
        cfg.apply_rc_text(text, "<inline>", None, &mut Vec::new())?;
        Ok(cfg)
    }

    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (k, v) in overrides {
            let key = k.strip_prefix("rc.").unwrap_or(&k).to_string();
            debug!(key = %key, value = %v, "applying override");
            self.map.insert(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> anyhow::Result<Option<bool>> {
        self.map.get(key).map(|v| parse_bool(key, v)).transpose()
    }

    /// `chain` holds the canonical paths of the files currently being read,
    /// outermost first.
    #[tracing::instrument(skip(self, chain))]
    fn load_file(&mut self, path: &Path, chain: &mut Vec<PathBuf>) -> anyhow::Result<()> {
        let path = expand_tilde(path);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let canonical = fs::canonicalize(&path)
            .with_context(|| format!("failed to resolve {}", path.display()))?;

        self.loaded_files.push(path.clone());

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let origin = path.display().to_string();
        chain.push(canonical);
        let result = self.apply_rc_text(&text, &origin, Some(&base_dir), chain);
        chain.pop();
        result
    }

    fn apply_rc_text(
        &mut self,
        text: &str,
        origin: &str,
        base_dir: Option<&Path>,
        chain: &mut Vec<PathBuf>,
    ) -> anyhow::Result<()> {
        for (line_num, raw_line) in text.lines().enumerate() {
            // Only whole-line comments: selectors such as `#main` contain '#'.
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(include_rest) = line.strip_prefix("include ") {
                let base_dir = base_dir.ok_or_else(|| {
                    anyhow!(
                        "include is not allowed in {origin}:{}: {raw_line}",
                        line_num + 1
                    )
                })?;
                let include_path = resolve_include_path(base_dir, include_rest.trim())?;
                debug!(
                    file = %origin,
                    include = %include_path.display(),
                    line = line_num + 1,
                    "processing include"
                );

                if include_path.exists() {
                    let canonical = fs::canonicalize(&include_path).with_context(|| {
                        format!("failed to resolve {}", include_path.display())
                    })?;
                    if chain.contains(&canonical) {
                        return Err(anyhow!(
                            "include cycle at {origin}:{}: {}",
                            line_num + 1,
                            include_path.display()
                        ));
                    }
                    self.load_file(&include_path, chain)?;
                } else {
                    warn!(include = %include_path.display(), "include file does not exist; skipping");
                }
                continue;
            }

            let (k, v) = line.split_once('=').ok_or_else(|| {
                anyhow!("invalid config line {origin}:{}: {raw_line}", line_num + 1)
            })?;

            let key = k.trim().to_string();
            let value = v.trim().to_string();
            trace!(key = %key, value = %value, "loaded config key");
            self.map.insert(key, value);
        }

        Ok(())
    }
}

/// HTTP method of a pjax request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    /// Case-insensitive, as in a form's `method` attribute.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            _ => None,
        }
    }
}

/// Selectors and request options the page glue binds with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingConfig {
    pub form_class: String,
    pub autosubmit_class: String,
    pub container: String,
    pub method: Method,
    pub push: bool,
    pub cache: bool,
    pub tooltip_selector: String,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            form_class: "i-pjax-form".to_string(),
            autosubmit_class: "i-submits-when-changed".to_string(),
            container: "#main".to_string(),
            method: Method::Post,
            push: false,
            cache: false,
            tooltip_selector: r#"[data-toggle="tooltip"]"#.to_string(),
        }
    }
}

impl BindingConfig {
    #[tracing::instrument(skip(cfg))]
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let text = |key: &str, fallback: String| -> anyhow::Result<String> {
            match cfg.get(key) {
                Some(value) if value.trim().is_empty() => {
                    Err(anyhow!("config key {key} cannot be empty"))
                }
                Some(value) => Ok(value),
                None => Ok(fallback),
            }
        };

        let method = match cfg.get("pjax.method") {
            Some(raw) => Method::parse(&raw)
                .ok_or_else(|| anyhow!("invalid pjax.method: {raw} (expected GET or POST)"))?,
            None => defaults.method,
        };

        let binding = Self {
            form_class: text("pjax.form_class", defaults.form_class)?,
            autosubmit_class: text("pjax.autosubmit_class", defaults.autosubmit_class)?,
            container: text("pjax.container", defaults.container)?,
            method,
            push: cfg.get_bool("pjax.push")?.unwrap_or(defaults.push),
            cache: cfg.get_bool("pjax.cache")?.unwrap_or(defaults.cache),
            tooltip_selector: text("tooltip.selector", defaults.tooltip_selector)?,
        };
        debug!(?binding, "resolved binding config");
        Ok(binding)
    }
}

#[tracing::instrument(skip(override_path))]
fn resolve_rcfile_path(override_path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = override_path {
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(rc_env) = std::env::var(RC_ENV_VAR) {
        if rc_env == "/dev/null" {
            return Ok(None);
        }
        return Ok(Some(PathBuf::from(rc_env)));
    }

    let Some(home) = dirs::home_dir() else {
        warn!("cannot determine home directory; skipping ~/.immaculaterc");
        return Ok(None);
    };
    let candidate = home.join(".immaculaterc");
    if candidate.exists() {
        return Ok(Some(candidate));
    }

    Ok(None)
}

fn resolve_include_path(base_dir: &Path, include: &str) -> anyhow::Result<PathBuf> {
    if include.trim().is_empty() {
        return Err(anyhow!("include path cannot be empty"));
    }

    let raw = PathBuf::from(include);
    let expanded = expand_tilde(&raw);
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(base_dir.join(expanded))
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn parse_bool(key: &str, s: &str) -> anyhow::Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "on" | "true" => Ok(true),
        "0" | "n" | "no" | "off" | "false" => Ok(false),
        other => Err(anyhow!("invalid boolean for {key}: {other}")),
    }
}
