//! Resource bundles: per-locale labels and display types.
//!
//! Bundles for the built-in locales are compiled in; a directory of
//! `<locale>.yaml` files can add locales or override keys at startup.

use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::render::DisplayType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

pub const DEFAULT_LOCALE: &str = "en_us";

const BUILTIN_BUNDLES: &[(&str, &str)] = &[("en_us", include_str!("../resources/lang/en_us.yaml"))];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceBundle {
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub display_types: HashMap<String, String>,
}

impl ResourceBundle {
    pub fn from_yaml(txt: &str) -> Result<Self> {
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(txt)?)
    }

    /// Label for `key`, or the key itself when the bundle has none
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.labels.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn display_type(&self, key: &str) -> Option<DisplayType> {
        self.display_types.get(key).and_then(|tag| DisplayType::from_tag(tag))
    }

    /// Keys of `other` win
    pub fn merge(&mut self, other: ResourceBundle) {
        self.labels.extend(other.labels);
        self.display_types.extend(other.display_types);
    }
}

/// All known bundles, keyed by normalized locale tag
#[derive(Debug, Clone)]
pub struct BundleSet {
    bundles: HashMap<String, ResourceBundle>,
    default_locale: String,
}

impl BundleSet {
    pub fn empty(default_locale: &str) -> Self {
        Self { bundles: HashMap::new(), default_locale: normalize_locale(default_locale) }
    }

    pub fn builtin() -> Result<Self> {
        let mut set = Self::empty(DEFAULT_LOCALE);
        for (locale, txt) in BUILTIN_BUNDLES {
            set.insert(locale, ResourceBundle::from_yaml(txt)?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, locale: &str, bundle: ResourceBundle) {
        self.bundles.entry(normalize_locale(locale)).or_default().merge(bundle);
    }

    /// Loads every `<locale>.yaml` of `dir`, merging over what is already known.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut loaded = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_yaml = matches!(path.extension().and_then(|s| s.to_str()), Some("yaml" | "yml"));
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            if !is_yaml {
                continue;
            }
            let txt = std::fs::read_to_string(&path)?;
            self.insert(stem, ResourceBundle::from_yaml(&txt)?);
            debug!("loaded resource bundle {:?}", path);
            loaded += 1;
        }
        info!("loaded {} resource bundles from {}", loaded, dir.display());
        Ok(loaded)
    }

    pub fn locales(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.bundles.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Fallback chain: exact tag, then same language, then the default locale.
    pub fn resolve(&self, requested: &str) -> Result<(&str, &ResourceBundle)> {
        let tag = normalize_locale(requested);
        if let Some((k, b)) = self.bundles.get_key_value(&tag) {
            return Ok((k.as_str(), b));
        }

        let language = tag.split('_').next().unwrap_or_default();
        if !language.is_empty() {
            let mut candidates: Vec<&String> = self
                .bundles
                .keys()
                .filter(|k| k.as_str() == language || k.starts_with(&format!("{language}_")))
                .collect();
            candidates.sort();
            if let Some(k) = candidates.first() {
                return Ok((k.as_str(), &self.bundles[*k]));
            }
        }

        self.bundles
            .get_key_value(&self.default_locale)
            .map(|(k, b)| (k.as_str(), b))
            .ok_or_else(|| ConsoleError::UnknownLocale(requested.to_string()))
    }
}

/// `en-US.UTF-8` -> `en_us`
pub fn normalize_locale(tag: &str) -> String {
    let base = tag.split(['.', '@']).next().unwrap_or_default();
    base.trim().replace('-', "_").to_lowercase()
}

/// Configured locale, else the process locale, else the default one.
pub fn detect_locale(configured: Option<&str>) -> String {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var("LC_ALL").ok().filter(|v| !v.is_empty()))
        .or_else(|| std::env::var("LANG").ok().filter(|v| !v.is_empty()))
        .map(|tag| normalize_locale(&tag))
        .filter(|tag| !tag.is_empty() && tag != "c" && tag != "posix")
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

/// Bundle for the configured (or detected) locale, with the configured bundle directory applied.
pub fn load_bundle(cfg: &ConsoleConfig) -> Result<(String, ResourceBundle)> {
    let mut set = BundleSet::builtin()?;
    if let Some(dir) = &cfg.lang_dir {
        set.load_dir(dir)?;
    }
    let requested = detect_locale(cfg.locale.as_deref());
    let (locale, bundle) = set.resolve(&requested)?;
    debug!("locale {} resolved to bundle {}", requested, locale);
    Ok((locale.to_string(), bundle.clone()))
}
