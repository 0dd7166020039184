//! Store credentials, loaded from `config.yaml`.
//!
//! Every entry is validated on its own. A store with a missing field or an unresolved `${VAR}` reference yields a
//! [`ConfigError`] in its slot, and the remaining stores are still usable.
use std::{collections::HashSet, fs, path::Path};

use feed_common::{helpers::substitute_with, MissingEnvVar, Secret};
use log::*;
use serde::Deserialize;
use serde_yaml::Value;

use crate::{errors::ConfigError, feed_types::Store};

pub type StoreEntry = Result<Store, ConfigError>;

#[derive(Debug, Default, Deserialize)]
struct StoresDocument {
    #[serde(default)]
    stores: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStore {
    name: Option<String>,
    shop_domain: Option<String>,
    access_token: Option<String>,
    access_token_env: Option<String>,
    language: Option<String>,
    currency: Option<String>,
    api_version: Option<String>,
}

/// Reads the credentials file at `path`. See [`parse_stores`].
pub fn load_stores(path: &Path, default_api_version: &str) -> Result<Vec<StoreEntry>, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io { path: path.display().to_string(), message: e.to_string() })?;
    let stores = parse_stores(&text, path.display().to_string().as_str(), default_api_version)?;
    info!("🪛️ Loaded {} store entries from {}", stores.len(), path.display());
    Ok(stores)
}

/// Parses a credentials document, resolving `${VAR}` references from the process environment. Stores without an
/// `api_version` get `default_api_version`.
///
/// Only a document that is not YAML at all fails as a whole; everything else is reported per store.
pub fn parse_stores(text: &str, source: &str, default_api_version: &str) -> Result<Vec<StoreEntry>, ConfigError> {
    parse_stores_with(text, source, default_api_version, |name| std::env::var(name).ok())
}

/// Same as [`parse_stores`], with the environment lookup supplied by the caller.
pub fn parse_stores_with<F>(
    text: &str,
    source: &str,
    default_api_version: &str,
    lookup: F,
) -> Result<Vec<StoreEntry>, ConfigError>
where F: Fn(&str) -> Option<String> {
    let doc = if text.trim().is_empty() {
        StoresDocument::default()
    } else {
        serde_yaml::from_str::<StoresDocument>(text)
            .map_err(|e| ConfigError::Parse { path: source.to_string(), message: e.to_string() })?
    };
    if doc.stores.is_empty() {
        warn!("🪛️ {source} does not define any stores");
    }
    let mut seen = HashSet::new();
    let entries = doc
        .stores
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let label = store_label(&value, index);
            let store = serde_yaml::from_value::<RawStore>(value)
                .map_err(|e| ConfigError::Store { store: label.clone(), message: e.to_string() })
                .and_then(|raw| build_store(raw, &label, default_api_version, &lookup))?;
            if !seen.insert(store.name.clone()) {
                return Err(ConfigError::Store { store: label, message: "The store name is used more than once".into() });
            }
            Ok(store)
        })
        .collect::<Vec<StoreEntry>>();
    for err in entries.iter().filter_map(|e| e.as_ref().err()) {
        warn!("🪛️ {err}");
    }
    Ok(entries)
}

fn store_label(value: &Value, index: usize) -> String {
    value
        .get("name")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("#{}", index + 1))
}

fn build_store<F>(raw: RawStore, label: &str, default_api_version: &str, lookup: &F) -> Result<Store, ConfigError>
where F: Fn(&str) -> Option<String> {
    let err = |message: String| ConfigError::Store { store: label.to_string(), message };
    let required = |value: Option<String>, field: &str| {
        value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).ok_or_else(|| err(format!("{field} is missing")))
    };
    let substitute = |value: &str| {
        substitute_with(value, lookup)
            .map_err(|MissingEnvVar(name)| err(format!("Environment variable {name} is referenced but not set")))
    };
    let name = required(raw.name, "name")?;
    if !is_safe_path_component(&name) {
        return Err(err(format!("{name} cannot be used as a directory name")));
    }
    let shop_domain = normalize_shop_domain(&substitute(&required(raw.shop_domain, "shop_domain")?)?);
    if shop_domain.is_empty() {
        return Err(err("shop_domain is missing".into()));
    }
    let token = match (raw.access_token, raw.access_token_env) {
        (Some(token), _) if !token.trim().is_empty() => substitute(token.trim())?,
        (_, Some(var)) if !var.trim().is_empty() => lookup(var.trim())
            .ok_or_else(|| err(format!("Environment variable {} is referenced but not set", var.trim())))?,
        _ => return Err(err("access_token (or access_token_env) is missing".into())),
    };
    let access_token = Secret::new(token.trim().to_string());
    if access_token.is_empty() {
        return Err(err("The access token is empty".into()));
    }
    let language = substitute(&required(raw.language, "language")?)?;
    let currency = substitute(&required(raw.currency, "currency")?)?;
    let api_version = raw
        .api_version
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default_api_version.to_string());
    Ok(Store { name, shop_domain, access_token, language, currency, api_version })
}

/// Accepts `https://my-shop.myshopify.com/` and friends, keeping only the host.
pub fn normalize_shop_domain(domain: &str) -> String {
    let domain = domain.trim();
    let domain = domain.strip_prefix("https://").or_else(|| domain.strip_prefix("http://")).unwrap_or(domain);
    domain.trim_end_matches('/').to_string()
}

/// Store names become directory and file name parts.
fn is_safe_path_component(name: &str) -> bool {
    name != "." &&
        name != ".." &&
        !name.chars().any(|c| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control())
}

/// Picks the stores named in `names` (all of them when `names` is empty). Unknown names are reported as errors in
/// their own slot.
pub fn select_stores(entries: Vec<StoreEntry>, names: &[String]) -> Vec<StoreEntry> {
    if names.is_empty() {
        return entries;
    }
    let mut selected = entries
        .into_iter()
        .filter(|entry| match entry {
            Ok(store) => names.contains(&store.name),
            Err(ConfigError::Store { store, .. }) => names.contains(store),
            Err(_) => false,
        })
        .collect::<Vec<StoreEntry>>();
    for name in names {
        let known = selected.iter().any(|e| match e {
            Ok(store) => &store.name == name,
            Err(ConfigError::Store { store, .. }) => store == name,
            Err(_) => false,
        });
        if !known {
            selected.push(Err(ConfigError::Store { store: name.clone(), message: "No such store in the configuration".into() }));
        }
    }
    selected
}
