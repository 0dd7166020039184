use std::{env, fmt::Display, str::FromStr};

use log::*;
use thiserror::Error;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads and parses the environment variable `name`. Unset variables silently yield `default`; values that do not
/// parse log a warning and also yield `default`.
pub fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Environment variable {0} is referenced but not set")]
pub struct MissingEnvVar(pub String);

/// Replaces every `${NAME}` reference in `value` with the content of the environment variable `NAME`.
pub fn substitute_env_vars(value: &str) -> Result<String, MissingEnvVar> {
    substitute_with(value, |name| env::var(name).ok())
}

/// Same as [`substitute_env_vars`], with the variable lookup supplied by the caller.
///
/// Text without a closing brace after `${` is copied through untouched.
pub fn substitute_with<F>(value: &str, lookup: F) -> Result<String, MissingEnvVar>
where F: Fn(&str) -> Option<String> {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let name = &rest[start + 2..start + 2 + len];
        let replacement = lookup(name).ok_or_else(|| MissingEnvVar(name.to_string()))?;
        result.push_str(&rest[..start]);
        result.push_str(&replacement);
        rest = &rest[start + 3 + len..];
    }
    result.push_str(rest);
    Ok(result)
}
