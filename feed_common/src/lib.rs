pub mod helpers;
mod secret;

pub use helpers::{env_or_default, parse_boolean_flag, substitute_env_vars, MissingEnvVar};
pub use secret::Secret;
