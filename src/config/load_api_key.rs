use anyhow::{bail, Result};
use std::env;
use std::fmt;

pub(crate) const LIFI_API_KEY_ENV_VAR: &str = "LIFI_API_KEY";
pub(crate) const MODEL_API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Loads an API key from the environment.
///
/// The service runs unattended, so a missing key is fatal instead of prompting.
pub(crate) fn load_api_key(env_var: &str) -> Result<ApiKey> {
    match env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(ApiKey::new(key.trim())),
        Ok(_) => bail!("🔑 The `{env_var}` environment variable is set but empty."),
        Err(_) => bail!(
            "🔑 The `{env_var}` environment variable is not set. \
             Set it in your environment or in the .env file."
        ),
    }
}
