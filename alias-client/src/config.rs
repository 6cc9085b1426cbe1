use std::env;
use std::time::Duration;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub relay_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Zero disables the request timeout.
    pub wordgen_timeout_seconds: u64,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let wordgen_timeout_seconds = match lookup("WORDGEN_TIMEOUT_SECONDS") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "WORDGEN_TIMEOUT_SECONDS",
                value,
            })?,
            None => 20,
        };

        Ok(Self {
            relay_url: lookup("RELAY_URL").unwrap_or_else(|| "ws://127.0.0.1:8080/ws".to_string()),
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|key| !key.is_empty()),
            gemini_model: lookup("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-3-flash-preview".to_string()),
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            wordgen_timeout_seconds,
        })
    }

    pub fn wordgen_timeout(&self) -> Option<Duration> {
        (self.wordgen_timeout_seconds > 0).then(|| Duration::from_secs(self.wordgen_timeout_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.relay_url, "ws://127.0.0.1:8080/ws");
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.gemini_model, "gemini-3-flash-preview");
        assert_eq!(config.wordgen_timeout(), Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("RELAY_URL", "ws://relay.test/ws"),
            ("GEMINI_API_KEY", "secret"),
            ("WORDGEN_TIMEOUT_SECONDS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.relay_url, "ws://relay.test/ws");
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.wordgen_timeout(), None);
    }

    #[test]
    fn test_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[("WORDGEN_TIMEOUT_SECONDS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "WORDGEN_TIMEOUT_SECONDS",
                value: "soon".to_string()
            }
        );
    }
}
