use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_IMAGE_DIR: &str = "images";

/// Process configuration read from the environment.
///
/// Nothing is validated up front. A missing required key is logged and left
/// empty, so the failure shows up where the value is first used.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub telegram_token: String,
    pub api_id: String,
    pub api_hash: String,
    pub db_encryption_key: String,
    pub provider_api_key: String,
    pub provider_url: String,
    pub port: String,
    pub image_dir: PathBuf,
    pub user_agent: Option<String>,
    pub provider_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let required = |key: &str| {
            lookup(key).unwrap_or_else(|| {
                log::warn!("{key} is not set");
                String::new()
            })
        };

        Self {
            telegram_token: required("TELE_TOKEN"),
            api_id: required("API_ID"),
            api_hash: required("API_HASH"),
            db_encryption_key: required("DB_ENCRYPTION_KEY"),
            provider_api_key: required("HUGGINGFACE_API_KEY"),
            provider_url: required("HUGGINGFACE_URL"),
            port: required("PORT"),
            image_dir: lookup("IMAGE_DIR").map_or_else(|| DEFAULT_IMAGE_DIR.into(), PathBuf::from),
            user_agent: lookup("USER_AGENT"),
            provider_timeout: lookup("PROVIDER_TIMEOUT_SECS").and_then(|value| {
                value
                    .parse()
                    .inspect_err(|err| {
                        log::warn!("ignoring PROVIDER_TIMEOUT_SECS={value:?}: {err}");
                    })
                    .ok()
                    .map(Duration::from_secs)
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_lookup(lookup(&[
            ("TELE_TOKEN", "123:abc"),
            ("API_ID", "42"),
            ("API_HASH", "hash"),
            ("DB_ENCRYPTION_KEY", "key"),
            ("HUGGINGFACE_API_KEY", "hf_token"),
            ("HUGGINGFACE_URL", "https://example.com/models/sd"),
            ("PORT", "3000"),
            ("IMAGE_DIR", "/tmp/relay"),
            ("PROVIDER_TIMEOUT_SECS", "90"),
        ]));

        assert_eq!(config.telegram_token, "123:abc");
        assert_eq!(config.provider_api_key, "hf_token");
        assert_eq!(config.provider_url, "https://example.com/models/sd");
        assert_eq!(config.port, "3000");
        assert_eq!(config.image_dir, PathBuf::from("/tmp/relay"));
        assert_eq!(config.provider_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.user_agent, None);
    }

    #[test]
    fn test_missing_keys_are_empty() {
        let config = Config::from_lookup(lookup(&[("PROVIDER_TIMEOUT_SECS", "soon")]));

        assert_eq!(config.telegram_token, "");
        assert_eq!(config.provider_url, "");
        assert_eq!(config.port, "");
        assert_eq!(config.image_dir, PathBuf::from("images"));
        assert_eq!(config.provider_timeout, None);
    }
}
