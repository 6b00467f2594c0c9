//! Dictionary configuration and factory.

use serde::{Deserialize, Serialize};

use lingolife_core::traits::DictionaryLookup;

use crate::youdao::YoudaoDictionary;

/// Settings for the Youdao dictionary.
///
/// Note: Custom Debug impl masks the app secret to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct YoudaoConfig {
    /// App key for the signed translation API.
    #[serde(default)]
    pub app_key: Option<String>,
    /// App secret for the signed translation API.
    #[serde(default)]
    pub app_secret: Option<String>,
    /// Host of the free dictionary query.
    #[serde(default = "default_dict_base_url")]
    pub dict_base_url: String,
    /// Host of the signed translation API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for YoudaoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoudaoConfig")
            .field("app_key", &self.app_key)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "***"))
            .field("dict_base_url", &self.dict_base_url)
            .field("api_base_url", &self.api_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_dict_base_url() -> String {
    "https://dict.youdao.com".to_string()
}
fn default_api_base_url() -> String {
    "https://openapi.youdao.com".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}

impl Default for YoudaoConfig {
    fn default() -> Self {
        Self {
            app_key: None,
            app_secret: None,
            dict_base_url: default_dict_base_url(),
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl YoudaoConfig {
    /// Key and secret, when both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let key = self.app_key.as_deref().filter(|s| !s.is_empty())?;
        let secret = self.app_secret.as_deref().filter(|s| !s.is_empty())?;
        Some((key, secret))
    }
}

/// Create the dictionary served under `/api/dictionary/youdao`.
pub fn create_dictionary(config: &YoudaoConfig) -> anyhow::Result<Box<dyn DictionaryLookup>> {
    Ok(Box::new(YoudaoDictionary::new(config.clone())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_hosts() {
        let config: YoudaoConfig = toml::from_str("").unwrap();
        assert_eq!(config.dict_base_url, "https://dict.youdao.com");
        assert_eq!(config.api_base_url, "https://openapi.youdao.com");
        assert_eq!(config.timeout_secs, 15);
        assert!(config.credentials().is_none());
    }

    #[test]
    fn credentials_need_both_parts() {
        let config: YoudaoConfig = toml::from_str(
            r#"
app_key = "key"
app_secret = ""
"#,
        )
        .unwrap();
        assert!(config.credentials().is_none());

        let config = YoudaoConfig {
            app_secret: Some("secret".into()),
            ..config
        };
        assert_eq!(config.credentials(), Some(("key", "secret")));
    }

    #[test]
    fn debug_masks_secret() {
        let config = YoudaoConfig {
            app_key: Some("visible-key".into()),
            app_secret: Some("hidden-secret".into()),
            ..Default::default()
        };
        let out = format!("{config:?}");
        assert!(out.contains("visible-key"));
        assert!(!out.contains("hidden-secret"));
    }

    #[test]
    fn factory_builds_youdao() {
        let dict = create_dictionary(&YoudaoConfig::default()).unwrap();
        assert_eq!(dict.name(), "youdao");
    }
}
