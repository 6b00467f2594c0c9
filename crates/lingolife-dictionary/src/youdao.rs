//! Youdao dictionary lookup.
//!
//! Tries the free `jsonapi` dictionary query first. When it fails or has no
//! entry for the term, falls back to the signed translation API, which needs
//! an app key and secret.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::instrument;

use lingolife_core::traits::{DictionaryEntry, DictionaryLookup, EntrySource, WebExample};

use crate::config::YoudaoConfig;
use crate::error::{error_code_message, DictionaryError};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
/// Web phrases kept from the free query.
const FREE_EXAMPLE_LIMIT: usize = 3;

/// Dictionary backed by the Youdao services.
pub struct YoudaoDictionary {
    config: YoudaoConfig,
    client: reqwest::Client,
}

impl YoudaoDictionary {
    pub fn new(config: YoudaoConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Free dictionary query. `Ok(None)` when it has nothing for the term.
    async fn query_dictionary(&self, q: &str) -> Result<Option<RawResult>, DictionaryError> {
        let response = self
            .client
            .get(format!(
                "{}/jsonapi",
                self.config.dict_base_url.trim_end_matches('/')
            ))
            .query(&[("q", q), ("jsonversion", "2")])
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DictionaryError::Http {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let body: DictJson = response.json().await.map_err(|e| DictionaryError::Http {
            status: status.as_u16(),
            message: format!("failed to parse response: {e}"),
        })?;
        Ok(body.into_raw())
    }

    /// Signed translation API.
    async fn query_translation(&self, q: &str) -> Result<RawResult, DictionaryError> {
        let (app_key, app_secret) = self
            .config
            .credentials()
            .ok_or(DictionaryError::NotConfigured)?;

        let salt = uuid::Uuid::new_v4().to_string();
        let curtime = chrono::Utc::now().timestamp().to_string();
        let sign = sign(app_key, q, &salt, &curtime, app_secret);

        let response = self
            .client
            .get(format!(
                "{}/api",
                self.config.api_base_url.trim_end_matches('/')
            ))
            .query(&[
                ("q", q),
                ("from", "en"),
                ("to", "zh-CHS"),
                ("appKey", app_key),
                ("salt", salt.as_str()),
                ("sign", sign.as_str()),
                ("signType", "v3"),
                ("curtime", curtime.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DictionaryError::Http {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let body: TranslateJson = response.json().await.map_err(|e| DictionaryError::Http {
            status: status.as_u16(),
            message: format!("failed to parse response: {e}"),
        })?;

        if body.error_code != "0" {
            return Err(DictionaryError::Api {
                message: error_code_message(&body.error_code),
                code: body.error_code,
            });
        }
        Ok(body.into_raw())
    }

    fn transport_error(&self, e: reqwest::Error) -> DictionaryError {
        if e.is_timeout() {
            DictionaryError::Timeout(self.config.timeout_secs)
        } else {
            DictionaryError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl DictionaryLookup for YoudaoDictionary {
    fn name(&self) -> &str {
        "youdao"
    }

    #[instrument(skip(self))]
    async fn lookup(&self, term: &str) -> anyhow::Result<DictionaryEntry> {
        let q = term.trim();
        if q.is_empty() {
            return Err(DictionaryError::MissingQuery.into());
        }

        let (raw, source) = match self.query_dictionary(q).await {
            Ok(Some(raw)) => (raw, EntrySource::Dictionary),
            Ok(None) => {
                tracing::debug!("no dictionary entry, falling back to translation API");
                (self.query_translation(q).await?, EntrySource::Translation)
            }
            Err(e) => {
                tracing::warn!(error = %e, "dictionary query failed, falling back to translation API");
                (self.query_translation(q).await?, EntrySource::Translation)
            }
        };

        let entry = normalize(raw, q, source);
        if !entry.is_usable() {
            return Err(DictionaryError::NoResult.into());
        }
        Ok(entry)
    }
}

/// Input to the signature: long queries keep their first and last ten
/// characters around the character count.
pub fn truncate(q: &str) -> String {
    let len = q.chars().count();
    if len <= 20 {
        return q.to_string();
    }
    let head: String = q.chars().take(10).collect();
    let tail: String = q.chars().skip(len - 10).collect();
    format!("{head}{len}{tail}")
}

/// v3 request signature: hex SHA-256 over key, truncated query, salt, time
/// and secret.
pub fn sign(app_key: &str, q: &str, salt: &str, curtime: &str, app_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(app_key.as_bytes());
    hasher.update(truncate(q).as_bytes());
    hasher.update(salt.as_bytes());
    hasher.update(curtime.as_bytes());
    hasher.update(app_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Provider-neutral intermediate shape both query paths produce.
#[derive(Debug, Default)]
struct RawResult {
    translation: Vec<String>,
    phonetic: String,
    uk_phonetic: String,
    us_phonetic: String,
    explains: Vec<String>,
    web: Vec<WebExample>,
}

fn normalize(raw: RawResult, query: &str, source: EntrySource) -> DictionaryEntry {
    let translation = raw.translation.into_iter().next().unwrap_or_default();

    let (mut definition, part_of_speech) = if let Some(first) = raw.explains.first() {
        (
            raw.explains.join("; "),
            pos_prefix(first).unwrap_or_default().to_string(),
        )
    } else if let Some(web) = raw.web.first() {
        (web.value.join("; "), String::new())
    } else {
        (String::new(), String::new())
    };
    if definition.is_empty() {
        definition = translation.clone();
    }

    let phonetic = [&raw.phonetic, &raw.uk_phonetic, &raw.us_phonetic]
        .into_iter()
        .find(|p| !p.is_empty())
        .map(|p| bracket(p))
        .unwrap_or_default();

    DictionaryEntry {
        term: capitalize(query),
        phonetic,
        uk_phonetic: bracket(&raw.uk_phonetic),
        us_phonetic: bracket(&raw.us_phonetic),
        part_of_speech,
        translation,
        definition,
        examples: raw.web,
        source,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn bracket(p: &str) -> String {
    if p.is_empty() {
        String::new()
    } else {
        format!("[{p}]")
    }
}

/// `"n. word"` -> `Some("n")`.
fn pos_prefix(explain: &str) -> Option<&str> {
    let (prefix, rest) = explain.split_once('.')?;
    let valid = !prefix.is_empty()
        && prefix.chars().all(|c| c.is_ascii_alphabetic())
        && !rest.trim_start().is_empty();
    valid.then_some(prefix)
}

// ---------------------------------------------------------------------------
// Free dictionary schema
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
struct DictJson {
    #[serde(default)]
    ec: Option<EcSection>,
    #[serde(default)]
    web_trans: Option<WebTrans>,
}

#[derive(Deserialize, Default)]
struct EcSection {
    #[serde(default)]
    word: Vec<EcWord>,
}

#[derive(Deserialize, Default)]
struct EcWord {
    #[serde(default)]
    ukphone: Option<String>,
    #[serde(default)]
    usphone: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    trs: Vec<EcTranslation>,
}

#[derive(Deserialize, Default)]
struct EcTranslation {
    #[serde(default)]
    pos: Option<String>,
    #[serde(default)]
    tr: Vec<EcTr>,
}

#[derive(Deserialize, Default)]
struct EcTr {
    #[serde(default)]
    l: Option<EcLine>,
}

#[derive(Deserialize, Default)]
struct EcLine {
    #[serde(default)]
    i: Vec<serde_json::Value>,
}

#[derive(Deserialize, Default)]
struct WebTrans {
    #[serde(default, alias = "web-translation")]
    web_translation: Vec<WebTransItem>,
}

#[derive(Deserialize, Default)]
struct WebTransItem {
    #[serde(default)]
    key: Option<String>,
    /// Either a newline-separated string or a list of `{value}` objects.
    #[serde(default)]
    trans: serde_json::Value,
}

impl EcTranslation {
    fn text(&self) -> String {
        self.tr
            .iter()
            .filter_map(|t| t.l.as_ref())
            .map(|l| l.i.iter().filter_map(|v| v.as_str()).collect::<String>())
            .collect()
    }
}

impl WebTransItem {
    fn values(&self) -> Vec<String> {
        match &self.trans {
            serde_json::Value::String(s) => s
                .split('\n')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.get("value").and_then(|v| v.as_str()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

impl DictJson {
    fn into_raw(self) -> Option<RawResult> {
        let word = self.ec?.word.into_iter().next()?;

        let texts: Vec<(Option<String>, String)> = word
            .trs
            .iter()
            .map(|t| (t.pos.clone().filter(|p| !p.is_empty()), t.text()))
            .collect();
        let translation = texts
            .iter()
            .map(|(_, t)| t.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        let explains: Vec<String> = texts
            .into_iter()
            .map(|(pos, text)| match pos {
                Some(pos) => format!("{pos}. {text}"),
                None => text,
            })
            .filter(|e| !e.is_empty())
            .collect();

        if translation.is_empty() && explains.is_empty() {
            return None;
        }

        let web = self
            .web_trans
            .map(|w| w.web_translation)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                let key = item.key.clone().filter(|k| !k.is_empty())?;
                Some(WebExample {
                    key,
                    value: item.values(),
                })
            })
            .take(FREE_EXAMPLE_LIMIT)
            .collect();

        let phonetic = non_empty(&word.ukphone)
            .or(non_empty(&word.usphone))
            .or(non_empty(&word.phone))
            .unwrap_or_default()
            .to_string();

        Some(RawResult {
            translation: if translation.is_empty() {
                Vec::new()
            } else {
                vec![translation]
            },
            phonetic,
            uk_phonetic: word.ukphone.unwrap_or_default(),
            us_phonetic: word.usphone.unwrap_or_default(),
            explains,
            web,
        })
    }
}

// ---------------------------------------------------------------------------
// Signed translation API schema
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateJson {
    error_code: String,
    #[serde(default)]
    translation: Vec<String>,
    #[serde(default)]
    basic: Option<TranslateBasic>,
    #[serde(default)]
    web: Vec<WebExample>,
}

#[derive(Deserialize, Default)]
struct TranslateBasic {
    #[serde(default)]
    phonetic: Option<String>,
    #[serde(default, rename = "uk-phonetic")]
    uk_phonetic: Option<String>,
    #[serde(default, rename = "us-phonetic")]
    us_phonetic: Option<String>,
    #[serde(default)]
    explains: Vec<String>,
}

impl TranslateJson {
    fn into_raw(self) -> RawResult {
        let basic = self.basic.unwrap_or_default();
        RawResult {
            translation: self.translation,
            phonetic: basic.phonetic.unwrap_or_default(),
            uk_phonetic: basic.uk_phonetic.unwrap_or_default(),
            us_phonetic: basic.us_phonetic.unwrap_or_default(),
            explains: basic.explains,
            web: self.web,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dictionary(server: &MockServer, creds: bool) -> YoudaoDictionary {
        YoudaoDictionary::new(YoudaoConfig {
            app_key: creds.then(|| "app-key".to_string()),
            app_secret: creds.then(|| "app-secret".to_string()),
            dict_base_url: server.uri(),
            api_base_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn downcast(err: anyhow::Error) -> DictionaryError {
        err.downcast::<DictionaryError>().unwrap()
    }

    fn hello_dict() -> serde_json::Value {
        serde_json::json!({
            "ec": {
                "word": [{
                    "ukphone": "həˈləʊ",
                    "usphone": "həˈloʊ",
                    "trs": [
                        {"pos": "int", "tr": [{"l": {"i": ["喂；你好"]}}]},
                        {"pos": "n", "tr": [{"l": {"i": ["招呼，问候"]}}]}
                    ]
                }]
            },
            "web_trans": {
                "web_translation": [
                    {"key": "hello", "trans": "你好\n哈罗"},
                    {"key": "Hello Kitty", "trans": "凯蒂猫"},
                    {"key": "Hello World", "trans": "你好世界"},
                    {"key": "hello there", "trans": "你好啊"}
                ]
            }
        })
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("hello"), "hello");
        assert_eq!(truncate("exactly-twenty-chars"), "exactly-twenty-chars");
        assert_eq!(
            truncate("internationalization-and-localization"),
            "internatio37calization"
        );
        assert_eq!(
            truncate("日本語のテキストを翻訳するためのとても長い文章です"),
            "日本語のテキストを翻25のとても長い文章です"
        );
    }

    #[test]
    fn sign_matches_reference_digest() {
        assert_eq!(
            sign("app-key", "hello", "salt-1", "1700000000", "app-secret"),
            "595ee47b72f93d62b7c683d239effe11edc4be8be03198de14c41f10036794e2"
        );
    }

    #[test]
    fn pos_prefix_needs_letters_and_text() {
        assert_eq!(pos_prefix("n. 词"), Some("n"));
        assert_eq!(pos_prefix("adj.好的"), Some("adj"));
        assert_eq!(pos_prefix("词。"), None);
        assert_eq!(pos_prefix("n."), None);
        assert_eq!(pos_prefix("1. first"), None);
    }

    #[tokio::test]
    async fn free_query_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jsonapi"))
            .and(query_param("q", "hello"))
            .and(query_param("jsonversion", "2"))
            .and(header("User-Agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(hello_dict()))
            .expect(1)
            .mount(&server)
            .await;

        let entry = dictionary(&server, false).lookup("hello").await.unwrap();
        assert_eq!(entry.term, "Hello");
        assert_eq!(entry.phonetic, "[həˈləʊ]");
        assert_eq!(entry.uk_phonetic, "[həˈləʊ]");
        assert_eq!(entry.us_phonetic, "[həˈloʊ]");
        assert_eq!(entry.translation, "喂；你好; 招呼，问候");
        assert_eq!(entry.definition, "int. 喂；你好; n. 招呼，问候");
        assert_eq!(entry.part_of_speech, "int");
        assert_eq!(entry.source, EntrySource::Dictionary);
        assert_eq!(entry.examples.len(), 3);
        assert_eq!(entry.examples[0].value, vec!["你好", "哈罗"]);
    }

    #[tokio::test]
    async fn missing_ec_word_falls_back_to_signed_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jsonapi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "web_trans": {"web_translation": []}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("q", "ephemeral"))
            .and(query_param("from", "en"))
            .and(query_param("to", "zh-CHS"))
            .and(query_param("appKey", "app-key"))
            .and(query_param("signType", "v3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errorCode": "0",
                "query": "ephemeral",
                "translation": ["短暂的"],
                "basic": {
                    "phonetic": "ɪˈfemərəl",
                    "uk-phonetic": "ɪˈfemərəl",
                    "us-phonetic": "ɪˈfemərəl",
                    "explains": ["adj. 短暂的；朝生暮死的", "n. 只生存一天的事物"]
                },
                "web": [{"key": "ephemeral", "value": ["短暂的", "瞬息的"]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let entry = dictionary(&server, true).lookup("ephemeral").await.unwrap();
        assert_eq!(entry.term, "Ephemeral");
        assert_eq!(entry.source, EntrySource::Translation);
        assert_eq!(entry.translation, "短暂的");
        assert_eq!(entry.part_of_speech, "adj");
        assert_eq!(
            entry.definition,
            "adj. 短暂的；朝生暮死的; n. 只生存一天的事物"
        );
        assert_eq!(entry.phonetic, "[ɪˈfemərəl]");
        assert_eq!(entry.examples.len(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_falls_back_to_signed_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jsonapi"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errorCode": "0",
                "translation": ["你好"]
            })))
            .mount(&server)
            .await;

        let entry = dictionary(&server, true).lookup("hi").await.unwrap();
        assert_eq!(entry.translation, "你好");
        // Translation doubles as the definition when nothing else is known.
        assert_eq!(entry.definition, "你好");
        assert_eq!(entry.phonetic, "");
    }

    #[tokio::test]
    async fn fallback_without_credentials_is_not_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jsonapi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = dictionary(&server, false).lookup("ephemeral").await.unwrap_err();
        assert!(matches!(downcast(err), DictionaryError::NotConfigured));
    }

    #[tokio::test]
    async fn error_code_maps_to_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jsonapi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"errorCode": "202"})),
            )
            .mount(&server)
            .await;

        let err = downcast(dictionary(&server, true).lookup("x").await.unwrap_err());
        match err {
            DictionaryError::Api { code, message } => {
                assert_eq!(code, "202");
                assert_eq!(message, "Signature verification failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_result_is_no_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jsonapi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"errorCode": "0"})),
            )
            .mount(&server)
            .await;

        let err = downcast(dictionary(&server, true).lookup("zzxq").await.unwrap_err());
        assert!(matches!(err, DictionaryError::NoResult));
    }

    #[tokio::test]
    async fn blank_query_is_rejected_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = downcast(dictionary(&server, true).lookup("   ").await.unwrap_err());
        assert!(matches!(err, DictionaryError::MissingQuery));
    }
}
