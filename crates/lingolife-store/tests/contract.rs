//! Behaviour every word backend must share.
//!
//! The same checks run against the in-memory store and against the PostgREST
//! store talking to a small stateful fake of the REST interface.

use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use lingolife_core::error::StoreError;
use lingolife_core::model::{UserId, WordDraft, REVIEW_CANDIDATE_CAP};
use lingolife_core::traits::WordRepository;
use lingolife_store::{InMemoryWordStore, PostgrestClient, PostgrestWordStore};

#[derive(Default)]
struct FakeTable {
    rows: Vec<Value>,
    next: i64,
}

/// Just enough of PostgREST for the `words` table and the outcome function.
#[derive(Clone, Default)]
struct FakePostgrest {
    table: Arc<Mutex<FakeTable>>,
}

impl Respond for FakePostgrest {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut table = self.table.lock().unwrap();
        let query: Vec<(String, String)> = request.url.query_pairs().into_owned().collect();
        let param = |name: &str| {
            query
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };

        match (request.method.as_str(), request.url.path()) {
            ("GET", "/rest/v1/words") => {
                let user = param("user_id").and_then(|f| f.strip_prefix("eq.").map(String::from));
                let mut rows: Vec<Value> = table
                    .rows
                    .iter()
                    .filter(|r| user.as_deref().map_or(true, |u| r["user_id"] == u))
                    .cloned()
                    .collect();
                rows.sort_by(|a, b| {
                    b["created_at"]
                        .as_str()
                        .unwrap_or_default()
                        .cmp(a["created_at"].as_str().unwrap_or_default())
                });
                if let Some(limit) = param("limit").and_then(|l| l.parse().ok()) {
                    rows.truncate(limit);
                }
                ResponseTemplate::new(200).set_body_json(rows)
            }
            ("POST", "/rest/v1/words") => {
                let mut row: Value = serde_json::from_slice(&request.body).unwrap();
                table.next += 1;
                let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                    + Duration::seconds(table.next);
                row["id"] = json!(format!("w{}", table.next));
                row["created_at"] = json!(created.to_rfc3339());
                row["last_reviewed_at"] = Value::Null;
                table.rows.push(row.clone());
                ResponseTemplate::new(201).set_body_json(vec![row])
            }
            ("POST", "/rest/v1/rpc/record_word_outcome") => {
                let call: Value = serde_json::from_slice(&request.body).unwrap();
                let column = if call["p_known"] == true {
                    "known_count"
                } else {
                    "unknown_count"
                };
                let updated: Vec<Value> = table
                    .rows
                    .iter_mut()
                    .filter(|r| r["id"] == call["p_word_id"] && r["user_id"] == call["p_user_id"])
                    .map(|r| {
                        r[column] = json!(r[column].as_u64().unwrap_or(0) + 1);
                        r["last_reviewed_at"] = json!(Utc::now().to_rfc3339());
                        r.clone()
                    })
                    .collect();
                ResponseTemplate::new(200).set_body_json(updated)
            }
            _ => ResponseTemplate::new(404).set_body_json(json!({"message": "no route"})),
        }
    }
}

async fn postgrest_store() -> (MockServer, PostgrestWordStore) {
    let server = MockServer::start().await;
    Mock::given(path_regex("^/rest/v1/"))
        .respond_with(FakePostgrest::default())
        .mount(&server)
        .await;
    let client = PostgrestClient::new(&server.uri(), "service-key").unwrap();
    (server, PostgrestWordStore::new(client))
}

async fn lists_newest_first_and_scopes_by_owner(repo: &dyn WordRepository) {
    let alice = UserId::from("alice");
    let bob = UserId::from("bob");

    repo.create_word(&alice, WordDraft::new("first", "一")).await.unwrap();
    let second = repo
        .create_word(&alice, WordDraft::new("second", "二").with_phonetic("/ˈsekənd/"))
        .await
        .unwrap();
    assert_eq!(second.user_id, "alice");
    assert_eq!((second.known_count, second.unknown_count), (0, 0));
    assert!(second.last_reviewed_at.is_none());

    let words = repo.list_words(&alice).await.unwrap();
    let terms: Vec<&str> = words.iter().map(|w| w.term.as_str()).collect();
    assert_eq!(terms, vec!["second", "first"]);
    assert_eq!(words[0].phonetic.as_deref(), Some("/ˈsekənd/"));

    assert!(repo.list_words(&bob).await.unwrap().is_empty());
}

async fn rejects_blank_drafts(repo: &dyn WordRepository) {
    let err = repo
        .create_word(&UserId::default_user(), WordDraft::new("  ", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(repo
        .list_words(&UserId::default_user())
        .await
        .unwrap()
        .is_empty());
}

async fn records_outcomes_for_owner_only(repo: &dyn WordRepository) {
    let owner = UserId::from("owner");
    let word = repo
        .create_word(&owner, WordDraft::new("term", "词"))
        .await
        .unwrap();

    let after_known = repo.record_outcome(&owner, &word.id, true).await.unwrap();
    assert_eq!((after_known.known_count, after_known.unknown_count), (1, 0));
    assert!(after_known.last_reviewed_at.is_some());

    let after_unknown = repo.record_outcome(&owner, &word.id, false).await.unwrap();
    assert_eq!((after_unknown.known_count, after_unknown.unknown_count), (1, 1));

    let stranger = repo
        .record_outcome(&UserId::from("stranger"), &word.id, true)
        .await
        .unwrap_err();
    assert!(matches!(stranger, StoreError::NotFound(_)));

    let missing = repo.record_outcome(&owner, "nope", true).await.unwrap_err();
    assert!(matches!(missing, StoreError::NotFound(_)));

    let listed = repo.list_words(&owner).await.unwrap();
    assert_eq!(listed[0].review_count(), 2);
}

async fn caps_review_candidates(repo: &dyn WordRepository) {
    let user = UserId::from("busy");
    for i in 0..REVIEW_CANDIDATE_CAP + 3 {
        repo.create_word(&user, WordDraft::new(format!("t{i}"), "x"))
            .await
            .unwrap();
    }
    let candidates = repo.fetch_review_candidates(&user).await.unwrap();
    assert_eq!(candidates.len(), REVIEW_CANDIDATE_CAP);
}

#[tokio::test]
async fn memory_lists_newest_first_and_scopes_by_owner() {
    lists_newest_first_and_scopes_by_owner(&InMemoryWordStore::new()).await;
}

#[tokio::test]
async fn postgrest_lists_newest_first_and_scopes_by_owner() {
    let (_server, repo) = postgrest_store().await;
    lists_newest_first_and_scopes_by_owner(&repo).await;
}

#[tokio::test]
async fn memory_rejects_blank_drafts() {
    rejects_blank_drafts(&InMemoryWordStore::new()).await;
}

#[tokio::test]
async fn postgrest_rejects_blank_drafts() {
    let (_server, repo) = postgrest_store().await;
    rejects_blank_drafts(&repo).await;
}

#[tokio::test]
async fn memory_records_outcomes_for_owner_only() {
    records_outcomes_for_owner_only(&InMemoryWordStore::new()).await;
}

#[tokio::test]
async fn postgrest_records_outcomes_for_owner_only() {
    let (_server, repo) = postgrest_store().await;
    records_outcomes_for_owner_only(&repo).await;
}

#[tokio::test]
async fn memory_caps_review_candidates() {
    caps_review_candidates(&InMemoryWordStore::new()).await;
}

#[tokio::test]
async fn postgrest_caps_review_candidates() {
    let (_server, repo) = postgrest_store().await;
    caps_review_candidates(&repo).await;
}
