//! `/api/dictionary/{provider}` handler.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use lingolife_core::traits::DictionaryEntry;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub q: Option<String>,
}

pub async fn lookup(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<DictionaryEntry>, ApiError> {
    if provider != state.dictionary.name() {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("Unknown dictionary provider: {provider}"),
        ));
    }
    let q = query.q.unwrap_or_default();
    let entry = state
        .dictionary
        .lookup(&q)
        .await
        .map_err(ApiError::from_dictionary)?;
    Ok(Json(entry))
}
