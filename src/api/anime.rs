use axum::{
    Json,
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::{ApiError, AppState, ListStats};
use crate::api::validation::parse_anime_id;
use crate::query::{FilterSpec, QueryParams};

/// Lists catalog records matching the query filters.
///
/// # Endpoint
/// `GET /api/animes`
///
/// Supported parameters: `limit`, `offset`, `type_in` / `type_not_in`,
/// `status` / `status_not`, `min_score`, `max_score`, `genre_in`,
/// `genre_not_in` and `all_genres`. Repeated parameters are accumulated.
///
/// Records are serialized while still borrowed from the catalog, so nothing
/// is cloned per request. The window and result count ride along as a
/// [`ListStats`] response extension for the request logger.
pub async fn list_animes(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let params = QueryParams::parse(query.as_deref().unwrap_or_default());

    let filter = FilterSpec::parse(&params).inspect_err(|err| {
        debug!(field = err.field, reason = %err.reason, "Rejected list filters");
    })?;

    let results = filter.evaluate(&state.catalog);
    let stats = ListStats {
        offset: filter.window.offset,
        limit: filter.window.limit,
        returned: results.len(),
    };

    let mut response = Json(results).into_response();
    response.extensions_mut().insert(stats);
    Ok(response)
}

/// Returns a single record by id.
///
/// # Endpoint
/// `GET /api/animes/{id}`
pub async fn get_anime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_anime_id(&id)?;

    let anime = u32::try_from(id)
        .ok()
        .and_then(|id| state.catalog.get(id))
        .ok_or_else(|| ApiError::anime_not_found(id))?;

    Ok(Json(anime).into_response())
}
