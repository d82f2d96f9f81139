use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{playlist::MigrationRequest, report::MigrationReport};
use tracing::{info, warn};
use tracklift::{
    error::{CatalogError, MigrationError},
    Migration, MigrationFailure,
};

use crate::{error::ApiError, state::AppState};

/// Query string of the OAuth redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set instead of `code` when the user denied access.
    pub error: Option<String>,
}

/// Completes authorization and runs one migration to the end before replying.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<MigrationReport>, ApiError> {
    let raw_state = params
        .state
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing state parameter".to_string()))?;
    let request = MigrationRequest::from_state(raw_state)
        .map_err(|e| ApiError::BadRequest(format!("undecodable state: {e}")))?;
    let abort = |error: MigrationError| {
        ApiError::from(MigrationFailure::before_start(
            request.source.as_str(),
            request.id.as_str(),
            error,
        ))
    };

    if let Some(denied) = params.error {
        warn!("Authorization denied for playlist {}: {}", request.id, denied);
        return Err(abort(MigrationError::AuthFailure(CatalogError::Api {
            status: 401,
            message: denied,
        })));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing code parameter".to_string()))?;

    info!(
        "Starting migration of {} playlist {} into '{}'",
        request.source, request.id, request.playlist.name
    );
    let token = state
        .authorizer
        .exchange_code(&code)
        .await
        .map_err(|e| abort(MigrationError::AuthFailure(e)))?;

    let source = state.catalogs.source(request.source, &token).map_err(abort)?;
    let destination = state.catalogs.destination(&token).map_err(abort)?;

    let report = Migration::new(
        source.as_ref(),
        destination.as_ref(),
        state.config.migration.clone(),
    )
    .run(&request.id, &request.playlist)
    .await?;

    Ok(Json(report))
}
