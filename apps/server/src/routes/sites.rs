use actix_web::{HttpResponse, delete, get, post, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use sitewatch_service::database::NewTarget;
use sitewatch_service::validation::validate_new_target;

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route create_site,
    route list_sites,
    route get_site,
    route delete_site,
    route site_history,
}

const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<usize>,
}

/// Register a new site; duplicate URLs are rejected
#[post("/sites")]
pub async fn create_site(
    state: web::Data<AppState>,
    body: web::Json<NewTarget>,
) -> Result<HttpResponse, ApiError> {
    let target = validate_new_target(&body, state.tick_seconds)?;
    let created = state
        .registry
        .create_target(&target)
        .await
        .map_err(ApiError::for_record("Site"))?;

    info!(target_id = created.id, url = %created.url, "Site registered");
    Ok(HttpResponse::Ok().json(created))
}

#[get("/sites")]
pub async fn list_sites(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.registry.list_targets().await?))
}

#[get("/sites/{id}")]
pub async fn get_site(state: web::Data<AppState>, id: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    let target = state.registry.get_target(*id).await?.ok_or(ApiError::NotFound("Site"))?;
    Ok(HttpResponse::Ok().json(target))
}

/// Remove a site and everything recorded for it
#[delete("/sites/{id}")]
pub async fn delete_site(state: web::Data<AppState>, id: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    state
        .registry
        .delete_target(*id)
        .await
        .map_err(ApiError::for_record("Site"))?;

    info!(target_id = *id, "Site deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Site deleted successfully" })))
}

/// Observations for a site, newest first
#[get("/sites/{id}/history")]
pub async fn site_history(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, ApiError> {
    if state.registry.get_target(*id).await?.is_none() {
        return Err(ApiError::NotFound("Site"));
    }

    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let history = state.registry.list_observations(*id, limit).await?;
    Ok(HttpResponse::Ok().json(history))
}
