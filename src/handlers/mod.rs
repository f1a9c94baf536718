// HTTP surface: ranking, score diagnostics, health.

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::RankRequest;
use crate::services::orchestrator::RankingOrchestrator;

pub struct AppState {
    pub orchestrator: Arc<RankingOrchestrator>,
    pub service_name: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(rank_feed)
        .service(explain_candidate)
        .service(health);
}

#[post("/rank")]
pub async fn rank_feed(
    body: web::Json<RankRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let request = body.into_inner();

    if request.page_size == 0 {
        return Err(AppError::BadRequest("page_size must be positive".to_string()));
    }

    debug!(
        user_id = %request.user_id,
        tenant_id = %request.tenant_id,
        page_size = request.page_size,
        offset = request.offset,
        "Ranking request received"
    );

    let response = state.orchestrator.rank(&request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
}

/// Diagnostic: full signal breakdown for one (user, candidate) pair.
#[get("/rank/candidates/{candidate_id}/breakdown")]
pub async fn explain_candidate(
    path: web::Path<Uuid>,
    query: web::Query<ExplainQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let candidate_id = path.into_inner();
    let breakdown = state
        .orchestrator
        .explain_one(query.user_id, query.tenant_id, candidate_id)
        .await?;
    Ok(HttpResponse::Ok().json(breakdown))
}

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": state.service_name,
    }))
}
