//! Order intake endpoints. Extraction, storage and delivery are all
//! blocking, so each handler runs its work on the blocking pool.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::notify::DispatchReport;
use crate::pipeline::intake::{format_candidate_summary, IntakeNormalizer, OrderCandidate};
use crate::pipeline::orders::{create_order, ConfirmOrder};

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub candidate: OrderCandidate,
    /// Human-readable summary shown to the dispatcher for confirmation.
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: i64,
    pub notifications: DispatchReport,
}

/// `POST /api/orders/normalize`: free text to a resolved candidate.
pub async fn normalize(
    State(core): State<Arc<CoreState>>,
    Json(request): Json<NormalizeRequest>,
) -> Result<Json<NormalizeResponse>, ApiError> {
    let candidate = tokio::task::spawn_blocking(move || {
        IntakeNormalizer::new(core.extractor.as_ref(), &core.registry).normalize(&request.text)
    })
    .await??;

    let summary = format_candidate_summary(&candidate);
    Ok(Json(NormalizeResponse { candidate, summary }))
}

/// `POST /api/orders`: store a confirmed order and notify.
pub async fn create(
    State(core): State<Arc<CoreState>>,
    Json(confirm): Json<ConfirmOrder>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let created = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let conn = core.open_db()?;
        let created = create_order(
            &conn,
            &core.registry,
            core.transport.as_ref(),
            &confirm,
            core.clock.now(),
        )?;
        Ok(created)
    })
    .await??;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order_id: created.order.id,
            notifications: created.notifications,
        }),
    ))
}
