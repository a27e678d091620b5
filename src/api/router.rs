//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/` and traced with `TraceLayer`.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::core_state::CoreState;

/// Build the intake API router.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/orders", post(endpoints::orders::create))
        .route("/orders/normalize", post(endpoints::orders::normalize))
        .with_state(core);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::db::{repository, Database};
    use crate::models::UserRole;
    use crate::notify::RecordingTransport;
    use crate::pipeline::intake::{MockExtractionClient, RESEND_PROMPT};
    use crate::pipeline::orders::STORAGE_FAILURE_PROMPT;
    use crate::registry::tests::sample_registry;
    use crate::reminders::FixedClock;

    const TECH_CHAT: i64 = 1001;
    const DISPATCHER_CHAT: i64 = 3001;

    const SCENARIO_RESPONSE: &str = r#"{"technician_name": "Мороков", "doctor_name": null,
        "patient_name": "Иванов", "work_type": "циркон на винте", "quantity": 7,
        "deadline": null, "notes": null}"#;

    struct Harness {
        core: Arc<CoreState>,
        transport: Arc<RecordingTransport>,
        _dir: tempfile::TempDir,
    }

    fn harness(extraction_response: &str) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::initialize(&dir.path().join("orders.db")).unwrap();
        repository::insert_user(&db.open().unwrap(), TECH_CHAT, "Мороков", UserRole::Technician, Some(1))
            .unwrap();

        let transport = Arc::new(RecordingTransport::new());
        let clock = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2026, 10, 16)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        ));
        let core = Arc::new(CoreState::new(
            db,
            Arc::new(sample_registry()),
            Arc::new(MockExtractionClient::new(extraction_response)),
            transport.clone(),
            clock,
        ));
        Harness {
            core,
            transport,
            _dir: dir,
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn confirmed_candidate(deadline: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "candidate": {
                "technician_name": "Мороков",
                "technician_id": 1,
                "doctor_name": null,
                "doctor_id": null,
                "patient_name": "Иванов",
                "work_type": "Циркон на винте",
                "work_type_id": 1,
                "quantity": 7,
                "deadline": deadline,
                "notes": null
            },
            "raw_text": "Мороков циркон на винте 7шт пациент Иванов",
            "dispatcher_chat_id": DISPATCHER_CHAT
        })
    }

    #[tokio::test]
    async fn health_reports_version() {
        let h = harness(SCENARIO_RESPONSE);
        let response = api_router(h.core)
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::config::APP_VERSION);
    }

    #[tokio::test]
    async fn normalize_returns_resolved_candidate_and_summary() {
        let h = harness(SCENARIO_RESPONSE);
        let response = api_router(h.core)
            .oneshot(post_json(
                "/api/orders/normalize",
                serde_json::json!({"text": "Мороков циркон на винте 7шт пациент Иванов"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["candidate"]["technician_id"], 1);
        assert_eq!(json["candidate"]["work_type"], "Циркон на винте");
        assert_eq!(json["candidate"]["quantity"], 7);
        assert!(json["candidate"]["deadline"].is_null());
        assert!(json["summary"].as_str().unwrap().contains("Количество: 7шт"));
    }

    #[tokio::test]
    async fn normalize_failure_prompts_resend() {
        let h = harness("not json at all");
        let response = api_router(h.core)
            .oneshot(post_json("/api/orders/normalize", serde_json::json!({"text": "???"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], RESEND_PROMPT);
    }

    #[tokio::test]
    async fn create_stores_order_and_reports_notifications() {
        let h = harness(SCENARIO_RESPONSE);
        let response = api_router(h.core.clone())
            .oneshot(post_json("/api/orders", confirmed_candidate(Some("2026-10-20"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        let order_id = json["order_id"].as_i64().unwrap();
        let outcomes = json["notifications"]["outcomes"].as_array().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0]["role"], "technician");
        assert_eq!(outcomes[0]["status"], "delivered");
        assert_eq!(outcomes[1]["status"], "skipped");

        let conn = h.core.open_db().unwrap();
        let order = repository::get_order(&conn, order_id).unwrap().unwrap();
        assert_eq!(order.deadline, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(h.transport.attempts_to(TECH_CHAT).len(), 1);
        assert_eq!(h.transport.attempts_to(DISPATCHER_CHAT).len(), 1);
    }

    #[tokio::test]
    async fn create_without_deadline_is_rejected() {
        let h = harness(SCENARIO_RESPONSE);
        let response = api_router(h.core.clone())
            .oneshot(post_json("/api/orders", confirmed_candidate(None)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(repository::count_orders(&h.core.open_db().unwrap()).unwrap(), 0);
        assert!(h.transport.attempts().is_empty());
    }

    #[tokio::test]
    async fn create_storage_failure_prompts_retry() {
        let h = harness(SCENARIO_RESPONSE);
        h.core
            .open_db()
            .unwrap()
            .execute_batch("DROP TABLE reminders; DROP TABLE orders;")
            .unwrap();

        let response = api_router(h.core.clone())
            .oneshot(post_json("/api/orders", confirmed_candidate(Some("2026-10-20"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], STORAGE_FAILURE_PROMPT);
        assert!(h.transport.attempts().is_empty());
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let h = harness(SCENARIO_RESPONSE);
        let response = api_router(h.core)
            .oneshot(Request::get("/api/nonexistent").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
