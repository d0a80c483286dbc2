//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Requests and decisions
        .route("/requests", post(handlers::submit_request))
        .route("/decisions", post(handlers::record_decision))
        // Profiles
        .route("/profiles", get(handlers::list_profiles))
        .route("/profiles", post(handlers::install_profile))
        .route("/profiles/active", put(handlers::switch_profile))
        .route("/profiles/:name/entries", get(handlers::list_profile_entries))
        // Consent prompts
        .route("/prompts", get(handlers::list_prompts))
        .route("/prompts/:id", post(handlers::answer_prompt))
        // Packages and grants
        .route("/packages/:package", delete(handlers::remove_package))
        .route("/grants/timeframe", put(handlers::set_grant_timeframe));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use privgate_engine::{EngineConfig, PolicyEngine, SystemClock};
    use privgate_store::InMemoryPolicyStore;
    use privgate_types::Taxonomy;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app_state(config: EngineConfig) -> AppState {
        let engine = PolicyEngine::start(
            Arc::new(Taxonomy::standard()),
            Arc::new(InMemoryPolicyStore::new()),
            Arc::new(SystemClock),
            &config,
        )
        .await
        .unwrap();
        AppState::new(Arc::new(engine), config)
    }

    async fn call(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = create_router(state.clone(), false)
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_reports_active_profile() {
        let state = app_state(EngineConfig::default()).await;
        let (status, body) = call(&state, Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active_profile"], "Default");
        assert_eq!(body["pending_prompts"], 0);
    }

    #[tokio::test]
    async fn test_decision_then_request() {
        let state = app_state(EngineConfig::default()).await;
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/v1/decisions",
            Some(json!({
                "app": "*",
                "permission": "SMS",
                "purpose": "ALL",
                "action": "deny",
                "durability": "always"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "persisted");

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/v1/requests",
            Some(json!({"app": "com.example.app", "permission": "SMS"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verdict"], "deny");
    }

    #[tokio::test]
    async fn test_unknown_taxonomy_is_bad_request() {
        let state = app_state(EngineConfig::default()).await;
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/v1/requests",
            Some(json!({"app": "com.example.app", "permission": "TELEPATHY"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/v1/decisions",
            Some(json!({
                "app": "A",
                "permission": "CAMERA",
                "purpose": "ALL",
                "action": "deny",
                "durability": "once"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_profile_install_switch_and_entries() {
        let state = app_state(EngineConfig::default()).await;
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/v1/profiles",
            Some(json!({"template": "Organizational"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], true);

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/v1/profiles",
            Some(json!({"template": "Organizational"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/v1/profiles",
            Some(json!({
                "name": "Kiosk",
                "rules": [{"permission": "CAMERA", "action": "deny"}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Kiosk");

        let (status, body) = call(
            &state,
            Method::PUT,
            "/api/v1/profiles/active",
            Some(json!({"name": "organizational"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Organizational");

        let (status, body) = call(&state, Method::GET, "/api/v1/profiles", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (status, body) =
            call(&state, Method::GET, "/api/v1/profiles/Kiosk/entries", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = call(
            &state,
            Method::PUT,
            "/api/v1/profiles/active",
            Some(json!({"name": "Nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_prompt_answer_completes_request() {
        let state = app_state(EngineConfig::default()).await;

        let pending = {
            let state = state.clone();
            tokio::spawn(async move {
                call(
                    &state,
                    Method::POST,
                    "/api/v1/requests",
                    Some(json!({"app": "A", "permission": "CAMERA"})),
                )
                .await
            })
        };

        while state.prompts.is_empty() {
            tokio::task::yield_now().await;
        }
        let (status, prompts) = call(&state, Method::GET, "/api/v1/prompts", None).await;
        assert_eq!(status, StatusCode::OK);
        let id = prompts[0]["id"].as_str().unwrap().to_string();
        assert_eq!(prompts[0]["permission"], "Camera");

        let (status, _) = call(
            &state,
            Method::POST,
            &format!("/api/v1/prompts/{id}"),
            Some(json!({"choice": "allow_once"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = pending.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verdict"], "allow");
        assert_eq!(state.engine.grants().active_grants().len(), 1);

        let (status, _) = call(
            &state,
            Method::POST,
            &format!("/api/v1/prompts/{id}"),
            Some(json!({"choice": "allow_once"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_prompt_denies() {
        let config = EngineConfig {
            prompt_timeout_secs: 2,
            ..Default::default()
        };
        let state = app_state(config).await;
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/v1/requests",
            Some(json!({"app": "A", "permission": "MICROPHONE"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verdict"], "deny");
        assert!(state.prompts.is_empty());
    }

    #[tokio::test]
    async fn test_package_removal_and_timeframe() {
        let state = app_state(EngineConfig::default()).await;
        call(
            &state,
            Method::POST,
            "/api/v1/decisions",
            Some(json!({
                "app": "com.old",
                "permission": "CONTACTS",
                "purpose": "ALL",
                "action": "allow",
                "durability": "always"
            })),
        )
        .await;

        let (status, body) =
            call(&state, Method::DELETE, "/api/v1/packages/com.old", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries_removed"], 1);

        let (status, body) = call(
            &state,
            Method::PUT,
            "/api/v1/grants/timeframe",
            Some(json!({"seconds": 60})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["seconds"], 60);

        let (status, _) = call(
            &state,
            Method::PUT,
            "/api/v1/grants/timeframe",
            Some(json!({"seconds": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &state,
            Method::PUT,
            "/api/v1/grants/timeframe",
            Some(json!({"seconds": u64::MAX})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.engine.ask_grant_timeframe().as_secs(), 60);

        // allow once still works after the rejected change
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/v1/decisions",
            Some(json!({
                "app": "com.new",
                "permission": "CAMERA",
                "purpose": "ALL",
                "action": "allow",
                "durability": "once"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "granted");
    }
}
