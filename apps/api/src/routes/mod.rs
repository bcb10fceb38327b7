pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::dialogue::handlers as dialogue;
use crate::profile::handlers as profile;
use crate::scoring::handlers as scoring;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Screening dialogue
        .route("/chat/start", post(dialogue::handle_start))
        .route("/chat/turn", post(dialogue::handle_turn))
        .route("/sessions", get(dialogue::handle_list_sessions))
        .route(
            "/sessions/:id",
            get(dialogue::handle_get_session).delete(dialogue::handle_delete_session),
        )
        // Profiles and scoring
        .route("/parse", post(profile::handle_parse))
        .route("/score", post(scoring::handle_score))
        .route("/analyze", post(scoring::handle_analyze))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::build_router;
    use crate::testing::{app_state_with, ScriptedCompletion};

    async fn send(
        router: axum::Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.oneshot(request).await.unwrap();
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
    async fn health_reports_ok() {
        let router = build_router(app_state_with(Arc::new(ScriptedCompletion::new(vec![]))));
        let (status, body) = send(router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "screener-api");
    }

    #[tokio::test]
    async fn chat_round_trip_over_http() {
        let llm = Arc::new(ScriptedCompletion::new(vec![
            "Do you have commercial FastAPI experience? [Yes/No]",
            "Thank you for applying!\n[RESULT]\nmatch_percent: 35\nsummary_one_liner: \"Weak fit\"\nreasons: [\"No FastAPI\"]",
        ]));
        let router = build_router(app_state_with(llm));

        let (status, started) = send(
            router.clone(),
            Method::POST,
            "/chat/start",
            Some(json!({ "vacancy_text": "Python developer", "cv_text": "Django, 3 years" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(started["stage"], "questioning");
        let session_id = started["session_id"].as_str().unwrap().to_string();

        let (status, finished) = send(
            router.clone(),
            Method::POST,
            "/chat/turn",
            Some(json!({ "session_id": session_id, "message": "No" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(finished["is_completed"], true);
        assert_eq!(finished["relevance"], 35);
        assert_eq!(finished["suggest_alternative"], true);
        assert_eq!(finished["reply"], "Thank you for applying!");

        let (status, detail) = send(
            router.clone(),
            Method::GET,
            &format!("/sessions/{session_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["message_count"], 5);
        assert_eq!(detail["stage"], "completed");

        let (status, listed) = send(router.clone(), Method::GET, "/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["total"], 1);

        let (status, _) = send(
            router.clone(),
            Method::DELETE,
            &format!("/sessions/{session_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(
            router,
            Method::GET,
            &format!("/sessions/{session_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn turn_on_unknown_session_is_404() {
        let router = build_router(app_state_with(Arc::new(ScriptedCompletion::new(vec![]))));
        let (status, body) = send(
            router,
            Method::POST,
            "/chat/turn",
            Some(json!({ "session_id": "nope", "message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn model_failure_is_503() {
        // Runs dry immediately.
        let router = build_router(app_state_with(Arc::new(ScriptedCompletion::new(vec![]))));
        let (status, body) = send(
            router,
            Method::POST,
            "/chat/start",
            Some(json!({ "vacancy_text": "Python developer" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn score_structured_profiles() {
        let router = build_router(app_state_with(Arc::new(ScriptedCompletion::new(vec![]))));
        let (status, body) = send(
            router,
            Method::POST,
            "/score",
            Some(json!({
                "candidate": { "city": "Moscow", "experience_years": 3, "skills": ["Python", "Django"] },
                "vacancy": { "city": "Moscow", "min_experience_years": 5, "must_have_skills": ["Python", "FastAPI"] }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["relevance"], 15);
        assert_eq!(body["reasons"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn score_rejects_inverted_salary_range() {
        let router = build_router(app_state_with(Arc::new(ScriptedCompletion::new(vec![]))));
        let (status, body) = send(
            router,
            Method::POST,
            "/score",
            Some(json!({
                "candidate": { "salary_expectation": 450000 },
                "vacancy": { "salary": { "min": 500000, "max": 400000 } }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("salary max"));
    }

    #[tokio::test]
    async fn score_rejects_negative_experience() {
        let router = build_router(app_state_with(Arc::new(ScriptedCompletion::new(vec![]))));
        let (status, body) = send(
            router,
            Method::POST,
            "/score",
            Some(json!({
                "candidate": { "experience_years": -2 },
                "vacancy": {}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn parse_vacancy_text() {
        let llm = Arc::new(ScriptedCompletion::new(vec![
            r#"{"city": "Berlin", "salary_min": 60000, "salary_max": 80000, "languages": ["English"]}"#,
        ]));
        let router = build_router(app_state_with(llm));
        let (status, body) = send(
            router,
            Method::POST,
            "/parse",
            Some(json!({ "text": "Backend engineer in Berlin", "kind": "vacancy" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "vacancy");
        assert_eq!(body["profile"]["city"], "Berlin");
        assert_eq!(body["profile"]["salary"]["max"], 80000);
    }
}
