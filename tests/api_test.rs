mod tools;

#[cfg(test)]
mod api_tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use groom_scheduler_lib::application::routes::router;

    use crate::tools::db::setup_services;

    async fn app() -> Router {
        router(Arc::new(setup_services().await))
    }

    async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn token_for(app: &Router, username: &str, role: &str) -> String {
        let (status, _) = send(
            app,
            "POST",
            "/register",
            None,
            Some(json!({ "username": username, "password": "secret", "role": role })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            app,
            "POST",
            "/login",
            None,
            Some(json!({ "username": username, "password": "secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "ok");
    }

    #[tokio::test]
    async fn test_missing_token_is_401_and_bad_token_is_403() {
        let app = app().await;

        let (status, body) = send(&app, "GET", "/vans", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = send(&app, "GET", "/vans", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_non_admin_can_only_read_reports() {
        let app = app().await;
        let token = token_for(&app, "viewer", "staff").await;

        let (status, body) = send(&app, "GET", "/vans", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Admin access required");

        let (status, body) = send(
            &app,
            "GET",
            "/event-history?start_date=2025-01-01&end_date=2025-01-31&status=All",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_is_401() {
        let app = app().await;
        token_for(&app, "dana", "admin").await;

        let (status, body) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "username": "dana", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_admin_builds_and_edits_grid() {
        let app = app().await;
        let token = token_for(&app, "dana", "admin").await;

        for name in ["Alpha", "Beta"] {
            let (status, _) = send(&app, "POST", "/vans", Some(&token), Some(json!({ "name": name }))).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(
            &app,
            "POST",
            "/initialize-schedule",
            Some(&token),
            Some(json!({ "num_vans": 2, "num_days": 3, "start_date": "2025-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["written"], 6);

        let (status, body) = send(
            &app,
            "PUT",
            "/schedule/cell",
            Some(&token),
            Some(json!({
                "van_id": 2,
                "day": "2025-01-02",
                "assignment": "Sam",
                "status": "Scheduled",
                "note": "first week"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["history"]["cell_id"], "2-2025-01-02");
        assert_eq!(body["history"]["user"], "dana");

        let (status, grid) = send(&app, "GET", "/schedule/grid", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(grid["days"].as_array().unwrap().len(), 3);
        assert_eq!(grid["rows"][1]["van"]["name"], "Beta");
        assert_eq!(grid["rows"][1]["cells"][1]["assignment"], "Sam");
        assert_eq!(grid["rows"][1]["cells"][1]["duplicate"], false);

        let (status, history) = send(&app, "GET", "/cell-history/2-2025-01-02", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_payloads_are_400() {
        let app = app().await;
        let token = token_for(&app, "dana", "admin").await;

        let (status, body) = send(&app, "PUT", "/schedule", Some(&token), Some(json!({ "van_id": 1 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = send(
            &app,
            "POST",
            "/add-days",
            Some(&token),
            Some(json!({ "end_date": "soon" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "DELETE", "/vans/42", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
