// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

// Fotos e logos chegam como corpo bruto.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn router(app_state: AppState) -> Router {
    // Define as rotas de autenticação
    let auth_routes = Router::new()
        .route("/refresh", post(handlers::auth::refresh))
        .route("/logout", post(handlers::auth::logout))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard))
        // públicas
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/me/photo",
            put(handlers::auth::upload_photo).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/{id}/coupons", get(handlers::coupons::list_user_coupons))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let admin_routes = Router::new()
        .route("/users", get(handlers::admin::list_users))
        .route("/users/{id}/claims", put(handlers::admin::set_claims))
        .route("/intents/resume", post(handlers::admin::resume_intents))
        .route("/applications", get(handlers::applications::list_applications))
        .route("/applications/{id}", get(handlers::applications::get_application))
        .route(
            "/applications/{id}/status",
            put(handlers::applications::update_application_status),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let ticket_routes = Router::new()
        .route(
            "/",
            get(handlers::tickets::list_tickets).post(handlers::tickets::open_ticket),
        )
        .route("/stream", get(handlers::tickets::stream_tickets))
        .route("/batch-delete", post(handlers::tickets::batch_delete_tickets))
        .route("/{id}", get(handlers::tickets::get_ticket))
        .route("/{id}/status", put(handlers::tickets::update_ticket_status))
        .route(
            "/{id}/messages",
            get(handlers::tickets::list_messages).post(handlers::tickets::post_message),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let appointment_routes = Router::new()
        .route("/", get(handlers::appointments::list_appointments))
        .route("/{id}", get(handlers::appointments::get_appointment))
        .route("/{id}/confirm", post(handlers::appointments::confirm_appointment))
        .route("/{id}/cancel", post(handlers::appointments::cancel_appointment))
        .route("/{id}/reschedule", post(handlers::appointments::reschedule_appointment))
        .route("/{id}/qr", get(handlers::appointments::appointment_qr))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let coupon_routes = Router::new()
        .route("/lookup", post(handlers::coupons::lookup_coupon))
        .route("/redeem", post(handlers::coupons::redeem_coupon))
        .route("/{id}", delete(handlers::coupons::delete_coupon))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let product_routes = Router::new()
        .route(
            "/",
            get(handlers::products::list_my_products).post(handlers::products::create_product),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let partner_routes = Router::new()
        .route("/", get(handlers::partners::list_partners))
        .route("/{partner_id}", get(handlers::partners::get_partner))
        .route(
            "/{partner_id}/logo",
            put(handlers::partners::upload_logo).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/{partner_id}/products", get(handlers::products::list_partner_products))
        .route("/{partner_id}/products/{id}", delete(handlers::products::delete_product))
        .route("/{partner_id}/products/{id}/review", put(handlers::products::review_product))
        .route("/{partner_id}/revenues", get(handlers::revenues::list_revenues))
        .route("/{partner_id}/revenues/summary", get(handlers::revenues::revenue_summary))
        .route(
            "/{partner_id}/revenues/statement.pdf",
            get(handlers::revenues::revenue_statement),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let revenue_routes = Router::new()
        .route("/", post(handlers::revenues::record_payment))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/applications", post(handlers::applications::submit_application))
        .route("/files/{*path}", get(handlers::partners::serve_file))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/tickets", ticket_routes)
        .nest("/api/appointments", appointment_routes)
        .nest("/api/coupons", coupon_routes)
        .nest("/api/products", product_routes)
        .nest("/api/partners", partner_routes)
        .nest("/api/revenues", revenue_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, StoreBackend},
        db::{memory_store::MemoryDocumentStore, store::{DocumentStore, SharedStore}},
        services::storage_service::{LocalObjectStorage, SharedObjectStorage},
        test_support::seed,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Map, Value};
    use std::{sync::Arc, time::Duration};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        store: Arc<MemoryDocumentStore>,
        _files: TempDir,
    }

    fn test_app() -> TestApp {
        let files = tempfile::tempdir().unwrap();
        let config = Config {
            store_backend: StoreBackend::Memory,
            database_url: None,
            jwt_secret: "test-secret".into(),
            bind_addr: "127.0.0.1:0".into(),
            storage_root: files.path().to_path_buf(),
            public_base_url: "http://localhost/files".into(),
            upload_retry_budget: Duration::from_millis(0),
            mirror_page_size: 50,
            mail_composer: "log".into(),
            fonts_dir: files.path().join("fonts"),
        };
        let store = Arc::new(MemoryDocumentStore::new());
        let shared: SharedStore = store.clone();
        let storage: SharedObjectStorage =
            Arc::new(LocalObjectStorage::new(files.path(), "http://localhost/files"));
        let state = AppState::with_store(&config, shared, storage).unwrap();

        TestApp { router: router(state), store, _files: files }
    }

    async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn register(app: &TestApp, email: &str) -> String {
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({ "email": email, "password": "secret123", "displayName": "Awa" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn login(app: &TestApp, email: &str) -> String {
        let (status, body) = send(
            app,
            json_request("POST", "/api/auth/login", None, json!({ "email": email, "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn user_id(app: &TestApp, token: &str) -> String {
        let (_, me) = send(app, get_request("/api/users/me", Some(token))).await;
        me["id"].as_str().unwrap().to_string()
    }

    async fn promote(app: &TestApp, id: &str, fields: Value) {
        let fields: Map<String, Value> = fields.as_object().cloned().unwrap();
        app.store.update("users", id, fields).await.unwrap();
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app();
        let response = app.router.clone().oneshot(get_request("/api/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_need_a_token_and_logout_revokes_it() {
        let app = test_app();
        let (status, body) = send(&app, get_request("/api/users/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let token = register(&app, "awa@example.com").await;
        let (status, me) = send(&app, get_request("/api/users/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "awa@example.com");
        assert!(me.get("passwordHash").is_none());

        let (status, _) = send(&app, json_request("POST", "/api/auth/logout", Some(&token), json!({}))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, get_request("/api/users/me", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn deleted_account_gets_unauthorized() {
        let app = test_app();
        let token = register(&app, "awa@example.com").await;
        let id = user_id(&app, &token).await;
        app.store.delete("users", &id).await.unwrap();

        let (status, _) = send(&app, get_request("/api/users/me", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn errors_follow_the_accept_language_header() {
        let app = test_app();
        let token = register(&app, "awa@example.com").await;
        let id = user_id(&app, &token).await;
        promote(&app, &id, json!({ "role": "partner", "partnerId": "p1" })).await;
        let token = login(&app, "awa@example.com").await;

        let mut request = json_request("POST", "/api/coupons/redeem", Some(&token), json!({ "scanned": "NOPE" }));
        request.headers_mut().insert(header::ACCEPT_LANGUAGE, "fr-SN,fr;q=0.9".parse().unwrap());
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Coupon invalide");
    }

    #[tokio::test]
    async fn validation_errors_carry_field_details() {
        let app = test_app();
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({ "email": "not-an-email", "password": "123", "displayName": "" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["email"].is_array());
        assert!(body["details"]["password"].is_array());
    }

    #[tokio::test]
    async fn admin_routes_reject_customers() {
        let app = test_app();
        let token = register(&app, "client@example.com").await;

        let (status, _) = send(&app, get_request("/api/admin/applications", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, json_request("POST", "/api/admin/intents/resume", Some(&token), json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn accepted_application_becomes_a_partner() {
        let app = test_app();
        let (status, application) = send(
            &app,
            json_request(
                "POST",
                "/api/applications",
                None,
                json!({
                    "applicantInfo": { "name": "Awa", "email": "awa@shop.sn" },
                    "businessInfo": { "businessName": "Chez Awa", "category": "restaurant" }
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let app_id = application["id"].as_str().unwrap().to_string();

        let token = register(&app, "boss@example.com").await;
        let id = user_id(&app, &token).await;
        promote(&app, &id, json!({ "role": "admin", "isAdmin": true })).await;
        let token = login(&app, "boss@example.com").await;

        let (status, report) = send(
            &app,
            json_request(
                "PUT",
                &format!("/api/admin/applications/{}/status", app_id),
                Some(&token),
                json!({ "status": "accepted" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", report);
        assert!(report["mailto"].as_str().unwrap().starts_with("mailto:awa@shop.sn"));
        assert_eq!(report["mailDispatched"], true);

        let (status, partner) = send(&app, get_request(&format!("/api/partners/{}", app_id), Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(partner["name"], "Chez Awa");
    }

    #[tokio::test]
    async fn partner_confirms_an_appointment_by_scan() {
        let app = test_app();
        seed(
            &app.store,
            "appointments",
            "a1",
            json!({ "partnerId": "p1", "status": "scheduled", "codeData": { "qrContent": "RDV-1" } }),
        )
        .await;
        let token = register(&app, "shop@example.com").await;
        let id = user_id(&app, &token).await;
        promote(&app, &id, json!({ "role": "partner", "partnerId": "p1" })).await;
        let token = login(&app, "shop@example.com").await;

        let (status, _) = send(
            &app,
            json_request("POST", "/api/appointments/a1/confirm", Some(&token), json!({ "scanned": "RDV-2" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, outcome) = send(
            &app,
            json_request("POST", "/api/appointments/a1/confirm", Some(&token), json!({ "scanned": "RDV-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["outcome"], "confirmed");
        assert!(outcome["appointment"].get("codeData").is_none());

        let (_, again) = send(
            &app,
            json_request("POST", "/api/appointments/a1/confirm", Some(&token), json!({ "scanned": "RDV-1" })),
        )
        .await;
        assert_eq!(again["outcome"], "alreadyConfirmed");
    }

    #[tokio::test]
    async fn uploaded_photo_is_served_back() {
        let app = test_app();
        let token = register(&app, "awa@example.com").await;

        let request = Request::builder()
            .method("PUT")
            .uri("/api/users/me/photo")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(&b"\x89PNG fake"[..]))
            .unwrap();
        let (status, user) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK, "{}", user);

        let url = user["photoUrl"].as_str().unwrap();
        let path = url.strip_prefix("http://localhost").unwrap();
        let response = app.router.clone().oneshot(get_request(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"\x89PNG fake");
    }
}
