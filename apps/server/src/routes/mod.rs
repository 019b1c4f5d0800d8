//! # HTTP Routes
//!
//! ```text
//! POST   /login               public
//! GET    /health              public
//! GET    /inventory           view inventory
//! POST   /inventory           manage inventory
//! GET    /inventory/{id}      view inventory
//! PUT    /inventory/{id}      manage inventory
//! DELETE /inventory/{id}      manage inventory
//! POST   /checkout            checkout
//! GET    /receipts            view receipts
//! GET    /receipt/{id}        view receipts
//! GET    /reports/dashboard   view reports
//! GET    /reports/weekly      view reports
//! POST   /users               manage users
//! ```
//!
//! Every route is also served under `/api`, the prefix the counter UI uses.

pub mod checkout;
pub mod inventory;
pub mod receipts;
pub mod reports;
pub mod session;
pub mod users;

use axum::{
    routing::{get, post},
    Router,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/login", post(session::login))
        .route("/health", get(session::health))
        .route(
            "/inventory",
            get(inventory::list_items).post(inventory::create_item),
        )
        .route(
            "/inventory/{id}",
            get(inventory::get_item)
                .put(inventory::update_item)
                .delete(inventory::delete_item),
        )
        .route("/checkout", post(checkout::checkout))
        .route("/receipts", get(receipts::list_receipts))
        .route("/receipt/{id}", get(receipts::get_receipt))
        .route("/reports/dashboard", get(reports::dashboard))
        .route("/reports/weekly", get(reports::weekly))
        .route("/users", post(users::create_user));

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::not_found("No such endpoint")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use farmasys_core::Role;
    use farmasys_db::seed::seed_demo_inventory;
    use farmasys_db::{Database, DbConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        state: AppState,
    }

    impl TestApp {
        async fn new() -> Self {
            let db = Database::new(DbConfig::in_memory()).await.unwrap();
            seed_demo_inventory(&db).await.unwrap();
            let state = AppState::new(db, ServerConfig::default());
            TestApp {
                router: router(state.clone()),
                state,
            }
        }

        fn token(&self, username: &str, role: Role) -> String {
            self.state.jwt.generate_token(username, role).unwrap()
        }

        fn admin(&self) -> String {
            self.token("admin", Role::Admin)
        }

        fn cashier(&self) -> String {
            self.token("caja1", Role::Cashier)
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new().await;
        let (status, body) = app.send(Method::GET, "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_login() {
        let app = TestApp::new().await;
        app.state
            .db
            .users()
            .create("caja1", "pw", Role::Cashier)
            .await
            .unwrap();

        let (status, body) = app
            .send(
                Method::POST,
                "/login",
                None,
                Some(json!({"username": "caja1", "password": "pw"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "cashier");

        let token = body["token"].as_str().unwrap().to_string();
        let (status, _) = app.send(Method::GET, "/inventory", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send(
                Method::POST,
                "/login",
                None,
                Some(json!({"username": "caja1", "password": "nope"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["ok"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_auth_is_enforced() {
        let app = TestApp::new().await;

        let (status, _) = app.send(Method::GET, "/inventory", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .send(Method::GET, "/inventory", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let cashier = app.cashier();
        let (status, body) = app
            .send(
                Method::DELETE,
                "/inventory/1",
                Some(&cashier),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, _) = app
            .send(
                Method::POST,
                "/users",
                Some(&cashier),
                Some(json!({"username": "otro", "password": "pw"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_inventory_crud() {
        let app = TestApp::new().await;
        let admin = app.admin();

        let (status, body) = app
            .send(
                Method::POST,
                "/inventory",
                Some(&admin),
                Some(json!({
                    "sku": "750100010006",
                    "name": "Cetirizina 10mg",
                    "stock": 30,
                    "price": "6.25",
                    "expiry": "2027-04-01",
                    "category": "Antialérgico"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["item"]["price"], 6.25);
        assert_eq!(body["item"]["expiry"], "2027-04-01");
        let id = body["item"]["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .send(
                Method::POST,
                "/inventory",
                Some(&admin),
                Some(json!({"sku": "750100010006", "name": "Copia", "price": 1})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, body) = app
            .send(
                Method::PUT,
                &format!("/inventory/{id}"),
                Some(&admin),
                Some(json!({"stock": 25, "expiry": ""})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["item"]["stock"], 25);
        assert_eq!(body["item"]["expiry"], Value::Null);
        assert_eq!(body["item"]["name"], "Cetirizina 10mg");

        let (status, _) = app
            .send(
                Method::PUT,
                "/inventory/ghost",
                Some(&admin),
                Some(json!({"stock": 1})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .send(Method::DELETE, &format!("/inventory/{id}"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 1);

        let (status, _) = app
            .send(Method::GET, &format!("/inventory/{id}"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_product_input() {
        let app = TestApp::new().await;
        let admin = app.admin();

        let (status, body) = app
            .send(
                Method::POST,
                "/inventory",
                Some(&admin),
                Some(json!({"sku": "X1", "name": "Algo", "price": 1, "expiry": "15/01/2026"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");

        let (status, body) = app
            .send(
                Method::POST,
                "/inventory",
                Some(&admin),
                Some(json!({"sku": "X1", "name": "", "price": 1})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn test_checkout_reference_sale() {
        let app = TestApp::new().await;
        let cashier = app.cashier();

        let (status, body) = app
            .send(
                Method::POST,
                "/api/checkout",
                Some(&cashier),
                Some(json!({
                    "items": [{"id": "5", "name": "Ibuprofeno 400mg", "price": 0.01, "qty": 3}],
                    "customer": "Ana",
                    "payment_method": "efectivo"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["subtotal"], 13.5);
        assert_eq!(body["iva"], 2.16);
        assert_eq!(body["total"], 15.66);
        let receipt_id = body["receipt_id"].as_str().unwrap().to_string();

        let (_, body) = app
            .send(Method::GET, "/inventory/5", Some(&cashier), None)
            .await;
        assert_eq!(body["item"]["stock"], 47);

        let uri = format!("/receipt/{receipt_id}");
        let (status, first) = app.send(Method::GET, &uri, Some(&cashier), None).await;
        let (_, second) = app.send(Method::GET, &uri, Some(&cashier), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, second);
        assert_eq!(first["receipt"]["cashier"], "caja1");
        assert_eq!(first["receipt"]["payment_method"], "cash");
        assert_eq!(first["receipt"]["lines"][0]["unit_price"], 4.5);
        assert_eq!(first["receipt"]["lines"][0]["qty"], 3);

        let (_, body) = app.send(Method::GET, "/receipts", Some(&cashier), None).await;
        assert_eq!(body["receipts"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_rejections() {
        let app = TestApp::new().await;
        let cashier = app.cashier();

        let cases = [
            (json!({"items": []}), "EMPTY_CART"),
            (json!({"items": [{"name": "sin id", "qty": 1}]}), "EMPTY_CART"),
            (json!({"items": [{"id": "5", "qty": 0}]}), "INVALID_QUANTITY"),
            (json!({"items": [{"id": "5", "qty": 1.5}]}), "INVALID_QUANTITY"),
            (json!({"items": [{"id": "99", "qty": 1}]}), "PRODUCT_NOT_FOUND"),
            (json!({"items": [{"id": "4", "qty": 1}]}), "INSUFFICIENT_STOCK"),
            (
                json!({"items": [{"id": "5", "qty": 30}, {"id": "5", "qty": 21}]}),
                "INSUFFICIENT_STOCK",
            ),
        ];

        for (body, code) in cases {
            let (status, response) = app
                .send(Method::POST, "/checkout", Some(&cashier), Some(body.clone()))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(response["code"], code, "{body}");
        }

        let (_, body) = app.send(Method::GET, "/inventory/5", Some(&cashier), None).await;
        assert_eq!(body["item"]["stock"], 50);

        let (_, body) = app.send(Method::GET, "/receipts", Some(&cashier), None).await;
        assert!(body["receipts"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_receipts_list_and_pages() {
        let app = TestApp::new().await;
        let cashier = app.cashier();

        for _ in 0..3 {
            let (status, _) = app
                .send(
                    Method::POST,
                    "/checkout",
                    Some(&cashier),
                    Some(json!({"items": [{"id": "1", "qty": 1}]})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, all) = app.send(Method::GET, "/receipts", Some(&cashier), None).await;
        let all = all["receipts"].as_array().unwrap().clone();
        assert_eq!(all.len(), 3);

        let (_, first) = app
            .send(Method::GET, "/receipts?limit=2", Some(&cashier), None)
            .await;
        let (_, rest) = app
            .send(Method::GET, "/receipts?limit=2&offset=2", Some(&cashier), None)
            .await;
        let first = first["receipts"].as_array().unwrap();
        let rest = rest["receipts"].as_array().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(rest.len(), 1);

        let paged: Vec<Value> = first.iter().chain(rest).cloned().collect();
        assert_eq!(paged, all);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = TestApp::new().await;
        let cashier = app.cashier();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/checkout")
            .header(header::AUTHORIZATION, format!("Bearer {cashier}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"items\": ["))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reports() {
        let app = TestApp::new().await;
        let cashier = app.cashier();

        app.send(
            Method::POST,
            "/checkout",
            Some(&cashier),
            Some(json!({"items": [{"id": "5", "qty": 3}]})),
        )
        .await;

        let (status, body) = app
            .send(Method::GET, "/reports/dashboard", Some(&cashier), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["receipts_count"], 1);
        assert_eq!(body["today_sales"], 15.66);
        // 120 + 42 + 12 + 0 + 47
        assert_eq!(body["total_items"], 221);
        assert_eq!(body["low_stock"], 1);

        let (status, body) = app
            .send(Method::GET, "/reports/weekly", Some(&cashier), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["days"].as_array().unwrap().len(), 7);
        assert_eq!(body["days"][6]["total"], 15.66);
        assert_eq!(body["top_products"][0]["name"], "Ibuprofeno 400mg");
        assert_eq!(body["top_products"][0]["quantity"], 3);
    }

    #[tokio::test]
    async fn test_create_user() {
        let app = TestApp::new().await;
        let admin = app.admin();

        let (status, body) = app
            .send(
                Method::POST,
                "/users",
                Some(&admin),
                Some(json!({"username": "caja2", "password": "pw"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "cashier");
        assert!(body["user"].get("password_hash").is_none());

        let (status, _) = app
            .send(
                Method::POST,
                "/users",
                Some(&admin),
                Some(json!({"username": "caja2", "password": "pw"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .send(
                Method::POST,
                "/users",
                Some(&admin),
                Some(json!({"username": "jefe", "password": "pw", "role": "owner"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = TestApp::new().await;
        let (status, body) = app.send(Method::GET, "/nope", None, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["ok"], false);
    }
}
