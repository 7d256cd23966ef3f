#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, RawQuery},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use mealplan_api::{
    build_router,
    config::{AuthKey, Config, StoreBackend},
    db::MemoryMealPlanStore,
    models::auth::Claims,
    AppState,
};
use serde_json::json;
use tokio::sync::Mutex;

pub const SECRET: &str = "integration-secret";

pub struct TestApp {
    pub base: String,
    pub store: Arc<MemoryMealPlanStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

pub fn test_config(spoonacular_base_url: &str, api_key: Option<&str>) -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        store_backend: StoreBackend::Memory,
        database_url: None,
        database_max_connections: 1,
        database_acquire_timeout_seconds: 1,
        auth_key: AuthKey::Secret(SECRET.into()),
        auth_issuer: None,
        auth_audience: None,
        spoonacular_api_key: api_key.map(String::from),
        spoonacular_base_url: spoonacular_base_url.into(),
        recipe_search_limit: 12,
        upstream_timeout_seconds: 2,
        cors_allowed_origins: Vec::new(),
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

pub async fn spawn_app(config: Config) -> TestApp {
    let store = Arc::new(MemoryMealPlanStore::new());
    let state = AppState::new(config, store.clone()).expect("app state");
    let addr = serve(build_router(state)).await;
    TestApp {
        base: format!("http://{addr}"),
        store,
        client: reqwest::Client::new(),
    }
}

pub fn token(user_id: &str) -> String {
    token_with_ttl(user_id, 3600)
}

pub fn token_with_ttl(user_id: &str, ttl: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.into(),
        exp: (now + ttl) as usize,
        iat: now as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
        .expect("sign token")
}

/// Raw query strings received by the fake upstream, in arrival order.
pub type SeenQueries = Arc<Mutex<Vec<String>>>;

/// Body served for recipe id `ordered`, as raw text.
pub const ORDERED_DETAIL: &str = r#"{"title":"T","id":5,"aisle":"x","pricePerServing":163.15}"#;

/// Stand-in for the Spoonacular API. Recipe id `404` answers 404, id
/// `garbage` answers a non-JSON body and id `ordered` answers [`ORDERED_DETAIL`].
pub async fn spawn_fake_upstream() -> (String, SeenQueries) {
    let seen: SeenQueries = Arc::default();

    let search_seen = seen.clone();
    let info_seen = seen.clone();
    let app = Router::new()
        .route(
            "/recipes/complexSearch",
            get(move |RawQuery(q): RawQuery| {
                let seen = search_seen.clone();
                async move {
                    seen.lock().await.push(q.unwrap_or_default());
                    Json(json!({
                        "results": [{ "id": 716429, "title": "Pasta with Garlic", "image": "p.jpg" }],
                        "offset": 0,
                        "number": 12,
                        "totalResults": 1
                    }))
                }
            }),
        )
        .route(
            "/recipes/{id}/information",
            get(move |Path(id): Path<String>, RawQuery(q): RawQuery| {
                let seen = info_seen.clone();
                async move {
                    seen.lock().await.push(q.unwrap_or_default());
                    match id.as_str() {
                        "404" => (StatusCode::NOT_FOUND, "no such recipe").into_response(),
                        "garbage" => (StatusCode::OK, "<html>").into_response(),
                        "ordered" => (
                            [(header::CONTENT_TYPE, "application/json")],
                            ORDERED_DETAIL,
                        )
                            .into_response(),
                        _ => Json(json!({
                            "id": id.parse::<i64>().unwrap_or(0),
                            "title": "Detail",
                            "nutrition": { "nutrients": [] }
                        }))
                        .into_response(),
                    }
                }
            }),
        );

    let addr = serve(app).await;
    (format!("http://{addr}"), seen)
}
