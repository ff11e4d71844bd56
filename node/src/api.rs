//! # REST API
//!
//! Builds the axum router that exposes the asset registry over HTTP. All
//! handlers share [`AppState`] through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                             | Description                    |
//! |--------|----------------------------------|--------------------------------|
//! | GET    | `/health`                        | Liveness probe                 |
//! | POST   | `/api/v1/ledger/init`            | Seed the sample assets         |
//! | POST   | `/api/v1/assets`                 | Create an asset                |
//! | GET    | `/api/v1/assets`                 | List all assets                |
//! | GET    | `/api/v1/assets/count`           | Count live assets              |
//! | GET    | `/api/v1/assets/:id`             | Read one asset                 |
//! | PUT    | `/api/v1/assets/:id`             | Update an asset                |
//! | DELETE | `/api/v1/assets/:id`             | Delete an asset                |
//! | GET    | `/api/v1/assets/:id/history`     | Audit trail of one asset       |
//! | POST   | `/api/v1/assets/:id/transfer`    | Change an asset's owner        |
//! | GET    | `/api/v1/owners/:owner/assets`   | Assets held by one owner       |
//!
//! Contract calls are synchronous and hold the ledger lock, so they run on
//! the blocking pool rather than on the async workers.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use asset_ledger_contracts::{
    sort_chronologically, Asset, AssetContract, AssetError, AssetHistory, AssetResult,
};
use asset_ledger_protocol::config::{API_PREFIX, CONTRACT_NAME, CONTRACT_VERSION};
use asset_ledger_protocol::ledger::TxReceipt;
use asset_ledger_protocol::{Invocation, Ledger, SledStore};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger<SledStore>>,
    pub contract: AssetContract,
    pub metrics: SharedMetrics,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger<SledStore>>, metrics: SharedMetrics) -> Self {
        Self {
            ledger,
            contract: AssetContract::new(),
            metrics,
        }
    }

    /// Submit `f` on the blocking pool, recording outcome and latency.
    async fn submit<T, F>(&self, f: F) -> Result<TxReceipt<T>, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Invocation<'_>) -> AssetResult<T> + Send + 'static,
    {
        let ledger = Arc::clone(&self.ledger);
        let metrics = Arc::clone(&self.metrics);
        let result = tokio::task::spawn_blocking(move || {
            let _timer = metrics.invocation_latency_seconds.start_timer();
            let result = ledger.submit(f);
            match &result {
                Ok(_) => metrics.transactions_submitted_total.inc(),
                Err(_) => metrics.transactions_failed_total.inc(),
            }
            result
        })
        .await
        .map_err(|e| ApiError::Internal(format!("invocation task failed: {e}")))?;
        Ok(result?)
    }

    /// Evaluate `f` read-only on the blocking pool.
    async fn evaluate<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Invocation<'_>) -> AssetResult<T> + Send + 'static,
    {
        let ledger = Arc::clone(&self.ledger);
        let metrics = Arc::clone(&self.metrics);
        let result = tokio::task::spawn_blocking(move || {
            let _timer = metrics.invocation_latency_seconds.start_timer();
            metrics.queries_evaluated_total.inc();
            ledger.evaluate(f)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("query task failed: {e}")))?;
        Ok(result?)
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let api = Router::new()
        .route("/ledger/init", post(init_ledger_handler))
        .route("/assets", post(create_asset_handler).get(all_assets_handler))
        .route("/assets/count", get(asset_count_handler))
        .route(
            "/assets/:id",
            get(read_asset_handler)
                .put(update_asset_handler)
                .delete(delete_asset_handler),
        )
        .route("/assets/:id/history", get(asset_history_handler))
        .route("/assets/:id/transfer", post(transfer_asset_handler))
        .route("/owners/:owner/assets", get(assets_by_owner_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest(API_PREFIX, api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /api/v1/assets`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetRequest {
    #[serde(rename = "ID")]
    pub id: String,
    pub color: String,
    pub size: i64,
    pub owner: String,
    pub appraised_value: i64,
}

/// Body of `PUT /api/v1/assets/:id`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssetRequest {
    pub color: String,
    pub size: i64,
    pub owner: String,
    pub appraised_value: i64,
}

/// Body of `POST /api/v1/assets/:id/transfer`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAssetRequest {
    pub new_owner: String,
}

/// Ordering of `GET /api/v1/assets/:id/history`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryOrder {
    /// Storage key order.
    #[default]
    Key,
    /// Oldest first by timestamp.
    Chronological,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub order: HistoryOrder,
}

/// Response to every successful mutation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub message: String,
    /// Id of the created asset; only set on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub tx_id: String,
}

impl MutationResponse {
    fn new<T>(message: &str, receipt: &TxReceipt<T>) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
            id: None,
            tx_id: receipt.tx_id.clone(),
        })
    }

    fn created<T>(id: String, receipt: &TxReceipt<T>) -> Json<Self> {
        Json(Self {
            message: "Asset created successfully".to_string(),
            id: Some(id),
            tx_id: receipt.tx_id.clone(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

/// Error body returned on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Handler failure, rendered as `{"error": ...}` with a matching status.
#[derive(Debug)]
pub enum ApiError {
    Asset(AssetError),
    BadRequest(String),
    Internal(String),
}

impl From<AssetError> for ApiError {
    fn from(e: AssetError) -> Self {
        ApiError::Asset(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Asset(e) => {
                let status = match &e {
                    AssetError::NotFound(_) => StatusCode::NOT_FOUND,
                    AssetError::AlreadyExists(_) => StatusCode::CONFLICT,
                    AssetError::InvalidAssetId { .. } => StatusCode::BAD_REQUEST,
                    AssetError::Store(_) | AssetError::Decode { .. } | AssetError::Encode(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: 200 while the process is up.
async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "contract": CONTRACT_NAME,
            "version": CONTRACT_VERSION,
        })),
    )
}

/// `POST /api/v1/ledger/init`
async fn init_ledger_handler(State(state): State<AppState>) -> ApiResult<Json<MutationResponse>> {
    let contract = state.contract;
    let receipt = state.submit(move |inv| contract.init_ledger(inv)).await?;
    state.metrics.live_assets.add(receipt.result as i64);
    Ok(MutationResponse::new("Ledger initialized successfully", &receipt))
}

/// `POST /api/v1/assets`
async fn create_asset_handler(
    State(state): State<AppState>,
    body: Result<Json<CreateAssetRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MutationResponse>)> {
    let Json(req) = body?;
    let id = req.id.clone();
    let contract = state.contract;
    let receipt = state
        .submit(move |inv| {
            contract.create_asset(
                inv,
                &req.id,
                &req.color,
                req.size,
                &req.owner,
                req.appraised_value,
            )
        })
        .await?;
    state.metrics.live_assets.inc();
    Ok((StatusCode::CREATED, MutationResponse::created(id, &receipt)))
}

/// `GET /api/v1/assets`
async fn all_assets_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<Asset>>> {
    let contract = state.contract;
    let assets = state.evaluate(move |inv| contract.get_all_assets(inv)).await?;
    Ok(Json(assets))
}

/// `GET /api/v1/assets/count`
async fn asset_count_handler(State(state): State<AppState>) -> ApiResult<Json<CountResponse>> {
    let contract = state.contract;
    let count = state.evaluate(move |inv| contract.get_asset_count(inv)).await?;
    state.metrics.live_assets.set(count as i64);
    Ok(Json(CountResponse { count }))
}

/// `GET /api/v1/assets/:id`
async fn read_asset_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Asset>> {
    let contract = state.contract;
    let asset = state.evaluate(move |inv| contract.read_asset(inv, &id)).await?;
    Ok(Json(asset))
}

/// `PUT /api/v1/assets/:id`
async fn update_asset_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateAssetRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(req) = body?;
    let contract = state.contract;
    let receipt = state
        .submit(move |inv| {
            contract.update_asset(
                inv,
                &id,
                &req.color,
                req.size,
                &req.owner,
                req.appraised_value,
            )
        })
        .await?;
    Ok(MutationResponse::new("Asset updated successfully", &receipt))
}

/// `DELETE /api/v1/assets/:id`
async fn delete_asset_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MutationResponse>> {
    let contract = state.contract;
    let receipt = state.submit(move |inv| contract.delete_asset(inv, &id)).await?;
    state.metrics.live_assets.dec();
    Ok(MutationResponse::new("Asset deleted successfully", &receipt))
}

/// `POST /api/v1/assets/:id/transfer`
async fn transfer_asset_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TransferAssetRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(req) = body?;
    let contract = state.contract;
    let receipt = state
        .submit(move |inv| contract.transfer_asset(inv, &id, &req.new_owner))
        .await?;
    Ok(MutationResponse::new("Asset transferred successfully", &receipt))
}

/// `GET /api/v1/assets/:id/history[?order=chronological]`
async fn asset_history_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<AssetHistory>>> {
    let Query(params) = params?;
    let contract = state.contract;
    let mut history = state
        .evaluate(move |inv| contract.get_asset_history(inv, &id))
        .await?;
    if params.order == HistoryOrder::Chronological {
        sort_chronologically(&mut history);
    }
    Ok(Json(history))
}

/// `GET /api/v1/owners/:owner/assets`
async fn assets_by_owner_handler(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> ApiResult<Json<Vec<Asset>>> {
    let contract = state.contract;
    let assets = state
        .evaluate(move |inv| contract.get_assets_by_owner(inv, &owner))
        .await?;
    Ok(Json(assets))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::metrics::NodeMetrics;

    /// Creates a test AppState backed by a temporary sled database.
    fn test_app_state() -> AppState {
        let store = SledStore::open_temporary().expect("temp db");
        let metrics = Arc::new(NodeMetrics::new().expect("metrics"));
        AppState::new(Arc::new(Ledger::new(store)), metrics)
    }

    /// Sends a request and returns (status, body_bytes).
    async fn send(
        router: &Router,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(path);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        send(router, "GET", path, None).await
    }

    fn asset_body(id: &str, owner: &str) -> serde_json::Value {
        serde_json::json!({
            "ID": id,
            "color": "blue",
            "size": 5,
            "owner": owner,
            "appraisedValue": 300
        })
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["contract"], CONTRACT_NAME);
    }

    #[tokio::test]
    async fn create_then_read() {
        let router = create_router(test_app_state());

        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/assets",
            Some(asset_body("asset1", "Tomoko")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let resp: MutationResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.tx_id.len(), 64);
        assert_eq!(resp.id.as_deref(), Some("asset1"));

        let (status, body) = get(&router, "/api/v1/assets/asset1").await;
        assert_eq!(status, StatusCode::OK);
        let asset: Asset = serde_json::from_slice(&body).unwrap();
        assert_eq!(asset.owner, "Tomoko");
        assert_eq!(asset.appraised_value, 300);
    }

    #[tokio::test]
    async fn duplicate_create_is_conflict() {
        let router = create_router(test_app_state());
        let body = asset_body("asset1", "Tomoko");
        send(&router, "POST", "/api/v1/assets", Some(body.clone())).await;

        let (status, body) = send(&router, "POST", "/api/v1/assets", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.error, "the asset asset1 already exists");
    }

    #[tokio::test]
    async fn reserved_id_is_bad_request() {
        let router = create_router(test_app_state());
        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/assets",
            Some(asset_body("HISTORY_x", "o")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request_with_json_error() {
        let router = create_router(test_app_state());
        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/assets",
            Some(serde_json::json!({ "ID": "a", "color": "red" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(!err.error.is_empty());
    }

    #[tokio::test]
    async fn missing_asset_is_404() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/api/v1/assets/ghost").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("does not exist"));

        let (status, _) = send(&router, "DELETE", "/api/v1/assets/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transfer_history_and_delete_flow() {
        let state = test_app_state();
        let metrics = Arc::clone(&state.metrics);
        let router = create_router(state);

        send(
            &router,
            "POST",
            "/api/v1/assets",
            Some(asset_body("asset1", "Tomoko")),
        )
        .await;
        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/assets/asset1/transfer",
            Some(serde_json::json!({ "newOwner": "Brad" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = get(&router, "/api/v1/owners/Brad/assets").await;
        let owned: Vec<Asset> = serde_json::from_slice(&body).unwrap();
        assert_eq!(owned.len(), 1);

        let (status, body) = get(&router, "/api/v1/assets/asset1/history?order=chronological").await;
        assert_eq!(status, StatusCode::OK);
        let history: Vec<AssetHistory> = serde_json::from_slice(&body).unwrap();
        let owners: Vec<_> = history.iter().map(|h| h.owner.as_str()).collect();
        assert_eq!(owners, vec!["Tomoko", "Brad"]);

        let (status, _) = send(&router, "DELETE", "/api/v1/assets/asset1", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get(&router, "/api/v1/assets/asset1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = get(&router, "/api/v1/assets/asset1/history").await;
        let history: Vec<AssetHistory> = serde_json::from_slice(&body).unwrap();
        assert_eq!(history.len(), 2);

        assert_eq!(metrics.transactions_submitted_total.get(), 3);
    }

    #[tokio::test]
    async fn live_assets_gauge_follows_creates_and_deletes() {
        let state = test_app_state();
        let metrics = Arc::clone(&state.metrics);
        let router = create_router(state);

        send(&router, "POST", "/api/v1/ledger/init", None).await;
        assert_eq!(metrics.live_assets.get(), 10);

        send(&router, "POST", "/api/v1/assets", Some(asset_body("asset11", "Ana"))).await;
        assert_eq!(metrics.live_assets.get(), 11);

        // Rejected mutations leave the gauge alone.
        send(&router, "POST", "/api/v1/assets", Some(asset_body("asset11", "Ana"))).await;
        send(&router, "DELETE", "/api/v1/assets/ghost", None).await;
        assert_eq!(metrics.live_assets.get(), 11);

        let (status, body) = send(&router, "DELETE", "/api/v1/assets/asset2", None).await;
        assert_eq!(status, StatusCode::OK);
        let resp: MutationResponse = serde_json::from_slice(&body).unwrap();
        assert!(resp.id.is_none());
        assert_eq!(metrics.live_assets.get(), 10);
    }

    #[tokio::test]
    async fn unknown_history_order_is_bad_request() {
        let router = create_router(test_app_state());
        let (status, _) = get(&router, "/api/v1/assets/asset1/history?order=random").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn init_then_count_and_update() {
        let state = test_app_state();
        let metrics = Arc::clone(&state.metrics);
        let router = create_router(state);

        let (status, _) = send(&router, "POST", "/api/v1/ledger/init", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = get(&router, "/api/v1/assets/count").await;
        let count: CountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(count.count, 10);
        assert_eq!(metrics.live_assets.get(), 10);

        let (status, _) = send(
            &router,
            "PUT",
            "/api/v1/assets/asset3",
            Some(serde_json::json!({
                "color": "teal", "size": 11, "owner": "Jin Soo", "appraisedValue": 550
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = get(&router, "/api/v1/assets").await;
        let assets: Vec<Asset> = serde_json::from_slice(&body).unwrap();
        assert_eq!(assets.len(), 10);
        let asset3 = assets.iter().find(|a| a.id == "asset3").unwrap();
        assert_eq!(asset3.color, "teal");
        assert!(asset3.updated_at > asset3.created_at);

        // Seeding twice collides with the existing ids.
        let (status, _) = send(&router, "POST", "/api/v1/ledger/init", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(metrics.transactions_failed_total.get(), 1);
    }
}
