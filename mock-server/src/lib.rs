//! In-memory stand-in for the ERCx API.
//!
//! Serves the subset of routes the client talks to, backed by a seeded
//! `Store` behind a `RwLock`. Every route requires the `X-API-KEY` header to
//! match the key the app was built with.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const TETHER_ADDRESS: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
pub const USER_ID: &str = "101185369";
pub const SHARED_LIST_ID: &str = "stablecoins-shared";

const LEVELS: [&str; 7] = [
    "abi",
    "minimal",
    "recommended",
    "desirable",
    "addon",
    "fingerprint",
    "all",
];
const PERMISSIONS: [&str; 3] = ["READ", "WRITE", "ADMIN"];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub id: String,
    pub name: String,
    pub address: String,
    pub symbol: String,
    pub decimals: String,
    pub total_supply: String,
    pub network: String,
}

/// A token as referenced from a list: address plus numeric chain id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRef {
    pub address: String,
    pub network: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenList {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner: String,
}

#[derive(Deserialize)]
pub struct CreateTokenList {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub user_id: String,
    pub permission: String,
}

#[derive(Deserialize)]
pub struct StandardQuery {
    pub standard: Option<String>,
}

#[derive(Deserialize)]
pub struct PropertyTestQuery {
    pub standard: Option<String>,
    pub level: Option<String>,
}

#[derive(Default)]
struct ListEntry {
    list: Option<TokenList>,
    tokens: Vec<TokenRef>,
    users: BTreeMap<String, String>,
}

pub struct Store {
    tokens: Vec<TokenInfo>,
    lists: HashMap<String, ListEntry>,
    bookmarks: Vec<TokenRef>,
}

impl Store {
    fn seeded() -> Self {
        let tether = TokenInfo {
            id: "1".to_string(),
            name: "Tether USD".to_string(),
            address: TETHER_ADDRESS.to_string(),
            symbol: "USDT".to_string(),
            decimals: "6".to_string(),
            total_supply: "39823315849942880".to_string(),
            network: "1".to_string(),
        };
        let shared = ListEntry {
            list: Some(TokenList {
                id: SHARED_LIST_ID.to_string(),
                name: "Stablecoins".to_string(),
                description: "Shared by another user".to_string(),
                owner: "42".to_string(),
            }),
            tokens: vec![TokenRef {
                address: TETHER_ADDRESS.to_string(),
                network: 1,
            }],
            users: BTreeMap::from([(USER_ID.to_string(), "READ".to_string())]),
        };
        Self {
            bookmarks: vec![TokenRef {
                address: tether.address.clone(),
                network: 1,
            }],
            tokens: vec![tether],
            lists: HashMap::from([(SHARED_LIST_ID.to_string(), shared)]),
        }
    }

    fn token(&self, network: &str, address: &str) -> Option<&TokenInfo> {
        self.tokens
            .iter()
            .find(|t| t.network == network && t.address.eq_ignore_ascii_case(address))
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
struct AppState {
    api_key: Arc<str>,
    db: Db,
}

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        db: Arc::new(RwLock::new(Store::seeded())),
    };
    Router::new()
        .route("/tokens/{network}/{address}", get(token_info))
        .route("/tokens/{network}/{address}/report", get(token_report))
        .route("/tokens/{network}/{address}/levels/{level}", get(token_evaluations))
        .route("/tokens/{network}/{address}/tests/{name}", get(token_test))
        .route("/property-tests", get(property_tests))
        .route("/user", get(my_info))
        .route("/user/token-lists", get(my_token_lists))
        .route("/user/shared-token-lists", get(shared_token_lists))
        .route("/user/bookmarked-tokens", get(bookmarked_tokens))
        .route("/user/bookmarked-tokens-count", get(bookmarked_tokens_count))
        .route("/token-lists", axum::routing::post(create_token_list))
        .route("/token-lists/{id}", get(token_list_info))
        .route(
            "/token-lists/{id}/tokens",
            get(tokens_of_list).post(add_token).delete(remove_token),
        )
        .route("/token-lists/{id}/tokens-count", get(tokens_count_of_list))
        .route("/token-lists/{id}/users", get(users_of_list).post(share_list))
        .route(
            "/token-lists/{id}/users/{user_id}",
            axum::routing::delete(unshare_list),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock ERCx API listening");
    }
    axum::serve(listener, app(api_key)).await
}

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if presented != Some(&*state.api_key) {
        debug!(path = %request.uri().path(), "rejected request without valid api key");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}

// --- tokens ---

async fn token_info(
    State(state): State<AppState>,
    Path((network, address)): Path<(String, String)>,
) -> Result<Json<TokenInfo>, StatusCode> {
    let store = state.db.read().await;
    store
        .token(&network, &address)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn token_report(
    State(state): State<AppState>,
    Path((network, address)): Path<(String, String)>,
) -> Result<Json<Value>, StatusCode> {
    let store = state.db.read().await;
    let token = store.token(&network, &address).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({
        "token": token,
        "standard": "ERC20",
        "levels": LEVELS.iter().map(|l| json!({ "level": l, "passed": 10, "failed": 0 })).collect::<Vec<_>>(),
    })))
}

async fn token_evaluations(
    State(state): State<AppState>,
    Path((network, address, level)): Path<(String, String, String)>,
    Query(query): Query<StandardQuery>,
) -> Result<Json<Value>, StatusCode> {
    if !LEVELS.contains(&level.as_str()) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let store = state.db.read().await;
    store.token(&network, &address).ok_or(StatusCode::NOT_FOUND)?;
    let standard = query.standard.unwrap_or_else(|| "ERC20".to_string());
    Ok(Json(json!([
        { "test": "testTransferSuccess", "level": level, "standard": standard, "result": "passed" },
        { "test": "testApproveSuccess", "level": level, "standard": standard, "result": "passed" },
    ])))
}

async fn token_test(
    State(state): State<AppState>,
    Path((network, address, name)): Path<(String, String, String)>,
    Query(query): Query<StandardQuery>,
) -> Result<Json<Value>, StatusCode> {
    let store = state.db.read().await;
    store.token(&network, &address).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({
        "test": name,
        "standard": query.standard.unwrap_or_else(|| "ERC20".to_string()),
        "result": "passed",
    })))
}

async fn property_tests(Query(query): Query<PropertyTestQuery>) -> Result<Json<Value>, StatusCode> {
    let standard = query.standard.unwrap_or_else(|| "ERC20".to_string());
    if standard != "ERC20" {
        return Err(StatusCode::BAD_REQUEST);
    }
    let catalog = [
        ("testTransferSuccess", "minimal"),
        ("testApproveSuccess", "minimal"),
        ("testPositiveApprovalEventEmission", "recommended"),
        ("testNoFeeOnTransfer", "desirable"),
        ("testBurnable", "addon"),
    ];
    let tests: Vec<Value> = catalog
        .iter()
        .filter(|(_, level)| query.level.as_deref().map_or(true, |l| l == "all" || l == *level))
        .map(|(name, level)| json!({ "name": name, "level": level, "standard": standard }))
        .collect();
    Ok(Json(Value::Array(tests)))
}

// --- user ---

async fn my_info() -> Json<Value> {
    Json(json!({ "id": USER_ID, "name": "Mock User" }))
}

async fn my_token_lists(State(state): State<AppState>) -> Json<Vec<TokenList>> {
    let store = state.db.read().await;
    Json(
        store
            .lists
            .values()
            .filter_map(|e| e.list.clone())
            .filter(|l| l.owner == USER_ID)
            .collect(),
    )
}

async fn shared_token_lists(State(state): State<AppState>) -> Json<Vec<TokenList>> {
    let store = state.db.read().await;
    Json(
        store
            .lists
            .values()
            .filter(|e| e.users.contains_key(USER_ID))
            .filter_map(|e| e.list.clone())
            .filter(|l| l.owner != USER_ID)
            .collect(),
    )
}

async fn bookmarked_tokens(State(state): State<AppState>) -> Json<Vec<TokenInfo>> {
    let store = state.db.read().await;
    Json(
        store
            .bookmarks
            .iter()
            .filter_map(|b| store.token(&b.network.to_string(), &b.address).cloned())
            .collect(),
    )
}

async fn bookmarked_tokens_count(State(state): State<AppState>) -> Json<Value> {
    let store = state.db.read().await;
    Json(json!({ "count": store.bookmarks.len() }))
}

// --- token lists ---

async fn create_token_list(
    State(state): State<AppState>,
    Json(input): Json<CreateTokenList>,
) -> (StatusCode, Json<TokenList>) {
    let list = TokenList {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        description: input.description,
        owner: USER_ID.to_string(),
    };
    let entry = ListEntry {
        list: Some(list.clone()),
        users: BTreeMap::from([(USER_ID.to_string(), "ADMIN".to_string())]),
        ..ListEntry::default()
    };
    state.db.write().await.lists.insert(list.id.clone(), entry);
    (StatusCode::CREATED, Json(list))
}

async fn token_list_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TokenList>, StatusCode> {
    let store = state.db.read().await;
    store
        .lists
        .get(&id)
        .and_then(|e| e.list.clone())
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn tokens_of_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TokenRef>>, StatusCode> {
    let store = state.db.read().await;
    let entry = store.lists.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(entry.tokens.clone()))
}

async fn tokens_count_of_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let store = state.db.read().await;
    let entry = store.lists.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({ "count": entry.tokens.len() })))
}

async fn add_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(token): Json<TokenRef>,
) -> Result<Json<bool>, StatusCode> {
    let mut store = state.db.write().await;
    let entry = store.lists.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if entry.tokens.contains(&token) {
        return Ok(Json(false));
    }
    entry.tokens.push(token);
    Ok(Json(true))
}

async fn remove_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(token): Json<TokenRef>,
) -> Result<Json<bool>, StatusCode> {
    let mut store = state.db.write().await;
    let entry = store.lists.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let before = entry.tokens.len();
    entry.tokens.retain(|t| t != &token);
    Ok(Json(entry.tokens.len() != before))
}

async fn users_of_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ShareRequest>>, StatusCode> {
    let store = state.db.read().await;
    let entry = store.lists.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(
        entry
            .users
            .iter()
            .map(|(user_id, permission)| ShareRequest {
                user_id: user_id.clone(),
                permission: permission.clone(),
            })
            .collect(),
    ))
}

async fn share_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(share): Json<ShareRequest>,
) -> Result<(StatusCode, Json<ShareRequest>), StatusCode> {
    if !PERMISSIONS.contains(&share.permission.as_str()) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut store = state.db.write().await;
    let entry = store.lists.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    entry
        .users
        .insert(share.user_id.clone(), share.permission.clone());
    Ok((StatusCode::CREATED, Json(share)))
}

async fn unshare_list(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Json<bool>, StatusCode> {
    let mut store = state.db.write().await;
    let entry = store.lists.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(entry.users.remove(&user_id).is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_info_serializes_camel_case() {
        let store = Store::seeded();
        let json = serde_json::to_value(store.token("1", TETHER_ADDRESS).unwrap()).unwrap();
        assert_eq!(json["symbol"], "USDT");
        assert_eq!(json["totalSupply"], "39823315849942880");
        assert!(json.get("total_supply").is_none());
    }

    #[test]
    fn token_lookup_ignores_address_case() {
        let store = Store::seeded();
        assert!(store.token("1", &TETHER_ADDRESS.to_lowercase()).is_some());
        assert!(store.token("5", TETHER_ADDRESS).is_none());
    }

    #[test]
    fn create_token_list_defaults_description() {
        let input: CreateTokenList = serde_json::from_str(r#"{"name":"Mine"}"#).unwrap();
        assert_eq!(input.name, "Mine");
        assert!(input.description.is_empty());
    }

    #[test]
    fn token_ref_requires_numeric_network() {
        let ok: Result<TokenRef, _> =
            serde_json::from_str(r#"{"address":"0xabc","network":1}"#);
        assert!(ok.is_ok());
        let bad: Result<TokenRef, _> =
            serde_json::from_str(r#"{"address":"0xabc","network":"mainnet"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn share_request_uses_camel_case() {
        let share: ShareRequest =
            serde_json::from_str(r#"{"userId":"7","permission":"WRITE"}"#).unwrap();
        assert_eq!(share.user_id, "7");
        assert_eq!(share.permission, "WRITE");
    }
}
