use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

pub const ERROR_DOCS_URL: &str = "https://mailchimp.com/developer/marketing/docs/errors/";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct List {
    pub id: String,
    pub name: String,
    pub member_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: String,
    pub list_id: String,
    pub email_address: String,
    pub status: String,
    pub language: String,
}

/// Mailchimp-style error body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub instance: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Deserialize)]
pub struct CreateList {
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateList {
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMember {
    pub email_address: Option<String>,
    pub status: Option<String>,
    pub language: Option<String>,
}

#[derive(Deserialize)]
pub struct Paging {
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_count() -> usize {
    10
}

#[derive(Default)]
struct Store {
    lists: Vec<List>,
    members: Vec<Member>,
}

#[derive(Clone)]
struct AppState {
    api_key: Arc<str>,
    store: Arc<RwLock<Store>>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<Problem>)>;

/// Router serving `/3.0/...`, accepting Basic auth with `api_key` as password.
pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        store: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route("/3.0/", get(root))
        .route("/3.0/ping", get(ping))
        .route("/3.0/lists", get(list_lists).post(create_list))
        .route(
            "/3.0/lists/{list_id}",
            get(get_list).patch(update_list).delete(delete_list),
        )
        .route(
            "/3.0/lists/{list_id}/members",
            get(list_members).post(add_member),
        )
        .route("/3.0/lists/{list_id}/members/{member_id}", get(get_member))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .fallback(fallback)
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

fn problem(status: StatusCode, title: &str, detail: &str) -> (StatusCode, Json<Problem>) {
    (
        status,
        Json(Problem {
            kind: ERROR_DOCS_URL.to_string(),
            title: title.to_string(),
            status: status.as_u16(),
            detail: detail.to_string(),
            instance: Uuid::new_v4().to_string(),
            errors: Vec::new(),
        }),
    )
}

fn not_found() -> (StatusCode, Json<Problem>) {
    problem(
        StatusCode::NOT_FOUND,
        "Resource Not Found",
        "The requested resource could not be found.",
    )
}

fn invalid_resource(field: &str, message: &str) -> (StatusCode, Json<Problem>) {
    let (status, Json(mut body)) = problem(
        StatusCode::BAD_REQUEST,
        "Invalid Resource",
        "The resource submitted could not be validated. For field-specific details, see the 'errors' array.",
    );
    body.errors.push(FieldError {
        field: field.to_string(),
        message: message.to_string(),
    });
    (status, Json(body))
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .and_then(|pair| pair.split_once(':').map(|(_, key)| key == &*state.api_key))
        .unwrap_or(false);

    if !authorized {
        warn!(uri = %request.uri(), "rejected request without a valid api key");
        return problem(
            StatusCode::UNAUTHORIZED,
            "API Key Invalid",
            "Your API key may be invalid, or you've attempted to access the wrong datacenter.",
        )
        .into_response();
    }
    next.run(request).await
}

async fn fallback() -> (StatusCode, Json<Problem>) {
    not_found()
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    Json(json!({
        "account_id": "mock-account",
        "account_name": "Mock Account",
        "total_subscribers": store.members.len(),
    }))
}

async fn ping() -> Json<Value> {
    Json(json!({ "health_status": "Everything's Chimpy!" }))
}

async fn list_lists(State(state): State<AppState>, Query(paging): Query<Paging>) -> Json<Value> {
    let store = state.store.read().await;
    let page: Vec<&List> = store
        .lists
        .iter()
        .skip(paging.offset)
        .take(paging.count)
        .collect();
    Json(json!({ "lists": page, "total_items": store.lists.len() }))
}

async fn create_list(
    State(state): State<AppState>,
    Json(input): Json<CreateList>,
) -> ApiResult<Json<List>> {
    let name = input
        .name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| invalid_resource("name", "This value should not be blank."))?;
    let list = List {
        id: Uuid::new_v4().simple().to_string()[..10].to_string(),
        name,
        member_count: 0,
    };
    debug!(list_id = %list.id, "created list");
    state.store.write().await.lists.push(list.clone());
    Ok(Json(list))
}

async fn get_list(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
) -> ApiResult<Json<List>> {
    let store = state.store.read().await;
    store
        .lists
        .iter()
        .find(|list| list.id == list_id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn update_list(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    Json(input): Json<UpdateList>,
) -> ApiResult<Json<List>> {
    let mut store = state.store.write().await;
    let list = store
        .lists
        .iter_mut()
        .find(|list| list.id == list_id)
        .ok_or_else(not_found)?;
    if let Some(name) = input.name {
        list.name = name;
    }
    Ok(Json(list.clone()))
}

async fn delete_list(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut store = state.store.write().await;
    let before = store.lists.len();
    store.lists.retain(|list| list.id != list_id);
    if store.lists.len() == before {
        return Err(not_found());
    }
    store.members.retain(|member| member.list_id != list_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_members(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    if !store.lists.iter().any(|list| list.id == list_id) {
        return Err(not_found());
    }
    let members: Vec<&Member> = store
        .members
        .iter()
        .filter(|member| member.list_id == list_id)
        .collect();
    Ok(Json(json!({
        "list_id": list_id,
        "total_items": members.len(),
        "members": members,
    })))
}

async fn add_member(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<AddMember>,
) -> ApiResult<Json<Member>> {
    let email = input
        .email_address
        .filter(|email| email.contains('@'))
        .ok_or_else(|| invalid_resource("email_address", "Please provide a valid email address."))?;

    let mut store = state.store.write().await;
    let list_index = store
        .lists
        .iter()
        .position(|list| list.id == list_id)
        .ok_or_else(not_found)?;

    if store
        .members
        .iter()
        .any(|member| member.list_id == list_id && member.email_address.eq_ignore_ascii_case(&email))
    {
        return Err(problem(
            StatusCode::BAD_REQUEST,
            "Member Exists",
            &format!("{email} is already a list member."),
        ));
    }

    let language = input
        .language
        .or_else(|| {
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        })
        .unwrap_or_default();

    let member = Member {
        id: Uuid::new_v4().simple().to_string(),
        list_id,
        email_address: email,
        status: input.status.unwrap_or_else(|| "subscribed".to_string()),
        language,
    };
    store.members.push(member.clone());
    store.lists[list_index].member_count += 1;
    Ok(Json(member))
}

async fn get_member(
    State(state): State<AppState>,
    Path((list_id, member_id)): Path<(String, String)>,
) -> ApiResult<Json<Member>> {
    let store = state.store.read().await;
    store
        .members
        .iter()
        .find(|member| member.list_id == list_id && member.id == member_id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}
