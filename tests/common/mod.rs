//! Mock portal API for integration tests
//!
//! A small axum server speaking the portal's envelope format. It mints JWT
//! access tokens, answers `TOKEN_EXPIRED` for tokens it has expired, and
//! counts refresh and logout calls so tests can assert on them.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use aula::config::ApiConfig;
use aula::storage::{KeyValueStore, MemoryStore};
use aula::{ApiClient, AuthManager};

pub const STUDENT_EMAIL: &str = "a@x.com";
pub const STUDENT_PASSWORD: &str = "Secret123!";
pub const ADMIN_EMAIL: &str = "admin@x.com";
pub const ADMIN_PASSWORD: &str = "Admin123!";

const SIGNING_SECRET: &[u8] = b"mock-portal-secret";
const VIDEO_COUNT: usize = 25;

#[derive(Debug, Serialize)]
struct TokenClaims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
    jti: String,
}

#[derive(Debug, Clone)]
struct Account {
    user: Value,
    password: String,
}

#[derive(Default)]
struct Tokens {
    /// access token -> email
    access: HashMap<String, String>,
    expired: HashSet<String>,
    /// refresh token -> email
    refresh: HashMap<String, String>,
    last_access: Option<String>,
}

#[derive(Default)]
pub struct MockState {
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<Tokens>,
    ratings: Mutex<HashMap<String, u8>>,
    seen_tokens: Mutex<Vec<String>>,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    refresh_delay_ms: AtomicU64,
    fail_refresh: AtomicBool,
    fail_logout: AtomicBool,
}

impl MockState {
    fn new() -> Self {
        let state = Self::default();
        {
            let mut accounts = state.accounts.lock().unwrap();
            accounts.insert(
                STUDENT_EMAIL.to_string(),
                Account {
                    user: user_json("u-1", "Ana", STUDENT_EMAIL, "Estudiante"),
                    password: STUDENT_PASSWORD.to_string(),
                },
            );
            accounts.insert(
                ADMIN_EMAIL.to_string(),
                Account {
                    user: user_json("u-2", "Admin", ADMIN_EMAIL, "Administrador"),
                    password: ADMIN_PASSWORD.to_string(),
                },
            );
        }
        state
    }

    fn issue_tokens(&self, email: &str) -> (String, String) {
        let accounts = self.accounts.lock().unwrap();
        let user = &accounts[email].user;
        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            sub: user["id"].as_str().unwrap_or_default().to_string(),
            role: user["role"].as_str().unwrap_or_default().to_string(),
            iat: now,
            exp: now + 900,
            jti: uuid::Uuid::new_v4().to_string(),
        };
        let access = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SIGNING_SECRET),
        )
        .expect("Failed to sign token");
        let refresh = format!("refresh-{}", uuid::Uuid::new_v4());

        let mut tokens = self.tokens.lock().unwrap();
        tokens.access.insert(access.clone(), email.to_string());
        tokens.refresh.insert(refresh.clone(), email.to_string());
        tokens.last_access = Some(access.clone());
        (access, refresh)
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<String, Response> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);

        let Some(token) = token else {
            return Err(failure(StatusCode::UNAUTHORIZED, "Authentication required", "NO_TOKEN"));
        };
        self.seen_tokens.lock().unwrap().push(token.clone());

        let tokens = self.tokens.lock().unwrap();
        if let Some(email) = tokens.access.get(&token) {
            return Ok(email.clone());
        }
        if tokens.expired.contains(&token) {
            return Err(failure(StatusCode::UNAUTHORIZED, "Token expired", "TOKEN_EXPIRED"));
        }
        Err(failure(StatusCode::UNAUTHORIZED, "Invalid token", "INVALID_TOKEN"))
    }

    fn user(&self, email: &str) -> Value {
        self.accounts.lock().unwrap()[email].user.clone()
    }
}

fn user_json(id: &str, name: &str, email: &str, role: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": email,
        "role": role,
        "active": true,
        "createdAt": "2024-01-15T09:00:00Z"
    })
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn ok_page(items: Vec<Value>, page: usize, limit: usize, total: usize) -> Response {
    let total_pages = total.div_ceil(limit.max(1));
    Json(json!({
        "success": true,
        "data": items,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "totalPages": total_pages
        }
    }))
    .into_response()
}

fn failure(status: StatusCode, message: &str, code: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "message": message, "errorCode": code })),
    )
        .into_response()
}

fn paging(query: &HashMap<String, String>) -> (usize, usize) {
    let page = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    (page, limit)
}

type AppState = Arc<MockState>;

async fn login(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let valid = state
        .accounts
        .lock()
        .unwrap()
        .get(email)
        .is_some_and(|a| a.password == password);
    if !valid {
        return failure(StatusCode::UNAUTHORIZED, "Invalid credentials", "INVALID_CREDENTIALS");
    }

    let (access, refresh) = state.issue_tokens(email);
    ok(json!({
        "user": state.user(email),
        "accessToken": access,
        "refreshToken": refresh
    }))
}

async fn register(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    {
        let mut accounts = state.accounts.lock().unwrap();
        if accounts.contains_key(&email) {
            return failure(StatusCode::CONFLICT, "Email already registered", "EMAIL_TAKEN");
        }
        let id = format!("u-{}", accounts.len() + 1);
        // New accounts always start as students
        accounts.insert(
            email.clone(),
            Account {
                user: user_json(&id, &name, &email, "Estudiante"),
                password,
            },
        );
    }

    let (access, refresh) = state.issue_tokens(&email);
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {
                "user": state.user(&email),
                "accessToken": access,
                "refreshToken": refresh
            }
        })),
    )
        .into_response()
}

async fn refresh(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if state.fail_refresh.load(Ordering::SeqCst) {
        return failure(StatusCode::UNAUTHORIZED, "Refresh token revoked", "INVALID_REFRESH_TOKEN");
    }

    let presented = body["refreshToken"].as_str().unwrap_or_default();
    let email = state.tokens.lock().unwrap().refresh.remove(presented);
    let Some(email) = email else {
        return failure(StatusCode::UNAUTHORIZED, "Invalid refresh token", "INVALID_REFRESH_TOKEN");
    };

    let (access, refresh) = state.issue_tokens(&email);
    ok(json!({ "accessToken": access, "refreshToken": refresh }))
}

async fn logout(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_logout.load(Ordering::SeqCst) {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable", "INTERNAL");
    }

    if let Some(token) = body["refreshToken"].as_str() {
        state.tokens.lock().unwrap().refresh.remove(token);
    }
    Json(json!({ "success": true, "message": "Logged out" })).into_response()
}

async fn logout_all(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    let email = match state.authorize(&headers) {
        Ok(email) => email,
        Err(response) => return response,
    };

    let mut tokens = state.tokens.lock().unwrap();
    tokens.access.retain(|_, owner| *owner != email);
    tokens.refresh.retain(|_, owner| *owner != email);
    Json(json!({ "success": true, "message": "All sessions revoked" })).into_response()
}

async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let email = match state.authorize(&headers) {
        Ok(email) => email,
        Err(response) => return response,
    };

    let mut accounts = state.accounts.lock().unwrap();
    let Some(account) = accounts.get_mut(&email) else {
        return failure(StatusCode::NOT_FOUND, "User not found", "NOT_FOUND");
    };
    if body["currentPassword"].as_str() != Some(account.password.as_str()) {
        return failure(StatusCode::BAD_REQUEST, "Current password is incorrect", "INVALID_PASSWORD");
    }
    account.password = body["newPassword"].as_str().unwrap_or_default().to_string();
    Json(json!({ "success": true, "message": "Password updated" })).into_response()
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.authorize(&headers) {
        Ok(email) => ok(state.user(&email)),
        Err(response) => response,
    }
}

fn video_json(n: usize) -> Value {
    json!({
        "id": format!("v-{}", n),
        "title": format!("Lesson {}", n),
        "description": "Introductory physics",
        "videoUrl": format!("/media/v-{}.mp4", n),
        "author": { "id": "u-2", "name": "Admin" },
        "views": n * 10,
        "averageRating": 4.5,
        "createdAt": "2024-02-01T12:00:00Z"
    })
}

async fn list_videos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let (page, limit) = paging(&query);
    let search = query.get("search").map(|s| s.to_lowercase());
    let all: Vec<Value> = (1..=VIDEO_COUNT)
        .map(video_json)
        .filter(|v| match &search {
            Some(term) => v["title"]
                .as_str()
                .is_some_and(|t| t.to_lowercase().contains(term)),
            None => true,
        })
        .collect();

    let total = all.len();
    let items = all.into_iter().skip((page - 1) * limit).take(limit).collect();
    ok_page(items, page, limit, total)
}

async fn get_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let n = id
        .strip_prefix("v-")
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| (1..=VIDEO_COUNT).contains(n));
    match n {
        Some(n) => ok(video_json(n)),
        None => failure(StatusCode::NOT_FOUND, "Video not found", "NOT_FOUND"),
    }
}

fn comment_json(id: &str, parent: Option<&str>, minute: u32, replies: u32) -> Value {
    json!({
        "id": id,
        "videoId": "v-1",
        "parentId": parent,
        "content": format!("Comment {}", id),
        "author": { "id": "u-1", "name": "Ana" },
        "repliesCount": replies,
        "createdAt": format!("2024-03-01T10:{:02}:00Z", minute)
    })
}

async fn video_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(_video_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let (page, limit) = paging(&query);
    // Newest first, as the portal lists them
    let roots = vec![
        comment_json("c2", None, 5, 0),
        comment_json("c1", None, 1, 2),
    ];
    ok_page(roots, page, limit, 2)
}

async fn comment_replies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let (page, limit) = paging(&query);
    let replies = match id.as_str() {
        "c1" => vec![
            comment_json("c1-r1", Some("c1"), 2, 1),
            comment_json("c1-r2", Some("c1"), 3, 0),
        ],
        "c1-r1" => vec![comment_json("c1-r1-a", Some("c1-r1"), 4, 0)],
        _ => Vec::new(),
    };
    let total = replies.len();
    let items = replies.into_iter().skip((page - 1) * limit).take(limit).collect();
    ok_page(items, page, limit, total)
}

async fn post_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let (page, limit) = paging(&query);
    let comment = |id: &str, parent: Option<&str>, minute: u32| {
        json!({
            "id": id,
            "postId": post_id,
            "parentId": parent,
            "content": format!("Post comment {}", id),
            "createdAt": format!("2024-04-02T08:{:02}:00Z", minute)
        })
    };
    // Flat, replies before their parents
    let items = vec![
        comment("pc2", Some("pc1"), 3),
        comment("pc3", None, 4),
        comment("pc1", None, 1),
    ];
    ok_page(items, page, limit, 3)
}

async fn rate_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let rating = body["rating"].as_u64().unwrap_or_default() as u8;
    if !(1..=5).contains(&rating) {
        return failure(StatusCode::BAD_REQUEST, "Rating must be 1-5", "VALIDATION_ERROR");
    }
    state.ratings.lock().unwrap().insert(id.clone(), rating);
    ok(json!({ "id": format!("r-{}", id), "videoId": id, "userId": "u-1", "rating": rating }))
}

async fn my_rating(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    match state.ratings.lock().unwrap().get(&id) {
        Some(rating) => ok(json!({ "videoId": id, "rating": rating })),
        None => failure(StatusCode::NOT_FOUND, "No rating yet", "NOT_FOUND"),
    }
}

async fn rating_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    match state.ratings.lock().unwrap().get(&id) {
        Some(rating) => ok(json!({ "average": rating, "count": 1 })),
        None => ok(json!({ "average": 0.0, "count": 0 })),
    }
}

async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let mime = field.content_type().unwrap_or("application/octet-stream").to_string();
        let Ok(bytes) = field.bytes().await else {
            return failure(StatusCode::BAD_REQUEST, "Unreadable upload", "UPLOAD_FAILED");
        };
        return ok(json!({
            "url": format!("/uploads/images/{}", filename),
            "filename": filename,
            "size": bytes.len(),
            "mimeType": mime
        }));
    }

    failure(StatusCode::BAD_REQUEST, "No image field", "UPLOAD_FAILED")
}

async fn user_badges(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let badges = if user_id == "u-1" {
        vec![json!({
            "id": "b-1",
            "name": "First Comment",
            "icon": "💬",
            "awardedAt": "2024-03-01T10:01:00Z"
        })]
    } else {
        Vec::new()
    };
    ok(Value::Array(badges))
}

async fn categories(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    ok(json!([
        { "id": "cat-1", "name": "Física", "videoCount": 12 },
        { "id": "cat-2", "name": "Química", "description": "Lab sessions" }
    ]))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/logout-all", post(logout_all))
        .route("/api/auth/change-password", put(change_password))
        .route("/api/users/me", get(me))
        .route("/api/videos", get(list_videos))
        .route("/api/videos/{id}", get(get_video))
        .route("/api/videos/{id}/ratings", post(rate_video).get(rating_summary))
        .route("/api/videos/{id}/ratings/me", get(my_rating))
        .route("/api/comments/video/{id}", get(video_comments))
        .route("/api/comments/{id}/replies", get(comment_replies))
        .route("/api/post-comments/post/{id}", get(post_comments))
        .route("/api/uploads/image", post(upload_image))
        .route("/api/badges/user/{id}", get(user_badges))
        .route("/api/categories", get(categories))
        .with_state(state)
}

/// A running mock portal bound to an ephemeral port
pub struct MockPortal {
    pub base_url: String,
    state: AppState,
    handle: JoinHandle<()>,
}

impl MockPortal {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::new());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock portal");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let app = router(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock portal crashed");
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
            handle,
        }
    }

    pub fn client(&self) -> Arc<ApiClient> {
        self.client_with_store(Arc::new(MemoryStore::new()))
    }

    pub fn client_with_store(&self, store: Arc<dyn KeyValueStore>) -> Arc<ApiClient> {
        Arc::new(
            ApiClient::new(ApiConfig::new(&self.base_url), store).expect("Failed to build client"),
        )
    }

    pub fn auth_manager(&self) -> AuthManager {
        AuthManager::new(self.client())
    }

    /// Mint a session directly, bypassing login
    pub fn issue_session(&self, email: &str) -> (String, String) {
        self.state.issue_tokens(email)
    }

    /// Expire every access token issued so far; refresh tokens stay valid
    pub fn expire_access_tokens(&self) {
        let mut tokens = self.state.tokens.lock().unwrap();
        let expired: Vec<String> = tokens.access.drain().map(|(token, _)| token).collect();
        tokens.expired.extend(expired);
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        self.state
            .refresh_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fail_refresh(&self, fail: bool) {
        self.state.fail_refresh.store(fail, Ordering::SeqCst);
    }

    pub fn fail_logout(&self, fail: bool) {
        self.state.fail_logout.store(fail, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.state.logout_calls.load(Ordering::SeqCst)
    }

    pub fn last_issued_access(&self) -> Option<String> {
        self.state.tokens.lock().unwrap().last_access.clone()
    }

    pub fn refresh_token_valid(&self, token: &str) -> bool {
        self.state.tokens.lock().unwrap().refresh.contains_key(token)
    }

    /// Bearer tokens presented to protected endpoints, in arrival order
    pub fn seen_tokens(&self) -> Vec<String> {
        self.state.seen_tokens.lock().unwrap().clone()
    }
}

impl Drop for MockPortal {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
