//! Authenticated HTTP client for the portal API

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::envelope::{Envelope, Page};
use super::events::{ClearReason, SessionEvent, SessionEvents};
use super::refresh::{RefreshCoordinator, RefreshOutcome};
use super::request::{ApiRequest, FormField};
use crate::config::ApiConfig;
use crate::error::{ApiError, Error, Result};
use crate::storage::{KeyValueStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshPayload {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// HTTP client that attaches the stored access token to every request and
/// transparently refreshes it when the server reports `TOKEN_EXPIRED`.
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
    store: Arc<dyn KeyValueStore>,
    refresh: RefreshCoordinator,
    events: SessionEvents,
}

impl ApiClient {
    pub fn new(config: ApiConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            config,
            store,
            refresh: RefreshCoordinator::new(),
            events: SessionEvents::new(),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    // Token state

    pub fn access_token(&self) -> Result<Option<String>> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    pub fn has_session(&self) -> bool {
        matches!(self.access_token(), Ok(Some(_)))
    }

    /// Store a token pair. `refresh` is left untouched when `None`.
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, access)?;
        if let Some(refresh) = refresh {
            self.store.set(REFRESH_TOKEN_KEY, refresh)?;
        }
        Ok(())
    }

    /// Remove both tokens and tell subscribers why
    pub fn clear_session(&self, reason: ClearReason) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to remove {} from storage: {}", key, e);
            }
        }
        warn!("Session cleared ({:?})", reason);
        self.events.emit(SessionEvent::SessionCleared(reason));
    }

    fn expire_session(&self, reason: ClearReason) {
        self.clear_session(reason);
        self.events.emit(SessionEvent::RedirectToLogin);
    }

    // Convenience verbs

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.fetch(ApiRequest::get(path)).await
    }

    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.fetch(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.fetch(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.fetch(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.fetch(ApiRequest::delete(path)).await
    }

    pub async fn get_with_query<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<R> {
        let request = ApiRequest::get(path)
            .queries(query.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self.fetch(request).await
    }

    /// POST a multipart form. The fields are kept so the upload can be replayed
    /// after a token refresh.
    pub async fn upload<R: DeserializeOwned>(&self, path: &str, fields: Vec<FormField>) -> Result<R> {
        self.fetch(ApiRequest::post(path).multipart(fields)).await
    }

    /// Issue a request and return its `data` payload
    pub async fn fetch<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        let (status, envelope) = self.execute::<R>(request).await?;
        envelope.into_data(status)
    }

    /// Issue a request against a paginated list endpoint
    pub async fn fetch_page<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<Page<Vec<R>>> {
        let (status, envelope) = self.execute::<Vec<R>>(request).await?;
        envelope.into_page(status)
    }

    /// Send a request without a bearer token and without 401 interception.
    /// Used for login, registration and refresh.
    pub async fn send_public<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        let request_id = Uuid::new_v4().to_string();
        let response = self.dispatch(&request, None, &request_id).await?;
        let (status, envelope) = decode_envelope::<R>(response).await?;
        envelope.into_data(status)
    }

    /// Issue an authenticated request.
    ///
    /// A 401 carrying `TOKEN_EXPIRED` sends the request through the refresh
    /// coordinator and replays it once with the new token. Any other 401, or a
    /// 401 on the replay, ends the session.
    pub async fn execute<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<(StatusCode, Envelope<R>)> {
        let request_id = Uuid::new_v4().to_string();
        let token = self.access_token()?;

        let response = self.dispatch(&request, token.as_deref(), &request_id).await?;
        let err = match decode_envelope::<R>(response).await {
            Err(Error::Api(err)) if err.is_unauthorized() => err,
            other => return other,
        };

        if !err.is_token_expired() {
            self.expire_session(ClearReason::InvalidToken);
            return Err(Error::Api(err));
        }

        debug!(request_id = %request_id, "Access token expired, waiting for refresh");
        let fresh = self.refresh_access_token(token.as_deref()).await?;

        let response = self.dispatch(&request, Some(&fresh), &request_id).await?;
        match decode_envelope::<R>(response).await {
            Err(Error::Api(err)) if err.is_unauthorized() => {
                self.expire_session(ClearReason::InvalidToken);
                Err(Error::Api(err))
            }
            other => other,
        }
    }

    /// Obtain a fresh access token, sharing any refresh already in flight.
    ///
    /// `stale` is the token the failed request carried. If storage already
    /// holds a different one, a refresh finished between that request being
    /// sent and its 401 arriving, and the stored token is reused.
    pub async fn refresh_access_token(&self, stale: Option<&str>) -> Result<String> {
        self.refresh
            .run(|| self.perform_refresh(stale))
            .await
            .map_err(Error::Api)
    }

    async fn perform_refresh(&self, stale: Option<&str>) -> RefreshOutcome {
        match self.access_token() {
            Ok(Some(current)) if Some(current.as_str()) != stale => {
                debug!("Stored access token already replaced, skipping refresh");
                return Ok(current);
            }
            Ok(_) => {}
            Err(e) => return Err(e.to_api_error()),
        }

        let refresh_token = match self.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                // Both tokens gone means an earlier failure already ended the
                // session and announced it.
                if self.has_session() {
                    warn!("Access token expired and no refresh token is stored");
                    self.expire_session(ClearReason::RefreshFailed);
                } else {
                    debug!("Session already cleared, not refreshing");
                }
                return Err(ApiError::missing_refresh_token());
            }
            Err(e) => return Err(e.to_api_error()),
        };

        info!("Refreshing access token");
        let result = async {
            let request = ApiRequest::post(REFRESH_PATH).json(&RefreshRequest {
                refresh_token: &refresh_token,
            })?;
            let payload: RefreshPayload = self.send_public(request).await?;
            self.set_tokens(&payload.access_token, payload.refresh_token.as_deref())?;
            Ok::<_, Error>(payload.access_token)
        }
        .await;

        match result {
            Ok(token) => {
                info!("Access token refreshed");
                self.events.emit(SessionEvent::TokenRefreshed);
                Ok(token)
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                self.expire_session(ClearReason::RefreshFailed);
                Err(e.to_api_error())
            }
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
        request_id: &str,
    ) -> Result<Response> {
        let mut url = Url::parse(&self.config.endpoint_url(&request.path))
            .map_err(|e| Error::Config(format!("Invalid URL for {}: {}", request.path, e)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header("X-Request-Id", request_id);

        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let builder = request.apply_body(builder)?;

        debug!(
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            "Sending request"
        );

        let response = builder.send().await?;

        debug!(
            request_id = %request_id,
            status = response.status().as_u16(),
            "Received response"
        );

        Ok(response)
    }
}

async fn decode_envelope<R: DeserializeOwned>(
    response: Response,
) -> Result<(StatusCode, Envelope<R>)> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::from_response(status, &body).into());
    }

    let envelope: Envelope<R> = if body.trim().is_empty() {
        Envelope {
            success: true,
            data: None,
            message: None,
            error_code: None,
            pagination: None,
        }
    } else {
        serde_json::from_str(&body).map_err(|e| ApiError::invalid_response(status, e))?
    };

    if !envelope.success {
        let mut err = ApiError::new(
            envelope
                .message
                .unwrap_or_else(|| "Unknown API error".to_string()),
        )
        .with_status(status.as_u16());
        err.error_code = envelope.error_code;
        return Err(err.into());
    }

    Ok((status, envelope))
}
