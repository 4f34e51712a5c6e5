// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-auth API client with transparent single-flight token refresh.
//!
//! Every request runs through two interception points: before send, an
//! expired access token is refreshed (or the request queues behind the
//! refresh already in flight); after receipt, a 401 on a non-login path
//! triggers exactly one refresh-and-retry cycle. Both paths funnel through
//! the same [`RefreshGate`], so at most one refresh call is ever
//! outstanding no matter how many requests hit expiry at once.

use std::sync::{Arc, Once};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::{AuthMode, ClientConfig};
use crate::error::{extract_message, ApiError};
use crate::event::AuthEvent;
use crate::refresh::do_refresh;
use crate::singleflight::{wait_for_outcome, Flight, RefreshGate};
use crate::store::{TokenStore, DEVICE_LOCK_FLAG};
use crate::token::{epoch_millis, is_expired};

/// Install the ring crypto provider once so rustls-backed TLS works
/// without ceremony from the embedder.
pub(crate) fn ensure_crypto() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// HTTP client for a bearer-token API.
///
/// In [`AuthMode::Managed`] the client stamps `Authorization: Bearer` on
/// each request, refreshes expired tokens through the gate, and retries a
/// 401'd request once with the new token. In [`AuthMode::Passthrough`]
/// requests are sent untouched.
pub struct ApiClient {
    config: ClientConfig,
    http: reqwest::Client,
    store: Arc<dyn TokenStore>,
    gate: Arc<RefreshGate>,
    event_tx: broadcast::Sender<AuthEvent>,
    shutdown: CancellationToken,
}

impl ApiClient {
    /// Build a client from an explicit configuration and token store.
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        config.validate().map_err(|e| ApiError::InvalidConfig(e.to_string()))?;
        ensure_crypto();
        let http = reqwest::Client::builder().timeout(config.request_timeout()).build()?;
        let (event_tx, _) = broadcast::channel(64);
        Ok(Self {
            config,
            http,
            store,
            gate: Arc::new(RefreshGate::new()),
            event_tx,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Subscribe to session lifecycle events ([`AuthEvent`]).
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.event_tx.subscribe()
    }

    /// Release every request queued behind an in-flight refresh with
    /// [`ApiError::Shutdown`]. Idempotent.
    pub fn shutdown(&self) {
        tracing::info!("client shutting down");
        self.shutdown.cancel();
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn is_login_path(&self, path: &str) -> bool {
        path.contains(&self.config.login_path)
    }

    // -- Typed request surface -------------------------------------------

    /// GET `path` and deserialize the response body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::GET, path, None).await
    }

    /// POST `body` as JSON to `path` and deserialize the response body.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::POST, path, Some(serde_json::to_value(body)?)).await
    }

    /// PUT `body` as JSON to `path` and deserialize the response body.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::PUT, path, Some(serde_json::to_value(body)?)).await
    }

    /// DELETE `path` and deserialize the response body.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::DELETE, path, None).await
    }

    // -- Request pipeline -------------------------------------------------

    fn build(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, self.url(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        match token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        if self.config.auth_mode == AuthMode::Passthrough {
            let resp = self.build(method, path, body.as_ref(), None).send().await?;
            return Self::unwrap_response(resp).await;
        }

        // Pre-send: refresh an expired token before the first attempt.
        let token = self.outgoing_token(path).await?;
        let resp = self.build(method.clone(), path, body.as_ref(), token.as_deref()).send().await?;
        let status = resp.status();
        if status != reqwest::StatusCode::UNAUTHORIZED {
            return Self::unwrap_response(resp).await;
        }

        // Post-receive: 401 handling. The device-lock flag is cleared on
        // every 401; the login path's 401 passes through untouched.
        self.store.remove_flag(DEVICE_LOCK_FLAG);
        if self.is_login_path(path) {
            return Err(Self::status_error(resp).await);
        }
        if self.store.refresh_token().is_none() {
            self.invalidate_session("unauthorized with no refresh token");
            return Err(ApiError::SessionExpired {
                reason: "unauthorized with no refresh token".to_owned(),
            });
        }
        tracing::debug!(path, "got 401, refreshing and retrying once");
        let fresh = self.refresh_access_token().await?;
        let retry = self.build(method, path, body.as_ref(), Some(&fresh)).send().await?;
        // A second 401 is not refreshed again; it surfaces as a status
        // error like any other failure.
        Self::unwrap_response(retry).await
    }

    /// Decide what token the outgoing request carries.
    ///
    /// An expired access token with a refresh token on hand is renewed
    /// before send; a token without a readable expiry is sent as-is and the
    /// 401 path is the backstop. Login requests never trigger a refresh.
    async fn outgoing_token(&self, path: &str) -> Result<Option<String>, ApiError> {
        let Some(access) = self.store.access_token() else {
            return Ok(None);
        };
        if !self.is_login_path(path)
            && is_expired(&access, epoch_millis())
            && self.store.refresh_token().is_some()
        {
            tracing::debug!(path, "access token expired, refreshing before send");
            return Ok(Some(self.refresh_access_token().await?));
        }
        Ok(Some(access))
    }

    /// Run one refresh through the gate: the first caller performs the
    /// network call; everyone else queues for its outcome.
    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let permit = match self.gate.acquire_or_wait() {
            Flight::Waiter(rx) => {
                return wait_for_outcome(rx, self.config.refresh_wait(), &self.shutdown).await;
            }
            Flight::Leader(permit) => permit,
        };

        let Some(refresh_token) = self.store.refresh_token() else {
            permit.complete(Err("no refresh token available".to_owned()));
            self.invalidate_session("no refresh token available");
            return Err(ApiError::SessionExpired {
                reason: "no refresh token available".to_owned(),
            });
        };

        let refresh_url = self.url(&self.config.refresh_path);
        match do_refresh(&self.http, &refresh_url, &refresh_token).await {
            Ok(pair) => {
                self.store.set_access_token(&pair.access_token);
                // An endpoint that did not rotate the refresh token leaves
                // the previous one usable for the next cycle.
                if let Some(rotated) = &pair.refresh_token {
                    self.store.set_refresh_token(rotated);
                }
                tracing::info!("access token refreshed");
                let _ = self
                    .event_tx
                    .send(AuthEvent::Refreshed { access_token: pair.access_token.clone() });
                permit.complete(Ok(pair.access_token.clone()));
                Ok(pair.access_token)
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(err = %e, "token refresh failed, tearing down session");
                let _ = self.event_tx.send(AuthEvent::RefreshFailed { error: reason.clone() });
                permit.complete(Err(reason.clone()));
                self.invalidate_session(&reason);
                Err(ApiError::RefreshFailed { reason })
            }
        }
    }

    /// Fail-closed teardown: wipe local auth state and tell embedders the
    /// user must authenticate again.
    fn invalidate_session(&self, reason: &str) {
        self.store.clear();
        let _ = self.event_tx.send(AuthEvent::SessionInvalidated { reason: reason.to_owned() });
    }

    async fn unwrap_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        if !resp.status().is_success() {
            return Err(Self::status_error(resp).await);
        }
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_slice(b"null")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn status_error(resp: reqwest::Response) -> ApiError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        ApiError::Status { status, message: extract_message(&body) }
    }
}

/// Process-wide shared client handle.
///
/// The accessor contract: [`get_or_init`](shared::get_or_init) constructs
/// on first call and returns the cached instance on every later call, with
/// later configurations ignored; [`replace`](shared::replace) swaps in a
/// new client unconditionally.
pub mod shared {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::ApiClient;
    use crate::config::ClientConfig;
    use crate::error::ApiError;
    use crate::store::TokenStore;

    static SHARED: Mutex<Option<Arc<ApiClient>>> = Mutex::new(None);

    /// Return the shared client, constructing it on first call. Later
    /// calls ignore `config` and `store` entirely.
    pub fn get_or_init(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<Arc<ApiClient>, ApiError> {
        let mut slot = SHARED.lock();
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }
        let client = Arc::new(ApiClient::new(config, store)?);
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Build a new client and install it as the shared instance,
    /// shutting down the one it displaces.
    pub fn replace(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<Arc<ApiClient>, ApiError> {
        let client = Arc::new(ApiClient::new(config, store)?);
        let previous = SHARED.lock().replace(Arc::clone(&client));
        if let Some(previous) = previous {
            previous.shutdown();
        }
        Ok(client)
    }

    /// The shared client, if one has been installed.
    pub fn get() -> Option<Arc<ApiClient>> {
        SHARED.lock().as_ref().map(Arc::clone)
    }
}
