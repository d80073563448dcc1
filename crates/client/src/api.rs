//! HTTP client with transparent credential refresh.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::{Method, Request, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, watch};
use url::Url;

use crate::cookies::CookieVault;
use crate::error::ClientError;
use crate::model::ErrorBody;
use crate::session::SessionState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type RefreshFuture = Shared<BoxFuture<'static, Result<(), String>>>;

/// Cheap to clone; clones share cookies, session state and the refresh guard.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    vault: Arc<CookieVault>,
    state: watch::Sender<SessionState>,
    /// The refresh currently in progress, shared by every caller that hit a 401 meanwhile.
    in_flight: Mutex<Option<RefreshFuture>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let vault = Arc::new(CookieVault::new());
        let http = reqwest::Client::builder()
            .cookie_provider(vault.clone())
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        let (state, _) = watch::channel(SessionState::default());

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: Url::parse(base_url)?,
                vault,
                state,
                in_flight: Mutex::new(None),
            }),
        })
    }

    pub fn vault(&self) -> &CookieVault {
        &self.inner.vault
    }

    pub(crate) fn state(&self) -> &watch::Sender<SessionState> {
        &self.inner.state
    }

    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.inner.base_url.join(path)?)
    }

    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.inner.http.request(method, self.url(path)?))
    }

    /// Send a request, refreshing the session and replaying it once on a 401.
    ///
    /// A replayed request is never retried again, whatever its outcome. If the
    /// refresh fails the session is ended and the original 401 is returned.
    #[tracing::instrument(
        skip_all,
        fields(method = %request.method(), path = request.url().path())
    )]
    pub async fn execute(&self, request: Request) -> Result<Response, ClientError> {
        let mut request = request;
        let mut retried = false;
        loop {
            // Streaming bodies cannot be cloned and so cannot be replayed
            let replay = if retried { None } else { request.try_clone() };
            let response = self.inner.http.execute(request).await?;
            if response.status() != StatusCode::UNAUTHORIZED || retried {
                return Ok(response);
            }
            let Some(next) = replay else {
                return Ok(response);
            };

            retried = true;
            if let Err(e) = self.refresh().await {
                tracing::info!(error = %e, "Session refresh failed, signing out");
                self.end_session();
                return Ok(response);
            }
            request = next;
        }
    }

    /// Intercepted request decoded as JSON.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.execute(builder.build()?).await?;
        decode(response).await
    }

    /// Request that bypasses the refresh interceptor (login, register).
    pub(crate) async fn send_unintercepted<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        decode(builder.send().await?).await
    }

    /// Exchange the refresh cookie for a new credential pair.
    ///
    /// Concurrent callers share one request to `/api/refresh-token`.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let pending = {
            let mut slot = self.inner.in_flight.lock().await;
            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let pending = Inner::refresh_once(self.inner.clone()).boxed().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };
        pending.await.map_err(ClientError::RefreshFailed)
    }

    /// Drop local credentials, publish the anonymous state and notify the service.
    pub(crate) fn end_session(&self) {
        self.inner.vault.clear();
        self.inner.state.send_replace(SessionState::anonymous());

        let Ok(url) = self.url("/api/logout") else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime, skipping logout notification");
            return;
        };
        let http = self.inner.http.clone();
        runtime.spawn(async move {
            if let Err(e) = http.post(url).send().await {
                tracing::debug!(error = %e, "Logout notification failed");
            }
        });
    }
}

impl Inner {
    async fn refresh_once(inner: Arc<Inner>) -> Result<(), String> {
        let result = inner.post_refresh().await;
        inner.in_flight.lock().await.take();
        result
    }

    async fn post_refresh(&self) -> Result<(), String> {
        let url = self
            .base_url
            .join("/api/refresh-token")
            .map_err(|e| e.to_string())?;
        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if response.status().is_success() {
            tracing::debug!("Session refreshed");
            return Ok(());
        }
        Err(error_message(response).await)
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    response
        .json::<ErrorBody>()
        .await
        .map(|body| body.message())
        .unwrap_or_else(|_| status.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let message = error_message(response).await;
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized(message));
    }
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
