//! Loopback receiver for the browser redirect that ends a third-party sign-in.
//!
//! The listener binds `127.0.0.1` on a free port before the sign-in starts,
//! so its address can be handed to the identity service as `redirect_to`.
//! It answers exactly one callback and then shuts down.

use std::future::IntoFuture;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{Notify, oneshot};
use tracing::{debug, warn};

use crate::error::AuthError;

pub const CALLBACK_PATH: &str = "/callback";

const SIGNED_IN_PAGE: &str = "<!doctype html><title>Tagalog Learn</title>\
<h1>You're signed in</h1><p>You can close this tab and return to the app.</p>";
const FAILED_PAGE: &str = "<!doctype html><title>Tagalog Learn</title>\
<h1>Sign-in did not finish</h1><p>Return to the app and try again.</p>";

type Outcome = Result<String, AuthError>;

#[derive(Debug, Default, Deserialize)]
struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl CallbackParams {
    fn into_outcome(self) -> Outcome {
        match (self.code, self.error) {
            (Some(code), None) if !code.is_empty() => Ok(code),
            (_, Some(error)) => Err(AuthError::ProviderRejected(
                self.error_description.unwrap_or(error),
            )),
            _ => Err(AuthError::ProviderRejected(
                "the sign-in redirect carried no code".into(),
            )),
        }
    }
}

#[derive(Clone)]
struct CallbackState {
    result: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
    done: Arc<Notify>,
}

impl CallbackState {
    /// Deliver the first outcome; later callbacks are ignored.
    fn finish(&self, outcome: Outcome) {
        let sender = self
            .result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(outcome);
            self.done.notify_one();
        }
    }
}

async fn receive_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    let outcome = params.into_outcome();
    let page = if outcome.is_ok() {
        SIGNED_IN_PAGE
    } else {
        FAILED_PAGE
    };
    state.finish(outcome);
    Html(page)
}

/// A bound, not yet serving, loopback callback endpoint.
#[derive(Debug)]
pub struct OAuthCallback {
    listener: TcpListener,
    redirect_uri: String,
}

impl OAuthCallback {
    /// # Errors
    ///
    /// Returns `AuthError::NetworkFailure` if no loopback port is available.
    pub async fn bind() -> Result<Self, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| AuthError::NetworkFailure(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| AuthError::NetworkFailure(e.to_string()))?;
        let redirect_uri = format!("http://{addr}{CALLBACK_PATH}");
        debug!(%redirect_uri, "oauth callback listening");
        Ok(Self {
            listener,
            redirect_uri,
        })
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Serve until the provider redirects back, then return its code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProviderRejected` when the redirect reports an
    /// error, and `AuthError::TimedOut` if nothing arrives within `timeout`.
    pub async fn wait_for_code(self, timeout: Duration) -> Result<String, AuthError> {
        let (tx, rx) = oneshot::channel();
        let state = CallbackState {
            result: Arc::new(Mutex::new(Some(tx))),
            done: Arc::new(Notify::new()),
        };
        let done = Arc::clone(&state.done);
        let app = Router::new()
            .route(CALLBACK_PATH, get(receive_callback))
            .with_state(state);

        let server = tokio::spawn(
            axum::serve(self.listener, app)
                .with_graceful_shutdown(async move { done.notified().await })
                .into_future(),
        );

        let outcome = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(AuthError::ProviderRejected("sign-in was abandoned".into())),
            Err(_) => {
                server.abort();
                Err(AuthError::TimedOut)
            }
        };
        if let Err(err) = &outcome {
            warn!(error = %err, "oauth callback failed");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn hit(url: String) -> String {
        reqwest::get(url).await.unwrap().text().await.unwrap()
    }

    #[tokio::test]
    async fn redirect_with_code_is_returned() {
        let callback = OAuthCallback::bind().await.unwrap();
        let uri = callback.redirect_uri().to_string();
        assert!(uri.starts_with("http://127.0.0.1:"));
        assert!(uri.ends_with(CALLBACK_PATH));

        let waiting = tokio::spawn(callback.wait_for_code(Duration::from_secs(5)));
        let page = hit(format!("{uri}?code=abc-123")).await;
        assert!(page.contains("signed in"));
        assert_eq!(waiting.await.unwrap(), Ok("abc-123".to_string()));
    }

    #[tokio::test]
    async fn provider_error_is_reported() {
        let callback = OAuthCallback::bind().await.unwrap();
        let uri = callback.redirect_uri().to_string();
        let waiting = tokio::spawn(callback.wait_for_code(Duration::from_secs(5)));

        let page = hit(format!(
            "{uri}?error=access_denied&error_description=User+denied+access"
        ))
        .await;
        assert!(page.contains("did not finish"));
        assert_eq!(
            waiting.await.unwrap(),
            Err(AuthError::ProviderRejected("User denied access".into()))
        );
    }

    #[tokio::test]
    async fn silence_times_out() {
        let callback = OAuthCallback::bind().await.unwrap();
        assert_eq!(
            callback.wait_for_code(Duration::from_millis(50)).await,
            Err(AuthError::TimedOut)
        );
    }

    #[test]
    fn missing_code_is_rejected() {
        assert!(matches!(
            CallbackParams::default().into_outcome(),
            Err(AuthError::ProviderRejected(_))
        ));
    }
}
