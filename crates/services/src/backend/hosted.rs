use std::env;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use lingo_core::model::{
    AuthChange, AuthEvent, AuthSession, AuthUser, NewProfile, OAuthProvider, Profile, Role,
    SubscriptionTier, UserId,
};

use super::pkce::{CHALLENGE_METHOD, PkcePair};
use super::{AuthBackend, CHANGE_CHANNEL_CAPACITY, ProfileStore, SignUpOutcome};
use crate::error::{AuthError, BackendConfigError, ProfileLookupError, ProfileWriteError};

pub const BACKEND_URL_VAR: &str = "LINGO_BACKEND_URL";
pub const ANON_KEY_VAR: &str = "LINGO_ANON_KEY";

/// Endpoint and public key of the hosted backend.
#[derive(Clone)]
pub struct BackendConfig {
    base_url: Url,
    anon_key: String,
}

impl BackendConfig {
    /// # Errors
    ///
    /// Returns `BackendConfigError` if either value is blank or the URL does not parse.
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, BackendConfigError> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(BackendConfigError::Missing(BACKEND_URL_VAR));
        }
        let anon_key = anon_key.trim();
        if anon_key.is_empty() {
            return Err(BackendConfigError::Missing(ANON_KEY_VAR));
        }
        // Joining relative paths needs a trailing slash on the base.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalized).map_err(|e| BackendConfigError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            base_url,
            anon_key: anon_key.to_string(),
        })
    }

    /// Read `LINGO_BACKEND_URL` and `LINGO_ANON_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `BackendConfigError::Missing` naming the first unset variable.
    pub fn from_env() -> Result<Self, BackendConfigError> {
        let url = env::var(BACKEND_URL_VAR).map_err(|_| BackendConfigError::Missing(BACKEND_URL_VAR))?;
        let key = env::var(ANON_KEY_VAR).map_err(|_| BackendConfigError::Missing(ANON_KEY_VAR))?;
        Self::new(&url, &key)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base_url
            .join(path)
            .map_err(|e| AuthError::Misconfigured(e.to_string()))
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url.as_str())
            .field("anon_key", &"<redacted>")
            .finish()
    }
}

/// HTTP client for a Supabase-compatible identity and profile API.
///
/// The active session is cached in the client; every sign-in, sign-out and
/// token refresh is broadcast to subscribers. OAuth runs the PKCE flow: the
/// verifier of the last started sign-in waits here for its code.
pub struct HostedBackend {
    client: Client,
    config: BackendConfig,
    session: Mutex<Option<AuthSession>>,
    pending_verifier: Mutex<Option<String>>,
    changes: broadcast::Sender<AuthChange>,
}

impl HostedBackend {
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            client: Client::new(),
            config,
            session: Mutex::new(None),
            pending_verifier: Mutex::new(None),
            changes,
        }
    }

    /// The URL a browser must open to start an OAuth sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Misconfigured` if the base URL cannot be joined.
    pub fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<String, AuthError> {
        let mut url = self.config.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", CHALLENGE_METHOD);
        Ok(url.into())
    }

    fn cached(&self) -> MutexGuard<'_, Option<AuthSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> MutexGuard<'_, Option<String>> {
        self.pending_verifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, event: AuthEvent, session: Option<AuthSession>) {
        *self.cached() = session.clone();
        let _ = self.changes.send(AuthChange { event, session });
    }

    fn with_keys(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token.unwrap_or(self.config.anon_key.as_str()))
    }

    fn access_token(&self) -> Option<String> {
        self.cached()
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    async fn token_grant<B: Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<AuthSession, AuthError> {
        let mut url = self.config.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        let response = self
            .with_keys(self.client.post(url), None)
            .json(body)
            .send()
            .await
            .map_err(network)?;
        let response = auth_status(response).await?;
        let token: TokenResponse = response.json().await.map_err(network)?;
        Ok(token.into_session(Utc::now()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        self.token_grant(
            "refresh_token",
            &RefreshRequest {
                refresh_token: refresh_token.to_string(),
            },
        )
        .await
    }
}

#[async_trait]
impl AuthBackend for HostedBackend {
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let Some(session) = self.cached().clone() else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            self.store(AuthEvent::SignedOut, None);
            return Ok(None);
        };
        match self.refresh(refresh_token).await {
            Ok(fresh) => {
                debug!(user_id = %fresh.user_id(), "access token refreshed");
                self.store(AuthEvent::TokenRefreshed, Some(fresh.clone()));
                Ok(Some(fresh))
            }
            Err(AuthError::NetworkFailure(reason)) => Err(AuthError::NetworkFailure(reason)),
            Err(err) => {
                warn!(error = %err, "refresh rejected; dropping session");
                self.store(AuthEvent::SignedOut, None);
                Ok(None)
            }
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let session = self
            .token_grant(
                "password",
                &PasswordRequest {
                    email: email.trim(),
                    password,
                },
            )
            .await?;
        self.store(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, AuthError> {
        let pair = PkcePair::generate();
        let url = self.authorize_url(provider, redirect_to, &pair.challenge)?;
        // A newer sign-in replaces an abandoned one.
        *self.pending() = Some(pair.verifier);
        Ok(url)
    }

    async fn exchange_oauth_code(&self, auth_code: &str) -> Result<AuthSession, AuthError> {
        let Some(code_verifier) = self.pending().take() else {
            return Err(AuthError::ProviderRejected(
                "no third-party sign-in is in progress".into(),
            ));
        };
        let session = self
            .token_grant(
                "pkce",
                &PkceRequest {
                    auth_code,
                    code_verifier: &code_verifier,
                },
            )
            .await?;
        self.store(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        let url = self.config.endpoint("auth/v1/signup")?;
        let response = self
            .with_keys(self.client.post(url), None)
            .json(&SignUpRequest {
                email: email.trim(),
                password,
                data: SignUpMetadata { full_name },
            })
            .send()
            .await
            .map_err(network)?;
        let response = auth_status(response).await?;
        match response.json::<SignUpResponse>().await.map_err(network)? {
            SignUpResponse::Session(token) => {
                let session = token.into_session(Utc::now());
                self.store(AuthEvent::SignedIn, Some(session.clone()));
                Ok(SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                })
            }
            SignUpResponse::Pending(user) => Ok(SignUpOutcome {
                user: user.into_user(),
                session: None,
            }),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(token) = self.access_token() else {
            return Ok(());
        };
        let url = self.config.endpoint("auth/v1/logout")?;
        let response = self
            .with_keys(self.client.post(url), Some(&token))
            .send()
            .await
            .map_err(network)?;
        // An expired or revoked token is already signed out server-side.
        if response.status() != StatusCode::UNAUTHORIZED {
            auth_status(response).await?;
        }
        self.store(AuthEvent::SignedOut, None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}

#[async_trait]
impl ProfileStore for HostedBackend {
    async fn fetch_profile(&self, user_id: UserId) -> Result<Profile, ProfileLookupError> {
        let mut url = self
            .config
            .base_url
            .join("rest/v1/profiles")
            .map_err(|e| ProfileLookupError::Rejected(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{user_id}"))
            .append_pair("select", "id,full_name,email,role,subscription_tier");
        let token = self.access_token();
        let response = self
            .with_keys(self.client.get(url), token.as_deref())
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await
            .map_err(|e| ProfileLookupError::NetworkFailure(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let row: ProfileRow = response
                    .json()
                    .await
                    .map_err(|e| ProfileLookupError::NetworkFailure(e.to_string()))?;
                Ok(row.into_profile())
            }
            // Single-object requests answer 406 when zero rows match.
            StatusCode::NOT_ACCEPTABLE | StatusCode::NOT_FOUND => Err(ProfileLookupError::Missing),
            status => Err(ProfileLookupError::Rejected(status.to_string())),
        }
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), ProfileWriteError> {
        let url = self
            .config
            .base_url
            .join("rest/v1/profiles")
            .map_err(|e| ProfileWriteError::Rejected(e.to_string()))?;
        let token = self.access_token();
        let response = self
            .with_keys(self.client.post(url), token.as_deref())
            .header("Prefer", "return=minimal")
            .json(&NewProfileRow::from(profile))
            .send()
            .await
            .map_err(|e| ProfileWriteError::NetworkFailure(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(ProfileWriteError::Conflict),
            status => Err(ProfileWriteError::Rejected(status.to_string())),
        }
    }
}

fn network(err: reqwest::Error) -> AuthError {
    AuthError::NetworkFailure(err.to_string())
}

async fn auth_status(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    Err(classify_auth_failure(status, body))
}

fn classify_auth_failure(status: StatusCode, body: ErrorBody) -> AuthError {
    let invalid_grant = body.error.as_deref() == Some("invalid_grant")
        || body.error_code.as_deref() == Some("invalid_credentials");
    if status == StatusCode::BAD_REQUEST && invalid_grant {
        return AuthError::InvalidCredentials;
    }
    if status.is_server_error() {
        return AuthError::NetworkFailure(status.to_string());
    }
    AuthError::ProviderRejected(body.message().unwrap_or_else(|| status.to_string()))
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct PkceRequest<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct SignUpMetadata<'a> {
    full_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserPayload,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into_user(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    Pending(UserPayload),
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
}

impl UserPayload {
    fn into_user(self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: self.email.unwrap_or_default(),
            full_name: self.user_metadata.full_name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: UserId,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    subscription_tier: Option<String>,
}

impl ProfileRow {
    fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
            full_name: self.full_name,
            email: self.email.unwrap_or_default(),
            role: Role::from_column(self.role.as_deref()),
            subscription_tier: self
                .subscription_tier
                .as_deref()
                .and_then(SubscriptionTier::from_column)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct NewProfileRow<'a> {
    id: UserId,
    full_name: &'a str,
    email: &'a str,
    subscription_tier: &'static str,
}

impl<'a> From<&'a NewProfile> for NewProfileRow<'a> {
    fn from(profile: &'a NewProfile) -> Self {
        Self {
            id: profile.id,
            full_name: &profile.full_name,
            email: &profile.email,
            subscription_tier: profile.subscription_tier.as_str(),
        }
    }
}
