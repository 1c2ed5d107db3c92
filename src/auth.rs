//! Authentication port and the logged-in session.
//!
//! `FixedCredentialAuth` stands in for a backend with one hardcoded account;
//! `HttpAuthClient` talks to a real one exposing the same two endpoints.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AuthError, StorageError};
use crate::guard::{HOME_PATH, LOGIN_PATH};
use crate::storage::SnapshotStore;

/// Storage key of the logged-in user.
pub const USER_KEY: &str = "user";
/// Storage key of the path to open after login.
pub const RETURN_URL_KEY: &str = "returnUrl";

pub const DEMO_EMAIL: &str = "info@phoenixcoded.co";
pub const DEMO_PASSWORD: &str = "123456";
pub const DEMO_TOKEN: &str = "fake-jwt-token";

/// The authenticated principal, as returned by the login endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub token: String,
}

impl AuthUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub trait AuthProvider {
    fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
    /// Lists users; requires a valid token.
    fn users(&self, token: &str) -> Result<Vec<UserProfile>, AuthError>;
}

struct Account {
    profile: UserProfile,
    password: String,
}

/// One hardcoded account and a constant token. Carries no real security.
pub struct FixedCredentialAuth {
    accounts: Vec<Account>,
    token: String,
}

impl Default for FixedCredentialAuth {
    fn default() -> Self {
        FixedCredentialAuth {
            accounts: vec![Account {
                profile: UserProfile {
                    id: 1,
                    email: DEMO_EMAIL.into(),
                    first_name: "Phoenixcoded".into(),
                    last_name: ".com".into(),
                },
                password: DEMO_PASSWORD.into(),
            }],
            token: DEMO_TOKEN.into(),
        }
    }
}

impl AuthProvider for FixedCredentialAuth {
    fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let account = self
            .accounts
            .iter()
            .find(|a| a.profile.email == email && a.password == password)
            .ok_or_else(|| AuthError::InvalidCredentials("Email or password is incorrect".into()))?;
        Ok(AuthUser {
            id: account.profile.id,
            email: account.profile.email.clone(),
            first_name: account.profile.first_name.clone(),
            last_name: account.profile.last_name.clone(),
            token: self.token.clone(),
        })
    }

    fn users(&self, token: &str) -> Result<Vec<UserProfile>, AuthError> {
        if token != self.token {
            return Err(AuthError::Unauthorized);
        }
        Ok(self.accounts.iter().map(|a| a.profile.clone()).collect())
    }
}

/// Client for `POST {base}/users/authenticate` and `GET {base}/users`.
pub struct HttpAuthClient {
    client: Client,
    base_url: String,
}

impl HttpAuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpAuthClient {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn error_from(status: StatusCode, body: &str) -> AuthError {
        if status == StatusCode::UNAUTHORIZED {
            return AuthError::Unauthorized;
        }
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(err) => AuthError::InvalidCredentials(err.message),
            Err(_) => AuthError::Malformed(format!("status {}", status)),
        }
    }
}

impl AuthProvider for HttpAuthClient {
    fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .post(format!("{}/users/authenticate", self.base_url))
            .json(&Credentials { email, password })
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(Self::error_from(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| AuthError::Malformed(e.to_string()))
    }

    fn users(&self, token: &str) -> Result<Vec<UserProfile>, AuthError> {
        let response = self
            .client
            .get(format!("{}/users", self.base_url))
            .bearer_auth(token)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(Self::error_from(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| AuthError::Malformed(e.to_string()))
    }
}

/// The persisted login state: current user and post-login return path.
pub struct AuthSession {
    storage: Box<dyn SnapshotStore>,
    user: Option<AuthUser>,
    return_url: Option<String>,
}

impl AuthSession {
    /// Restores the session from storage. Unreadable entries count as logged out.
    pub fn restore(storage: Box<dyn SnapshotStore>) -> Self {
        let user = read_json::<AuthUser>(storage.as_ref(), USER_KEY);
        let return_url = read_json::<String>(storage.as_ref(), RETURN_URL_KEY);
        AuthSession { storage, user, return_url }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn return_url(&self) -> Option<&str> {
        self.return_url.as_deref()
    }

    pub fn set_return_url(&mut self, url: Option<String>) {
        let result = match &url {
            Some(u) => serde_json::to_string(u)
                .map_err(StorageError::from)
                .and_then(|blob| self.storage.write(RETURN_URL_KEY, &blob)),
            None => self.storage.remove(RETURN_URL_KEY),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to persist return url");
        }
        self.return_url = url;
    }

    /// Logs in through `provider` and returns the path to open next: the
    /// remembered return URL, or the dashboard.
    pub fn login(
        &mut self,
        provider: &dyn AuthProvider,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let user = match provider.login(email, password) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "login failed");
                return Err(e);
            }
        };
        let blob = serde_json::to_string(&user).map_err(StorageError::from)?;
        self.storage.write(USER_KEY, &blob)?;
        info!(user = user.id, "logged in");
        self.user = Some(user);
        let next = self.return_url.take().unwrap_or_else(|| HOME_PATH.to_string());
        self.storage.remove(RETURN_URL_KEY)?;
        Ok(next)
    }

    /// Forgets the user and returns the login path.
    pub fn logout(&mut self) -> Result<&'static str, AuthError> {
        self.user = None;
        self.storage.remove(USER_KEY)?;
        info!("logged out");
        Ok(LOGIN_PATH)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(storage: &dyn SnapshotStore, key: &str) -> Option<T> {
    match storage.read(key) {
        Ok(Some(blob)) => serde_json::from_str(&blob)
            .map_err(|e| warn!(key, error = %e, "ignoring malformed session entry"))
            .ok(),
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "failed to read session entry");
            None
        }
    }
}
