//! OAuth provider configuration from explicit values or environment variables.

use oauth2::basic::BasicClient;
use oauth2::url::{ParseError, Url};
use oauth2::{AuthUrl, ClientId, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/auth/callback";

/// The identity provider a deployment signs users in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Google,
    GitHub,
}

impl ProviderKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::GitHub => "GitHub",
        }
    }

    fn auth_url(&self) -> &'static str {
        match self {
            Self::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Self::GitHub => "https://github.com/login/oauth/authorize",
        }
    }

    fn scopes(&self) -> &'static [&'static str] {
        match self {
            Self::Google => &["openid", "email", "profile"],
            Self::GitHub => &["read:user", "user:email"],
        }
    }

    /// Google always shows the account chooser; GitHub always asks for credentials.
    fn prompt(&self) -> &'static str {
        match self {
            Self::Google => "select_account",
            Self::GitHub => "login",
        }
    }

    fn client_id_var(&self) -> &'static str {
        match self {
            Self::Google => "GOOGLE_CLIENT_ID",
            Self::GitHub => "GITHUB_CLIENT_ID",
        }
    }

    fn callback_segment(&self) -> &'static str {
        match self {
            Self::Google => "/google/callback",
            Self::GitHub => "/github/callback",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderConfigError {
    #[error("{0} not set")]
    MissingVar(&'static str),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] ParseError),
}

/// Provider settings handed to [`super::IdentityProvider::sign_in`].
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub client_id: ClientId,
    pub auth_url: AuthUrl,
    pub redirect_url: RedirectUrl,
    pub scopes: Vec<Scope>,
    pub prompt: &'static str,
}

/// A prepared authorization redirect.
#[derive(Debug)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub csrf_state: CsrfToken,
    pub pkce_verifier: PkceCodeVerifier,
}

impl ProviderConfig {
    pub fn new(
        kind: ProviderKind,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Result<Self, ProviderConfigError> {
        Ok(Self {
            kind,
            client_id: ClientId::new(client_id.into()),
            auth_url: AuthUrl::new(kind.auth_url().to_string())?,
            redirect_url: RedirectUrl::new(redirect_uri.into())?,
            scopes: kind
                .scopes()
                .iter()
                .map(|scope| Scope::new(scope.to_string()))
                .collect(),
            prompt: kind.prompt(),
        })
    }

    /// Create a provider config from environment variables (and `.env`).
    pub fn from_env(kind: ProviderKind) -> Result<Self, ProviderConfigError> {
        dotenvy::dotenv().ok();

        let var = kind.client_id_var();
        let client_id = std::env::var(var).map_err(|_| ProviderConfigError::MissingVar(var))?;
        let redirect_uri = std::env::var("AUTH_REDIRECT_URI")
            .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string());

        Self::new(
            kind,
            client_id,
            redirect_uri.replace("/callback", kind.callback_segment()),
        )
    }

    /// Build the authorization URL with a random CSRF state and a PKCE challenge.
    pub fn authorize_url(&self) -> AuthorizationRequest {
        let client = BasicClient::new(self.client_id.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.scopes.iter().cloned())
            .add_extra_param("prompt", self.prompt)
            .set_pkce_challenge(pkce_challenge)
            .url();

        AuthorizationRequest {
            url,
            csrf_state,
            pkce_verifier,
        }
    }
}
