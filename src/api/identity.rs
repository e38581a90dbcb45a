//! Identity providers for the sign-in screen.
//!
//! Every provider answers the same question, "who is signing in?", through
//! [`IdentityProvider::authenticate`]. None of them keeps a session: a
//! successful answer only moves the window to the chat view.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use url::Url;

use crate::error::AuthError;

const LINKEDIN_AUTHORIZE_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
const LINKEDIN_SCOPES: &str = "r_liteprofile r_emailaddress";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Local,
    Google,
    LinkedIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub provider: ProviderKind,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Identity {
    fn anonymous(provider: ProviderKind) -> Self {
        Self { provider, subject: None, email: None, name: None }
    }
}

pub trait IdentityProvider {
    fn authenticate(&self) -> Result<Identity, AuthError>;
}

/// The local sign-in form. Credentials are only checked for presence.
pub struct LocalIdentity {
    email: String,
    password: String,
}

impl LocalIdentity {
    pub fn new(email: &str, password: &str) -> Self {
        Self { email: email.trim().to_string(), password: password.to_string() }
    }
}

impl IdentityProvider for LocalIdentity {
    fn authenticate(&self) -> Result<Identity, AuthError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        Ok(Identity {
            subject: Some(self.email.clone()),
            email: Some(self.email.clone()),
            ..Identity::anonymous(ProviderKind::Local)
        })
    }
}

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    sub: String,
    aud: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

/// Google sign-in: the provider's client hands back a signed ID token and we
/// read its claims. The signature is not verified.
pub struct GoogleIdentity {
    client_id: String,
    credential: Option<String>,
}

impl GoogleIdentity {
    pub fn new(client_id: &str) -> Self {
        Self { client_id: client_id.to_string(), credential: None }
    }

    /// Called with the token the provider delivers to its callback.
    pub fn with_credential(mut self, token: &str) -> Self {
        let token = token.trim();
        self.credential = if token.is_empty() { None } else { Some(token.to_string()) };
        self
    }

    fn claims(&self, token: &str) -> Result<GoogleClaims, AuthError> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_sig), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::MalformedToken("expected three dot-separated segments".into()));
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        let claims: GoogleClaims =
            serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        if let Some(aud) = claims.aud.as_deref() {
            if !self.client_id.is_empty() && aud != self.client_id {
                return Err(AuthError::MalformedToken(format!("token issued for {}", aud)));
            }
        }
        Ok(claims)
    }
}

impl IdentityProvider for GoogleIdentity {
    fn authenticate(&self) -> Result<Identity, AuthError> {
        let token = self.credential.as_deref().ok_or(AuthError::MissingCredential)?;
        let claims = self.claims(token)?;
        log::info!("Google credential accepted for subject {}", claims.sub);
        Ok(Identity {
            provider: ProviderKind::Google,
            subject: Some(claims.sub),
            email: claims.email,
            name: claims.name,
        })
    }
}

/// LinkedIn sign-in: opens the authorization page and reports success right
/// away. The redirect is never received, so no code is exchanged.
pub struct LinkedInIdentity<L> {
    client_id: String,
    redirect_uri: String,
    state: String,
    launcher: L,
}

impl<L> LinkedInIdentity<L>
where
    L: Fn(&Url) -> Result<(), AuthError>,
{
    pub fn new(client_id: &str, redirect_uri: &str, launcher: L) -> Self {
        Self {
            client_id: client_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            state: uuid::Uuid::new_v4().simple().to_string(),
            launcher,
        }
    }

    pub fn authorization_url(&self) -> Result<Url, AuthError> {
        Ok(Url::parse_with_params(
            LINKEDIN_AUTHORIZE_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", self.state.as_str()),
                ("scope", LINKEDIN_SCOPES),
            ],
        )?)
    }
}

impl<L> IdentityProvider for LinkedInIdentity<L>
where
    L: Fn(&Url) -> Result<(), AuthError>,
{
    fn authenticate(&self) -> Result<Identity, AuthError> {
        let url = self.authorization_url()?;
        (self.launcher)(&url)?;
        Ok(Identity::anonymous(ProviderKind::LinkedIn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn token_with(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.sig", header, body)
    }

    #[test]
    fn local_requires_both_fields() {
        assert!(matches!(
            LocalIdentity::new("  ", "pw").authenticate(),
            Err(AuthError::MissingCredential)
        ));
        let id = LocalIdentity::new("a@x.com", "pw").authenticate().unwrap();
        assert_eq!(id.provider, ProviderKind::Local);
        assert_eq!(id.email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn google_reads_claims_from_token() {
        let token = token_with(serde_json::json!({
            "sub": "1234", "aud": "client-1", "email": "a@x.com", "name": "Ann"
        }));
        let id = GoogleIdentity::new("client-1").with_credential(&token).authenticate().unwrap();
        assert_eq!(id.provider, ProviderKind::Google);
        assert_eq!(id.subject.as_deref(), Some("1234"));
        assert_eq!(id.name.as_deref(), Some("Ann"));
    }

    #[test]
    fn google_rejects_other_audience_and_garbage() {
        let token = token_with(serde_json::json!({"sub": "1", "aud": "someone-else"}));
        assert!(matches!(
            GoogleIdentity::new("client-1").with_credential(&token).authenticate(),
            Err(AuthError::MalformedToken(_))
        ));
        assert!(matches!(
            GoogleIdentity::new("client-1").with_credential("not-a-jwt").authenticate(),
            Err(AuthError::MalformedToken(_))
        ));
        assert!(matches!(
            GoogleIdentity::new("client-1").authenticate(),
            Err(AuthError::MissingCredential)
        ));
    }

    #[test]
    fn linkedin_opens_authorization_url() {
        let opened = RefCell::new(None);
        let provider = LinkedInIdentity::new("li-client", "https://app.example/cb", |url: &Url| -> Result<(), AuthError> {
            *opened.borrow_mut() = Some(url.clone());
            Ok(())
        });

        let id = provider.authenticate().unwrap();
        assert_eq!(id.provider, ProviderKind::LinkedIn);
        assert!(id.subject.is_none());

        let url = opened.borrow().clone().unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["client_id"], "li-client");
        assert_eq!(pairs["redirect_uri"], "https://app.example/cb");
        assert_eq!(pairs["scope"], "r_liteprofile r_emailaddress");
        assert!(!pairs["state"].is_empty());
    }

    #[test]
    fn linkedin_launch_failure_is_reported() {
        let provider = LinkedInIdentity::new("li-client", "https://app.example/cb", |_: &Url| -> Result<(), AuthError> {
            Err(AuthError::Launch("no browser".into()))
        });
        assert!(matches!(provider.authenticate(), Err(AuthError::Launch(_))));
    }
}
