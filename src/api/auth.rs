//! OAuth2 redirect/callback contract.
//!
//! The backend brokers the provider flow end to end; the client only
//! builds the entry-point URL to send the user to, and picks the bearer
//! token off the URL the backend redirects back to. There is no direct
//! communication with the identity providers.

use url::Url;

use super::types::AuthToken;

/// Identity providers the backend can broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuth2Provider {
  Google,
  Github,
  Authentik,
}

impl OAuth2Provider {
  /// Path segment the backend uses for this provider.
  pub fn slug(self) -> &'static str {
    match self {
      OAuth2Provider::Google => "google",
      OAuth2Provider::Github => "github",
      OAuth2Provider::Authentik => "authentik",
    }
  }
}

/// Entry point of the provider flow:
/// `<backend>/oauth2/authorization/<provider>`.
pub fn authorization_url(backend_url: &str, provider: OAuth2Provider) -> String {
  format!(
    "{}/oauth2/authorization/{}",
    backend_url.trim_end_matches('/'),
    provider.slug()
  )
}

/// Extract the bearer token from the URL the backend redirected back to.
///
/// Returns `None` when the URL does not parse or carries no `token`
/// parameter — the page was opened normally, not as an OAuth2 callback.
pub fn token_from_redirect(redirect_url: &str) -> Option<AuthToken> {
  let url = Url::parse(redirect_url).ok()?;
  url
    .query_pairs()
    .find(|(name, _)| name == "token")
    .map(|(_, value)| AuthToken::new(value.into_owned()))
}
