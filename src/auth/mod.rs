//! Bearer access token verification.

mod extractor;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};

pub use extractor::{AuthError, AuthSession};

use crate::config::SessionSettings;
use crate::error::{AppError, AppResult};
use crate::models::{Session, SessionClaims};

/// Verifies HS256 access tokens issued by the auth provider.
///
/// The secret is kept in a `SecretString` so it never shows up in debug
/// output or logs.
#[derive(Clone)]
pub struct SessionVerifier {
    secret: SecretString,
    audience: String,
}

impl SessionVerifier {
    pub fn new(settings: &SessionSettings) -> Self {
        Self {
            secret: settings.secret.clone(),
            audience: settings.audience.clone(),
        }
    }

    /// Verify `token` and return the session it carries.
    pub fn verify(&self, token: &str) -> AppResult<Session> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.audience.as_str()]);

        let token_data = decode::<SessionClaims>(token, &key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid access token: {}", e)))?;

        Ok(Session::from(token_data.claims))
    }

    /// Sign an access token for `user_id`, valid for `ttl_secs`.
    pub fn issue(&self, user_id: &str, email: Option<&str>, ttl_secs: i64) -> AppResult<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(ttl_secs);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            aud: self.audience.clone(),
            exp: exp.timestamp() as usize,
            iat: Some(now.timestamp() as usize),
            email: email.map(str::to_string),
            role: Some("authenticated".to_string()),
        };

        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::default(), &claims, &key)
            .map_err(|e| AppError::InvalidInput(format!("Failed to create access token: {}", e)))
    }
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("secret", &"[REDACTED]")
            .field("audience", &self.audience)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier(secret: &str, audience: &str) -> SessionVerifier {
        SessionVerifier::new(&SessionSettings {
            secret: SecretString::from(secret.to_string()),
            audience: audience.to_string(),
        })
    }

    #[test]
    fn test_issued_token_verifies() {
        let verifier = verifier("secret", "authenticated");
        let token = verifier.issue("u1", Some("jane@x.com"), 60).unwrap();

        let session = verifier.verify(&token).unwrap();
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.authenticated_email(), Some("jane@x.com"));
    }

    #[test]
    fn test_rejects_wrong_secret_or_audience() {
        let token = verifier("secret", "authenticated")
            .issue("u1", Some("jane@x.com"), 60)
            .unwrap();

        assert!(matches!(
            verifier("other", "authenticated").verify(&token),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            verifier("secret", "anon").verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let verifier = verifier("secret", "authenticated");
        let token = verifier.issue("u1", None, -3600).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let output = format!("{:?}", verifier("hunter2", "authenticated"));
        assert!(!output.contains("hunter2"));
    }
}
