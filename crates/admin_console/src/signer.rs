//! Request signing for the wallet service.
//!
//! The secret key never leaves the process. Each signed request carries the
//! plaintext public key and a token derived from the secret:
//!
//! ```text
//! token = hex(sha512(hex(md5(secret))))
//! ```
//!
//! The service derives the same token from its own copy of the secret and
//! compares. There is no time component: the token authenticates the key pair
//! and offers no replay protection.

use std::fmt;

use api_types::website::Website;
use md5::Md5;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sha2::{Digest, Sha512};

use crate::client::ClientError;

pub const PUBLIC_KEY_HEADER: &str = "public-key";
pub const TOKEN_HEADER: &str = "token";

/// Derives the wallet-service token for `secret_key`.
pub fn sign(secret_key: &str) -> String {
    let intermediate = hex::encode(Md5::digest(secret_key.as_bytes()));
    hex::encode(Sha512::digest(intermediate.as_bytes()))
}

/// Key pair of the selected website.
///
/// Built from the website record at every signed call and dropped right
/// after; it is never cached.
#[derive(Clone)]
pub struct SigningContext {
    public_key: String,
    secret_key: String,
}

impl SigningContext {
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Reads the key pair from a website, if it has one.
    pub fn from_website(website: &Website) -> Option<Self> {
        match (&website.public_key, &website.secret_key) {
            (Some(public_key), Some(secret_key)) => {
                Some(Self::new(public_key.as_str(), secret_key.as_str()))
            }
            _ => None,
        }
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }
}

impl fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningContext")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// The pair of headers attached to every wallet request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub public_key: String,
    pub token: String,
}

impl SignedHeaders {
    /// Fails with [`ClientError::MissingCredentials`] when either key is
    /// blank, so no request leaves without both headers.
    pub fn derive(ctx: &SigningContext) -> Result<Self, ClientError> {
        if ctx.public_key.trim().is_empty() {
            return Err(ClientError::MissingCredentials("public key"));
        }
        if ctx.secret_key.trim().is_empty() {
            return Err(ClientError::MissingCredentials("secret key"));
        }
        Ok(Self {
            public_key: ctx.public_key.clone(),
            token: sign(&ctx.secret_key),
        })
    }

    pub fn to_header_map(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        let public_key = HeaderValue::try_from(self.public_key.as_str())
            .map_err(|err| ClientError::Server(format!("invalid public key header: {err}")))?;
        let mut token = HeaderValue::try_from(self.token.as_str())
            .map_err(|err| ClientError::Server(format!("invalid token header: {err}")))?;
        token.set_sensitive(true);

        headers.insert(HeaderName::from_static(PUBLIC_KEY_HEADER), public_key);
        headers.insert(HeaderName::from_static(TOKEN_HEADER), token);
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_sha512_of_md5_hex() {
        // md5("secret") = 5ebe2294ecd0e0f08eab7690d2a6ee69
        let expected = hex::encode(Sha512::digest(b"5ebe2294ecd0e0f08eab7690d2a6ee69"));
        assert_eq!(sign("secret"), expected);
        assert_eq!(sign("secret").len(), 128);
    }

    #[test]
    fn signing_is_deterministic() {
        assert_eq!(sign("k3y"), sign("k3y"));
        assert_ne!(sign("k3y"), sign("k3z"));
    }

    #[test]
    fn headers_never_carry_the_secret() {
        let ctx = SigningContext::new("pub-1", "very-secret");
        let headers = SignedHeaders::derive(&ctx).unwrap().to_header_map().unwrap();

        assert_eq!(headers.get(PUBLIC_KEY_HEADER).unwrap(), "pub-1");
        assert_eq!(headers.get(TOKEN_HEADER).unwrap(), sign("very-secret").as_str());
        for value in headers.values() {
            assert!(!value.to_str().unwrap().contains("very-secret"));
        }
    }

    #[test]
    fn missing_keys_fail_before_any_request() {
        let err = SignedHeaders::derive(&SigningContext::new("", "s")).unwrap_err();
        assert!(matches!(err, ClientError::MissingCredentials("public key")));

        let err = SignedHeaders::derive(&SigningContext::new("p", " ")).unwrap_err();
        assert!(matches!(err, ClientError::MissingCredentials("secret key")));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let ctx = SigningContext::new("pub", "hidden");
        assert!(!format!("{ctx:?}").contains("hidden"));
    }

    #[test]
    fn context_requires_both_keys_on_website() {
        let mut website = Website {
            id: "w1".to_string(),
            public_key: Some("pub".to_string()),
            ..Default::default()
        };
        assert!(SigningContext::from_website(&website).is_none());
        website.secret_key = Some("sec".to_string());
        assert_eq!(
            SigningContext::from_website(&website).unwrap().public_key(),
            "pub"
        );
    }
}
