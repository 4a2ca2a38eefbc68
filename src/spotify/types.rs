//! Spotify wire types and the token values handed between workers.

use serde::{Deserialize, Serialize};

/// Response body of the accounts service token endpoint.
///
/// Produced by both the authorization-code exchange and every refresh.
#[derive(Clone, Deserialize)]
pub struct Token {
    pub access_token: String,

    #[serde(default)]
    pub token_type: String,

    /// Lifetime of the access token in seconds. Absent on some refresh responses.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// Absent (or empty) on a refresh response means "keep using the previous one".
    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub scope: String,
}

impl Token {
    /// The refresh token carried by this response, if it carries a usable one.
    pub fn new_refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn access(&self) -> AccessToken {
        AccessToken::new(self.access_token.clone())
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("has_refresh_token", &self.new_refresh_token().is_some())
            .field("scope", &self.scope)
            .finish()
    }
}

/// A bearer access token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// OAuth client credentials sent with every token request.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// The subset of the playlist object the guard reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Playlist {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

/// Body of the change-details request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistUpdate {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_response_without_refresh_token() {
        let token: Token = serde_json::from_str(
            r#"{"access_token":"abc","token_type":"Bearer","expires_in":3600,"scope":"x"}"#,
        )
        .unwrap();
        assert_eq!(token.expires_in, Some(3600));
        assert!(token.new_refresh_token().is_none());

        let token: Token =
            serde_json::from_str(r#"{"access_token":"abc","refresh_token":""}"#).unwrap();
        assert!(token.new_refresh_token().is_none());
        assert_eq!(token.expires_in, None);
    }

    #[test]
    fn test_secrets_not_in_debug_output() {
        let token: Token = serde_json::from_str(
            r#"{"access_token":"very-secret","refresh_token":"also-secret","expires_in":10}"#,
        )
        .unwrap();
        let printed = format!("{:?} {:?}", token, token.access());
        assert!(!printed.contains("very-secret"));
        assert!(!printed.contains("also-secret"));
    }

    #[test]
    fn test_update_serializes_name_only() {
        let body = serde_json::to_value(PlaylistUpdate { name: "My Mix".into() }).unwrap();
        assert_eq!(body, serde_json::json!({ "name": "My Mix" }));
    }
}
