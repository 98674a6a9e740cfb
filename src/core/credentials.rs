use std::collections::HashMap;

const TOKEN_PREFIX: &str = "SERVICES_";
const TOKEN_SUFFIX: &str = "_TOKEN";

/// Bearer-token lookup for a service. Resolution never fails: an unset token
/// resolves to the empty string and surfaces downstream as an auth rejection
/// from the service itself.
pub trait CredentialStore: Send + Sync {
    fn token(&self, short_name: &str) -> String;
}

/// Tokens from process environment, `SERVICES_<SHORT_NAME>_TOKEN`
/// with the short name uppercased.
pub struct EnvCredentials;

impl EnvCredentials {
    pub fn var_name(short_name: &str) -> String {
        format!(
            "{}{}{}",
            TOKEN_PREFIX,
            short_name.to_uppercase(),
            TOKEN_SUFFIX
        )
    }
}

impl CredentialStore for EnvCredentials {
    fn token(&self, short_name: &str) -> String {
        std::env::var(Self::var_name(short_name)).unwrap_or_default()
    }
}

/// Fixed in-memory tokens, for tests.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    tokens: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, short_name: &str, token: &str) -> Self {
        self.tokens
            .insert(short_name.to_string(), token.to_string());
        self
    }
}

impl CredentialStore for StaticCredentials {
    fn token(&self, short_name: &str) -> String {
        self.tokens.get(short_name).cloned().unwrap_or_default()
    }
}
