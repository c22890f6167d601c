//! Environment variable names read by the server.
//!
//! The startup contract and the typed loader both reference these constants,
//! so a key that is validated is always the key that gets parsed.

pub const PORT: &str = "PORT";
pub const USE_API_PREFIX: &str = "USE_API_PREFIX";
pub const USE_CERN_SSO: &str = "USE_CERN_SSO";

pub const TYPEORM_CONNECTION: &str = "TYPEORM_CONNECTION";
pub const TYPEORM_HOST: &str = "TYPEORM_HOST";
pub const TYPEORM_USERNAME: &str = "TYPEORM_USERNAME";
pub const TYPEORM_PASSWORD: &str = "TYPEORM_PASSWORD";
pub const TYPEORM_DATABASE: &str = "TYPEORM_DATABASE";
pub const TYPEORM_PORT: &str = "TYPEORM_PORT";
pub const TYPEORM_SYNCHRONIZE: &str = "TYPEORM_SYNCHRONIZE";
pub const TYPEORM_LOGGING: &str = "TYPEORM_LOGGING";
pub const TYPEORM_ENTITIES: &str = "TYPEORM_ENTITIES";
pub const TYPEORM_MIGRATIONS: &str = "TYPEORM_MIGRATIONS";
pub const TYPEORM_MIGRATIONS_DIR: &str = "TYPEORM_MIGRATIONS_DIR";

pub const JWT_SECRET_KEY: &str = "JWT_SECRET_KEY";
pub const JWT_EXPIRE_TIME: &str = "JWT_EXPIRE_TIME";
pub const SUB_SYSTEM_TOKEN_EXPIRES_IN: &str = "SUB_SYSTEM_TOKEN_EXPIRES_IN";
pub const USE_INFO_LOGGER: &str = "USE_INFO_LOGGER";

/// Optional. Upper bound on one identity-provider round-trip, in seconds.
pub const PROVIDER_TIMEOUT_SECONDS: &str = "PROVIDER_TIMEOUT_SECONDS";

/// Keys of one identity provider, all sharing the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderKeys {
    pub client_id: &'static str,
    pub client_secret: &'static str,
    pub auth_token_host: &'static str,
    pub auth_token_path: &'static str,
    pub resource_api_url: &'static str,
    pub auth_url: &'static str,
}

impl ProviderKeys {
    /// The keys in the order they are reported when missing.
    #[must_use]
    pub const fn all(&self) -> [&'static str; 6] {
        [
            self.client_id,
            self.client_secret,
            self.auth_token_host,
            self.auth_token_path,
            self.resource_api_url,
            self.auth_url,
        ]
    }
}

pub const CERN: ProviderKeys = ProviderKeys {
    client_id: "CERN_CLIENT_ID",
    client_secret: "CERN_CLIENT_SECRET",
    auth_token_host: "CERN_AUTH_TOKEN_HOST",
    auth_token_path: "CERN_AUTH_TOKEN_PATH",
    resource_api_url: "CERN_RESOURCE_API_URL",
    auth_url: "CERN_AUTH_URL",
};

pub const GITHUB: ProviderKeys = ProviderKeys {
    client_id: "GITHUB_CLIENT_ID",
    client_secret: "GITHUB_CLIENT_SECRET",
    auth_token_host: "GITHUB_AUTH_TOKEN_HOST",
    auth_token_path: "GITHUB_AUTH_TOKEN_PATH",
    resource_api_url: "GITHUB_RESOURCE_API_URL",
    auth_url: "GITHUB_AUTH_URL",
};

/// Value left in example `.env` files where the OAuth client id belongs.
pub const CLIENT_ID_PLACEHOLDER: &str = "CLIENT_ID_HERE";
