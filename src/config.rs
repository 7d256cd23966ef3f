use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(anyhow::anyhow!("Unknown store backend: {s}")),
        }
    }
}

/// Key material used to verify bearer tokens from the identity provider.
#[derive(Debug, Clone)]
pub enum AuthKey {
    /// HS256 shared secret.
    Secret(String),
    /// RS256 public key in PEM form.
    RsaPublicPem(String),
    /// JWKS endpoint of the identity provider; keys are selected by `kid`.
    JwksUrl(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub database_acquire_timeout_seconds: u64,
    pub auth_key: AuthKey,
    pub auth_issuer: Option<String>,
    pub auth_audience: Option<String>,
    pub spoonacular_api_key: Option<String>,
    pub spoonacular_base_url: String,
    pub recipe_search_limit: u32,
    pub upstream_timeout_seconds: u64,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let store_backend: StoreBackend = var("STORE_BACKEND")
            .unwrap_or_else(|| "postgres".into())
            .parse()?;

        let database_url = var("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("Missing required env var: DATABASE_URL");
        }

        // PEM values pasted into env files usually carry escaped newlines.
        let auth_key = match (
            var("AUTH_JWKS_URL"),
            var("AUTH_JWT_PUBLIC_KEY"),
            var("AUTH_JWT_SECRET"),
        ) {
            (Some(url), _, _) => AuthKey::JwksUrl(url),
            (None, Some(pem), _) => AuthKey::RsaPublicPem(pem.replace("\\n", "\n")),
            (None, None, Some(secret)) => AuthKey::Secret(secret),
            (None, None, None) => anyhow::bail!(
                "Missing required env var: AUTH_JWKS_URL, AUTH_JWT_PUBLIC_KEY or AUTH_JWT_SECRET"
            ),
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: var("PORT").unwrap_or_else(|| "8080".into()).parse()?,
            store_backend,
            database_url,
            database_max_connections: positive(
                "DATABASE_MAX_CONNECTIONS",
                var("DATABASE_MAX_CONNECTIONS"),
                "10",
            )?,
            database_acquire_timeout_seconds: positive(
                "DATABASE_ACQUIRE_TIMEOUT_SECONDS",
                var("DATABASE_ACQUIRE_TIMEOUT_SECONDS"),
                "5",
            )?,
            auth_key,
            auth_issuer: var("AUTH_JWT_ISSUER"),
            auth_audience: var("AUTH_JWT_AUDIENCE"),
            spoonacular_api_key: var("SPOONACULAR_API_KEY"),
            spoonacular_base_url: var("SPOONACULAR_BASE_URL")
                .unwrap_or_else(|| "https://api.spoonacular.com".into())
                .trim_end_matches('/')
                .to_string(),
            recipe_search_limit: positive("RECIPE_SEARCH_LIMIT", var("RECIPE_SEARCH_LIMIT"), "12")?,
            upstream_timeout_seconds: positive(
                "UPSTREAM_TIMEOUT_SECONDS",
                var("UPSTREAM_TIMEOUT_SECONDS"),
                "10",
            )?,
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

/// Parses a count or duration that must be at least 1.
fn positive<T>(key: &str, value: Option<String>, default: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let parsed: T = value.as_deref().unwrap_or(default).parse()?;
    if parsed < T::from(1) {
        anyhow::bail!("{key} must be greater than zero");
    }
    Ok(parsed)
}
