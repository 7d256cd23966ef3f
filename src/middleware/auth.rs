use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{
    decode, decode_header,
    jwk::{AlgorithmParameters, JwkSet},
    Algorithm, DecodingKey, Validation,
};
use tokio::sync::{Mutex, RwLock};

use crate::{
    config::{AuthKey, Config},
    error::ApiError,
    models::auth::{AuthenticatedUser, Claims},
    AppState,
};

/// Unknown `kid`s trigger a key-set refetch at most this often.
const JWKS_MIN_REFRESH: Duration = Duration::from_secs(30);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized("Missing or invalid authorization header"))?;

        state.verifier.verify(token).await.map_err(|e| {
            tracing::debug!("Rejected bearer token: {e}");
            ApiError::Unauthorized("Invalid or expired token")
        })
    }
}

enum KeySource {
    Static(DecodingKey),
    Jwks(JwksKeys),
}

/// Provider signing keys by `kid`, refetched when a token names a key not yet seen.
struct JwksKeys {
    url: String,
    client: reqwest::Client,
    min_refresh: Duration,
    keys: RwLock<HashMap<String, (DecodingKey, Vec<Algorithm>)>>,
    last_refresh: Mutex<Option<Instant>>,
}

impl JwksKeys {
    async fn key(&self, kid: &str) -> anyhow::Result<(DecodingKey, Vec<Algorithm>)> {
        if let Some(found) = self.keys.read().await.get(kid) {
            return Ok(found.clone());
        }
        self.refresh().await?;
        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown signing key: {kid}"))
    }

    async fn refresh(&self) -> anyhow::Result<()> {
        let mut last = self.last_refresh.lock().await;
        if last.is_some_and(|at| at.elapsed() < self.min_refresh) {
            return Ok(());
        }

        let set: JwkSet = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut keys = HashMap::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            // The key type pins the algorithm family a token may claim.
            let algorithms = match &jwk.algorithm {
                AlgorithmParameters::RSA(_) => vec![
                    Algorithm::RS256,
                    Algorithm::RS384,
                    Algorithm::RS512,
                    Algorithm::PS256,
                    Algorithm::PS384,
                    Algorithm::PS512,
                ],
                AlgorithmParameters::EllipticCurve(_) => vec![Algorithm::ES256, Algorithm::ES384],
                AlgorithmParameters::OctetKey(_) => {
                    vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512]
                }
                AlgorithmParameters::OctetKeyPair(_) => vec![Algorithm::EdDSA],
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, (key, algorithms));
                }
                Err(e) => tracing::warn!("Skipping unusable JWKS key {kid}: {e}"),
            }
        }

        tracing::info!("Loaded {} signing key(s) from {}", keys.len(), self.url);
        *self.keys.write().await = keys;
        *last = Some(Instant::now());
        Ok(())
    }
}

/// Verifies identity-provider tokens and resolves them to a user id.
pub struct IdentityVerifier {
    source: KeySource,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let issuer = config.auth_issuer.as_deref();
        let audience = config.auth_audience.as_deref();
        match &config.auth_key {
            AuthKey::Secret(secret) => Ok(Self::new(
                KeySource::Static(DecodingKey::from_secret(secret.as_bytes())),
                Algorithm::HS256,
                issuer,
                audience,
            )),
            AuthKey::RsaPublicPem(pem) => Ok(Self::new(
                KeySource::Static(DecodingKey::from_rsa_pem(pem.as_bytes())?),
                Algorithm::RS256,
                issuer,
                audience,
            )),
            AuthKey::JwksUrl(url) => Self::jwks(
                url,
                issuer,
                audience,
                Duration::from_secs(config.upstream_timeout_seconds),
                JWKS_MIN_REFRESH,
            ),
        }
    }

    /// HS256 verifier without issuer/audience checks.
    pub fn hs256(secret: &str) -> Self {
        Self::new(
            KeySource::Static(DecodingKey::from_secret(secret.as_bytes())),
            Algorithm::HS256,
            None,
            None,
        )
    }

    /// Verifier backed by the provider's published key set.
    pub fn jwks(
        url: &str,
        issuer: Option<&str>,
        audience: Option<&str>,
        timeout: Duration,
        min_refresh: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let source = KeySource::Jwks(JwksKeys {
            url: url.to_string(),
            client,
            min_refresh,
            keys: RwLock::new(HashMap::new()),
            last_refresh: Mutex::new(None),
        });
        Ok(Self::new(source, Algorithm::RS256, issuer, audience))
    }

    fn new(source: KeySource, algorithm: Algorithm, issuer: Option<&str>, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        Self { source, validation }
    }

    pub async fn verify(&self, token: &str) -> anyhow::Result<AuthenticatedUser> {
        let claims = match &self.source {
            KeySource::Static(key) => decode::<Claims>(token, key, &self.validation)?.claims,
            KeySource::Jwks(jwks) => {
                let kid = decode_header(token)?
                    .kid
                    .ok_or_else(|| anyhow::anyhow!("token header has no kid"))?;
                let (key, algorithms) = jwks.key(&kid).await?;
                let mut validation = self.validation.clone();
                validation.algorithms = algorithms;
                decode::<Claims>(token, &key, &validation)?.claims
            }
        };

        let user_id = claims.sub;
        if user_id.trim().is_empty() {
            anyhow::bail!("token subject is empty");
        }
        Ok(AuthenticatedUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{extract::State, routing::get, Json, Router};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    const SECRET: &str = "test-secret";

    // base64url of the two signing secrets below.
    const K1_SECRET: &str = "jwks-signing-secret-1";
    const K1_B64: &str = "andrcy1zaWduaW5nLXNlY3JldC0x";
    const K2_SECRET: &str = "jwks-signing-secret-2";
    const K2_B64: &str = "andrcy1zaWduaW5nLXNlY3JldC0y";

    fn claims(sub: &str, exp_offset: i64) -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: sub.to_string(),
            exp: (now + exp_offset) as usize,
            iat: now as usize,
        }
    }

    fn token(sub: &str, exp_offset: i64, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims(sub, exp_offset),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn token_with_kid(sub: &str, kid: &str, secret: &str) -> String {
        let header = Header {
            kid: Some(kid.to_string()),
            ..Header::new(Algorithm::HS256)
        };
        encode(&header, &claims(sub, 3600), &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn key_set(kid: &str, k: &str) -> Value {
        json!({ "keys": [{ "kty": "oct", "kid": kid, "alg": "HS256", "k": k }] })
    }

    /// Serves whatever key set is currently in `keys` at /jwks.
    async fn spawn_jwks(keys: Arc<Mutex<Value>>) -> String {
        let app = Router::new()
            .route(
                "/jwks",
                get(|State(keys): State<Arc<Mutex<Value>>>| async move {
                    Json(keys.lock().await.clone())
                }),
            )
            .with_state(keys);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/jwks")
    }

    fn jwks_verifier(url: &str) -> IdentityVerifier {
        IdentityVerifier::jwks(url, None, None, Duration::from_secs(2), Duration::ZERO).unwrap()
    }

    #[tokio::test]
    async fn resolves_subject_of_valid_token() {
        let verifier = IdentityVerifier::hs256(SECRET);
        let user = verifier.verify(&token("u1", 3600, SECRET)).await.unwrap();
        assert_eq!(user.user_id, "u1");
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let verifier = IdentityVerifier::hs256(SECRET);
        assert!(verifier.verify(&token("u1", -3600, SECRET)).await.is_err());
    }

    #[tokio::test]
    async fn rejects_wrong_signature() {
        let verifier = IdentityVerifier::hs256(SECRET);
        assert!(verifier.verify(&token("u1", 3600, "other-secret")).await.is_err());
    }

    #[tokio::test]
    async fn rejects_empty_subject() {
        let verifier = IdentityVerifier::hs256(SECRET);
        assert!(verifier.verify(&token("  ", 3600, SECRET)).await.is_err());
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let verifier = IdentityVerifier::hs256(SECRET);
        assert!(verifier.verify("not-a-jwt").await.is_err());
    }

    #[tokio::test]
    async fn jwks_selects_key_by_kid() {
        let url = spawn_jwks(Arc::new(Mutex::new(key_set("k1", K1_B64)))).await;
        let verifier = jwks_verifier(&url);

        let user = verifier.verify(&token_with_kid("u1", "k1", K1_SECRET)).await.unwrap();
        assert_eq!(user.user_id, "u1");

        // Right kid, wrong key material.
        assert!(verifier.verify(&token_with_kid("u1", "k1", K2_SECRET)).await.is_err());
        // Unknown kid and missing kid.
        assert!(verifier.verify(&token_with_kid("u1", "k9", K1_SECRET)).await.is_err());
        assert!(verifier.verify(&token("u1", 3600, K1_SECRET)).await.is_err());
    }

    #[tokio::test]
    async fn jwks_picks_up_rotated_keys() {
        let keys = Arc::new(Mutex::new(key_set("k1", K1_B64)));
        let url = spawn_jwks(keys.clone()).await;
        let verifier = jwks_verifier(&url);

        verifier.verify(&token_with_kid("u1", "k1", K1_SECRET)).await.unwrap();

        *keys.lock().await = key_set("k2", K2_B64);
        let user = verifier.verify(&token_with_kid("u2", "k2", K2_SECRET)).await.unwrap();
        assert_eq!(user.user_id, "u2");

        // The retired key is gone after the refresh.
        assert!(verifier.verify(&token_with_kid("u1", "k1", K1_SECRET)).await.is_err());
    }

    #[tokio::test]
    async fn jwks_refetch_is_throttled() {
        let keys = Arc::new(Mutex::new(key_set("k1", K1_B64)));
        let url = spawn_jwks(keys.clone()).await;
        let verifier =
            IdentityVerifier::jwks(&url, None, None, Duration::from_secs(2), Duration::from_secs(3600))
                .unwrap();

        verifier.verify(&token_with_kid("u1", "k1", K1_SECRET)).await.unwrap();
        *keys.lock().await = key_set("k2", K2_B64);
        assert!(verifier.verify(&token_with_kid("u2", "k2", K2_SECRET)).await.is_err());
    }
}
