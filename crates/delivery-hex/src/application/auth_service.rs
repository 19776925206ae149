use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use delivery_types::domain::user::{Role, User};
use delivery_types::ports::user_repository::UserRepository;

/// Signing and hashing parameters, fixed for the lifetime of the service.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::hours(24),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct AuthService<R: UserRepository> {
    repo: R,
    config: AuthConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(repo: R, config: AuthConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            repo,
            config,
            encoding,
            decoding,
        }
    }

    /// Create the account and return a session token for it. A taken
    /// username is reported as a generic store failure.
    pub async fn register(
        &self,
        username: String,
        password: String,
        role: Role,
        phone: String,
    ) -> Result<String, AppError> {
        User::validate_username(&username).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let hash = self.hash_password(password).await?;
        let user = User::new(username, hash, role, phone)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let username = user.username.clone();

        self.repo.create(user).await.map_err(|e| {
            tracing::warn!(%username, error = %e, "registration failed");
            AppError::Store("Failed to register user", e)
        })?;
        tracing::info!(%username, %role, "user registered");

        self.issue_token(&username)
    }

    pub async fn login(&self, username: &str, password: String) -> Result<String, AppError> {
        let stored = self
            .repo
            .password_hash(username)
            .await
            .map_err(|e| AppError::Store("Failed to log in", e))?;
        let Some(hash) = stored else {
            tracing::info!(%username, "login for unknown user");
            return Err(AppError::Unauthorized);
        };

        if !self.verify_password(password, hash).await? {
            tracing::info!(%username, "login with wrong password");
            return Err(AppError::Unauthorized);
        }

        self.issue_token(username)
    }

    pub fn issue_token(&self, username: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.config.token_ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("token expiry out of range")))?;
        let claims = Claims {
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("Error generating token")))
    }

    /// Check signature and expiry of a token issued with this service's key.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AppError::Unauthorized
            })
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let cost = self.config.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| AppError::Internal(e.into()))
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AppError> {
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        // A hash bcrypt cannot parse is treated like a mismatch.
        Ok(verified.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivery_repo::memory::InMemoryRepo;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            bcrypt_cost: 4,
            ..AuthConfig::new(secret)
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let svc = AuthService::new(InMemoryRepo::new(), config("k1"));
        let token = svc
            .register("alice".into(), "pw123".into(), Role::Customer, "555".into())
            .await
            .unwrap();
        assert_eq!(svc.verify(&token).unwrap().username, "alice");

        let token = svc.login("alice", "pw123".into()).await.unwrap();
        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_unauthorized() {
        let svc = AuthService::new(InMemoryRepo::new(), config("k1"));
        svc.register("bob".into(), "right".into(), Role::Driver, "1".into())
            .await
            .unwrap();

        let wrong = svc.login("bob", "wrong".into()).await;
        assert!(matches!(wrong, Err(AppError::Unauthorized)));

        let missing = svc.login("carol", "right".into()).await;
        assert!(matches!(missing, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_store_failure() {
        let svc = AuthService::new(InMemoryRepo::new(), config("k1"));
        svc.register("alice".into(), "pw".into(), Role::Customer, "555".into())
            .await
            .unwrap();
        let dup = svc
            .register("alice".into(), "other".into(), Role::Driver, "556".into())
            .await;
        assert!(matches!(dup, Err(AppError::Store("Failed to register user", _))));

        // The original password still works.
        assert!(svc.login("alice", "pw".into()).await.is_ok());
    }

    #[tokio::test]
    async fn blank_username_is_rejected() {
        let svc = AuthService::new(InMemoryRepo::new(), config("k1"));
        let res = svc
            .register(" ".into(), "pw".into(), Role::Customer, "555".into())
            .await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn blank_username_is_rejected_before_hashing() {
        // bcrypt refuses this cost, so reaching the hasher would be an internal error.
        let cfg = AuthConfig {
            bcrypt_cost: 99,
            ..config("k1")
        };
        let svc = AuthService::new(InMemoryRepo::new(), cfg);
        let res = svc
            .register("".into(), "pw".into(), Role::Customer, "555".into())
            .await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));

        let res = svc
            .register("erin".into(), "pw".into(), Role::Customer, "555".into())
            .await;
        assert!(matches!(res, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn stored_hash_is_not_the_password() {
        let repo = InMemoryRepo::new();
        let svc = AuthService::new(repo.clone(), config("k1"));
        svc.register("dan".into(), "pw123".into(), Role::Customer, "1".into())
            .await
            .unwrap();
        let hash = repo.users.get("dan").unwrap().password_hash.clone();
        assert_ne!(hash, "pw123");
        assert!(bcrypt::verify("pw123", &hash).unwrap());
    }

    #[test]
    fn tokens_do_not_verify_under_another_key() {
        let a = AuthService::new(InMemoryRepo::new(), config("key-a"));
        let b = AuthService::new(InMemoryRepo::new(), config("key-b"));
        let token = a.issue_token("alice").unwrap();
        assert!(a.verify(&token).is_ok());
        assert!(matches!(b.verify(&token), Err(AppError::Unauthorized)));
        assert!(matches!(a.verify("not-a-token"), Err(AppError::Unauthorized)));
    }

    #[test]
    fn overflowing_ttl_is_an_internal_error() {
        let cfg = AuthConfig {
            token_ttl: Duration::try_hours(100_000_000_000).unwrap(),
            ..config("k1")
        };
        let svc = AuthService::new(InMemoryRepo::new(), cfg);
        assert!(matches!(
            svc.issue_token("alice"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let cfg = AuthConfig {
            token_ttl: Duration::hours(-2),
            ..config("k1")
        };
        let svc = AuthService::new(InMemoryRepo::new(), cfg);
        let token = svc.issue_token("alice").unwrap();
        assert!(matches!(svc.verify(&token), Err(AppError::Unauthorized)));
    }
}
