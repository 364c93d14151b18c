//! Identity service: accounts, sessions and the admin gate

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        shell::{ShellAction, ShellState, ShellView},
        Account, Credentials, SessionClaims,
    },
    repository::{IdentityStore, Repository},
};

/// Decides whether an account may use the management endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminPolicy: Send + Sync {
    async fn is_admin(&self, account_id: Uuid) -> AppResult<bool>;
}

/// Admin policy backed by the `admin_users` allow-list
pub struct AllowListPolicy {
    identity: Arc<dyn IdentityStore>,
}

impl AllowListPolicy {
    pub fn new(identity: Arc<dyn IdentityStore>) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl AdminPolicy for AllowListPolicy {
    async fn is_admin(&self, account_id: Uuid) -> AppResult<bool> {
        self.identity.is_admin(account_id).await
    }
}

/// Current account and its admin flag
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionInfo {
    pub account: Account,
    pub is_admin: bool,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
    admin_policy: Arc<dyn AdminPolicy>,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        let policy = Arc::new(AllowListPolicy::new(repository.identity.clone()));
        Self::with_policy(repository, config, policy)
    }

    pub fn with_policy(repository: Repository, config: AuthConfig, admin_policy: Arc<dyn AdminPolicy>) -> Self {
        Self {
            repository,
            config,
            admin_policy,
        }
    }

    /// Register a new account
    pub async fn sign_up(&self, credentials: Credentials) -> AppResult<Account> {
        credentials.validate()?;
        let email = credentials.email.trim().to_string();

        let password_hash = self.hash_password(&credentials.password)?;
        let account = self
            .repository
            .identity
            .create_account(&email, &password_hash)
            .await?;

        if self
            .config
            .bootstrap_admins
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(&email))
        {
            self.repository.identity.grant_admin(account.id).await?;
            tracing::info!("Account {} added to the admin allow-list", account.email);
        }

        tracing::info!("Account {} signed up", account.id);
        Ok(account)
    }

    /// Check credentials and open a session; returns the bearer token
    pub async fn sign_in(&self, credentials: Credentials) -> AppResult<(String, SessionInfo)> {
        let account = self
            .repository
            .identity
            .find_account_by_email(credentials.email.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&account, &credentials.password)? {
            tracing::warn!("Failed sign-in for account {}", account.id);
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let now = Utc::now();
        let expires_at = self.session_expiry(now)?;

        let pruned = self.repository.identity.delete_expired_sessions(now).await?;
        if pruned > 0 {
            tracing::debug!("Removed {} expired sessions", pruned);
        }

        let session = self
            .repository
            .identity
            .create_session(account.id, expires_at)
            .await?;

        let claims = SessionClaims {
            sub: account.id,
            sid: session.id,
            email: account.email.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        let is_admin = self.admin_policy.is_admin(account.id).await?;
        tracing::info!("Account {} signed in (admin: {})", account.id, is_admin);

        Ok((token, SessionInfo { account, is_admin }))
    }

    /// Resolve a bearer token to a live session
    pub async fn authenticate(&self, token: &str) -> AppResult<SessionClaims> {
        let claims = SessionClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let session = self
            .repository
            .identity
            .get_session(claims.sid)
            .await?
            .ok_or_else(|| AppError::Authentication("Session has ended".to_string()))?;

        if session.account_id != claims.sub {
            return Err(AppError::Authentication("Session has ended".to_string()));
        }

        if session.is_expired_at(Utc::now()) {
            self.repository.identity.delete_session(session.id).await?;
            return Err(AppError::Authentication("Session has ended".to_string()));
        }

        Ok(claims)
    }

    /// Revoke the session behind the token
    pub async fn sign_out(&self, claims: &SessionClaims) -> AppResult<()> {
        self.repository.identity.delete_session(claims.sid).await?;
        tracing::info!("Account {} signed out", claims.sub);
        Ok(())
    }

    pub async fn current_session(&self, claims: &SessionClaims) -> AppResult<SessionInfo> {
        let account = self.repository.identity.get_account(claims.sub).await?;
        let is_admin = self.admin_policy.is_admin(account.id).await?;
        Ok(SessionInfo { account, is_admin })
    }

    /// Require admin privileges
    pub async fn require_admin(&self, claims: &SessionClaims) -> AppResult<()> {
        if self.admin_policy.is_admin(claims.sub).await? {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator privileges required".to_string(),
            ))
        }
    }

    /// Shell state for an optional session: management pages for admins, login otherwise
    pub async fn shell_view(&self, claims: Option<&SessionClaims>) -> AppResult<ShellView> {
        let is_admin = match claims {
            Some(claims) => self.admin_policy.is_admin(claims.sub).await?,
            None => false,
        };
        let state = ShellState::default().apply(ShellAction::SessionResolved { is_admin });

        Ok(ShellView::new(state, claims.map(|c| c.email.clone())))
    }

    fn session_expiry(&self, now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        i64::try_from(self.config.session_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Session lifetime of {} hours is out of range",
                    self.config.session_hours
                ))
            })
    }

    fn verify_password(&self, account: &Account, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&account.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
