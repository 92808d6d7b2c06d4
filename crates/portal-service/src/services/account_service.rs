//! Account lifecycle: signup, email verification, and login.
//!
//! The per-user state machine is `unverified --(verify)--> verified`; no
//! other transition touches the flag and it never reverts.

use chrono::{Duration, Utc};

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{TokenResponse, UserCreate, UserRead};
use crate::observability::{
    record_email_delivery, record_login, record_signup, record_verification,
};
use crate::repositories::{users, verifications};
use crate::security;
use crate::services::mailer::Mailer;
use crate::store::Store;

/// Well-formed bcrypt hash matching no password. Verified when login finds
/// no unique user, so the timing profile does not reveal which check failed.
const DUMMY_PASSWORD_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Sign up a new account.
///
/// # Steps
///
/// 1. Validate the username is email-shaped
/// 2. Check the username is not taken (check-then-act; see DESIGN.md)
/// 3. Validate the password against the policy
/// 4. Hash the password and persist the user (`is_verified = false`)
/// 5. Create the verification record and fire the email
///
/// The email send runs on a spawned task; its failure is logged and
/// counted, never surfaced to the caller.
pub async fn signup(
    store: &dyn Store,
    mailer: &Mailer,
    config: &Config,
    request: UserCreate,
) -> Result<UserRead, ApiError> {
    if !security::is_valid_email(&request.username) {
        record_signup("invalid_email");
        return Err(ApiError::Validation(
            "username must be a valid email address".to_string(),
        ));
    }

    if users::username_exists(store, &request.username).await? {
        record_signup("already_exists");
        return Err(ApiError::AlreadyExists("user"));
    }

    if !security::validate_password_policy(&request.password) {
        record_signup("weak_password");
        return Err(ApiError::WeakPassword);
    }

    let user = persist_new_user(store, mailer, config, &request).await?;

    record_signup("success");
    Ok(user)
}

/// Create a user on behalf of an administrator.
///
/// Same uniqueness and email checks as signup, but the password policy is
/// not enforced on admin-chosen passwords. The new account still starts
/// unverified and receives a verification email.
pub async fn admin_create_user(
    store: &dyn Store,
    mailer: &Mailer,
    config: &Config,
    request: UserCreate,
) -> Result<UserRead, ApiError> {
    if !security::is_valid_email(&request.username) {
        return Err(ApiError::Validation(
            "username must be a valid email address".to_string(),
        ));
    }

    if users::username_exists(store, &request.username).await? {
        return Err(ApiError::AlreadyExists("user"));
    }

    persist_new_user(store, mailer, config, &request).await
}

/// Consume a verification code and mark the referenced user verified.
///
/// Fails with `InvalidVerification` when the code is unknown, expired, or
/// references a user that no longer exists. A consumed code stays invalid:
/// the record is deleted on success.
pub async fn verify(store: &dyn Store, key: &str) -> Result<(), ApiError> {
    let verification = match verifications::get(store, key).await? {
        Some(verification) => verification,
        None => {
            record_verification("invalid");
            return Err(ApiError::InvalidVerification);
        }
    };

    if verification.expires_at < Utc::now() {
        tracing::debug!("Verification code expired");
        record_verification("invalid");
        return Err(ApiError::InvalidVerification);
    }

    let mut user = match users::get(store, &verification.user_key).await? {
        Some(user) => user,
        None => {
            // Dangling record; the user was deleted after signup.
            record_verification("invalid");
            return Err(ApiError::InvalidVerification);
        }
    };

    user.is_verified = true;
    users::save(store, user).await?;
    verifications::delete(store, key).await?;

    record_verification("success");
    Ok(())
}

/// Authenticate a user and issue a bearer token.
///
/// Unknown username, duplicate username, unverified account, and wrong
/// password all fail with the same bare `Unauthorized` — no information
/// leak distinguishing the cases.
pub async fn login(
    store: &dyn Store,
    config: &Config,
    username: &str,
    password: &str,
) -> Result<TokenResponse, ApiError> {
    let user = users::get_by_username(store, username).await?;

    // Always run bcrypt, against a dummy hash when no unique user matched.
    let hash = user
        .as_ref()
        .map(|u| u.hashed_password.as_str())
        .unwrap_or(DUMMY_PASSWORD_HASH);
    let password_ok = security::verify_password(password, hash)?;

    let user = match user {
        Some(user) if user.is_verified && password_ok => user,
        _ => {
            record_login("failure");
            return Err(ApiError::Unauthorized);
        }
    };

    let ttl = Duration::minutes(config.access_token_ttl_minutes);
    let access_token = security::issue_access_token(&user.username, ttl, &config.secret_key)?;

    record_login("success");
    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    })
}

async fn persist_new_user(
    store: &dyn Store,
    mailer: &Mailer,
    config: &Config,
    request: &UserCreate,
) -> Result<UserRead, ApiError> {
    let hashed_password = security::hash_password(&request.password, config.bcrypt_cost)?;
    let user = users::create(
        store,
        &request.username,
        request.fullname.as_deref(),
        &hashed_password,
    )
    .await?;

    let user = UserRead::from(user);
    issue_verification(store, mailer, config, &user).await?;

    Ok(user)
}

/// Create the verification record and fire the email on a spawned task.
async fn issue_verification(
    store: &dyn Store,
    mailer: &Mailer,
    config: &Config,
    user: &UserRead,
) -> Result<(), ApiError> {
    let expires_at = Utc::now() + Duration::hours(config.verification_ttl_hours);
    let verification = verifications::create(store, &user.key, expires_at).await?;
    let code = verification.key.unwrap_or_default();

    let mailer = mailer.clone();
    let recipient = user.username.clone();
    tokio::spawn(async move {
        match mailer.send_verification_email(&recipient, &code).await {
            Ok(()) => record_email_delivery("success"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send verification email");
                record_email_delivery("error");
            }
        }
    });

    Ok(())
}
