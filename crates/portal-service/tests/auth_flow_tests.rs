//! E2E tests for the account lifecycle: signup, email verification, login.
//!
//! ## Test Naming
//!
//! Tests follow the convention: `test_<feature>_<scenario>_<expected_result>`

use portal_test_utils::{TestPortalServer, STRONG_PASSWORD};
use reqwest::StatusCode;
use serde_json::json;

fn signup_body(username: &str) -> serde_json::Value {
    json!({
        "username": username,
        "password": STRONG_PASSWORD,
        "fullname": "A"
    })
}

/// Happy path: signup returns the new user's public view, without the
/// password hash or role flags.
#[tokio::test]
async fn test_signup_happy_path() -> Result<(), anyhow::Error> {
    let server = TestPortalServer::spawn().await?;

    let response = server
        .client()
        .post(server.api("/auth/signup"))
        .json(&signup_body("a@b.com"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK, "Signup should succeed");

    let body: serde_json::Value = response.json().await?;
    assert!(
        body["key"].as_str().is_some_and(|k| !k.is_empty()),
        "Response should include the assigned key"
    );
    assert_eq!(body["username"].as_str(), Some("a@b.com"));
    assert_eq!(body["fullname"].as_str(), Some("A"));
    assert!(
        body.get("hashed_password").is_none(),
        "Password hash must never be exposed"
    );
    assert!(body.get("is_superuser").is_none());

    Ok(())
}

/// A second signup with the same username is rejected.
#[tokio::test]
async fn test_signup_duplicate_username_rejected() -> Result<(), anyhow::Error> {
    let server = TestPortalServer::spawn().await?;

    let first = server
        .client()
        .post(server.api("/auth/signup"))
        .json(&signup_body("a@b.com"))
        .send()
        .await?;
    assert_eq!(first.status(), StatusCode::OK);

    let second = server
        .client()
        .post(server.api("/auth/signup"))
        .json(&signup_body("a@b.com"))
        .send()
        .await?;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = second.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("ALREADY_EXISTS"));

    Ok(())
}

/// Passwords that miss a required character class are rejected.
#[tokio::test]
async fn test_signup_weak_password_rejected() -> Result<(), anyhow::Error> {
    let server = TestPortalServer::spawn().await?;

    let response = server
        .client()
        .post(server.api("/auth/signup"))
        .json(&json!({
            "username": "a@b.com",
            "password": "alllowercase",
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("WEAK_PASSWORD"));

    Ok(())
}

/// Usernames must be email-shaped.
#[tokio::test]
async fn test_signup_invalid_email_rejected() -> Result<(), anyhow::Error> {
    let server = TestPortalServer::spawn().await?;

    let response = server
        .client()
        .post(server.api("/auth/signup"))
        .json(&signup_body("not-an-email"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("VALIDATION_ERROR"));

    Ok(())
}

/// The whole lifecycle: signup, verify once (second attempt fails), then
/// login and use the token.
#[tokio::test]
async fn test_signup_verify_login_flow() -> Result<(), anyhow::Error> {
    let server = TestPortalServer::spawn().await?;

    // Signup
    let response = server
        .client()
        .post(server.api("/auth/signup"))
        .json(&signup_body("a@b.com"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let created: serde_json::Value = response.json().await?;
    let user_key = created["key"].as_str().expect("key assigned").to_string();

    // Login before verification fails with a bare 401.
    let response = server
        .client()
        .post(server.api("/auth/token"))
        .form(&[("username", "a@b.com"), ("password", STRONG_PASSWORD)])
        .send()
        .await?;
    assert_eq!(
        response.status(),
        StatusCode::UNAUTHORIZED,
        "Unverified accounts cannot authenticate"
    );

    // Verify with the code from the store (as the emailed link would).
    let code = server
        .verification_code_for(&user_key)
        .await?
        .expect("verification record should exist");

    let response = server
        .client()
        .get(server.api(&format!("/auth/verify/{}", code)))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["detail"].as_str(), Some("User successfully verified"));

    // The code is consumed: a second attempt fails.
    let response = server
        .client()
        .get(server.api(&format!("/auth/verify/{}", code)))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"].as_str(), Some("INVALID_VERIFICATION"));

    // Login now succeeds and the token is usable.
    let response = server
        .client()
        .post(server.api("/auth/token"))
        .form(&[("username", "a@b.com"), ("password", STRONG_PASSWORD)])
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let token: serde_json::Value = response.json().await?;
    assert_eq!(token["token_type"].as_str(), Some("bearer"));
    let access_token = token["access_token"].as_str().expect("token issued");

    let response = server
        .client()
        .get(server.api("/user/me"))
        .bearer_auth(access_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let me: serde_json::Value = response.json().await?;
    assert_eq!(me["username"].as_str(), Some("a@b.com"));

    Ok(())
}

/// Unknown verification codes are rejected.
#[tokio::test]
async fn test_verify_unknown_code_rejected() -> Result<(), anyhow::Error> {
    let server = TestPortalServer::spawn().await?;

    let response = server
        .client()
        .get(server.api("/auth/verify/no-such-code"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

/// Wrong password and unknown username fail identically.
#[tokio::test]
async fn test_login_failures_are_uniform() -> Result<(), anyhow::Error> {
    let server = TestPortalServer::spawn().await?;
    server
        .seed_user("a@b.com", STRONG_PASSWORD, false, true)
        .await?;

    for (username, password) in [
        ("a@b.com", "Wrong1$password"),
        ("nobody@b.com", STRONG_PASSWORD),
    ] {
        let response = server
            .client()
            .post(server.api("/auth/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get("www-authenticate")
                .and_then(|h| h.to_str().ok()),
            Some("Bearer")
        );
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["code"].as_str(), Some("UNAUTHORIZED"));
    }

    Ok(())
}

/// Tampering with any part of the token invalidates it.
#[tokio::test]
async fn test_tampered_token_rejected() -> Result<(), anyhow::Error> {
    let server = TestPortalServer::spawn().await?;
    server
        .seed_user("a@b.com", STRONG_PASSWORD, false, true)
        .await?;
    let token = server.token_for("a@b.com")?;

    // Corrupt the signature segment.
    let mut tampered = token.clone();
    tampered.pop();
    tampered.push('x');

    let response = server
        .client()
        .get(server.api("/user/me"))
        .bearer_auth(&tampered)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The untampered token still works.
    let response = server
        .client()
        .get(server.api("/user/me"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

/// A valid token whose subject no longer resolves to a user is rejected.
#[tokio::test]
async fn test_token_for_unknown_subject_rejected() -> Result<(), anyhow::Error> {
    let server = TestPortalServer::spawn().await?;
    let token = server.token_for("ghost@b.com")?;

    let response = server
        .client()
        .get(server.api("/user/me"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_health_endpoint() -> Result<(), anyhow::Error> {
    let server = TestPortalServer::spawn().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint() -> Result<(), anyhow::Error> {
    let server = TestPortalServer::spawn().await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
