//! Token lifecycle scenarios, including revocation racing verification.

use std::sync::Arc;

use idgate::auth::{AuthError, ManualClock, TokenManager, DEFAULT_TOKEN_TTL_SECS};
use idgate::models::user::User;

fn user(id: &str, name: &str, role: &str) -> User {
    User {
        id: id.into(),
        name: name.into(),
        password: String::new(),
        role: role.into(),
        first_name: None,
        last_name: None,
        age: None,
    }
}

#[test]
fn test_alice_token_expires_after_window() {
    let clock = ManualClock::new(1_700_000_000);
    let tokens = TokenManager::with_clock(b"secret", DEFAULT_TOKEN_TTL_SECS, Arc::new(clock.clone()));

    let token = tokens.issue(&user("u1", "alice", "admin")).unwrap();
    assert_eq!(tokens.verify(&token).unwrap().name, "alice");

    clock.advance(DEFAULT_TOKEN_TTL_SECS + 1);
    assert_eq!(tokens.verify(&token), Err(AuthError::Expired));
}

#[test]
fn test_revoke_then_verify_reports_revoked() {
    let tokens = TokenManager::new(b"secret", DEFAULT_TOKEN_TTL_SECS);
    let token = tokens.issue(&user("u1", "alice", "admin")).unwrap();

    tokens.revoke(&token).unwrap();
    assert_eq!(tokens.verify(&token), Err(AuthError::Revoked));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_revoke_and_verify() {
    let tokens = Arc::new(TokenManager::new(b"secret", DEFAULT_TOKEN_TTL_SECS));
    let issued: Vec<String> = (0..64)
        .map(|i| tokens.issue(&user(&format!("u{}", i), "bob", "user")).unwrap())
        .collect();

    let mut handles = Vec::new();
    for (i, token) in issued.iter().cloned().enumerate() {
        let tokens = tokens.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                tokens.revoke(&token).unwrap();
                tokens.revoke(&token).unwrap();
            } else {
                for _ in 0..10 {
                    tokens.verify(&token).unwrap();
                }
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(tokens.list_revoked().len(), 32);
    for (i, token) in issued.iter().enumerate() {
        let result = tokens.verify(token);
        if i % 2 == 0 {
            assert_eq!(result, Err(AuthError::Revoked));
        } else {
            assert!(result.is_ok());
        }
    }
}
