use std::collections::BTreeMap;

use oauth2_core::{AccessRequest, User};
use oauth2_ports::Storage;

fn io(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

/// A minimal contract test suite that every `Storage` backend must satisfy.
pub async fn run_storage_contract(storage: &dyn Storage) -> Result<(), Box<dyn std::error::Error>> {
    // User roundtrip
    let user = User::with_password("user_1".to_string(), "hunter2").map_err(io)?;
    storage.save_user(&user).await.map_err(io)?;

    let fetched_user = storage
        .get_user_by_username("user_1")
        .await
        .map_err(io)?
        .ok_or_else(|| io("user should exist"))?;

    assert_eq!(fetched_user.id, user.id);
    assert_eq!(fetched_user.password_hash, user.password_hash);
    assert!(fetched_user.enabled);

    assert!(storage
        .get_user_by_username("nobody")
        .await
        .map_err(io)?
        .is_none());

    // Uniqueness parity: usernames are unique.
    let dup_user = User::with_password("user_1".to_string(), "other").map_err(io)?;
    assert!(
        storage.save_user(&dup_user).await.is_err(),
        "saving the same username twice should fail"
    );

    // Session roundtrip + delete
    let form: BTreeMap<String, String> = [
        ("grant_type", "password"),
        ("username", "user_1"),
        ("password", "hunter2"),
        ("client_secret", "s3cret"),
        ("scope", "read write"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let mut request = AccessRequest::new("client_1", "password", form);
    request.grant_scope("read");
    request.grant_scope("write");

    storage
        .create_access_token_session("signature_1", &request)
        .await
        .map_err(io)?;

    let session = storage
        .get_access_token_session("signature_1")
        .await
        .map_err(io)?
        .ok_or_else(|| io("session should exist"))?;

    assert_eq!(session.request_id, request.id);
    assert_eq!(session.client_id, "client_1");
    assert_eq!(session.grant_type, "password");
    assert_eq!(session.granted_scopes, vec!["read", "write"]);
    assert_eq!(session.form.get("username").map(String::as_str), Some("user_1"));
    assert!(!session.form.contains_key("password"));
    assert!(!session.form.contains_key("client_secret"));

    assert!(
        storage
            .create_access_token_session("signature_1", &request)
            .await
            .is_err(),
        "signatures are unique"
    );

    storage
        .delete_access_token_session("signature_1")
        .await
        .map_err(io)?;
    assert!(storage
        .get_access_token_session("signature_1")
        .await
        .map_err(io)?
        .is_none());

    // Deleting a missing session is not an error.
    storage
        .delete_access_token_session("signature_1")
        .await
        .map_err(io)?;

    storage.healthcheck().await.map_err(io)?;

    Ok(())
}
