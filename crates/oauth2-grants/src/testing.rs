//! In-memory fakes for the ports.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use oauth2_core::{AccessRequest, AccessTokenSession, OAuth2Error, User};
use oauth2_ports::{
    AccessTokenStrategy, CredentialAuthenticator, CredentialError, GeneratedToken, Storage,
};

#[derive(Default)]
pub struct MemoryStorage {
    pub users: Mutex<HashMap<String, User>>,
    pub sessions: Mutex<HashMap<String, AccessTokenSession>>,
    pub fail: bool,
}

impl MemoryStorage {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), OAuth2Error> {
        if self.fail {
            return Err(OAuth2Error::server_error("storage offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn init(&self) -> Result<(), OAuth2Error> {
        self.check()
    }

    async fn save_user(&self, user: &User) -> Result<(), OAuth2Error> {
        self.check()?;
        self.users
            .lock()
            .unwrap()
            .insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, OAuth2Error> {
        self.check()?;
        Ok(self.users.lock().unwrap().get(username).cloned())
    }

    async fn create_access_token_session(
        &self,
        signature: &str,
        request: &AccessRequest,
    ) -> Result<(), OAuth2Error> {
        self.check()?;
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(signature) {
            return Err(OAuth2Error::invalid_request("duplicate key"));
        }
        sessions.insert(
            signature.to_string(),
            AccessTokenSession::from_request(signature, request),
        );
        Ok(())
    }

    async fn get_access_token_session(
        &self,
        signature: &str,
    ) -> Result<Option<AccessTokenSession>, OAuth2Error> {
        self.check()?;
        Ok(self.sessions.lock().unwrap().get(signature).cloned())
    }

    async fn delete_access_token_session(&self, signature: &str) -> Result<(), OAuth2Error> {
        self.check()?;
        self.sessions.lock().unwrap().remove(signature);
        Ok(())
    }
}

/// Accepts exactly one username/password pair.
pub struct StaticAuthenticator {
    pub username: String,
    pub password: String,
    pub backend_failure: bool,
    pub calls: AtomicUsize,
}

impl StaticAuthenticator {
    pub fn accepting(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            backend_failure: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn broken() -> Self {
        Self {
            backend_failure: true,
            ..Self::accepting("", "")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialAuthenticator for StaticAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.backend_failure {
            return Err(CredentialError::Backend("directory unreachable".to_string()));
        }
        if username == self.username && password == self.password {
            Ok(())
        } else {
            Err(CredentialError::NotFound)
        }
    }
}

/// Issues `token-N` / `sig-N`.
#[derive(Default)]
pub struct CountingStrategy {
    pub fail: bool,
    pub issued: AtomicUsize,
}

#[async_trait]
impl AccessTokenStrategy for CountingStrategy {
    async fn generate_access_token(
        &self,
        _request: &AccessRequest,
    ) -> Result<GeneratedToken, OAuth2Error> {
        if self.fail {
            return Err(OAuth2Error::server_error("signing key unavailable"));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GeneratedToken {
            token: format!("token-{n}"),
            signature: format!("sig-{n}"),
        })
    }

    fn signature(&self, token: &str) -> Option<String> {
        token.strip_prefix("token-").map(|n| format!("sig-{n}"))
    }
}

pub fn form(pairs: &[(&str, &str)]) -> std::collections::BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
