use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use oauth2_core::{AccessRequest, OAuth2Error};
use oauth2_ports::{AccessTokenStrategy, GeneratedToken};

type HmacSha256 = Hmac<Sha256>;

const KEY_LEN: usize = 32;

/// Opaque bearer tokens of the form `<key>.<signature>`.
///
/// The key is 32 random bytes, the signature is HMAC-SHA256(secret, key); both are
/// base64url without padding. Only the signature half is ever persisted.
pub struct HmacSha256Strategy {
    secret: Vec<u8>,
}

impl HmacSha256Strategy {
    pub const MIN_SECRET_LEN: usize = 32;

    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, OAuth2Error> {
        let secret = secret.as_ref();
        if secret.len() < Self::MIN_SECRET_LEN {
            return Err(OAuth2Error::server_error(&format!(
                "HMAC secret must be at least {} bytes",
                Self::MIN_SECRET_LEN
            )));
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    fn mac(&self, key: &[u8]) -> Result<Vec<u8>, OAuth2Error> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| OAuth2Error::server_error(&e.to_string()))?;
        mac.update(key);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

#[async_trait]
impl AccessTokenStrategy for HmacSha256Strategy {
    async fn generate_access_token(
        &self,
        _request: &AccessRequest,
    ) -> Result<GeneratedToken, OAuth2Error> {
        let mut key = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut key);

        let signature = URL_SAFE_NO_PAD.encode(self.mac(&key)?);
        let token = format!("{}.{}", URL_SAFE_NO_PAD.encode(key), signature);

        Ok(GeneratedToken { token, signature })
    }

    fn signature(&self, token: &str) -> Option<String> {
        let (key, signature) = token.split_once('.')?;
        let key = URL_SAFE_NO_PAD.decode(key).ok()?;
        let provided = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let expected = self.mac(&key).ok()?;

        if bool::from(expected.ct_eq(&provided)) {
            Some(signature.to_string())
        } else {
            None
        }
    }
}
