//! HMAC-SHA256 cookie signatures.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::GuardError;

type HmacSha256 = Hmac<Sha256>;

/// Length of keys produced by [`SecretKey::generate`].
pub const GENERATED_KEY_LEN: usize = 32;

/// Cookie signing key. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Generate a random key from the operating system RNG.
    pub fn generate() -> Result<Self, GuardError> {
        let mut bytes = vec![0u8; GENERATED_KEY_LEN];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Computes and checks keyed integrity tags over cookie payloads.
#[derive(Clone)]
pub struct CookieSigner {
    key: SecretKey,
}

impl CookieSigner {
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC pads or hashes the key, so every length is accepted
        <HmacSha256 as Mac>::new_from_slice(self.key.as_bytes())
            .expect("HMAC-SHA256 accepts keys of any length")
    }

    /// HMAC-SHA256 of `payload`, URL-safe base64.
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = self.mac();
        mac.update(payload);
        URL_SAFE.encode(mac.finalize().into_bytes())
    }

    /// Check `signature` against `payload` in constant time.
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        let expected = self.sign(payload);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }
}

impl fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}
