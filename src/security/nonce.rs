//! Per-request CSP nonce generation.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::error::GuardError;

/// Number of random bytes behind every nonce (128 bits).
pub const NONCE_SIZE: usize = 16;

/// Length of the encoded nonce: unpadded base64 over 16 bytes.
pub const NONCE_LEN: usize = 22;

/// A request-scoped CSP nonce.
///
/// Only [`NonceGenerator`] can build one, so anything that takes a `&Nonce`
/// is guaranteed to hold real randomness.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Nonce(Arc<str>);

impl Nonce {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Nonce").field(&&*self.0).finish()
    }
}

impl AsRef<str> for Nonce {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Draws nonces from a cryptographically secure source.
///
/// Defaults to the operating system RNG. A failing source is an error, never
/// a reason to fall back to something weaker. Clones share one source, so a
/// seeded generator keeps advancing across requests.
pub struct NonceGenerator<R = OsRng> {
    rng: Arc<Mutex<R>>,
}

impl NonceGenerator<OsRng> {
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl Default for NonceGenerator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for NonceGenerator<R> {
    fn clone(&self) -> Self {
        Self {
            rng: Arc::clone(&self.rng),
        }
    }
}

impl<R> fmt::Debug for NonceGenerator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceGenerator").finish_non_exhaustive()
    }
}

impl<R> NonceGenerator<R>
where
    R: RngCore + CryptoRng,
{
    /// Use a specific entropy source.
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Generate a fresh nonce.
    pub fn generate(&self) -> Result<Nonce, GuardError> {
        let mut buf = [0u8; NONCE_SIZE];
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_fill_bytes(&mut buf)?;

        Ok(Nonce(Arc::from(URL_SAFE_NO_PAD.encode(buf))))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;

    /// An entropy source that is always exhausted.
    #[derive(Clone)]
    pub(crate) struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            unreachable!("nonce generation must use try_fill_bytes")
        }

        fn next_u64(&mut self) -> u64 {
            unreachable!("nonce generation must use try_fill_bytes")
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            unreachable!("nonce generation must use try_fill_bytes")
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "entropy exhausted",
            )))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn test_nonce_shape() {
        let nonce = NonceGenerator::new().generate().unwrap();
        assert_eq!(nonce.as_str().len(), NONCE_LEN);
        assert!(nonce
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));

        let decoded = URL_SAFE_NO_PAD.decode(nonce.as_str()).unwrap();
        assert_eq!(decoded.len(), NONCE_SIZE);
    }

    #[test]
    fn test_nonces_do_not_collide() {
        let generator = NonceGenerator::new();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let nonce = generator.generate().unwrap();
            assert!(seen.insert(nonce), "nonce collision");
        }
    }

    #[test]
    fn test_seeded_source_advances_between_calls() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let generator = NonceGenerator::with_rng(StdRng::seed_from_u64(7));
        let shared = generator.clone();

        let a = generator.generate().unwrap();
        let b = generator.generate().unwrap();
        let c = shared.generate().unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn test_entropy_failure_is_an_error() {
        let generator = NonceGenerator::with_rng(BrokenRng);
        let err = generator.generate().unwrap_err();
        assert!(matches!(err, GuardError::Entropy(_)));
    }
}
