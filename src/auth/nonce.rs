//! One-time nonces bound into signed messages.
//!
//! The gate issues a nonce, the wallet signs a message that embeds it, and
//! the gate consumes it on the next request. A nonce is accepted at most
//! once and only before its TTL runs out. Issued nonces live in a bounded
//! LRU ordered by issue time. A live nonce is never evicted: when every slot
//! is taken, expired entries are purged from the old end and, if none have
//! expired, issuance fails until one does.

use crate::error::{Error, Result};
use lru::LruCache;
use parking_lot::Mutex;
use rand::RngCore;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Prefix marking a token inside a message as a gate nonce.
pub const NONCE_PREFIX: &str = "tg-";

/// Random bytes per nonce.
const NONCE_BYTES: usize = 16;

/// Default number of outstanding nonces kept.
const DEFAULT_CAPACITY: usize = 10_000;

/// A freshly issued nonce.
#[derive(Debug, Clone)]
pub struct IssuedNonce {
    /// The nonce value the client must embed in its signed message.
    pub value: String,
    /// How long the nonce stays valid.
    pub ttl: Duration,
}

/// Store of outstanding nonces.
#[derive(Clone)]
pub struct NonceStore {
    inner: Arc<Mutex<LruCache<String, Instant>>>,
    ttl: Duration,
    capacity: usize,
}

impl NonceStore {
    /// Create a store with the default capacity.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    /// Create a store holding at most `capacity` outstanding nonces.
    #[must_use]
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(cap))),
            ttl,
            capacity: cap.get(),
        }
    }

    /// Issue a new nonce and remember it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonceCapacity`] when every slot holds a nonce that
    /// has not yet expired.
    pub fn issue(&self) -> Result<IssuedNonce> {
        let mut cache = self.inner.lock();
        if cache.len() >= self.capacity {
            self.purge_expired(&mut cache);
            if cache.len() >= self.capacity {
                return Err(Error::NonceCapacity(cache.len()));
            }
        }

        let mut raw = [0u8; NONCE_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut raw);
        let value = format!("{NONCE_PREFIX}{}", hex::encode(raw));
        cache.put(value.clone(), Instant::now());

        Ok(IssuedNonce {
            value,
            ttl: self.ttl,
        })
    }

    // Entries are never promoted, so the LRU end is always the oldest issue.
    fn purge_expired(&self, cache: &mut LruCache<String, Instant>) {
        while let Some((_, issued_at)) = cache.peek_lru() {
            if issued_at.elapsed() <= self.ttl {
                break;
            }
            cache.pop_lru();
        }
    }

    /// Consume the first outstanding nonce embedded in `message`.
    ///
    /// Returns `true` if a live nonce was found; it is removed either way,
    /// as are any expired nonces the message names.
    pub fn consume_from(&self, message: &str) -> bool {
        let mut cache = self.inner.lock();
        for candidate in embedded_nonces(message) {
            if let Some(issued_at) = cache.pop(candidate) {
                if issued_at.elapsed() <= self.ttl {
                    return true;
                }
            }
        }
        false
    }

    /// Number of outstanding nonces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no nonces are outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Tokens in `message` that look like gate nonces.
fn embedded_nonces(message: &str) -> impl Iterator<Item = &str> {
    message
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .filter(|token| token.starts_with(NONCE_PREFIX))
}
