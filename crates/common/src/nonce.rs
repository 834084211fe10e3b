//! Action-scoped request nonces.
//!
//! A nonce is an HMAC-SHA256 over `action|user_id|tick`, truncated to 16 hex
//! characters. The tick advances every half lifetime, so a nonce stays valid
//! for between one half and one full lifetime.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::SecurityConfig;

type HmacSha256 = Hmac<Sha256>;

/// Length of the encoded nonce in bytes of MAC output.
const NONCE_BYTES: usize = 8;

/// Actions a nonce can be issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonceAction {
    /// Reading the reactions of an activity.
    Fetch,
    /// Adding or removing a reaction.
    Save,
    /// Running migration steps.
    Migrate,
}

impl NonceAction {
    /// Returns the action string mixed into the MAC.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "bp_reactions_fetch",
            Self::Save => "bp_reactions_save",
            Self::Migrate => "bp_reactions_migrate",
        }
    }
}

/// Issues and verifies nonces.
#[derive(Clone)]
pub struct NonceSigner {
    secret: Vec<u8>,
    lifetime_secs: u64,
}

impl std::fmt::Debug for NonceSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceSigner")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl NonceSigner {
    /// Create a signer. A lifetime below two seconds is raised to two.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>, lifetime_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            lifetime_secs: lifetime_secs.max(2),
        }
    }

    /// Create a signer from the security section of the configuration.
    #[must_use]
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.nonce_secret.as_bytes(), config.nonce_lifetime_secs)
    }

    /// Issue a nonce for `action` and `user_id` at the current time.
    #[must_use]
    pub fn create(&self, action: NonceAction, user_id: i64) -> String {
        self.create_at(action, user_id, now_secs())
    }

    /// Check a nonce for `action` and `user_id` at the current time.
    #[must_use]
    pub fn verify(&self, nonce: &str, action: NonceAction, user_id: i64) -> bool {
        self.verify_at(nonce, action, user_id, now_secs())
    }

    /// Issue a nonce as of `now` (seconds since the epoch).
    #[must_use]
    pub fn create_at(&self, action: NonceAction, user_id: i64, now: u64) -> String {
        let tag = self.mac(action, user_id, self.tick(now)).finalize().into_bytes();
        hex::encode(&tag[..NONCE_BYTES])
    }

    /// Check a nonce as of `now`. Nonces from the current and the previous
    /// tick are accepted.
    #[must_use]
    pub fn verify_at(&self, nonce: &str, action: NonceAction, user_id: i64, now: u64) -> bool {
        let Ok(bytes) = hex::decode(nonce) else {
            return false;
        };
        if bytes.len() != NONCE_BYTES {
            return false;
        }

        let tick = self.tick(now);
        [Some(tick), tick.checked_sub(1)]
            .into_iter()
            .flatten()
            .any(|t| {
                self.mac(action, user_id, t)
                    .verify_truncated_left(&bytes)
                    .is_ok()
            })
    }

    const fn tick(&self, now: u64) -> u64 {
        now / (self.lifetime_secs / 2)
    }

    fn mac(&self, action: NonceAction, user_id: i64, tick: u64) -> HmacSha256 {
        // HMAC accepts keys of any length
        #[allow(clippy::expect_used)]
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(format!("{}|{user_id}|{tick}", action.as_str()).as_bytes());
        mac
    }
}

fn now_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn signer() -> NonceSigner {
        NonceSigner::new("test-secret", 86_400)
    }

    #[test]
    fn test_nonce_roundtrip() {
        let s = signer();
        let nonce = s.create_at(NonceAction::Save, 7, NOW);
        assert_eq!(nonce.len(), 16);
        assert!(s.verify_at(&nonce, NonceAction::Save, 7, NOW));
    }

    #[test]
    fn test_nonce_bound_to_action_and_user() {
        let s = signer();
        let nonce = s.create_at(NonceAction::Save, 7, NOW);
        assert!(!s.verify_at(&nonce, NonceAction::Fetch, 7, NOW));
        assert!(!s.verify_at(&nonce, NonceAction::Save, 8, NOW));
    }

    #[test]
    fn test_nonce_expiry() {
        let s = signer();
        let nonce = s.create_at(NonceAction::Fetch, 0, NOW);
        // Still valid during the next half lifetime
        assert!(s.verify_at(&nonce, NonceAction::Fetch, 0, NOW + 43_200));
        // Gone after a full lifetime
        assert!(!s.verify_at(&nonce, NonceAction::Fetch, 0, NOW + 86_400 * 2));
    }

    #[test]
    fn test_nonce_rejects_garbage() {
        let s = signer();
        assert!(!s.verify_at("", NonceAction::Fetch, 0, NOW));
        assert!(!s.verify_at("not-hex", NonceAction::Fetch, 0, NOW));
        assert!(!s.verify_at("abcd", NonceAction::Fetch, 0, NOW));
    }

    #[test]
    fn test_clock_is_wall_time() {
        let now = now_secs();
        assert!(now > NOW);
        assert!(now.abs_diff(Utc::now().timestamp().unsigned_abs()) <= 1);

        let s = signer();
        let nonce = s.create(NonceAction::Save, 7);
        assert!(s.verify(&nonce, NonceAction::Save, 7));
        assert!(s.verify_at(&nonce, NonceAction::Save, 7, now));
    }

    #[test]
    fn test_nonce_secret_matters() {
        let a = signer().create_at(NonceAction::Migrate, 1, NOW);
        let other = NonceSigner::new("other-secret", 86_400);
        assert!(!other.verify_at(&a, NonceAction::Migrate, 1, NOW));
    }
}
