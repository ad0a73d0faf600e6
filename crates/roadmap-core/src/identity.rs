//! Voter identity resolution.
//!
//! The boundary layer hands us whatever origin token it has for the caller
//! (typically a forwarded-for header value or a socket address). We normalize
//! it into a [`VoterId`] which is the key votes are deduplicated on.
//!
//! No authentication happens here: the token is trusted as given.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::IdentityError;

/// Prefix Node-style servers put in front of IPv4 peers on dual-stack sockets.
const IPV4_MAPPED_PREFIX: &str = "::ffff:";

/// Domain separator for hashed identities.
const HASH_DOMAIN: &[u8] = b"roadmap-voter-v0:";

/// A normalized voter identity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoterId(String);

impl VoterId {
    /// Wrap an already-normalized identity, as read back from storage.
    pub fn from_normalized(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoterId({})", self.0)
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How normalized tokens are turned into stored identities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentityMode {
    /// Keep the normalized token.
    #[default]
    Plain,
    /// Store a Blake3 digest of the normalized token instead of the raw address.
    Hashed,
}

/// Derives voter identities from caller origin tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver {
    mode: IdentityMode,
}

impl IdentityResolver {
    pub fn new(mode: IdentityMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> IdentityMode {
        self.mode
    }

    /// Resolve a caller origin token into a voter identity.
    ///
    /// A forwarded chain (`"client, proxy1, proxy2"`) resolves to its left-most
    /// entry. The entry is trimmed, an IPv4-mapped prefix is stripped and the
    /// result lowercased.
    pub fn resolve(&self, token: Option<&str>) -> Result<VoterId, IdentityError> {
        let token = token.ok_or(IdentityError::Missing)?;
        let normalized = normalize(token).ok_or(IdentityError::Empty)?;

        Ok(match self.mode {
            IdentityMode::Plain => VoterId(normalized),
            IdentityMode::Hashed => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(HASH_DOMAIN);
                hasher.update(normalized.as_bytes());
                VoterId(hex::encode(hasher.finalize().as_bytes()))
            }
        })
    }
}

fn normalize(token: &str) -> Option<String> {
    let first = token.split(',').next().unwrap_or_default().trim();
    let stripped = match first.get(..IPV4_MAPPED_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(IPV4_MAPPED_PREFIX) => {
            &first[IPV4_MAPPED_PREFIX.len()..]
        }
        _ => first,
    };
    let stripped = stripped.trim();

    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> IdentityResolver {
        IdentityResolver::default()
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(plain().resolve(None), Err(IdentityError::Missing));
    }

    #[test]
    fn test_empty_token() {
        assert_eq!(plain().resolve(Some("")), Err(IdentityError::Empty));
        assert_eq!(plain().resolve(Some("  ,10.0.0.1")), Err(IdentityError::Empty));
        assert_eq!(plain().resolve(Some("::ffff:")), Err(IdentityError::Empty));
    }

    #[test]
    fn test_forwarded_chain_uses_client_entry() {
        let id = plain().resolve(Some(" 203.0.113.7, 10.0.0.1, 10.0.0.2")).unwrap();
        assert_eq!(id.as_str(), "203.0.113.7");
    }

    #[test]
    fn test_ipv4_mapped_prefix_is_stripped() {
        let mapped = plain().resolve(Some("::ffff:127.0.0.1")).unwrap();
        let bare = plain().resolve(Some("127.0.0.1")).unwrap();
        assert_eq!(mapped, bare);
    }

    #[test]
    fn test_ipv6_is_case_insensitive() {
        let upper = plain().resolve(Some("2001:DB8::1")).unwrap();
        let lower = plain().resolve(Some("2001:db8::1")).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_hashed_mode_is_stable_and_hides_address() {
        let resolver = IdentityResolver::new(IdentityMode::Hashed);
        let a = resolver.resolve(Some("198.51.100.4")).unwrap();
        let b = resolver.resolve(Some("::FFFF:198.51.100.4")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(!a.as_str().contains("198.51"));
    }

    #[test]
    fn test_distinct_tokens_stay_distinct() {
        let resolver = IdentityResolver::new(IdentityMode::Hashed);
        let a = resolver.resolve(Some("198.51.100.4")).unwrap();
        let b = resolver.resolve(Some("198.51.100.5")).unwrap();
        assert_ne!(a, b);
    }
}
