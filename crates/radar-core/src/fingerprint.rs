//! # Input Fingerprints
//!
//! SHA-256 digests over canonical JSON. `serde_json::Value` objects are
//! backed by a sorted map, so round-tripping through `Value` gives a
//! byte-stable encoding regardless of struct field order.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::RadarError;

/// Hex-encoded SHA-256 digest of a canonical JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest any serializable value.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, RadarError> {
        let canonical = serde_json::to_value(value)?;
        let bytes = serde_json::to_vec(&canonical)?;
        let digest = Sha256::digest(&bytes);
        Ok(Self(to_hex(&digest)))
    }

    /// The 64-character hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the hex string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Ab {
        a: u32,
        b: &'static str,
    }

    #[derive(Serialize)]
    struct Ba {
        b: &'static str,
        a: u32,
    }

    #[test]
    fn digest_is_64_hex_chars() {
        let fp = Fingerprint::of(&Ab { a: 1, b: "x" }).unwrap();
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn field_order_does_not_matter() {
        let a = Fingerprint::of(&Ab { a: 7, b: "y" }).unwrap();
        let b = Fingerprint::of(&Ba { b: "y", a: 7 }).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hashmap_iteration_order_does_not_matter() {
        let mut m1 = HashMap::new();
        let mut m2 = HashMap::new();
        for i in 0..32 {
            m1.insert(format!("k{i}"), i);
        }
        for i in (0..32).rev() {
            m2.insert(format!("k{i}"), i);
        }
        assert_eq!(Fingerprint::of(&m1).unwrap(), Fingerprint::of(&m2).unwrap());
    }

    #[test]
    fn different_values_differ() {
        let a = Fingerprint::of(&Ab { a: 1, b: "x" }).unwrap();
        let b = Fingerprint::of(&Ab { a: 2, b: "x" }).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn known_vector() {
        // sha256("null")
        let fp = Fingerprint::of(&()).unwrap();
        assert_eq!(
            fp.as_str(),
            "74234e98afe7498fb5daf1f36ac2d78acc339464f950703b8c019892f982b90b"
        );
    }
}
