use std::fmt;

use serde::Serialize;

use crate::error::{ModelError, ModelResult};

/// BLAKE3 digest of a model's serializable properties, taken after a fetch.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchHash([u8; 32]);

impl FetchHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for FetchHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FetchHash({})", self.short_hex())
    }
}

impl fmt::Display for FetchHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Domain-separated BLAKE3 hasher for model snapshots.
///
/// The domain tag is prepended to every input, so two models whose
/// properties serialize identically still hash differently when their
/// collections differ.
pub struct FetchHasher {
    domain: String,
}

impl FetchHasher {
    /// Hasher for documents of `collection`.
    pub fn for_collection(collection: &str) -> Self {
        Self {
            domain: format!("arbor-model-v1:{collection}"),
        }
    }

    pub fn hash(&self, data: &[u8]) -> FetchHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        FetchHash(*hasher.finalize().as_bytes())
    }

    /// Hash a serializable value as JSON.
    pub fn hash_json<T: Serialize>(&self, value: &T) -> ModelResult<FetchHash> {
        let data = serde_json::to_vec(value).map_err(|e| ModelError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let hasher = FetchHasher::for_collection("users");
        assert_eq!(hasher.hash(b"data"), hasher.hash(b"data"));
        assert_ne!(hasher.hash(b"data"), hasher.hash(b"other"));
    }

    #[test]
    fn collections_separate_domains() {
        let users = FetchHasher::for_collection("users");
        let groups = FetchHasher::for_collection("groups");
        assert_ne!(users.hash(b"same"), groups.hash(b"same"));
        assert_eq!(users.domain(), "arbor-model-v1:users");
    }

    #[test]
    fn hash_json_and_hex() {
        let hasher = FetchHasher::for_collection("users");
        let hash = hasher.hash_json(&serde_json::json!({"name": "ada"})).unwrap();
        assert_eq!(hash.to_hex().len(), 64);
        assert_eq!(hash.to_string(), hash.to_hex());
        assert!(format!("{hash:?}").starts_with("FetchHash("));
        assert_eq!(hash.as_bytes().len(), 32);
    }
}
