//! Content digests
//!
//! A digest identifies a blob by the hash of its bytes. Its string form is
//! `<type>:<hex>`, e.g. `sha256:2cf24dba...`.
//!
//! ## Types
//!
//! - `shake256`: 64 bytes, computed for every blob and manifest this crate writes
//! - `sha256`: 32 bytes, accepted when reading manifests produced by other tooling

use bytes::Bytes;
use sha2::{Digest as _, Sha256};
use sha3::Shake256;
use sha3::digest::{ExtendableOutput, Update};
use std::fmt;
use std::str::FromStr;

/// Hash function behind a digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DigestType {
    Sha256,
    Shake256,
}

impl DigestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestType::Sha256 => "sha256",
            DigestType::Shake256 => "shake256",
        }
    }

    /// Expected length of the raw digest value in bytes
    pub fn value_len(&self) -> usize {
        match self {
            DigestType::Sha256 => 32,
            DigestType::Shake256 => 64,
        }
    }
}

impl FromStr for DigestType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(DigestType::Sha256),
            "shake256" => Ok(DigestType::Shake256),
            _ => Err(anyhow::anyhow!("unknown digest type {:?}", s)),
        }
    }
}

impl fmt::Display for DigestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content digest
///
/// Two digests are equal iff both their type and their raw bytes are identical.
/// Equality is the only notion of "same content" used anywhere in the crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    digest_type: DigestType,
    value: Bytes,
}

impl Digest {
    pub fn new(digest_type: DigestType, value: impl Into<Bytes>) -> anyhow::Result<Self> {
        let value = value.into();
        if value.len() != digest_type.value_len() {
            anyhow::bail!(
                "invalid {} digest length: expected {} bytes, got {}",
                digest_type,
                digest_type.value_len(),
                value.len()
            );
        }

        Ok(Self { digest_type, value })
    }

    /// Digest of the given content with the default type, shake256
    pub fn of_content(content: &[u8]) -> Self {
        Self::compute(DigestType::Shake256, content)
    }

    pub fn compute(digest_type: DigestType, content: &[u8]) -> Self {
        let value = match digest_type {
            DigestType::Sha256 => Bytes::copy_from_slice(&Sha256::digest(content)),
            DigestType::Shake256 => {
                let mut hasher = Shake256::default();
                Update::update(&mut hasher, content);
                let mut value = vec![0u8; digest_type.value_len()];
                hasher.finalize_xof_into(&mut value);
                Bytes::from(value)
            }
        };

        Self { digest_type, value }
    }

    pub fn digest_type(&self) -> DigestType {
        self.digest_type
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Lowercase hex of the raw value, used as the blob's path in a store
    pub fn hex(&self) -> String {
        hex::encode(&self.value)
    }
}

impl FromStr for Digest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digest_type, value) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("malformed digest {:?}: missing type prefix", s))?;
        let digest_type = digest_type.parse::<DigestType>()?;
        let value =
            hex::decode(value).map_err(|e| anyhow::anyhow!("malformed digest {:?}: {}", s, e))?;

        Self::new(digest_type, value)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.digest_type, self.hex())
    }
}
