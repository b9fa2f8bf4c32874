//! Object keys: validation and derivation.
//!
//! An [`UploadKey`] is the bucket-relative path an object is stored under.
//! Keys are validated on construction so a bad key is rejected before any
//! bytes are compressed or sent. [`KeyPolicy`] covers the two derivation
//! schemes callers use in practice: flat timestamp names and per-owner
//! folders with random names.
//!
//! Uniqueness is the caller's concern. Derived keys are unique enough for
//! their scheme (millisecond timestamp, random UUID) but nothing here checks
//! the bucket for collisions; pair a reused key with an upsert write instead.

use chrono::Utc;
use std::fmt;
use std::path::{Component, Path};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("upload key must not be empty")]
    Empty,
    #[error("upload key must be bucket-relative: {0}")]
    Absolute(String),
    #[error("upload key must not contain '..' or prefix segments: {0}")]
    Traversal(String),
}

/// A validated, bucket-relative object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadKey(String);

impl UploadKey {
    /// Validate a caller-supplied key.
    ///
    /// Rejects empty keys, absolute paths, and any `..` or Windows prefix
    /// component. The bucket is an isolation boundary and keys are sent to a
    /// remote path-shaped API, so traversal segments never leave this
    /// process.
    pub fn new(key: impl Into<String>) -> Result<Self, KeyError> {
        let key = key.into();
        if key.is_empty() {
            return Err(KeyError::Empty);
        }

        let path = Path::new(&key);
        if path.is_absolute() {
            return Err(KeyError::Absolute(key));
        }
        for component in path.components() {
            match component {
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(KeyError::Traversal(key));
                }
                Component::RootDir => return Err(KeyError::Absolute(key)),
                Component::CurDir | Component::Normal(_) => {}
            }
        }

        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Keys built by [`KeyPolicy::derive`] are shaped by construction.
    fn derived(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for UploadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How to derive a fresh key for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Flat key from the current time: `1724601600124.jpg`.
    Timestamp,
    /// Owner folder plus a random name: `<owner>/<uuid>.jpg`. Scoping keys
    /// under the owner id lets bucket policies grant per-user write access.
    OwnerScoped { owner: Uuid },
}

impl KeyPolicy {
    /// Derive a new key. Each call produces a fresh key; derive once per
    /// upload, not once per configuration.
    pub fn derive(&self) -> UploadKey {
        match self {
            KeyPolicy::Timestamp => {
                UploadKey::derived(format!("{}.jpg", Utc::now().timestamp_millis()))
            }
            KeyPolicy::OwnerScoped { owner } => {
                UploadKey::derived(format!("{owner}/{}.jpg", Uuid::new_v4()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_filename() {
        assert!(UploadKey::new("avatar.jpg").is_ok());
    }

    #[test]
    fn accepts_nested_key() {
        assert!(UploadKey::new("users/42/avatar.jpg").is_ok());
    }

    #[test]
    fn rejects_empty_key() {
        assert_eq!(UploadKey::new(""), Err(KeyError::Empty));
    }

    #[test]
    fn rejects_absolute_key() {
        assert!(matches!(UploadKey::new("/etc/passwd"), Err(KeyError::Absolute(_))));
    }

    #[test]
    fn rejects_parent_traversal() {
        assert!(matches!(
            UploadKey::new("../other-bucket/file.jpg"),
            Err(KeyError::Traversal(_))
        ));
    }

    #[test]
    fn rejects_nested_parent_traversal() {
        assert!(matches!(
            UploadKey::new("sub/../../escape.jpg"),
            Err(KeyError::Traversal(_))
        ));
    }

    #[test]
    fn timestamp_keys_are_jpg_named_millis() {
        let key = KeyPolicy::Timestamp.derive();
        let stem = key.as_str().strip_suffix(".jpg").unwrap();
        let millis: i64 = stem.parse().unwrap();
        assert!(millis > 1_600_000_000_000, "expected epoch millis, got {millis}");
    }

    #[test]
    fn owner_scoped_keys_live_under_owner() {
        let owner = Uuid::new_v4();
        let key = KeyPolicy::OwnerScoped { owner }.derive();

        let (folder, name) = key.as_str().split_once('/').unwrap();
        assert_eq!(folder, owner.to_string());
        assert!(name.ends_with(".jpg"));
        Uuid::parse_str(name.strip_suffix(".jpg").unwrap()).unwrap();
    }

    #[test]
    fn derive_produces_fresh_keys() {
        let owner = Uuid::new_v4();
        let policy = KeyPolicy::OwnerScoped { owner };
        assert_ne!(policy.derive(), policy.derive());
    }

    #[test]
    fn derived_keys_pass_validation() {
        for policy in [
            KeyPolicy::Timestamp,
            KeyPolicy::OwnerScoped {
                owner: Uuid::new_v4(),
            },
        ] {
            let key = policy.derive();
            assert!(UploadKey::new(key.as_str()).is_ok(), "{key} should validate");
        }
    }
}
