//! Media storage adapters.
//!
//! A reference is the SHA-256 of the bytes followed by a per-upload id
//! (`<hash>-<upload>`). Every post owns the file behind its reference, so
//! deleting one post never removes media another post points at, even when
//! both uploaded identical bytes.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use domains::{MediaStorage, Result};
use sha2::{Digest, Sha256};
use uuid::Uuid;

fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn upload_reference(data: &[u8]) -> String {
    format!("{}-{}", content_hash(data), Uuid::new_v4().simple())
}

/// Splits a reference into its hash and upload id; `None` when malformed.
fn parse_reference(reference: &str) -> Option<(&str, &str)> {
    let (hash, upload) = reference.split_once('-')?;
    let hex = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_hexdigit());
    (hash.len() >= 4 && hex(hash) && hex(upload)).then_some((hash, upload))
}

/// Keeps uploads in memory. Used by tests and the seed binary.
#[derive(Default)]
pub struct InMemoryMediaStorage {
    files: DashMap<String, (mime::Mime, Bytes)>,
}

impl InMemoryMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.files.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl MediaStorage for InMemoryMediaStorage {
    async fn store(&self, data: Bytes, content_type: &mime::Mime) -> Result<String> {
        let reference = upload_reference(&data);
        self.files.insert(reference.clone(), (content_type.clone(), data));
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        self.files.remove(reference);
        Ok(())
    }
}

#[cfg(feature = "media-local")]
pub use local::LocalMediaStorage;

#[cfg(feature = "media-local")]
mod local {
    use std::path::PathBuf;

    use super::*;
    use tokio::fs;
    use tracing::debug;

    /// Writes uploads under `root`, sharded by the first two byte pairs of
    /// the content hash: `ab/cd/abcd…-<upload>`.
    pub struct LocalMediaStorage {
        root: PathBuf,
        url_prefix: String,
    }

    impl LocalMediaStorage {
        pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
            Self { root: root.into(), url_prefix: url_prefix.into() }
        }

        /// `None` for references this store could not have handed out.
        fn sharded_path(&self, reference: &str) -> Option<PathBuf> {
            let (hash, _) = parse_reference(reference)?;
            Some(self.root.join(&hash[0..2]).join(&hash[2..4]).join(reference))
        }

        /// Public URL for a stored reference.
        pub fn url(&self, reference: &str) -> String {
            format!(
                "{}/{}/{}/{}",
                self.url_prefix.trim_end_matches('/'),
                reference.get(..2).unwrap_or_default(),
                reference.get(2..4).unwrap_or_default(),
                reference
            )
        }
    }

    #[async_trait]
    impl MediaStorage for LocalMediaStorage {
        async fn store(&self, data: Bytes, content_type: &mime::Mime) -> Result<String> {
            let reference = upload_reference(&data);
            let Some(path) = self.sharded_path(&reference) else {
                return Err(domains::DomainError::Internal("malformed media reference".into()));
            };
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&path, &data).await?;
            debug!(reference = %reference, content_type = %content_type, bytes = data.len(), "media stored");
            Ok(reference)
        }

        async fn delete(&self, reference: &str) -> Result<()> {
            let Some(path) = self.sharded_path(reference) else {
                return Ok(());
            };
            match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err.into()),
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let storage = InMemoryMediaStorage::new();
        let reference = storage
            .store(Bytes::from_static(b"frame"), &"video/mp4".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(reference.len(), 64 + 1 + 32);
        assert!(parse_reference(&reference).is_some());
        assert!(storage.contains(&reference));

        storage.delete(&reference).await.unwrap();
        storage.delete(&reference).await.unwrap();
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_identical_uploads_are_deleted_independently() {
        let storage = InMemoryMediaStorage::new();
        let data = Bytes::from_static(b"shared");
        let first = storage.store(data.clone(), &mime::IMAGE_PNG).await.unwrap();
        let second = storage.store(data, &mime::IMAGE_PNG).await.unwrap();
        assert_ne!(first, second);

        storage.delete(&first).await.unwrap();
        assert!(!storage.contains(&first));
        assert!(storage.contains(&second));
    }

    #[test]
    fn test_blocking_round_trip() {
        let storage = InMemoryMediaStorage::new();
        let reference = tokio_test::block_on(storage.store(Bytes::from_static(b"x"), &mime::IMAGE_GIF));
        let reference = tokio_test::assert_ok!(reference);
        assert_eq!(storage.len(), 1);
        tokio_test::assert_ok!(tokio_test::block_on(storage.delete(&reference)));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_malformed_references_are_rejected() {
        assert!(parse_reference("deadbeef").is_none());
        assert!(parse_reference("../../etc-passwd").is_none());
        assert!(parse_reference("ab-cd").is_none());
        assert!(parse_reference("abcd-01ff").is_some());
    }
}
