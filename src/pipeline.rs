//! The upload pipeline: read → compress → store.
//!
//! [`Uploader`] wires an [`ImageBackend`] to an [`ObjectStore`] and runs the
//! whole flow for one image at a time. Reading and compression are CPU-bound
//! and run on a blocking worker; the store write is async. Each call makes
//! exactly one store write — there is no retry layer, callers see the first
//! failure as-is and decide what to do.
//!
//! Failures map onto four caller-facing classes:
//!
//! | Variant | Meaning |
//! |---|---|
//! | [`UploadError::Permission`] | media access denied before anything ran |
//! | [`UploadError::Read`] | source bytes unreadable or undecodable |
//! | [`UploadError::Encode`] | resize or JPEG encode failed |
//! | [`UploadError::Store`] | the store refused or the transport failed |
//!
//! Picker cancellation is none of these: it is `Ok(None)` from
//! [`Uploader::pick_and_upload`], and nothing is read, encoded, or written.

use crate::imaging::{
    Attempt, BackendError, Compressed, CompressionConfig, Dimensions, ImageBackend, Quality,
    compress_to_limit,
};
use crate::keys::{KeyPolicy, UploadKey};
use crate::picker::{ImageHandle, Picker, PickerError};
use crate::store::{ObjectStore, PutOptions, StoreError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("media access denied: {0}")]
    Permission(String),
    /// Source bytes could not be read or decoded. Nothing was uploaded.
    #[error("failed to read source image: {0}")]
    Read(String),
    #[error("resize/encode failed: {0}")]
    Encode(String),
    #[error("object store write failed: {0}")]
    Store(#[from] StoreError),
}

impl From<PickerError> for UploadError {
    fn from(err: PickerError) -> Self {
        match err {
            PickerError::PermissionDenied(reason) => UploadError::Permission(reason),
        }
    }
}

impl From<BackendError> for UploadError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Decode(msg) => UploadError::Read(msg),
            BackendError::Encode(msg) => UploadError::Encode(msg),
        }
    }
}

/// What an upload produced: the stored path plus the compression trail.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// Bucket-relative path the store confirmed.
    pub path: String,
    /// Size of the stored JPEG.
    pub size_bytes: u64,
    /// Quality of the stored JPEG.
    pub quality: Quality,
    pub source: Dimensions,
    pub output: Dimensions,
    /// Every encode attempt, in order.
    pub attempts: Vec<Attempt>,
    /// False when the stored bytes exceed the configured budget (floor hit).
    pub within_limit: bool,
}

/// Read `handle` and compress it on a blocking worker.
///
/// This is the CPU-heavy half of an upload, exposed on its own so a dry run
/// can inspect compression results without a store. The backend rides along
/// in an `Arc` because the blocking task outlives the caller's borrow.
pub async fn read_and_compress<B>(
    backend: Arc<B>,
    handle: ImageHandle,
    config: CompressionConfig,
) -> Result<Compressed, UploadError>
where
    B: ImageBackend + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || {
        let source = handle
            .into_bytes()
            .map_err(|e| UploadError::Read(e.to_string()))?;
        compress_to_limit(backend.as_ref(), &source, &config).map_err(UploadError::from)
    })
    .await;

    match outcome {
        Ok(result) => result,
        // A panicked encode task surfaces as the encode failure it is
        Err(join) => Err(UploadError::Encode(format!("image task aborted: {join}"))),
    }
}

/// One-image-at-a-time upload pipeline over a backend and a store.
pub struct Uploader<B, S> {
    backend: Arc<B>,
    store: S,
    config: CompressionConfig,
    upsert: bool,
}

impl<B, S> Uploader<B, S>
where
    B: ImageBackend + 'static,
    S: ObjectStore,
{
    pub fn new(backend: B, store: S, config: CompressionConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            store,
            config,
            upsert: false,
        }
    }

    /// Replace existing objects on key collision instead of failing.
    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    /// Compress the image behind `handle` and write it under `key`.
    pub async fn upload(
        &self,
        handle: ImageHandle,
        key: UploadKey,
    ) -> Result<UploadReceipt, UploadError> {
        let compressed = self.compress(handle).await?;
        self.put_compressed(compressed, key).await
    }

    /// Run the interactive flow: pick, compress, store.
    ///
    /// `Ok(None)` is the user backing out of the picker; nothing was read
    /// and no write was attempted. The key is derived only after compression
    /// succeeds, so timestamp keys reflect upload time and no key is burned
    /// on an image that failed to encode.
    pub async fn pick_and_upload(
        &self,
        picker: &dyn Picker,
        policy: &KeyPolicy,
    ) -> Result<Option<UploadReceipt>, UploadError> {
        let Some(handle) = picker.pick()? else {
            tracing::debug!("picker cancelled, nothing to upload");
            return Ok(None);
        };
        let compressed = self.compress(handle).await?;
        let receipt = self.put_compressed(compressed, policy.derive()).await?;
        Ok(Some(receipt))
    }

    /// Download the object at `key` from the store.
    pub async fn fetch(&self, key: &str) -> Result<Vec<u8>, UploadError> {
        Ok(self.store.get(key).await?)
    }

    async fn compress(&self, handle: ImageHandle) -> Result<Compressed, UploadError> {
        read_and_compress(Arc::clone(&self.backend), handle, self.config.clone()).await
    }

    async fn put_compressed(
        &self,
        compressed: Compressed,
        key: UploadKey,
    ) -> Result<UploadReceipt, UploadError> {
        let Compressed {
            bytes,
            quality,
            source,
            output,
            attempts,
            within_limit,
        } = compressed;
        let size_bytes = bytes.len() as u64;

        let options = PutOptions::jpeg().with_upsert(self.upsert);
        let stored = self.store.put(&key, bytes, &options).await?;

        tracing::info!(
            path = %stored.path,
            size_bytes,
            quality = quality.percent(),
            attempts = attempts.len(),
            "upload complete"
        );
        Ok(UploadReceipt {
            path: stored.path,
            size_bytes,
            quality,
            source,
            output,
            attempts,
            within_limit,
        })
    }
}
