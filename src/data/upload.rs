use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use rand::Rng;

use crate::store::BlobStore;

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TOKEN_LEN: usize = 11;

/// An image picked from disk, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("could not read image {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("{} is not a file", path.display()))?;
        Ok(Self { file_name, bytes })
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /// MIME type guessed from the file name, `application/octet-stream` when
    /// the extension is unknown.
    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.file_name)
            .first_or_octet_stream()
            .to_string()
    }
}

/// Storage key for an upload: a random base-36 token, the upload time in
/// milliseconds, then the original extension. Files without an extension get
/// no suffix.
pub fn storage_key(file: &ImageFile, millis: i64, rng: &mut impl Rng) -> String {
    let token: String = (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect();
    match file.extension() {
        Some(ext) => format!("{token}-{millis}.{ext}"),
        None => format!("{token}-{millis}"),
    }
}

/// Sends images to the blob store. Clones share the `uploading` flag and the
/// error slot, so any holder can show upload progress.
#[derive(Clone)]
pub struct Uploader {
    blobs: Arc<dyn BlobStore>,
    default_bucket: String,
    uploading: Arc<AtomicBool>,
    error: Arc<Mutex<Option<String>>>,
}

impl Uploader {
    pub fn new(blobs: Arc<dyn BlobStore>, default_bucket: impl Into<String>) -> Self {
        Self {
            blobs,
            default_bucket: default_bucket.into(),
            uploading: Arc::new(AtomicBool::new(false)),
            error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }

    pub fn error(&self) -> Option<String> {
        self.error.lock().ok().and_then(|slot| slot.clone())
    }

    fn set_error(&self, message: Option<String>) {
        if let Ok(mut slot) = self.error.lock() {
            *slot = message;
        }
    }

    /// Upload `file` to `bucket` (or the default bucket) and return its
    /// public URL. Failures are logged, recorded in [`Uploader::error`] and
    /// reported as `None`.
    pub async fn upload_image(&self, file: &ImageFile, bucket: Option<&str>) -> Option<String> {
        let bucket = bucket.unwrap_or(&self.default_bucket);
        let key = storage_key(file, Utc::now().timestamp_millis(), &mut rand::rng());

        self.uploading.store(true, Ordering::SeqCst);
        self.set_error(None);

        let outcome = self
            .blobs
            .upload(bucket, &key, file.bytes.clone(), &file.content_type())
            .await;

        self.uploading.store(false, Ordering::SeqCst);

        match outcome {
            Ok(()) => {
                info!("Uploaded {} as {bucket}/{key}", file.file_name);
                Some(self.blobs.public_url(bucket, &key))
            }
            Err(err) => {
                warn!("Error uploading {}: {err}", file.file_name);
                self.set_error(Some(err.to_string()));
                None
            }
        }
    }
}
