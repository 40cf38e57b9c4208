//! Write paths used by the admin console: upload, normalize, upsert, delete.

use log::{info, warn};
use thiserror::Error;

use super::drafts::{BirdDraft, EventDraft, ValidationError};
use crate::data::{ImageFile, Repository, Uploader};
use crate::error::StoreError;
use crate::models::{Bird, Entity, Event, RecordId};

#[derive(Error, Debug)]
pub enum SaveError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Upload `attachment` if there is one. Any failure stops the save before a
/// table request is made.
async fn upload_first(
    uploader: &Uploader,
    bucket: &str,
    attachment: Option<&ImageFile>,
) -> Result<Option<String>, SaveError> {
    let Some(file) = attachment else {
        return Ok(None);
    };
    match uploader.upload_image(file, Some(bucket)).await {
        Some(url) => Ok(Some(url)),
        None => {
            let reason = uploader
                .error()
                .unwrap_or_else(|| "no URL was returned".to_string());
            warn!("Aborting save of {}: upload failed", file.file_name);
            Err(SaveError::Upload(reason))
        }
    }
}

pub async fn save_bird(
    repo: &Repository<Bird>,
    uploader: &Uploader,
    bucket: &str,
    draft: BirdDraft,
    attachment: Option<&ImageFile>,
) -> Result<Bird, SaveError> {
    draft.validate()?;
    let thumbnail = upload_first(uploader, bucket, attachment).await?;
    let bird = draft.into_record(thumbnail);
    let stored = repo.upsert(&bird).await?;
    info!("Saved bird {:?}", stored.slug);
    Ok(stored)
}

pub async fn save_event(
    repo: &Repository<Event>,
    uploader: &Uploader,
    bucket: &str,
    draft: EventDraft,
    attachment: Option<&ImageFile>,
) -> Result<Event, SaveError> {
    draft.validate()?;
    let cover = upload_first(uploader, bucket, attachment).await?;
    let event = draft.into_record(cover)?;
    let stored = repo.upsert(&event).await?;
    info!("Saved event {:?}", stored.title);
    Ok(stored)
}

pub async fn delete_record<E: Entity>(repo: &Repository<E>, id: &RecordId) -> Result<(), StoreError> {
    repo.delete(id).await?;
    info!("Deleted {} {id}", E::NOUN.to_lowercase());
    Ok(())
}
