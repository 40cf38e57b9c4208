//! Read-side caches and the upload helper that the gallery, event pages and
//! admin console share.

mod collection;
mod repository;
mod upload;

pub use collection::{Collection, FetchTicket};
pub use repository::Repository;
pub use upload::{storage_key, ImageFile, Uploader};
