//! Library half of the avian journal: a bird photographer's catalog of
//! species and field trips, with a terminal admin console for maintaining it.
//!
//! Records live either in the hosted backend (`store::RestStore`) or in a
//! local SQLite file (`store::LocalStore`). The `data` layer wraps both behind
//! typed repositories and cached collections, `admin` holds the write paths
//! and form lifecycle, and `catalog`/`ui` are the two front ends.
pub mod admin;
pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod fields;
pub mod models;
pub mod slug;
pub mod store;
pub mod ui;

/// The record types every layer passes around.
pub use models::{Bird, Event, EventImage, PopulationStatus, RecordId};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
