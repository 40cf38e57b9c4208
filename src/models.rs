//! Domain records that mirror the hosted `birds` and `events` tables. These
//! stay plain data holders: the persistence layer moves them to and from JSON
//! rows, and the admin layer turns form drafts into them.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::store::OrderBy;

/// Primary key of a stored row. The hosted tables may use text or numeric
/// keys, so both JSON shapes are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => RecordId(text),
            Raw::Number(number) => RecordId(number.to_string()),
        })
    }
}

/// Conservation status shown on bird cards and detail pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PopulationStatus {
    #[default]
    Common,
    Uncommon,
    Vulnerable,
    Endangered,
    CriticallyEndangered,
}

impl PopulationStatus {
    pub const ALL: [PopulationStatus; 5] = [
        PopulationStatus::Common,
        PopulationStatus::Uncommon,
        PopulationStatus::Vulnerable,
        PopulationStatus::Endangered,
        PopulationStatus::CriticallyEndangered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PopulationStatus::Common => "Common",
            PopulationStatus::Uncommon => "Uncommon",
            PopulationStatus::Vulnerable => "Vulnerable",
            PopulationStatus::Endangered => "Endangered",
            PopulationStatus::CriticallyEndangered => "Critically Endangered",
        }
    }

    /// Step through the statuses in severity order, wrapping at the ends. The
    /// admin form uses this in place of a drop-down.
    pub fn cycle(self, forward: bool) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        let len = Self::ALL.len();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        Self::ALL[next]
    }
}

impl fmt::Display for PopulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PopulationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown population status {value:?}"))
    }
}

impl Serialize for PopulationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Unrecognised values decode as the default, with a warning.
impl<'de> Deserialize<'de> for PopulationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(PopulationStatus::default());
        };
        Ok(raw.parse().unwrap_or_else(|err| {
            warn!("{err}, showing it as {}", PopulationStatus::default());
            PopulationStatus::default()
        }))
    }
}

/// Nullable columns decode to their empty value instead of failing the row.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A species entry in the public gallery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bird {
    /// Absent until the backend assigns one on first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub english_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub local_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scientific_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fun_fact: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default)]
    pub population_status: PopulationStatus,
    /// Unique, URL-safe handle used by the detail page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_featured: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub view_count: i64,
    /// Assigned by the backend and never written back.
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
}

impl Bird {
    /// `English name (Scientific name)`, omitting the parenthetical when the
    /// scientific name is blank.
    pub fn display_name(&self) -> String {
        if self.scientific_name.trim().is_empty() {
            self.english_name.clone()
        } else {
            format!("{} ({})", self.english_name, self.scientific_name)
        }
    }
}

/// A photo attached to an event, with an optional caption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventImage {
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub caption: String,
}

/// An outing or expedition on the events timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub title: String,
    pub event_date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Free-text species names; they are not checked against bird records.
    #[serde(default, deserialize_with = "null_as_default")]
    pub bird_species_spotted: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<EventImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
}

impl Event {
    /// URL of the first image, which cards use as the cover.
    pub fn cover_url(&self) -> Option<&str> {
        self.images
            .first()
            .map(|image| image.url.trim())
            .filter(|url| !url.is_empty())
    }
}

/// Binds a record type to its table and to the handful of per-entity choices
/// the generic data and admin layers need.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table that stores the rows.
    const TABLE: &'static str;
    /// Ordering for list queries.
    const ORDER: OrderBy;
    /// Singular noun used in status messages.
    const NOUN: &'static str;

    fn id(&self) -> Option<&RecordId>;

    fn slug(&self) -> Option<&str>;

    /// Fields the admin list search matches against.
    fn search_fields(&self) -> Vec<&str>;

    /// One-line label for lists and confirmations.
    fn label(&self) -> String;
}

impl Entity for Bird {
    const TABLE: &'static str = "birds";
    const ORDER: OrderBy = OrderBy::descending("created_at");
    const NOUN: &'static str = "Bird";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn slug(&self) -> Option<&str> {
        Some(self.slug.as_str()).filter(|slug| !slug.is_empty())
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.english_name.as_str(),
            self.local_name.as_str(),
            self.scientific_name.as_str(),
            self.location.as_str(),
        ]
    }

    fn label(&self) -> String {
        self.english_name.clone()
    }
}

impl Entity for Event {
    const TABLE: &'static str = "events";
    const ORDER: OrderBy = OrderBy::descending("event_date");
    const NOUN: &'static str = "Event";

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref().filter(|slug| !slug.is_empty())
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.location_name.as_str()]
    }

    fn label(&self) -> String {
        format!("{} ({})", self.title, self.event_date)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn bird_row_with_nulls_and_numeric_id_decodes() {
        let row = json!({
            "id": 42,
            "english_name": "Bald Eagle",
            "local_name": null,
            "scientific_name": "Haliaeetus leucocephalus",
            "population_status": "Critically Endangered",
            "tags": null,
            "slug": "bald-eagle",
            "created_at": "2025-01-02T03:04:05Z"
        });

        let bird: Bird = serde_json::from_value(row).unwrap();
        assert_eq!(bird.id, Some(RecordId::new("42")));
        assert_eq!(bird.local_name, "");
        assert!(bird.tags.is_empty());
        assert_eq!(
            bird.population_status,
            PopulationStatus::CriticallyEndangered
        );
        assert_eq!(bird.created_at.as_deref(), Some("2025-01-02T03:04:05Z"));
    }

    #[test]
    fn new_bird_serializes_without_id_or_created_at() {
        let bird = Bird {
            english_name: "Snowy Owl".into(),
            slug: "snowy-owl".into(),
            created_at: Some("2025-01-01".into()),
            ..Bird::default()
        };

        let value = serde_json::to_value(&bird).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("created_at").is_none());
        assert_eq!(value["population_status"], "Common");
    }

    #[test]
    fn unknown_population_status_falls_back_to_default() {
        let row = json!({ "english_name": "Bald Eagle", "population_status": "Recovering" });
        let bird: Bird = serde_json::from_value(row).unwrap();
        assert_eq!(bird.english_name, "Bald Eagle");
        assert_eq!(bird.population_status, PopulationStatus::Common);
    }

    #[test]
    fn event_row_decodes_images_and_date() {
        let row = json!({
            "id": "a1",
            "title": "Morning Marsh Observation",
            "event_date": "2024-11-20",
            "location_name": "Everglades",
            "description": "Herons at dawn.",
            "bird_species_spotted": ["Great Blue Heron"],
            "images": [{ "url": "https://img/1.jpg", "caption": null }]
        });

        let event: Event = serde_json::from_value(row).unwrap();
        assert_eq!(event.event_date, NaiveDate::from_ymd_opt(2024, 11, 20).unwrap());
        assert_eq!(event.cover_url(), Some("https://img/1.jpg"));
        assert_eq!(event.images[0].caption, "");
        assert_eq!(event.slug, None);
    }

    #[test]
    fn status_cycle_wraps() {
        assert_eq!(
            PopulationStatus::Common.cycle(false),
            PopulationStatus::CriticallyEndangered
        );
        assert_eq!(
            PopulationStatus::CriticallyEndangered.cycle(true),
            PopulationStatus::Common
        );
    }
}
