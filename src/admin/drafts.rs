//! Form-shaped editing values for the admin console. Every field is the text
//! the admin typed; conversion to records happens only after validation.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex_lite::Regex;
use thiserror::Error;

use crate::fields::TextList;
use crate::models::{Bird, Event, EventImage, PopulationStatus};
use crate::slug::{is_url_safe, slugify};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A form that cannot be submitted yet. Checked before any request is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required.")]
    Missing(&'static str),

    #[error("{0} must be a date like 2024-05-31.")]
    BadDate(&'static str),

    #[error("Slug may only contain lower-case letters, digits and hyphens.")]
    BadSlug,

    #[error("Please enter a valid email address.")]
    BadEmail,
}

fn require(value: &str, label: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Missing(label))
    } else {
        Ok(())
    }
}

fn check_slug(slug: &str) -> Result<(), ValidationError> {
    let slug = slug.trim();
    if slug.is_empty() || is_url_safe(slug) {
        Ok(())
    } else {
        Err(ValidationError::BadSlug)
    }
}

/// Explicit slug if one was typed, otherwise one derived from `source`.
fn slug_or_derived(slug: &str, source: &str) -> String {
    let slug = slug.trim();
    if slug.is_empty() {
        slugify(source)
    } else {
        slug.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BirdDraft {
    pub english_name: String,
    pub local_name: String,
    pub scientific_name: String,
    pub description: String,
    pub fun_fact: String,
    pub location: String,
    pub population_status: PopulationStatus,
    pub slug: String,
    pub thumbnail: String,
    pub tags: String,
    pub is_featured: bool,
    /// The record being edited; `None` when creating.
    original: Option<Bird>,
}

impl BirdDraft {
    pub fn from_record(bird: &Bird) -> Self {
        Self {
            english_name: bird.english_name.clone(),
            local_name: bird.local_name.clone(),
            scientific_name: bird.scientific_name.clone(),
            description: bird.description.clone(),
            fun_fact: bird.fun_fact.clone(),
            location: bird.location.clone(),
            population_status: bird.population_status,
            slug: bird.slug.clone(),
            thumbnail: bird.thumbnail.clone(),
            tags: TextList::from(bird.tags.as_slice()).to_string(),
            is_featured: bird.is_featured,
            original: Some(bird.clone()),
        }
    }

    pub fn is_new(&self) -> bool {
        self.original.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.english_name, "English name")?;
        require(&self.scientific_name, "Scientific name")?;
        require(&self.location, "Location")?;
        require(&self.description, "Description")?;
        check_slug(&self.slug)
    }

    /// Build the record to upsert. `uploaded_thumbnail` replaces the typed
    /// thumbnail URL when an image was uploaded for this save.
    pub fn into_record(self, uploaded_thumbnail: Option<String>) -> Bird {
        let base = self.original.unwrap_or_default();
        let slug = slug_or_derived(&self.slug, &self.english_name);
        Bird {
            english_name: self.english_name.trim().to_string(),
            local_name: self.local_name.trim().to_string(),
            scientific_name: self.scientific_name.trim().to_string(),
            description: self.description.trim().to_string(),
            fun_fact: self.fun_fact.trim().to_string(),
            location: self.location.trim().to_string(),
            population_status: self.population_status,
            slug,
            thumbnail: uploaded_thumbnail.unwrap_or_else(|| self.thumbnail.trim().to_string()),
            tags: TextList::parse(&self.tags).into_vec(),
            is_featured: self.is_featured,
            ..base
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub event_date: String,
    pub location_name: String,
    pub description: String,
    pub species: String,
    /// URL of the cover image (the first entry of `images`).
    pub cover_url: String,
    pub slug: String,
    original: Option<Event>,
}

impl EventDraft {
    /// An empty form dated `today`.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            title: String::new(),
            event_date: today.format(DATE_FORMAT).to_string(),
            location_name: String::new(),
            description: String::new(),
            species: String::new(),
            cover_url: String::new(),
            slug: String::new(),
            original: None,
        }
    }

    pub fn from_record(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            event_date: event.event_date.format(DATE_FORMAT).to_string(),
            location_name: event.location_name.clone(),
            description: event.description.clone(),
            species: TextList::from(event.bird_species_spotted.as_slice()).to_string(),
            cover_url: event
                .images
                .first()
                .map(|image| image.url.clone())
                .unwrap_or_default(),
            slug: event.slug.clone().unwrap_or_default(),
            original: Some(event.clone()),
        }
    }

    pub fn is_new(&self) -> bool {
        self.original.is_none()
    }

    fn parsed_date(&self) -> Result<NaiveDate, ValidationError> {
        require(&self.event_date, "Event date")?;
        NaiveDate::parse_from_str(self.event_date.trim(), DATE_FORMAT)
            .map_err(|_| ValidationError::BadDate("Event date"))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, "Title")?;
        self.parsed_date()?;
        require(&self.location_name, "Location name")?;
        require(&self.description, "Description")?;
        check_slug(&self.slug)
    }

    /// Build the record to upsert. The cover is the uploaded image when there
    /// is one, else the typed URL; images after the cover are kept as they
    /// were.
    pub fn into_record(self, uploaded_cover: Option<String>) -> Result<Event, ValidationError> {
        let event_date = self.parsed_date()?;
        let (id, mut images, created_at) = match self.original {
            Some(event) => (event.id, event.images, event.created_at),
            None => (None, Vec::new(), None),
        };

        let cover = uploaded_cover.unwrap_or_else(|| self.cover_url.trim().to_string());
        match (cover.is_empty(), images.first_mut()) {
            (false, Some(first)) => first.url = cover,
            (false, None) => images.push(EventImage {
                url: cover,
                caption: String::new(),
            }),
            (true, Some(_)) => {
                images.remove(0);
            }
            (true, None) => {}
        }

        Ok(Event {
            id,
            title: self.title.trim().to_string(),
            event_date,
            location_name: self.location_name.trim().to_string(),
            description: self.description.trim().to_string(),
            bird_species_spotted: TextList::parse(&self.species).into_vec(),
            images,
            slug: Some(slug_or_derived(&self.slug, &self.title)),
            created_at,
        })
    }
}

/// The public contact form. Messages are not stored anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.name, "Name")?;
        require(&self.email, "Email")?;
        if !looks_like_email(&self.email) {
            return Err(ValidationError::BadEmail);
        }
        require(&self.message, "Message")
    }
}

/// Non-blank text on both sides of an `@`, with no whitespace anywhere.
fn looks_like_email(candidate: &str) -> bool {
    static EMAIL_RE: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^\S+@\S+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(candidate))
}
