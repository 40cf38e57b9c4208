use std::path::Path;

use anyhow::Result;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::admin::drafts::{BirdDraft, EventDraft};
use crate::admin::EntityKind;
use crate::data::ImageFile;
use crate::fields::TextList;
use crate::models::RecordId;

/// Minimum characters typed before species autocomplete kicks in.
const AUTOCOMPLETE_MIN_CHARS: usize = 2;

/// Render one `label: value` row, dimming empty values and highlighting the
/// focused field.
fn field_line(label: &str, value: &str, placeholder: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(display, style),
    ])
}

/// Load the file named in an "image file" field, if one was given.
fn read_attachment(path: &str) -> Result<Option<ImageFile>> {
    let path = path.trim();
    if path.is_empty() {
        return Ok(None);
    }
    ImageFile::read(Path::new(path)).map(Some)
}

/// Password prompt shown until the session is unlocked.
#[derive(Default)]
pub(crate) struct LoginForm {
    pub(crate) password: String,
    pub(crate) error: Option<String>,
}

impl LoginForm {
    pub(crate) fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.password.push(ch);
            self.error = None;
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.password.pop();
    }

    /// The password as rendered on screen.
    pub(crate) fn masked(&self) -> String {
        "*".repeat(self.password.chars().count())
    }
}

/// Fields of the bird form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum BirdField {
    EnglishName,
    LocalName,
    ScientificName,
    Location,
    Status,
    Description,
    FunFact,
    Tags,
    Thumbnail,
    ImageFile,
    Slug,
    Featured,
}

impl BirdField {
    pub(crate) const ORDER: [BirdField; 12] = [
        BirdField::EnglishName,
        BirdField::LocalName,
        BirdField::ScientificName,
        BirdField::Location,
        BirdField::Status,
        BirdField::Description,
        BirdField::FunFact,
        BirdField::Tags,
        BirdField::Thumbnail,
        BirdField::ImageFile,
        BirdField::Slug,
        BirdField::Featured,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            BirdField::EnglishName => "English name",
            BirdField::LocalName => "Local name",
            BirdField::ScientificName => "Scientific name",
            BirdField::Location => "Location",
            BirdField::Status => "Status",
            BirdField::Description => "Description",
            BirdField::FunFact => "Fun fact",
            BirdField::Tags => "Tags",
            BirdField::Thumbnail => "Thumbnail URL",
            BirdField::ImageFile => "Upload file",
            BirdField::Slug => "Slug",
            BirdField::Featured => "Featured",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            BirdField::EnglishName
            | BirdField::ScientificName
            | BirdField::Location
            | BirdField::Description => "<required>",
            BirdField::Tags => "<comma separated>",
            BirdField::ImageFile => "<path to image>",
            BirdField::Slug => "<derived from English name>",
            _ => "<optional>",
        }
    }
}

/// Editing state for a bird record.
#[derive(Clone)]
pub(crate) struct BirdForm {
    pub(crate) draft: BirdDraft,
    pub(crate) image_path: String,
    pub(crate) active: BirdField,
    /// Set when editing an existing record.
    pub(crate) id: Option<RecordId>,
}

impl BirdForm {
    pub(crate) fn new(draft: BirdDraft, id: Option<RecordId>) -> Self {
        Self {
            draft,
            image_path: String::new(),
            active: BirdField::EnglishName,
            id,
        }
    }

    pub(crate) fn title(&self) -> &'static str {
        if self.draft.is_new() {
            "Register Bird"
        } else {
            "Edit Bird"
        }
    }

    fn text_mut(&mut self, field: BirdField) -> Option<&mut String> {
        let draft = &mut self.draft;
        match field {
            BirdField::EnglishName => Some(&mut draft.english_name),
            BirdField::LocalName => Some(&mut draft.local_name),
            BirdField::ScientificName => Some(&mut draft.scientific_name),
            BirdField::Location => Some(&mut draft.location),
            BirdField::Description => Some(&mut draft.description),
            BirdField::FunFact => Some(&mut draft.fun_fact),
            BirdField::Tags => Some(&mut draft.tags),
            BirdField::Thumbnail => Some(&mut draft.thumbnail),
            BirdField::ImageFile => Some(&mut self.image_path),
            BirdField::Slug => Some(&mut draft.slug),
            BirdField::Status | BirdField::Featured => None,
        }
    }

    fn value(&self, field: BirdField) -> String {
        let draft = &self.draft;
        match field {
            BirdField::EnglishName => draft.english_name.clone(),
            BirdField::LocalName => draft.local_name.clone(),
            BirdField::ScientificName => draft.scientific_name.clone(),
            BirdField::Location => draft.location.clone(),
            BirdField::Status => format!("< {} >", draft.population_status),
            BirdField::Description => draft.description.clone(),
            BirdField::FunFact => draft.fun_fact.clone(),
            BirdField::Tags => draft.tags.clone(),
            BirdField::Thumbnail => draft.thumbnail.clone(),
            BirdField::ImageFile => self.image_path.clone(),
            BirdField::Slug => draft.slug.clone(),
            BirdField::Featured => {
                let mark = if draft.is_featured { "[x]" } else { "[ ]" };
                mark.to_string()
            }
        }
    }

    /// Move focus forward or backward, wrapping at either end.
    pub(crate) fn next_field(&mut self, forward: bool) {
        let len = BirdField::ORDER.len();
        let current = self.active_index();
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.active = BirdField::ORDER[next];
    }

    pub(crate) fn active_index(&self) -> usize {
        BirdField::ORDER
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0)
    }

    /// Insert a character into the focused field. Space toggles the featured
    /// flag; the status field only reacts to arrow keys.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if self.active == BirdField::Featured {
            if ch == ' ' {
                self.draft.is_featured = !self.draft.is_featured;
                return true;
            }
            return false;
        }
        match self.text_mut(self.active) {
            Some(text) => {
                text.push(ch);
                true
            }
            None => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(text) = self.text_mut(self.active) {
            text.pop();
        }
    }

    /// Left/right on a choice field.
    pub(crate) fn cycle(&mut self, forward: bool) {
        match self.active {
            BirdField::Status => {
                self.draft.population_status = self.draft.population_status.cycle(forward)
            }
            BirdField::Featured => self.draft.is_featured = !self.draft.is_featured,
            _ => {}
        }
    }

    pub(crate) fn attachment(&self) -> Result<Option<ImageFile>> {
        read_attachment(&self.image_path)
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        BirdField::ORDER
            .iter()
            .map(|field| {
                field_line(
                    field.label(),
                    &self.value(*field),
                    field.placeholder(),
                    *field == self.active,
                )
            })
            .collect()
    }

    /// Column of the text cursor within the focused row.
    pub(crate) fn cursor_column(&self) -> usize {
        self.active.label().chars().count() + 2 + self.value(self.active).chars().count()
    }
}

/// Fields of the event form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum EventField {
    Title,
    Date,
    Location,
    Description,
    Species,
    CoverUrl,
    ImageFile,
    Slug,
}

impl EventField {
    pub(crate) const ORDER: [EventField; 8] = [
        EventField::Title,
        EventField::Date,
        EventField::Location,
        EventField::Description,
        EventField::Species,
        EventField::CoverUrl,
        EventField::ImageFile,
        EventField::Slug,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            EventField::Title => "Title",
            EventField::Date => "Date",
            EventField::Location => "Location name",
            EventField::Description => "Description",
            EventField::Species => "Species spotted",
            EventField::CoverUrl => "Cover image URL",
            EventField::ImageFile => "Upload file",
            EventField::Slug => "Slug",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            EventField::Title | EventField::Location | EventField::Description => "<required>",
            EventField::Date => "<YYYY-MM-DD>",
            EventField::Species => "<comma separated>",
            EventField::ImageFile => "<path to image>",
            EventField::Slug => "<derived from title>",
            EventField::CoverUrl => "<optional>",
        }
    }
}

/// Editing state for an event, including species-name autocomplete.
#[derive(Clone)]
pub(crate) struct EventForm {
    pub(crate) draft: EventDraft,
    pub(crate) image_path: String,
    pub(crate) active: EventField,
    pub(crate) id: Option<RecordId>,
    pub(crate) suggestion: Option<String>,
    pub(crate) autocomplete_disabled: bool,
}

impl EventForm {
    pub(crate) fn new(draft: EventDraft, id: Option<RecordId>) -> Self {
        Self {
            draft,
            image_path: String::new(),
            active: EventField::Title,
            id,
            suggestion: None,
            autocomplete_disabled: false,
        }
    }

    pub(crate) fn title(&self) -> &'static str {
        if self.draft.is_new() {
            "Register Event"
        } else {
            "Edit Event"
        }
    }

    fn text(&self, field: EventField) -> &String {
        match field {
            EventField::Title => &self.draft.title,
            EventField::Date => &self.draft.event_date,
            EventField::Location => &self.draft.location_name,
            EventField::Description => &self.draft.description,
            EventField::Species => &self.draft.species,
            EventField::CoverUrl => &self.draft.cover_url,
            EventField::ImageFile => &self.image_path,
            EventField::Slug => &self.draft.slug,
        }
    }

    fn text_mut(&mut self, field: EventField) -> &mut String {
        match field {
            EventField::Title => &mut self.draft.title,
            EventField::Date => &mut self.draft.event_date,
            EventField::Location => &mut self.draft.location_name,
            EventField::Description => &mut self.draft.description,
            EventField::Species => &mut self.draft.species,
            EventField::CoverUrl => &mut self.draft.cover_url,
            EventField::ImageFile => &mut self.image_path,
            EventField::Slug => &mut self.draft.slug,
        }
    }

    pub(crate) fn next_field(&mut self, forward: bool) {
        let len = EventField::ORDER.len();
        let current = self.active_index();
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.active = EventField::ORDER[next];
        if self.active != EventField::Species {
            self.suggestion = None;
        }
    }

    pub(crate) fn active_index(&self) -> usize {
        EventField::ORDER
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0)
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if self.active == EventField::Species {
            self.autocomplete_disabled = false;
        }
        self.text_mut(self.active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        if self.active == EventField::Species {
            self.autocomplete_disabled = false;
        }
        self.text_mut(self.active).pop();
    }

    pub(crate) fn attachment(&self) -> Result<Option<ImageFile>> {
        read_attachment(&self.image_path)
    }

    /// Suggest a bird name for the species entry currently being typed.
    pub(crate) fn update_suggestion(&mut self, names: &[String]) {
        if self.active != EventField::Species || self.autocomplete_disabled {
            self.suggestion = None;
            return;
        }

        let fragment = TextList::trailing_fragment(&self.draft.species);
        if fragment.chars().count() < AUTOCOMPLETE_MIN_CHARS {
            self.suggestion = None;
            return;
        }

        let fragment_lower = fragment.to_lowercase();
        self.suggestion = names
            .iter()
            .find(|name| name.to_lowercase().starts_with(&fragment_lower))
            .filter(|name| name.to_lowercase() != fragment_lower)
            .cloned();
    }

    /// Replace the fragment being typed with the suggested name.
    pub(crate) fn accept_suggestion(&mut self) -> bool {
        let Some(candidate) = self.suggestion.take() else {
            return false;
        };
        let fragment_len = TextList::trailing_fragment(&self.draft.species).len();
        let keep = self.draft.species.len() - fragment_len;
        self.draft.species.truncate(keep);
        self.draft.species.push_str(&candidate);
        self.autocomplete_disabled = true;
        true
    }

    /// Dismiss the current suggestion until the species field is edited again.
    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.has_active_suggestion() {
            self.autocomplete_disabled = true;
            self.suggestion = None;
            return true;
        }
        false
    }

    pub(crate) fn has_active_suggestion(&self) -> bool {
        self.active == EventField::Species && self.suggestion.is_some()
    }

    /// Remaining characters of the suggestion, drawn as a ghosted hint.
    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let typed = TextList::trailing_fragment(&self.draft.species).chars().count();
        let suffix: String = candidate.chars().skip(typed).collect();
        if suffix.is_empty() {
            None
        } else {
            Some(suffix)
        }
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        EventField::ORDER
            .iter()
            .map(|field| {
                let is_active = *field == self.active;
                let mut line = field_line(
                    field.label(),
                    self.text(*field),
                    field.placeholder(),
                    is_active,
                );
                if *field == EventField::Species && is_active {
                    if let Some(suffix) = self.suggestion_suffix() {
                        line.spans
                            .push(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
                    }
                }
                line
            })
            .collect()
    }

    pub(crate) fn cursor_column(&self) -> usize {
        self.active.label().chars().count() + 2 + self.text(self.active).chars().count()
    }
}

/// A delete awaiting a yes/no answer.
#[derive(Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) kind: EntityKind,
    pub(crate) id: RecordId,
    pub(crate) label: String,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::PopulationStatus;

    fn event_form() -> EventForm {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut form = EventForm::new(EventDraft::blank(today), None);
        form.active = EventField::Species;
        form
    }

    fn names() -> Vec<String> {
        vec!["Barn Owl".to_string(), "Bald Eagle".to_string()]
    }

    #[test]
    fn species_autocomplete_completes_last_entry() {
        let mut form = event_form();
        for ch in "Osprey, bal".chars() {
            form.push_char(ch);
        }
        form.update_suggestion(&names());
        assert_eq!(form.suggestion_suffix().as_deref(), Some("d Eagle"));

        assert!(form.accept_suggestion());
        assert_eq!(form.draft.species, "Osprey, Bald Eagle");
        form.update_suggestion(&names());
        assert!(!form.has_active_suggestion());
    }

    #[test]
    fn autocomplete_waits_for_two_characters() {
        let mut form = event_form();
        form.push_char('B');
        form.update_suggestion(&names());
        assert!(form.suggestion.is_none());

        form.push_char('a');
        form.update_suggestion(&names());
        assert_eq!(form.suggestion.as_deref(), Some("Barn Owl"));
        assert!(form.cancel_autocomplete());
        form.update_suggestion(&names());
        assert!(form.suggestion.is_none());
    }

    #[test]
    fn bird_form_choice_fields_use_arrows_and_space() {
        let mut form = BirdForm::new(BirdDraft::default(), None);
        form.active = BirdField::Status;
        assert!(!form.push_char('x'));
        form.cycle(true);
        assert_eq!(form.draft.population_status, PopulationStatus::Uncommon);

        form.active = BirdField::Featured;
        assert!(form.push_char(' '));
        assert!(form.draft.is_featured);
    }

    #[test]
    fn focus_wraps_in_both_directions() {
        let mut form = BirdForm::new(BirdDraft::default(), None);
        form.next_field(false);
        assert_eq!(form.active, BirdField::Featured);
        form.next_field(true);
        assert_eq!(form.active, BirdField::EnglishName);
    }

    #[test]
    fn blank_upload_path_means_no_attachment() {
        let form = BirdForm::new(BirdDraft::default(), None);
        assert!(form.attachment().unwrap().is_none());

        let mut form = form;
        form.image_path = "/definitely/not/here.png".to_string();
        assert!(form.attachment().is_err());
    }
}
