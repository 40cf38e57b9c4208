//! Read-only views of the journal for the command line: the gallery, a bird's
//! detail page, the events timeline and an event's detail page. Each view
//! returns `Ok(false)` when it could only show a failure or not-found notice.

use std::io::Write;

use anyhow::Result;
use log::info;

use crate::admin::drafts::ContactForm;
use crate::admin::filter::{collect_tags, gallery_filter};
use crate::data::{Collection, Repository};
use crate::models::{Bird, Event};

/// Gallery options.
#[derive(Debug, Clone, Default)]
pub struct BirdQuery {
    pub search: String,
    pub tag: Option<String>,
    pub featured_only: bool,
}

fn field(out: &mut impl Write, label: &str, value: &str) -> Result<()> {
    if !value.trim().is_empty() {
        writeln!(out, "{label:<12} {value}")?;
    }
    Ok(())
}

pub async fn list_birds(out: &mut impl Write, repo: &Repository<Bird>, query: &BirdQuery) -> Result<bool> {
    let mut birds = Collection::new();
    birds.fetch_all(repo).await;
    if let Some(error) = birds.error() {
        writeln!(out, "Oops! Something went wrong")?;
        writeln!(out, "{error}")?;
        return Ok(false);
    }

    let shown: Vec<&Bird> = gallery_filter(birds.items(), &query.search, query.tag.as_deref())
        .into_iter()
        .filter(|bird| !query.featured_only || bird.is_featured)
        .collect();

    writeln!(out, "Tags: {}", collect_tags(birds.items()).join(", "))?;
    if shown.is_empty() {
        writeln!(out, "No results found")?;
        writeln!(out, "Try adjusting your filters or search terms.")?;
        return Ok(true);
    }

    for bird in shown {
        let marker = if bird.is_featured { "*" } else { " " };
        writeln!(
            out,
            "{marker} {:<28} {:<24} {}",
            bird.english_name, bird.slug, bird.population_status
        )?;
    }
    Ok(true)
}

pub async fn show_bird(out: &mut impl Write, repo: &Repository<Bird>, slug: &str) -> Result<bool> {
    let mut birds = Collection::new();
    let Some(bird) = birds.fetch_by_slug(repo, slug).await else {
        writeln!(out, "Observation Missing")?;
        writeln!(out, "Bird species not found.")?;
        writeln!(out, "Run `avian-journal birds` to return to the gallery.")?;
        return Ok(false);
    };

    writeln!(out, "{}", bird.display_name())?;
    field(out, "Local name", &bird.local_name)?;
    field(out, "Status", bird.population_status.as_str())?;
    field(out, "Location", &bird.location)?;
    field(out, "Views", &bird.view_count.to_string())?;
    field(out, "Tags", &bird.tags.join(", "))?;
    field(out, "Image", &bird.thumbnail)?;
    writeln!(out)?;
    writeln!(out, "{}", bird.description)?;
    if !bird.fun_fact.trim().is_empty() {
        writeln!(out)?;
        writeln!(out, "Fun fact: {}", bird.fun_fact)?;
    }
    Ok(true)
}

pub async fn list_events(out: &mut impl Write, repo: &Repository<Event>) -> Result<bool> {
    let mut events = Collection::new();
    events.fetch_all(repo).await;
    if let Some(error) = events.error() {
        writeln!(out, "Connection Lost")?;
        writeln!(out, "{error}")?;
        return Ok(false);
    }

    if events.items().is_empty() {
        writeln!(out, "No expeditions recorded")?;
        writeln!(out, "Check back later for new bird watching updates.")?;
        return Ok(true);
    }

    for event in events.items() {
        writeln!(
            out,
            "{}  {:<32} {}",
            event.event_date.format("%Y-%m-%d"),
            event.title,
            event.location_name
        )?;
    }
    Ok(true)
}

pub async fn show_event(out: &mut impl Write, repo: &Repository<Event>, slug: &str) -> Result<bool> {
    let mut events = Collection::new();
    let Some(event) = events.fetch_by_slug(repo, slug).await else {
        writeln!(out, "Event not found.")?;
        writeln!(out, "Run `avian-journal events` to return to the timeline.")?;
        return Ok(false);
    };

    writeln!(out, "{}", event.title)?;
    field(out, "Date", &event.event_date.format("%B %-d, %Y").to_string())?;
    field(out, "Location", &event.location_name)?;
    field(out, "Species", &event.bird_species_spotted.join(", "))?;
    for image in &event.images {
        let line = if image.caption.is_empty() {
            image.url.clone()
        } else {
            format!("{} ({})", image.url, image.caption)
        };
        field(out, "Image", &line)?;
    }
    writeln!(out)?;
    writeln!(out, "{}", event.description)?;
    Ok(true)
}

/// Validate a contact message and record it in the log. There is no
/// delivery channel behind the form.
pub fn send_contact(out: &mut impl Write, form: &ContactForm) -> Result<bool> {
    if let Err(err) = form.validate() {
        writeln!(out, "{err}")?;
        return Ok(false);
    }

    info!(
        "Contact message from {} <{}>: {}",
        form.name.trim(),
        form.email.trim(),
        form.message.trim()
    );
    writeln!(out, "Message Received")?;
    writeln!(
        out,
        "Thank you for reaching out! I'll read your message and get back to you as soon as I've returned from the field."
    )?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::PopulationStatus;
    use crate::store::{LocalStore, RestStore};

    fn local() -> (Arc<LocalStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        (Arc::new(LocalStore::in_memory(dir.path()).unwrap()), dir)
    }

    fn rendered(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    #[tokio::test]
    async fn gallery_lists_matching_birds() {
        let (store, _dir) = local();
        let repo: Repository<Bird> = Repository::new(store);
        for (name, tag, featured) in [
            ("Bald Eagle", "Raptor", true),
            ("Scarlet Macaw", "Parrot", false),
        ] {
            repo.upsert(&Bird {
                english_name: name.to_string(),
                slug: crate::slug::slugify(name),
                tags: vec![tag.to_string()],
                is_featured: featured,
                population_status: PopulationStatus::Uncommon,
                ..Bird::default()
            })
            .await
            .unwrap();
        }

        let mut out = Vec::new();
        let query = BirdQuery {
            search: "EAGLE".to_string(),
            ..BirdQuery::default()
        };
        assert!(list_birds(&mut out, &repo, &query).await.unwrap());
        let text = rendered(out);
        assert!(text.contains("Tags: All, Raptor, Parrot"));
        assert!(text.contains("bald-eagle"));
        assert!(!text.contains("scarlet-macaw"));

        let mut out = Vec::new();
        let featured = BirdQuery {
            featured_only: true,
            tag: Some("Parrot".to_string()),
            ..BirdQuery::default()
        };
        list_birds(&mut out, &repo, &featured).await.unwrap();
        assert!(rendered(out).contains("No results found"));
    }

    #[tokio::test]
    async fn missing_bird_points_back_to_gallery() {
        let (store, _dir) = local();
        let repo: Repository<Bird> = Repository::new(store);

        let mut out = Vec::new();
        assert!(!show_bird(&mut out, &repo, "dodo").await.unwrap());
        let text = rendered(out);
        assert!(text.contains("Bird species not found."));
        assert!(text.contains("avian-journal birds"));
    }

    #[tokio::test]
    async fn event_detail_shows_species_and_images() {
        let (store, _dir) = local();
        let repo: Repository<Event> = Repository::new(store);
        repo.upsert(&Event {
            id: None,
            title: "Dawn chorus".to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            location_name: "Wicken Fen".to_string(),
            description: "Early start by the lode.".to_string(),
            bird_species_spotted: vec!["Cuckoo".to_string(), "Bittern".to_string()],
            images: vec![crate::models::EventImage {
                url: "https://cdn/fen.jpg".to_string(),
                caption: "Mist".to_string(),
            }],
            slug: Some("dawn-chorus".to_string()),
            created_at: None,
        })
        .await
        .unwrap();

        let mut out = Vec::new();
        assert!(show_event(&mut out, &repo, "dawn-chorus").await.unwrap());
        let text = rendered(out);
        assert!(text.contains("May 4, 2024"));
        assert!(text.contains("Cuckoo, Bittern"));
        assert!(text.contains("https://cdn/fen.jpg (Mist)"));
    }

    #[tokio::test]
    async fn list_failure_shows_generic_notice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/events"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "message": "database is starting up"
            })))
            .mount(&server)
            .await;

        let store = RestStore::new(&server.uri(), "anon", std::time::Duration::from_secs(5)).unwrap();
        let repo: Repository<Event> = Repository::new(Arc::new(store));

        let mut out = Vec::new();
        assert!(!list_events(&mut out, &repo).await.unwrap());
        let text = rendered(out);
        assert!(text.starts_with("Connection Lost"));
        assert!(text.contains("database is starting up"));
    }

    #[test]
    fn contact_rejects_malformed_email() {
        let mut out = Vec::new();
        let form = ContactForm {
            name: "Ada".to_string(),
            email: "ada at example.org".to_string(),
            message: "Saw a kestrel.".to_string(),
        };
        assert!(!send_contact(&mut out, &form).unwrap());
        assert_eq!(rendered(out).trim(), "Please enter a valid email address.");
    }

    #[test]
    fn contact_confirms_valid_message() {
        let mut out = Vec::new();
        let form = ContactForm {
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            message: "Saw a kestrel.".to_string(),
        };
        assert!(send_contact(&mut out, &form).unwrap());
        assert!(rendered(out).starts_with("Message Received"));
    }
}
