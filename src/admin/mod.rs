//! Everything the admin console does apart from drawing: the session gate,
//! form drafts and their lifecycle, the status banner and the write paths.
//! [`AdminState`] ties these together without touching the terminal, so the
//! same flow can be driven from tests.

pub mod drafts;
pub mod filter;
pub mod save;
pub mod session;
pub mod status;
pub mod workflow;

use std::time::Instant;

use log::{debug, info};

use crate::config::Config;
use crate::data::{Collection, Repository, Uploader};
use crate::error::StoreError;
use crate::models::{Bird, Entity, Event};
use crate::store::Backend;

use self::save::SaveError;
use self::status::{StatusBanner, DELETE_LINGER};
use self::workflow::{SubmitTicket, TransitionError, Workflow, SAVE_LINGER};

/// The two record types the console manages, one tab each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Birds,
    Events,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Birds, EntityKind::Events];

    pub fn title(self) -> &'static str {
        match self {
            EntityKind::Birds => "Birds",
            EntityKind::Events => "Events",
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            EntityKind::Birds => Bird::NOUN,
            EntityKind::Events => Event::NOUN,
        }
    }

    pub fn other(self) -> Self {
        match self {
            EntityKind::Birds => EntityKind::Events,
            EntityKind::Events => EntityKind::Birds,
        }
    }
}

/// Handles for every request the console can make. Cheap to clone into
/// background tasks.
#[derive(Clone)]
pub struct Services {
    pub birds: Repository<Bird>,
    pub events: Repository<Event>,
    pub uploader: Uploader,
    pub bird_bucket: String,
    pub event_bucket: String,
}

impl Services {
    pub fn new(backend: &Backend, config: &Config) -> Self {
        Self {
            birds: Repository::new(backend.tables.clone()),
            events: Repository::new(backend.tables.clone()),
            uploader: Uploader::new(backend.blobs.clone(), config.bird_bucket.clone()),
            bird_bucket: config.bird_bucket.clone(),
            event_bucket: config.event_bucket.clone(),
        }
    }
}

pub struct AdminState {
    tab: EntityKind,
    workflow: Workflow,
    banner: Option<StatusBanner>,
    pending_delete: bool,
    birds: Collection<Bird>,
    events: Collection<Event>,
}

impl Default for AdminState {
    fn default() -> Self {
        Self {
            tab: EntityKind::Birds,
            workflow: Workflow::new(),
            banner: None,
            pending_delete: false,
            birds: Collection::new(),
            events: Collection::new(),
        }
    }
}

impl AdminState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self) -> EntityKind {
        self.tab
    }

    /// Switch tabs. Only allowed while no form is open.
    pub fn switch_tab(&mut self, tab: EntityKind) -> Result<(), TransitionError> {
        if self.workflow.form_open() {
            return Err(TransitionError::FormOpen);
        }
        self.tab = tab;
        Ok(())
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn workflow_mut(&mut self) -> &mut Workflow {
        &mut self.workflow
    }

    pub fn banner(&self) -> Option<&StatusBanner> {
        self.banner.as_ref()
    }

    pub fn birds(&self) -> &Collection<Bird> {
        &self.birds
    }

    pub fn birds_mut(&mut self) -> &mut Collection<Bird> {
        &mut self.birds
    }

    pub fn events(&self) -> &Collection<Event> {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Collection<Event> {
        &mut self.events
    }

    pub fn loading(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Birds => self.birds.loading(),
            EntityKind::Events => self.events.loading(),
        }
    }

    pub fn list_error(&self, kind: EntityKind) -> Option<&str> {
        match kind {
            EntityKind::Birds => self.birds.error(),
            EntityKind::Events => self.events.error(),
        }
    }

    /// Collections whose cached list is out of date.
    pub fn stale_kinds(&self) -> Vec<EntityKind> {
        EntityKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                EntityKind::Birds => self.birds.needs_fetch(),
                EntityKind::Events => self.events.needs_fetch(),
            })
            .collect()
    }

    pub fn invalidate(&mut self, kind: EntityKind) {
        match kind {
            EntityKind::Birds => self.birds.invalidate(),
            EntityKind::Events => self.events.invalidate(),
        }
    }

    /// Fetch every stale collection in place.
    pub async fn refresh(&mut self, services: &Services) {
        for kind in self.stale_kinds() {
            match kind {
                EntityKind::Birds => self.birds.fetch_all(&services.birds).await,
                EntityKind::Events => self.events.fetch_all(&services.events).await,
            }
        }
    }

    /// Show a problem found before anything was sent, such as a form that
    /// fails validation.
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.banner = Some(StatusBanner::error(message));
    }

    /// Lock the open form and announce the save.
    pub fn begin_save(&mut self) -> Result<SubmitTicket, TransitionError> {
        let ticket = self.workflow.submit()?;
        self.banner = Some(StatusBanner::loading("Saving recorded observation..."));
        Ok(ticket)
    }

    /// Apply a finished save of a `kind` record. A successful write always
    /// invalidates the list, even when its form was cancelled meanwhile.
    pub fn finish_save(
        &mut self,
        kind: EntityKind,
        ticket: SubmitTicket,
        outcome: Result<(), SaveError>,
        now: Instant,
    ) {
        if outcome.is_ok() {
            self.invalidate(kind);
        }
        if !self.workflow.finish(ticket, outcome.is_ok(), now) {
            return;
        }
        self.banner = Some(match outcome {
            Ok(()) => {
                info!("{} saved", kind.noun());
                StatusBanner::success(
                    format!("{} successfully registered.", kind.noun()),
                    SAVE_LINGER,
                    now,
                )
            }
            Err(err) => StatusBanner::error(format!("Failed to save: {err}")),
        });
    }

    /// Announce a confirmed delete. Refused while a form or another delete is
    /// in progress.
    pub fn begin_delete(&mut self) -> Result<(), TransitionError> {
        if self.workflow.form_open() {
            return Err(TransitionError::FormOpen);
        }
        if self.pending_delete {
            return Err(TransitionError::Busy);
        }
        self.pending_delete = true;
        self.banner = Some(StatusBanner::loading("Removing record..."));
        Ok(())
    }

    pub fn finish_delete(&mut self, kind: EntityKind, outcome: Result<(), StoreError>, now: Instant) {
        self.pending_delete = false;
        self.banner = Some(match outcome {
            Ok(()) => {
                self.invalidate(kind);
                StatusBanner::success("Record successfully removed.", DELETE_LINGER, now)
            }
            Err(err) => StatusBanner::error(format!("Deletion failed: {err}")),
        });
    }

    /// Advance timers: close lingering forms and drop expired banners.
    pub fn tick(&mut self, now: Instant) {
        self.workflow.tick(now);
        if self.banner.as_ref().is_some_and(|banner| banner.is_expired(now)) {
            debug!("Status banner expired");
            self.banner = None;
        }
    }

    /// Clear the banner when the admin starts a new action.
    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::admin::status::BannerKind;
    use crate::admin::workflow::Phase;

    #[test]
    fn save_success_announces_then_closes() {
        let mut state = AdminState::new();
        state.workflow_mut().start_create().unwrap();
        let ticket = state.begin_save().unwrap();
        assert_eq!(state.banner().unwrap().kind, BannerKind::Loading);
        assert_eq!(
            state.banner().unwrap().message,
            "Saving recorded observation..."
        );

        let now = Instant::now();
        let birds_ticket = state.birds_mut().begin_fetch();
        state.birds_mut().finish_fetch(birds_ticket, Ok(Vec::new()));
        assert_eq!(state.stale_kinds(), [EntityKind::Events]);

        state.finish_save(EntityKind::Birds, ticket, Ok(()), now);
        assert_eq!(state.banner().unwrap().message, "Bird successfully registered.");
        assert!(state.stale_kinds().contains(&EntityKind::Birds));

        state.tick(now + SAVE_LINGER);
        assert_eq!(state.workflow().phase(), &Phase::Viewing);
        assert!(state.banner().is_none());
    }

    #[test]
    fn save_failure_keeps_form_and_error() {
        let mut state = AdminState::new();
        state.switch_tab(EntityKind::Events).unwrap();
        state.workflow_mut().start_create().unwrap();
        let ticket = state.begin_save().unwrap();

        let now = Instant::now();
        state.finish_save(
            EntityKind::Events,
            ticket,
            Err(SaveError::Upload("bucket not found".to_string())),
            now,
        );

        let banner = state.banner().unwrap();
        assert_eq!(banner.kind, BannerKind::Error);
        assert_eq!(
            banner.message,
            "Failed to save: Image upload failed: bucket not found"
        );
        state.tick(now + Duration::from_secs(30));
        assert!(state.banner().is_some());
        assert_eq!(state.workflow().phase(), &Phase::Creating);
    }

    #[test]
    fn tabs_are_locked_while_a_form_is_open() {
        let mut state = AdminState::new();
        state.workflow_mut().start_create().unwrap();
        assert_eq!(
            state.switch_tab(EntityKind::Events),
            Err(TransitionError::FormOpen)
        );
        state.workflow_mut().cancel();
        assert!(state.switch_tab(EntityKind::Events).is_ok());
        assert_eq!(state.tab(), EntityKind::Events);
    }

    #[test]
    fn delete_outcomes_update_banner() {
        let mut state = AdminState::new();
        state.begin_delete().unwrap();
        assert_eq!(state.begin_delete(), Err(TransitionError::Busy));

        let now = Instant::now();
        state.finish_delete(
            EntityKind::Birds,
            Err(StoreError::Rejected {
                status: 401,
                message: "permission denied".to_string(),
            }),
            now,
        );
        assert_eq!(
            state.banner().unwrap().message,
            "Deletion failed: permission denied (status 401)"
        );

        state.begin_delete().unwrap();
        state.finish_delete(EntityKind::Birds, Ok(()), now);
        assert_eq!(state.banner().unwrap().message, "Record successfully removed.");
        state.tick(now + DELETE_LINGER);
        assert!(state.banner().is_none());
    }
}
