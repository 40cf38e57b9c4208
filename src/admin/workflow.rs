//! The admin form lifecycle: Viewing, Creating, Editing and Submitting.

use std::time::{Duration, Instant};

use log::debug;
use thiserror::Error;

use crate::models::RecordId;

/// How long a successful save keeps the form on screen before closing.
pub const SAVE_LINGER: Duration = Duration::from_millis(1500);

/// Which form a submission came from, so a failure can return to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    New,
    Existing(RecordId),
}

/// Identifies one submission. A completion carrying an older ticket belongs to
/// a form that was cancelled or replaced and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Viewing,
    Creating,
    Editing(RecordId),
    Submitting(Target, SubmitTicket),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Close the open form first.")]
    FormOpen,

    #[error("There is no form to submit.")]
    NoForm,

    #[error("A save is already in progress.")]
    Busy,
}

#[derive(Debug)]
pub struct Workflow {
    phase: Phase,
    issued: u64,
    closes_at: Option<Instant>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self {
            phase: Phase::Viewing,
            issued: 0,
            closes_at: None,
        }
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether a form (possibly locked for submission) is on screen.
    pub fn form_open(&self) -> bool {
        !matches!(self.phase, Phase::Viewing)
    }

    /// Form input is ignored while a submission is outstanding or lingering.
    pub fn is_locked(&self) -> bool {
        matches!(self.phase, Phase::Submitting(..))
    }

    pub fn start_create(&mut self) -> Result<(), TransitionError> {
        self.require_viewing()?;
        self.phase = Phase::Creating;
        Ok(())
    }

    pub fn start_edit(&mut self, id: RecordId) -> Result<(), TransitionError> {
        self.require_viewing()?;
        self.phase = Phase::Editing(id);
        Ok(())
    }

    fn require_viewing(&self) -> Result<(), TransitionError> {
        match self.phase {
            Phase::Viewing => Ok(()),
            Phase::Submitting(..) => Err(TransitionError::Busy),
            _ => Err(TransitionError::FormOpen),
        }
    }

    /// Lock the open form for a save. The caller validates the form first.
    pub fn submit(&mut self) -> Result<SubmitTicket, TransitionError> {
        let target = match &self.phase {
            Phase::Creating => Target::New,
            Phase::Editing(id) => Target::Existing(id.clone()),
            Phase::Submitting(..) => return Err(TransitionError::Busy),
            Phase::Viewing => return Err(TransitionError::NoForm),
        };
        self.issued += 1;
        let ticket = SubmitTicket(self.issued);
        self.phase = Phase::Submitting(target, ticket);
        Ok(ticket)
    }

    /// Apply the outcome of submission `ticket`. Success keeps the form locked
    /// until [`SAVE_LINGER`] has passed; failure unlocks the same form for a
    /// retry. Returns whether the ticket was still current.
    pub fn finish(&mut self, ticket: SubmitTicket, succeeded: bool, now: Instant) -> bool {
        let target = match &self.phase {
            Phase::Submitting(target, current) if *current == ticket => target.clone(),
            _ => {
                debug!("Ignoring completion of superseded submission");
                return false;
            }
        };

        if succeeded {
            self.closes_at = Some(now + SAVE_LINGER);
        } else {
            self.phase = match target {
                Target::New => Phase::Creating,
                Target::Existing(id) => Phase::Editing(id),
            };
        }
        true
    }

    /// Close a lingering form once its confirmation delay has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.closes_at.is_some_and(|deadline| now >= deadline) {
            self.close();
        }
    }

    /// Discard the open form from any phase.
    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.phase = Phase::Viewing;
        self.closes_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_submit_success_closes_after_linger() {
        let mut flow = Workflow::new();
        flow.start_create().unwrap();
        let ticket = flow.submit().unwrap();
        assert!(flow.is_locked());

        let now = Instant::now();
        assert!(flow.finish(ticket, true, now));
        flow.tick(now + Duration::from_millis(100));
        assert!(flow.is_locked());

        flow.tick(now + SAVE_LINGER);
        assert_eq!(flow.phase(), &Phase::Viewing);
    }

    #[test]
    fn failure_returns_to_the_same_form() {
        let mut flow = Workflow::new();
        let id = RecordId::new("7");
        flow.start_edit(id.clone()).unwrap();
        let ticket = flow.submit().unwrap();

        assert!(flow.finish(ticket, false, Instant::now()));
        assert_eq!(flow.phase(), &Phase::Editing(id));

        let retry = flow.submit().unwrap();
        assert_ne!(retry, ticket);
    }

    #[test]
    fn completion_after_cancel_is_ignored() {
        let mut flow = Workflow::new();
        flow.start_create().unwrap();
        let ticket = flow.submit().unwrap();
        flow.cancel();

        assert!(!flow.finish(ticket, false, Instant::now()));
        assert_eq!(flow.phase(), &Phase::Viewing);

        flow.start_create().unwrap();
        assert!(!flow.finish(ticket, true, Instant::now()));
        assert_eq!(flow.phase(), &Phase::Creating);
    }

    #[test]
    fn transitions_are_guarded() {
        let mut flow = Workflow::new();
        assert_eq!(flow.submit(), Err(TransitionError::NoForm));

        flow.start_create().unwrap();
        assert_eq!(
            flow.start_edit(RecordId::new("1")),
            Err(TransitionError::FormOpen)
        );

        flow.submit().unwrap();
        assert_eq!(flow.submit(), Err(TransitionError::Busy));
        assert_eq!(flow.start_create(), Err(TransitionError::Busy));
    }
}
