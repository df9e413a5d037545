//! The "current record" slot shared by concurrent submissions.
//!
//! Every submission bumps a monotonically increasing counter. An aggregation result
//! is applied only if its submission is still the latest one when it completes, so
//! a slow lookup for an earlier subject can never overwrite a newer one.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::app::pipeline::Aggregator;
use crate::data::JsonSource;
use crate::domain::{MergedRecord, normalize_subject};
use crate::error::FetchError;

/// Ticket handed out by `Session::submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    id: u64,
    subject: String,
}

impl Submission {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// What the front-end should currently show.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewState {
    #[default]
    Idle,
    Loading {
        subject: String,
    },
    Ready(Arc<MergedRecord>),
    Failed {
        subject: String,
        message: String,
    },
}

/// Whether a completed aggregation made it into the slot.
///
/// `Current` carries the view exactly as stored, so callers can display it
/// without re-reading a slot that a newer submission may already have reset.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Current(ViewState),
    Stale,
}

#[derive(Debug, Default)]
struct SessionState {
    latest: u64,
    view: ViewState,
}

#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subject. Blank input is ignored and returns `None`.
    ///
    /// The previous record is dropped: the view switches to `Loading`.
    pub async fn submit(&self, raw: &str) -> Option<Submission> {
        let subject = normalize_subject(raw)?;

        let mut state = self.state.write().await;
        state.latest += 1;
        state.view = ViewState::Loading {
            subject: subject.to_string(),
        };
        debug!(id = state.latest, subject, "submitted");

        Some(Submission {
            id: state.latest,
            subject: subject.to_string(),
        })
    }

    /// Store the outcome of `submission` unless a newer submission exists.
    pub async fn apply(&self, submission: &Submission, result: Result<MergedRecord, FetchError>) -> Applied {
        let mut state = self.state.write().await;
        if submission.id != state.latest {
            debug!(
                id = submission.id,
                latest = state.latest,
                subject = submission.subject.as_str(),
                "discarding stale result"
            );
            return Applied::Stale;
        }

        state.view = match result {
            Ok(record) => ViewState::Ready(Arc::new(record)),
            Err(err) => ViewState::Failed {
                subject: submission.subject.clone(),
                message: err.to_string(),
            },
        };
        Applied::Current(state.view.clone())
    }

    /// Submit, aggregate, and apply in one go.
    pub async fn run<S: JsonSource>(&self, aggregator: &Aggregator<S>, raw: &str) -> Option<(Submission, Applied)> {
        let submission = self.submit(raw).await?;
        let result = aggregator.aggregate(submission.subject()).await;
        let applied = self.apply(&submission, result).await;
        Some((submission, applied))
    }

    pub async fn view(&self) -> ViewState {
        self.state.read().await.view.clone()
    }

    pub async fn current_record(&self) -> Option<Arc<MergedRecord>> {
        match &self.state.read().await.view {
            ViewState::Ready(record) => Some(Arc::clone(record)),
            _ => None,
        }
    }
}
