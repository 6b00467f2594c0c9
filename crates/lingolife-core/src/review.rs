//! Review session engine.
//!
//! [`ReviewSession`] is the pure card-by-card state machine:
//!
//! ```text
//! Loading ──► Empty
//!    │
//!    └──────► Active ──(know on last card)──► Finished
//!              ▲  │
//!              └──┘ know / dont_know
//! ```
//!
//! [`ReviewEngine`] drives a session against a [`WordRepository`] and the
//! [`DailyReviewLog`]: it builds the queue at load time and pushes each
//! outcome to the repository on a background task whose failure is only
//! logged.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::error::StoreResult;
use crate::model::{UserId, Word};
use crate::review_log::DailyReviewLog;
use crate::traits::{KeyValueStore, WordRepository};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Loading,
    /// Nothing left to review today.
    Empty,
    Active,
    Finished,
}

/// Which side of the current card is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardFace {
    Front,
    /// Translation and definition revealed after "don't know".
    Back,
}

/// A self-reported recall result that should be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub word_id: String,
    pub known: bool,
}

/// Final numbers shown when a session finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub known: u32,
    pub unknown: u32,
    pub total: usize,
}

/// The review state machine. Holds no I/O.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    queue: Vec<Word>,
    position: usize,
    face: CardFace,
    known: u32,
    unknown: u32,
    state: SessionState,
}

impl ReviewSession {
    /// A session whose queue has not been fetched yet.
    pub fn loading() -> Self {
        Self {
            queue: Vec::new(),
            position: 0,
            face: CardFace::Front,
            known: 0,
            unknown: 0,
            state: SessionState::Loading,
        }
    }

    /// Build the queue: candidates minus ids already reviewed today, in
    /// candidate order. The queue is fixed for the life of the session.
    pub fn from_candidates(candidates: Vec<Word>, reviewed_today: &HashSet<String>) -> Self {
        let queue: Vec<Word> = candidates
            .into_iter()
            .filter(|w| !reviewed_today.contains(&w.id))
            .collect();
        let mut session = Self::loading();
        session.queue = queue;
        session.reset();
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn queue(&self) -> &[Word] {
        &self.queue
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn face(&self) -> CardFace {
        self.face
    }

    pub fn known_count(&self) -> u32 {
        self.known
    }

    pub fn unknown_count(&self) -> u32 {
        self.unknown
    }

    /// The card on screen while the session is active.
    pub fn current(&self) -> Option<&Word> {
        match self.state {
            SessionState::Active => self.queue.get(self.position),
            _ => None,
        }
    }

    /// `round(position / len * 100)`.
    ///
    /// Lags one card behind completion: the first card shows 0% and the last
    /// card shows `(len-1)/len`.
    pub fn progress_percent(&self) -> u32 {
        if self.queue.is_empty() {
            return 0;
        }
        (self.position as f64 / self.queue.len() as f64 * 100.0).round() as u32
    }

    /// Final tallies, once the session has finished.
    pub fn summary(&self) -> Option<SessionSummary> {
        (self.state == SessionState::Finished).then(|| SessionSummary {
            known: self.known,
            unknown: self.unknown,
            total: self.queue.len(),
        })
    }

    /// "Know": on a front-facing card, count it as known. On a card flipped
    /// by an earlier "don't know", move on without counting it again.
    /// Either way the session advances or finishes.
    pub fn know(&mut self) -> Option<Outcome> {
        let word_id = self.current()?.id.clone();
        let outcome = match self.face {
            CardFace::Front => {
                self.known += 1;
                Some(Outcome {
                    word_id,
                    known: true,
                })
            }
            CardFace::Back => None,
        };
        self.advance();
        outcome
    }

    /// "Don't know": count the card as unknown and flip it. The position
    /// does not move. Pressing it again on the flipped card does nothing.
    pub fn dont_know(&mut self) -> Option<Outcome> {
        if self.face == CardFace::Back {
            return None;
        }
        let word_id = self.current()?.id.clone();
        self.unknown += 1;
        self.face = CardFace::Back;
        Some(Outcome {
            word_id,
            known: false,
        })
    }

    /// Start over on the same queue. Nothing is re-fetched.
    pub fn restart(&mut self) {
        if self.state != SessionState::Loading {
            self.reset();
        }
    }

    fn advance(&mut self) {
        if self.position + 1 >= self.queue.len() {
            self.state = SessionState::Finished;
        } else {
            self.position += 1;
            self.face = CardFace::Front;
        }
    }

    fn reset(&mut self) {
        self.position = 0;
        self.face = CardFace::Front;
        self.known = 0;
        self.unknown = 0;
        self.state = if self.queue.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Active
        };
    }
}

/// Runs a [`ReviewSession`] for one user on one day.
pub struct ReviewEngine<K> {
    repo: Arc<dyn WordRepository>,
    log: DailyReviewLog<K>,
    user_id: UserId,
    today: NaiveDate,
    session: ReviewSession,
    pending: Vec<JoinHandle<()>>,
}

impl<K: KeyValueStore> ReviewEngine<K> {
    pub fn new(
        repo: Arc<dyn WordRepository>,
        log: DailyReviewLog<K>,
        user_id: UserId,
        today: NaiveDate,
    ) -> Self {
        Self {
            repo,
            log,
            user_id,
            today,
            session: ReviewSession::loading(),
            pending: Vec::new(),
        }
    }

    /// Fetch candidates and today's reviewed set, then build the queue.
    ///
    /// If the repository fails the session ends up `Empty` and the error is
    /// returned so the caller can show it.
    pub async fn load(&mut self) -> StoreResult<SessionState> {
        if let Err(e) = self.log.prune(self.today) {
            tracing::warn!(error = %e, "failed to prune review history");
        }

        let candidates = match self.repo.fetch_review_candidates(&self.user_id).await {
            Ok(words) => words,
            Err(e) => {
                self.session = ReviewSession::from_candidates(Vec::new(), &HashSet::new());
                return Err(e);
            }
        };

        let reviewed: HashSet<String> = match self.log.reviewed_on(self.today) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read reviewed-today set");
                HashSet::new()
            }
        };

        let fetched = candidates.len();
        self.session = ReviewSession::from_candidates(candidates, &reviewed);
        tracing::info!(
            user = %self.user_id,
            backend = self.repo.backend(),
            fetched,
            queued = self.session.queue_len(),
            "review session loaded"
        );
        Ok(self.session.state())
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    pub fn know(&mut self) -> Option<Outcome> {
        let outcome = self.session.know()?;
        self.commit(&outcome);
        Some(outcome)
    }

    pub fn dont_know(&mut self) -> Option<Outcome> {
        let outcome = self.session.dont_know()?;
        self.commit(&outcome);
        Some(outcome)
    }

    pub fn restart(&mut self) {
        self.session.restart();
    }

    /// Number of outcome writes that have not completed yet.
    pub fn pending_writes(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every outstanding outcome write.
    pub async fn flush(&mut self) {
        let handles = std::mem::take(&mut self.pending);
        for result in join_all(handles).await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "outcome write task panicked");
                }
            }
        }
    }

    /// Abort outcome writes that are still in flight.
    pub fn cancel_pending(&mut self) {
        for handle in self.pending.drain(..) {
            handle.abort();
        }
    }

    fn commit(&mut self, outcome: &Outcome) {
        if let Err(e) = self.log.mark_reviewed(self.today, &outcome.word_id) {
            tracing::warn!(word_id = %outcome.word_id, error = %e, "failed to mark word reviewed");
        }
        if let Err(e) = self.log.record_tally(self.today, outcome.known) {
            tracing::warn!(error = %e, "failed to update daily tally");
        }

        let repo = Arc::clone(&self.repo);
        let user_id = self.user_id.clone();
        let Outcome { word_id, known } = outcome.clone();
        let handle = tokio::spawn(async move {
            match repo.record_outcome(&user_id, &word_id, known).await {
                Ok(word) => tracing::debug!(
                    word_id = %word.id,
                    known_count = word.known_count,
                    unknown_count = word.unknown_count,
                    "review outcome saved"
                ),
                Err(e) => tracing::warn!(%word_id, known, error = %e, "failed to save review outcome"),
            }
        });

        self.pending.retain(|h| !h.is_finished());
        self.pending.push(handle);
    }
}
