// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! The movie store: one explicit context object holding both paginated
//! views, the current single movie, the vote cache and the session.
//!
//! # Concurrency
//!
//! Every action takes `&self` and may be polled concurrently with others
//! (e.g. under `tokio::join!`). State lives behind one mutex that is only
//! held between suspension points, never across a request. Overlapping
//! requests are ordered with tickets:
//!
//! - a page fetch only lands if it is the latest issued for its view,
//! - a single-movie fetch only lands if it is the latest issued,
//! - a vote only lands if no later vote on its movie id has landed,
//! - a vote lookup or vote started before a session transition never lands.
//!
//! A superseded response is still returned to its caller; it just leaves
//! the shared state alone.

mod auth;
mod collections;
mod voting;

use crate::config::ClientConfig;
use crate::enums::{View, VoteType};
use crate::interceptor::Api;
use crate::models::{Movie, MovieId};
use crate::pagination::ViewState;
use crate::session::{FileCredentialStore, MemoryCredentialStore, Session};
use crate::traits::{ClientError, CredentialStore, Transport};
use crate::transport::HttpTransport;
use crate::vote_cache::VoteCache;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct StoreState {
    global: ViewState,
    user: ViewState,
    current_movie: Option<Movie>,
    current_issued: u64,
    votes: VoteCache,
    /// Votes in flight per movie id. An entry lives exactly as long as at
    /// least one [`PendingVote`] for that id.
    vote_tickets: HashMap<MovieId, VoteSlot>,
    vote_issued: u64,
    /// Bumped on every session transition.
    epoch: u64,
    error: Option<String>,
    auth_error: Option<String>,
}

impl StoreState {
    fn view(&self, view: View) -> &ViewState {
        match view {
            View::Global => &self.global,
            View::User => &self.user,
        }
    }

    fn view_mut(&mut self, view: View) -> &mut ViewState {
        match view {
            View::Global => &mut self.global,
            View::User => &mut self.user,
        }
    }

    /// Drops everything tied to the previous viewer.
    fn reset_viewer(&mut self) {
        self.votes.clear();
        self.vote_tickets.clear();
        self.epoch += 1;
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct VoteSlot {
    pending: usize,
    /// Ticket of the newest vote response applied so far; 0 before any.
    applied: u64,
}

/// One vote on one movie id, registered in `vote_tickets` for as long as
/// the guard lives. Dropping the guard (including a dropped vote future)
/// releases the slot.
struct PendingVote<'a> {
    state: &'a Mutex<StoreState>,
    id: MovieId,
    ticket: u64,
    epoch: u64,
}

impl<'a> PendingVote<'a> {
    fn enter(state: &'a Mutex<StoreState>, id: MovieId) -> Self {
        let mut held = state.lock().unwrap_or_else(PoisonError::into_inner);
        held.error = None;
        held.vote_issued += 1;
        let ticket = held.vote_issued;
        held.vote_tickets.entry(id).or_default().pending += 1;
        let epoch = held.epoch;
        drop(held);
        Self { state, id, ticket, epoch }
    }

    /// Whether this vote may still write to `state`: same session, and no
    /// newer vote on the id has been applied yet.
    fn is_newest(&self, state: &StoreState) -> bool {
        state.epoch == self.epoch
            && state
                .vote_tickets
                .get(&self.id)
                .is_some_and(|slot| self.ticket > slot.applied)
    }

    fn mark_applied(&self, state: &mut StoreState) {
        if let Some(slot) = state.vote_tickets.get_mut(&self.id) {
            slot.applied = self.ticket;
        }
    }
}

impl Drop for PendingVote<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // A session transition already emptied the map.
        if state.epoch != self.epoch {
            return;
        }
        if let Entry::Occupied(mut slot) = state.vote_tickets.entry(self.id) {
            let pending = &mut slot.get_mut().pending;
            *pending = pending.saturating_sub(1);
            if *pending == 0 {
                slot.remove();
            }
        }
    }
}

/// Counts an in-flight action for as long as the guard lives.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MovieStore {
    api: Api,
    state: Mutex<StoreState>,
    loading: AtomicUsize,
    voting: AtomicUsize,
}

impl MovieStore {
    /// Builds a store over `transport`, restoring the session from
    /// `credentials`. Both views start empty with the configured page size
    /// and sort.
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let session = Arc::new(Session::restore(credentials));
        Self {
            api: Api::new(transport, session),
            state: Mutex::new(StoreState {
                global: ViewState::new(config.page_size, config.sort),
                user: ViewState::new(config.page_size, config.sort),
                current_movie: None,
                current_issued: 0,
                votes: VoteCache::new(),
                vote_tickets: HashMap::new(),
                vote_issued: 0,
                epoch: 0,
                error: None,
                auth_error: None,
            }),
            loading: AtomicUsize::new(0),
            voting: AtomicUsize::new(0),
        }
    }

    /// Builds a store talking HTTP to `config.base_url`, persisting the
    /// credential to `config.credential_path` when one is set.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(HttpTransport::new(config)?);
        let credentials: Arc<dyn CredentialStore> = match &config.credential_path {
            Some(path) => Arc::new(FileCredentialStore::new(path)),
            None => Arc::new(MemoryCredentialStore::new()),
        };
        Ok(Self::new(config, transport, credentials))
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session(&self) -> &Arc<Session> {
        self.api.session()
    }

    /// Display identity of the viewer. Never use it for access decisions.
    pub fn current_identity(&self) -> Option<String> {
        self.session().current_identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    /// The global feed's current page.
    pub fn movies(&self) -> Vec<Movie> {
        self.state().global.items.clone()
    }

    /// The user feed's current page.
    pub fn user_movies(&self) -> Vec<Movie> {
        self.state().user.items.clone()
    }

    pub fn current_movie(&self) -> Option<Movie> {
        self.state().current_movie.clone()
    }

    /// Snapshot of one view's collection and pagination metadata.
    pub fn view(&self, view: View) -> ViewState {
        self.state().view(view).clone()
    }

    pub fn has_next_page(&self, view: View) -> bool {
        self.state().view(view).has_next_page()
    }

    pub fn has_prev_page(&self, view: View) -> bool {
        self.state().view(view).has_prev_page()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub fn is_voting(&self) -> bool {
        self.voting.load(Ordering::SeqCst) > 0
    }

    /// Error slot shared by single-movie fetches, submissions and votes.
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Error slot of one view's page fetches.
    pub fn view_error(&self, view: View) -> Option<String> {
        self.state().view(view).error.clone()
    }

    /// Error slot of login and registration.
    pub fn auth_error(&self) -> Option<String> {
        self.state().auth_error.clone()
    }

    pub fn clear_error(&self) {
        let mut state = self.state();
        state.error = None;
        state.auth_error = None;
        state.global.error = None;
        state.user.error = None;
    }

    /// The viewer's cached vote on `id`; `None` means no vote.
    pub fn get_vote(&self, id: MovieId) -> Option<VoteType> {
        self.state().votes.get(id)
    }

    /// Snapshot of the whole vote cache.
    pub fn votes(&self) -> VoteCache {
        self.state().votes.clone()
    }

    /// Empties the vote cache on demand.
    pub fn clear_votes(&self) {
        let mut state = self.state();
        state.votes.clear();
    }
}
