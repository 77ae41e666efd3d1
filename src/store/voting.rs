// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use super::{InFlight, MovieStore, PendingVote};
use crate::enums::VoteType;
use crate::models::{Movie, MovieId};
use crate::traits::ClientError;
use crate::transport::ApiRequest;
use crate::vote_cache::VoteCache;
use serde_json::json;

impl MovieStore {
    /// Merges the viewer's server-side votes on `ids` into the vote cache.
    ///
    /// Entries for other ids are untouched. Nothing is requested for an
    /// empty id list or a signed-out session. Failures are logged and
    /// swallowed: a missing vote highlight never fails the fetch that
    /// triggered the lookup.
    pub async fn refresh_votes(&self, ids: &[MovieId]) {
        if ids.is_empty() || !self.is_authenticated() {
            return;
        }
        let epoch = self.state().epoch;

        let request = ApiRequest::post(["votes", "user-votes"]).json(json!(ids));
        let fetched = match self.api.call::<VoteCache>(request).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(error = %e, count = ids.len(), "vote lookup failed, keeping cached votes");
                return;
            }
        };

        // The service may answer for ids it was not asked about.
        let batch: VoteCache = fetched
            .iter()
            .filter(|(id, _)| ids.contains(id))
            .collect();

        let mut state = self.state();
        if state.epoch != epoch {
            tracing::debug!("session changed during vote lookup, discarding");
            return;
        }
        state.votes.merge(&batch);
        tracing::debug!(merged = batch.len(), "vote cache refreshed");
    }

    /// Casts `vote` on `id` and reconciles the returned movie everywhere it
    /// is shown.
    ///
    /// Casting the same type the viewer already holds retracts it; the
    /// service decides and the returned counters say what happened. The
    /// cache keeps the submitted type either way, and a later lookup
    /// corrects it. On failure nothing but the error slot changes.
    pub async fn vote(&self, id: MovieId, vote: VoteType) -> Result<Movie, ClientError> {
        let pending = PendingVote::enter(&self.state, id);
        let _voting = InFlight::enter(&self.voting);
        tracing::debug!(%id, %vote, ticket = pending.ticket, "casting vote");

        let request = ApiRequest::post(vec!["movies".to_string(), id.to_string(), "vote".to_string()])
            .query("type", vote);

        let result = self.api.call::<Movie>(request).await;

        let mut state = self.state();
        let newest = pending.is_newest(&state);

        match result {
            Ok(movie) => {
                if !newest {
                    tracing::debug!(%id, "a newer vote already landed, discarding response");
                    return Ok(movie);
                }
                pending.mark_applied(&mut state);
                state.votes.insert(id, vote);
                let touched = state.global.reconcile(&movie)
                    + state.user.reconcile(&movie)
                    + state
                        .current_movie
                        .as_mut()
                        .filter(|held| held.id == movie.id)
                        .map(|held| {
                            held.absorb(&movie);
                            1
                        })
                        .unwrap_or(0);
                tracing::debug!(%id, likes = movie.likes, hates = movie.hates, touched, "vote applied");
                Ok(movie)
            }
            Err(e) => {
                tracing::warn!(%id, %vote, error = %e, "vote failed");
                if newest {
                    state.error = Some(e.user_message("Failed to vote"));
                }
                Err(e)
            }
        }
    }
}
