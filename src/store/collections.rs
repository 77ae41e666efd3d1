// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use super::{InFlight, MovieStore};
use crate::enums::{Sort, View};
use crate::models::{Movie, MovieId, NewMovie, Page};
use crate::pagination::ViewState;
use crate::traits::ClientError;
use crate::transport::ApiRequest;

/// What a page fetch targets: the global feed or one user's feed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Feed {
    Global,
    User(String),
}

impl Feed {
    fn view(&self) -> View {
        match self {
            Feed::Global => View::Global,
            Feed::User(_) => View::User,
        }
    }

    fn request(&self, page: u32, size: u32, sort: Sort) -> ApiRequest {
        let path = match self {
            Feed::Global => vec!["movies".to_string()],
            Feed::User(username) => {
                vec!["movies".to_string(), "user".to_string(), username.clone()]
            }
        };
        ApiRequest::get(path)
            .query("page", page)
            .query("size", size)
            .query("sort", sort)
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Feed::Global => "Failed to fetch movies",
            Feed::User(_) => "Failed to fetch user movies",
        }
    }

    /// Feed a view was last loaded from; `None` for a never-loaded user view.
    fn of(view: View, state: &ViewState) -> Option<Feed> {
        match view {
            View::Global => Some(Feed::Global),
            View::User => state.username.clone().map(Feed::User),
        }
    }
}

impl MovieStore {
    /// Loads one page of the global feed into the global view.
    ///
    /// The collection and every pagination field are replaced from the
    /// response (the server's effective page size wins over `size`), then
    /// the viewer's votes for exactly the loaded ids are refreshed. Returns
    /// the raw page.
    pub async fn fetch_movies(
        &self,
        page: u32,
        size: u32,
        sort: Sort,
    ) -> Result<Page<Movie>, ClientError> {
        self.fetch_page(Feed::Global, page, size, sort).await
    }

    /// Loads one page of `username`'s submissions into the user view.
    pub async fn fetch_user_movies(
        &self,
        username: &str,
        page: u32,
        size: u32,
        sort: Sort,
    ) -> Result<Page<Movie>, ClientError> {
        self.fetch_page(Feed::User(username.to_string()), page, size, sort)
            .await
    }

    async fn fetch_page(
        &self,
        feed: Feed,
        page: u32,
        size: u32,
        sort: Sort,
    ) -> Result<Page<Movie>, ClientError> {
        if size == 0 {
            return Err(ClientError::InvalidInput("page size must be positive".to_string()));
        }

        let view = feed.view();
        let ticket = {
            let mut state = self.state();
            let target = state.view_mut(view);
            target.error = None;
            target.issue()
        };
        let _loading = InFlight::enter(&self.loading);
        tracing::debug!(%view, page, size, %sort, "fetching page");

        let result = self.api.call::<Page<Movie>>(feed.request(page, size, sort)).await;

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                let mut state = self.state();
                let target = state.view_mut(view);
                if target.is_current(ticket) {
                    target.error = Some(e.user_message(feed.failure_message()));
                }
                return Err(e);
            }
        };

        let ids = {
            let mut state = self.state();
            let target = state.view_mut(view);
            if !target.is_current(ticket) {
                tracing::debug!(%view, page, "discarding superseded page");
                return Ok(fetched);
            }
            target.apply_page(&fetched, sort);
            if let Feed::User(username) = &feed {
                target.username = Some(username.clone());
            }
            target.ids()
        };

        self.refresh_votes(&ids).await;
        Ok(fetched)
    }

    /// Fetches the next page of `view`. A no-op returning `Ok(None)` when the
    /// view is already on its last page.
    pub async fn next_page(&self, view: View) -> Result<Option<Page<Movie>>, ClientError> {
        self.navigate(view, ViewState::next_target).await
    }

    /// Fetches the previous page of `view`. A no-op returning `Ok(None)` when
    /// the view is already on its first page.
    pub async fn prev_page(&self, view: View) -> Result<Option<Page<Movie>>, ClientError> {
        self.navigate(view, ViewState::prev_target).await
    }

    /// Fetches page `page` of `view`. A no-op returning `Ok(None)` when the
    /// page lies outside `[0, total_pages)`.
    pub async fn go_to_page(
        &self,
        view: View,
        page: u32,
    ) -> Result<Option<Page<Movie>>, ClientError> {
        self.navigate(view, |state| state.goto_target(page)).await
    }

    async fn navigate<F>(&self, view: View, pick: F) -> Result<Option<Page<Movie>>, ClientError>
    where
        F: FnOnce(&ViewState) -> Option<u32>,
    {
        let plan = {
            let state = self.state();
            let current = state.view(view);
            pick(current).and_then(|page| {
                Feed::of(view, current).map(|feed| (feed, page, current.page_size, current.sort))
            })
        };

        match plan {
            Some((feed, page, size, sort)) => self.fetch_page(feed, page, size, sort).await.map(Some),
            None => {
                tracing::debug!(%view, "navigation target out of range, ignoring");
                Ok(None)
            }
        }
    }

    /// Sets the page size of both views and rewinds both to page 0.
    ///
    /// Both feeds share this setting even if only one is on screen; their
    /// old page boundaries no longer hold. Fetches still in flight are
    /// superseded.
    pub fn set_page_size(&self, size: u32) -> Result<(), ClientError> {
        if size == 0 {
            return Err(ClientError::InvalidInput("page size must be positive".to_string()));
        }
        let mut state = self.state();
        state.global.reset_page_size(size);
        state.user.reset_page_size(size);
        tracing::debug!(size, "page size changed");
        Ok(())
    }

    /// Sets the sort of both views and rewinds both to page 0.
    pub fn set_sort(&self, sort: Sort) {
        let mut state = self.state();
        state.global.reset_sort(sort);
        state.user.reset_sort(sort);
        tracing::debug!(%sort, "sort changed");
    }

    /// Fetches one movie into the current-movie slot and refreshes the
    /// viewer's vote on it.
    pub async fn fetch_movie(&self, id: MovieId) -> Result<Movie, ClientError> {
        let ticket = {
            let mut state = self.state();
            state.error = None;
            state.current_issued += 1;
            state.current_issued
        };
        let _loading = InFlight::enter(&self.loading);

        let request = ApiRequest::get(vec!["movies".to_string(), id.to_string()]);
        let movie = match self.api.call::<Movie>(request).await {
            Ok(movie) => movie,
            Err(e) => {
                let mut state = self.state();
                if state.current_issued == ticket {
                    state.error = Some(e.user_message("Failed to fetch movie"));
                }
                return Err(e);
            }
        };

        {
            let mut state = self.state();
            if state.current_issued != ticket {
                tracing::debug!(%id, "discarding superseded movie");
                return Ok(movie);
            }
            state.current_movie = Some(movie.clone());
        }

        self.refresh_votes(&[movie.id]).await;
        Ok(movie)
    }

    /// Submits a new movie and puts it at the head of the global view.
    ///
    /// The placement assumes newest-first order. Under any other sort the
    /// global view shows the movie out of order until its next fetch.
    pub async fn add_movie(&self, title: &str, description: &str) -> Result<Movie, ClientError> {
        self.state().error = None;
        let _loading = InFlight::enter(&self.loading);

        let body = serde_json::to_value(NewMovie {
            title: title.to_string(),
            description: description.to_string(),
        })?;
        let request = ApiRequest::post(["movies"]).json(body);

        match self.api.call::<Movie>(request).await {
            Ok(movie) => {
                let mut state = self.state();
                if !state.global.sort.is_newest_first() {
                    tracing::warn!(
                        sort = %state.global.sort,
                        "new movie placed first under a non newest-first sort"
                    );
                }
                state.global.prepend(movie.clone());
                tracing::info!(id = %movie.id, "movie added");
                Ok(movie)
            }
            Err(e) => {
                self.state().error = Some(e.user_message("Failed to add movie"));
                Err(e)
            }
        }
    }
}
