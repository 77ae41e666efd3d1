// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Paginated view state.
//!
//! A [`ViewState`] is one pagination cursor over the movie collection. Its
//! collection is replaced wholesale by every applied page; nothing is ever
//! appended across pages.
//!
//! Every fetch takes a [`Ticket`] from the view before it suspends. When the
//! response arrives it is only applied if its ticket is still the latest one
//! issued for that view, so overlapping fetches cannot leave the view
//! showing an older page than the one last requested.

use crate::enums::Sort;
use crate::models::{Movie, MovieId, Page};
use std::collections::HashSet;

/// Sequence number handed out per request and checked on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub items: Vec<Movie>,
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
    pub sort: Sort,
    /// Whose feed this is. Always `None` for the global view.
    pub username: Option<String>,
    pub error: Option<String>,
    issued: u64,
}

impl ViewState {
    pub fn new(page_size: u32, sort: Sort) -> Self {
        Self {
            items: Vec::new(),
            current_page: 0,
            page_size,
            total_pages: 0,
            total_elements: 0,
            sort,
            username: None,
            error: None,
            issued: 0,
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page + 1 < self.total_pages
    }

    pub fn has_prev_page(&self) -> bool {
        self.current_page > 0
    }

    /// Target page for `next_page`, `None` when already on the last page.
    pub fn next_target(&self) -> Option<u32> {
        self.has_next_page().then(|| self.current_page + 1)
    }

    /// Target page for `prev_page`, `None` when already on the first page.
    pub fn prev_target(&self) -> Option<u32> {
        self.has_prev_page().then(|| self.current_page - 1)
    }

    /// `page` if it lies in `[0, total_pages)`.
    pub fn goto_target(&self, page: u32) -> Option<u32> {
        (page < self.total_pages).then_some(page)
    }

    /// Registers a new request, superseding every ticket issued before it.
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Invalidates every outstanding ticket without issuing a request.
    pub fn supersede(&mut self) {
        self.issued += 1;
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Replaces collection and metadata with `page`.
    ///
    /// Keeps the first occurrence of any id the page repeats, never holds
    /// more than `page.size` movies, and clamps the echoed page number into
    /// `[0, total_pages)`. A page with no total leaves the view empty at
    /// page 0.
    pub fn apply_page(&mut self, page: &Page<Movie>, sort: Sort) {
        let mut seen = HashSet::with_capacity(page.content.len());
        self.items.clear();
        for movie in &page.content {
            if seen.insert(movie.id) {
                self.items.push(movie.clone());
            } else {
                tracing::warn!(id = %movie.id, "page repeats a movie id, keeping the first");
            }
        }

        if page.size > 0 && self.items.len() > page.size as usize {
            tracing::warn!(
                len = self.items.len(),
                size = page.size,
                "page holds more movies than its size, truncating"
            );
            self.items.truncate(page.size as usize);
        }

        self.total_pages = page.total_pages;
        self.total_elements = page.total_elements;
        self.page_size = page.size;
        self.sort = sort;

        if self.total_pages == 0 {
            self.items.clear();
            self.current_page = 0;
        } else if page.number >= self.total_pages {
            tracing::warn!(
                number = page.number,
                total_pages = self.total_pages,
                "server echoed a page beyond the last one"
            );
            self.current_page = self.total_pages - 1;
        } else {
            self.current_page = page.number;
        }
    }

    /// Ids currently held, in collection order.
    pub fn ids(&self) -> Vec<MovieId> {
        self.items.iter().map(|movie| movie.id).collect()
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.items.iter().any(|movie| movie.id == id)
    }

    /// Puts a freshly created movie at the head of the collection.
    pub fn prepend(&mut self, movie: Movie) {
        self.items.retain(|held| held.id != movie.id);
        self.items.insert(0, movie);
    }

    /// Writes `fresh` into every slot holding its id. Returns the number of
    /// slots touched; a view without the id is left alone.
    pub fn reconcile(&mut self, fresh: &Movie) -> usize {
        reconcile(&mut self.items, fresh)
    }

    /// Changes the page size for subsequent fetches and rewinds to page 0.
    pub fn reset_page_size(&mut self, page_size: u32) {
        self.page_size = page_size;
        self.current_page = 0;
        self.supersede();
    }

    /// Changes the sort for subsequent fetches and rewinds to page 0.
    pub fn reset_sort(&mut self, sort: Sort) {
        self.sort = sort;
        self.current_page = 0;
        self.supersede();
    }
}

/// In-place field merge of `fresh` into every slot of `items` with its id.
pub fn reconcile(items: &mut [Movie], fresh: &Movie) -> usize {
    let mut touched = 0;
    for slot in items.iter_mut().filter(|slot| slot.id == fresh.id) {
        slot.absorb(fresh);
        touched += 1;
    }
    touched
}
