// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Wire types exchanged with the movie service.
//!
//! Field names follow the service's camelCase JSON. Aliases accept the
//! snake_case shape some deployments still emit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned movie identifier, stable across fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub i64);

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MovieId {
    fn from(value: i64) -> Self {
        MovieId(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Username of the submitter.
    pub username: String,
    #[serde(alias = "date_added")]
    pub date_added: NaiveDateTime,
    #[serde(alias = "likeCount", alias = "like_count")]
    pub likes: u64,
    #[serde(alias = "hateCount", alias = "hate_count")]
    pub hates: u64,
}

impl Movie {
    /// Overwrites every field with `fresh` while keeping this slot (and its
    /// allocations) in place.
    pub fn absorb(&mut self, fresh: &Movie) {
        self.id = fresh.id;
        self.title.clone_from(&fresh.title);
        self.description.clone_from(&fresh.description);
        self.username.clone_from(&fresh.username);
        self.date_added = fresh.date_added;
        self.likes = fresh.likes;
        self.hates = fresh.hates;
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// Zero-based page index echoed by the server.
    pub number: u32,
    pub total_pages: u32,
    pub total_elements: u64,
    /// Effective page size; may differ from the requested one.
    pub size: u32,
}

impl<T> Page<T> {
    /// Builds a page the way the service does: `total_pages` is the ceiling
    /// of `total_elements / size`.
    pub fn new(content: Vec<T>, number: u32, size: u32, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(u64::from(size)) as u32
        };
        Page {
            content,
            number,
            total_pages,
            total_elements,
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Error payload. The service reports `message`; older backends only
/// `error`, and framework defaults send both (`error` being the status
/// reason).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// `message` when it says something, otherwise `error`.
    pub fn into_message(self) -> Option<String> {
        let useful = |text: &String| !text.trim().is_empty();
        self.message.filter(useful).or_else(|| self.error.filter(useful))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "id": 7,
            "title": "Alien",
            "description": "In space no one can hear you scream.",
            "username": "ripley",
            "dateAdded": "2024-03-01T12:30:00",
            "likes": 3,
            "hates": 1
        })
    }

    #[test]
    fn test_movie_decodes_service_shape() {
        let movie: Movie = serde_json::from_value(sample()).unwrap();
        assert_eq!(movie.id, MovieId(7));
        assert_eq!(movie.username, "ripley");
        assert_eq!(movie.likes, 3);
        assert_eq!(movie.date_added.to_string(), "2024-03-01 12:30:00");
    }

    #[test]
    fn test_movie_accepts_snake_case_counters() {
        let movie: Movie = serde_json::from_value(json!({
            "id": 1,
            "title": "Heat",
            "username": "mann",
            "date_added": "2024-01-01T00:00:00",
            "like_count": 9,
            "hate_count": 2
        }))
        .unwrap();
        assert_eq!((movie.likes, movie.hates), (9, 2));
        assert_eq!(movie.description, None);
    }

    #[test]
    fn test_absorb_overwrites_every_field() {
        let mut slot: Movie = serde_json::from_value(sample()).unwrap();
        let mut fresh = slot.clone();
        fresh.likes = 4;
        fresh.title = "Aliens".to_string();
        slot.absorb(&fresh);
        assert_eq!(slot, fresh);
    }

    #[test]
    fn test_page_total_pages_is_ceiling() {
        let page: Page<u8> = Page::new(vec![], 0, 10, 25);
        assert_eq!(page.total_pages, 3);
        let empty: Page<u8> = Page::new(vec![], 0, 10, 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_error_body_reads_both_shapes() {
        let a: ErrorBody = serde_json::from_value(json!({"message": "nope"})).unwrap();
        let b: ErrorBody = serde_json::from_value(json!({"error": "nope"})).unwrap();
        assert_eq!(a.into_message().as_deref(), Some("nope"));
        assert_eq!(b.into_message().as_deref(), Some("nope"));
    }

    #[test]
    fn test_error_body_prefers_message_over_status_reason() {
        let body: ErrorBody = serde_json::from_value(json!({
            "timestamp": "2024-01-01T00:00:00.000+00:00",
            "status": 400,
            "error": "Bad Request",
            "message": "Username already taken",
            "path": "/api/v1/auth/register"
        }))
        .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Username already taken"));

        let blank: ErrorBody = serde_json::from_value(json!({"error": "Bad Request", "message": ""})).unwrap();
        assert_eq!(blank.into_message().as_deref(), Some("Bad Request"));
    }
}
