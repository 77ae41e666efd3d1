// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::traits::ClientError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A viewer's vote on a movie. No vote is `Option::<VoteType>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteType {
    Like,
    Hate,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Like => "LIKE",
            VoteType::Hate => "HATE",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LIKE" => Ok(VoteType::Like),
            "HATE" => Ok(VoteType::Hate),
            _ => Err(ClientError::InvalidInput(format!("Unknown vote type: {}", s))),
        }
    }
}

/// The two independently paginated projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum View {
    /// Every movie, `GET /movies`.
    Global,
    /// One user's submissions, `GET /movies/user/{username}`.
    User,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Global => write!(f, "global"),
            View::User => write!(f, "user"),
        }
    }
}

/// Movie properties the service can sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    DateAdded,
    Title,
    LikeCount,
    HateCount,
    Username,
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortField::DateAdded => write!(f, "dateAdded"),
            SortField::Title => write!(f, "title"),
            SortField::LikeCount => write!(f, "likeCount"),
            SortField::HateCount => write!(f, "hateCount"),
            SortField::Username => write!(f, "username"),
        }
    }
}

impl FromStr for SortField {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('_', "").to_lowercase().as_str() {
            "dateadded" | "date" => Ok(SortField::DateAdded),
            "title" => Ok(SortField::Title),
            "likecount" | "likes" => Ok(SortField::LikeCount),
            "hatecount" | "hates" => Ok(SortField::HateCount),
            "username" | "user" => Ok(SortField::Username),
            _ => Err(ClientError::InvalidInput(format!("Unknown sort field: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ClientError::InvalidInput(format!("Unknown sort direction: {}", s))),
        }
    }
}

/// Sort key sent as the single `sort=field,direction` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// True for newest-first, the order new submissions are assumed to take.
    pub fn is_newest_first(&self) -> bool {
        *self == Sort::default()
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::new(SortField::DateAdded, SortDirection::Desc)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field, self.direction)
    }
}

impl FromStr for Sort {
    type Err = ClientError;

    /// Parses `field[,direction]`; a missing direction means descending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let field = match parts.next() {
            Some(field) if !field.is_empty() => field.parse()?,
            _ => return Err(ClientError::InvalidInput("Empty sort key".to_string())),
        };
        let direction = match parts.next() {
            Some(direction) => direction.parse()?,
            None => SortDirection::Desc,
        };
        if parts.next().is_some() {
            return Err(ClientError::InvalidInput(format!("Malformed sort key: {}", s)));
        }
        Ok(Sort { field, direction })
    }
}
