// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::VoteType;
use crate::models::MovieId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Vote Cache: the current viewer's vote per movie.
///
/// The cache only ever grows or overwrites. Entries disappear solely through
/// [`VoteCache::clear`], which the store calls on session transitions.
///
/// # Key Properties
///
/// - **Sorted Entries**: Stored as a `Vec` sorted by id, looked up by binary search.
/// - **Right-Biased Merge**: On a shared id, the incoming batch wins.
/// - **No Removal by Merge**: An id missing from a batch keeps its cached vote.
///
/// # Example
///
/// ```
/// use movierama_sync::{MovieId, VoteCache, VoteType};
///
/// let mut cache = VoteCache::new();
/// cache.insert(MovieId(1), VoteType::Like);
///
/// let batch: VoteCache = [(MovieId(2), VoteType::Hate)].into_iter().collect();
/// cache.merge(&batch);
///
/// assert_eq!(cache.get(MovieId(1)), Some(VoteType::Like));
/// assert_eq!(cache.get(MovieId(2)), Some(VoteType::Hate));
/// assert_eq!(cache.get(MovieId(3)), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteCache {
    entries: Vec<(MovieId, VoteType)>,
}

/// Serializes as the service's `{ "<id>": "LIKE" | "HATE" }` map.
impl Serialize for VoteCache {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, vote) in &self.entries {
            map.serialize_entry(id, vote)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VoteCache {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        HashMap::<MovieId, VoteType>::deserialize(deserializer).map(VoteCache::from)
    }
}

impl VoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the viewer's vote, or `None` when the viewer has not voted
    /// (or the vote has not been fetched yet).
    pub fn get(&self, id: MovieId) -> Option<VoteType> {
        self.entries
            .binary_search_by(|(k, _)| k.cmp(&id))
            .ok()
            .map(|idx| self.entries[idx].1)
    }

    /// Inserts or overwrites the vote for `id`.
    pub fn insert(&mut self, id: MovieId, vote: VoteType) {
        match self.entries.binary_search_by(|(k, _)| k.cmp(&id)) {
            Ok(idx) => self.entries[idx].1 = vote,
            Err(idx) => self.entries.insert(idx, (id, vote)),
        }
    }

    /// Merges a batch into this cache. Entries of `other` overwrite ours on
    /// shared ids; ids only we hold are retained.
    pub fn merge(&mut self, other: &Self) {
        if other.entries.is_empty() {
            return;
        }

        let mut result = Vec::with_capacity(self.entries.len() + other.entries.len());
        let mut i = 0;
        let mut j = 0;

        while i < self.entries.len() && j < other.entries.len() {
            let (k1, _) = &self.entries[i];
            let (k2, _) = &other.entries[j];

            match k1.cmp(k2) {
                Ordering::Less => {
                    result.push(self.entries[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    result.push(other.entries[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    result.push(other.entries[j]);
                    i += 1;
                    j += 1;
                }
            }
        }

        result.extend_from_slice(&self.entries[i..]);
        result.extend_from_slice(&other.entries[j..]);

        self.entries = result;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.get(id).is_some()
    }

    /// Iterates entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (MovieId, VoteType)> + '_ {
        self.entries.iter().copied()
    }
}

impl FromIterator<(MovieId, VoteType)> for VoteCache {
    /// Later duplicates win, matching [`VoteCache::insert`].
    fn from_iter<I: IntoIterator<Item = (MovieId, VoteType)>>(iter: I) -> Self {
        let mut cache = VoteCache::new();
        for (id, vote) in iter {
            cache.insert(id, vote);
        }
        cache
    }
}

impl From<HashMap<MovieId, VoteType>> for VoteCache {
    fn from(map: HashMap<MovieId, VoteType>) -> Self {
        let mut entries: Vec<_> = map.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        VoteCache { entries }
    }
}
