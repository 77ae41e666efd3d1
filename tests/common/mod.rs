// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use movierama_sync::*;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

enum Reply {
    Ready(ApiResponse),
    Gated(oneshot::Receiver<ApiResponse>),
    Unreachable,
}

/// Scripted transport: replies are queued per route (`"GET /movies"`) and
/// handed out in order. Unscripted routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, route: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn reply(&self, route: &str, status: u16, body: Value) {
        self.push(route, Reply::Ready(ApiResponse::new(status, body)));
    }

    pub fn ok(&self, route: &str, body: Value) {
        self.reply(route, 200, body);
    }

    /// Queues a reply that is held back until the returned sender fires.
    pub fn gate(&self, route: &str) -> oneshot::Sender<ApiResponse> {
        let (tx, rx) = oneshot::channel();
        self.push(route, Reply::Gated(rx));
        tx
    }

    pub fn unreachable(&self, route: &str) {
        self.push(route, Reply::Unreachable);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, route: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.route() == route)
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let route = request.route();
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&route)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Reply::Ready(response)) => Ok(response),
            Some(Reply::Gated(rx)) => rx
                .await
                .map_err(|_| ClientError::Transport("gate dropped".to_string())),
            Some(Reply::Unreachable) => Err(ClientError::Transport("connection refused".to_string())),
            None => Ok(ApiResponse::new(404, json!({ "message": format!("no route {}", route) }))),
        }
    }
}

/// Credential store that counts how often it was cleared.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryCredentialStore,
    pub clears: AtomicUsize,
}

impl CountingStore {
    pub fn with_credential(credential: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryCredentialStore::with_credential(credential),
            clears: AtomicUsize::new(0),
        })
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl CredentialStore for CountingStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        self.inner.load()
    }

    fn save(&self, credential: &str) -> Result<(), ClientError> {
        self.inner.save(credential)
    }

    fn clear(&self) -> Result<(), ClientError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear()
    }
}

pub fn token_for(sub: &str) -> String {
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
        URL_SAFE_NO_PAD.encode(json!({ "sub": sub }).to_string())
    )
}

pub fn movie_json(id: i64, likes: u64, hates: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Movie {}", id),
        "description": "A film.",
        "username": "poster",
        "dateAdded": "2024-05-01T10:00:00",
        "likes": likes,
        "hates": hates
    })
}

pub fn page_json(ids: &[i64], number: u32, size: u32, total_elements: u64) -> Value {
    let content: Vec<Value> = ids.iter().map(|&id| movie_json(id, 0, 0)).collect();
    let total_pages = if size == 0 {
        0
    } else {
        total_elements.div_ceil(u64::from(size))
    };
    json!({
        "content": content,
        "number": number,
        "size": size,
        "totalPages": total_pages,
        "totalElements": total_elements
    })
}

pub fn ids(movies: &[Movie]) -> Vec<i64> {
    movies.iter().map(|movie| movie.id.0).collect()
}

pub fn anonymous_store(transport: &Arc<MockTransport>) -> MovieStore {
    MovieStore::new(
        &ClientConfig::default(),
        transport.clone(),
        Arc::new(MemoryCredentialStore::new()),
    )
}

pub fn signed_in_store(transport: &Arc<MockTransport>, user: &str) -> MovieStore {
    MovieStore::new(
        &ClientConfig::default(),
        transport.clone(),
        Arc::new(MemoryCredentialStore::with_credential(token_for(user))),
    )
}
