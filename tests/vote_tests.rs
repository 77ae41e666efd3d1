// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

mod common;

use common::*;
use movierama_sync::*;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_fetch_refreshes_votes_for_loaded_ids() {
    let transport = MockTransport::new();
    transport.ok("GET /movies", page_json(&[1, 2, 3], 0, 10, 3));
    transport.ok("POST /votes/user-votes", json!({"1": "LIKE", "3": "HATE"}));
    let store = signed_in_store(&transport, "ann");

    store.fetch_movies(0, 10, Sort::default()).await.unwrap();

    let lookups = transport.requests_to("POST /votes/user-votes");
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].body, Some(json!([1, 2, 3])));
    assert_eq!(store.get_vote(MovieId(1)), Some(VoteType::Like));
    assert_eq!(store.get_vote(MovieId(2)), None);
    assert_eq!(store.get_vote(MovieId(3)), Some(VoteType::Hate));
}

#[tokio::test]
async fn test_refresh_merges_without_evicting() {
    let transport = MockTransport::new();
    transport.ok("POST /movies/1/vote", movie_json(1, 1, 0));
    transport.ok("POST /votes/user-votes", json!({"2": "HATE", "7": "LIKE"}));
    let store = signed_in_store(&transport, "ann");

    store.vote(MovieId(1), VoteType::Like).await.unwrap();
    store.refresh_votes(&[MovieId(2), MovieId(3)]).await;

    assert_eq!(store.get_vote(MovieId(1)), Some(VoteType::Like));
    assert_eq!(store.get_vote(MovieId(2)), Some(VoteType::Hate));
    assert_eq!(store.get_vote(MovieId(3)), None);
    // Not asked for, so not cached.
    assert_eq!(store.get_vote(MovieId(7)), None);
    assert_eq!(store.votes().len(), 2);
}

#[tokio::test]
async fn test_refresh_failure_is_swallowed() {
    let transport = MockTransport::new();
    transport.ok("GET /movies", page_json(&[1, 2], 0, 10, 2));
    transport.reply("POST /votes/user-votes", 500, json!({"message": "down"}));
    let store = signed_in_store(&transport, "ann");

    store.fetch_movies(0, 10, Sort::default()).await.unwrap();
    assert_eq!(ids(&store.movies()), vec![1, 2]);
    assert_eq!(store.view_error(View::Global), None);
    assert_eq!(store.error(), None);
    assert!(store.votes().is_empty());

    store.refresh_votes(&[]).await;
    assert_eq!(transport.requests_to("POST /votes/user-votes").len(), 1);
}

#[tokio::test]
async fn test_vote_reconciles_both_views() {
    let transport = MockTransport::new();
    transport.ok("GET /movies", page_json(&[1, 2, 3], 0, 10, 3));
    transport.ok("GET /movies/user/poster", page_json(&[2, 5], 0, 10, 2));
    transport.ok("POST /movies/2/vote", movie_json(2, 10, 1));
    let store = signed_in_store(&transport, "ann");

    store.fetch_movies(0, 10, Sort::default()).await.unwrap();
    store.fetch_user_movies("poster", 0, 10, Sort::default()).await.unwrap();

    let movie = store.vote(MovieId(2), VoteType::Like).await.unwrap();
    assert_eq!((movie.likes, movie.hates), (10, 1));

    let global = store.movies();
    let user = store.user_movies();
    assert_eq!(ids(&global), vec![1, 2, 3]);
    assert_eq!(ids(&user), vec![2, 5]);
    assert_eq!(global[1].likes, 10);
    assert_eq!(user[0].likes, 10);
    assert_eq!(global[0].likes, 0);
    assert_eq!(store.get_vote(MovieId(2)), Some(VoteType::Like));
    assert!(!store.is_voting());

    let sent = transport.requests_to("POST /movies/2/vote");
    assert_eq!(sent[0].query_value("type"), Some("LIKE"));
}

#[tokio::test]
async fn test_vote_on_unlisted_movie_only_touches_cache() {
    let transport = MockTransport::new();
    transport.ok("GET /movies", page_json(&[1, 2], 0, 10, 2));
    transport.ok("POST /movies/40/vote", movie_json(40, 0, 3));
    let store = signed_in_store(&transport, "ann");

    store.fetch_movies(0, 10, Sort::default()).await.unwrap();
    let before = store.movies();

    store.vote(MovieId(40), VoteType::Hate).await.unwrap();
    assert_eq!(store.movies(), before);
    assert!(store.user_movies().is_empty());
    assert_eq!(store.get_vote(MovieId(40)), Some(VoteType::Hate));
}

#[tokio::test]
async fn test_vote_updates_current_movie() {
    let transport = MockTransport::new();
    transport.ok("GET /movies/8", movie_json(8, 0, 0));
    transport.ok("POST /votes/user-votes", json!({}));
    transport.ok("POST /movies/8/vote", movie_json(8, 0, 1));
    let store = signed_in_store(&transport, "ann");

    store.fetch_movie(MovieId(8)).await.unwrap();
    let lookups = transport.requests_to("POST /votes/user-votes");
    assert_eq!(lookups[0].body, Some(json!([8])));

    store.vote(MovieId(8), VoteType::Hate).await.unwrap();
    assert_eq!(store.current_movie().map(|m| m.hates), Some(1));
}

#[tokio::test]
async fn test_repeated_vote_takes_server_counters() {
    let transport = MockTransport::new();
    transport.ok("GET /movies", page_json(&[3], 0, 10, 1));
    transport.ok("POST /movies/3/vote", movie_json(3, 1, 0));
    // Same type again: the service retracts and reports zero likes.
    transport.ok("POST /movies/3/vote", movie_json(3, 0, 0));
    let store = signed_in_store(&transport, "ann");

    store.fetch_movies(0, 10, Sort::default()).await.unwrap();
    store.vote(MovieId(3), VoteType::Like).await.unwrap();
    assert_eq!(store.movies()[0].likes, 1);

    store.vote(MovieId(3), VoteType::Like).await.unwrap();
    assert_eq!(store.movies()[0].likes, 0);
    assert_eq!(store.get_vote(MovieId(3)), Some(VoteType::Like));
}

#[tokio::test]
async fn test_unauthorized_vote_forces_single_logout() {
    let transport = MockTransport::new();
    transport.ok("GET /movies", page_json(&[1, 2], 0, 10, 2));
    transport.ok("POST /votes/user-votes", json!({"1": "LIKE"}));
    transport.reply("POST /movies/1/vote", 401, serde_json::Value::Null);
    let credentials = CountingStore::with_credential(token_for("ann"));
    let store = MovieStore::new(&ClientConfig::default(), transport.clone(), credentials.clone());

    store.fetch_movies(0, 10, Sort::default()).await.unwrap();
    let cached = store.votes();
    let movies = store.movies();

    let err = store.vote(MovieId(1), VoteType::Hate).await.unwrap_err();
    assert!(err.is_authorization());
    assert_eq!(credentials.clear_count(), 1);
    assert!(!store.is_authenticated());
    assert_eq!(store.current_identity(), None);
    assert_eq!(store.votes(), cached);
    assert_eq!(store.movies(), movies);
    assert_eq!(store.error().as_deref(), Some("Failed to vote"));
    assert!(!store.is_voting());
}

#[tokio::test]
async fn test_failed_vote_keeps_session() {
    let transport = MockTransport::new();
    transport.reply("POST /movies/2/vote", 403, json!({"message": "You cannot vote for your own movie"}));
    let credentials = CountingStore::with_credential(token_for("ann"));
    let store = MovieStore::new(
        &ClientConfig::default(),
        transport.clone(),
        credentials.clone() as Arc<dyn CredentialStore>,
    );

    let err = store.vote(MovieId(2), VoteType::Like).await.unwrap_err();
    assert!(matches!(err, ClientError::Server { status: 403, .. }));
    assert_eq!(store.error().as_deref(), Some("You cannot vote for your own movie"));
    assert!(store.is_authenticated());
    assert_eq!(credentials.clear_count(), 0);
    assert_eq!(store.get_vote(MovieId(2)), None);
}

#[tokio::test]
async fn test_clear_votes_empties_cache() {
    let transport = MockTransport::new();
    transport.ok("POST /movies/1/vote", movie_json(1, 1, 0));
    let store = signed_in_store(&transport, "ann");

    store.vote(MovieId(1), VoteType::Like).await.unwrap();
    assert!(!store.votes().is_empty());
    store.clear_votes();
    assert!(store.votes().is_empty());
    assert!(store.is_authenticated());
}
