use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Local, NaiveDateTime};
use dashmap::DashMap;
use movierama_sync::models::{AuthResponse, LoginRequest, NewMovie, RegisterRequest};
use movierama_sync::{Movie, MovieId, Page, Sort, SortDirection, SortField, VoteCache, VoteType};
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use std::{
    cmp::Ordering,
    net::SocketAddr,
    sync::{
        atomic::{AtomicI64, Ordering as AtomicOrdering},
        Arc,
    },
};
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ============================================================================
// Constants & Config
// ============================================================================

const DEFAULT_PORT: u16 = 9000;
const DEFAULT_PAGE_SIZE: u32 = 10;
const SEED_USERS: [&str; 3] = ["ripley", "deckard", "sarah"];
const SEED_PASSWORD: &str = "password";

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Invalid or expired token")]
    UnknownToken,
    #[error("Invalid username or password")]
    BadCredentials,
    #[error("Username already exists")]
    UsernameTaken,
    #[error("You cannot vote for your own movie")]
    OwnMovie,
    #[error("Movie not found")]
    MovieNotFound,
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthenticated | ApiError::UnknownToken | ApiError::BadCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::UsernameTaken => StatusCode::CONFLICT,
            ApiError::OwnMovie => StatusCode::FORBIDDEN,
            ApiError::MovieNotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

// ============================================================================
// App State
// ============================================================================

struct Account {
    #[allow(dead_code)]
    email: String,
    password: String,
}

#[derive(Default)]
struct AppState {
    movies: DashMap<MovieId, Movie>,
    // (username, movie) -> vote
    votes: DashMap<(String, MovieId), VoteType>,
    accounts: DashMap<String, Account>,
    // token -> username
    sessions: DashMap<String, String>,
    next_id: AtomicI64,
}

impl AppState {
    fn seeded() -> Self {
        let state = Self::default();
        for username in SEED_USERS {
            state.accounts.insert(
                username.to_string(),
                Account {
                    email: format!("{}@example.com", username),
                    password: SEED_PASSWORD.to_string(),
                },
            );
        }

        let now = Local::now().naive_local();
        let titles = [
            ("Alien", "In space no one can hear you scream.", "ripley"),
            ("Aliens", "This time it's war.", "ripley"),
            ("Blade Runner", "Man has made his match.", "deckard"),
            ("The Terminator", "Your future is in his hands.", "sarah"),
            ("Heat", "A Los Angeles crime saga.", "deckard"),
            ("Arrival", "Why are they here?", "sarah"),
            ("Moon", "250,000 miles from home.", "ripley"),
            ("Sunshine", "If the sun dies, so do we.", "sarah"),
            ("Gattaca", "There is no gene for the human spirit.", "deckard"),
            ("Solaris", "How far will you go?", "ripley"),
            ("Dune", "Fear is the mind-killer.", "sarah"),
            ("Contact", "A message from deep space.", "deckard"),
        ];
        for (age, (title, description, username)) in titles.iter().enumerate() {
            state.insert_movie(
                title,
                Some(description.to_string()),
                username,
                now - Duration::hours(age as i64 * 7),
            );
        }
        state
    }

    fn insert_movie(
        &self,
        title: &str,
        description: Option<String>,
        username: &str,
        date_added: NaiveDateTime,
    ) -> Movie {
        let id = MovieId(self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1);
        let movie = Movie {
            id,
            title: title.to_string(),
            description,
            username: username.to_string(),
            date_added,
            likes: 0,
            hates: 0,
        };
        self.movies.insert(id, movie.clone());
        movie
    }

    /// Issues an unsigned three-segment token carrying `sub`.
    fn issue_token(&self, username: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(json!({ "alg": "none", "typ": "JWT" }).to_string());
        let claims = URL_SAFE_NO_PAD.encode(
            json!({ "sub": username, "iat": Local::now().timestamp() }).to_string(),
        );
        let nonce = URL_SAFE_NO_PAD.encode(rand::rng().random::<[u8; 16]>());
        let token = format!("{}.{}.{}", header, claims, nonce);
        self.sessions.insert(token.clone(), username.to_string());
        token
    }

    /// Username behind the bearer token, `None` when no token was sent.
    fn viewer(&self, headers: &HeaderMap) -> Result<Option<String>, ApiError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(None);
        };
        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::UnknownToken)?;
        self.sessions
            .get(token)
            .map(|username| Some(username.value().clone()))
            .ok_or(ApiError::UnknownToken)
    }

    fn require_viewer(&self, headers: &HeaderMap) -> Result<String, ApiError> {
        self.viewer(headers)?.ok_or(ApiError::Unauthenticated)
    }
}

// ============================================================================
// Main
// ============================================================================

/// Unset or blank means the default port; anything else must parse.
fn parse_port(raw: Option<&str>) -> Result<u16, std::io::Error> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid DEMO_SERVER_PORT value {value:?}: {e}"),
            )
        }),
        None => {
            tracing::info!("DEMO_SERVER_PORT not set, using default: {}", DEFAULT_PORT);
            Ok(DEFAULT_PORT)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demo_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = parse_port(std::env::var("DEMO_SERVER_PORT").ok().as_deref())?;

    let state = Arc::new(AppState::seeded());
    tracing::info!(
        "Seeded {} movies; sign in as any of {:?} with password {:?}",
        state.movies.len(),
        SEED_USERS,
        SEED_PASSWORD
    );

    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/user/:username", get(list_user_movies))
        .route("/movies/:id", get(get_movie))
        .route("/movies/:id/vote", post(vote))
        .route("/votes/user-votes", post(user_votes));

    let app = Router::new()
        .nest("/api/v1", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Movie API listening on http://{}/api/v1", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

// ============================================================================
// Auth
// ============================================================================

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let valid = state
        .accounts
        .get(&request.username)
        .is_some_and(|account| account.password == request.password);
    if !valid {
        tracing::info!("Rejected login for {}", request.username);
        return Err(ApiError::BadCredentials);
    }

    tracing::info!("{} signed in", request.username);
    Ok(Json(AuthResponse {
        token: state.issue_token(&request.username),
    }))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest("Username and password are required".to_string()));
    }

    match state.accounts.entry(request.username.clone()) {
        dashmap::mapref::entry::Entry::Occupied(_) => return Err(ApiError::UsernameTaken),
        dashmap::mapref::entry::Entry::Vacant(slot) => {
            slot.insert(Account {
                email: request.email,
                password: request.password,
            });
        }
    }

    tracing::info!("Registered {}", request.username);
    Ok(Json(AuthResponse {
        token: state.issue_token(&request.username),
    }))
}

// ============================================================================
// Movies
// ============================================================================

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<u32>,
    size: Option<u32>,
    sort: Option<String>,
}

impl PageParams {
    fn resolve(&self) -> Result<(u32, u32, Sort), ApiError> {
        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE);
        if size == 0 {
            return Err(ApiError::BadRequest("Page size must be positive".to_string()));
        }
        let sort = match &self.sort {
            Some(raw) => raw
                .parse::<Sort>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            None => Sort::default(),
        };
        Ok((self.page.unwrap_or(0), size, sort))
    }
}

fn compare(a: &Movie, b: &Movie, field: SortField) -> Ordering {
    let ordering = match field {
        SortField::DateAdded => a.date_added.cmp(&b.date_added),
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::LikeCount => a.likes.cmp(&b.likes),
        SortField::HateCount => a.hates.cmp(&b.hates),
        SortField::Username => a.username.cmp(&b.username),
    };
    ordering.then(a.id.cmp(&b.id))
}

fn paginate(mut movies: Vec<Movie>, params: &PageParams) -> Result<Page<Movie>, ApiError> {
    let (page, size, sort) = params.resolve()?;
    movies.sort_by(|a, b| {
        let ordering = compare(a, b, sort.field);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    let total = movies.len() as u64;
    let content = movies
        .into_iter()
        .skip(page as usize * size as usize)
        .take(size as usize)
        .collect();
    Ok(Page::new(content, page, size, total))
}

async fn list_movies(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Movie>>, ApiError> {
    state.viewer(&headers)?;
    let movies = state.movies.iter().map(|entry| entry.value().clone()).collect();
    Ok(Json(paginate(movies, &params)?))
}

async fn list_user_movies(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Movie>>, ApiError> {
    state.viewer(&headers)?;
    let movies = state
        .movies
        .iter()
        .filter(|entry| entry.value().username == username)
        .map(|entry| entry.value().clone())
        .collect();
    Ok(Json(paginate(movies, &params)?))
}

async fn get_movie(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Movie>, ApiError> {
    state.viewer(&headers)?;
    state
        .movies
        .get(&MovieId(id))
        .map(|movie| Json(movie.value().clone()))
        .ok_or(ApiError::MovieNotFound)
}

async fn create_movie(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<NewMovie>,
) -> Result<Json<Movie>, ApiError> {
    let username = state.require_viewer(&headers)?;
    if request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let description = Some(request.description).filter(|d| !d.trim().is_empty());
    let movie = state.insert_movie(
        request.title.trim(),
        description,
        &username,
        Local::now().naive_local(),
    );
    tracing::info!("{} added movie {} ({})", username, movie.id, movie.title);
    Ok(Json(movie))
}

// ============================================================================
// Votes
// ============================================================================

#[derive(Debug, Deserialize)]
struct VoteParams {
    #[serde(rename = "type")]
    vote_type: VoteType,
}

async fn vote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<VoteParams>,
) -> Result<Json<Movie>, ApiError> {
    let username = state.require_viewer(&headers)?;
    let id = MovieId(id);
    let mut movie = state.movies.get_mut(&id).ok_or(ApiError::MovieNotFound)?;
    if movie.username == username {
        return Err(ApiError::OwnMovie);
    }

    let key = (username.clone(), id);
    let previous = state.votes.get(&key).map(|vote| *vote.value());
    match previous {
        // Same vote again retracts it.
        Some(held) if held == params.vote_type => {
            state.votes.remove(&key);
            adjust(&mut movie, held, false);
        }
        Some(held) => {
            state.votes.insert(key, params.vote_type);
            adjust(&mut movie, held, false);
            adjust(&mut movie, params.vote_type, true);
        }
        None => {
            state.votes.insert(key, params.vote_type);
            adjust(&mut movie, params.vote_type, true);
        }
    }

    tracing::debug!(
        "{} voted {} on {}: {} likes, {} hates",
        username,
        params.vote_type,
        id,
        movie.likes,
        movie.hates
    );
    Ok(Json(movie.clone()))
}

fn adjust(movie: &mut Movie, vote: VoteType, add: bool) {
    let counter = match vote {
        VoteType::Like => &mut movie.likes,
        VoteType::Hate => &mut movie.hates,
    };
    *counter = if add {
        *counter + 1
    } else {
        counter.saturating_sub(1)
    };
}

async fn user_votes(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(ids): Json<Vec<MovieId>>,
) -> Result<Json<VoteCache>, ApiError> {
    let username = state.require_viewer(&headers)?;
    let votes = ids
        .into_iter()
        .filter_map(|id| {
            state
                .votes
                .get(&(username.clone(), id))
                .map(|vote| (id, *vote.value()))
        })
        .collect();
    Ok(Json(votes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_defaults_only_when_unset() {
        assert_eq!(parse_port(None).unwrap(), DEFAULT_PORT);
        assert_eq!(parse_port(Some("  ")).unwrap(), DEFAULT_PORT);
        assert_eq!(parse_port(Some(" 8080 ")).unwrap(), 8080);

        let err = parse_port(Some("eighty")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(parse_port(Some("70000")).is_err());
    }
}
