pub mod cache;
pub mod ollama;
pub mod search;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use askama::Template;
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing::error;
use uuid::Uuid;

use wikiseek_core::page::Page;
use wikiseek_core::PAGE_DIR;

use crate::cache::ResultCache;
use crate::ollama::{sse_payload, OllamaClient};
use crate::search::{search, SearchPageData};

/// How long cached search results stay addressable by `/ai-summary`.
const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone)]
pub struct AppState {
    pub save_path: PathBuf,
    pub cache: ResultCache,
    pub ollama: Option<Arc<OllamaClient>>,
}

pub fn build_app(save_path: PathBuf, use_ollama: bool) -> Router {
    let state = AppState {
        save_path,
        cache: ResultCache::new(),
        ollama: use_ollama.then(|| Arc::new(OllamaClient::from_env())),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let pages = Router::new()
        .route("/*rel_path", get(handle_page))
        .fallback(|| async { (StatusCode::BAD_REQUEST, "No page provided") });

    let mut app = Router::new()
        .route("/search", get(handle_search))
        .nest("/page", pages)
        .route_service("/", ServeFile::new("./static/index.html"))
        .nest_service("/static", ServeDir::new("./static"));
    if use_ollama {
        app = app.route("/ai-summary", get(handle_ai_summary));
    }
    app.with_state(state).layer(cors)
}

#[derive(Template)]
#[template(path = "results.html")]
struct ResultsTemplate {
    data: SearchPageData,
}

/// Renders an askama template into an HTML response.
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                error!(%err, "failed to render template");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    if params.q.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "No query provided").into_response();
    }

    let save_path = state.save_path.clone();
    let q = params.q.clone();
    let searched = tokio::task::spawn_blocking(move || search(&save_path, &q))
        .await
        .map_err(anyhow::Error::from)
        .and_then(|r| r);

    let mut data = match searched {
        Ok(data) => data,
        Err(err) => {
            error!(query = %params.q, %err, "search failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to search").into_response();
        }
    };

    if state.ollama.is_some() {
        let key = Uuid::new_v4().to_string();
        data.use_ollama = true;
        data.cache_key = key.clone();
        state.cache.set(key, data.clone(), CACHE_TTL);
    }

    HtmlTemplate(ResultsTemplate { data }).into_response()
}

lazy_static! {
    static ref NEWLINE_RUNS: Regex = Regex::new(r"\n{3,}").expect("valid regex");
}

async fn handle_page(
    State(state): State<AppState>,
    UrlPath(rel_path): UrlPath<String>,
) -> Response {
    if rel_path.is_empty() {
        return (StatusCode::BAD_REQUEST, "No page provided").into_response();
    }
    if rel_path.split('/').any(|part| part == "..") {
        return (StatusCode::BAD_REQUEST, "Invalid page path").into_response();
    }

    let page_path = state.save_path.join(PAGE_DIR).join(&rel_path);
    let loaded = tokio::task::spawn_blocking(move || load_page_text(&page_path))
        .await
        .map_err(anyhow::Error::from)
        .and_then(|r| r);

    match loaded {
        Ok(text) => text.into_response(),
        Err(err) => {
            error!(%rel_path, %err, "failed to load page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load page").into_response()
        }
    }
}

/// Loads a stored page and renders its plain-text body, with runs of three or
/// more newlines collapsed to a blank line.
fn load_page_text(page_path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(page_path)?;
    let page = Page::from_xml(&raw)?;
    let (_, body) = page.render();
    Ok(NEWLINE_RUNS.replace_all(&body, "\n\n").into_owned())
}

#[derive(Deserialize)]
struct SummaryParams {
    #[serde(default)]
    cache_key: String,
}

async fn handle_ai_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> Response {
    let Some(client) = state.ollama.clone() else {
        return (StatusCode::NOT_FOUND, "Summaries disabled").into_response();
    };
    if params.cache_key.is_empty() {
        return (StatusCode::BAD_REQUEST, "No cache_key provided").into_response();
    }
    let Some(data) = state.cache.get(&params.cache_key) else {
        return (StatusCode::NOT_FOUND, "No data found").into_response();
    };

    let resp = match client.start_generate(&data.query).await {
        Ok(resp) => resp,
        Err(err) => {
            error!(%err, "failed to generate response");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate response")
                .into_response();
        }
    };

    let (tx, rx) = tokio::sync::mpsc::channel::<String>(16);
    tokio::spawn(async move {
        if let Err(err) = ollama::forward_chunks(resp, tx).await {
            error!(%err, "ollama stream failed");
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|chunk| Event::default().data(sse_payload(&chunk)))
        .map(Ok::<_, std::convert::Infallible>);
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}
