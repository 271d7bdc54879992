//! Writing the rendered page and serving it.
//!
//! The page is written once, before the server starts, and never touched
//! again while serving. The server is a plain static file server over the
//! configured root directory:
//!
//! - files are served as-is by `tower-http`'s `ServeDir`
//! - a directory request serves its `index.html`
//! - a directory without `index.html` gets a generated listing
//!
//! There is no routing, authentication or TLS. The server runs until the
//! process receives Ctrl-C.

use axum::Router;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use maud::{DOCTYPE, Markup, html};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] io::Error),
}

/// Characters escaped in a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Write `html` to `path` as UTF-8.
///
/// The content goes to a hidden sibling file first and is renamed into
/// place, so the page is either the old one or the complete new one.
pub fn write_page(path: &Path, html: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, html.as_bytes())?;
    fs::rename(&tmp_path, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })
}

/// Static file routes for `root`.
pub fn router(root: PathBuf) -> Router {
    let listing_root = root.clone();
    let listing = move |uri: Uri| {
        let root = listing_root.clone();
        async move { directory_listing(&root, uri.path()) }
    };

    let files = ServeDir::new(root)
        .append_index_html_on_directories(true)
        .fallback(listing.into_service());

    Router::new()
        .fallback_service(files)
        .layer(TraceLayer::new_for_http())
}

/// Serve `root` on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, root: PathBuf) -> Result<(), ServeError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    tracing::info!(%addr, root = %root.display(), "serving static files");

    axum::serve(listener, router(root))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// Directory listings
// ============================================================================

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Map a request path onto a directory under `root`.
///
/// Returns `None` for paths that are not valid UTF-8 after decoding or that
/// try to leave `root`.
pub fn resolve_request_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let mut resolved = root.to_path_buf();
    for segment in decoded.split('/') {
        if segment.contains('\\') {
            return None;
        }
        match Path::new(segment).components().next() {
            None | Some(Component::CurDir) => {}
            Some(Component::Normal(part)) if Path::new(segment).components().count() == 1 => {
                resolved.push(part);
            }
            _ => return None,
        }
    }
    Some(resolved)
}

fn directory_listing(root: &Path, request_path: &str) -> Response {
    let Some(dir) = resolve_request_path(root, request_path).filter(|p| p.is_dir()) else {
        return (StatusCode::NOT_FOUND, "404 Not Found").into_response();
    };
    match read_listing(&dir) {
        Ok(entries) => Html(render_listing(request_path, &entries).into_string()).into_response(),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), "cannot list directory: {e}");
            (StatusCode::NOT_FOUND, "404 Not Found").into_response()
        }
    }
}

/// Directory entries sorted by name, hidden files excluded.
pub fn read_listing(dir: &Path) -> io::Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        entries.push(ListingEntry {
            name,
            is_dir: entry.file_type()?.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Render a listing page for the directory at `request_path`.
pub fn render_listing(request_path: &str, entries: &[ListingEntry]) -> Markup {
    let display_path = percent_decode_str(request_path).decode_utf8_lossy();
    let title = format!("Directory listing for {display_path}");

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body {
                h1 { (title) }
                hr;
                ul {
                    @for entry in entries {
                        @let suffix = if entry.is_dir { "/" } else { "" };
                        li {
                            a href={ (utf8_percent_encode(&entry.name, PATH_SEGMENT)) (suffix) } {
                                (entry.name) (suffix)
                            }
                        }
                    }
                }
                hr;
            }
        }
    }
}
