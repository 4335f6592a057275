//! Request dispatch and the HTTP front end
//!
//! [`Navigator::handle`] maps a request path to a [`Reply`] and has no
//! knowledge of the transport; [`serve`] runs it behind `tiny_http` on a
//! pool of worker threads.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::normalize::{is_web_url, normalize_url, url_param};
use crate::rendering::{self, HtmlRenderer};
use crate::{assemble, Error, NavigatorConfig, Renderer, Result, Stylesheet};

/// Response produced by [`Navigator::handle`]
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn html(body: Vec<u8>) -> Self {
        Self { status: 200, content_type: "text/html; charset=UTF-8", body }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            content_type: "text/html; charset=UTF-8",
            body: b"<h1>Not Found</h1>".to_vec(),
        }
    }

    fn server_error() -> Self {
        Self {
            status: 500,
            content_type: "text/html; charset=UTF-8",
            body: b"<h1>Internal Server Error</h1>".to_vec(),
        }
    }
}

/// Routes requests to the renderer
///
/// The print stylesheet is built once here and handed to both the page
/// and the PDF rendering paths.
pub struct Navigator<R = HtmlRenderer> {
    renderer: R,
    stylesheet: Stylesheet,
    favicon: Vec<u8>,
}

impl Navigator<HtmlRenderer> {
    /// Navigator backed by the built-in renderer.
    pub fn from_config(config: &NavigatorConfig) -> Result<Self> {
        config.validate()?;
        Self::new(HtmlRenderer::new(config)?)
    }
}

impl<R: Renderer> Navigator<R> {
    pub fn new(renderer: R) -> Result<Self> {
        Ok(Self {
            renderer,
            stylesheet: Stylesheet::print(),
            favicon: rendering::raster::favicon()?,
        })
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    /// Handle a request for `path` with an optional raw query string.
    ///
    /// Errors and panics while rendering both become a generic 500 reply.
    pub fn handle(&self, path: &str, query: Option<&str>) -> Reply {
        match catch_unwind(AssertUnwindSafe(|| self.dispatch(path, query))) {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                log::error!("{} failed: {}", path, e);
                Reply::server_error()
            }
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                log::error!("{} panicked: {}", path, msg);
                Reply::server_error()
            }
        }
    }

    fn dispatch(&self, path: &str, query: Option<&str>) -> Result<Reply> {
        let stylesheets = std::slice::from_ref(&self.stylesheet);

        if path == "/favicon.ico" {
            return Ok(Reply { status: 200, content_type: "image/x-icon", body: self.favicon.clone() });
        }

        if let Some(rest) = path.strip_prefix("/pdf/").filter(|r| !r.is_empty()) {
            let url = normalize_url(rest, query).ok_or_else(|| Error::LoadError("empty URL".into()))?;
            check_web_url(&url)?;
            log::info!("PDF export of {}", url);
            let body = self.renderer.write_pdf(&url, stylesheets)?;
            return Ok(Reply { status: 200, content_type: "application/pdf", body });
        }

        if let Some(rest) = path.strip_prefix("/view/") {
            let url = normalize_url(rest, query);
            return self.page(url.as_deref());
        }

        if path == "/" {
            let raw = query.and_then(url_param).unwrap_or_default();
            let url = normalize_url(&raw, None);
            return self.page(url.as_deref());
        }

        Ok(Reply::not_found())
    }

    fn page(&self, url: Option<&str>) -> Result<Reply> {
        if let Some(url) = url {
            check_web_url(url)?;
            log::info!("Rendering {}", url);
        }
        let body = assemble::render_template(&self.renderer, url, std::slice::from_ref(&self.stylesheet))?;
        Ok(Reply::html(body))
    }
}

/// Clients may only have `http(s)` documents rendered; local files stay
/// reachable from the command line alone.
fn check_web_url(url: &str) -> Result<()> {
    if is_web_url(url) {
        Ok(())
    } else {
        Err(Error::LoadError(format!("Refusing to fetch {} for a client", url)))
    }
}

/// Split a request target into its path and query string.
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

fn respond<R: Renderer>(navigator: &Navigator<R>, request: tiny_http::Request) {
    let target = request.url().to_string();
    let (path, query) = split_target(&target);
    let reply = navigator.handle(path, query);
    log::debug!("{} {} -> {}", request.method(), target, reply.status);

    let mut response = tiny_http::Response::from_data(reply.body).with_status_code(reply.status);
    if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        log::warn!("Failed to send response for {}: {}", target, e);
    }
}

/// Serve `navigator` on the configured address until the listener fails.
pub fn serve<R>(navigator: Navigator<R>, config: &NavigatorConfig) -> Result<()>
where
    R: Renderer + Send + Sync + 'static,
{
    config.validate()?;
    let addr = format!("{}:{}", config.host, config.port);
    let server = tiny_http::Server::http(&addr)
        .map_err(|e| Error::ConfigError(format!("Failed to listen on {}: {}", addr, e)))?;
    log::info!("Listening on http://{}/ with {} worker(s)", addr, config.workers);

    let server = Arc::new(server);
    let navigator = Arc::new(navigator);
    let workers: Vec<_> = (0..config.workers)
        .map(|i| {
            let server = Arc::clone(&server);
            let navigator = Arc::clone(&navigator);
            std::thread::Builder::new()
                .name(format!("rfnav-worker-{}", i))
                .spawn(move || loop {
                    match server.recv() {
                        Ok(request) => respond(&navigator, request),
                        Err(e) => {
                            log::error!("Listener failed: {}", e);
                            break;
                        }
                    }
                })
        })
        .collect::<std::io::Result<_>>()?;

    for worker in workers {
        if worker.join().is_err() {
            log::error!("A worker thread panicked");
        }
    }
    Ok(())
}
