//! Integration tests for the built-in renderer against a local test server

use std::sync::Once;

use rfnavigator::pages::get_pages;
use rfnavigator::rendering::HtmlRenderer;
use rfnavigator::server::serve;
use rfnavigator::{Navigator, NavigatorConfig, PageSize, Renderer, Stylesheet};
use sha2::{Digest, Sha256};
use tiny_http::{Response, Server};

static INIT: Once = Once::new();

const INDEX: &str = r##"<!DOCTYPE html>
<html>
<head>
<title>Test Page</title>
<link rel="stylesheet" href="/style.css">
</head>
<body>
<p><a href="#sec1">Jump to section</a></p>
<p class="hidden"><a href="/secret">Hidden</a></p>
<p><a href="/other">Other page</a></p>
<h1 id="sec1">Section one</h1>
</body>
</html>"##;

/// Start a simple test HTTP server
fn start_test_server() -> String {
    INIT.call_once(|| {
        std::thread::spawn(|| {
            let server = Server::http("127.0.0.1:18081").unwrap();
            for request in server.incoming_requests() {
                let path = request.url().to_string();
                let html = "Content-Type: text/html; charset=utf-8".parse::<tiny_http::Header>().unwrap();
                let response = match path.as_str() {
                    "/" => Response::from_string(INDEX).with_header(html),
                    "/style.css" => Response::from_string("p.hidden { display: none }")
                        .with_header("Content-Type: text/css".parse::<tiny_http::Header>().unwrap()),
                    "/long" => {
                        let body: String = (0..60).map(|i| format!("<p id=\"p{}\">Paragraph {}</p>\n", i, i)).collect();
                        Response::from_string(format!("<html><body>{}</body></html>", body)).with_header(html)
                    }
                    "/redirect" => Response::from_string("")
                        .with_status_code(302)
                        .with_header("Location: /".parse::<tiny_http::Header>().unwrap()),
                    _ => Response::from_string("Not Found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });
        // Give the server time to start
        std::thread::sleep(std::time::Duration::from_millis(100));
    });

    "http://127.0.0.1:18081".to_string()
}

fn config() -> NavigatorConfig {
    NavigatorConfig { page: PageSize { width: 400, height: 300 }, page_margin: 20.0, ..Default::default() }
}

fn print() -> Vec<Stylesheet> {
    vec![Stylesheet::print()]
}

#[test]
fn test_links_resolve_against_the_final_url() {
    let base = start_test_server();
    let renderer = HtmlRenderer::new(&config()).unwrap();
    let pages = get_pages(&renderer, &format!("{}/redirect", base), &print()).unwrap();
    assert_eq!(pages.base_url(), format!("{}/", base));

    let pages: Vec<_> = pages.collect();
    let links: Vec<&str> = pages.iter().flat_map(|p| p.links.iter().map(|l| l.href.as_str())).collect();
    let anchors: Vec<&str> = pages.iter().flat_map(|p| p.anchors.iter().map(|a| a.name.as_str())).collect();

    assert!(links.contains(&"#sec1"));
    assert!(links.contains(&"/view/http://127.0.0.1:18081/other"));
    assert!(anchors.contains(&"sec1"));
}

#[test]
fn test_linked_stylesheet_is_applied() {
    let base = start_test_server();
    let renderer = HtmlRenderer::new(&config()).unwrap();
    let pages: Vec<_> = get_pages(&renderer, &format!("{}/", base), &print()).unwrap().collect();
    assert!(pages.iter().all(|p| p.links.iter().all(|l| !l.href.ends_with("/secret"))));
}

#[test]
fn test_http_errors_are_reported() {
    let base = start_test_server();
    let renderer = HtmlRenderer::new(&config()).unwrap();
    assert!(renderer.render_pages(&format!("{}/missing", base), &print()).is_err());

    let nav = Navigator::new(renderer).unwrap();
    assert_eq!(nav.handle("/view/127.0.0.1:18081/missing", None).status, 500);
}

#[test]
fn test_pdf_has_one_page_per_layout_page() {
    let base = start_test_server();
    let renderer = HtmlRenderer::new(&config()).unwrap();
    let url = format!("{}/long", base);

    let document = renderer.render_pages(&url, &print()).unwrap();
    assert!(document.boxes.len() > 1, "expected several pages, got {}", document.boxes.len());
    assert_eq!(document.rasters.len(), document.boxes.len());

    let bytes = renderer.write_pdf(&url, &print()).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    let pdf = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(pdf.get_pages().len(), document.boxes.len());
}

#[test]
fn test_rasters_are_deterministic() {
    let base = start_test_server();
    let renderer = HtmlRenderer::new(&config()).unwrap();
    let digest = || {
        let document = renderer.render_pages(&format!("{}/", base), &print()).unwrap();
        let mut hasher = Sha256::new();
        for raster in &document.rasters {
            hasher.update(&raster.png_data);
        }
        hex::encode(hasher.finalize())
    };
    assert_eq!(digest(), digest());
}

#[test]
fn test_serve_answers_over_http() {
    let _ = start_test_server();
    let config = NavigatorConfig { port: 18082, workers: 2, ..config() };
    let navigator = Navigator::from_config(&config).unwrap();
    std::thread::spawn(move || serve(navigator, &config));
    std::thread::sleep(std::time::Duration::from_millis(200));

    let client = reqwest::blocking::Client::new();
    let resp = client.get("http://127.0.0.1:18082/view/127.0.0.1:18081/").send().unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body = resp.text().unwrap();
    assert!(body.contains("<section"));
    assert!(body.contains("href=\"#sec1\""));

    let resp = client.get("http://127.0.0.1:18082/favicon.ico").send().unwrap();
    assert_eq!(resp.headers()["content-type"], "image/x-icon");

    let resp = client.get("http://127.0.0.1:18082/nowhere").send().unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[test]
fn test_file_urls_are_for_local_callers_only() {
    let dir = std::env::temp_dir().join(format!("rfnav-files-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("secret.html");
    std::fs::write(&path, "<p>secret</p>").unwrap();
    let url = url::Url::from_file_path(&path).unwrap().to_string();

    let navigator = Navigator::from_config(&config()).unwrap();
    let reply = navigator.handle(&format!("/view/{}", url), None);
    assert_eq!(reply.status, 500);
    assert!(!String::from_utf8_lossy(&reply.body).contains("<section"));
    assert_eq!(navigator.handle(&format!("/pdf/{}", url), None).status, 500);

    // the renderer itself still reads them, for the command line
    let document = navigator.renderer().render_pages(&url, &print()).unwrap();
    assert_eq!(document.boxes.len(), 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_truncated_stylesheet_still_renders() {
    let renderer = HtmlRenderer::new(&config()).unwrap();
    let html = "<style>p { font-family: S\u{fc}\u{df}</style><p><a href=\"#x\">x</a></p><a name=\"x\"></a>";
    let document = renderer.render_html(html, "http://a.example/", &print()).unwrap();
    let pages: Vec<_> = rfnavigator::pages::Pages::new(document).unwrap().collect();
    assert_eq!(pages[0].links.len(), 1);
    assert_eq!(pages[0].anchors.len(), 1);
    assert_eq!(pages[0].anchors[0].name, "x");
}
