use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use rfnavigator::normalize::normalize_url;
use rfnavigator::pages::get_pages;
use rfnavigator::rendering::HtmlRenderer;
use rfnavigator::server::serve;
use rfnavigator::{geometry, Navigator, NavigatorConfig, Renderer, Stylesheet};

/// Browse the web through paginated page images with clickable links.
#[derive(Parser, Debug)]
#[command(name = "rfnavigator", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP navigator
    Serve(ServeArgs),
    /// Print the link and anchor geometry of every page as JSON
    Dump(DocumentArgs),
    /// Write a document to a PDF file
    Pdf {
        #[command(flatten)]
        document: DocumentArgs,
        /// Output file
        #[arg(short, long, default_value = "out.pdf")]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 5000)]
    port: u16,
    /// Request handling threads (defaults to the number of CPUs)
    #[arg(long)]
    workers: Option<usize>,
    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(Args, Debug)]
struct DocumentArgs {
    /// URL or local HTML file
    input: String,
    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Override the User-Agent header
    #[arg(long)]
    user_agent: Option<String>,
    /// Fetch timeout in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,
}

impl FetchArgs {
    fn apply(&self, config: &mut NavigatorConfig) {
        if let Some(ua) = &self.user_agent {
            config.user_agent = ua.clone();
        }
        config.timeout_ms = self.timeout_ms;
    }
}

#[derive(Serialize)]
struct DumpedPage {
    page: usize,
    width: u32,
    height: u32,
    #[serde(flatten)]
    geometry: geometry::PageGeometry,
}

#[derive(Serialize)]
struct Dump {
    url: String,
    pages: Vec<DumpedPage>,
}

/// Local files become `file://` URLs, anything else goes through URL
/// normalization.
fn document_url(input: &str) -> anyhow::Result<String> {
    let path = Path::new(input);
    if path.is_file() {
        let abs = path.canonicalize().with_context(|| format!("cannot resolve {}", input))?;
        return match url::Url::from_file_path(&abs) {
            Ok(u) => Ok(u.to_string()),
            Err(()) => bail!("cannot express {} as a file URL", abs.display()),
        };
    }
    normalize_url(input, None).context("empty URL")
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let mut config = NavigatorConfig::default();

    match cli.command {
        Command::Serve(args) => {
            config.host = args.host;
            config.port = args.port;
            if let Some(workers) = args.workers {
                config.workers = workers;
            }
            args.fetch.apply(&mut config);
            let navigator = Navigator::from_config(&config)?;
            serve(navigator, &config)?;
        }
        Command::Dump(args) => {
            args.fetch.apply(&mut config);
            let url = document_url(&args.input)?;
            let renderer = HtmlRenderer::new(&config)?;
            let pages = get_pages(&renderer, &url, std::slice::from_ref(&Stylesheet::print()))?;
            let base_url = pages.base_url().to_string();
            let pages = pages
                .enumerate()
                .map(|(i, page)| DumpedPage {
                    page: i + 1,
                    width: page.width,
                    height: page.height,
                    geometry: geometry::PageGeometry { links: page.links, anchors: page.anchors },
                })
                .collect();
            let dump = Dump { url: base_url, pages };
            println!("{}", serde_json::to_string_pretty(&dump)?);
        }
        Command::Pdf { document, output } => {
            document.fetch.apply(&mut config);
            let url = document_url(&document.input)?;
            let renderer = HtmlRenderer::new(&config)?;
            let bytes = renderer.write_pdf(&url, std::slice::from_ref(&Stylesheet::print()))?;
            std::fs::write(&output, &bytes).with_context(|| format!("cannot write {}", output.display()))?;
            log::info!("Wrote {} bytes to {}", bytes.len(), output.display());
        }
    }
    Ok(())
}
