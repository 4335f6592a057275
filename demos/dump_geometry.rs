use rfnavigator::assemble::assemble;
use rfnavigator::pages::Pages;
use rfnavigator::rendering::HtmlRenderer;
use rfnavigator::{NavigatorConfig, Stylesheet};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let html = r##"<html><head><title>Demo</title><style>h1 { color: #336 }</style></head>
<body>
<p><a href="#details">Skip to details</a> or visit <a href="https://www.rust-lang.org/">Rust</a>.</p>
<h1 id="details">Details</h1>
<p>Every link above is laid over the page image as a clickable region.</p>
</body></html>"##;

    let renderer = HtmlRenderer::new(&NavigatorConfig::default())?;
    let document = renderer.render_html(html, "http://demo.local/", std::slice::from_ref(&Stylesheet::print()))?;
    let pages: Vec<_> = Pages::new(document)?.collect();

    for (i, page) in pages.iter().enumerate() {
        println!("page {} ({}x{})", i + 1, page.width, page.height);
        for link in &page.links {
            println!("  link   {:<40} at ({}, {}) {}x{}", link.href, link.x, link.y, link.width, link.height);
        }
        for anchor in &page.anchors {
            println!("  anchor {:<40} at ({}, {})", anchor.name, anchor.x, anchor.y);
        }
    }

    let out = assemble(Some("http://demo.local/"), pages);
    println!("assembled document: {} bytes", out.len());
    Ok(())
}
