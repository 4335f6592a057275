use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rfnavigator::assemble::assemble;
use rfnavigator::geometry::find_links;
use rfnavigator::pages::Page;
use rfnavigator::rendering::HtmlRenderer;
use rfnavigator::{BoxNode, BoxStyle, Link, NavigatorConfig, PageRaster, Rect};

/// A page with `rows` lines, each holding a linked word and an anchor.
fn synthetic_page(rows: usize) -> BoxNode {
    let children = (0..rows)
        .map(|i| {
            let y = i as f32 * 20.0;
            let link = if i % 2 == 0 { Link::internal(format!("a{}", i)) } else { Link::external(format!("http://x.example/{}", i)) };
            let word = BoxNode::leaf(
                BoxStyle { link: Some(link.clone()), ..Default::default() },
                Rect::new(75.0, y, 60.0, 18.0),
                "link",
            );
            BoxNode::container(
                BoxStyle { anchor: Some(format!("a{}", i)), ..Default::default() },
                Rect::new(75.0, y, 644.0, 20.0),
                vec![BoxNode::container(BoxStyle { link: Some(link), ..Default::default() }, Rect::new(75.0, y, 60.0, 18.0), vec![word])],
            )
        })
        .collect();
    BoxNode::container(BoxStyle::default(), Rect::new(0.0, 0.0, 794.0, 1123.0), children)
}

fn bench_find_links(c: &mut Criterion) {
    let root = synthetic_page(500);
    c.bench_function("find_links_500_rows", |b| {
        b.iter(|| {
            let mut links = Vec::new();
            let mut anchors = Vec::new();
            find_links(black_box(&root), &mut links, &mut anchors);
            (links.len(), anchors.len())
        })
    });
}

fn bench_assemble(c: &mut Criterion) {
    let root = synthetic_page(50);
    let raster = PageRaster { width: 794, height: 1123, png_data: vec![0u8; 16 * 1024] };
    c.bench_function("assemble_10_pages", |b| {
        b.iter(|| {
            let pages = (0..10).map(|_| Page::new(raster.clone(), &root));
            assemble(Some("http://x.example/"), pages).len()
        })
    });
}

fn bench_render_html(c: &mut Criterion) {
    let renderer = HtmlRenderer::new(&NavigatorConfig::default()).expect("failed to create renderer");
    let html: String = (0..40)
        .map(|i| format!("<h2 id=\"s{i}\">Section {i}</h2><p>Some text with <a href=\"#s{i}\">a link</a> in it.</p>"))
        .collect();
    c.bench_function("render_html_40_sections", |b| {
        b.iter(|| renderer.render_html(black_box(&html), "http://x.example/", &[]).unwrap().rasters.len())
    });
    c.bench_function("pdf_html_40_sections", |b| {
        b.iter(|| renderer.pdf_html(black_box(&html), "http://x.example/", &[]).unwrap().len())
    });
}

criterion_group!(benches, bench_find_links, bench_assemble, bench_render_html);
criterion_main!(benches);
