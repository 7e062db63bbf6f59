use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kobopress_core::{Document, build_epub, extract_article, transform_to_kepub};

/// Builds a rendered Article page with the given number of paragraphs.
fn synthetic_page(paragraphs: usize) -> String {
    let body: String = (1..=paragraphs)
        .map(|i| {
            format!(
                "<p>Paragraph {i} is long enough to register as prose, with clauses that \
                 wander through the usual territory of an essay and enough commas to keep \
                 the sentence scorer interested in what comes next.</p>"
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Benchmark Article</title></head>
<body>
<a href="/benchwriter">Bench Writer</a>
<div data-testid="twitterArticleTitle">Benchmark Article</div>
<time datetime="2026-01-15T10:30:00.000Z">Jan 15</time>
<div data-testid="twitterArticleRichTextView">{body}</div>
</body>
</html>"#
    )
}

fn bench_parse(c: &mut Criterion) {
    let small = synthetic_page(10);
    let medium = synthetic_page(100);
    let large = synthetic_page(1000);

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("small", "10p"), &small, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("medium", "100p"), &medium, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("large", "1000p"), &large, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_extract_article(c: &mut Criterion) {
    let html = synthetic_page(100);

    c.bench_function("extract_article", |b| {
        b.iter(|| {
            extract_article(
                black_box(&html),
                "https://x.com/benchwriter/article/1",
                "Benchmark Article",
            )
        })
    });
}

fn bench_kepub_transform(c: &mut Criterion) {
    let html = synthetic_page(100);
    let article =
        extract_article(&html, "https://x.com/benchwriter/article/1", "Benchmark Article").unwrap();
    let chapter = format!("<html><head></head><body>{}</body></html>", article.body_html);

    c.bench_function("kepub_transform", |b| {
        b.iter(|| transform_to_kepub(black_box(&chapter), 1))
    });
}

fn bench_build_epub(c: &mut Criterion) {
    let html = synthetic_page(100);
    let article =
        extract_article(&html, "https://x.com/benchwriter/article/1", "Benchmark Article").unwrap();

    c.bench_function("build_epub", |b| b.iter(|| build_epub(black_box(&article), &[])));
}

criterion_group!(
    benches,
    bench_parse,
    bench_extract_article,
    bench_kepub_transform,
    bench_build_epub
);
criterion_main!(benches);
