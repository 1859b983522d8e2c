use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessera_parser::{parse, parse_document, tokenize, ParseOptions, ReferenceData};

fn parse_small_page(c: &mut Criterion) {
    let source = r#"<!DOCTYPE html>
<html lang="en">
  <head><title>Landing</title></head>
  <body>
    <header class="hero"><h1>Welcome</h1><p>Build pages visually.</p></header>
    <main><button type="button">Start</button></main>
  </body>
</html>"#;
    let reference = ReferenceData::html();

    c.bench_function("parse_small_page", |b| {
        b.iter(|| parse(black_box(source), &reference))
    });
}

fn parse_large_page(c: &mut Criterion) {
    // A long list of cards, roughly 1000 lines
    let mut source = String::from("<!DOCTYPE html>\n<html>\n<body>\n");
    for i in 0..200 {
        source.push_str(&format!(
            r#"  <section class="card" id="card-{i}">
    <h2>Card {i}</h2>
    <p>Some <b>bold</b> text &amp; a <a href="/cards/{i}">link</a>.</p>
    <img src="/img/{i}.png" alt="">
  </section>
"#
        ));
    }
    source.push_str("<script>for (let i = 0; i < 10; i++) {}</script>\n</body>\n</html>\n");
    let options = ParseOptions::default();

    c.bench_function("parse_large_page_1000_lines", |b| {
        b.iter(|| parse_document(black_box(&source), &options))
    });
}

fn tokenize_only(c: &mut Criterion) {
    let source = "<ul>".to_string() + &"<li class=\"item\">Item</li>\n".repeat(500) + "</ul>";

    c.bench_function("tokenize_only", |b| b.iter(|| tokenize(black_box(&source))));
}

criterion_group!(benches, parse_small_page, parse_large_page, tokenize_only);
criterion_main!(benches);
