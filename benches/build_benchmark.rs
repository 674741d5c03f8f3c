//! Benchmarks for zone-tree conversion.
//!
//! Run with: cargo bench
//!
//! These benchmarks convert synthetic page dumps with word-level and
//! character-level text layers.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use djvu2hocr::render::{RenderOptions, WordSegmentation};
use djvu2hocr::{dump_to_hocr_with_options, parse_zone};

/// Creates a page dump with `page_count` pages of `lines` lines each.
///
/// With `chars` set, every word is broken down into character zones.
fn create_test_dump(page_count: usize, lines: usize, chars: bool) -> String {
    let mut dump = String::new();
    for _ in 0..page_count {
        let height = 40 * lines as i64 + 100;
        dump.push_str(&format!("width=2000 height={}\n", height));
        dump.push_str(&format!("(page 0 0 2000 {}\n", height));
        for l in 0..lines {
            let y0 = 50 + 40 * l as i64;
            dump.push_str(&format!(" (line 100 {} 1900 {}", y0, y0 + 30));
            for w in 0..12 {
                let x0 = 100 + 150 * w as i64;
                let word = format!("word{}", w);
                if chars {
                    dump.push_str(&format!(" (word {} {} {} {}", x0, y0, x0 + 100, y0 + 30));
                    for (i, c) in word.chars().enumerate() {
                        let cx = x0 + 20 * i as i64;
                        dump.push_str(&format!(" (char {} {} {} {} \"{}\")", cx, y0, cx + 20, y0 + 30, c));
                    }
                    dump.push(')');
                } else {
                    dump.push_str(&format!(
                        " (word {} {} {} {} \"{}\")",
                        x0,
                        y0,
                        x0 + 100,
                        y0 + 30,
                        word
                    ));
                }
            }
            dump.push_str(")\n");
        }
        dump.push_str(")\n");
    }
    dump
}

fn bench_parse_zone(c: &mut Criterion) {
    let dump = create_test_dump(1, 60, false);
    let tree = &dump[dump.find('(').unwrap_or(0)..];

    c.bench_function("parse_zone_60_lines", |b| {
        b.iter(|| parse_zone(black_box(tree), 2500))
    });
}

fn bench_word_layer(c: &mut Criterion) {
    let dump = create_test_dump(10, 60, false);
    let options = RenderOptions::default();

    c.bench_function("convert_word_layer_10_pages", |b| {
        b.iter(|| dump_to_hocr_with_options(black_box(&dump), &options))
    });
}

fn bench_character_layer(c: &mut Criterion) {
    let dump = create_test_dump(10, 60, true);
    let mut group = c.benchmark_group("convert_character_layer_10_pages");

    for segmentation in [WordSegmentation::Simple, WordSegmentation::Uax29] {
        let options = RenderOptions::new().with_segmentation(segmentation);
        group.bench_function(segmentation.to_string(), |b| {
            b.iter(|| dump_to_hocr_with_options(black_box(&dump), &options))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parse_zone,
    bench_word_layer,
    bench_character_layer
);
criterion_main!(benches);
