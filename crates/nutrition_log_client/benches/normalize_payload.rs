use criterion::{Criterion, criterion_group, criterion_main};
use nutrition_log_client::normalize::suggestions_from_text;
use std::hint::black_box;

/// A suggestion payload shaped like the backend's pandas output: many rows,
/// unit-suffixed strings, and bare NaN tokens.
fn suggestion_payload(rows: usize) -> String {
    let items: Vec<String> = (0..rows)
        .map(|i| {
            format!(
                r#"{{"fdcId":{i},"name":"Food {i}","calories":"{} kcal","total_fat":NaN,"carbohydrate":{}.5,"protein":"{}g"}}"#,
                i % 900,
                i % 80,
                i % 40
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

fn bench_normalize_suggestions(c: &mut Criterion) {
    let payload = suggestion_payload(2_000);
    c.bench_function("normalize_suggestions_2000", |b| {
        b.iter(|| {
            let list = suggestions_from_text(black_box(&payload));
            assert_eq!(list.len(), 2_000);
        })
    });
}

criterion_group!(benches, bench_normalize_suggestions);
criterion_main!(benches);
