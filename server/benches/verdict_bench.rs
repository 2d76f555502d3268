use criterion::{black_box, criterion_group, criterion_main, Criterion};

use idea_board_server::models::IdeaRef;
use idea_board_server::oracle::{duplicate_prompt, parse_verdict};

fn bench_parse_verdict(c: &mut Criterion) {
    let outputs = [
        "UNIQUE",
        "DUPLICATE: 0f8fad5b-d9cb-469f-a165-70867728950e",
        "DUPLICATE: 0f8fad5b-d9cb-469f-a165-70867728950e\nBoth ideas describe the same app.",
        "I am not sure these are related.",
    ];
    c.bench_function("parse_verdict_mixed", |b| {
        b.iter(|| {
            for o in &outputs {
                black_box(parse_verdict(black_box(o)));
            }
        });
    });
}

fn bench_duplicate_prompt(c: &mut Criterion) {
    // a board of 500 ideas is a large single scan for this service
    let existing: Vec<IdeaRef> = (0..500)
        .map(|i| IdeaRef { id: format!("idea-{:04}", i), text: format!("proposal number {} about office recycling and commuting", i) })
        .collect();
    c.bench_function("duplicate_prompt_500", |b| {
        b.iter(|| black_box(duplicate_prompt(black_box("carpool matching for staff"), &existing)))
    });
}

criterion_group!(benches, bench_parse_verdict, bench_duplicate_prompt);
criterion_main!(benches);
