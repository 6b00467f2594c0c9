use std::collections::HashSet;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lingolife_core::model::{UserId, Word, WordDraft};
use lingolife_core::review::ReviewSession;
use lingolife_core::statistics::compute_stats;
use lingolife_core::review_log::DailyTally;

fn make_words(n: usize) -> Vec<Word> {
    let user = UserId::default_user();
    (0..n)
        .map(|i| {
            let draft = WordDraft::new(format!("term-{i}"), format!("translation-{i}"));
            Word::from_draft(format!("w{i}"), &user, draft, Utc::now())
        })
        .collect()
}

fn reviewed_half(n: usize) -> HashSet<String> {
    (0..n).step_by(2).map(|i| format!("w{i}")).collect()
}

fn bench_build_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_queue");

    for n in [10usize, 1_000, 10_000] {
        let words = make_words(n);
        let reviewed = reviewed_half(n);
        group.bench_function(format!("n={n}"), |b| {
            b.iter(|| ReviewSession::from_candidates(black_box(words.clone()), black_box(&reviewed)))
        });
    }

    group.finish();
}

fn bench_walk_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk_session");
    let words = make_words(1_000);

    group.bench_function("all_known", |b| {
        b.iter(|| {
            let mut session = ReviewSession::from_candidates(words.clone(), &HashSet::new());
            while session.know().is_some() {}
            black_box(session.summary())
        })
    });

    group.bench_function("alternating", |b| {
        b.iter(|| {
            let mut session = ReviewSession::from_candidates(words.clone(), &HashSet::new());
            while session.current().is_some() {
                session.dont_know();
                session.know();
            }
            black_box(session.summary())
        })
    });

    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let words = make_words(10_000);
    c.bench_function("compute_stats/n=10000", |b| {
        b.iter(|| compute_stats(black_box(&words), 7, DailyTally::default(), 10))
    });
}

criterion_group!(benches, bench_build_queue, bench_walk_session, bench_stats);
criterion_main!(benches);
