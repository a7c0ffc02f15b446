use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gradebook_core::engine::{
    filter_dropped, max_grade_possible, needed_for_target, total_weighted_average, DropMode,
};
use gradebook_core::model::{Assessment, Course};

/// Deterministic pseudo-random grades, a quarter of them ungraded.
fn grades(n: usize) -> Vec<Option<f64>> {
    (0..n)
        .map(|i| {
            let g = (i * 37 + 11) % 101;
            (i % 4 != 3).then_some(g as f64)
        })
        .collect()
}

fn bench_filter_dropped(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_dropped");

    for (amount, dropped) in [(10, 2), (100, 10), (1000, 100)] {
        let assessment = Assessment::with_grades(100, dropped, grades(amount));
        group.bench_function(format!("{amount}_drop_{dropped}"), |b| {
            b.iter(|| filter_dropped(black_box(&assessment), DropMode::Configured).dropped_count())
        });
    }

    group.finish();
}

fn bench_course_totals(c: &mut Criterion) {
    let mut group = c.benchmark_group("course_totals");

    let mut course = Course::default();
    for i in 0..10 {
        course
            .assessments
            .insert(format!("Item{i}"), Assessment::with_grades(10, 2, grades(12)));
    }

    group.bench_function("weighted_average", |b| {
        b.iter(|| total_weighted_average(black_box(&course)))
    });
    group.bench_function("needed_for_target", |b| {
        b.iter(|| needed_for_target(black_box(&course), black_box(85.0)))
    });
    group.bench_function("max_grade_possible", |b| {
        b.iter(|| max_grade_possible(black_box(&course)))
    });

    group.finish();
}

criterion_group!(benches, bench_filter_dropped, bench_course_totals);
criterion_main!(benches);
