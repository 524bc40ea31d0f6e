use std::fs::File;
use std::hint::black_box;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use result_analyzer::analysis;
use result_analyzer::config::DEFAULT_SUBJECTS;
use result_analyzer::dataset::{CsvOptions, Dataset};
use result_analyzer::schema::infer_schema;
use result_analyzer::store;
use tempfile::TempDir;

fn generate_results(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("results.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(
        file,
        "Name,{},Total Marks,Attendance",
        DEFAULT_SUBJECTS.join(",")
    )
    .expect("header");
    for i in 0..rows {
        let a = (i * 7) % 100;
        let b = (i * 13) % 100;
        let c = (i * 31) % 100;
        let attendance = 50.0 + (i % 50) as f64;
        writeln!(
            file,
            "Student {},{a},{b},{c},{},{attendance:.1}",
            i % (rows / 2).max(1),
            a + b + c
        )
        .expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_analysis(c: &mut Criterion) {
    let (temp_dir, csv_path) = generate_results(20_000);
    let dataset = Dataset::load(&csv_path, CsvOptions::default()).expect("load results");
    let subjects = DEFAULT_SUBJECTS
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();

    let mut group = c.benchmark_group("analysis");

    group.bench_function("load_csv", |b| {
        b.iter(|| Dataset::load(black_box(&csv_path), CsvOptions::default()).expect("load"));
    });

    group.bench_function("top_students", |b| {
        b.iter(|| analysis::top_students(black_box(&dataset), "Total Marks", 5));
    });

    group.bench_function("failures", |b| {
        b.iter(|| analysis::failures(black_box(&dataset), "Name", &subjects));
    });

    group.bench_function("generate_report", |b| {
        b.iter(|| {
            analysis::generate_report(black_box(&dataset), "Name", "Total Marks", "Attendance")
        });
    });

    let schema = infer_schema(&dataset);
    let store_path = temp_dir.path().join("bench.db");
    group.bench_function("persist", |b| {
        b.iter_batched(
            || (),
            |_| {
                store::persist(&dataset, &schema, &store_path).expect("persist");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
    drop(temp_dir);
}

criterion_group!(benches, bench_analysis);
criterion_main!(benches);
