//! Criterion benchmarks for rust_buffered_logger

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_buffered_logger::core::{format_args, Formatter};
use rust_buffered_logger::prelude::*;
use rust_buffered_logger::LogRecord;
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.throughput(Throughput::Elements(1));

    let formatter = Formatter::new("W1")
        .with_home(Some("/srv/app".to_string()))
        .with_colors(false);
    let args = args!["request %s finished in %dms", "GET /users", 42];
    let fields = [
        LogValue::object([("requestId", LogValue::from("abc-123")), ("status", LogValue::from(200))]),
        LogValue::from("request finished"),
    ];
    let err = [LogValue::from(
        ErrorValue::new("boom").with_stack("Error: boom\n  at /srv/app/src/handler.js:10:5\n  at /srv/app/src/server.js:88:12"),
    )];
    let now = Utc::now();

    group.bench_function("format_args", |b| {
        b.iter(|| black_box(format_args(black_box(&args))));
    });

    group.bench_function("file_line", |b| {
        let record = LogRecord::new(LogLevel::Info, 0, now, "W1", &args);
        b.iter(|| black_box(formatter.file(black_box(&record))));
    });

    group.bench_function("pretty_line", |b| {
        let record = LogRecord::new(LogLevel::Warn, 2, now, "W1", &args);
        b.iter(|| black_box(formatter.pretty(black_box(&record))));
    });

    group.bench_function("json_line_fields", |b| {
        let record = LogRecord::new(LogLevel::Info, 0, now, "W1", &fields);
        b.iter(|| black_box(formatter.json(black_box(&record))));
    });

    group.bench_function("file_line_error_stack", |b| {
        let record = LogRecord::new(LogLevel::Error, 0, now, "W1", &err);
        b.iter(|| black_box(formatter.file(black_box(&record))));
    });

    group.finish();
}

// ============================================================================
// Buffered File Logging Benchmarks
// ============================================================================

fn bench_file_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_logging");
    group.throughput(Throughput::Elements(1));

    let runtime = Runtime::new().expect("Failed to create runtime");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    for (name, json) in [("file_format", false), ("json_format", true)] {
        let logger = runtime
            .block_on(
                Logger::builder()
                    .path(temp_dir.path())
                    .worker_id(name)
                    .to_stdout(Vec::new())
                    .json(json)
                    .flush_interval(Duration::from_millis(100))
                    .open(),
            )
            .expect("Failed to open logger");

        group.bench_function(name, |b| {
            b.iter(|| logger.info(black_box(&args!["user %s logged in", "alice"])));
        });

        runtime
            .block_on(logger.close())
            .expect("Failed to close logger");
    }

    group.finish();
}

// ============================================================================
// Routing Benchmarks
// ============================================================================

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::builder()
        .to_file(Vec::new())
        .to_stdout(Vec::new())
        .build()
        .expect("Failed to build logger");

    group.bench_function("unrouted_level", |b| {
        b.iter(|| logger.debug(black_box(&args!["dropped"])));
    });

    group.finish();
}

criterion_group!(benches, bench_formatting, bench_file_logging, bench_routing);
criterion_main!(benches);
