use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gctk::interpreter::{interpret, InterpreterOptions};
use gctk::parser::{Lexer, Parser};
use gctk::parse_line;

/// Generate G-code content of different patterns for benchmarking
fn generate_gcode_content(lines: usize, pattern: &str) -> String {
    let mut content = String::from("G21\nG90\n");

    match pattern {
        "movement_heavy" => {
            for i in 0..lines {
                content.push_str(&format!(
                    "G1 X{:.3} Y{:.3} Z{:.3} F1500\n",
                    (i as f32) * 0.1,
                    (i as f32) * 0.2,
                    (i as f32) * 0.05,
                ));
            }
        }
        "arc_heavy" => {
            for i in 0..lines {
                let code = if i % 2 == 0 { "G2" } else { "G3" };
                content.push_str(&format!(
                    "{} X{:.3} Y{:.3} R{:.3} F800\n",
                    code,
                    (i % 50) as f32,
                    (i % 30) as f32,
                    40.0 + (i % 7) as f32,
                ));
            }
        }
        "comment_heavy" => {
            for i in 0..lines {
                content.push_str(&format!(
                    "G1 X{:.1} Y{:.1} (pass {}) ; segment {} of layer {}\n",
                    (i as f32) * 0.1,
                    (i as f32) * 0.1,
                    i % 3,
                    i % 100,
                    i / 100,
                ));
            }
        }
        "mixed" => {
            for i in 0..lines {
                match i % 4 {
                    0 => content.push_str(&format!(
                        "N{} G1 X{:.3} Y{:.3} F1500\n",
                        i,
                        (i as f32) * 0.1,
                        (i as f32) * 0.2
                    )),
                    1 => content.push_str(&format!("; Layer {}\n", i / 4)),
                    2 => content.push_str(&format!("M3 S{}\n", 8000 + (i % 50))),
                    3 => content.push_str(&format!("Z{:.2}\n", (i as f32) * 0.1)),
                    _ => unreachable!(),
                }
            }
        }
        _ => {
            for i in 0..lines {
                content.push_str(&format!("G1 X{} Y{}\n", i, i));
            }
        }
    }

    content.push_str("M2\n");
    content
}

/// Benchmark parsing single lines with different patterns
fn bench_single_line_parsing(c: &mut Criterion) {
    let test_lines = vec![
        ("simple_move", "G1 X10 Y20"),
        ("complex_move", "N120 G1 X123.456 Y789.012 Z0.3 F1500"),
        ("arc", "G2 X10 Y-5.5 I2.25 J-1.125 F300"),
        ("with_comment", "G1 X10 Y20 ; Move to next position"),
        (
            "comment_only",
            "; This is a comment line with some detailed information",
        ),
        ("spindle", "M3 S12000"),
    ];

    let mut group = c.benchmark_group("single_line_parsing");

    for (name, line) in test_lines {
        group.bench_with_input(BenchmarkId::new("parse_line", name), &line, |b, line| {
            b.iter(|| black_box(parse_line(black_box(line))))
        });
    }

    group.finish();
}

/// Benchmark tokenization performance separately
fn bench_tokenization(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenization");

    for &size in &[1_000, 10_000] {
        let content = generate_gcode_content(size, "mixed");
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("lex", size), &content, |b, content| {
            b.iter(|| black_box(Lexer::new(black_box(content)).count()))
        });
    }

    group.finish();
}

/// Benchmark statement parsing over whole programs
fn bench_program_parsing(c: &mut Criterion) {
    let patterns = ["movement_heavy", "comment_heavy", "mixed"];

    let mut group = c.benchmark_group("program_parsing");

    for &size in &[100, 1_000, 10_000, 100_000] {
        for pattern in patterns {
            let content = generate_gcode_content(size, pattern);

            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(
                BenchmarkId::new(pattern, size),
                &content,
                |b, content| b.iter(|| black_box(Parser::new(black_box(content)).count())),
            );
        }
    }

    group.finish();
}

/// Benchmark full interpretation throughput (bytes per second)
fn bench_interpretation(c: &mut Criterion) {
    let options = InterpreterOptions::default();

    let mut group = c.benchmark_group("interpretation");

    for &size in &[1_000, 10_000, 100_000] {
        for pattern in ["movement_heavy", "arc_heavy", "mixed"] {
            let content = generate_gcode_content(size, pattern);

            group.throughput(Throughput::Bytes(content.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(pattern, size),
                &content,
                |b, content| b.iter(|| black_box(interpret(black_box(content), &options))),
            );
        }
    }

    group.finish();
}

criterion_group!(
    parsing_benches,
    bench_single_line_parsing,
    bench_tokenization,
    bench_program_parsing,
    bench_interpretation
);

criterion_main!(parsing_benches);
