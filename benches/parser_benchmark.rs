use claude_lens::parser::LogRecordParser;
use claude_lens::pricing::PriceTable;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn usage_line(id: usize) -> String {
    format!(
        r#"{{"sessionId":"bench-session","timestamp":"2024-10-23T10:00:{:02}Z","type":"assistant","message":{{"id":"msg-{}","role":"assistant","model":"claude-3-5-sonnet-20241022","usage":{{"input_tokens":1500,"output_tokens":350,"cache_creation_input_tokens":0,"cache_read_input_tokens":2048}},"content":[{{"type":"text","text":"benchmark reply body"}}]}}}}"#,
        id % 60,
        id
    )
}

fn bench_classify_line(c: &mut Criterion) {
    let prices = PriceTable::builtin();
    let parser = LogRecordParser::new(&prices);
    let line = usage_line(7);

    c.bench_function("classify_line", |b| {
        b.iter(|| parser.classify_line(black_box(&line)))
    });
}

fn bench_parse_file(c: &mut Criterion) {
    let prices = PriceTable::builtin();
    let parser = LogRecordParser::new(&prices);
    let contents: String = (0..1_000)
        .map(|i| usage_line(i) + "\n")
        .collect();

    c.bench_function("parse_file_1k_lines", |b| {
        b.iter(|| parser.parse_file(black_box(&contents), "bench-project"))
    });
}

criterion_group!(benches, bench_classify_line, bench_parse_file);
criterion_main!(benches);
