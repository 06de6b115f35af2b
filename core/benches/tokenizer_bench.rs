use criterion::{criterion_group, criterion_main, Criterion};
use wikiseek_core::tokenizer::word_frequency;

fn bench_word_frequency(c: &mut Criterion) {
    let text = "The quick brown fox jumps over the lazy dog, 42 times; \
                naturally the dog objects to being jumped over so often. "
        .repeat(512);
    c.bench_function("word_frequency_32k", |b| b.iter(|| word_frequency(&text)));
}

criterion_group!(benches, bench_word_frequency);
criterion_main!(benches);
