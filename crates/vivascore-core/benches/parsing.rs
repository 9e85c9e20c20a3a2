use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vivascore_core::lexicon::{Lexicon, RuleTables};
use vivascore_core::parser::{parse_answer_set_str, parse_question_bank_str};

fn bench_bank_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("bank_parsing");

    let small_toml = generate_bank_toml(5);
    let medium_toml = generate_bank_toml(50);
    let large_toml = generate_bank_toml(200);

    group.bench_function("5_questions", |b| {
        b.iter(|| parse_question_bank_str(black_box(&small_toml), black_box("bench.toml".as_ref())))
    });

    group.bench_function("50_questions", |b| {
        b.iter(|| {
            parse_question_bank_str(black_box(&medium_toml), black_box("bench.toml".as_ref()))
        })
    });

    group.bench_function("200_questions", |b| {
        b.iter(|| parse_question_bank_str(black_box(&large_toml), black_box("bench.toml".as_ref())))
    });

    group.finish();
}

fn bench_answer_parsing(c: &mut Criterion) {
    let toml = generate_answers_toml(100);
    c.bench_function("answers_100", |b| {
        b.iter(|| parse_answer_set_str(black_box(&toml), black_box("answers.toml".as_ref())))
    });
}

fn bench_lexicon_compile(c: &mut Criterion) {
    let lexicon = Lexicon::default();
    c.bench_function("lexicon_compile", |b| {
        b.iter(|| RuleTables::compile(black_box(&lexicon)))
    });
}

fn generate_bank_toml(n: usize) -> String {
    let mut s = String::new();
    s.push_str(
        r#"[bank]
id = "bench"
name = "Benchmark"
"#,
    );
    for i in 0..n {
        s.push_str(&format!(
            r#"
[[questions]]
id = {i}
question = "Explain concept {i}"
category = "Data Structures"
difficulty = "medium"
must_have_concepts = ["hash function", "bucket", "collision"]
good_to_have_concepts = ["load factor"]
red_flags = ["always constant time"]
ideal_answer = "A hash map uses a hash function to map keys into buckets."
"#
        ));
    }
    s
}

fn generate_answers_toml(n: usize) -> String {
    let mut s = String::from("[session]\nid = \"bench\"\n");
    for i in 0..n {
        s.push_str(&format!(
            r#"
[[answers]]
id = "a{i}"
question_id = {i}
transcript = "A hash map is a table. It works by hashing each key into a bucket."
"#
        ));
    }
    s
}

criterion_group!(
    benches,
    bench_bank_parsing,
    bench_answer_parsing,
    bench_lexicon_compile
);
criterion_main!(benches);
