use criterion::{criterion_group, criterion_main, Criterion};
use textcat_core::{tokenize, Language, Normalizer};

const TEXT: &str = "تاریخ ایران از دوران باستان تا امروز (با تکیه بر منابع نوشتاری) و کتابهای درسی \
در سال ۱۳۹۸ بررسی شده است. فیزیک و ریاضی‌ها نیز در این مجموعه آمده‌اند.";

fn bench_normalize(c: &mut Criterion) {
    let normalizer = Normalizer::new(Language::Persian);
    let text = TEXT.repeat(50);
    c.bench_function("tokenize_and_normalize", |b| b.iter(|| normalizer.normalize_tokens(tokenize(&text))));
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
