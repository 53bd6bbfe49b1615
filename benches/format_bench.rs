use criterion::{black_box, criterion_group, criterion_main, Criterion};

use telenum::{
    NumberFormat, PhoneMetadata, PhoneMetadataCollection, PhoneNumber, PhoneNumberDesc,
    PhoneNumberFormat, PhoneNumberUtil,
};

fn bench_metadata() -> PhoneMetadataCollection {
    let mut us = PhoneMetadata::new();
    us.set_id("US".to_owned());
    us.set_country_code(1);
    us.set_main_country_for_code(true);
    us.set_international_prefix("011".to_owned());
    us.set_national_prefix("1".to_owned());
    let mut general = PhoneNumberDesc::new();
    general.set_national_number_pattern("[2-9]\\d{9}".to_owned());
    general.possible_length = vec![10];
    us.general_desc = general.clone();
    us.fixed_line = general;
    let mut us_format = NumberFormat::new();
    us_format.set_pattern("(\\d{3})(\\d{3})(\\d{4})".to_owned());
    us_format.set_format("$1 $2 $3".to_owned());
    us.number_format = vec![us_format];

    PhoneMetadataCollection { metadata: vec![us] }
}

fn format_benchmark(c: &mut Criterion) {
    let phone_util = PhoneNumberUtil::new_for_metadata(bench_metadata());
    let mut number = PhoneNumber::new();
    number.set_country_code(1);
    number.set_national_number(6502530000);

    c.bench_function("format national", |b| {
        b.iter(|| {
            black_box(
                phone_util
                    .format(black_box(&number), PhoneNumberFormat::National)
                    .unwrap(),
            )
        })
    });

    c.bench_function("format e164", |b| {
        b.iter(|| {
            black_box(
                phone_util
                    .format(black_box(&number), PhoneNumberFormat::E164)
                    .unwrap(),
            )
        })
    });

    c.bench_function("format rfc3966", |b| {
        b.iter(|| {
            black_box(
                phone_util
                    .format(black_box(&number), PhoneNumberFormat::RFC3966)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, format_benchmark);
criterion_main!(benches);
