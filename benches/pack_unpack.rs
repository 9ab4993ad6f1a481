use bitfmt::{CompiledFormat, Value};
use criterion::{Criterion, criterion_group, criterion_main};

fn gen_format(field_count: usize) -> CompiledFormat {
    // Alternating unsigned and signed fields with byte-unfriendly widths.
    let mut fmt = String::with_capacity(field_count * 3);
    for i in 0..field_count {
        if i % 2 == 0 {
            fmt.push_str("u13");
        } else {
            fmt.push_str("s11");
        }
    }
    CompiledFormat::compile(&fmt).unwrap()
}

fn gen_values(field_count: usize) -> Vec<Value> {
    (0..field_count)
        .map(|i| {
            if i % 2 == 0 {
                Value::U64((i * 31 % 8192) as u64)
            } else {
                Value::I64((i as i64 * 17 % 1024) - 512)
            }
        })
        .collect()
}

fn bench_pack(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 100] {
        let cf = gen_format(field_count);
        let values = gen_values(field_count);

        c.bench_function(&format!("pack_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = cf.pack(&values).unwrap();
            })
        });
    }
}

fn bench_unpack(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 100] {
        let cf = gen_format(field_count);
        let packet = cf.pack(&gen_values(field_count)).unwrap();

        c.bench_function(&format!("unpack_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = cf.unpack(&packet).unwrap();
            })
        });
    }
}

criterion_group!(benches, bench_pack, bench_unpack);
criterion_main!(benches);
