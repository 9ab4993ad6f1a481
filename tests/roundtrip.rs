use bitfmt::{CompiledFormat, Value};
use proptest::prelude::*;

fn mask(value: u64, width: usize) -> u64 {
    if width == 64 {
        value
    } else {
        value & ((1u64 << width) - 1)
    }
}

fn sign_extend(value: u64, width: usize) -> i64 {
    let shift = 64 - width;
    ((value << shift) as i64) >> shift
}

proptest! {
    #[test]
    fn unsigned_roundtrip(value: u64, width in 1usize..=64) {
        let value = mask(value, width);
        for fmt in [format!("u{width}"), format!("<u{width}"), format!("u{width}<"), format!("<u{width}<")] {
            let cf = CompiledFormat::compile(&fmt).unwrap();
            let packed = cf.pack(&[Value::U64(value)]).unwrap();
            prop_assert_eq!(packed.len(), width.div_ceil(8));
            prop_assert_eq!(cf.unpack(&packed).unwrap(), vec![Value::U64(value)]);
        }
    }

    #[test]
    fn signed_roundtrip(value: u64, width in 1usize..=64) {
        let value = sign_extend(mask(value, width), width);
        for fmt in [format!("s{width}"), format!("<s{width}"), format!("s{width}<"), format!("<s{width}<")] {
            let cf = CompiledFormat::compile(&fmt).unwrap();
            let packed = cf.pack(&[Value::I64(value)]).unwrap();
            prop_assert_eq!(cf.unpack(&packed).unwrap(), vec![Value::I64(value)]);
        }
    }

    #[test]
    fn f32_roundtrip(value: f32) {
        prop_assume!(value.is_finite());
        let value = value as f64;
        for fmt in ["f32", "<f32", "f32<"] {
            let cf = CompiledFormat::compile(fmt).unwrap();
            let packed = cf.pack(&[Value::F64(value)]).unwrap();
            prop_assert_eq!(cf.unpack(&packed).unwrap(), vec![Value::F64(value)]);
        }
    }

    #[test]
    fn f64_roundtrip(value: f64) {
        prop_assume!(value.is_finite());
        for fmt in ["f64", "<f64", "f64<"] {
            let cf = CompiledFormat::compile(fmt).unwrap();
            let packed = cf.pack(&[Value::F64(value)]).unwrap();
            prop_assert_eq!(cf.unpack(&packed).unwrap(), vec![Value::F64(value)]);
        }
    }

    #[test]
    fn raw_roundtrip(data in proptest::collection::vec(any::<u8>(), 1..32)) {
        let width = data.len() * 8;
        for fmt in [format!("r{width}"), format!("r{width}<")] {
            let cf = CompiledFormat::compile(&fmt).unwrap();
            let packed = cf.pack(&[Value::Raw(data.clone())]).unwrap();
            prop_assert_eq!(&packed, &data);
            prop_assert_eq!(cf.unpack(&packed).unwrap(), vec![Value::Raw(data.clone())]);
        }
    }

    #[test]
    fn mixed_fields_roundtrip(
        a: u64, a_width in 1usize..=64,
        b: u64, b_width in 1usize..=64,
        flag: bool,
    ) {
        let a = mask(a, a_width);
        let b = sign_extend(mask(b, b_width), b_width);
        let values = [Value::U64(a), Value::I64(b), Value::Bool(flag)];

        for fmt in [
            format!("u{a_width}s{b_width}b1"),
            format!("u{a_width}s{b_width}b1<"),
            format!("<u{a_width}<s{b_width}<b1"),
            format!("u{a_width}p5s{b_width}P3b1"),
        ] {
            let cf = CompiledFormat::compile(&fmt).unwrap();
            let packed = cf.pack(&values).unwrap();
            prop_assert_eq!(cf.unpack(&packed).unwrap(), values.to_vec(), "format {}", fmt);
        }
    }

    #[test]
    fn unpack_from_matches_shifted_pack(value: u64, width in 1usize..=32, offset in 0usize..8) {
        let value = mask(value, width);
        let fmt = format!("p{}u{width}", offset + 1);
        let cf = CompiledFormat::compile(&fmt).unwrap();
        let packed = cf.pack(&[Value::U64(value)]).unwrap();

        let plain = CompiledFormat::compile(&format!("u{width}")).unwrap();
        let unpacked = plain.unpack_from(&packed, offset + 1, false).unwrap();
        prop_assert_eq!(unpacked, vec![Value::U64(value)]);
    }
}
