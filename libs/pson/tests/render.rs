//! Encoding a value and rendering it back must print the value's canonical decimal text.

use proptest::prelude::*;
use pson::{Encoder, Reader, Renderer, Token, to_json};

proptest! {
    #[test]
    fn int_renders_as_decimal(value in any::<i64>()) {
        let mut enc = Encoder::new();
        enc.int(value);
        prop_assert_eq!(to_json(enc.as_bytes()), value.to_string());
    }

    #[test]
    fn uint_renders_as_decimal(value in any::<u64>()) {
        let mut enc = Encoder::new();
        enc.uint(value);
        prop_assert_eq!(to_json(enc.as_bytes()), value.to_string());
    }

    #[test]
    fn int_uses_minimal_width(value in any::<i64>()) {
        let mut enc = Encoder::new();
        enc.int(value);
        let magnitude = value.unsigned_abs();
        let expected = if magnitude == 0 { 0 } else { (64 - magnitude.leading_zeros() as usize).div_ceil(8) };
        prop_assert_eq!(enc.len(), 1 + expected);
    }

    #[test]
    fn float_renders_with_precision(value in any::<f32>().prop_filter("finite", |v| v.is_finite()), decimals in 0u8..8) {
        let mut enc = Encoder::new();
        enc.float(value, decimals);
        prop_assert_eq!(to_json(enc.as_bytes()), format!("{:.*}", decimals as usize, value));
    }

    #[test]
    fn plain_strings_render_quoted(value in "[a-zA-Z0-9 ]{0,64}") {
        let mut enc = Encoder::new();
        enc.str(&value);
        prop_assert_eq!(to_json(enc.as_bytes()), format!("\"{value}\""));
    }

    #[test]
    fn code_survives_reader(code in 0u16..0x2000) {
        let mut enc = Encoder::new();
        enc.code(code);
        let token = Reader::new(enc.as_bytes()).next().unwrap().unwrap();
        prop_assert_eq!(token, Token::Code(code));
    }

    #[test]
    fn arrays_render_like_rust_lists(values in proptest::collection::vec(any::<i32>(), 0..32)) {
        let mut enc = Encoder::new();
        enc.open_array();
        for v in &values {
            enc.add(*v);
        }
        enc.close_array();
        let expected = format!("{values:?}").replace(' ', "");
        let checked = Renderer::new().checked(true).render_to_string(enc.as_bytes()).unwrap();
        prop_assert_eq!(&checked, &expected);
        prop_assert_eq!(to_json(enc.as_bytes()), expected);
    }
}
