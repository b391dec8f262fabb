//! Numeric literal recognition for open-string runs.
//!
//! Open strings are re-classified as numbers when the whole trimmed run
//! matches one of the literal forms: decimal integer, decimal fraction with
//! optional exponent, `0x`/`0o`/`0b` radix integers, all optionally signed,
//! with an optional trailing `n` (big integer) or `m` (fixed decimal).

use crate::lexer::token::TokenValue;
use crate::lexer::token_kind::NumberBase;
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Clone, Copy, PartialEq)]
enum Suffix {
    None,
    BigInt,
    Decimal,
}

/// Try to read `text` as a numeric literal. `None` means the run stays an
/// open string.
pub(crate) fn scan_number(text: &str) -> Option<(TokenValue, NumberBase)> {
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'+' => (false, &text[1..]),
        b'-' => (true, &text[1..]),
        _ => (false, text),
    };
    if unsigned.is_empty() {
        return None;
    }

    let (body, suffix) = match unsigned.as_bytes()[unsigned.len() - 1] {
        b'n' => (&unsigned[..unsigned.len() - 1], Suffix::BigInt),
        b'm' => (&unsigned[..unsigned.len() - 1], Suffix::Decimal),
        _ => (unsigned, Suffix::None),
    };
    if body.is_empty() {
        return None;
    }

    for (prefix, radix, base) in [
        ("0x", 16, NumberBase::Hex),
        ("0X", 16, NumberBase::Hex),
        ("0o", 8, NumberBase::Octal),
        ("0O", 8, NumberBase::Octal),
        ("0b", 2, NumberBase::Binary),
        ("0B", 2, NumberBase::Binary),
    ] {
        if let Some(digits) = body.strip_prefix(prefix) {
            return radix_literal(digits, radix, base, negative, suffix);
        }
    }

    decimal_literal(body, negative, suffix)
}

fn radix_literal(
    digits: &str,
    radix: u32,
    base: NumberBase,
    negative: bool,
    suffix: Suffix,
) -> Option<(TokenValue, NumberBase)> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = match suffix {
        Suffix::BigInt => {
            let magnitude = BigInt::parse_bytes(digits.as_bytes(), radix)?;
            TokenValue::BigInt(if negative { -magnitude } else { magnitude })
        }
        // `m` decimals are decimal-base only
        Suffix::Decimal => return None,
        Suffix::None => {
            let magnitude = i128::from_str_radix(digits, radix).ok()?;
            let signed = if negative { -magnitude } else { magnitude };
            TokenValue::Number(signed as f64)
        }
    };
    Some((value, base))
}

fn decimal_literal(
    body: &str,
    negative: bool,
    suffix: Suffix,
) -> Option<(TokenValue, NumberBase)> {
    let (has_fraction, has_exponent) = validate_decimal_shape(body)?;
    let signed = if negative {
        format!("-{body}")
    } else {
        body.to_string()
    };

    let base = if has_exponent {
        NumberBase::Scientific
    } else {
        NumberBase::Decimal
    };

    let value = match suffix {
        Suffix::BigInt => {
            if has_fraction || has_exponent {
                return None;
            }
            TokenValue::BigInt(BigInt::from_str(&signed).ok()?)
        }
        Suffix::Decimal => {
            let decimal = if has_exponent {
                Decimal::from_scientific(&signed).ok()?
            } else {
                Decimal::from_str(&signed).ok()?
            };
            TokenValue::Decimal(decimal)
        }
        Suffix::None => TokenValue::Number(f64::from_str(&signed).ok()?),
    };
    Some((value, base))
}

/// Check `body` against `digits ('.' digits)? (('e'|'E') sign? digits)?` and
/// report which optional parts were present.
fn validate_decimal_shape(body: &str) -> Option<(bool, bool)> {
    let mut chars = body.chars().peekable();

    let mut int_digits = 0;
    while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
        chars.next();
        int_digits += 1;
    }
    if int_digits == 0 {
        return None;
    }

    let mut has_fraction = false;
    if chars.peek() == Some(&'.') {
        chars.next();
        let mut frac_digits = 0;
        while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
            frac_digits += 1;
        }
        if frac_digits == 0 {
            return None;
        }
        has_fraction = true;
    }

    let mut has_exponent = false;
    if matches!(chars.peek(), Some('e' | 'E')) {
        chars.next();
        if matches!(chars.peek(), Some('+' | '-')) {
            chars.next();
        }
        let mut exp_digits = 0;
        while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
            exp_digits += 1;
        }
        if exp_digits == 0 {
            return None;
        }
        has_exponent = true;
    }

    if chars.next().is_some() {
        return None;
    }
    Some((has_fraction, has_exponent))
}

#[cfg(test)]
mod test {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn number(text: &str) -> Option<(TokenValue, NumberBase)> {
        scan_number(text)
    }

    #[test]
    fn integers_and_fractions() {
        assert_eq!(
            number("42"),
            Some((TokenValue::Number(42.0), NumberBase::Decimal))
        );
        assert_eq!(
            number("-3.25"),
            Some((TokenValue::Number(-3.25), NumberBase::Decimal))
        );
        assert_eq!(
            number("+7"),
            Some((TokenValue::Number(7.0), NumberBase::Decimal))
        );
    }

    #[test]
    fn scientific() {
        assert_eq!(
            number("6.02e23"),
            Some((TokenValue::Number(6.02e23), NumberBase::Scientific))
        );
        assert_eq!(
            number("1E-3"),
            Some((TokenValue::Number(1e-3), NumberBase::Scientific))
        );
    }

    #[test]
    fn radix_forms() {
        assert_eq!(
            number("0xFF"),
            Some((TokenValue::Number(255.0), NumberBase::Hex))
        );
        assert_eq!(
            number("-0o17"),
            Some((TokenValue::Number(-15.0), NumberBase::Octal))
        );
        assert_eq!(
            number("0B101"),
            Some((TokenValue::Number(5.0), NumberBase::Binary))
        );
        assert_eq!(number("0x"), None);
        assert_eq!(number("0xG1"), None);
    }

    #[test]
    fn big_integers() {
        let (value, base) = number("123456789012345678901234567890n").unwrap();
        assert_eq!(base, NumberBase::Decimal);
        assert_eq!(
            value,
            TokenValue::BigInt("123456789012345678901234567890".parse().unwrap())
        );
        assert_eq!(
            number("-0xFFn"),
            Some((TokenValue::BigInt((-255).into()), NumberBase::Hex))
        );
        // fractional big integers do not exist
        assert_eq!(number("1.5n"), None);
    }

    #[test]
    fn fixed_decimals() {
        assert_eq!(
            number("1.50m"),
            Some((
                TokenValue::Decimal(Decimal::from_str("1.50").unwrap()),
                NumberBase::Decimal
            )),
        );
        assert_eq!(
            number("-2e2m"),
            Some((
                TokenValue::Decimal(Decimal::from_scientific("-2e2").unwrap()),
                NumberBase::Scientific
            )),
        );
        assert_eq!(number("0xFFm"), None);
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(number("abc"), None);
        assert_eq!(number("1.2.3"), None);
        assert_eq!(number("1e"), None);
        assert_eq!(number(".5"), None);
        assert_eq!(number("5."), None);
        assert_eq!(number("-"), None);
        assert_eq!(number("12 34"), None);
    }
}
