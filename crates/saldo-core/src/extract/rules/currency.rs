//! Brazilian-locale currency parsing (`R$ 1.234,56`).

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a Brazilian-formatted amount into a non-negative value.
///
/// Keeps digits, commas and periods, drops every period (thousands
/// separator) and turns the comma into the decimal point. Anything that
/// still does not parse yields zero. Period-decimal input (`1234.56`) and
/// thousands-only input are misread; that is the accepted behaviour for
/// statements that always use the `1.234,56` convention.
pub fn parse_brl(s: &str) -> Decimal {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO)
}

/// Format an amount Brazilian style, without currency symbol (`1.234,56`).
pub fn format_brl(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.round_dp(2));
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };

    let Some((integer_part, decimal_part)) = unsigned.split_once('.') else {
        return s;
    };

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{}{},{}", sign, formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_brl() {
        assert_eq!(parse_brl("1.234,56"), dec("1234.56"));
        assert_eq!(parse_brl("R$ 100,00"), dec("100"));
        assert_eq!(parse_brl("R$\u{00a0}12.345.678,90"), dec("12345678.90"));
        assert_eq!(parse_brl(" 50,00 *"), dec("50"));
    }

    #[test]
    fn test_parse_brl_malformed_is_zero() {
        assert_eq!(parse_brl(""), Decimal::ZERO);
        assert_eq!(parse_brl("abc"), Decimal::ZERO);
        assert_eq!(parse_brl("1,2,3"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_brl_never_negative() {
        assert_eq!(parse_brl("-1.000,00"), dec("1000"));
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(dec("1234.56")), "1.234,56");
        assert_eq!(format_brl(dec("12345678.9")), "12.345.678,90");
        assert_eq!(format_brl(dec("5")), "5,00");
    }

    #[test]
    fn test_formatted_value_parses_back() {
        for raw in ["1.234,56", "0,01", "987.654.321,00"] {
            let value = parse_brl(raw);
            assert_eq!(parse_brl(&format_brl(value)), value);
        }
    }
}
