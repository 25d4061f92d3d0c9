//! CNPJ (Brazilian company tax ID) normalisation.

/// Digits-only form, used as lookup and cache key.
pub fn cnpj_digits(cnpj: &str) -> String {
    cnpj.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Display form: `12.345.678/0001-90`, or `12.345.678` for an 8-digit root.
/// Anything else is returned unchanged.
pub fn format_cnpj(cnpj: &str) -> String {
    let digits = cnpj_digits(cnpj);

    match digits.len() {
        14 => format!(
            "{}.{}.{}/{}-{}",
            &digits[0..2],
            &digits[2..5],
            &digits[5..8],
            &digits[8..12],
            &digits[12..14]
        ),
        8 => format!("{}.{}.{}", &digits[0..2], &digits[2..5], &digits[5..8]),
        _ => cnpj.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cnpj() {
        assert_eq!(format_cnpj("12345678000190"), "12.345.678/0001-90");
        assert_eq!(format_cnpj("12.345.678/0001-90"), "12.345.678/0001-90");
        assert_eq!(format_cnpj("12345678"), "12.345.678");
        assert_eq!(format_cnpj(" 123 "), "123");
    }

    #[test]
    fn test_cnpj_digits() {
        assert_eq!(cnpj_digits("12.345.678/0001-90"), "12345678000190");
    }
}
