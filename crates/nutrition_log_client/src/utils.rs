//! Input helpers applied at the boundary, before anything reaches the ledger
//! or the network.

use crate::NutritionError;

/// Upper-case the first character of a free-text food query. The backing
/// search is case-sensitive on the leading letter.
pub fn capitalize_query(query: &str) -> String {
    let mut chars = query.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse a user-entered mass in grams.
///
/// Accepts a positive integer with optional surrounding whitespace and a
/// trailing unit (`"150"`, `" 200 g"`). Empty, non-numeric, zero and negative
/// inputs are rejected.
pub fn parse_grams(input: &str) -> Result<u32, NutritionError> {
    let trimmed = input.trim();
    let digits: &str = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed, |end| &trimmed[..end]);
    if digits.is_empty() {
        return Err(NutritionError::Validation(format!(
            "mass must be a whole number of grams, got {input:?}"
        )));
    }
    match digits.parse::<u32>() {
        Ok(0) => Err(NutritionError::Validation(
            "mass must be greater than zero".into(),
        )),
        Ok(g) => Ok(g),
        Err(_) => Err(NutritionError::Validation(format!(
            "mass out of range: {digits}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_first_char_only() {
        assert_eq!(capitalize_query("appl"), "Appl");
        assert_eq!(capitalize_query("apple PIE"), "Apple PIE");
        assert_eq!(capitalize_query("Banana"), "Banana");
        assert_eq!(capitalize_query("éclair"), "Éclair");
        assert_eq!(capitalize_query(""), "");
    }

    #[test]
    fn parse_grams_accepts_plain_and_suffixed() {
        assert_eq!(parse_grams("150").unwrap(), 150);
        assert_eq!(parse_grams(" 200 g").unwrap(), 200);
        assert_eq!(parse_grams("75g").unwrap(), 75);
        assert_eq!(parse_grams("12.5").unwrap(), 12);
    }

    #[test]
    fn parse_grams_rejects_bad_input() {
        for bad in ["", "   ", "abc", "0", "-5", "g100", "99999999999"] {
            let err = parse_grams(bad).unwrap_err();
            assert!(err.is_validation(), "{bad:?} should be a validation error");
        }
    }
}
