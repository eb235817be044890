// src/process/utils.rs

/// Normalize raw cell text: drop embedded CR/LF, then trim surrounding
/// whitespace.
pub fn clean_cell(raw: &str) -> String {
    let joined: String = raw.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    joined.trim().to_string()
}

/// Parse a displayed number such as `1,234.50` into an `f64`.
/// Thousands separators are stripped; anything else that is not a finite
/// number yields `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let stripped: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if stripped.is_empty() {
        return None;
    }
    stripped.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_lose_line_breaks_and_padding() {
        assert_eq!(clean_cell("\r\n  NABIL \n"), "NABIL");
        assert_eq!(clean_cell("Transact.\r\nNo."), "Transact.No.");
        assert_eq!(clean_cell(""), "");
    }

    #[test]
    fn numbers_with_thousands_separators() {
        assert_eq!(parse_number("1,234.50"), Some(1234.50));
        assert_eq!(parse_number(" 12,345,678 "), Some(12_345_678.0));
        assert_eq!(parse_number("-3.5"), Some(-3.5));
    }

    #[test]
    fn non_numbers_are_rejected() {
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number(","), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
