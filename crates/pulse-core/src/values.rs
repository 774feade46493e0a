use crate::models::CellValue;

// ── NumberNormalizer ──────────────────────────────────────────────────────────

/// Converts raw spreadsheet cells into numbers.
///
/// Normalization is total: no input produces an error. The rules, in order:
///
/// * numeric cells are returned as-is;
/// * blank and boolean cells (including the textual literals `FALSE` /
///   `TRUE` that some exports write) yield 0;
/// * text containing `%` is parsed as a percentage and divided by 100, so
///   `"5%"` yields `0.05` (a fraction, not a whole percent);
/// * otherwise thousands-separator commas are stripped and the remainder is
///   parsed as a number;
/// * anything unparseable yields 0.
pub struct NumberNormalizer;

impl NumberNormalizer {
    /// Normalise a cell to a number.
    pub fn parse(cell: &CellValue) -> f64 {
        match cell {
            CellValue::Number(n) => *n,
            CellValue::Empty | CellValue::Bool(_) => 0.0,
            CellValue::Text(s) => Self::parse_str(s),
        }
    }

    /// Normalise a textual cell value to a number.
    ///
    /// # Examples
    ///
    /// ```
    /// use pulse_core::values::NumberNormalizer;
    ///
    /// assert_eq!(NumberNormalizer::parse_str("1,200"), 1200.0);
    /// assert_eq!(NumberNormalizer::parse_str("5%"), 0.05);
    /// assert_eq!(NumberNormalizer::parse_str("+50"), 50.0);
    /// assert_eq!(NumberNormalizer::parse_str("FALSE"), 0.0);
    /// assert_eq!(NumberNormalizer::parse_str("abc"), 0.0);
    /// ```
    pub fn parse_str(raw: &str) -> f64 {
        let s = raw.trim();
        if s.is_empty() || s == "FALSE" || s == "TRUE" {
            return 0.0;
        }

        if s.contains('%') {
            let stripped = s.replace('%', "");
            return leading_float(stripped.trim())
                .map(|v| v / 100.0)
                .unwrap_or(0.0);
        }

        let cleaned = s.replace(',', "");
        leading_float(&cleaned).unwrap_or_else(|| {
            tracing::debug!("NumberNormalizer: non-numeric cell \"{}\" treated as 0", raw);
            0.0
        })
    }
}

/// Parse the longest numeric prefix of `s` as a float.
///
/// Report cells frequently carry trailing annotations (`"+50"`,
/// `"120 (est.)"`), so strict whole-string parsing would lose values the
/// exports clearly intend as numbers. An exponent suffix is only consumed
/// when it is well formed.
fn leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut digits = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }

    let mantissa_end = end;
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        end += 1;
        if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
            end += 1;
        }
        let mut exp_digits = 0;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            exp_digits += 1;
        }
        if exp_digits == 0 {
            end = mantissa_end;
        }
    }

    s[..end].parse().ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
