//! Pattern rules that turn free-text spec values into numbers.
//! A value that does not match gives `None`, never an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::table::Value;

static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*(?:in²|in|sq\s*in)").unwrap());
static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*").unwrap());
static BALANCE_IN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*in\b").unwrap());
static BALANCE_PTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:pts\s*)?(HL|HH|EB)\b").unwrap());
static EVEN_BALANCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bEB\b").unwrap());
static MAINS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*Mains").unwrap());
static CROSSES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*Crosses").unwrap());
static TENSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*-\s*(\d+)").unwrap());

/// Stiffness text the site uses for flexes too low to rate.
pub const STIFFNESS_UNRATED: &str = "N/A (very low)";

fn first_capture(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// "98 sq in / 632.26 sq cm" → 98.0; also used for length ("27in").
pub fn size_in(text: &str) -> Option<f64> {
    first_capture(&SIZE_RE, text)
}

/// "11.3oz / 320g" → 11.3
pub fn leading_number(text: &str) -> Option<f64> {
    first_capture(&LEADING_NUMBER_RE, text)
}

/// "12.99in / 32.99cm / 4 pts HL" → 12.99
pub fn balance_in(text: &str) -> Option<f64> {
    first_capture(&BALANCE_IN_RE, text)
}

/// Signed points of balance: headlight is positive, head heavy negative,
/// even balance zero.
pub fn balance_points(text: &str) -> Option<f64> {
    if let Some(caps) = BALANCE_PTS_RE.captures(text) {
        let value: f64 = caps[1].parse().ok()?;
        return match &caps[2] {
            "HL" => Some(value),
            "HH" => Some(-value),
            _ => Some(0.0),
        };
    }
    EVEN_BALANCE_RE.is_match(text).then_some(0.0)
}

/// Plain number; the unrated marker counts as missing.
pub fn stiffness(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Text(s) if s == STIFFNESS_UNRATED => None,
        Value::Text(s) => s.trim().parse().ok(),
        Value::Null => None,
    }
}

/// Mean of the slash-separated widths that parse: "21mm / 23mm / 22mm" → 22.0
pub fn avg_beam_width(text: &str) -> Option<f64> {
    let widths: Vec<f64> = text
        .split('/')
        .filter_map(|part| {
            let cleaned = part.trim().replace("mm", "");
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse().ok()
            }
        })
        .collect();

    if widths.is_empty() {
        None
    } else {
        Some(widths.iter().sum::<f64>() / widths.len() as f64)
    }
}

/// (mains, crosses), each looked up on its own.
pub fn string_pattern(text: &str) -> (Option<f64>, Option<f64>) {
    if text.trim().is_empty() {
        return (None, None);
    }
    (first_capture(&MAINS_RE, text), first_capture(&CROSSES_RE, text))
}

/// (lower, upper) from the first "a - b" pair.
pub fn tension_bounds(text: &str) -> (Option<f64>, Option<f64>) {
    let Some(caps) = TENSION_RE.captures(text) else {
        return (None, None);
    };
    (caps[1].parse().ok(), caps[2].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_size_and_length() {
        assert_eq!(size_in("100 in²"), Some(100.0));
        assert_eq!(size_in("98 sq in / 632.26 sq cm"), Some(98.0));
        assert_eq!(size_in("27.5 in / 69.85 cm"), Some(27.5));
        assert_eq!(size_in("27in"), Some(27.0));
        assert_eq!(size_in("68.58cm"), None);
        assert_eq!(size_in("Oversize"), None);
    }

    #[test]
    fn strung_weight() {
        assert_eq!(leading_number("11.3oz / 320g"), Some(11.3));
        assert_eq!(leading_number("unknown"), None);
    }

    #[test]
    fn balance_inches_needs_in_suffix() {
        assert_eq!(balance_in("12.99in / 32.99cm / 4 pts HL"), Some(12.99));
        assert_eq!(balance_in("13 in / 33cm / EB"), Some(13.0));
        assert_eq!(balance_in("32.99cm / 4 pts HL"), None);
    }

    #[test]
    fn balance_sign_rule() {
        assert_eq!(balance_points("4 pts HL"), Some(4.0));
        assert_eq!(balance_points("4 pts HH"), Some(-4.0));
        assert_eq!(balance_points("EB"), Some(0.0));
        assert_eq!(balance_points("12.99in / 32.99cm / 7.5 pts HL"), Some(7.5));
        assert_eq!(balance_points("13.5in / 34.29cm / 1pts HH"), Some(-1.0));
        assert_eq!(balance_points("13.5in / 34.29cm / EB"), Some(0.0));
        assert_eq!(balance_points("2 EB"), Some(0.0));
        assert_eq!(balance_points("HL"), None);
        assert_eq!(balance_points("12.99in"), None);
    }

    #[test]
    fn stiffness_values() {
        assert_eq!(stiffness(&Value::from("66")), Some(66.0));
        assert_eq!(stiffness(&Value::from(STIFFNESS_UNRATED)), None);
        assert_eq!(stiffness(&Value::from("soft")), None);
        assert_eq!(stiffness(&Value::Number(70.0)), Some(70.0));
        assert_eq!(stiffness(&Value::Null), None);
    }

    #[test]
    fn beam_width_average() {
        assert_eq!(avg_beam_width("22/23/24mm"), Some(23.0));
        assert_eq!(avg_beam_width("22mm"), Some(22.0));
        assert_eq!(avg_beam_width("21/22mm"), Some(21.5));
        assert_eq!(avg_beam_width("23mm / flat / 21mm"), Some(22.0));
        assert_eq!(avg_beam_width("varies"), None);
        assert_eq!(avg_beam_width(""), None);
    }

    #[test]
    fn mains_and_crosses() {
        assert_eq!(string_pattern("16 Mains / 19 Crosses"), (Some(16.0), Some(19.0)));
        assert_eq!(string_pattern("18 mains / 20 crosses"), (Some(18.0), Some(20.0)));
        assert_eq!(string_pattern("16 Mains"), (Some(16.0), None));
        assert_eq!(string_pattern("18x20"), (None, None));
        assert_eq!(string_pattern("   "), (None, None));
    }

    #[test]
    fn tension() {
        assert_eq!(tension_bounds("50-60 lbs"), (Some(50.0), Some(60.0)));
        assert_eq!(tension_bounds("Mains 50 - 55 pounds"), (Some(50.0), Some(55.0)));
        assert_eq!(tension_bounds("Not strung"), (None, None));
    }
}
