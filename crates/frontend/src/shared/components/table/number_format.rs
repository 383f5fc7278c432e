//! Number formatting for table cells

/// Integer counter with `,` between every group of three digits: 1234567 -> "1,234,567"
pub fn format_count(value: i64) -> String {
    group_thousands(&value.to_string())
}

/// Percentage with two decimals: 9.5 -> "9.50%"
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };

    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    format!("{}{}", sign, result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(-1234), "-1,234");
        assert_eq!(format_count(-123), "-123");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(9.5), "9.50%");
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_percent(100.0), "100.00%");
    }
}
