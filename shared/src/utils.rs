// Formatting helpers shared by every report surface.

/// Two-decimal price, or `n/a` while an indicator is still warming up.
pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(4550.0)), "4550.00");
        assert_eq!(format_price(Some(4510.126)), "4510.13");
        assert_eq!(format_price(None), "n/a");
        assert_eq!(format_price(Some(f64::NAN)), "n/a");
    }
}
