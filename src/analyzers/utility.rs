/// Computes the arithmetic mean of a slice of values. Returns `None` for empty
/// input rather than a misleading zero.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Rounds to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_values() {
        assert_eq!(mean(&[2.0]), Some(2.0));
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(87.456), 87.46);
        assert_eq!(round2(87.454), 87.45);
        assert_eq!(round2(-1.005_1), -1.01);
        assert_eq!(round2(100.0), 100.0);
    }
}
