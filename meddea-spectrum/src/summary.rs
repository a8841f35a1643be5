//! Helpers for the one-line text summaries of the containers.

use meddea_core::Timestamp;

/// Formats an integer with comma thousands separators.
pub(crate) fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `"<start> - <end> (<span> s)"`, or `None` for an empty time column.
pub(crate) fn time_span(time: &[Timestamp]) -> Option<String> {
    let first = time.first()?;
    let last = time.last()?;
    Some(format!(
        "{first} - {last} ({:.3} s)",
        last.seconds_since(*first)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_time_span() {
        assert_eq!(time_span(&[]), None);
        let span = time_span(&[Timestamp(1.0), Timestamp(3.5)]).unwrap();
        assert_eq!(span, "1.000000 s - 3.500000 s (2.500 s)");
    }
}
