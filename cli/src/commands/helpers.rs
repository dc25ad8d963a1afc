use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday")),
        },
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s
            .char_indices()
            .nth(max.saturating_sub(3))
            .map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

/// Render a fixed-width text progress bar for a 0..=100 percent value.
pub(crate) fn progress_bar(percent: i64, width: usize) -> String {
    let percent = percent.clamp(0, 100);
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let filled = (percent as usize * width) / 100;
    let mut bar = String::with_capacity(width);
    for i in 0..width {
        bar.push(if i < filled { '█' } else { '░' });
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2026-03-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_tiny_max_does_not_panic() {
        assert_eq!(truncate("hello", 2), "...");
        assert_eq!(truncate("hello", 0), "...");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn test_truncate_utf8() {
        // Should not panic on multi-byte characters
        assert_eq!(truncate("Purée de carottes", 10), "Purée d...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0, 10), "░░░░░░░░░░");
        assert_eq!(progress_bar(100, 10), "██████████");
        assert_eq!(progress_bar(50, 10), "█████░░░░░");
        assert_eq!(progress_bar(250, 10), "██████████");
        assert_eq!(progress_bar(-5, 10), "░░░░░░░░░░");
    }
}
