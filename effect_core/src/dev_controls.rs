// Developer timeline: query-flag detection and slider mapping.

pub const PANEL_ID: &str = "dev-controls";
pub const SLIDER_ID: &str = "timeline-slider";
pub const LABEL_ID: &str = "progress-value";

/// True when `key` is present in a `location.search` style query string, with or without a value.
pub fn has_query_flag(search: &str, key: &str) -> bool {
    let search = search.strip_prefix('?').unwrap_or(search);
    if search.is_empty() || key.is_empty() {
        return false;
    }
    search
        .split('&')
        .map(|part| part.split_once('=').map_or(part, |(k, _)| k))
        .any(|k| k == key)
}

/// Slider position (0-100) to progress (0.0-1.0). Values outside the range pass through unclamped;
/// the shaders clamp per cell.
pub fn slider_to_progress(raw: &str) -> Option<f32> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((value / 100.0) as f32)
}

/// Label text for a progress value, e.g. `"50%"`.
pub fn progress_label(progress: f32) -> String {
    format!("{}%", (progress as f64 * 100.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_flag_forms() {
        assert!(has_query_flag("?dev", "dev"));
        assert!(has_query_flag("?a=1&dev=true", "dev"));
        assert!(has_query_flag("dev=", "dev"));
        assert!(!has_query_flag("?developer=1", "dev"));
        assert!(!has_query_flag("", "dev"));
        assert!(!has_query_flag("?a=dev", "dev"));
    }

    #[test]
    fn slider_maps_linearly() {
        assert_eq!(slider_to_progress("50"), Some(0.5));
        assert_eq!(slider_to_progress("0"), Some(0.0));
        assert_eq!(slider_to_progress("100"), Some(1.0));
        assert_eq!(slider_to_progress("abc"), None);
        assert_eq!(slider_to_progress("NaN"), None);
    }

    #[test]
    fn label_rounds_percentage() {
        assert_eq!(progress_label(0.5), "50%");
        assert_eq!(progress_label(0.333), "33%");
        assert_eq!(progress_label(1.0), "100%");
    }
}
