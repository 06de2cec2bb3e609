//! Pure path and naming helpers shared by the pipeline stages.
//!
//! Destination paths are manipulated as forward-slash strings because that
//! is the form the metadata store records; `PathBuf` only appears at the
//! filesystem boundary.

use chrono::{DateTime, Local};

/// Timestamp layout prefixed to stored file names. Second precision is
/// enough because the identifier token already disambiguates documents.
pub const STORED_NAME_TIMESTAMP: &str = "%d%m%Y%H%M%S";

/// Split a path string on `/` and `\`, dropping empty segments.
#[must_use]
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Rewrite every character outside `[A-Za-z0-9_-]` to `_`.
///
/// `None` sanitizes to the empty string; [`path_segment`] is the
/// placeholder-aware form used for destination paths.
#[must_use]
pub fn sanitize(value: Option<&str>) -> String {
    value.map_or_else(String::new, |value| {
        value
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    })
}

/// Render a classification name as a destination path segment. Names that
/// sanitize to nothing become a `_` placeholder so the chain keeps its full
/// depth.
#[must_use]
pub fn path_segment(value: Option<&str>) -> String {
    let sanitized = sanitize(value);
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

/// Extract the identifier token from a staged file name: the stem before the
/// final extension, truncated at the first `-`. Identifier tokens never
/// contain `-`, so everything after the first dash belongs to the original
/// name.
#[must_use]
pub fn extract_token(file_name: &str) -> Option<String> {
    let stem = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
    let token = stem.split_once('-').map_or(stem, |(token, _)| token);
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Recover the original file name by stripping the identifier token and its
/// dash. A name without a dash is kept whole.
#[must_use]
pub fn original_name(file_name: &str) -> String {
    file_name
        .split_once('-')
        .map_or(file_name, |(_, rest)| rest)
        .to_string()
}

/// Compose the name a file carries at its destination:
/// `<timestamp>-<original name>`.
#[must_use]
pub fn stored_file_name(original: &str, now: &DateTime<Local>) -> String {
    format!("{}-{}", now.format(STORED_NAME_TIMESTAMP), original)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn split_segments_handles_mixed_separators() {
        assert_eq!(
            split_segments("/base\\HR_Docs//Payroll"),
            vec!["base", "HR_Docs", "Payroll"]
        );
        assert!(split_segments("///").is_empty());
    }

    #[test]
    fn sanitize_rewrites_outside_the_allowed_alphabet() {
        assert_eq!(sanitize(Some("HR Docs")), "HR_Docs");
        assert_eq!(sanitize(Some("Payroll 2024")), "Payroll_2024");
        assert_eq!(sanitize(Some("a.b/c:d")), "a_b_c_d");
        assert_eq!(sanitize(Some("ok_name-1")), "ok_name-1");
        assert_eq!(sanitize(None), "");
    }

    #[test]
    fn path_segment_falls_back_to_a_placeholder() {
        assert_eq!(path_segment(Some("HR Docs")), "HR_Docs");
        assert_eq!(path_segment(Some("")), "_");
        assert_eq!(path_segment(None), "_");
    }

    #[test]
    fn extract_token_truncates_at_the_first_dash() {
        assert_eq!(extract_token("42-report.pdf"), Some("42".to_string()));
        assert_eq!(extract_token("42-annual-report.pdf"), Some("42".to_string()));
        assert_eq!(extract_token("42.pdf"), Some("42".to_string()));
        assert_eq!(extract_token("noext"), Some("noext".to_string()));
        assert_eq!(extract_token("-report.pdf"), None);
    }

    #[test]
    fn original_name_strips_the_token_prefix() {
        assert_eq!(original_name("42-report.pdf"), "report.pdf");
        assert_eq!(original_name("42-annual-report.pdf"), "annual-report.pdf");
        assert_eq!(original_name("report.pdf"), "report.pdf");
    }

    #[test]
    fn stored_file_name_prefixes_a_second_precision_timestamp() {
        let now = Local
            .with_ymd_and_hms(2024, 3, 7, 14, 5, 9)
            .single()
            .expect("unambiguous local time");
        assert_eq!(
            stored_file_name("report.pdf", &now),
            "07032024140509-report.pdf"
        );
    }
}
