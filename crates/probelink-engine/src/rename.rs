use std::collections::HashMap;

use thiserror::Error;

/// Template execution failure, mirroring the original template engine's
/// error-on-unknown-field behavior (an unclosed `{{` is just as malformed).
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unknown placeholder {0:?}")]
    UnknownPlaceholder(String),
    #[error("unclosed {{{{ in template")]
    UnclosedBrace,
}

/// Derives the flag glyph for a two-letter ISO country code from the
/// Unicode regional indicator symbols, rather than a hardcoded table --
/// any alphabetic two-letter code renders correctly, and anything else
/// falls back to the neutral white flag.
fn flag_for(country_code: &str) -> String {
    let upper = country_code.to_ascii_uppercase();
    let mut chars = upper.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(a), Some(b), None) if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
            let regional = |c: char| {
                char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)).expect("valid regional indicator")
            };
            [regional(a), regional(b)].iter().collect()
        }
        _ => "\u{1F3F3}\u{FE0F}".to_owned(), // 🏳️
    }
}

/// Data plugged into a rename template.
#[derive(Debug, Clone)]
pub struct NodeNameData {
    pub flag: String,
    pub country_code: String,
    pub index: String,
    pub direction: String,
    pub speed: String,
    pub download_speed_mbps: String,
    pub upload_speed_mbps: String,
}

const DOWN_ARROW: &str = "\u{2193}";
const UP_ARROW: &str = "\u{2191}";

fn format_mbps(bytes_per_sec: f64) -> String {
    format!("{:.2}", bytes_per_sec / (1024.0 * 1024.0))
}

/// Builds the template data for one rename, mutating `counts` for the
/// country code's monotonic index. Mirrors the original's
/// `buildNodeNameData`: the "active" speed (shown via `{{Speed}}` and
/// `{{Direction}}`) is the download speed when positive, otherwise the
/// upload speed -- but `{{DownloadSpeedMBps}}`/`{{UploadSpeedMBps}}` always
/// report the raw, direction-independent values.
pub fn build_node_name_data(
    country_code: &str,
    download_bps: f64,
    upload_bps: f64,
    counts: &mut HashMap<String, u32>,
) -> NodeNameData {
    let upper_cc = country_code.to_ascii_uppercase();
    let flag = flag_for(&upper_cc);

    let (direction, speed) = if download_bps > 0.0 {
        (DOWN_ARROW.to_owned(), download_bps)
    } else {
        (UP_ARROW.to_owned(), upload_bps)
    };

    let count = counts.entry(upper_cc.clone()).or_insert(0);
    *count += 1;
    let index = format!("{count:03}");

    NodeNameData {
        flag,
        country_code: upper_cc,
        index,
        direction,
        speed: format_mbps(speed),
        download_speed_mbps: format_mbps(download_bps),
        upload_speed_mbps: format_mbps(upload_bps),
    }
}

/// Expands a `{{Placeholder}}`-style template against `data`. Matches the
/// original template engine: an unrecognized placeholder or an unclosed
/// `{{` is a hard execute failure, not a silently-blanked field.
pub fn expand_template(template: &str, data: &NodeNameData) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            while let Some(&next) = chars.peek() {
                if next == '}' {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        closed = true;
                    }
                    break;
                }
                name.push(next);
                chars.next();
            }

            if !closed {
                return Err(TemplateError::UnclosedBrace);
            }
            output.push_str(resolve_placeholder(&name, data)?);
        } else {
            output.push(c);
        }
    }

    Ok(output)
}

fn resolve_placeholder<'a>(name: &str, data: &'a NodeNameData) -> Result<&'a str, TemplateError> {
    match name {
        "Flag" => Ok(&data.flag),
        "CountryCode" => Ok(&data.country_code),
        "Index" => Ok(&data.index),
        "Direction" => Ok(&data.direction),
        "Speed" => Ok(&data.speed),
        "DownloadSpeedMBps" => Ok(&data.download_speed_mbps),
        "UploadSpeedMBps" => Ok(&data.upload_speed_mbps),
        _ => Err(TemplateError::UnknownPlaceholder(name.to_owned())),
    }
}

/// Renders a node name for `country_code` given the two raw throughputs
/// (bytes/sec), mutating `counts` for the monotonic per-country index. The
/// count is incremented exactly once per call, regardless of whether
/// `template` expands cleanly: on a template execute failure, falls back to
/// [`crate::config::DEFAULT_RENAME_TEMPLATE`] against that same data.
pub fn rename_node(
    country_code: &str,
    download_bps: f64,
    upload_bps: f64,
    counts: &mut HashMap<String, u32>,
    template: &str,
) -> String {
    let data = build_node_name_data(country_code, download_bps, upload_bps, counts);
    expand_template(template, &data).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "rename template execute failed, falling back to default format");
        expand_template(crate::config::DEFAULT_RENAME_TEMPLATE, &data)
            .expect("default rename template always resolves")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RENAME_TEMPLATE;

    #[test]
    fn flag_for_known_code_is_regional_indicators() {
        assert_eq!(flag_for("us"), "\u{1F1FA}\u{1F1F8}");
    }

    #[test]
    fn flag_for_unknown_code_is_neutral() {
        assert_eq!(flag_for("???"), "\u{1F3F3}\u{FE0F}");
    }

    #[test]
    fn monotonic_index_per_country() {
        let mut counts = HashMap::new();
        let first = rename_node("US", 10.0 * 1024.0 * 1024.0, 0.0, &mut counts, DEFAULT_RENAME_TEMPLATE);
        assert!(first.contains(" US 001 "));
        assert!(first.contains("10.00MB/s"));

        let second = rename_node("US", 10.0 * 1024.0 * 1024.0, 0.0, &mut counts, DEFAULT_RENAME_TEMPLATE);
        assert!(second.contains(" US 002 "));

        let third = rename_node("JP", 0.0, 8.0 * 1024.0 * 1024.0, &mut counts, DEFAULT_RENAME_TEMPLATE);
        assert!(third.contains(" JP 001 "));
        assert!(third.contains("8.00MB/s"));
        assert!(third.contains(UP_ARROW));
    }

    #[test]
    fn download_positive_uses_down_arrow() {
        let mut counts = HashMap::new();
        let name = rename_node("DE", 1.0, 0.0, &mut counts, DEFAULT_RENAME_TEMPLATE);
        assert!(name.contains(DOWN_ARROW));
    }

    #[test]
    fn unknown_placeholder_fails_execution() {
        let mut counts = HashMap::new();
        let data = build_node_name_data("US", 1.0, 0.0, &mut counts);
        let err = expand_template("{{Nope}}", &data).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownPlaceholder(name) if name == "Nope"));
    }

    #[test]
    fn unclosed_brace_fails_execution() {
        let mut counts = HashMap::new();
        let data = build_node_name_data("US", 1.0, 0.0, &mut counts);
        let err = expand_template("{{Flag", &data).unwrap_err();
        assert!(matches!(err, TemplateError::UnclosedBrace));
    }

    #[test]
    fn bad_template_falls_back_to_default_without_double_incrementing() {
        let mut counts = HashMap::new();
        let name = rename_node("US", 10.0 * 1024.0 * 1024.0, 0.0, &mut counts, "{{Nope}}");
        assert!(name.contains(" US 001 "));
        assert_eq!(counts.get("US"), Some(&1));

        let second = rename_node("US", 10.0 * 1024.0 * 1024.0, 0.0, &mut counts, DEFAULT_RENAME_TEMPLATE);
        assert!(second.contains(" US 002 "));
    }
}
