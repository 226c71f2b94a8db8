//! Line protocol of the reader's host interface: one report per line,
//! `<channel><TAB><tag>` (a comma separator is accepted as well).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportParseError {
    #[error("empty report line")]
    Empty,

    #[error("report has no separator: {0:?}")]
    NoSeparator(String),

    #[error("bad channel id {channel:?}: {detail}")]
    BadChannel { channel: String, detail: String },

    #[error("report carries an empty tag id")]
    EmptyTag,
}

/// Parse one report line into a (channel, tag) pair.
///
/// Pure function; the session logs and skips lines this rejects.
pub fn parse_report(line: &str) -> Result<(u16, String), ReportParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ReportParseError::Empty);
    }

    let (channel, tag) = line
        .split_once('\t')
        .or_else(|| line.split_once(','))
        .ok_or_else(|| ReportParseError::NoSeparator(line.to_string()))?;

    let channel = channel.trim();
    let channel = channel
        .parse::<u16>()
        .map_err(|err| ReportParseError::BadChannel {
            channel: channel.to_string(),
            detail: err.to_string(),
        })?;

    let tag = tag.trim();
    if tag.is_empty() {
        return Err(ReportParseError::EmptyTag);
    }

    Ok((channel, tag.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tab_separated_report() {
        assert_eq!(parse_report("1\tE2000").expect("parse"), (1, "E2000".to_string()));
    }

    #[test]
    fn parses_comma_separated_report() {
        assert_eq!(parse_report("2,E2004711").expect("parse"), (2, "E2004711".to_string()));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            parse_report("  1\t E2000 \r").expect("parse"),
            (1, "E2000".to_string())
        );
    }

    #[test]
    fn rejects_empty_line() {
        assert_eq!(parse_report("   "), Err(ReportParseError::Empty));
    }

    #[test]
    fn rejects_line_without_separator() {
        assert!(matches!(
            parse_report("E2000"),
            Err(ReportParseError::NoSeparator(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_channel() {
        assert!(matches!(
            parse_report("one\tE2000"),
            Err(ReportParseError::BadChannel { .. })
        ));
    }

    #[test]
    fn rejects_missing_tag() {
        assert_eq!(parse_report("1\t  "), Err(ReportParseError::EmptyTag));
    }
}
