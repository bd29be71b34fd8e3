//! Logging output formats.

use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable single line output.
    #[default]
    Compact,
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("compact", LogFormat::Compact)]
    #[case("JSON", LogFormat::Json)]
    #[case("Json", LogFormat::Json)]
    fn parses_case_insensitively(#[case] text: &str, #[case] expected: LogFormat) {
        assert_eq!(text.parse::<LogFormat>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "pretty".parse::<LogFormat>().expect_err("unknown format");
        assert_eq!(err, strum::ParseError::VariantNotFound);
    }

    #[test]
    fn displays_snake_case() {
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
