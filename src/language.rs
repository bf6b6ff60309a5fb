//! Output language handling and text direction detection.

use serde::Deserialize;

/// Right-to-left languages by code (ISO 639-1) and English name.
pub const RTL_LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("fa", "Persian"),
    ("fa", "Farsi"),
    ("he", "Hebrew"),
    ("ku", "Kurdish"),
    ("ps", "Pashto"),
    ("ur", "Urdu"),
];

/// Configured paragraph direction for generated documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    /// Decide from the output language.
    #[default]
    Auto,
    Ltr,
    Rtl,
}

impl TextDirection {
    /// Returns `true` when text in `output_language` should be laid out right-to-left.
    pub fn is_rtl(self, output_language: &str) -> bool {
        match self {
            Self::Rtl => true,
            Self::Ltr => false,
            Self::Auto => is_rtl_language(output_language),
        }
    }
}

/// Matches either an exact language code or a language name contained in
/// `language` (e.g. "Persian (Farsi)"), case-insensitively.
pub fn is_rtl_language(language: &str) -> bool {
    let language = language.trim().to_lowercase();
    if language.is_empty() {
        return false;
    }

    RTL_LANGUAGES
        .iter()
        .any(|(code, name)| language == *code || language.contains(&name.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtl_by_name() {
        assert!(is_rtl_language("Persian"));
        assert!(is_rtl_language("arabic"));
        assert!(is_rtl_language("Modern Hebrew"));
    }

    #[test]
    fn test_rtl_by_code() {
        assert!(is_rtl_language("fa"));
        assert!(is_rtl_language("UR"));
    }

    #[test]
    fn test_ltr_languages() {
        assert!(!is_rtl_language("French"));
        assert!(!is_rtl_language("ja"));
        assert!(!is_rtl_language(""));
        // Codes only match exactly, not as substrings
        assert!(!is_rtl_language("fr"));
    }

    #[test]
    fn test_explicit_direction_overrides_language() {
        assert!(TextDirection::Rtl.is_rtl("English"));
        assert!(!TextDirection::Ltr.is_rtl("Arabic"));
        assert!(TextDirection::Auto.is_rtl("Urdu"));
    }
}
