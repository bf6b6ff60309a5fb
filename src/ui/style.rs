//! Consistent styling utilities for CLI output.
//!
//! Provides color and formatting helpers using owo-colors. Colors are only
//! applied when the target stream supports them, so piped output stays plain.
//! The run summary goes to stdout; per-file status lines go to stderr.

use owo_colors::{OwoColorize, Stream};
use std::fmt::Display;

/// Styles for different semantic elements.
pub struct Style;

impl Style {
    /// Style for section headers in the run summary
    pub fn header<T: Display>(text: T) -> String {
        format!("{}", text.if_supports_color(Stream::Stdout, |t| t.bold()))
    }

    /// Style for summary labels (e.g., "Successful", "Translations")
    pub fn label<T: Display>(text: T) -> String {
        format!("{}", text.if_supports_color(Stream::Stdout, |t| t.dimmed()))
    }

    /// Style for summary values
    pub fn value<T: Display>(text: T) -> String {
        format!("{}", text.if_supports_color(Stream::Stdout, |t| t.cyan()))
    }

    /// Style for the banner and other secondary info on stderr
    pub fn secondary<T: Display>(text: T) -> String {
        format!("{}", text.if_supports_color(Stream::Stderr, |t| t.dimmed()))
    }

    /// Style for success status lines
    pub fn success<T: Display>(text: T) -> String {
        format!("{}", text.if_supports_color(Stream::Stderr, |t| t.green()))
    }

    /// Style for failure status lines
    pub fn error<T: Display>(text: T) -> String {
        let style = owo_colors::Style::new().red().bold();
        format!("{}", text.if_supports_color(Stream::Stderr, |t| t.style(style)))
    }

    /// Style for skip status lines
    pub fn warning<T: Display>(text: T) -> String {
        format!("{}", text.if_supports_color(Stream::Stderr, |t| t.yellow()))
    }
}
