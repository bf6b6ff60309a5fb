//! Generation task kinds and processing modes.

use serde::Deserialize;
use std::fmt;

/// One of the two independent generation pipelines a file may go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Translation,
    Summarization,
}

impl TaskKind {
    /// Past-tense verb used in console status lines.
    pub const fn done_label(self) -> &'static str {
        match self {
            Self::Translation => "Translated",
            Self::Summarization => "Summarized",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Translation => "translation",
            Self::Summarization => "summarization",
        })
    }
}

/// Which tasks a run performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    Translate,
    Summarize,
    #[default]
    Both,
}

impl ProcessingMode {
    /// Tasks in the fixed order they run for each file.
    pub const fn tasks(self) -> &'static [TaskKind] {
        match self {
            Self::Translate => &[TaskKind::Translation],
            Self::Summarize => &[TaskKind::Summarization],
            Self::Both => &[TaskKind::Translation, TaskKind::Summarization],
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "translate" => Some(Self::Translate),
            "summarize" => Some(Self::Summarize),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Translate => "translate",
            Self::Summarize => "summarize",
            Self::Both => "both",
        })
    }
}
