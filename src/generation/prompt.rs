//! Prompt templates with validated placeholder substitution.
//!
//! Templates use `{content}` for the extracted text and `{output_language}`
//! for the target language. `{{` and `}}` produce literal braces. Any other
//! `{identifier}` is rejected when the template is parsed so that a typo in
//! the configuration fails before the first file is processed.

use thiserror::Error;

use crate::task::TaskKind;

pub const CONTENT_PLACEHOLDER: &str = "content";
pub const LANGUAGE_PLACEHOLDER: &str = "output_language";

pub const DEFAULT_TRANSLATION_PROMPT: &str = "You are an expert academic translator. \
     Translate the following academic paper into {output_language}. \
     Preserve the structure, headings, equations, citations and technical terminology. \
     Output only the translated text without any explanations.\n\n{content}";

pub const DEFAULT_SUMMARIZATION_PROMPT: &str = "You are an expert academic reviewer. \
     Write a structured summary of the following academic paper in {output_language}, \
     covering the research problem, methodology, key findings and conclusions. \
     Output only the summary.\n\n{content}";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("{task} prompt template is missing the {{content}} placeholder")]
    MissingContent { task: TaskKind },

    #[error("{task} prompt template contains unknown placeholder {{{name}}}")]
    UnknownPlaceholder { task: TaskKind, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Content,
    Language,
}

/// A parsed prompt template for one task kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    task: TaskKind,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parses and validates `template`.
    pub fn parse(task: TaskKind, template: &str) -> Result<Self, PromptError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(pos) = rest.find(['{', '}']) {
            literal.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") || tail.starts_with("}}") {
                literal.push_str(&tail[..1]);
                rest = &tail[2..];
                continue;
            }

            if let Some(name) = placeholder_name(tail) {
                let segment = match name {
                    CONTENT_PLACEHOLDER => Segment::Content,
                    LANGUAGE_PLACEHOLDER => Segment::Language,
                    _ => {
                        return Err(PromptError::UnknownPlaceholder {
                            task,
                            name: name.to_string(),
                        });
                    }
                };
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment);
                rest = &tail[name.len() + 2..];
                continue;
            }

            // Lone brace that does not open a placeholder
            literal.push_str(&tail[..1]);
            rest = &tail[1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.contains(&Segment::Content) {
            return Err(PromptError::MissingContent { task });
        }

        Ok(Self { task, segments })
    }

    pub const fn task(&self) -> TaskKind {
        self.task
    }

    /// Substitutes `content` and `output_language` into the template.
    pub fn render(&self, content: &str, output_language: &str) -> String {
        let mut prompt = String::with_capacity(content.len() + 256);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => prompt.push_str(text),
                Segment::Content => prompt.push_str(content),
                Segment::Language => prompt.push_str(output_language),
            }
        }
        prompt
    }
}

/// Returns the identifier of a `{identifier}` at the start of `text`.
fn placeholder_name(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('{')?;
    let end = inner.find('}')?;
    let name = &inner[..end];

    let mut chars = name.chars();
    let first = chars.next()?;
    if (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some(name)
    } else {
        None
    }
}
