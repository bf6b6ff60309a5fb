mod client;
mod prompt;

pub use client::{
    CompletionBackend, CompletionRequest, LlmClient, LlmError, RetryPolicy, parse_completion,
};
pub use prompt::{
    CONTENT_PLACEHOLDER, DEFAULT_SUMMARIZATION_PROMPT, DEFAULT_TRANSLATION_PROMPT,
    LANGUAGE_PLACEHOLDER, PromptError, PromptTemplate,
};
