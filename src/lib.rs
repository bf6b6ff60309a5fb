//! # papertrans - Batch Paper Translation and Summarization
//!
//! `papertrans` walks a directory of academic papers, extracts their text,
//! sends it to an OpenAI-compatible chat-completion endpoint with a
//! translation and/or summarization prompt, and writes the results as DOCX,
//! LaTeX, Markdown or plain text into output trees that mirror the input.
//!
//! ## Quick Start
//!
//! ```bash
//! # Use ./config.yaml (or ~/.config/papertrans/config.yaml)
//! papertrans
//!
//! # Explicit config, translation only, into Persian
//! papertrans papers.yaml --mode translate --to Persian
//! ```
//!
//! ## Configuration
//!
//! ```yaml
//! api:
//!   base_url: "https://api.openai.com/v1"
//!   api_key_env: "OPENAI_API_KEY"
//!   model: "gpt-4o-mini"
//! processing:
//!   mode: "both"
//!   file_types: ["pdf"]
//!   output_language: "French"
//!   output_format: "docx"
//! paths:
//!   input_dir: "./papers"
//!   translate_dir: "./translates"
//!   summarize_dir: "./summaries"
//! ```

/// Command-line interface definitions and handlers.
pub mod cli;

/// Configuration file loading and resolution.
pub mod config;

/// Recursive discovery of input files.
pub mod discovery;

/// Text extraction from PDFs and plain files.
pub mod extract;

/// File system utilities.
pub mod fs;

/// Prompt templates and the chat-completion client.
pub mod generation;

/// Right-to-left language detection.
pub mod language;

/// XDG-style path utilities for the configuration file.
pub mod paths;

/// Per-file orchestration and run statistics.
pub mod pipeline;

/// Task kinds and processing modes.
pub mod task;

/// Terminal UI components (progress bar, colors).
pub mod ui;

/// Output formats and file writing.
pub mod writer;
