//! Shared fixtures for integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use papertrans::config::{Config, ConfigFile, ResolveOptions, resolve_config};
use papertrans::generation::{CompletionBackend, CompletionRequest, LlmError};
use std::fs;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Writes a PDF with one page per entry; an empty entry yields a page with no text.
pub fn write_pdf(path: &Path, pages: &[&str]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            vec![]
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Resolves a config rooted in `root`: input under `root/in`, outputs under
/// `root/translates` and `root/summaries`. `extra` is appended YAML.
pub fn config_in(root: &Path, extra: &str) -> Config {
    let yaml = format!(
        "api:\n  api_key: test-key\n  model: stub-model\n\
         paths:\n  input_dir: {in_dir}\n  translate_dir: {t}\n  summarize_dir: {s}\n\
         prompts:\n  translation: \"TRANSLATE to {{output_language}}: {{content}}\"\n  summarization: \"SUMMARIZE: {{content}}\"\n\
         {extra}",
        in_dir = root.join("in").display(),
        t = root.join("translates").display(),
        s = root.join("summaries").display(),
    );
    resolve_config(&ResolveOptions::default(), &ConfigFile::from_yaml(&yaml).unwrap()).unwrap()
}

/// Deterministic backend: answers by prompt prefix and counts calls.
///
/// A prompt starting with a prefix in `failures` gets the matching error.
#[derive(Default)]
pub struct StubBackend {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    failures: Vec<(&'static str, LlmError)>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(prefix: &'static str, error: LlmError) -> Self {
        Self {
            failures: vec![(prefix, error)],
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl CompletionBackend for StubBackend {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(request.prompt.clone());

            if let Some((_, error)) = self
                .failures
                .iter()
                .find(|(prefix, _)| request.prompt.starts_with(prefix))
            {
                return Err(error.clone());
            }

            let kind = if request.prompt.starts_with("TRANSLATE") {
                "translation"
            } else {
                "summary"
            };
            let body_len = request.prompt.chars().count();
            Ok(format!("stub {kind} ({body_len} chars)"))
        })
    }
}
