use lopdf::Document;
use std::cell::Cell;
use std::panic::{self, UnwindSafe};
use std::path::Path;
use std::sync::Once;

use super::ExtractionError;

/// Placeholder emitted for a page that has no text layer.
pub const NO_TEXT_MARKER: &str = "[No extractable text]";

/// Extracts the text layer of a PDF, one `--- Page N ---` section per page.
///
/// Fails with [`ExtractionError::NoText`] when no page carries any text, so a
/// scanned document is reported instead of yielding a file of page markers.
pub fn extract_pdf_text(path: &Path) -> Result<String, ExtractionError> {
    // lopdf can panic on malformed cross-reference tables
    catch_parser_panic(|| extract_pages(path))
        .unwrap_or_else(|reason| Err(ExtractionError::Corrupt(reason)))
}

thread_local! {
    static PARSER_PANIC_QUIET: Cell<bool> = const { Cell::new(false) };
}

static QUIET_PANIC_HOOK: Once = Once::new();

/// Runs `f`, turning a panic into `Err` with the panic message.
///
/// The first call wraps the process panic hook once. While `f` runs on this
/// thread the wrapper logs the panic at debug level instead of printing it;
/// panics anywhere else still reach the previous hook.
fn catch_parser_panic<T>(f: impl FnOnce() -> T + UnwindSafe) -> Result<T, String> {
    QUIET_PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if PARSER_PANIC_QUIET.with(Cell::get) {
                tracing::debug!(panic = %info, "pdf parser panicked");
            } else {
                previous(info);
            }
        }));
    });

    PARSER_PANIC_QUIET.with(|quiet| quiet.set(true));
    let result = panic::catch_unwind(f);
    PARSER_PANIC_QUIET.with(|quiet| quiet.set(false));

    result.map_err(|payload| {
        payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "parser panicked".to_string())
    })
}

fn extract_pages(path: &Path) -> Result<String, ExtractionError> {
    let document = Document::load(path).map_err(|e| match e {
        lopdf::Error::IO(io) => ExtractionError::Io(io.to_string()),
        other => ExtractionError::Corrupt(other.to_string()),
    })?;

    let mut sections = Vec::new();
    let mut has_text = false;

    for page_number in document.get_pages().into_keys() {
        let page_text = match document.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    page = page_number,
                    error = %e,
                    "failed to extract page text"
                );
                String::new()
            }
        };

        let page_text = page_text.trim();
        if page_text.is_empty() {
            sections.push(format!("--- Page {page_number} ---\n{NO_TEXT_MARKER}"));
        } else {
            has_text = true;
            sections.push(format!("--- Page {page_number} ---\n{page_text}"));
        }
    }

    if !has_text {
        return Err(ExtractionError::NoText);
    }

    Ok(sections.join("\n\n"))
}
