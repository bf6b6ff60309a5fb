//! Minimal WordprocessingML (DOCX) packaging.
//!
//! The package holds only the three parts Word needs to open a document:
//! content types, the package relationships and `word/document.xml`.

use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

// A4 with one-inch margins, in twentieths of a point
const DOCUMENT_TAIL: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

/// Font and direction settings applied to every run.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStyle {
    pub font_name: String,
    /// Body font size in points.
    pub font_size: u32,
    /// Title and heading font size in points.
    pub heading_size: u32,
    pub rtl: bool,
}

impl Default for DocumentStyle {
    fn default() -> Self {
        Self {
            font_name: "Times New Roman".to_string(),
            font_size: 12,
            heading_size: 16,
            rtl: false,
        }
    }
}

#[derive(Clone, Copy)]
enum Block {
    Title,
    Heading,
    Body,
}

/// Builds a DOCX package with `title` as a heading followed by `text`.
///
/// Paragraphs are separated by blank lines; a paragraph whose first line
/// starts with `#` begins with a heading. The ZIP entries carry a fixed
/// timestamp so equal input produces byte-identical output.
pub fn render_docx(text: &str, title: &str, style: &DocumentStyle) -> ZipResult<Vec<u8>> {
    let document = document_xml(text, title, style);

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", document.as_str()),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

fn document_xml(text: &str, title: &str, style: &DocumentStyle) -> String {
    let mut xml = String::from(DOCUMENT_HEAD);

    if !title.trim().is_empty() {
        push_paragraph(&mut xml, Block::Title, &[title.trim()], style);
    }

    for block in split_paragraphs(text) {
        let (first, rest) = (block[0], &block[1..]);
        if first.trim_start().starts_with('#') {
            let heading = first.trim_start().trim_start_matches('#').trim();
            push_paragraph(&mut xml, Block::Heading, &[heading], style);
            if !rest.is_empty() {
                push_paragraph(&mut xml, Block::Body, rest, style);
            }
        } else {
            push_paragraph(&mut xml, Block::Body, &block, style);
        }
    }

    xml.push_str(DOCUMENT_TAIL);
    xml
}

/// Groups non-blank lines into paragraphs separated by blank lines.
fn split_paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim_end());
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

fn push_paragraph(xml: &mut String, block: Block, lines: &[&str], style: &DocumentStyle) {
    let justification = match (block, style.rtl) {
        (_, true) => "right",
        (Block::Title, false) => "center",
        (Block::Heading, false) => "left",
        (Block::Body, false) => "both",
    };
    let (bold, size) = match block {
        Block::Title | Block::Heading => (true, style.heading_size),
        Block::Body => (false, style.font_size),
    };
    let font = escape(style.font_name.as_str());
    // Half-points
    let size = size * 2;

    xml.push_str("<w:p><w:pPr>");
    if style.rtl {
        xml.push_str("<w:bidi/>");
    }
    let _ = write!(xml, r#"<w:jc w:val="{justification}"/></w:pPr><w:r><w:rPr>"#);
    let _ = write!(
        xml,
        r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
    );
    if bold {
        xml.push_str("<w:b/><w:bCs/>");
    }
    let _ = write!(xml, r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#);
    if style.rtl {
        xml.push_str("<w:rtl/>");
    }
    xml.push_str("</w:rPr>");

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        let _ = write!(
            xml,
            r#"<w:t xml:space="preserve">{}</w:t>"#,
            escape(xml_safe(line).as_str())
        );
    }

    xml.push_str("</w:r></w:p>");
}

/// Drops characters that are not allowed in XML 1.0 (e.g. form feeds from PDFs).
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || (c >= '\u{20}' && c != '\u{FFFE}' && c != '\u{FFFF}')
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_document(bytes: Vec<u8>) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut document = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut document)
            .unwrap();
        document
    }

    #[test]
    fn test_package_contains_required_parts() {
        let bytes = render_docx("Body", "Title", &DocumentStyle::default()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        assert!(archive.by_name("[Content_Types].xml").is_ok());
        assert!(archive.by_name("_rels/.rels").is_ok());
        assert!(archive.by_name("word/document.xml").is_ok());
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let text = "First line\nsame paragraph\n\n\nSecond paragraph\n   \nThird";
        let document = read_document(render_docx(text, "", &DocumentStyle::default()).unwrap());

        assert_eq!(document.matches("<w:p>").count(), 3);
        assert!(document.contains(
            r#"First line</w:t><w:br/><w:t xml:space="preserve">same paragraph"#
        ));
    }

    #[test]
    fn test_title_and_headings() {
        let text = "## Introduction\nBody text";
        let document =
            read_document(render_docx(text, "paper", &DocumentStyle::default()).unwrap());

        assert!(document.contains(r#"<w:jc w:val="center"/>"#));
        assert!(document.contains(">paper</w:t>"));
        assert!(document.contains(">Introduction</w:t>"));
        assert!(document.contains(">Body text</w:t>"));
        assert!(!document.contains("##"));
        assert_eq!(document.matches("<w:b/>").count(), 2);
    }

    #[test]
    fn test_text_is_escaped() {
        let document = read_document(
            render_docx("a < b & c\u{c}", "", &DocumentStyle::default()).unwrap(),
        );
        assert!(document.contains("a &lt; b &amp; c</w:t>"));
    }

    #[test]
    fn test_rtl_paragraphs() {
        let style = DocumentStyle {
            rtl: true,
            ..DocumentStyle::default()
        };
        let document = read_document(render_docx("متن", "عنوان", &style).unwrap());

        assert_eq!(document.matches("<w:bidi/>").count(), 2);
        assert!(document.contains("<w:rtl/>"));
        assert!(!document.contains(r#"<w:jc w:val="center"/>"#));
    }

    #[test]
    fn test_font_settings() {
        let style = DocumentStyle {
            font_name: "B Nazanin".to_string(),
            font_size: 13,
            heading_size: 16,
            rtl: false,
        };
        let document = read_document(render_docx("text", "title", &style).unwrap());

        assert!(document.contains(r#"w:ascii="B Nazanin""#));
        assert!(document.contains(r#"<w:sz w:val="26"/>"#));
        assert!(document.contains(r#"<w:sz w:val="32"/>"#));
    }

    #[test]
    fn test_output_is_deterministic() {
        let style = DocumentStyle::default();
        let first = render_docx("Same text\n\nTwice", "t", &style).unwrap();
        let second = render_docx("Same text\n\nTwice", "t", &style).unwrap();
        assert_eq!(first, second);
    }
}
