//! Non-HTML document extraction: PDF, DOCX, TXT, MD.
//!
//! `pdf-extract` and `docx-rs` have no analog in the teacher (which only
//! ever ingests HTML); sourced from the retrieval pack's other example
//! repos that build RAG pipelines over uploaded documents.

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};
use unicode_normalization::UnicodeNormalization;

use crate::error::{ExtractError, ExtractResult};

use super::{normalize_whitespace, Extracted};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Doc,
    Txt,
    Md,
    Csv,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "docx" => Some(FileKind::Docx),
            "doc" => Some(FileKind::Doc),
            "txt" => Some(FileKind::Txt),
            "md" => Some(FileKind::Md),
            "csv" => Some(FileKind::Csv),
            _ => None,
        }
    }
}

pub fn extract_file(bytes: &[u8], kind: FileKind) -> ExtractResult<Extracted> {
    let text = match kind {
        FileKind::Pdf => extract_pdf(bytes)?,
        FileKind::Docx => extract_docx(bytes)?,
        FileKind::Doc => {
            return Err(ExtractError::UnsupportedType(
                "legacy .doc binary format is not supported, convert to .docx".into(),
            ))
        }
        FileKind::Txt | FileKind::Md | FileKind::Csv => extract_plain_text(bytes)?,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::ExtractionFailed(format!("{kind:?}")));
    }

    Ok(Extracted {
        title: None,
        text: normalize_whitespace(&text),
        outlinks: Vec::new(),
    })
}

fn extract_pdf(bytes: &[u8]) -> ExtractResult<String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Decode(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> ExtractResult<String> {
    let docx = read_docx(bytes).map_err(|e| ExtractError::Decode(e.to_string()))?;

    let mut text = String::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            for p_child in &paragraph.children {
                if let ParagraphChild::Run(run) = p_child {
                    for r_child in &run.children {
                        if let RunChild::Text(t) = r_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

fn extract_plain_text(bytes: &[u8]) -> ExtractResult<String> {
    let raw = String::from_utf8(bytes.to_vec()).map_err(|e| ExtractError::Decode(e.to_string()))?;
    Ok(raw.nfc().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_nfc_normalized() {
        let decomposed = "e\u{0301}cole"; // e + combining acute
        let extracted = extract_file(decomposed.as_bytes(), FileKind::Txt).unwrap();
        assert_eq!(extracted.text, "\u{00e9}cole");
    }

    #[test]
    fn empty_text_file_fails() {
        assert!(extract_file(b"   \n\t  ", FileKind::Txt).is_err());
    }

    #[test]
    fn file_kind_from_extension() {
        assert_eq!(FileKind::from_extension("PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_extension("docx"), Some(FileKind::Docx));
        assert_eq!(FileKind::from_extension("exe"), None);
    }
}
