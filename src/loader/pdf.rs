//! PDF text extraction
//!
//! Page text comes out of `lopdf` in page order. Pages without text
//! (scanned images, empty content streams) contribute no lines.

use crate::error::QaError;
use crate::models::{ExtractedContent, TextStatus};
use crate::Result;
use lopdf::Document;

pub fn extract(bytes: &[u8]) -> Result<ExtractedContent> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| QaError::CorruptDocument(format!("failed to parse PDF: {}", e)))?;

    if doc.is_encrypted() {
        return Err(QaError::CorruptDocument(
            "PDF is password protected".to_string(),
        ));
    }

    let mut lines = Vec::new();
    let mut anomalies = Vec::new();
    let mut pages_with_text = 0usize;

    // get_pages is a BTreeMap keyed by page number, so iteration is in page order
    for (page_num, _page_id) in doc.get_pages() {
        let text = match doc.extract_text(&[page_num]) {
            Ok(text) => text,
            Err(e) => {
                anomalies.push(format!("page {}: text extraction failed: {}", page_num, e));
                continue;
            }
        };

        let before = lines.len();
        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );

        if lines.len() == before {
            anomalies.push(format!("page {}: no extractable text", page_num));
        } else {
            pages_with_text += 1;
        }
    }

    let status = if pages_with_text == 0 {
        TextStatus::NoTextExtracted
    } else {
        TextStatus::Extracted
    };

    Ok(ExtractedContent {
        lines,
        sheets: None,
        status,
        anomalies,
    })
}

/// Build a minimal PDF with one text line per `BT`/`ET` block
#[cfg(test)]
pub(crate) fn build_test_pdf(pages: &[Vec<&str>]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page_lines in pages {
        let mut operations = Vec::new();
        for (i, line) in page_lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new(
                "Td",
                vec![72.into(), (760 - 20 * i as i64).into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content encodes"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("pdf saves");
    buffer
}
