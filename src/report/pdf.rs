//! Minimal PDF writer for the reports: a centered title followed by numbered
//! lines, flowing onto new pages as needed. Text uses the built-in Helvetica
//! font with WinAnsi encoding, so no font files are embedded.

use crate::error::{PostsError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use tracing::info;

// US Letter, in points
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;

const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const LINE_SPACING: f32 = 1.2;

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

fn char_width(c: char, size: f32) -> f32 {
    let units = match c as u32 {
        code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
        _ => 556,
    };
    f32::from(units) * size / 1000.0
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(|c| char_width(c, size)).sum()
}

/// Encodes text for a WinAnsi font; characters outside it become `?`.
fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' | '\n' | '\r' => b' ',
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}

/// Greedy word wrap against the measured Helvetica width.
/// Words longer than the line are split by character.
fn wrap(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            if !current.is_empty() && text_width(&current, size) + char_width(c, size) > max_width {
                lines.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Accumulates text operations page by page.
struct PageFlow {
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl PageFlow {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn place(&mut self, text: &str, size: f32, x: f32) {
        let line_height = size * LINE_SPACING;
        if self.y - line_height < MARGIN {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
        }
        let baseline = self.y - size;
        if let Some(ops) = self.pages.last_mut() {
            ops.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), size.into()]),
                Operation::new("Td", vec![x.into(), baseline.into()]),
                Operation::new("Tj", vec![Object::string_literal(win_ansi_bytes(text))]),
                Operation::new("ET", vec![]),
            ]);
        }
        self.y -= line_height;
    }

    /// Vertical gap measured in lines of `size`.
    fn move_down(&mut self, lines: f32, size: f32) {
        self.y -= lines * size * LINE_SPACING;
    }
}

/// Lays out the report: centered title, then `1. ...`, `2. ...` lines.
fn layout(title: &str, lines: &[String]) -> Vec<Vec<Operation>> {
    let max_width = PAGE_WIDTH - 2.0 * MARGIN;
    let mut flow = PageFlow::new();

    for title_line in wrap(title, TITLE_SIZE, max_width) {
        let x = (PAGE_WIDTH - text_width(&title_line, TITLE_SIZE)) / 2.0;
        flow.place(&title_line, TITLE_SIZE, x);
    }
    flow.move_down(2.0, TITLE_SIZE);

    for (index, line) in lines.iter().enumerate() {
        let numbered = format!("{}. {}", index + 1, line);
        for wrapped in wrap(&numbered, BODY_SIZE, max_width) {
            flow.place(&wrapped, BODY_SIZE, MARGIN);
        }
        flow.move_down(0.5, BODY_SIZE);
    }

    flow.pages
}

fn build_document(pages: Vec<Vec<Operation>>) -> std::result::Result<Document, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                PAGE_WIDTH.into(),
                PAGE_HEIGHT.into(),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

/// Renders `title` and the numbered `lines` to a PDF at `path`, replacing any
/// existing file. Returns the number of pages written.
pub fn render_report(title: &str, lines: &[String], path: &Path) -> Result<usize> {
    let render_err = |message: String| PostsError::Render {
        path: path.to_path_buf(),
        message,
    };

    let pages = layout(title, lines);
    let page_count = pages.len();
    let mut doc = build_document(pages).map_err(|e| render_err(e.to_string()))?;
    doc.save(path).map_err(|e| render_err(e.to_string()))?;

    info!("PDF report written: {} ({} pages)", path.display(), page_count);
    Ok(page_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let lines = wrap(text, BODY_SIZE, 100.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width(l, BODY_SIZE) <= 100.0));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let word = "x".repeat(200);
        let lines = wrap(&word, BODY_SIZE, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_wrap_empty_text_is_one_blank_line() {
        assert_eq!(wrap("", BODY_SIZE, 100.0), vec![String::new()]);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(win_ansi_bytes("Ab("), b"Ab(".to_vec());
        assert_eq!(win_ansi_bytes("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(win_ansi_bytes("日本"), b"??".to_vec());
        assert_eq!(win_ansi_bytes("a\tb"), b"a b".to_vec());
    }

    #[test]
    fn test_title_is_centered() {
        let pages = layout("Report", &[]);
        let td = pages[0]
            .iter()
            .find(|op| op.operator == "Td")
            .expect("title should be positioned");
        let x = td.operands[0].as_float().unwrap();
        let expected = (PAGE_WIDTH - text_width("Report", TITLE_SIZE)) / 2.0;
        assert!((x - expected).abs() < 0.01);
    }

    #[test]
    fn test_long_lists_flow_onto_more_pages() {
        let lines: Vec<String> = (0..120).map(|i| format!("entry {i}")).collect();
        let pages = layout("Many", &lines);
        assert!(pages.len() > 1);
    }
}
