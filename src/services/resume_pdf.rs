//! Exports a generated resume to PDF.
//!
//! The stored HTML is flattened to text lines and laid out with lopdf on
//! US Letter pages using the standard Helvetica fonts.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use scraper::{ElementRef, Html};

use crate::error::{AppError, AppResult};

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 54;
const BODY_SIZE: i64 = 11;
const HEADING_SIZE: i64 = 14;
const BODY_LEADING: i64 = 15;
const HEADING_LEADING: i64 = 22;
const BODY_COLUMNS: usize = 90;
const HEADING_COLUMNS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Heading,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeLine {
    pub text: String,
    pub style: LineStyle,
}

impl ResumeLine {
    pub fn body(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: LineStyle::Body,
        }
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: LineStyle::Heading,
        }
    }
}

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "tr", "table", "section", "header", "footer", "article",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "body", "html",
];
const SKIPPED_TAGS: &[&str] = &["head", "style", "script", "title", "template", "noscript"];

struct LineCollector {
    lines: Vec<ResumeLine>,
    current: String,
    style: LineStyle,
}

impl LineCollector {
    fn flush(&mut self) {
        let text = self.current.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() && text != "-" {
            self.lines.push(ResumeLine {
                text,
                style: self.style,
            });
        }
        self.current.clear();
        self.style = LineStyle::Body;
    }

    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                self.current.push_str(text);
                continue;
            }
            // Comments, doctypes and processing instructions carry no text.
            let Some(child) = ElementRef::wrap(child) else {
                continue;
            };

            let name = child.value().name();
            if SKIPPED_TAGS.contains(&name) {
                continue;
            }
            if !BLOCK_TAGS.contains(&name) {
                self.walk(child);
                continue;
            }

            self.flush();
            match name {
                "h1" | "h2" | "h3" => self.style = LineStyle::Heading,
                "li" => self.current.push_str("- "),
                _ => {}
            }
            self.walk(child);
            self.flush();
        }
    }
}

/// Flattens HTML into display lines. Block elements start new lines, list
/// items get a dash, and `h1`-`h3` become headings. Entities are decoded by
/// the parser.
pub fn html_to_lines(html: &str) -> Vec<ResumeLine> {
    let document = Html::parse_document(html);
    let mut collector = LineCollector {
        lines: Vec::new(),
        current: String::new(),
        style: LineStyle::Body,
    };
    collector.walk(document.root_element());
    collector.flush();
    collector.lines
}

/// Greedy word wrap on character columns.
pub fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > columns {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let head: String = word.chars().take(columns).collect();
            word = word.chars().skip(columns).collect();
            lines.push(head);
        }
        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };
        if needed > columns && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// WinAnsi is close enough to Latin-1 for the standard fonts; anything
/// outside it is replaced.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => b'\'',
            '\u{201C}' | '\u{201D}' => b'"',
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2022}' => 0x95,
            c if (c as u32) < 256 => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn paginate(lines: &[ResumeLine]) -> Vec<Vec<(i64, ResumeLine)>> {
    let mut pages = Vec::new();
    let mut page = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    for line in lines {
        let (columns, leading) = match line.style {
            LineStyle::Heading => (HEADING_COLUMNS, HEADING_LEADING),
            LineStyle::Body => (BODY_COLUMNS, BODY_LEADING),
        };
        for piece in wrap(&line.text, columns) {
            if y - leading < MARGIN {
                pages.push(std::mem::take(&mut page));
                y = PAGE_HEIGHT - MARGIN;
            }
            y -= leading;
            page.push((
                y,
                ResumeLine {
                    text: piece,
                    style: line.style,
                },
            ));
        }
    }
    if !page.is_empty() || pages.is_empty() {
        pages.push(page);
    }
    pages
}

/// Lays out `lines` and returns the PDF bytes. An empty input produces a
/// single blank page.
pub fn render_pdf(lines: &[ResumeLine]) -> AppResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let body_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let heading_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => body_font,
            "F2" => heading_font,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page_lines in paginate(lines) {
        let mut operations = Vec::with_capacity(page_lines.len() * 5);
        for (y, line) in page_lines {
            let (font, size) = match line.style {
                LineStyle::Heading => ("F2", HEADING_SIZE),
                LineStyle::Body => ("F1", BODY_SIZE),
            };
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![font.into(), Object::Integer(size)]));
            operations.push(Operation::new(
                "Td",
                vec![Object::Integer(MARGIN), Object::Integer(y)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_win_ansi(&line.text))],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| AppError::internal(format!("Failed to encode page content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| AppError::internal(format!("Failed to write PDF: {}", e)))?;
    Ok(buffer)
}

pub fn render_resume_pdf(html: &str) -> AppResult<Vec<u8>> {
    render_pdf(&html_to_lines(html))
}
