//! Format-specific text extraction, dispatched by file extension.

use crate::error::ExtractionError;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Turns a source file into plain text.
pub trait DocumentReader: Send + Sync {
    /// `ext` is the lower-cased extension without the dot.
    fn can_read(&self, ext: &str) -> bool;
    fn read(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Ordered set of readers; the first one accepting the extension wins.
#[derive(Default)]
pub struct ReaderRegistry {
    readers: Vec<Box<dyn DocumentReader>>,
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every reader enabled in this build.
    pub fn with_defaults() -> Self {
        let reg = Self::new().with_reader(PlainTextReader);
        #[cfg(feature = "pdf")]
        let reg = reg.with_reader(PdfReader);
        #[cfg(feature = "office")]
        let reg = reg
            .with_reader(DocxReader)
            .with_reader(SpreadsheetReader)
            .with_reader(PptxReader);
        reg
    }

    pub fn with_reader(mut self, reader: impl DocumentReader + 'static) -> Self {
        self.readers.push(Box::new(reader));
        self
    }

    pub fn can_read(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.readers.iter().any(|r| r.can_read(&ext))
    }

    pub fn read(&self, path: &Path) -> Result<String, ExtractionError> {
        let ext = extension_of(path);
        let reader = self
            .readers
            .iter()
            .find(|r| r.can_read(&ext))
            .ok_or_else(|| ExtractionError::UnsupportedFormat(display_ext(&ext)))?;
        debug!("reading {:?}", path);
        reader.read(path)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

fn display_ext(ext: &str) -> String {
    if ext.is_empty() {
        "(no extension)".to_string()
    } else {
        format!(".{ext}")
    }
}

pub struct PlainTextReader;

impl DocumentReader for PlainTextReader {
    fn can_read(&self, ext: &str) -> bool {
        matches!(ext, "txt" | "md")
    }

    fn read(&self, path: &Path) -> Result<String, ExtractionError> {
        fs::read_to_string(path).map_err(|e| ExtractionError::failed(path, e))
    }
}

#[cfg(feature = "pdf")]
pub struct PdfReader;

#[cfg(feature = "pdf")]
impl DocumentReader for PdfReader {
    fn can_read(&self, ext: &str) -> bool {
        ext == "pdf"
    }

    fn read(&self, path: &Path) -> Result<String, ExtractionError> {
        pdf_extract::extract_text(path).map_err(|e| ExtractionError::failed(path, e))
    }
}

#[cfg(feature = "office")]
pub struct DocxReader;

#[cfg(feature = "office")]
impl DocumentReader for DocxReader {
    fn can_read(&self, ext: &str) -> bool {
        ext == "docx"
    }

    fn read(&self, path: &Path) -> Result<String, ExtractionError> {
        use docx_rs::{DocumentChild, ParagraphChild, RunChild};

        let bytes = fs::read(path).map_err(|e| ExtractionError::failed(path, e))?;
        let docx = docx_rs::read_docx(&bytes).map_err(|e| ExtractionError::failed(path, e))?;
        let mut paragraphs = Vec::new();
        for child in &docx.document.children {
            if let DocumentChild::Paragraph(p) = child {
                let mut line = String::new();
                for pc in &p.children {
                    if let ParagraphChild::Run(run) = pc {
                        for rc in &run.children {
                            if let RunChild::Text(t) = rc {
                                line.push_str(&t.text);
                            }
                        }
                    }
                }
                paragraphs.push(line);
            }
        }
        Ok(paragraphs.join("\n"))
    }
}

#[cfg(feature = "office")]
pub struct SpreadsheetReader;

#[cfg(feature = "office")]
impl DocumentReader for SpreadsheetReader {
    fn can_read(&self, ext: &str) -> bool {
        matches!(ext, "xls" | "xlsx" | "ods")
    }

    fn read(&self, path: &Path) -> Result<String, ExtractionError> {
        use calamine::{open_workbook_auto, Reader};

        let mut workbook = open_workbook_auto(path).map_err(|e| ExtractionError::failed(path, e))?;
        let mut text = String::new();
        for name in workbook.sheet_names().to_owned() {
            let range = match workbook.worksheet_range(&name) {
                Some(Ok(range)) => range,
                Some(Err(e)) => return Err(ExtractionError::failed(path, e)),
                None => continue,
            };
            for row in range.rows() {
                let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
                text.push_str(&cells.join(" "));
                text.push('\n');
            }
        }
        Ok(text)
    }
}

#[cfg(feature = "office")]
pub struct PptxReader;

#[cfg(feature = "office")]
impl DocumentReader for PptxReader {
    fn can_read(&self, ext: &str) -> bool {
        ext == "pptx"
    }

    fn read(&self, path: &Path) -> Result<String, ExtractionError> {
        use std::io::Read;

        let file = fs::File::open(path).map_err(|e| ExtractionError::failed(path, e))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtractionError::failed(path, e))?;
        let mut slides: Vec<String> = archive
            .file_names()
            .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
            .map(str::to_string)
            .collect();
        // slide10.xml must come after slide9.xml
        slides.sort_by_key(|n| {
            n.trim_start_matches("ppt/slides/slide")
                .trim_end_matches(".xml")
                .parse::<u32>()
                .unwrap_or(u32::MAX)
        });

        let mut out = Vec::new();
        for name in slides {
            let mut xml = String::new();
            archive
                .by_name(&name)
                .map_err(|e| ExtractionError::failed(path, e))?
                .read_to_string(&mut xml)
                .map_err(|e| ExtractionError::failed(path, e))?;
            out.push(slide_text(&xml).map_err(|e| ExtractionError::failed(path, e))?);
        }
        Ok(out.join("\n"))
    }
}

#[cfg(feature = "office")]
fn slide_text(xml: &str) -> Result<String, quick_xml::Error> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut in_text = false;
    let mut runs = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"a:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"a:t" => in_text = false,
            Event::Text(t) if in_text => runs.push(t.unescape()?.into_owned()),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(runs.join(" "))
}
