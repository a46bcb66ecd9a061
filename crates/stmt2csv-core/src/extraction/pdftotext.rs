use crate::error::ConvertError;
use crate::extraction::{FragmentSource, Page, TextFragment};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// Fragment backend using pdftotext (from poppler-utils).
///
/// Runs `pdftotext -bbox` and turns every reported word box into a fragment.
/// pdftotext measures from the top of the page; boxes are flipped so that
/// fragments use the bottom-left origin of PDF user space.
pub struct PdftotextSource {
    binary: PathBuf,
}

impl PdftotextSource {
    pub fn new() -> Self {
        PdftotextSource {
            binary: PathBuf::from("pdftotext"),
        }
    }

    /// Use a specific pdftotext executable instead of the one on `PATH`.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        PdftotextSource {
            binary: binary.into(),
        }
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentSource for PdftotextSource {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<Page>, ConvertError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| ConvertError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(bytes)
            .map_err(|e| ConvertError::Extraction(e.to_string()))?;

        let output = Command::new(&self.binary)
            .arg("-bbox")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConvertError::PdftotextNotFound
                } else {
                    ConvertError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ConvertError::PdftotextFailed { code, stderr });
        }

        let xhtml = String::from_utf8_lossy(&output.stdout);
        let pages = parse_bbox_xhtml(&xhtml)?;
        log::debug!(
            "pdftotext produced {} page(s), {} fragment(s)",
            pages.len(),
            pages.iter().map(|p| p.fragments.len()).sum::<usize>()
        );
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

#[derive(Debug, Clone, Copy)]
struct WordBox {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
}

/// Parse the XHTML written by `pdftotext -bbox` into pages of fragments.
fn parse_bbox_xhtml(xml: &str) -> Result<Vec<Page>, ConvertError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<Page> = Vec::new();
    let mut page_height = 0.0_f32;
    let mut word: Option<WordBox> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => {
                    page_height = attr_f32(&e, b"height").unwrap_or(0.0);
                    pages.push(Page {
                        page_number: pages.len() + 1,
                        fragments: Vec::new(),
                    });
                }
                b"word" => {
                    word = parse_word_box(&e);
                    text.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"page" => {
                pages.push(Page {
                    page_number: pages.len() + 1,
                    fragments: Vec::new(),
                });
            }
            Ok(Event::Text(t)) => {
                if word.is_some() {
                    let unescaped = t.unescape().map_err(|e| {
                        ConvertError::Extraction(format!("bad text in pdftotext output: {e}"))
                    })?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"word" => {
                if let (Some(bbox), Some(page)) = (word.take(), pages.last_mut()) {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        page.fragments.push(TextFragment {
                            text: trimmed.to_string(),
                            x: bbox.x_min,
                            y: page_height - bbox.y_max,
                            width: bbox.x_max - bbox.x_min,
                            height: bbox.y_max - bbox.y_min,
                            page_index: page.page_number - 1,
                        });
                    }
                }
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConvertError::Extraction(format!(
                    "invalid pdftotext output at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(pages)
}

fn parse_word_box(tag: &BytesStart) -> Option<WordBox> {
    Some(WordBox {
        x_min: attr_f32(tag, b"xMin")?,
        y_min: attr_f32(tag, b"yMin")?,
        x_max: attr_f32(tag, b"xMax")?,
        y_max: attr_f32(tag, b"yMax")?,
    })
}

fn attr_f32(tag: &BytesStart, name: &[u8]) -> Option<f32> {
    let attr = tag.try_get_attribute(name).ok().flatten()?;
    std::str::from_utf8(&attr.value).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title>statement</title>
<meta name="Producer" content="PDFlib"/>
</head>
<body>
<doc>
  <page width="600.000000" height="800.000000">
    <word xMin="10.000000" yMin="90.000000" xMax="60.000000" yMax="100.000000">交易日期</word>
    <word xMin="100.000000" yMin="90.000000" xMax="130.000000" yMax="100.000000">R&amp;D</word>
    <word xMin="100.000000" yMin="120.000000" xMax="130.000000" yMax="130.000000">   </word>
  </page>
  <page width="600.000000" height="800.000000">
  </page>
</doc>
</body>
</html>"#;

    #[test]
    fn test_parse_bbox_xhtml_pages_and_words() {
        let pages = parse_bbox_xhtml(SAMPLE).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].fragments.len(), 2);
        assert!(pages[1].fragments.is_empty());

        let first = &pages[0].fragments[0];
        assert_eq!(first.text, "交易日期");
        assert_eq!(first.x, 10.0);
        assert_eq!(first.width, 50.0);
        assert_eq!(first.height, 10.0);
        // 800 - yMax
        assert_eq!(first.y, 700.0);
        assert_eq!(first.page_index, 0);
    }

    #[test]
    fn test_parse_bbox_xhtml_unescapes_entities() {
        let pages = parse_bbox_xhtml(SAMPLE).unwrap();
        assert_eq!(pages[0].fragments[1].text, "R&D");
    }

    #[test]
    fn test_missing_binary_reports_not_found() {
        let source = PdftotextSource::with_binary("/nonexistent/pdftotext-binary");
        assert!(!source.is_available());
        let err = source.extract_pages(b"%PDF-1.4").unwrap_err();
        assert!(matches!(err, ConvertError::PdftotextNotFound));
    }
}
