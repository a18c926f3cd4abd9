use crate::error::IngestError;
use lopdf::Document;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::Path;

/// Raw-text extraction seam. Implementations block; callers are expected to
/// run them off the async path.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError>;
}

/// Routes to a concrete extractor based on the file extension.
#[derive(Default)]
pub struct DocumentExtractor;

impl TextExtractor for DocumentExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => extract_pdf(path),
            "pptx" => extract_pptx(path),
            "txt" | "md" => Ok(std::fs::read_to_string(path)?),
            other => Err(IngestError::UnsupportedFormat(format!(
                "unrecognized extension .{other}: {}",
                path.display()
            ))),
        }
    }
}

fn extract_pdf(path: &Path) -> Result<String, IngestError> {
    let document =
        Document::load(path).map_err(|error| IngestError::Extraction(error.to_string()))?;

    let mut pages = Vec::new();
    for (page_number, _object_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_number])
            .map_err(|error| IngestError::Extraction(error.to_string()))?;

        if !text.trim().is_empty() {
            pages.push(text);
        }
    }

    Ok(pages.join("\n"))
}

fn extract_pptx(path: &Path) -> Result<String, IngestError> {
    let file = std::fs::File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|error| IngestError::Extraction(error.to_string()))?;

    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    slide_names.sort_by_key(|name| slide_number(name));

    let mut slides = Vec::new();
    for name in slide_names {
        let mut xml = String::new();
        archive
            .by_name(&name)
            .map_err(|error| IngestError::Extraction(error.to_string()))?
            .read_to_string(&mut xml)?;

        let text = slide_text_runs(&xml)?;
        if !text.trim().is_empty() {
            slides.push(text);
        }
    }

    Ok(slides.join("\n"))
}

fn slide_number(name: &str) -> u32 {
    name.trim_start_matches("ppt/slides/slide")
        .trim_end_matches(".xml")
        .parse()
        .unwrap_or(0)
}

/// Collects the DrawingML `<a:t>` text runs of one slide, one line per run.
fn slide_text_runs(xml: &str) -> Result<String, IngestError> {
    let mut reader = Reader::from_str(xml);
    let mut runs: Vec<String> = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) if element.name().as_ref() == b"a:t" => in_text_run = true,
            Ok(Event::End(element)) if element.name().as_ref() == b"a:t" => in_text_run = false,
            Ok(Event::Text(text)) if in_text_run => {
                let value = text
                    .unescape()
                    .map_err(|error| IngestError::Extraction(error.to_string()))?;
                runs.push(value.into_owned());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => return Err(IngestError::Extraction(error.to_string())),
        }
    }

    Ok(runs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn plain_text_files_read_back_verbatim() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "line one\nline two")?;

        let text = DocumentExtractor.extract_text(&path)?;
        assert_eq!(text, "line one\nline two");
        Ok(())
    }

    #[test]
    fn unknown_extensions_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("report.docx");
        std::fs::write(&path, b"not really a docx")?;

        let result = DocumentExtractor.extract_text(&path);
        assert!(matches!(result, Err(IngestError::UnsupportedFormat(_))));
        Ok(())
    }

    #[test]
    fn malformed_pdf_reports_extraction_failure() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%broken")?;

        let result = DocumentExtractor.extract_text(&path);
        assert!(matches!(result, Err(IngestError::Extraction(_))));
        Ok(())
    }

    #[test]
    fn slide_runs_are_collected_in_order() {
        let xml = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:txBody><a:t>Title</a:t><a:t>Body text</a:t></p:txBody></p:sld>"#;
        let text = slide_text_runs(xml).unwrap();
        assert_eq!(text, "Title\nBody text");
    }

    #[test]
    fn pptx_slides_extract_numerically_ordered() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("deck.pptx");

        let file = std::fs::File::create(&path)?;
        let mut writer = zip::ZipWriter::new(file);
        let slides = [
            ("ppt/slides/slide10.xml", "<p:sld><a:t>tenth</a:t></p:sld>"),
            ("ppt/slides/slide2.xml", "<p:sld><a:t>second</a:t></p:sld>"),
            ("ppt/slides/slide1.xml", "<p:sld><a:t>first</a:t></p:sld>"),
        ];
        for (name, body) in slides {
            writer.start_file(name, zip::write::SimpleFileOptions::default())?;
            writer.write_all(body.as_bytes())?;
        }
        writer.finish()?;

        let text = DocumentExtractor.extract_text(&path)?;
        assert_eq!(text, "first\nsecond\ntenth");
        Ok(())
    }
}
