use regex::Regex;
use std::io::{Cursor, Read};
use tracing::debug;

use super::html::decode_entities;
use super::pdf::join_pages;
use super::ExtractError;

/// Extracts paragraph and table text from a DOCX document.
pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut lines = Vec::new();
    for child in &doc.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(para) => lines.push(paragraph_text(para)),
            docx_rs::DocumentChild::Table(table) => {
                for row in &table.rows {
                    let docx_rs::TableChild::TableRow(tr) = row;
                    let cells: Vec<String> = tr
                        .cells
                        .iter()
                        .map(|cell| {
                            let docx_rs::TableRowChild::TableCell(tc) = cell;
                            tc.children
                                .iter()
                                .filter_map(|content| match content {
                                    docx_rs::TableCellContent::Paragraph(p) => {
                                        Some(paragraph_text(p))
                                    }
                                    _ => None,
                                })
                                .collect::<Vec<_>>()
                                .join(" ")
                                .trim()
                                .to_string()
                        })
                        .collect();
                    lines.push(cells.join(" | "));
                }
            }
            _ => {}
        }
    }

    debug!("Extracted {} DOCX line(s)", lines.len());
    Ok(lines.join("\n").trim().to_string())
}

fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &para.children {
        match child {
            docx_rs::ParagraphChild::Run(run) => push_run_text(run, &mut text),
            docx_rs::ParagraphChild::Hyperlink(link) => {
                for link_child in &link.children {
                    if let docx_rs::ParagraphChild::Run(run) = link_child {
                        push_run_text(run, &mut text);
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run_text(run: &docx_rs::Run, output: &mut String) {
    for run_child in &run.children {
        match run_child {
            docx_rs::RunChild::Text(text) => output.push_str(&text.text),
            docx_rs::RunChild::Tab(_) => output.push('\t'),
            docx_rs::RunChild::Break(_) => output.push('\n'),
            _ => {}
        }
    }
}

/// Extracts slide text from a PPTX archive, slides in presentation order.
pub fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Presentation(e.to_string()))?;

    let slide_name = Regex::new(r"^ppt/slides/slide(\d+)\.xml$")
        .map_err(|e| ExtractError::Presentation(e.to_string()))?;
    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = slide_name.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort();

    let mut texts = Vec::with_capacity(slides.len());
    for (_, name) in &slides {
        let mut xml = String::new();
        archive
            .by_name(name)
            .map_err(|e| ExtractError::Presentation(e.to_string()))?
            .read_to_string(&mut xml)
            .map_err(|e| ExtractError::Presentation(e.to_string()))?;
        texts.push(slide_text(&xml)?);
    }

    debug!("Extracted {} slide(s)", texts.len());
    Ok(join_pages(&texts, "slide"))
}

fn slide_text(xml: &str) -> Result<String, ExtractError> {
    let run = Regex::new(r"(?s)<a:t(?:\s[^>]*)?>(.*?)</a:t>")
        .map_err(|e| ExtractError::Presentation(e.to_string()))?;

    let lines: Vec<String> = xml
        .split("</a:p>")
        .map(|para| {
            run.captures_iter(para)
                .filter_map(|c| c.get(1))
                .map(|m| decode_entities(m.as_str()))
                .collect::<String>()
        })
        .filter(|line| !line.trim().is_empty())
        .collect();

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn slide_xml(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p>", p))
            .collect();
        format!(
            "<?xml version=\"1.0\"?><p:sld><p:cSld><p:spTree><p:sp><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>",
            body
        )
    }

    fn build_pptx(slides: &[(&str, String)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        for (name, xml) in slides {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_pptx_slides_in_numeric_order() {
        let bytes = build_pptx(&[
            ("ppt/slides/slide10.xml", slide_xml(&["Tenth"])),
            ("ppt/slides/slide2.xml", slide_xml(&["Second"])),
            ("ppt/slides/slide1.xml", slide_xml(&["Title", "Q&amp;A"])),
            ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>".to_string()),
        ]);

        let text = extract_pptx(&bytes).unwrap();
        assert_eq!(
            text,
            "Title\nQ&A\n\n--- slide 2 ---\n\nSecond\n\n--- slide 3 ---\n\nTenth"
        );
    }

    #[test]
    fn test_pptx_not_a_zip() {
        assert!(matches!(
            extract_pptx(b"plain bytes"),
            Err(ExtractError::Presentation(_))
        ));
    }

    #[test]
    fn test_docx_paragraphs() {
        use docx_rs::{Docx, Paragraph, Run};

        let mut buffer = Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Hello docx")))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Second line")))
            .build()
            .pack(&mut buffer)
            .unwrap();

        let text = extract_docx(buffer.get_ref()).unwrap();
        assert_eq!(text, "Hello docx\nSecond line");
    }

    #[test]
    fn test_docx_corrupt() {
        assert!(matches!(extract_docx(b"nope"), Err(ExtractError::Docx(_))));
    }
}
