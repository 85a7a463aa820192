//! Text extraction for `.docx` input.
//!
//! A docx file is a zip archive holding WordprocessingML; the body text
//! lives in `word/document.xml` as `<w:t>` runs grouped into `<w:p>`
//! paragraphs. Anything that fails to parse as that structure is rejected
//! as an unsupported format rather than misread.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use docqa_core::error::{Error, Result};

pub fn extract(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::UnsupportedFormat(format!("docx: not a zip archive ({e})")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| Error::UnsupportedFormat("docx: missing word/document.xml".to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| Error::UnsupportedFormat(format!("docx: unreadable document part ({e})")))?;

    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"w:t" => in_text_run = false,
            Ok(Event::Text(t)) if in_text_run => {
                let piece = t
                    .unescape()
                    .map_err(|e| Error::UnsupportedFormat(format!("docx: bad text run ({e})")))?;
                out.push_str(&piece);
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"w:br" => out.push('\n'),
            Ok(Event::Empty(e)) if e.name().as_ref() == b"w:tab" => out.push('\t'),
            Ok(Event::End(e)) if e.name().as_ref() == b"w:p" => out.push_str("\n\n"),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::UnsupportedFormat(format!("docx: malformed xml ({e})")));
            }
        }
    }

    Ok(out.trim_end().to_string())
}
