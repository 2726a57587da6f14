use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use roxmltree::Document as XmlDocument;
use zip::result::ZipError;
use zip::ZipArchive;

use super::markup::first_heading;
use super::{Document, Section};
use crate::error::ExtractionError;

const CONTAINER_PATH: &str = "META-INF/container.xml";

/// An EPUB opened from a ZIP archive. Metadata and the reading order are parsed up front; section
/// markup is only read when [`Document::sections`] is iterated.
pub struct EpubBook<R> {
    archive: ZipArchive<R>,
    metadata: HashMap<String, String>,
    spine: Vec<String>,
}

impl EpubBook<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, ExtractionError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> EpubBook<R> {
    pub fn from_reader(reader: R) -> Result<Self, ExtractionError> {
        let mut archive = ZipArchive::new(reader)?;

        let container = read_entry(&mut archive, CONTAINER_PATH)?;
        let package_path = package_path(&container)?;
        let package = read_entry(&mut archive, &package_path)?;
        let (metadata, spine) = parse_package(&package_path, &package)?;

        Ok(Self {
            archive,
            metadata,
            spine,
        })
    }

    /// Archive paths of the content documents in reading order.
    pub fn spine(&self) -> &[String] {
        &self.spine
    }
}

impl<R: Read + Seek> Document for EpubBook<R> {
    type Sections = EpubSections<R>;

    fn metadata(&self, key: &str) -> Option<String> {
        self.metadata.get(key).cloned()
    }

    fn sections(self) -> Self::Sections {
        EpubSections {
            archive: self.archive,
            paths: self.spine.into_iter(),
        }
    }
}

pub struct EpubSections<R> {
    archive: ZipArchive<R>,
    paths: std::vec::IntoIter<String>,
}

impl<R: Read + Seek> Iterator for EpubSections<R> {
    type Item = Result<Section, ExtractionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        Some(read_entry(&mut self.archive, &path).map(|markup| Section {
            heading: first_heading(&markup),
            markup,
        }))
    }
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, ExtractionError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(ExtractionError::MissingEntry(name.to_string())),
        Err(err) => return Err(err.into()),
    };

    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;

    String::from_utf8(bytes).map_err(|_| ExtractionError::Encoding {
        path: name.to_string(),
    })
}

fn parse_xml<'a>(path: &str, text: &'a str) -> Result<XmlDocument<'a>, ExtractionError> {
    XmlDocument::parse(text).map_err(|err| ExtractionError::Xml {
        path: path.to_string(),
        message: err.to_string(),
    })
}

fn package_path(container: &str) -> Result<String, ExtractionError> {
    let doc = parse_xml(CONTAINER_PATH, container)?;

    doc.descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "rootfile")
        .find_map(|node| node.attribute("full-path"))
        .map(|path| path.trim_start_matches('/').to_string())
        .ok_or(ExtractionError::MissingPackage)
}

fn parse_package(
    package_path: &str,
    package: &str,
) -> Result<(HashMap<String, String>, Vec<String>), ExtractionError> {
    let doc = parse_xml(package_path, package)?;

    let mut metadata = HashMap::new();
    if let Some(node) = doc
        .descendants()
        .find(|node| node.is_element() && node.tag_name().name() == "metadata")
    {
        for child in node.children().filter(|child| child.is_element()) {
            let value = child
                .descendants()
                .filter_map(|text| if text.is_text() { text.text() } else { None })
                .collect::<String>();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            metadata
                .entry(child.tag_name().name().to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    let manifest: HashMap<&str, (&str, &str)> = doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "item")
        .filter_map(|node| {
            let id = node.attribute("id")?;
            let href = node.attribute("href")?;
            let media_type = node.attribute("media-type").unwrap_or("");
            Some((id, (href, media_type)))
        })
        .collect();

    let base_dir = package_path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("");

    let spine = doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "itemref")
        .filter_map(|node| node.attribute("idref"))
        .filter_map(|idref| manifest.get(idref))
        .filter(|(href, media_type)| is_content_document(href, media_type))
        .map(|(href, _)| resolve_href(base_dir, href))
        .collect();

    Ok((metadata, spine))
}

fn is_content_document(href: &str, media_type: &str) -> bool {
    if matches!(media_type, "application/xhtml+xml" | "text/html") {
        return true;
    }
    let lowered = href.to_ascii_lowercase();
    lowered.ends_with(".xhtml") || lowered.ends_with(".html") || lowered.ends_with(".htm")
}

fn resolve_href(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();

    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    parts.join("/")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Builds a minimal EPUB with one XHTML file per chapter body. `title` of `None` leaves the
    /// `dc:title` element out.
    pub fn epub_bytes(title: Option<&str>, chapters: &[&str]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        writer.start_file("mimetype", options).unwrap();
        writer.write_all(b"application/epub+zip").unwrap();

        writer.start_file("META-INF/container.xml", options).unwrap();
        writer
            .write_all(
                br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
            )
            .unwrap();

        let title_xml = title
            .map(|t| format!("<dc:title>{t}</dc:title>"))
            .unwrap_or_default();
        let manifest: String = (0..chapters.len())
            .map(|i| {
                format!(
                    r#"<item id="c{i}" href="text/ch{i}.xhtml" media-type="application/xhtml+xml"/>"#
                )
            })
            .collect();
        let spine: String = (0..chapters.len())
            .map(|i| format!(r#"<itemref idref="c{i}"/>"#))
            .collect();
        let opf = format!(
            r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    {title_xml}
    <dc:creator>Test Author</dc:creator>
  </metadata>
  <manifest>
    <item id="css" href="style.css" media-type="text/css"/>
    {manifest}
  </manifest>
  <spine>{spine}</spine>
</package>"#
        );
        writer.start_file("OEBPS/content.opf", options).unwrap();
        writer.write_all(opf.as_bytes()).unwrap();

        for (i, body) in chapters.iter().enumerate() {
            let xhtml = format!(
                r#"<?xml version="1.0"?><html xmlns="http://www.w3.org/1999/xhtml"><head><title>t</title></head><body>{body}</body></html>"#
            );
            writer
                .start_file(format!("OEBPS/text/ch{i}.xhtml"), options)
                .unwrap();
            writer.write_all(xhtml.as_bytes()).unwrap();
        }

        writer.finish().unwrap().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::fixtures::epub_bytes;
    use super::*;

    #[test]
    fn reads_title_and_spine() {
        let bytes = epub_bytes(Some("The Long Road"), &["<p>One.</p>", "<p>Two.</p>"]);
        let book = EpubBook::from_reader(Cursor::new(bytes)).unwrap();

        assert_eq!(book.metadata("title").as_deref(), Some("The Long Road"));
        assert_eq!(book.metadata("creator").as_deref(), Some("Test Author"));
        assert_eq!(
            book.spine(),
            &["OEBPS/text/ch0.xhtml", "OEBPS/text/ch1.xhtml"]
        );
    }

    #[test]
    fn sections_follow_reading_order_with_headings() {
        let bytes = epub_bytes(
            Some("Book"),
            &["<h2>Arrival</h2><p>First.</p>", "<p>No heading here.</p>"],
        );
        let book = EpubBook::from_reader(Cursor::new(bytes)).unwrap();
        let sections: Vec<Section> = book.sections().collect::<Result<_, _>>().unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading.as_deref(), Some("Arrival"));
        assert!(sections[0].markup.contains("First."));
        assert_eq!(sections[1].heading, None);
    }

    #[test]
    fn missing_title_is_absent_metadata() {
        let bytes = epub_bytes(None, &["<p>Body.</p>"]);
        let book = EpubBook::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(book.metadata("title"), None);
    }

    #[test]
    fn rejects_non_zip_input() {
        let err = EpubBook::from_reader(Cursor::new(b"plain text, not an archive".to_vec()))
            .err()
            .unwrap();
        assert!(matches!(err, ExtractionError::Archive(_)));
    }

    #[test]
    fn rejects_archive_without_container() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("mimetype", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"application/epub+zip").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = EpubBook::from_reader(Cursor::new(bytes)).err().unwrap();
        assert!(
            matches!(err, ExtractionError::MissingEntry(ref path) if path == CONTAINER_PATH),
            "{err}"
        );
    }

    #[test]
    fn resolves_relative_hrefs() {
        assert_eq!(resolve_href("OEBPS", "text/ch1.xhtml"), "OEBPS/text/ch1.xhtml");
        assert_eq!(resolve_href("OEBPS/text", "../ch2.xhtml#frag"), "OEBPS/ch2.xhtml");
        assert_eq!(resolve_href("", "./ch3.xhtml"), "ch3.xhtml");
    }
}
