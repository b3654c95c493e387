use crate::error::{ArchiveError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Extensions stored and patched as UTF-8 text
const TEXT_EXTENSIONS: &[&str] = &[
    "xhtml", "html", "htm", "xml", "opf", "ncx", "css", "svg", "smil", "txt", "js",
];

/// Extensions of content documents subject to structural repair
const CONTENT_EXTENSIONS: &[&str] = &["xhtml", "html", "htm"];

static CONTAINER_ROOTFILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"full-path\s*=\s*["']([^"']+)["']"#).expect("valid rootfile pattern")
});

/// One archive member: UTF-8 text or opaque bytes.
///
/// Binary members (images, fonts) reject text operations outright rather
/// than silently corrupting their bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Text(String),
    Binary(Vec<u8>),
}

impl Member {
    /// Whether this member holds text content
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// The packaged document, loaded once into an owned path -> member map.
///
/// Exclusively owned by one remediation run for its duration; a parallel
/// re-audit must operate on a separately decoded copy.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    members: BTreeMap<String, Member>,
}

fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

fn is_text_path(path: &str) -> bool {
    extension(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

impl Archive {
    /// Create an empty archive (tests, synthetic packages)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a zip container into an owned member map.
    ///
    /// Members with a text extension that fail UTF-8 decoding are kept as
    /// binary and logged, never dropped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut members = BTreeMap::new();

        for index in 0..zip.len() {
            let mut entry = zip.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let path = entry.name().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;

            let member = if is_text_path(&path) {
                match String::from_utf8(data) {
                    Ok(text) => Member::Text(text),
                    Err(err) => {
                        log::warn!("Member {path} has a text extension but is not UTF-8; keeping as binary");
                        Member::Binary(err.into_bytes())
                    }
                }
            } else {
                Member::Binary(data)
            };
            members.insert(path, member);
        }

        log::debug!("Loaded archive with {} members", members.len());
        Ok(Self { members })
    }

    /// Serialize back to zip bytes. The `mimetype` member, when present, is
    /// written first and uncompressed as the container format requires.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        if let Some(member) = self.members.get("mimetype") {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            writer.start_file("mimetype", options)?;
            match member {
                Member::Text(text) => writer.write_all(text.as_bytes())?,
                Member::Binary(data) => writer.write_all(data)?,
            }
        }

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (path, member) in &self.members {
            if path == "mimetype" {
                continue;
            }
            writer.start_file(path.as_str(), options)?;
            match member {
                Member::Text(text) => writer.write_all(text.as_bytes())?,
                Member::Binary(data) => writer.write_all(data)?,
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Number of members
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the archive holds no members
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether a member exists at this path
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.members.contains_key(path)
    }

    /// All member paths in deterministic (sorted) order
    pub fn member_paths(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Read a text member. Hard error for missing or binary members.
    pub fn text(&self, path: &str) -> Result<&str> {
        match self.members.get(path) {
            Some(Member::Text(text)) => Ok(text),
            Some(Member::Binary(_)) => Err(ArchiveError::not_text(path)),
            None => Err(ArchiveError::not_found(path)),
        }
    }

    /// Replace the content of an existing text member. Attempting to write
    /// text over a binary member is a hard error, not a silent no-op.
    pub fn set_text(&mut self, path: &str, content: String) -> Result<()> {
        match self.members.get_mut(path) {
            Some(Member::Text(text)) => {
                *text = content;
                Ok(())
            }
            Some(Member::Binary(_)) => Err(ArchiveError::not_text(path)),
            None => Err(ArchiveError::not_found(path)),
        }
    }

    /// Insert a brand-new text member (e.g. a generated stylesheet)
    pub fn insert_text(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.members.insert(path.into(), Member::Text(content.into()));
    }

    /// Insert a binary member
    pub fn insert_binary(&mut self, path: impl Into<String>, data: Vec<u8>) {
        self.members.insert(path.into(), Member::Binary(data));
    }

    /// Locate the package document (OPF): the container manifest's rootfile
    /// when present, else the first member with an `.opf` extension.
    pub fn opf_path(&self) -> Result<String> {
        if let Ok(container) = self.text("META-INF/container.xml") {
            if let Some(caps) = CONTAINER_ROOTFILE.captures(container) {
                let path = caps[1].to_string();
                if self.contains(&path) {
                    return Ok(path);
                }
                log::warn!("container.xml points at missing rootfile {path}");
            }
        }
        self.member_paths()
            .find(|path| extension(path).as_deref() == Some("opf"))
            .map(str::to_string)
            .ok_or_else(|| ArchiveError::missing_opf("no rootfile entry and no .opf member"))
    }

    /// Content documents subject to structural repair, in deterministic order
    #[must_use]
    pub fn content_documents(&self) -> Vec<String> {
        self.member_paths()
            .filter(|path| {
                extension(path).is_some_and(|ext| CONTENT_EXTENSIONS.contains(&ext.as_str()))
            })
            .map(str::to_string)
            .collect()
    }

    /// Stylesheet members, in deterministic order
    #[must_use]
    pub fn stylesheets(&self) -> Vec<String> {
        self.member_paths()
            .filter(|path| extension(path).as_deref() == Some("css"))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Archive {
        let mut archive = Archive::new();
        archive.insert_text("mimetype", "application/epub+zip");
        archive.insert_text(
            "META-INF/container.xml",
            r#"<container><rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles></container>"#,
        );
        archive.insert_text("OEBPS/content.opf", "<package><metadata/></package>");
        archive.insert_text("OEBPS/ch1.xhtml", "<html><body><h1>One</h1></body></html>");
        archive.insert_text("OEBPS/ch2.xhtml", "<html><body><h2>Two</h2></body></html>");
        archive.insert_text("OEBPS/styles.css", "body { color: #000; }");
        archive.insert_binary("OEBPS/cover.png", vec![0x89, 0x50, 0x4e, 0x47]);
        archive
    }

    #[test]
    fn opf_path_follows_container_rootfile() {
        let archive = sample();
        assert_eq!(archive.opf_path().unwrap(), "OEBPS/content.opf");
    }

    #[test]
    fn opf_path_falls_back_to_extension_scan() {
        let mut archive = Archive::new();
        archive.insert_text("package.opf", "<package/>");
        assert_eq!(archive.opf_path().unwrap(), "package.opf");

        let empty = Archive::new();
        assert!(matches!(empty.opf_path(), Err(ArchiveError::MissingOpf(_))));
    }

    #[test]
    fn content_documents_are_sorted_and_filtered() {
        let archive = sample();
        assert_eq!(
            archive.content_documents(),
            vec!["OEBPS/ch1.xhtml".to_string(), "OEBPS/ch2.xhtml".to_string()]
        );
        assert_eq!(archive.stylesheets(), vec!["OEBPS/styles.css".to_string()]);
    }

    #[test]
    fn text_operations_reject_binary_members() {
        let mut archive = sample();
        assert!(matches!(
            archive.text("OEBPS/cover.png"),
            Err(ArchiveError::NotText(_))
        ));
        assert!(matches!(
            archive.set_text("OEBPS/cover.png", "oops".to_string()),
            Err(ArchiveError::NotText(_))
        ));
        assert!(matches!(
            archive.text("OEBPS/missing.xhtml"),
            Err(ArchiveError::MemberNotFound(_))
        ));
    }

    #[test]
    fn zip_round_trip_preserves_members() {
        let archive = sample();
        let bytes = archive.to_bytes().unwrap();
        let reloaded = Archive::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded.len(), archive.len());
        assert_eq!(
            reloaded.text("OEBPS/ch1.xhtml").unwrap(),
            archive.text("OEBPS/ch1.xhtml").unwrap()
        );
        assert!(matches!(
            reloaded.members.get("OEBPS/cover.png"),
            Some(Member::Binary(_))
        ));
        // mimetype must be the first entry in the container
        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.by_index(0).unwrap().name(), "mimetype");
    }

    #[test]
    fn round_trip_is_byte_stable_without_mutation() {
        let archive = sample();
        let first = archive.to_bytes().unwrap();
        let second = Archive::from_bytes(&first).unwrap().to_bytes().unwrap();
        assert_eq!(first, second);
    }
}
