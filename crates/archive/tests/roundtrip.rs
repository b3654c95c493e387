use remedy_archive::{Archive, ArchiveError};
use std::fs;

fn build_package() -> Archive {
    let mut archive = Archive::new();
    archive.insert_text("mimetype", "application/epub+zip");
    archive.insert_text(
        "META-INF/container.xml",
        r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
    );
    archive.insert_text(
        "OEBPS/content.opf",
        r#"<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Round Trip</dc:title>
  </metadata>
</package>"#,
    );
    archive.insert_text(
        "OEBPS/ch1.xhtml",
        "<html><head><title>Ch 1</title></head><body><h1>Chapter 1</h1></body></html>",
    );
    archive.insert_binary("OEBPS/fonts/serif.otf", vec![0x4f, 0x54, 0x54, 0x4f, 0x00]);
    archive
}

#[test]
fn archive_survives_a_disk_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("book.epub");

    let original = build_package();
    fs::write(&path, original.to_bytes().expect("serialize")).expect("write epub");

    let bytes = fs::read(&path).expect("read epub");
    let reloaded = Archive::from_bytes(&bytes).expect("decode");

    assert_eq!(reloaded.len(), original.len());
    assert_eq!(reloaded.opf_path().expect("opf"), "OEBPS/content.opf");
    assert_eq!(
        reloaded.text("OEBPS/ch1.xhtml").expect("text"),
        original.text("OEBPS/ch1.xhtml").expect("text")
    );
    assert!(matches!(
        reloaded.text("OEBPS/fonts/serif.otf"),
        Err(ArchiveError::NotText(_))
    ));
}

#[test]
fn mutation_then_round_trip_keeps_the_edit() {
    let mut archive = build_package();
    let patched = archive
        .text("OEBPS/ch1.xhtml")
        .expect("text")
        .replace("<h1>Chapter 1</h1>", "<h1>Chapter One</h1>");
    archive.set_text("OEBPS/ch1.xhtml", patched).expect("set");

    let bytes = archive.to_bytes().expect("serialize");
    let reloaded = Archive::from_bytes(&bytes).expect("decode");
    assert!(reloaded
        .text("OEBPS/ch1.xhtml")
        .expect("text")
        .contains("Chapter One"));
}
