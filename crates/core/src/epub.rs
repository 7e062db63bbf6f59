//! EPUB 3 archive assembly.
//!
//! Builds the complete single-chapter archive from an [`Article`] and its
//! downloaded images, and re-opens finished archives to rewrite the
//! chapter in place for the KEPUB transform. The `mimetype` entry is
//! always written first and stored uncompressed; readers check the magic
//! bytes at a fixed offset before unpacking anything.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::filename::build_output_filename;
use crate::images::ImageAsset;
use crate::styles::EPUB_CSS;
use crate::templates;
use crate::{Article, KobopressError, Result};

/// Archive path of the single chapter document.
pub const CHAPTER_PATH: &str = "OEBPS/chapter-001.xhtml";

/// A finished archive plus the filename it should be saved under.
#[derive(Debug, Clone)]
pub struct EpubResult {
    /// The complete archive bytes.
    pub data: Vec<u8>,
    /// Output filename, `<date>-<title>-<handle>-<hash>.kepub.epub`.
    pub filename: String,
}

/// Assembles the archive for an extracted Article.
///
/// Entry order: `mimetype` (stored), the container descriptor, the
/// package document, the navigation document, the chapter, the
/// stylesheet, then one entry per image under `OEBPS/images/`.
pub fn build_epub(article: &Article, images: &[ImageAsset]) -> Result<EpubResult> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored)?;
    zip.write_all(b"application/epub+zip")?;

    zip.start_file("META-INF/container.xml", deflated)?;
    zip.write_all(templates::container_xml().as_bytes())?;

    zip.start_file("OEBPS/content.opf", deflated)?;
    zip.write_all(templates::content_opf(article, images).as_bytes())?;

    zip.start_file("OEBPS/toc.xhtml", deflated)?;
    zip.write_all(templates::toc_xhtml(article).as_bytes())?;

    zip.start_file(CHAPTER_PATH, deflated)?;
    zip.write_all(templates::chapter_xhtml(article).as_bytes())?;

    zip.start_file("OEBPS/styles.css", deflated)?;
    zip.write_all(EPUB_CSS.as_bytes())?;

    for image in images {
        zip.start_file(format!("OEBPS/images/{}", image.filename), deflated)?;
        zip.write_all(&image.data)?;
    }

    let data = zip.finish()?.into_inner();
    let filename = build_output_filename(
        &article.title,
        &article.handle,
        &article.source_url,
        Some(&article.publish_date),
    );

    Ok(EpubResult { data, filename })
}

/// Rebuilds an archive with its chapter document passed through `transform`.
///
/// Every other entry is copied as-is, preserving order and compression
/// method, so the mimetype entry stays first and stored.
///
/// # Errors
///
/// Returns [`KobopressError::MissingEntry`] when the archive has no
/// chapter entry, and propagates any error from `transform` itself.
pub fn rewrite_chapter<F>(epub: &[u8], transform: F) -> Result<Vec<u8>>
where
    F: Fn(&str) -> Result<String>,
{
    let mut archive = ZipArchive::new(Cursor::new(epub))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut rewritten = false;

    for i in 0..archive.len() {
        let (name, method, contents) = {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            let method = entry.compression();
            let mut contents = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut contents)?;
            (name, method, contents)
        };

        let contents = if name == CHAPTER_PATH {
            let xhtml = String::from_utf8(contents)
                .map_err(|e| KobopressError::XhtmlError(e.to_string()))?;
            rewritten = true;
            transform(&xhtml)?.into_bytes()
        } else {
            contents
        };

        let options = SimpleFileOptions::default().compression_method(method);
        writer.start_file(name, options)?;
        writer.write_all(&contents)?;
    }

    if !rewritten {
        return Err(KobopressError::MissingEntry(CHAPTER_PATH.to_string()));
    }

    Ok(writer.finish()?.into_inner())
}
