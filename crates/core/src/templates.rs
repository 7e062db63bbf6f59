//! XML and XHTML templates for the EPUB package.
//!
//! Each function renders one archive entry: the container descriptor, the
//! OPF package document, the navigation document, and the chapter itself.
//! Every interpolated value passes through [`escape_xml`] so titles and
//! author names with markup-significant characters stay well-formed.

use crate::article::{current_date, iso_date, parse_calendar_date};
use crate::images::ImageAsset;
use crate::Article;

use time::{Date, OffsetDateTime};

/// The container descriptor pointing readers at the package document.
pub fn container_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#
}

/// The OPF package document: metadata, manifest, and single-chapter spine.
///
/// The source URL doubles as the unique identifier. The publish date is
/// reduced to its calendar portion, falling back to today when the page
/// carried no usable date.
pub fn content_opf(article: &Article, images: &[ImageAsset]) -> String {
    let date = parse_calendar_date(&article.publish_date).unwrap_or_else(current_date);

    let image_manifest: String = images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            format!(
                "    <item id=\"image-{}\" href=\"images/{}\" media-type=\"{}\"/>\n",
                i + 1,
                escape_xml(&image.filename),
                image.media_type
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">{identifier}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:creator>{creator}</dc:creator>
    <dc:language>en</dc:language>
    <dc:date>{date}</dc:date>
    <dc:source>{source}</dc:source>
    <meta property="dcterms:modified">{modified}</meta>
    <meta property="schema:readingTime">{reading_time} min</meta>
  </metadata>
  <manifest>
    <item id="chapter-001" href="chapter-001.xhtml" media-type="application/xhtml+xml"/>
    <item id="toc" href="toc.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="css" href="styles.css" media-type="text/css"/>
{image_manifest}  </manifest>
  <spine>
    <itemref idref="chapter-001"/>
  </spine>
</package>"#,
        identifier = escape_xml(&article.source_url),
        title = escape_xml(&article.title),
        creator = escape_xml(&article.author),
        date = iso_date(date),
        source = escape_xml(&article.source_url),
        modified = modified_timestamp(),
        reading_time = article.reading_time,
        image_manifest = image_manifest,
    )
}

/// The navigation document with one entry for the single chapter.
pub fn toc_xhtml(article: &Article) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
  <title>{title}</title>
</head>
<body>
  <nav epub:type="toc">
    <ol>
      <li><a href="chapter-001.xhtml">{title}</a></li>
    </ol>
  </nav>
</body>
</html>"#,
        title = escape_xml(&article.title),
    )
}

/// The chapter document: metadata header followed by the body verbatim.
///
/// The header shows title, `Author (@handle)` (bare author when the handle
/// is unknown), the publish date in long form when present, and the
/// estimated reading time.
pub fn chapter_xhtml(article: &Article) -> String {
    let author_line = if article.handle.is_empty() {
        escape_xml(&article.author)
    } else {
        format!("{} (@{})", escape_xml(&article.author), escape_xml(&article.handle))
    };

    let date_line = match parse_calendar_date(&article.publish_date) {
        Some(date) => format!("<p class=\"date\">{}</p>\n    ", long_form_date(date)),
        None => String::new(),
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="styles.css"/>
</head>
<body>
  <div class="article-meta">
    <h1>{title}</h1>
    <p class="author">{author_line}</p>
    {date_line}<p class="reading-time">{reading_time} min read</p>
  </div>
  {body}
</body>
</html>"#,
        title = escape_xml(&article.title),
        author_line = author_line,
        date_line = date_line,
        reading_time = article.reading_time,
        body = article.body_html,
    )
}

/// Current UTC time as `YYYY-MM-DDThh:mm:ssZ` for `dcterms:modified`.
fn modified_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// `January 15, 2026` style date for the chapter header.
fn long_form_date(date: Date) -> String {
    format!("{} {}, {}", date.month(), date.day(), date.year())
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
