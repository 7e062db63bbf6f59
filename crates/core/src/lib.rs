pub mod article;
pub mod convert;
pub mod draftjs;
pub mod epub;
pub mod error;
pub mod extract;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod filename;
pub mod images;
pub mod kepub;
pub mod metadata;
pub mod parse;
pub mod preprocess;
pub mod scoring;
pub mod styles;
pub mod templates;
pub mod tree;

pub use article::Article;
pub use convert::{Conversion, convert_html};
#[cfg(feature = "fetch")]
pub use convert::{Converter, convert_url};
pub use epub::{CHAPTER_PATH, EpubResult, build_epub, rewrite_chapter};
pub use error::{KobopressError, Result};
#[doc(hidden)]
pub use extract::{ExtractConfig, ExtractedContent};
pub use extract::extract_content;
#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, SessionFetcher, fetch_file, fetch_url};
pub use filename::{build_output_filename, validate_article_url};
pub use images::{FetchResponse, ImageAsset, ImageFetcher, ImageResult, download_images};
pub use kepub::transform_to_kepub;
pub use metadata::{ArticleMetadata, extract_article, extract_metadata};
pub use parse::Document;
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
#[doc(hidden)]
pub use scoring::{ScoreConfig, ScoreResult, calculate_score, link_density};
pub use styles::EPUB_CSS;
pub use tree::Fragment;
