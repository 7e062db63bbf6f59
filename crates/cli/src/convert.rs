use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use kobopress_core::{
    Document, FetchConfig, SessionFetcher, build_epub, download_images, extract_article,
    rewrite_chapter, transform_to_kepub, validate_article_url,
};
use owo_colors::OwoColorize;

use crate::echo::{self, BatchResult, ConversionSummary};
use crate::errors::{UserError, is_user_error};
use crate::store::{self, UserDefaults};
use crate::dropbox;

/// Index of the single chapter in `kobo.<chapter>.<seq>` span ids.
const CHAPTER_INDEX: usize = 1;

/// Arguments for `kobopress convert`.
#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Article URLs, saved HTML files, or "-" for stdin
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// Output file (default: generated filename in the current directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Skip the Dropbox upload
    #[arg(long)]
    pub no_upload: bool,

    /// Override the extracted title
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Source URL for file or stdin input
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Cookie header for pages behind a login
    #[arg(long, value_name = "COOKIE")]
    pub cookie: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    pub timeout: u64,

    /// Print progress detail
    #[arg(short, long)]
    pub verbose: bool,
}

/// Effective settings for one conversion, flags merged over stored defaults.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub output: Option<PathBuf>,
    pub no_upload: bool,
    pub verbose: bool,
    pub title: Option<String>,
    pub url: Option<String>,
    pub cookie: Option<String>,
    pub timeout: u64,
}

fn merge_options(args: &ConvertArgs, defaults: &UserDefaults) -> ConvertOptions {
    ConvertOptions {
        output: args.output.clone().or_else(|| defaults.output.as_ref().map(PathBuf::from)),
        no_upload: args.no_upload || defaults.no_upload.unwrap_or(false),
        verbose: args.verbose || defaults.verbose.unwrap_or(false),
        title: args.title.clone(),
        url: args.url.clone(),
        cookie: args.cookie.clone().or_else(|| defaults.cookie.clone()),
        timeout: args.timeout,
    }
}

pub async fn run(args: ConvertArgs) -> Result<()> {
    let defaults = store::user_defaults();
    let mut options = merge_options(&args, &defaults);

    if options.verbose {
        echo::print_banner();
    }

    if args.inputs.len() > 1 && options.output.is_some() {
        echo::print_warning("--output is ignored when converting multiple inputs.");
        options.output = None;
    }

    if args.inputs.len() == 1 {
        return convert_one(&args.inputs[0], &options).await;
    }

    let mut results = Vec::new();
    for input in &args.inputs {
        let result = convert_one(input, &options).await;
        results.push(BatchResult {
            input: input.clone(),
            error: result.err().map(|error| error.to_string()),
        });
    }

    echo::print_batch_summary(&results);

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} conversions failed", failed, results.len());
    }
    Ok(())
}

/// Convert one input end to end: load, extract, build, save, upload.
pub async fn convert_one(input: &str, options: &ConvertOptions) -> Result<()> {
    let verbose = options.verbose;
    let session = build_session(options)?;

    if verbose {
        echo::print_step(1, 4, &loading_message(input));
    }
    let (html, source_url) = load_input(input, options, &session).await?;

    if verbose {
        echo::print_step(2, 4, "Extracting content");
    }
    let fallback_title = Document::parse(&html)?.title().unwrap_or_default();
    let mut article = extract_article(&html, &source_url, &fallback_title)?;
    if let Some(title) = &options.title {
        article.title = title.clone();
    }
    let images = download_images(&article.body_html, &session).await?;
    article.body_html = images.html;
    if verbose {
        echo::print_success(&format!(
            "Extracted: {} ({} min read, {} images)",
            article.title, article.reading_time, images.total_downloaded
        ));
    }

    if verbose {
        echo::print_step(3, 4, "Generating KEPUB");
    }
    let epub = build_epub(&article, &images.images)?;
    let data = rewrite_chapter(&epub.data, |xhtml| transform_to_kepub(xhtml, CHAPTER_INDEX))?;

    if verbose {
        echo::print_step(4, 4, "Saving");
    }
    let output_path = match &options.output {
        Some(path) => path.clone(),
        None => std::env::current_dir()?.join(&epub.filename),
    };
    fs::write(&output_path, &data)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    let mut dropbox_path = None;
    if !options.no_upload {
        match dropbox::upload(&data, &epub.filename).await {
            Ok(()) => dropbox_path = Some(dropbox::remote_path(&epub.filename)),
            Err(error) if is_user_error(&error) => {
                echo::print_warning(&format!("Upload skipped: {}", error));
            }
            Err(error) => {
                echo::print_warning(&format!("Upload failed, file saved locally: {}", error));
            }
        }
    }

    let author = if article.handle.is_empty() {
        article.author.clone()
    } else {
        format!("{} (@{})", article.author, article.handle)
    };

    echo::print_summary(&ConversionSummary {
        title: article.title,
        author,
        reading_time: article.reading_time,
        images_downloaded: images.total_downloaded,
        images_found: images.total_found,
        file_size: data.len(),
        file_path: output_path.display().to_string(),
        dropbox_path,
    });

    Ok(())
}

fn build_session(options: &ConvertOptions) -> Result<SessionFetcher> {
    let config = FetchConfig {
        timeout: options.timeout,
        cookie: options.cookie.clone(),
        ..FetchConfig::default()
    };
    Ok(SessionFetcher::new(config)?)
}

fn loading_message(input: &str) -> String {
    if input == "-" {
        return "Reading from stdin".to_string();
    }
    if input.starts_with("http://") || input.starts_with("https://") {
        return format!("Fetching {}", input.bright_white().underline());
    }
    format!("Reading {}", input.bright_white())
}

/// Resolve an input to page HTML plus the source URL identifying it.
///
/// URLs are validated before any traffic. Stdin has no inherent identity,
/// so `--url` is mandatory there; for files it is optional and the
/// conversion degrades to an anonymous source when absent.
async fn load_input(
    input: &str,
    options: &ConvertOptions,
    session: &SessionFetcher,
) -> Result<(String, String)> {
    if input == "-" {
        let Some(url) = options.url.clone() else {
            return Err(UserError("Reading from stdin requires --url.".to_string()).into());
        };
        validate_article_url(&url)?;
        let mut html = String::new();
        io::stdin().read_to_string(&mut html).context("Failed to read from stdin")?;
        return Ok((html, url));
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        validate_article_url(input)?;
        let html = session.fetch_page(input).await?;
        return Ok((html, input.to_string()));
    }

    let html =
        fs::read_to_string(input).with_context(|| format!("Failed to read file: {}", input))?;
    let url = options.url.clone().unwrap_or_default();
    if !url.is_empty() {
        validate_article_url(&url)?;
    }
    Ok((html, url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args() -> ConvertArgs {
        ConvertArgs {
            inputs: vec!["https://x.com/jane/article/1".to_string()],
            output: None,
            no_upload: false,
            title: None,
            url: None,
            cookie: None,
            timeout: 30,
            verbose: false,
        }
    }

    #[test]
    fn test_merge_prefers_flags_over_defaults() {
        let mut args = bare_args();
        args.cookie = Some("auth_token=flag".to_string());
        let defaults = UserDefaults {
            cookie: Some("auth_token=stored".to_string()),
            ..Default::default()
        };

        let options = merge_options(&args, &defaults);
        assert_eq!(options.cookie.as_deref(), Some("auth_token=flag"));
    }

    #[test]
    fn test_merge_falls_back_to_stored_defaults() {
        let args = bare_args();
        let defaults = UserDefaults {
            no_upload: Some(true),
            verbose: Some(true),
            output: Some("out.kepub.epub".to_string()),
            cookie: Some("auth_token=stored".to_string()),
        };

        let options = merge_options(&args, &defaults);
        assert!(options.no_upload);
        assert!(options.verbose);
        assert_eq!(options.output, Some(PathBuf::from("out.kepub.epub")));
        assert_eq!(options.cookie.as_deref(), Some("auth_token=stored"));
    }

    #[test]
    fn test_merge_without_defaults_uses_builtins() {
        let options = merge_options(&bare_args(), &UserDefaults::default());
        assert!(!options.no_upload);
        assert!(!options.verbose);
        assert!(options.output.is_none());
        assert!(options.cookie.is_none());
        assert_eq!(options.timeout, 30);
    }
}
