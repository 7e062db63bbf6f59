use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Kobopress".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Convert X Article pages into Kobo-ready KEPUB files\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// What one finished conversion looked like.
pub struct ConversionSummary {
    pub title: String,
    pub author: String,
    pub reading_time: u32,
    pub images_downloaded: usize,
    pub images_found: usize,
    pub file_size: usize,
    pub file_path: String,
    pub dropbox_path: Option<String>,
}

/// Print the post-conversion summary block.
pub fn print_summary(summary: &ConversionSummary) {
    eprintln!();
    eprintln!("{}", "Conversion complete!".bold());
    eprintln!();
    eprintln!("  {} {}", "Title:".dimmed(), summary.title.bright_white());
    eprintln!("  {} {}", "Author:".dimmed(), summary.author.bright_white());
    eprintln!("  {} {} min", "Reading time:".dimmed(), summary.reading_time);
    if summary.images_found > 0 {
        eprintln!(
            "  {} {} of {} downloaded",
            "Images:".dimmed(),
            summary.images_downloaded,
            summary.images_found
        );
    }
    eprintln!("  {} {}", "File size:".dimmed(), format_size(summary.file_size));
    eprintln!("  {} {}", "Saved to:".dimmed(), summary.file_path.bright_white());
    if let Some(path) = &summary.dropbox_path {
        eprintln!("  {} {}", "Dropbox:".dimmed(), path.bright_white());
    }
    eprintln!();
}

/// Outcome of one input in a batch run.
pub struct BatchResult {
    pub input: String,
    pub error: Option<String>,
}

/// Print the converted/failed tally after a multi-input run.
pub fn print_batch_summary(results: &[BatchResult]) {
    let failed: Vec<&BatchResult> = results.iter().filter(|r| r.error.is_some()).collect();
    let converted = results.len() - failed.len();

    eprintln!();
    eprintln!("{}", "Batch complete".bold());
    eprintln!("  {} {}", "Converted:".dimmed(), converted.to_string().bright_green());
    if !failed.is_empty() {
        eprintln!("  {} {}", "Failed:".dimmed(), failed.len().to_string().bright_red());
        for result in failed {
            let message = result.error.as_deref().unwrap_or("unknown error");
            eprintln!("    {} {}", result.input.dimmed(), message);
        }
    }
    eprintln!();
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
