use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use owo_colors::OwoColorize;

mod auth;
mod convert;
mod dropbox;
mod echo;
mod errors;
mod serve;
mod store;
mod ui;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convert X Article pages into Kobo-ready KEPUB files
#[derive(Parser, Debug)]
#[command(name = "kobopress")]
#[command(version = VERSION)]
#[command(about = "Convert X Article pages into Kobo-ready KEPUB files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert Article pages to KEPUB files
    Convert(convert::ConvertArgs),
    /// Run the local web UI and conversion API
    Serve(serve::ServeArgs),
    /// Authorize Dropbox uploads
    Auth,
    /// Show configuration and Dropbox connection state
    Status,
    /// Manage stored defaults
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate a shell completion script
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Set a default (keys: output, no-upload, verbose, cookie)
    Set {
        key: String,
        value: String,
    },
    /// Print one stored default
    Get {
        key: String,
    },
    /// Print every stored default
    List,
    /// Clear all stored defaults
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        if errors::is_user_error(&error) {
            echo::print_error(&error.to_string());
        } else {
            echo::print_error(&format!("{:#}", error));
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert(args) => convert::run(args).await,
        Command::Serve(args) => serve::run(args).await,
        Command::Auth => auth::run().await,
        Command::Status => status(),
        Command::Config { action } => config(action),
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "kobopress", &mut io::stdout());
            Ok(())
        }
    }
}

fn status() -> Result<()> {
    println!("{}", "kobopress status".bold());
    println!();
    println!("Config directory: {}", store::config_dir().display());
    println!();

    let defaults = store::user_defaults();
    if defaults.cookie.is_some() {
        println!("X session: {}", "Cookie stored".green());
        println!("  (Run a conversion to verify it is still valid)");
    } else {
        println!("X session: {}", "No cookie stored".red());
        println!("  Run: kobopress config set cookie \"auth_token=...\"");
    }
    println!();

    match store::dropbox_tokens() {
        Some(tokens) if store::now_millis() >= tokens.expires_at => {
            println!("Dropbox: {}", "Token expired (will auto-refresh)".yellow());
        }
        Some(_) => {
            println!("Dropbox: {}", "Connected".green());
        }
        None => {
            println!("Dropbox: {}", "Not configured".red());
            println!("  Run: kobopress auth");
        }
    }
    println!();

    Ok(())
}

fn config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => config_set(&key, &value),
        ConfigAction::Get { key } => config_get(&key),
        ConfigAction::List => config_list(),
        ConfigAction::Reset => {
            store::save_user_defaults(store::UserDefaults::default())?;
            println!("All defaults cleared.");
            Ok(())
        }
    }
}

fn unknown_key(key: &str) -> anyhow::Error {
    errors::UserError(format!(
        "Unknown config key \"{}\". Valid keys: {}",
        key,
        store::VALID_DEFAULT_KEYS.join(", ")
    ))
    .into()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(errors::UserError(format!(
            "Invalid value \"{}\" for {}. Expected \"true\" or \"false\".",
            raw, key
        ))
        .into()),
    }
}

fn config_set(key: &str, value: &str) -> Result<()> {
    let mut defaults = store::user_defaults();
    match key {
        "output" => defaults.output = Some(value.to_string()),
        "cookie" => defaults.cookie = Some(value.to_string()),
        "no-upload" => defaults.no_upload = Some(parse_bool(key, value)?),
        "verbose" => defaults.verbose = Some(parse_bool(key, value)?),
        _ => return Err(unknown_key(key)),
    }
    store::save_user_defaults(defaults)?;
    println!("Set {} = {}", key, value);
    Ok(())
}

fn config_get(key: &str) -> Result<()> {
    let defaults = store::user_defaults();
    let value = match key {
        "output" => defaults.output,
        "cookie" => defaults.cookie,
        "no-upload" => defaults.no_upload.map(|v| v.to_string()),
        "verbose" => defaults.verbose.map(|v| v.to_string()),
        _ => return Err(unknown_key(key)),
    };
    match value {
        Some(value) => println!("{}: {}", key, value),
        None => println!("{}: (not set)", key),
    }
    Ok(())
}

fn config_list() -> Result<()> {
    let defaults = store::user_defaults();
    let mut entries = Vec::new();
    if let Some(output) = &defaults.output {
        entries.push(("output", output.clone()));
    }
    if let Some(no_upload) = defaults.no_upload {
        entries.push(("no-upload", no_upload.to_string()));
    }
    if let Some(verbose) = defaults.verbose {
        entries.push(("verbose", verbose.to_string()));
    }
    if let Some(cookie) = &defaults.cookie {
        entries.push(("cookie", cookie.clone()));
    }

    if entries.is_empty() {
        println!("No defaults configured.");
        return Ok(());
    }
    for (key, value) in entries {
        println!("{}: {}", key, value);
    }
    Ok(())
}
