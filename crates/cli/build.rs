use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    // Mirrors the derive-based CLI in src/main.rs closely enough for
    // completion purposes.
    let mut cmd = clap::Command::new("kobopress")
        .about("Convert X Article pages into Kobo-ready KEPUB files")
        .subcommand(
            clap::Command::new("convert")
                .about("Convert Article pages to KEPUB files")
                .arg(clap::arg!(<INPUT> ... "Article URLs, saved HTML files, or '-' for stdin"))
                .arg(
                    clap::arg!(-o --output <FILE> "Output file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(clap::arg!(--"no-upload" "Skip the Dropbox upload"))
                .arg(clap::arg!(--title <TITLE> "Override the extracted title"))
                .arg(clap::arg!(--url <URL> "Source URL for file or stdin input"))
                .arg(clap::arg!(--cookie <COOKIE> "Cookie header for pages behind a login"))
                .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
                .arg(clap::arg!(-v --verbose "Print progress detail")),
        )
        .subcommand(
            clap::Command::new("serve")
                .about("Run the local web UI and conversion API")
                .arg(clap::arg!(-p --port <PORT> "Port to listen on").default_value("3000")),
        )
        .subcommand(clap::Command::new("auth").about("Authorize Dropbox uploads"))
        .subcommand(
            clap::Command::new("status").about("Show configuration and Dropbox connection state"),
        )
        .subcommand(
            clap::Command::new("config")
                .about("Manage stored defaults")
                .subcommand(
                    clap::Command::new("set")
                        .about("Set a default")
                        .arg(clap::arg!(<KEY>))
                        .arg(clap::arg!(<VALUE>)),
                )
                .subcommand(
                    clap::Command::new("get").about("Print one stored default").arg(clap::arg!(<KEY>)),
                )
                .subcommand(clap::Command::new("list").about("Print every stored default"))
                .subcommand(clap::Command::new("reset").about("Clear all stored defaults")),
        )
        .subcommand(
            clap::Command::new("completions")
                .about("Generate a shell completion script")
                .arg(clap::arg!(<SHELL>).value_parser(["bash", "zsh", "fish", "powershell"])),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "kobopress", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "kobopress", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "kobopress", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "kobopress", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
