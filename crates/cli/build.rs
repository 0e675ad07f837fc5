use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("syndicate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Read Atom, RSS and RDF feeds as normalized stories")
        .arg(clap::arg!([INPUT] "Feed URL, local file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (json, jsonl, text, markdown)")
                .default_value("json")
                .value_parser(["json", "jsonl", "text", "markdown"]),
        )
        .arg(clap::arg!(--pretty "Pretty print JSON output"))
        .arg(clap::arg!(--content "Include story content (text and markdown only)"))
        .arg(clap::arg!(--width <COLS> "Wrap story content at this many columns, 0 to disable").default_value("0"))
        .arg(clap::arg!(--frontmatter "Include TOML frontmatter per story (markdown only)"))
        .arg(
            clap::arg!(-d --dialects <DIR> "Directory of extra dialect files")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"no-user-dialects" "Ignore dialect files in ~/.config/syndicate/dialects"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests"))
        .arg(clap::arg!(--"max-bytes" <BYTES> "Refuse documents larger than this many bytes"))
        .arg(clap::arg!(--"no-extra-dates" "Keep extra properties as text instead of detecting dates"))
        .arg(clap::arg!(--"list-dialects" "List the registered dialects and exit"))
        .arg(
            clap::arg!(--completions <SHELL> "Generate shell completion script")
                .value_parser(["bash", "zsh", "fish", "powershell", "elvish"]),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "syndicate", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "syndicate", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "syndicate", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "syndicate", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
