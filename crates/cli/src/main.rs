mod echo;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use syndicate_core::{
    DialectLoader, FeedReader, Input, JsonConfig, MarkdownConfig, ReaderConfig, Registry, Story, TextConfig,
    convert_to_json, convert_to_markdown, convert_to_text, parse_url,
};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for extracted stories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    JsonLines,
    Text,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(format!("Invalid format: {}. Valid options: json, jsonl, text, markdown", s)),
        }
    }
}

/// Read Atom, RSS and RDF feeds as normalized stories
#[derive(Parser, Debug)]
#[command(name = "syndicate")]
#[command(version)]
#[command(about = "Read Atom, RSS and RDF feeds as normalized stories", long_about = None)]
struct Args {
    /// Feed URL, local file, or "-" for stdin
    #[arg(value_name = "INPUT", required_unless_present_any = ["list_dialects", "completions"])]
    input: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (json, jsonl, text, markdown)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    format: OutputFormat,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Include story content (text and markdown only)
    #[arg(long)]
    content: bool,

    /// Wrap story content at this many columns, 0 to disable (text only)
    #[arg(long, default_value = "0", value_name = "COLS")]
    width: usize,

    /// Include TOML frontmatter per story (markdown only)
    #[arg(long)]
    frontmatter: bool,

    /// Directory of extra dialect files
    #[arg(short, long, value_name = "DIR")]
    dialects: Option<PathBuf>,

    /// Ignore dialect files in ~/.config/syndicate/dialects
    #[arg(long)]
    no_user_dialects: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Refuse documents larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    max_bytes: Option<usize>,

    /// Keep extra properties as text instead of detecting dates
    #[arg(long)]
    no_extra_dates: bool,

    /// List the registered dialects and exit
    #[arg(long)]
    list_dialects: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "syndicate=debug,syndicate_core=debug" } else { "syndicate_core=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn load_registry(args: &Args) -> anyhow::Result<Registry> {
    let mut builder = DialectLoader::builder();
    if !args.no_user_dialects {
        builder = builder.default_standard_dir();
    }
    if let Some(dir) = &args.dialects {
        builder = builder.custom_dir(dir);
    }

    let loader = builder.build();
    tracing::debug!("Loading dialects with {:?}", loader);
    loader.build_registry().context("Failed to load dialects")
}

fn reader_config(args: &Args) -> ReaderConfig {
    let mut builder = ReaderConfig::builder()
        .timeout(args.timeout)
        .max_bytes(args.max_bytes)
        .extra_dates(!args.no_extra_dates);

    if let Some(user_agent) = &args.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }

    builder.build()
}

/// Resolve the positional argument into a reader input
fn resolve_input(input: &str) -> anyhow::Result<Input> {
    if input == "-" {
        return Input::from_reader(io::stdin().lock()).context("Failed to read from stdin");
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        return Ok(Input::Url(parse_url(input)?));
    }

    Ok(Input::Path(PathBuf::from(input)))
}

fn render(stories: &[Story], args: &Args) -> anyhow::Result<String> {
    let output = match args.format {
        OutputFormat::Json => {
            let config = JsonConfig { pretty: args.pretty, lines: false };
            convert_to_json(stories, &config).context("Failed to serialize stories")?
        }
        OutputFormat::JsonLines => {
            let config = JsonConfig { pretty: false, lines: true };
            convert_to_json(stories, &config).context("Failed to serialize stories")?
        }
        OutputFormat::Text => {
            let config = TextConfig { include_content: args.content, line_width: args.width };
            convert_to_text(stories, &config)
        }
        OutputFormat::Markdown => {
            let config = MarkdownConfig { include_content: args.content, include_frontmatter: args.frontmatter };
            convert_to_markdown(stories, &config)
        }
    };

    Ok(output)
}

async fn run(args: &Args) -> anyhow::Result<()> {
    if let Some(shell) = args.completions {
        let mut cmd = Args::command();
        clap_complete::generate(shell, &mut cmd, "syndicate", &mut io::stdout());
        return Ok(());
    }

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
        echo::print_step(1, 4, "Loading dialects");
    }

    let started = Instant::now();
    let registry = load_registry(args)?;

    if args.verbose {
        echo::print_detail("Dialects", &registry.len().to_string());
        echo::print_timing("Load", started.elapsed());
        eprintln!();
    }

    if args.list_dialects {
        echo::print_dialects(&registry);
        return Ok(());
    }

    let source = args.input.as_deref().context("No input given")?;
    let input = resolve_input(source)?;

    if args.verbose {
        let message = match &input {
            Input::Url(url) => format!("Fetching {}", url.as_str().bright_white().underline()),
            Input::Path(path) => format!("Reading file {}", path.display().bright_white()),
            Input::Content(bytes) => format!("Reading {} from stdin", echo::format_size(bytes.len())),
        };
        echo::print_step(2, 4, &message);
    }

    let started = Instant::now();
    let reader = FeedReader::with_config(registry, reader_config(args));
    let stories = reader.read(input).await.with_context(|| format!("Failed to read {}", source))?;

    if args.verbose {
        echo::print_timing("Read", started.elapsed());
        echo::print_story_summary(&stories);
    }

    if stories.is_empty() {
        echo::print_warning("No stories found; the document matched no registered dialect");
    }

    if args.verbose {
        echo::print_step(3, 4, "Rendering stories");
        echo::print_detail("Format", &format!("{:?}", args.format));
        eprintln!();
    }

    let output = render(&stories, args)?;
    tracing::debug!("Rendered {} stories into {} bytes", stories.len(), output.len());

    if args.verbose {
        echo::print_step(4, 4, "Writing output");
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!(
                "{} stories written to {} ({})",
                stories.len(),
                path.display().bright_white(),
                echo::format_size(output.len())
            ));
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(&args).await {
        echo::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}
