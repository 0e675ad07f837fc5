use std::time::Duration;

use owo_colors::OwoColorize;
use syndicate_core::{Registry, Story};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Syndicate".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Read Atom, RSS and RDF feeds as stories\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print a labelled detail line under a step
pub fn print_detail(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 50.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 500.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print how many stories each dialect produced
pub fn print_story_summary(stories: &[Story]) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Stories".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    let mut counts: Vec<(&str, usize)> = Vec::new();
    for story in stories {
        match counts.iter_mut().find(|(spec, _)| *spec == story.spec) {
            Some((_, count)) => *count += 1,
            None => counts.push((story.spec.as_str(), 1)),
        }
    }

    for (spec, count) in counts {
        print_detail(spec, &count.to_string());
    }
    print_detail("Total", &stories.len().to_string());
    eprintln!();
}

/// Print the registry as a table of names and item roots
pub fn print_dialects(registry: &Registry) {
    let width = registry.iter().map(|d| d.name.chars().count()).max().unwrap_or(0);

    for dialect in registry {
        println!(
            "{:<width$}  {}  {}",
            dialect.name.bold(),
            dialect.key().bright_cyan(),
            format!("({} fields)", dialect.fields.len()).dimmed(),
            width = width
        );
    }
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
