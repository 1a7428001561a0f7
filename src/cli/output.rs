//! CLI output formatting utilities.

use crate::config::Settings;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        eprintln!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        eprintln!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Deliver a result: print it to stdout, or write it to `path`.
    pub fn emit(text: &str, path: Option<&str>) -> std::io::Result<()> {
        match path {
            Some(path) => {
                let path = Settings::expand_path(path);
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, text)?;
                Output::success(&format!(
                    "Wrote {} ({})",
                    path.display(),
                    format_size(text.chars().count())
                ));
            }
            None => println!("{}", text),
        }
        Ok(())
    }
}

/// Format a character count for status lines.
fn format_size(chars: usize) -> String {
    if chars >= 10_000 {
        format!("{:.1}k chars", chars as f64 / 1000.0)
    } else {
        format!("{} chars", chars)
    }
}
