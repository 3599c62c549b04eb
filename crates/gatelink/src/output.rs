//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders controller lists, the action catalog and the configuration in
//! the format selected by `--output`. A value that fails to serialize is
//! an error, never printed as output.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// "yes" in green or "no" in red, when colors are on.
pub fn yes_no(value: bool, color: bool) -> String {
    match (value, color) {
        (true, true) => "yes".green().to_string(),
        (false, true) => "no".red().to_string(),
        (true, false) => "yes".into(),
        (false, false) => "no".into(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of controllers or actions in the chosen format.
///
/// Tables go through a `Tabled` row type; `plain` prints one identifier
/// per line; the structured formats serialize `data` itself.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render one document, such as the resolved configuration. Table and
/// plain output fall back to TOML, the file's own format.
pub fn render_document<T: Serialize>(format: &OutputFormat, data: &T) -> Result<String, CliError> {
    match format {
        OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(data).map_err(render_err),
        structured => render_structured(structured, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Serde formats ────────────────────────────────────────────────────

fn render_structured<T: Serialize + ?Sized>(format: &OutputFormat, data: &T) -> Result<String, CliError> {
    match format {
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(render_err),
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(render_err),
        _ => serde_json::to_string_pretty(data).map_err(render_err),
    }
}

fn render_err(e: impl std::fmt::Display) -> CliError {
    CliError::Render {
        message: e.to_string(),
    }
}
