//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render serializable data in the chosen format.
///
/// `rows` builds the table view and `plain` the one-line-per-item view;
/// both are only called for their own format.
pub fn render<T, R>(
    format: &OutputFormat,
    data: &T,
    rows: impl FnOnce(&T) -> Vec<R>,
    plain: impl FnOnce(&T) -> Vec<String>,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
    R: Tabled,
{
    match format {
        OutputFormat::Table => Ok(render_table(&rows(data))),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(plain(data).join("\n")),
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

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Render(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: &'static str,
    }

    fn names() -> Vec<&'static str> {
        vec!["alpha", "bravo"]
    }

    fn run(format: &OutputFormat) -> String {
        render(
            format,
            &names(),
            |d| d.iter().copied().map(|name| Row { name }).collect(),
            |d| d.iter().map(ToString::to_string).collect(),
        )
        .unwrap()
    }

    #[test]
    fn every_format_renders() {
        assert!(run(&OutputFormat::Table).contains("Name"));
        assert_eq!(run(&OutputFormat::JsonCompact), r#"["alpha","bravo"]"#);
        assert!(run(&OutputFormat::Json).contains('\n'));
        assert_eq!(run(&OutputFormat::Yaml), "- alpha\n- bravo\n");
        assert_eq!(run(&OutputFormat::Plain), "alpha\nbravo");
    }

    #[test]
    fn empty_table_prints_nothing() {
        let out = render(
            &OutputFormat::Table,
            &Vec::<&str>::new(),
            |_| Vec::<Row>::new(),
            |_| Vec::new(),
        )
        .unwrap();
        assert!(out.is_empty());
    }
}
