//! Kestrel CLI
//!
//! Loads stylesheets into one document engine and prints the resolved style
//! of a single element. Useful for checking what a sheet does to an element
//! and what it costs.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use kestrel_common::net::{LoaderConfig, ResourceLoader};
use kestrel_common::url::{Url, file_url_for_path, resolve_url};
use kestrel_css::limits::MAX_CSS_SIZE;
use kestrel_css::{ElementQuery, ResolvedStyle, StyleEngine, StylesheetReport};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Kestrel: resolve the style of one element
#[derive(Parser, Debug)]
#[command(name = "kestrel")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Style a rect with a class from a stylesheet file
    kestrel -s theme.css --tag rect --class "shape primary"

    # Inline CSS and presentation attributes
    kestrel --css '.a { fill: red }' --tag circle --class a -a stroke=black

    # JSON output
    kestrel -s theme.css --tag path --id logo --json
"#)]
struct Cli {
    /// Stylesheet file to load (repeatable, loaded in order)
    #[arg(short = 's', long = "stylesheet", value_name = "FILE")]
    stylesheets: Vec<PathBuf>,

    /// Stylesheet text to load after the files (repeatable)
    #[arg(long, value_name = "CSS")]
    css: Vec<String>,

    /// Element tag name
    #[arg(long)]
    tag: Option<String>,

    /// Element class attribute (whitespace separated)
    #[arg(long)]
    class: Option<String>,

    /// Element id
    #[arg(long)]
    id: Option<String>,

    /// Element style attribute
    #[arg(long, value_name = "DECLARATIONS")]
    style: Option<String>,

    /// Element attribute (repeatable)
    #[arg(short = 'a', long = "attr", value_name = "NAME=VALUE", value_parser = parse_attribute)]
    attributes: Vec<(String, String)>,

    /// Base URL for imports in --css text
    #[arg(long, value_name = "URL")]
    base: Option<String>,

    /// Allow imports over http and https
    #[arg(long)]
    allow_network: bool,

    /// Do not follow @import rules
    #[arg(long)]
    no_imports: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Totals over every stylesheet loaded.
#[derive(Debug, Default, Serialize)]
struct Summary {
    rules: usize,
    declarations: usize,
    imports: usize,
    warnings: Vec<String>,
    suppressed_warnings: usize,
    rejected: Vec<String>,
}

impl Summary {
    fn add(&mut self, report: StylesheetReport) {
        self.rules += report.rules;
        self.declarations += report.declarations;
        self.imports += report.imports;
        self.suppressed_warnings += report.suppressed_warnings;
        self.warnings
            .extend(report.warnings.into_iter().map(|warning| warning.to_string()));
    }
}

#[derive(Serialize)]
struct Output<'a> {
    style: &'a ResolvedStyle,
    summary: &'a Summary,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base_url = cli
        .base
        .as_deref()
        .map(|base| resolve_url(base, None))
        .transpose()
        .context("invalid --base URL")?;

    let mut engine = StyleEngine::new(loader(&cli, None));
    engine.set_allow_imports(!cli.no_imports);
    let mut summary = Summary::default();

    // Each file resolves its imports against its own location.
    for path in &cli.stylesheets {
        let css = read_stylesheet(path)?;
        *engine.acquirer_mut() = loader(&cli, file_url_for_path(path));
        match engine.parse_stylesheet(&css) {
            Ok(report) => summary.add(report),
            Err(error) => summary.rejected.push(format!("{}: {error}", path.display())),
        }
    }

    *engine.acquirer_mut() = loader(&cli, base_url);
    for (index, css) in cli.css.iter().enumerate() {
        match engine.parse_stylesheet_str(css) {
            Ok(report) => summary.add(report),
            Err(error) => summary.rejected.push(format!("--css #{}: {error}", index + 1)),
        }
    }

    let mut attributes = cli.attributes.clone();
    if let Some(style) = cli.style.as_ref().filter(|_| !attributes.is_empty()) {
        attributes.push(("style".to_string(), style.clone()));
    }

    let tag = cli.tag.as_deref().unwrap_or_default();
    let mut query = if attributes.is_empty() {
        ElementQuery::new(tag)
    } else {
        ElementQuery::from_attributes(tag, &attributes)
    };
    if let Some(class) = &cli.class {
        query = query.with_class_attribute(class);
    }
    if let Some(id) = &cli.id {
        query = query.with_id(id);
    }
    if let Some(style) = &cli.style {
        query = query.with_retained_style(style);
    }

    let style = engine.apply_styles(&query);

    if cli.json {
        let output = Output {
            style: &style,
            summary: &summary,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_style(&style);
        print_summary(&summary);
    }

    Ok(())
}

/// Parse a `NAME=VALUE` attribute argument.
fn parse_attribute(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{arg}'"))?;
    if name.is_empty() {
        return Err(format!("empty attribute name in '{arg}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn loader(cli: &Cli, base_url: Option<Url>) -> ResourceLoader {
    ResourceLoader::new(LoaderConfig {
        base_url,
        allow_network: cli.allow_network,
        max_bytes: Some(MAX_CSS_SIZE),
        ..LoaderConfig::default()
    })
}

/// Read a stylesheet file, stopping one byte past the size limit so the
/// engine can reject it without the whole file in memory.
fn read_stylesheet(path: &Path) -> anyhow::Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut css = Vec::new();
    let limit = u64::try_from(MAX_CSS_SIZE).unwrap_or(u64::MAX).saturating_add(1);
    let _ = file
        .take(limit)
        .read_to_end(&mut css)
        .with_context(|| format!("cannot read {}", path.display()))?;
    Ok(css)
}

fn print_style(style: &ResolvedStyle) {
    println!("=== Resolved Style ===");
    if style.is_empty() {
        println!("{}", "(no properties)".dimmed());
    }
    for (name, resolved) in style.iter() {
        let important = if resolved.important { " !important" } else { "" };
        println!(
            "  {}: {}{}  {}",
            name.cyan(),
            resolved.value,
            important.red(),
            format!("({})", resolved.origin).dimmed()
        );
    }
    if let Some(transform) = &style.transform {
        println!("  {}: {transform}", "transform".cyan());
    }
}

fn print_summary(summary: &Summary) {
    println!("\n=== Stylesheets ===");
    println!(
        "{} rules, {} declarations, {} imports",
        summary.rules, summary.declarations, summary.imports
    );

    for rejected in &summary.rejected {
        println!("  {} {rejected}", "rejected:".red());
    }

    let total = summary.warnings.len() + summary.suppressed_warnings;
    if total == 0 {
        return;
    }
    println!("\n=== Warnings ({total}) ===");
    for warning in &summary.warnings {
        println!("  - {}", warning.yellow());
    }
    if summary.suppressed_warnings > 0 {
        println!("  ... and {} more", summary.suppressed_warnings);
    }
}
