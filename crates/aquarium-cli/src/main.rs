use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use aquarium_config::{Category, CellRef, Configuration, Edit, SheetEntry, Value, ValueTree};
use aquarium_parts::Section;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "aquarium",
    version,
    about = "Inspect and edit a parametric aquarium configuration",
    long_about = "Starts from the standard defaults, applies the optional edit file and \
                  --set assignments as one batch, then runs the command."
)]
struct Cli {
    /// JSON or TOML file mapping Sheet -> Name -> value.
    #[arg(long, global = true, env = "AQUARIUM_EDITS")]
    edits: Option<PathBuf>,

    /// Single assignment such as `Config.Width=1000`; may be repeated.
    #[arg(long = "set", global = true, value_parser = parse_assignment)]
    assignments: Vec<(CellRef, Value)>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every declared setting with its bounds.
    Schema {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Print the current repository values as JSON.
    Config,
    /// Print the derived sheet.
    Computed {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Evaluate a formula such as `Computed.Width/2`.
    Eval { formula: String },
    /// List the settings tagged with a category.
    Category { tag: String },
    /// Generate the part plan and print its resolved values as JSON.
    Parts {
        /// Restrict generation to these sections.
        #[arg(long = "section", value_parser = parse_section)]
        sections: Vec<Section>,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    print!("{}", run(cli)?);
    Ok(())
}

fn run(cli: Cli) -> Result<String> {
    let mut config = Configuration::new().context("failed to open the standard configuration")?;

    let mut edits = match &cli.edits {
        Some(path) => read_edits(path)?,
        None => Vec::new(),
    };
    for (cell, value) in &cli.assignments {
        let schema = cell
            .sheet
            .parse()
            .with_context(|| format!("cannot assign {cell}"))?;
        edits.push(Edit::new(schema, &cell.name, *value));
    }
    if !edits.is_empty() {
        let applied = config.apply_edits(&edits).context("edits were refused")?;
        info!(requested = edits.len(), applied = applied.len(), "applied edits");
    }

    match cli.command {
        Command::Schema { json } => schema(&config, json),
        Command::Config => Ok(serde_json::to_string_pretty(&config.values()?)? + "\n"),
        Command::Computed { json } => computed(&config, json),
        Command::Eval { formula } => {
            let value = config
                .evaluate(&formula)
                .with_context(|| format!("cannot evaluate '{formula}'"))?;
            Ok(format!("{value}\n"))
        }
        Command::Category { tag } => category(&config, &tag),
        Command::Parts { sections } => parts(&mut config, &sections),
    }
}

fn schema(config: &Configuration, json: bool) -> Result<String> {
    let settings = config.settings()?;
    if json {
        return Ok(serde_json::to_string_pretty(&settings)? + "\n");
    }
    let mut out = String::new();
    for entry in settings {
        writeln!(
            out,
            "{}.{} = {} (default {}) {}",
            entry.schema, entry.name, entry.value, entry.default, entry.description
        )?;
    }
    Ok(out)
}

fn computed(config: &Configuration, json: bool) -> Result<String> {
    let entries = config.computed_sheet()?;
    if json {
        return Ok(serde_json::to_string_pretty(&entries)? + "\n");
    }
    let mut out = String::new();
    for entry in entries {
        match entry {
            SheetEntry::Separator { label } => writeln!(out, "# {label}")?,
            SheetEntry::Cell {
                name,
                formula,
                value,
                ..
            } => match value {
                Some(value) => writeln!(out, "{name} = {value}  {formula}")?,
                None => writeln!(out, "{name} = ?  {formula}")?,
            },
        }
    }
    Ok(out)
}

fn category(config: &Configuration, tag: &str) -> Result<String> {
    let category: Category = tag.parse()?;
    let mut out = String::new();
    for (schema, name) in config.category(category) {
        writeln!(out, "{schema}.{name}")?;
    }
    Ok(out)
}

fn parts(config: &mut Configuration, sections: &[Section]) -> Result<String> {
    let assembly = if sections.is_empty() {
        aquarium_parts::generate(config)?
    } else {
        aquarium_parts::generate_sections(config, sections)?
    };
    let resolved = assembly.resolve(config)?;
    Ok(serde_json::to_string_pretty(&resolved)? + "\n")
}

/// Reads an edit file; `.toml` files are TOML, anything else JSON.
fn read_edits(path: &Path) -> Result<Vec<Edit>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let tree: ValueTree = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&raw).with_context(|| format!("invalid TOML in {}", path.display()))?
    } else {
        serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))?
    };
    Ok(Edit::from_tree(&tree)?)
}

fn parse_assignment(text: &str) -> Result<(CellRef, Value)> {
    let Some((cell, value)) = text.split_once('=') else {
        bail!("expected Sheet.Name=value, got '{text}'");
    };
    let cell: CellRef = cell.parse()?;
    let value = match value.trim() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        number => Value::Number(
            number
                .parse()
                .with_context(|| format!("'{number}' is not a number or boolean"))?,
        ),
    };
    Ok((cell, value))
}

fn parse_section(text: &str) -> Result<Section> {
    Section::ALL
        .into_iter()
        .find(|section| section.name().eq_ignore_ascii_case(text))
        .with_context(|| {
            let names: Vec<&str> = Section::ALL.iter().map(|section| section.name()).collect();
            format!("unknown section '{text}', expected one of {}", names.join(", "))
        })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use aquarium_config::{CellRef, Value};
    use aquarium_parts::Section;
    use clap::Parser;

    use super::{Cli, parse_assignment, parse_section, read_edits, run};

    fn run_args(args: &[&str]) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("aquarium").chain(args.iter().copied()))
            .expect("arguments should parse");
        run(cli)
    }

    #[test]
    fn parses_assignments() {
        let (cell, value) = parse_assignment("Config.Width=1000").expect("assignment");
        assert_eq!(cell, CellRef::new("Config", "Width"));
        assert_eq!(value, Value::Number(1000.0));

        let (_, flag) = parse_assignment("Config.StandCut45=false").expect("flag");
        assert_eq!(flag, Value::Bool(false));

        assert!(parse_assignment("Config.Width").is_err());
        assert!(parse_assignment("Config.Width=wide").is_err());
    }

    #[test]
    fn parses_sections_case_insensitively() {
        assert_eq!(parse_section("flanges").expect("section"), Section::Flanges);
        let err = parse_section("Roof").expect_err("unknown section");
        assert!(err.to_string().contains("StandStructure"));
    }

    #[test]
    fn reads_json_and_toml_edit_files() {
        let mut json = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("temp file");
        write!(json, r#"{{"Config": {{"Width": 1000, "GlassCut45": true}}}}"#).expect("write");
        let edits = read_edits(json.path()).expect("json edits");
        assert_eq!(edits.len(), 2);
        assert!(edits.iter().any(|edit| edit.name == "GlassCut45" && edit.value == Value::Bool(true)));

        let mut toml = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(toml, "[ConfigPipesDrain]\nPipeDiameter = 40\n[Config]\nLength = 600.5").expect("write");
        let edits = read_edits(toml.path()).expect("toml edits");
        assert_eq!(edits.len(), 2);
        assert!(edits.iter().any(|edit| edit.name == "PipeDiameter" && edit.value == Value::Number(40.0)));
    }

    #[test]
    fn edit_file_and_assignments_apply_as_one_batch() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("temp file");
        write!(file, r#"{{"Config": {{"Width": 1000}}}}"#).expect("write");
        let path = file.path().to_str().expect("utf-8 path");

        let out = run_args(&["--edits", path, "eval", "Computed.Width"]).expect("eval");
        assert_eq!(out.trim(), "970");

        let err = run_args(&["--edits", path, "--set", "Config.Length=5", "eval", "Config.Width"])
            .expect_err("out of range");
        assert!(format!("{err:#}").contains("Config.Length = 5 is outside"));
    }

    #[test]
    fn computed_listing_shows_separators() {
        let out = run_args(&["computed"]).expect("computed");
        assert!(out.starts_with("# Inner dimensions\n"));
        assert!(out.contains("Width = 1170  =Config.Width-2*Config.PanelThickness"));
    }

    #[test]
    fn category_lists_dotted_names() {
        let out = run_args(&["category", "weir"]).expect("category");
        assert!(out.lines().any(|line| line == "Config.BulkHeadNumber"));
        assert!(run_args(&["category", "roof"]).is_err());
    }

    #[test]
    fn parts_for_one_section() {
        let out = run_args(&["parts", "--section", "Pipes"]).expect("parts");
        let json: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(json[0]["name"], "Pipes");
        assert_eq!(json[0]["features"].as_array().map(Vec::len), Some(6));
    }
}
