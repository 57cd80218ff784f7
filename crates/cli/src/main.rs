//! covershift CLI - land-cover change classification and summary tables

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use covershift_algorithms::change::{
    collapse_classification, compute_labeled_stats, compute_stats, cover_summary,
    reclass_frequencies, remap_frequencies, six_class_classification,
    transition_table_from_registry, ChangeClass, CollapseParams, SixClassParams,
    StatsParams, TransitionTable, ValueRemap,
};
use covershift_core::{CategoryEntry, CategoryRegistry, CoverSchema, FrequencyTable};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "covershift")]
#[command(
    author,
    version,
    about = "Land-cover change classification and statistics",
    long_about = None
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Legends of both classifications: JSON files or a built-in schema
#[derive(clap::Args)]
struct Legends {
    /// Start classification legend (JSON array of {value, name})
    #[arg(long, requires = "end_cats", conflicts_with = "schema")]
    start_cats: Option<PathBuf>,
    /// End classification legend (JSON array of {value, name})
    #[arg(long, requires = "start_cats")]
    end_cats: Option<PathBuf>,
    /// Built-in legend for both classifications: nlcd or general
    #[arg(long)]
    schema: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the transition table over both legends
    Transitions {
        #[command(flatten)]
        legends: Legends,
        /// Output JSON file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Six-class change summary of a change frequency table
    SixClass {
        #[command(flatten)]
        legends: Legends,
        /// Frequency table of the combined change raster
        #[arg(short, long)]
        frequency: PathBuf,
        /// Job file with start_set, start_name, end_set, end_name, backwards
        #[arg(short, long, conflicts_with_all = ["start_set", "end_set"])]
        config: Option<PathBuf>,
        /// Start set category values, comma separated
        #[arg(long, value_delimiter = ',', requires = "end_set")]
        start_set: Vec<i64>,
        /// End set category values, comma separated
        #[arg(long, value_delimiter = ',')]
        end_set: Vec<i64>,
        /// Display name of the start set
        #[arg(long, default_value = "start")]
        start_name: String,
        /// Display name of the end set
        #[arg(long, default_value = "end")]
        end_name: String,
        /// Keep other-class → start set (5) apart from end set → start set (4)
        #[arg(short, long)]
        backwards: bool,
        /// Cell area in square meters
        #[arg(long, default_value = "900")]
        cell_area: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Collapse transitions into and out of one target class
    Collapse {
        #[command(flatten)]
        legends: Legends,
        /// Frequency table of the combined change raster
        #[arg(short, long)]
        frequency: PathBuf,
        /// Target category values, comma separated; the first is canonical
        #[arg(short, long, value_delimiter = ',', required = true)]
        target: Vec<i64>,
        /// Display name of the target
        #[arg(short, long)]
        name: String,
        /// Cell area in square meters
        #[arg(long, default_value = "900")]
        cell_area: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Area and percentage statistics of a frequency table
    Stats {
        #[arg(short, long)]
        frequency: PathBuf,
        /// Cell area in square meters
        #[arg(long, default_value = "900")]
        cell_area: f64,
        /// Values forming the percent-of-subset denominator, comma separated
        #[arg(short, long, value_delimiter = ',')]
        subset: Vec<i64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remap an NLCD frequency table to the general legend
    General {
        #[arg(short, long)]
        frequency: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Cover amounts and change over a time series
    Summary {
        /// YEAR=frequency.json, repeated; the first one sets the percent base
        #[arg(short, long = "year", required = true)]
        years: Vec<String>,
        /// Legend used to name values: nlcd or general
        #[arg(long)]
        schema: Option<String>,
        /// Cell area in square meters
        #[arg(long, default_value = "900")]
        cell_area: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a built-in legend
    Schema {
        /// nlcd or general
        name: String,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, text + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Saved to {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn parse_schema(name: &str) -> Result<CoverSchema> {
    CoverSchema::parse(name).ok_or_else(|| anyhow!("Unknown schema: {}. Use nlcd or general", name))
}

fn load_transitions(legends: &Legends) -> Result<TransitionTable> {
    let registry = match (&legends.start_cats, &legends.end_cats, &legends.schema) {
        (Some(start), Some(end), _) => {
            let start: Vec<CategoryEntry> = read_json(start)?;
            let end: Vec<CategoryEntry> = read_json(end)?;
            CategoryRegistry::from_entries(&start, &end).context("Invalid legend")?
        }
        (None, None, Some(schema)) => CategoryRegistry::from_schema(parse_schema(schema)?),
        _ => bail!("Give --start-cats and --end-cats, or --schema"),
    };
    let table =
        transition_table_from_registry(&registry).context("Failed to build transition table")?;
    debug!(
        "{} transitions, base {}",
        table.len(),
        table.encoder().base()
    );
    Ok(table)
}

fn stats_params(cell_area: f64) -> Result<StatsParams> {
    let params = StatsParams {
        cell_area_m2: cell_area,
    };
    params.validate()?;
    Ok(params)
}

fn parse_year(arg: &str) -> Result<(i32, PathBuf)> {
    let (year, path) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected YEAR=path, got '{}'", arg))?;
    let year = year
        .trim()
        .parse()
        .with_context(|| format!("Invalid year in '{}'", arg))?;
    Ok((year, PathBuf::from(path.trim())))
}

#[derive(Serialize)]
struct TransitionOut<'a> {
    code: i64,
    start_class: i64,
    start_class_name: &'a str,
    end_class: i64,
    end_class_name: &'a str,
    changed: bool,
    change_type: &'a str,
}

#[derive(Serialize)]
struct LegendOut {
    value: i64,
    name: &'static str,
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Transitions { legends, output } => {
            let table = load_transitions(&legends)?;
            let rows: Vec<_> = table
                .iter()
                .map(|r| TransitionOut {
                    code: r.code,
                    start_class: r.start.value,
                    start_class_name: &r.start.name,
                    end_class: r.end.value,
                    end_class_name: &r.end.name,
                    changed: r.changed,
                    change_type: &r.change_type,
                })
                .collect();
            write_json(&rows, output.as_deref())?;
        }

        Commands::SixClass {
            legends,
            frequency,
            config,
            start_set,
            end_set,
            start_name,
            end_name,
            backwards,
            cell_area,
            output,
        } => {
            let params: SixClassParams = match config {
                Some(path) => read_json(&path)?,
                None => SixClassParams {
                    start_set: start_set.into_iter().collect(),
                    end_set: end_set.into_iter().collect(),
                    start_name,
                    end_name,
                    backwards,
                },
            };
            let stats = stats_params(cell_area)?;
            let table = load_transitions(&legends)?;
            let freq: FrequencyTable = read_json(&frequency)?;

            let start = Instant::now();
            let classification =
                six_class_classification(table.codes(), table.encoder(), &params)
                    .context("Invalid six-class sets")?;
            let outcomes = reclass_frequencies(&freq, &classification.reclass_map())
                .context("Frequency table holds codes outside the legends")?;
            let in_start_set =
                |v: i64| ChangeClass::from_code(v).is_some_and(ChangeClass::in_start_set);
            let rows = compute_labeled_stats(
                &outcomes,
                stats,
                Some(&in_start_set),
                classification.outcome_labels(),
            )
            .context("Failed to compute six-class statistics")?;
            info!(
                "Six-class summary: {} to {} in {:.2?}",
                params.start_name,
                params.end_name,
                start.elapsed()
            );
            write_json(&rows, output.as_deref())?;
        }

        Commands::Collapse {
            legends,
            frequency,
            target,
            name,
            cell_area,
            output,
        } => {
            let params = CollapseParams::new(target, name);
            let stats = stats_params(cell_area)?;
            let table = load_transitions(&legends)?;
            let freq: FrequencyTable = read_json(&frequency)?;

            let start = Instant::now();
            let join = collapse_classification(&table, &params).context("Invalid target set")?;
            let collapsed = reclass_frequencies(&freq, &join.reclass_map())
                .context("Frequency table holds codes outside the legends")?;
            let rows = compute_labeled_stats(&collapsed, stats, None, join.collapsed_labels())
                .context("Failed to compute collapse statistics")?;
            info!("Collapse around {} in {:.2?}", params.target_name, start.elapsed());
            write_json(&rows, output.as_deref())?;
        }

        Commands::Stats {
            frequency,
            cell_area,
            subset,
            output,
        } => {
            let freq: FrequencyTable = read_json(&frequency)?;
            let subset: BTreeSet<i64> = subset.into_iter().collect();
            let keep = |v: i64| subset.contains(&v);
            let filter: Option<&dyn Fn(i64) -> bool> =
                if subset.is_empty() { None } else { Some(&keep) };
            let rows = compute_stats(&freq, stats_params(cell_area)?, filter)
                .context("Failed to compute statistics")?;
            write_json(&rows, output.as_deref())?;
        }

        Commands::General { frequency, output } => {
            let freq: FrequencyTable = read_json(&frequency)?;
            let general = remap_frequencies(&freq, &ValueRemap::nlcd_to_general())
                .context("Frequency table holds values outside the NLCD legend")?;
            write_json(&general, output.as_deref())?;
        }

        Commands::Summary {
            years,
            schema,
            cell_area,
            output,
        } => {
            let schema = schema.as_deref().map(parse_schema).transpose()?;
            let mut tables = Vec::with_capacity(years.len());
            for arg in &years {
                let (year, path) = parse_year(arg)?;
                tables.push((year, read_json::<FrequencyTable>(&path)?));
            }
            let summary = cover_summary(&tables, stats_params(cell_area)?, schema)
                .context("Failed to summarize cover")?;
            info!(
                "Cover summary {}-{}: {} values",
                summary.start_year,
                summary.end_year,
                summary.rows.len()
            );
            write_json(&summary, output.as_deref())?;
        }

        Commands::Schema { name } => {
            let legend: Vec<_> = parse_schema(&name)?
                .legend()
                .iter()
                .map(|&(value, name)| LegendOut { value, name })
                .collect();
            write_json(&legend, None)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year() {
        let (year, path) = parse_year("2001=lc2001_freq.json").unwrap();
        assert_eq!(year, 2001);
        assert_eq!(path, PathBuf::from("lc2001_freq.json"));
        assert!(parse_year("lc2001.json").is_err());
        assert!(parse_year("twenty=lc.json").is_err());
    }

    #[test]
    fn test_cli_parses_six_class_flags() {
        let cli = Cli::try_parse_from([
            "covershift",
            "six-class",
            "--schema",
            "general",
            "--frequency",
            "change.json",
            "--start-set",
            "4",
            "--end-set",
            "2",
            "--start-name",
            "Natural",
            "--backwards",
        ])
        .unwrap();
        match cli.command {
            Commands::SixClass {
                start_set,
                end_set,
                backwards,
                cell_area,
                ..
            } => {
                assert_eq!(start_set, vec![4]);
                assert_eq!(end_set, vec![2]);
                assert!(backwards);
                assert_eq!(cell_area, 900.0);
            }
            _ => panic!("expected six-class"),
        }
    }

    #[test]
    fn test_legends_from_schema() {
        let legends = Legends {
            start_cats: None,
            end_cats: None,
            schema: Some("general".into()),
        };
        let table = load_transitions(&legends).unwrap();
        assert_eq!(table.len(), 49);
        assert!(load_transitions(&Legends {
            start_cats: None,
            end_cats: None,
            schema: None,
        })
        .is_err());
    }
}
