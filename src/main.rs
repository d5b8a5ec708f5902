mod logging;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tracing::{debug, info};

use gitpatterns_convert::{convert_to_transactions, Conversion, QuantileView};
use gitpatterns_core::{
    AttributeCatalog, AttributeSpec, DataSource, Locale, MiningParams, OutputFormat,
    PatternsConfig, PatternsError,
};
use gitpatterns_mining::{mine_patterns, RuleTable};
use gitpatterns_samples::{load_sample, merge_samples, Sample};

use crate::logging::{LogConfig, LogFormat};

/// Exit status for recoverable conditions (no data, too few rows, no patterns).
const CONDITION_EXIT_CODE: i32 = 2;

const CONFIG_FILE: &str = ".gitpatterns.toml";

#[derive(Parser)]
#[command(
    name = "gitpatterns",
    version,
    about = "Association pattern mining over GitHub repository attributes",
    long_about = "gitpatterns finds attribute combinations that co-occur across GitHub repositories.\n\n\
                   Repository samples are cleaned, numeric attributes are bucketed into quartiles\n\
                   or deciles, and Apriori association rules are mined from the result.\n\n\
                   Examples:\n  \
                     gitpatterns mine jan.toml feb.toml           Mine rules from two samples\n  \
                     gitpatterns mine jan.toml --min-lift 1.5     Keep only strong rules\n  \
                     gitpatterns quantiles jan.toml               Show bucket boundaries\n  \
                     gitpatterns attributes                       List known attributes"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .gitpatterns.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Args)]
struct SampleArgs {
    /// Sample manifests to merge (TOML files pointing at a CSV of repositories)
    #[arg(required = true)]
    samples: Vec<PathBuf>,

    /// Fewest repositories each sample must hold (default: 200)
    #[arg(long)]
    min_rows: Option<usize>,

    /// Language of table labels and messages (en, ru)
    #[arg(long)]
    locale: Option<Locale>,
}

#[derive(Subcommand)]
enum Command {
    /// Mine association rules from repository samples
    #[command(long_about = "Mine association rules from repository samples.\n\n\
        Every manifest names a CSV of repositories and the quantile division of each\n\
        attribute. Samples must use identical divisions to be mined together.\n\
        Thresholds default to the [mining] section of .gitpatterns.toml.\n\n\
        Examples:\n  gitpatterns mine sample.toml\n  gitpatterns mine a.toml b.toml --min-support 0.2 --min-confidence 0.8\n  gitpatterns mine sample.toml --format json --limit 20")]
    Mine {
        #[command(flatten)]
        input: SampleArgs,

        /// Minimum itemset support, in (0, 1] (default: 0.1)
        #[arg(long)]
        min_support: Option<f64>,

        /// Minimum rule confidence, 0 disables the filter (default: 0.5)
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Minimum rule lift (default: 1.0)
        #[arg(long)]
        min_lift: Option<f64>,

        /// Fewest items on the left-hand side (default: 1)
        #[arg(long)]
        min_antecedents: Option<usize>,

        /// Most items on the left-hand side (default: 3)
        #[arg(long)]
        max_antecedents: Option<usize>,

        /// Fewest items on the right-hand side (default: 1)
        #[arg(long)]
        min_consequents: Option<usize>,

        /// Most items on the right-hand side (default: 3)
        #[arg(long)]
        max_consequents: Option<usize>,

        /// Show at most this many rules
        #[arg(long)]
        limit: Option<usize>,

        /// Leave quartile and decile tables out of the output
        #[arg(long)]
        no_quantiles: bool,
    },
    /// Show quartile and decile boundaries of repository samples
    #[command(long_about = "Show quartile and decile boundaries of repository samples.\n\n\
        Runs cleaning and discretization without mining and prints the value range\n\
        of every bucket, highest bucket first.\n\n\
        Examples:\n  gitpatterns quantiles sample.toml\n  gitpatterns quantiles a.toml b.toml --locale ru")]
    Quantiles {
        #[command(flatten)]
        input: SampleArgs,
    },
    /// List the attributes the catalog knows about
    Attributes,
    /// Create a default .gitpatterns.toml configuration file
    #[command(long_about = "Create a default .gitpatterns.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .gitpatterns.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Per-sample line of the mining report.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SampleSummary<'a> {
    manifest: &'a Path,
    start_date: &'a str,
    end_date: &'a str,
    repositories: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MineReport<'a> {
    samples: Vec<SampleSummary<'a>>,
    repositories: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    quartiles: Option<&'a QuantileView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deciles: Option<&'a QuantileView>,
    rules: &'a RuleTable,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mgitpatterns\x1b[0m v{version}: attribute patterns of GitHub repositories\n");

        println!("Quick start:");
        println!("  \x1b[36mgitpatterns init\x1b[0m                Create a .gitpatterns.toml config file");
        println!("  \x1b[36mgitpatterns mine sample.toml\x1b[0m    Mine association rules from a sample\n");

        println!("All commands:");
        println!("  \x1b[32mmine\x1b[0m        Association rules from one or more samples");
        println!("  \x1b[32mquantiles\x1b[0m   Quartile and decile boundaries of samples");
        println!("  \x1b[32mattributes\x1b[0m  Attributes known to the catalog");
        println!("  \x1b[32minit\x1b[0m        Create default configuration\n");
    } else {
        println!("gitpatterns v{version}: attribute patterns of GitHub repositories\n");

        println!("Quick start:");
        println!("  gitpatterns init                Create a .gitpatterns.toml config file");
        println!("  gitpatterns mine sample.toml    Mine association rules from a sample\n");

        println!("All commands:");
        println!("  mine        Association rules from one or more samples");
        println!("  quantiles   Quartile and decile boundaries of samples");
        println!("  attributes  Attributes known to the catalog");
        println!("  init        Create default configuration\n");
    }

    println!("Run 'gitpatterns <command> --help' for details.");
}

/// Report a recoverable condition and exit, or hand any other error back.
fn condition_or_report(err: PatternsError, format: OutputFormat, locale: Locale) -> miette::Report {
    let Some(kind) = err.condition() else {
        return err.into();
    };
    let message = err.localized(locale);
    if format == OutputFormat::Json {
        let body = serde_json::json!({ "condition": kind, "message": message });
        println!("{body:#}");
    } else {
        eprintln!("{message}");
    }
    std::process::exit(CONDITION_EXIT_CODE);
}

/// Load, merge and convert the samples named on the command line.
fn prepare(
    input: &SampleArgs,
    min_rows: usize,
    catalog: &AttributeCatalog,
    locale: Locale,
) -> std::result::Result<(Vec<Sample>, Conversion, usize), PatternsError> {
    let samples = input
        .samples
        .iter()
        .map(|path| load_sample(path, catalog, min_rows))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let (table, quantile_config) = merge_samples(&samples)?;
    let repositories = table.row_count();
    let conversion = convert_to_transactions(&table, &quantile_config, catalog, locale);
    if conversion.transactions.is_empty() {
        return Err(PatternsError::EmptyTable(
            "no attribute survived cleaning".into(),
        ));
    }
    Ok((samples, conversion, repositories))
}

fn spinner(message: &'static str) -> Result<Option<indicatif::ProgressBar>> {
    if !std::io::stderr().is_terminal() {
        return Ok(None);
    }
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(
        indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
            .into_diagnostic()?,
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Ok(Some(pb))
}

fn source_name(source: DataSource) -> &'static str {
    match source {
        DataSource::ClickhouseQuery => "events",
        DataSource::GithubApi => "api",
    }
}

fn print_attributes(catalog: &AttributeCatalog, format: OutputFormat) -> Result<()> {
    let specs: Vec<&AttributeSpec> = catalog.iter().collect();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&specs).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("| Attribute | Type | Source | Label |");
            println!("|---|---|---|---|");
            for spec in specs {
                println!(
                    "| `{}` | {} | {} | {} |",
                    spec.column_name,
                    spec.dtype,
                    source_name(spec.source),
                    spec.decode_name
                );
            }
        }
        OutputFormat::Text => {
            let width = specs.iter().map(|s| s.column_name.len()).max().unwrap_or(0);
            for spec in specs {
                println!(
                    "{:<width$}  {:<5}  {:<6}  {}",
                    spec.column_name,
                    spec.dtype.to_string(),
                    source_name(spec.source),
                    spec.decode_name
                );
            }
        }
    }
    Ok(())
}

fn print_views(views: [Option<&QuantileView>; 2], format: OutputFormat) {
    for view in views.into_iter().flatten() {
        match format {
            OutputFormat::Markdown => println!("{}", view.to_markdown()),
            _ => println!("{view}"),
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# gitpatterns configuration

# Language of table labels and messages ("en" or "ru")
# locale = "en"

[mining]
# min_support = 0.1
# min_confidence = 0.5
# min_lift = 1.0
# min_antecedents = 1
# max_antecedents = 3
# min_consequents = 1
# max_consequents = 3

[samples]
# Fewest repositories a sample must hold
# min_rows = 200

[attributes]
# JSON file replacing the built-in attribute catalog
# catalog = "attributes.json"
"#;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    let log_format = if std::io::stderr().is_terminal() {
        LogFormat::Pretty
    } else {
        LogFormat::Compact
    };
    logging::init_logging(
        &LogConfig::from_verbosity(cli.verbose)
            .with_ansi(use_color)
            .with_format(log_format),
    );

    let config = match &cli.config {
        Some(path) => PatternsConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                PatternsConfig::from_file(default_path)?
            } else {
                PatternsConfig::default()
            }
        }
    };
    debug!(format = %cli.format, locale = %config.locale, "configuration loaded");

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Mine {
            ref input,
            min_support,
            min_confidence,
            min_lift,
            min_antecedents,
            max_antecedents,
            min_consequents,
            max_consequents,
            limit,
            no_quantiles,
        }) => {
            let locale = input.locale.unwrap_or(config.locale);
            let min_rows = input.min_rows.unwrap_or(config.samples.min_rows);
            let defaults = &config.mining;
            let params = MiningParams {
                min_support: min_support.unwrap_or(defaults.min_support),
                min_confidence: min_confidence.unwrap_or(defaults.min_confidence),
                min_lift: min_lift.unwrap_or(defaults.min_lift),
                min_antecedents: min_antecedents.unwrap_or(defaults.min_antecedents),
                max_antecedents: max_antecedents.unwrap_or(defaults.max_antecedents),
                min_consequents: min_consequents.unwrap_or(defaults.min_consequents),
                max_consequents: max_consequents.unwrap_or(defaults.max_consequents),
            };
            params.validate()?;
            debug!(?params, min_rows, "mining parameters");

            let catalog = config.load_catalog()?;
            let spinner = spinner("Mining patterns...")?;
            let mined = prepare(input, min_rows, &catalog, locale).and_then(|prepared| {
                let rules = mine_patterns(&prepared.1.transactions, &params)?;
                Ok((prepared, rules))
            });
            let ((samples, conversion, repositories), mut rules) = match mined {
                Ok(mined) => {
                    if let Some(pb) = &spinner {
                        pb.finish_with_message("Done");
                    }
                    mined
                }
                Err(err) => {
                    if let Some(pb) = &spinner {
                        pb.finish_with_message("Failed");
                    }
                    return Err(condition_or_report(err, cli.format, locale));
                }
            };
            if let Some(limit) = limit {
                rules.rules.truncate(limit);
            }
            info!(rules = rules.len(), repositories, "mining finished");

            let (quartiles, deciles) = if no_quantiles {
                (None, None)
            } else {
                (conversion.quartiles.as_ref(), conversion.deciles.as_ref())
            };
            let report = MineReport {
                samples: samples
                    .iter()
                    .zip(&input.samples)
                    .map(|(sample, path)| SampleSummary {
                        manifest: path,
                        start_date: &sample.manifest.start_date,
                        end_date: &sample.manifest.end_date,
                        repositories: sample.table.row_count(),
                        note: sample.manifest.note.as_deref(),
                    })
                    .collect(),
                repositories,
                quartiles,
                deciles,
                rules: &rules,
            };

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => {
                    println!("## Samples\n");
                    for s in &report.samples {
                        println!(
                            "- `{}`: {} to {}, {} repositories",
                            s.manifest.display(),
                            s.start_date,
                            s.end_date,
                            s.repositories
                        );
                    }
                    println!();
                    if quartiles.is_some() || deciles.is_some() {
                        println!("## Quantiles\n");
                        print_views([quartiles, deciles], cli.format);
                    }
                    println!("## Rules\n");
                    print!("{}", rules.to_markdown());
                }
                OutputFormat::Text => {
                    for s in &report.samples {
                        println!(
                            "{}: {} to {}, {} repositories",
                            s.manifest.display(),
                            s.start_date,
                            s.end_date,
                            s.repositories
                        );
                    }
                    println!();
                    print_views([quartiles, deciles], cli.format);
                    print!("{rules}");
                }
            }
        }
        Some(Command::Quantiles { ref input }) => {
            let locale = input.locale.unwrap_or(config.locale);
            let min_rows = input.min_rows.unwrap_or(config.samples.min_rows);
            let catalog = config.load_catalog()?;
            let (_, conversion, _) = prepare(input, min_rows, &catalog, locale)
                .map_err(|err| condition_or_report(err, cli.format, locale))?;

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&conversion).into_diagnostic()?
                    );
                }
                _ => {
                    if conversion.quartiles.is_none() && conversion.deciles.is_none() {
                        println!("No quantile attributes in these samples.");
                    }
                    print_views(
                        [conversion.quartiles.as_ref(), conversion.deciles.as_ref()],
                        cli.format,
                    );
                }
            }
        }
        Some(Command::Attributes) => {
            let catalog = config.load_catalog()?;
            print_attributes(&catalog, cli.format)?;
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "gitpatterns", &mut std::io::stdout());
        }
    }

    Ok(())
}
