use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use overcheck::ast::CompilationUnit;
use overcheck::config::CheckerConfig;
use overcheck::diagnostics::{render_diagnostic, CheckError, Diagnostic};
use overcheck::typeck::Checker;

#[derive(Parser)]
#[command(name = "overcheck", version, about = "Generic declaration resolver and override checker")]
struct Cli {
    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every class of a JSON compilation unit
    Check {
        /// Compilation unit (JSON)
        unit: PathBuf,
        /// Config file (defaults to the nearest overcheck.toml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Source text the unit was parsed from, for annotated output
        #[arg(long)]
        source: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
        /// Worker threads (0 = available parallelism)
        #[arg(long)]
        jobs: Option<usize>,
        /// Do not make the built-in declarations visible
        #[arg(long)]
        no_prelude: bool,
    },
    /// Print the resolved hierarchy of one class as JSON
    Hierarchy {
        /// Compilation unit (JSON)
        unit: PathBuf,
        /// Class or interface name
        class: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the fingerprint of every class and of the whole unit
    Fingerprint {
        /// Compilation unit (JSON)
        unit: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

fn load_unit(path: &Path) -> Result<CompilationUnit, CheckError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| CheckError::input(format!("failed to read {}: {e}", path.display())))?;
    CompilationUnit::from_json(&json)
}

fn load_config(explicit: Option<&Path>, unit: &Path) -> Result<CheckerConfig, CheckError> {
    match explicit {
        Some(path) => CheckerConfig::load(path),
        None => {
            let dir = unit.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            CheckerConfig::discover(dir)
        }
    }
}

fn fail(err: CheckError) -> ! {
    match &err {
        CheckError::Config { path: Some(path), .. } => eprintln!("error [{}]: {err}", path.display()),
        _ => eprintln!("error: {err}"),
    }
    std::process::exit(1);
}

fn print_text(diagnostics: &[Diagnostic], source: Option<&str>) {
    for d in diagnostics {
        match source {
            Some(src) if !d.span.is_dummy() => {
                if render_diagnostic(src, d).is_err() {
                    eprintln!("{d}");
                }
            }
            _ => println!("{d}"),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check { unit, config, source, format, jobs, no_prelude } => {
            let mut cfg = load_config(config.as_deref(), &unit).unwrap_or_else(|e| fail(e));
            if let Some(jobs) = jobs {
                cfg.jobs = jobs;
            }
            if no_prelude {
                cfg.prelude = false;
            }
            let parsed = load_unit(&unit).unwrap_or_else(|e| fail(e));
            let source_text = match source {
                Some(path) => match std::fs::read_to_string(&path) {
                    Ok(text) => Some(text),
                    Err(e) => fail(CheckError::input(format!("failed to read {}: {e}", path.display()))),
                },
                None => None,
            };

            let checker = Checker::new(&parsed, cfg);
            let mut diagnostics: Vec<Diagnostic> = Vec::new();
            let report = checker.check_unit_parallel(&mut diagnostics);

            match format {
                Format::Text => print_text(&diagnostics, source_text.as_deref()),
                Format::Json => match serde_json::to_string_pretty(&diagnostics) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("error: failed to serialize diagnostics: {e}");
                        std::process::exit(1);
                    }
                },
            }

            if report.has_errors() {
                std::process::exit(1);
            }
        }
        Commands::Hierarchy { unit, class, config } => {
            let cfg = load_config(config.as_deref(), &unit).unwrap_or_else(|e| fail(e));
            let parsed = load_unit(&unit).unwrap_or_else(|e| fail(e));
            let checker = Checker::new(&parsed, cfg);
            let hierarchy = checker.resolve(&class).unwrap_or_else(|e| fail(e));
            match serde_json::to_string_pretty(&hierarchy) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("error: failed to serialize hierarchy: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Fingerprint { unit, config } => {
            let cfg = load_config(config.as_deref(), &unit).unwrap_or_else(|e| fail(e));
            let parsed = load_unit(&unit).unwrap_or_else(|e| fail(e));
            let checker = Checker::new(&parsed, cfg);
            let report = checker.check_unit(&mut overcheck::diagnostics::NullSink);
            for outcome in &report.outcomes {
                let fp = overcheck::fingerprint::fingerprint_outcome(outcome);
                println!("{}  {}", overcheck::fingerprint::to_hex(&fp), outcome.name);
            }
            let fp = overcheck::fingerprint::fingerprint_unit(&report);
            println!("{}  *", overcheck::fingerprint::to_hex(&fp));
        }
    }
}
