use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use depfence::config::{Config, CONFIG_FILE, DEFAULT_CONFIG};
use depfence::{Analyzer, ErrorCode};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Exit code for configuration and resolution failures.
const EXIT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(
    name = "depfence",
    version,
    about = "Package dependency constraint checker"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Check the package graph rooted at PATH against the rule file.
    Check {
        /// Project root (default: current directory).
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Only run the rule with this name.
        #[arg(long)]
        rule: Option<String>,

        /// Rule file path (.toml, .yaml or .yml).
        #[arg(long, default_value = CONFIG_FILE)]
        config: PathBuf,

        /// Go binary used to resolve packages (also: DEPFENCE_GO).
        #[arg(long)]
        go: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List the rules defined in the rule file.
    ListRules {
        #[arg(long, default_value = CONFIG_FILE)]
        config: PathBuf,
    },

    /// Generate a starter depfence.toml.
    Init,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let outcome = match cli.command {
        Command::Check {
            path,
            rule,
            config,
            go,
            format,
        } => run_check(&path, &config, rule.as_deref(), go, format),
        Command::ListRules { config } => run_list_rules(&config),
        Command::Init => run_init(),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            let code = e
                .downcast_ref::<depfence::Error>()
                .map_or("ERROR", |e| e.code());
            eprintln!("error[{code}]: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { "depfence=debug" } else { "warn" })
    });
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}

fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::from_file(path).map_err(depfence::Error::from)?;
    config
        .apply_env_vars()
        .map_err(depfence::Error::from)?;
    Ok(config)
}

fn run_check(
    path: &Path,
    config_path: &Path,
    rule_filter: Option<&str>,
    go: Option<PathBuf>,
    format: Format,
) -> Result<ExitCode> {
    let mut config = load_config(config_path)?;
    if let Some(go) = go {
        config.resolver.go = go;
    }

    let root = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to get current directory")?
            .join(path)
    };

    let analyzer = Analyzer::from_config(root, &config)?.with_rule_filter(rule_filter);
    let result = analyzer.analyze()?;

    match format {
        Format::Text => result.print_report(),
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(if result.has_violations() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_list_rules(config_path: &Path) -> Result<ExitCode> {
    let rule_set = load_config(config_path)?
        .compile()
        .map_err(depfence::Error::from)?;

    println!("working package: {}\n", rule_set.working_prefix());
    for rule in rule_set.rules() {
        println!("{}", rule.name());
        println!("  packages:   {}", rule.package_selector());

        let allowed: Vec<String> = rule
            .allowed_dependency_patterns()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("  may depend: {}", allowed.join(", "));

        let exceptions = rule.exceptions();
        for dependency in &exceptions.generic {
            println!("  expected:   * -> {dependency}");
        }
        for (package, targets) in &exceptions.specific {
            for dependency in targets {
                println!("  expected:   {package} -> {dependency}");
            }
        }
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

fn run_init() -> Result<ExitCode> {
    let path = PathBuf::from(CONFIG_FILE);
    if path.exists() {
        eprintln!("{CONFIG_FILE} already exists");
        return Ok(ExitCode::FAILURE);
    }

    std::fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {CONFIG_FILE}"))?;
    eprintln!("Created {CONFIG_FILE}");
    Ok(ExitCode::SUCCESS)
}
