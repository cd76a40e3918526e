use std::process::ExitCode;

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eml_compiler::EmlCompiler;
use eml_compiler::codes::CodeTables;
use eml_compiler::config::{ConfigLoader, ResolvedConfig};
use eml_compiler::constants::EmlConstants;
use eml_compiler::error::EmlError;
use eml_compiler::source::SnapshotProvider;
use eml_compiler::taxonomy::{OfflineTaxonomyClient, TaxonomyClient, TaxonomyHttpClient};

#[derive(Parser)]
#[command(name = "emlc")]
#[command(about = "Compile project and survey metadata into EML 2.2.0 documents")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Compile a project into an EML document")]
    Compile(CompileArgs),
    #[command(about = "Print the aggregated metadata source for a project as JSON")]
    Inspect(InspectArgs),
}

#[derive(Args)]
struct CompileArgs {
    project_id: u64,

    #[arg(long)]
    source: Utf8PathBuf,

    #[arg(long)]
    config: Option<String>,

    #[arg(long, short)]
    output: Option<Utf8PathBuf>,

    #[arg(long, value_parser = parse_date)]
    pub_date: Option<NaiveDate>,
}

#[derive(Args)]
struct InspectArgs {
    project_id: u64,

    #[arg(long)]
    source: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(eml) = report.downcast_ref::<EmlError>() {
            return ExitCode::from(map_exit_code(eml));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &EmlError) -> u8 {
    match error {
        EmlError::ProjectNotFound(_) | EmlError::SurveyNotFound(_) => 2,
        EmlError::MissingConfig => 2,
        EmlError::TaxonomyHttp(_) | EmlError::TaxonomyStatus { .. } => 3,
        EmlError::PreconditionViolated(_) | EmlError::UnknownDescribes(_) => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile(args) => run_compile(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}

fn run_compile(args: CompileArgs) -> miette::Result<()> {
    let config = ConfigLoader::resolve(args.config.as_deref())?;
    let source = SnapshotProvider::load(&args.source)?;
    let taxonomy = taxonomy_client(&config)?;

    let mut compiler = EmlCompiler::new(source, taxonomy, config.code_tables.clone(), config);
    if let Some(pub_date) = args.pub_date {
        compiler = compiler.with_pub_date(pub_date);
    }
    let xml = compiler.compile(args.project_id)?;

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
                std::fs::create_dir_all(parent.as_std_path())
                    .map_err(|err| EmlError::Filesystem(err.to_string()))?;
            }
            std::fs::write(path.as_std_path(), xml.as_bytes())
                .map_err(|err| EmlError::Filesystem(err.to_string()))?;
            info!(path = %path, "wrote EML document");
        }
        None => print!("{xml}"),
    }
    Ok(())
}

fn run_inspect(args: InspectArgs) -> miette::Result<()> {
    let source = SnapshotProvider::load(&args.source)?;
    let compiler = EmlCompiler::new(
        source,
        OfflineTaxonomyClient,
        CodeTables::new(),
        EmlConstants::not_supplied(),
    );
    let metadata = compiler.load(args.project_id)?;
    let json = serde_json::to_string_pretty(&metadata).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn taxonomy_client(config: &ResolvedConfig) -> Result<Box<dyn TaxonomyClient>, EmlError> {
    match &config.taxonomy {
        Some(settings) => Ok(Box::new(TaxonomyHttpClient::new(
            &settings.base_url,
            settings.timeout,
        )?)),
        None => Ok(Box::new(OfflineTaxonomyClient)),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| EmlError::InvalidDate(value.to_string()).to_string())
}
