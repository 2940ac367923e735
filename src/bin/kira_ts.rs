use std::io;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_taxon_survey::config::{ConfigLoader, ResolvedConfig};
use kira_taxon_survey::domain::{LengthRange, TaxId};
use kira_taxon_survey::error::KiraError;
use kira_taxon_survey::ncbi::EntrezHttpClient;
use kira_taxon_survey::output::{ConsoleOutput, JsonOutput, OutputMode};
use kira_taxon_survey::prompt::{Prompter, parse_bound};
use kira_taxon_survey::report::FileReportSink;
use kira_taxon_survey::workflow::{SurveyRequest, Workflow, WorkflowOptions};

#[derive(Parser)]
#[command(name = "kira-ts")]
#[command(about = "Survey NCBI nucleotide records of a taxon by sequence length")]
#[command(version, author)]
struct Cli {
    /// Fail instead of prompting for missing values
    #[arg(long)]
    non_interactive: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    api_key: Option<String>,

    #[arg(long)]
    taxid: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    min_len: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    max_len: Option<String>,

    /// Upper bound on records fetched from the result set
    #[arg(long)]
    max_records: Option<usize>,

    /// Request only the first page of the result set
    #[arg(long)]
    single_page: bool,

    #[arg(long)]
    output_dir: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::InvalidNumber { .. } | KiraError::MissingInput(_) => 2,
        KiraError::ReportWrite { .. } | KiraError::ChartRender(_) => 4,
        other if other.is_remote() => 3,
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
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?
        .with_env_overrides(|key| std::env::var(key).ok());
    apply_flags(&cli, &mut config);

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    let mut ask = |value: Option<String>, question: &str, field: &'static str| {
        match (value, output_mode) {
            (Some(value), _) => Ok(value),
            (None, OutputMode::Interactive) => prompter.ask(question, field),
            (None, OutputMode::NonInteractive) => Err(KiraError::MissingInput(field)),
        }
    };

    if config.entrez.email.is_none() && matches!(output_mode, OutputMode::Interactive) {
        let email = ask(None, "Enter your email address for NCBI: ", "email")?;
        config.entrez.email = Some(email).filter(|value| !value.trim().is_empty());
    }
    if config.entrez.api_key.is_none() && matches!(output_mode, OutputMode::Interactive) {
        let api_key = ask(None, "Enter your NCBI API key: ", "api key")?;
        config.entrez.api_key = Some(api_key).filter(|value| !value.trim().is_empty());
    }
    if config.entrez.email.is_none() {
        tracing::warn!("no contact email configured; NCBI may throttle anonymous requests");
    }

    let taxid = TaxId::new(&ask(
        cli.taxid.clone(),
        "Enter taxonomic ID (taxid) of the organism: ",
        "taxid",
    )?);
    let min_len = parse_bound(
        "min length",
        &ask(cli.min_len.clone(), "Enter minimum sequence length: ", "min length")?,
    )?;
    let max_len = parse_bound(
        "max length",
        &ask(cli.max_len.clone(), "Enter maximum sequence length: ", "max length")?,
    )?;

    let request = SurveyRequest {
        taxid,
        range: LengthRange::new(min_len, max_len),
    };
    let client = EntrezHttpClient::new(config.entrez.clone())?;
    let workflow = Workflow::new(client, FileReportSink, WorkflowOptions::from(&config));

    let outcome = if cli.json {
        let outcome = workflow.run(&request, &JsonOutput);
        JsonOutput::print_outcome(&outcome).into_diagnostic()?;
        outcome
    } else {
        workflow.run(&request, &ConsoleOutput)
    };

    if !outcome.report_errors.is_empty() {
        return Err(KiraError::ReportWrite {
            path: config.output_dir.to_string(),
            message: outcome.report_errors.join("; "),
        }
        .into());
    }
    Ok(())
}

fn apply_flags(cli: &Cli, config: &mut ResolvedConfig) {
    if let Some(email) = &cli.email {
        config.entrez.email = Some(email.clone());
    }
    if let Some(api_key) = &cli.api_key {
        config.entrez.api_key = Some(api_key.clone());
    }
    if let Some(max_records) = cli.max_records.filter(|value| *value > 0) {
        config.max_records = max_records;
    }
    if cli.single_page {
        config.single_page = true;
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
}
