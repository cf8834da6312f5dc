//! spinweave command line.
//!
//! JSON goes to stdout, one object per line; logs go to stderr.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use spinweave::cartesian::{decode_index, encode_address, CombinationAddress};
use spinweave::config::{Campaign, Config};
use spinweave::ledger::{FileLedger, MemoryLedger, UniquenessLedger};
use spinweave::shutdown::ShutdownCoordinator;
use spinweave::template::{
    assemble, parse_slots, Chooser, RandomChooser, SeededChooser, Variables, Variant,
};
use spinweave::{BatchOutput, CartesianEngine};

#[derive(Parser, Debug)]
#[command(name = "spinweave", version, about = "Deterministic article variation engine")]
struct Cli {
    /// Config file (default: ~/.config/spinweave/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the spintax slots of a template
    Slots(TemplateArgs),
    /// Resolve a template with random choices
    Spin(SpinArgs),
    /// Decode a linear index into one digit per dimension
    Decode(DecodeArgs),
    /// Encode per-dimension digits into a linear index
    Encode(EncodeArgs),
    /// Describe the combination space of a campaign
    Count(CountArgs),
    /// Generate articles for a campaign
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Template text
    #[arg(conflicts_with = "file", required_unless_present = "file")]
    template: Option<String>,

    /// Read the template from a file
    #[arg(long, short)]
    file: Option<PathBuf>,
}

impl TemplateArgs {
    fn read(&self) -> Result<String> {
        match (&self.template, &self.file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template '{}'", path.display())),
            (None, None) => bail!("Provide a template or --file"),
        }
    }
}

#[derive(Args, Debug)]
struct SpinArgs {
    #[command(flatten)]
    template: TemplateArgs,

    /// Number of variants to print
    #[arg(long, short = 'n', default_value_t = 1)]
    count: usize,

    /// Seed for reproducible choices
    #[arg(long)]
    seed: Option<u64>,

    /// Variable value, as key=value (repeatable)
    #[arg(long = "var", value_parser = parse_key_value)]
    vars: Vec<(String, String)>,

    /// Grammar entry, as KEY=value (repeatable)
    #[arg(long = "grammar", value_parser = parse_key_value)]
    grammar: Vec<(String, String)>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Linear index
    index: u64,

    /// Dimension sizes, most significant first
    #[arg(long, value_delimiter = ',', required = true)]
    sizes: Vec<u64>,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Per-dimension digits, most significant first
    #[arg(value_delimiter = ',', required = true)]
    digits: Vec<u64>,

    /// Dimension sizes, most significant first
    #[arg(long, value_delimiter = ',', required = true)]
    sizes: Vec<u64>,
}

#[derive(Args, Debug)]
struct CountArgs {
    /// Campaign file
    #[arg(long)]
    campaign: PathBuf,

    /// Override the combination cap
    #[arg(long)]
    max: Option<u64>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Campaign file
    #[arg(long)]
    campaign: PathBuf,

    /// First index to generate
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// Indices per batch
    #[arg(long)]
    batch_size: Option<u64>,

    /// Override the combination cap
    #[arg(long)]
    max: Option<u64>,

    /// Ledger file (overrides config; in-memory when neither is set)
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Concurrent partitions per batch
    #[arg(long)]
    partitions: Option<usize>,

    /// Keep generating batches until the space is exhausted
    #[arg(long)]
    all: bool,

    /// Fail the batch on the first collaborator error
    #[arg(long)]
    all_or_nothing: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() {
    spinweave::logging::init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Slots(args) => slots(&args),
        Commands::Spin(args) => spin(&args),
        Commands::Decode(args) => {
            let address = decode_index(args.index, &args.sizes)?;
            print_line(&json!({ "index": args.index, "address": address }))
        }
        Commands::Encode(args) => {
            let address = CombinationAddress::new(args.digits);
            let index = encode_address(&address, &args.sizes)?;
            print_line(&json!({ "index": index, "address": address }))
        }
        Commands::Count(args) => count(&config, &args),
        Commands::Generate(args) => generate(&config, &args).await,
    }
}

fn slots(args: &TemplateArgs) -> Result<()> {
    let template = args.read()?;
    let scan = parse_slots(&template);
    print_line(&json!({
        "slots": scan.slots,
        "total_combinations": scan.total_combinations(),
        "distinct_combinations": scan.distinct_combinations(),
        "warnings": scan.warnings,
    }))
}

fn spin(args: &SpinArgs) -> Result<()> {
    let template = args.template.read()?;
    let variables: Variables = args.vars.iter().cloned().collect();
    let variant: Variant = args.grammar.iter().cloned().collect();

    let mut chooser: Box<dyn Chooser> = match args.seed {
        Some(seed) => Box::new(SeededChooser::new(seed)),
        None => Box::new(RandomChooser::new()),
    };

    for _ in 0..args.count {
        let assembly = assemble(&template, &variant, &variables, chooser.as_mut());
        print_line(&json!({
            "text": assembly.text,
            "choices": assembly.choices,
            "unresolved": assembly.unresolved,
        }))?;
    }
    Ok(())
}

fn count(config: &Config, args: &CountArgs) -> Result<()> {
    let campaign = Campaign::load_from(&args.campaign)?;
    let template = campaign.template()?;
    let mut request = campaign.cartesian_config(&config.defaults);
    if let Some(max) = args.max {
        request.max_combinations = max;
    }

    let engine = CartesianEngine::new(campaign.sources()?, Arc::new(MemoryLedger::new()));
    let metadata = engine.describe(&request, &template)?;
    print_line(&metadata)
}

async fn generate(config: &Config, args: &GenerateArgs) -> Result<()> {
    let campaign = Campaign::load_from(&args.campaign)?;
    let template = campaign.template()?;

    let mut request = campaign.cartesian_config(&config.defaults);
    request.offset = args.offset;
    request.all_or_nothing = args.all_or_nothing;
    if let Some(batch_size) = args.batch_size {
        request.batch_size = batch_size;
    }
    if let Some(max) = args.max {
        request.max_combinations = max;
    }
    let partitions = args.partitions.unwrap_or(config.defaults.partitions);

    let ledger_path = args.ledger.as_deref().or(config.ledger.path.as_deref());
    let ledger = open_ledger(ledger_path)?;
    let engine = CartesianEngine::new(campaign.sources()?, ledger);

    let shutdown = ShutdownCoordinator::new();
    shutdown.listen_for_ctrl_c();
    let handle = shutdown.handle();

    tracing::info!(
        namespace = %request.namespace,
        offset = request.offset,
        batch_size = request.batch_size,
        partitions,
        "Generating"
    );

    loop {
        let output = if partitions > 1 {
            engine
                .generate_partitioned_cancellable(&request, &template, partitions, &handle)
                .await?
        } else {
            engine
                .generate_batch_cancellable(&request, &template, &handle)
                .await?
        };
        emit(&output)?;

        if !args.all || output.is_exhausted() || handle.is_shutting_down() {
            break;
        }
        if output.metadata.next_offset == request.offset {
            break;
        }
        request.offset = output.metadata.next_offset;
    }

    Ok(())
}

fn open_ledger(path: Option<&Path>) -> Result<Arc<dyn UniquenessLedger>> {
    match path {
        Some(path) => Ok(Arc::new(FileLedger::open(path)?)),
        None => Ok(Arc::new(MemoryLedger::new())),
    }
}

fn emit(output: &BatchOutput) -> Result<()> {
    for result in &output.results {
        print_line(result)?;
    }
    for failure in &output.failures {
        print_line(&json!({ "failure": failure }))?;
    }
    print_line(&json!({ "metadata": output.metadata }))
}

fn print_line<T: Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    Ok(())
}
