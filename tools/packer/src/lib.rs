use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use corpus::assemble::{PlainText, SpacedLowercase, TextProcessor};
use corpus::config::{PackConfig, Script, WindowMode};
use corpus::pipeline::{self, PipelineStats};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "packer",
    about = "Build shuffled context-window training packs from forum log dumps"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline and write numbered packs to the output directory.
    Build {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Directory receiving pack_0, pack_1, ... (default: ~/.replypack/packs).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// How processed_body is derived from each message body.
        #[arg(long, value_enum, default_value_t = ProcessorKind::Plain)]
        processor: ProcessorKind,
    },

    /// Ingest, filter and enumerate windows, then print counts without writing.
    Stats {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

/// Overrides for values otherwise taken from REPLYPACK_* env vars.
#[derive(Args, Debug, Default, Clone)]
struct PipelineArgs {
    /// Crawled log file, or a directory of *.jsonl day files.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Messages of context before the reply (window size minus one).
    #[arg(long)]
    context_len: Option<usize>,

    /// Samples per output pack.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Drop every message of a minute holding more than this many messages.
    #[arg(long)]
    flood_threshold: Option<usize>,

    /// Drop messages this many characters or longer.
    #[arg(long)]
    max_text_chars: Option<usize>,

    /// Alphabet a message must contain (cyrillic, latin, greek).
    #[arg(long)]
    script: Option<Script>,

    /// replies (follow @markers) or sequential (plain sliding window).
    #[arg(long)]
    window_mode: Option<WindowMode>,

    /// Seed for the sample shuffle; random when unset.
    #[arg(long)]
    seed: Option<u64>,

    /// Enumerate windows on all cores.
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ProcessorKind {
    /// Copy the body as is.
    Plain,
    /// Lowercase and split punctuation into separate tokens.
    Spaced,
}

impl ProcessorKind {
    fn processor(self) -> Box<dyn TextProcessor> {
        match self {
            ProcessorKind::Plain => Box::new(PlainText),
            ProcessorKind::Spaced => Box::new(SpacedLowercase::new()),
        }
    }
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            pipeline,
            output_dir,
            processor,
        } => {
            let mut config = apply_overrides(PackConfig::from_env()?, &pipeline);
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            run_build(&config, processor)
        }
        Commands::Stats { pipeline } => {
            let config = apply_overrides(PackConfig::from_env()?, &pipeline);
            run_stats(&config)
        }
    }
}

fn apply_overrides(mut config: PackConfig, args: &PipelineArgs) -> PackConfig {
    let p = &mut config.pipeline;
    if let Some(input) = &args.input {
        config.input = input.clone();
    }
    if let Some(v) = args.context_len {
        p.context_len = v;
    }
    if let Some(v) = args.batch_size {
        p.batch_size = v;
    }
    if let Some(v) = args.flood_threshold {
        p.flood_threshold = v;
    }
    if let Some(v) = args.max_text_chars {
        p.max_text_chars = v;
    }
    if let Some(v) = args.script {
        p.script = v;
    }
    if let Some(v) = args.window_mode {
        p.window_mode = v;
    }
    if args.seed.is_some() {
        p.shuffle_seed = args.seed;
    }
    if args.parallel {
        p.parallel = true;
    }
    config
}

fn run_build(config: &PackConfig, processor: ProcessorKind) -> Result<()> {
    println!(
        "Building packs from {} into {}",
        config.input.display(),
        config.output_dir.display()
    );
    let processor = processor.processor();
    let stats = pipeline::run_pipeline(config, processor.as_ref())?;
    println!("{}", summary(&stats));
    println!("Wrote {} packs", stats.packs);
    Ok(())
}

fn run_stats(config: &PackConfig) -> Result<()> {
    let prepared = pipeline::prepare(&config.input, &config.pipeline)?;
    println!("{}", summary(&prepared.stats));
    Ok(())
}

fn summary(stats: &PipelineStats) -> String {
    format!(
        "records={} kept={} dropped(flood={} too_long={} links={} script={}) dangling_refs={} windows={}",
        stats.ingest.records,
        stats.filter.kept,
        stats.filter.flood,
        stats.filter.too_long,
        stats.filter.links,
        stats.filter.wrong_script,
        stats.dangling_refs,
        stats.windows,
    )
}
