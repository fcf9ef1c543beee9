use anyhow::Result;
use clap::Parser;
use hddstats::ExecMode;
use hddstats::config::{DEFAULT_OUTPUT_FILE, JoinPolicy, ParsePolicy, RunConfig, validate_paths};
use hddstats::hdd::SummaryJob;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hddstats", version)]
#[command(about = "Per-model hard-drive failure probabilities from daily snapshot CSVs")]
struct Args {
    /// Directory of daily snapshot CSV files (or a single file)
    indir: PathBuf,

    /// Output directory; must not exist yet
    outdir: PathBuf,

    /// Run on the calling thread only
    #[arg(long, conflicts_with_all = ["threads", "partitions"])]
    sequential: bool,

    /// Worker threads (default: rayon's global pool)
    #[arg(long)]
    threads: Option<usize>,

    /// Partitions per stage (default: twice the CPU count)
    #[arg(long)]
    partitions: Option<usize>,

    /// What to do with rows that cannot be parsed
    #[arg(long, value_enum, default_value_t = ParsePolicy::FailFast)]
    on_parse_error: ParsePolicy,

    /// Write rejected rows here (with --on-parse-error reject)
    #[arg(long)]
    rejects: Option<PathBuf>,

    /// How classes missing from one side of a join are treated
    #[arg(long = "join", value_enum, default_value_t = JoinPolicy::Inner)]
    join_policy: JoinPolicy,

    /// Name of the table file inside the output directory
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output_file: String,

    /// Write run metrics as JSON
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn run_config(&self) -> RunConfig {
        let exec = if self.sequential {
            ExecMode::Sequential
        } else {
            ExecMode::Parallel {
                threads: self.threads,
                partitions: self.partitions,
            }
        };
        RunConfig {
            exec,
            parse_policy: self.on_parse_error,
            join_policy: self.join_policy,
            output_file: self.output_file.clone(),
            rejects_path: self.rejects.clone(),
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    validate_paths(&args.indir, &args.outdir)?;
    let config = args.run_config();
    info!(?config, "starting run");

    let job = SummaryJob::new(config);
    let outcome = job.run(&args.indir, &args.outdir)?;

    if let Some(path) = &args.metrics {
        job.metrics().save_to_file(path)?;
    }
    if let Some(path) = &outcome.output_path {
        info!(
            path = %path.display(),
            classes = outcome.table.rows.len(),
            elapsed = ?job.metrics().elapsed(),
            "done"
        );
    }
    Ok(())
}
