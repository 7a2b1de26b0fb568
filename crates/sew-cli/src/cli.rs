use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Weekly sewing-line production scheduler", long_about = None)]
pub struct Cli {
    /// Input planning workbook (xlsx)
    pub workbook: PathBuf,

    /// Output directory for the report and the solution JSON
    #[arg(short, long, default_value = "result")]
    pub out: PathBuf,

    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Maximum search iterations
    #[arg(long, default_value_t = 1000)]
    pub max_iter: usize,

    /// Wall-clock budget in seconds
    #[arg(long, default_value_t = 1200)]
    pub max_time: u64,

    /// Starting tabu tenure
    #[arg(long, default_value_t = 10)]
    pub tenure: usize,

    /// Probability of destroy-and-repair candidates per iteration
    #[arg(long, default_value_t = 0.3)]
    pub destroy_prob: f64,

    /// RNG seed; runs are reproducible for a fixed seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
