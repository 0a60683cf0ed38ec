use clap::Parser;
use kestrel::ranking::Mode;

#[derive(Parser)]
#[command(name = "kestrel")]
#[command(about = "Find and rank active birding hotspots near a location")]
#[command(version = "0.1")]
pub(crate) struct Args {
    /// Ranking mode
    #[arg(value_enum)]
    pub mode: Mode,

    /// Latitude of the search origin
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude of the search origin
    #[arg(long, allow_hyphen_values = true)]
    pub lng: Option<f64>,

    /// 5-digit postal code, used when no coordinates are given
    #[arg(short, long)]
    pub postal_code: Option<String>,

    /// Search radius in kilometres (clamped to 1-500)
    #[arg(short, long)]
    pub distance: Option<String>,

    /// Maximum number of concurrent observation requests
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Also write results to this CSV file
    #[arg(long)]
    pub csv: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
