mod parse;

use crate::parse::Args;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use kestrel::client::EbirdClient;
use kestrel::config::Config;
use kestrel::geo::parse_distance;
use kestrel::output::{print_summary, save_to_csv};
use kestrel::ranking::{LocationQuery, RankingPipeline};
use kestrel::record::RankedResult;
use kestrel::util::print_hms;
use kestrel::{ErrorPayload, KestrelError};
use log::{error, info};
use std::time::{Duration, Instant};

async fn run(pipeline: &RankingPipeline<EbirdClient>, args: &Args) -> kestrel::Result<Vec<RankedResult>> {
    let distance_km = parse_distance(args.distance.as_deref())?;
    let query = LocationQuery {
        lat: args.lat,
        lng: args.lng,
        postal_code: args.postal_code.clone(),
    };

    let origin = pipeline.resolve_origin(&query).await?;
    info!(
        "Searching {:?} hotspots within {} km of ({}, {})",
        args.mode, distance_km, origin.lat, origin.lng
    );
    pipeline.run(args.mode, &origin, distance_km).await
}

fn report_failure(err: &KestrelError) {
    if err.is_internal() {
        error!("Request failed: {}", err);
    }
    let payload = ErrorPayload::from(err);
    match serde_json::to_string_pretty(&payload) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}", payload.error),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize logger
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = Config::from_env()?;
    if let Some(timeout) = args.timeout {
        config = config.with_timeout(timeout);
    }
    if let Some(workers) = args.concurrency {
        config = config.with_concurrency(workers);
    }
    info!("Starting with {:?}", config);

    let client = EbirdClient::new(&config)?;
    let pipeline = RankingPipeline::new(client).with_workers(config.concurrency);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]")?);
    spinner.set_message("Checking recent activity");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();
    let outcome = run(&pipeline, &args).await;
    spinner.finish_and_clear();

    let results = match outcome {
        Ok(results) => results,
        Err(err) => {
            report_failure(&err);
            std::process::exit(1);
        }
    };

    println!("{}", serde_json::to_string_pretty(&results)?);
    if let Some(path) = &args.csv {
        save_to_csv(&results, path)?;
    }

    print_summary(&results);
    print_hms(&start);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel::ranking::Mode;

    #[test]
    fn test_args_parse_coordinates() {
        let args = Args::try_parse_from([
            "kestrel", "top", "--lat", "40.7", "--lng", "-74.0", "--distance", "15",
        ])
        .unwrap();
        assert_eq!(args.mode, Mode::Top);
        assert_eq!(args.lat, Some(40.7));
        assert_eq!(args.lng, Some(-74.0));
        assert_eq!(args.distance.as_deref(), Some("15"));
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_parse_postal_code() {
        let args = Args::try_parse_from(["kestrel", "notable", "-p", "19104", "-c", "3"]).unwrap();
        assert_eq!(args.mode, Mode::Notable);
        assert_eq!(args.postal_code.as_deref(), Some("19104"));
        assert_eq!(args.concurrency, Some(3));
        assert_eq!(args.lat, None);
    }

    #[test]
    fn test_args_reject_unknown_mode() {
        assert!(Args::try_parse_from(["kestrel", "busiest"]).is_err());
    }

    #[test]
    fn test_error_payload_for_bad_distance() {
        let err = parse_distance(Some("far")).unwrap_err();
        let payload = ErrorPayload::from(&err);
        assert_eq!(payload.status, 400);
    }
}
