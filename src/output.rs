use crate::record::{RankedResult, Species};
use csv::Writer;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::Write;

/// Flat CSV shape of a [`RankedResult`].
#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    loc_id: &'a str,
    name: &'a str,
    latitude: f64,
    longitude: f64,
    distance_km: Option<f64>,
    checklist_count: u32,
    observation_count: u32,
    score: u32,
    last_observation_date: Option<&'a str>,
    species: String,
    url: &'a str,
}

impl<'a> From<&'a RankedResult> for ResultRow<'a> {
    fn from(result: &'a RankedResult) -> Self {
        let species = result
            .activity
            .species_list
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(Species::display_name)
            .collect::<Vec<_>>()
            .join("; ");

        Self {
            loc_id: &result.hotspot.loc_id,
            name: &result.hotspot.name,
            latitude: result.hotspot.latitude,
            longitude: result.hotspot.longitude,
            distance_km: result.hotspot.distance_km,
            checklist_count: result.activity.checklist_count,
            observation_count: result.activity.observation_count,
            score: result.activity.score,
            last_observation_date: result.activity.last_observation_date.as_deref(),
            species,
            url: &result.hotspot.url,
        }
    }
}

pub fn write_csv<W: Write>(results: &[RankedResult], out: W) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = Writer::from_writer(out);
    for result in results {
        writer.serialize(ResultRow::from(result))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_to_csv(results: &[RankedResult], filename: &str) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(filename)?;
    write_csv(results, file)?;
    info!("Results saved to {}", filename);
    Ok(())
}

pub fn print_summary(results: &[RankedResult]) {
    if results.is_empty() {
        println!("No hotspots to summarize");
        return;
    }

    println!("\nSummary:");
    println!("Hotspots returned: {}", results.len());

    if let Some(best) = results.iter().max_by_key(|r| r.activity.score) {
        println!("Best score: {} ({})", best.activity.score, best.hotspot.name);
    }

    let checklists: u32 = results.iter().map(|r| r.activity.checklist_count).sum();
    println!("Checklists in the last week: {}", checklists);

    let latest = results
        .iter()
        .filter_map(|r| r.activity.last_observation_date.as_deref())
        .max();
    if let Some(latest) = latest {
        println!("Most recent observation: {}", latest);
    }
}
