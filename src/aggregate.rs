//! Folds observation records into per-hotspot activity summaries.
//!
//! Checklists and species are keyed sets, so record order never changes the
//! result. Scores are `checklists * 2 + observation_count`.

use crate::record::{ActivitySummary, ObservationRecord, Species};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};

const OBS_DT_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Which optional outputs a summary carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tracking {
    pub species: bool,
    pub notable: bool,
}

impl Tracking {
    pub const COUNTS_ONLY: Tracking = Tracking {
        species: false,
        notable: false,
    };

    pub const SPECIES: Tracking = Tracking {
        species: true,
        notable: false,
    };

    pub const NOTABLE: Tracking = Tracking {
        species: true,
        notable: true,
    };
}

/// Running state for one hotspot (or one group of records).
#[derive(Debug, Clone, Default)]
pub struct ActivityAccumulator {
    tracking: Tracking,
    checklists: HashSet<String>,
    species: HashMap<String, Species>,
    raw_sightings: u32,
    last_seen: Option<NaiveDateTime>,
    records: usize,
}

impl ActivityAccumulator {
    pub fn new(tracking: Tracking) -> Self {
        Self {
            tracking,
            ..Default::default()
        }
    }

    pub fn push(&mut self, record: &ObservationRecord) {
        self.records += 1;

        if let Some(sub_id) = &record.sub_id {
            self.checklists.insert(sub_id.clone());
        }

        if !record.species_code.is_empty() {
            self.species
                .entry(record.species_code.clone())
                .or_insert_with(|| Species {
                    species_code: record.species_code.clone(),
                    common_name: record.com_name.clone(),
                    scientific_name: record.sci_name.clone(),
                });
        }

        self.raw_sightings = self
            .raw_sightings
            .saturating_add(record.how_many.unwrap_or(1));

        if let Some(seen) = parse_obs_dt(&record.obs_dt) {
            if self.last_seen.is_none_or(|latest| seen > latest) {
                self.last_seen = Some(seen);
            }
        }
    }

    pub fn finish(self) -> ActivitySummary {
        let checklist_count = self.checklists.len() as u32;
        let unique_species_count = self.species.len() as u32;
        let observation_count = if self.tracking.species {
            unique_species_count
        } else {
            self.raw_sightings
        };

        // An empty fold carries no species fields, whatever the tracking.
        let species_list = (self.tracking.species && self.records > 0)
            .then(|| sorted_species(self.species.into_values()));
        let notable_species = if self.tracking.notable {
            species_list.clone()
        } else {
            None
        };

        ActivitySummary {
            checklist_count,
            raw_sighting_count: self.raw_sightings,
            unique_species_count,
            observation_count,
            last_observation_date: self.last_seen.map(|dt| dt.format(ISO_FORMAT).to_string()),
            score: checklist_count * 2 + observation_count,
            species_list,
            notable_species,
        }
    }
}

/// Summarizes every record as belonging to one hotspot.
pub fn summarize(records: &[ObservationRecord], tracking: Tracking) -> ActivitySummary {
    let mut acc = ActivityAccumulator::new(tracking);
    for record in records {
        acc.push(record);
    }
    acc.finish()
}

/// Summarizes records per `locId`. Records without one are dropped.
pub fn summarize_by_location(
    records: &[ObservationRecord],
    tracking: Tracking,
) -> HashMap<String, ActivitySummary> {
    let mut groups: HashMap<String, ActivityAccumulator> = HashMap::new();
    for record in records {
        let Some(loc_id) = record.loc_id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };
        groups
            .entry(loc_id.to_string())
            .or_insert_with(|| ActivityAccumulator::new(tracking))
            .push(record);
    }

    groups
        .into_iter()
        .map(|(loc_id, acc)| (loc_id, acc.finish()))
        .collect()
}

/// eBird reports `obsDt` as local `YYYY-MM-DD HH:MM`, sometimes date-only.
fn parse_obs_dt(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for format in OBS_DT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Orders by display name ignoring case, then exact name, then code.
///
/// Case folding is the only locale handling: accented names are ordered by
/// code point, so "Émeu" sorts after "Zebra".
fn sorted_species(species: impl Iterator<Item = Species>) -> Vec<Species> {
    let mut list: Vec<Species> = species.collect();
    list.sort_by(|a, b| {
        let (name_a, name_b) = (a.display_name(), b.display_name());
        name_a
            .to_lowercase()
            .cmp(&name_b.to_lowercase())
            .then_with(|| name_a.cmp(name_b))
            .then_with(|| a.species_code.cmp(&b.species_code))
    });
    list
}
