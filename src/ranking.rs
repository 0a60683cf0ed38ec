//! Ranking pipeline: random pick, most active, most notable.
//!
//! Each request runs straight through: resolve the origin, find hotspots,
//! gather activity, rank. Any failure aborts the request.

use crate::aggregate::{Tracking, summarize, summarize_by_location};
use crate::client::{BirdDataSource, DEFAULT_HOTSPOT_LIMIT, HotspotQuery, NotableQuery};
use crate::concurrency::{DEFAULT_WORKERS, map_bounded};
use crate::error::{KestrelError, Result};
use crate::geo::{MAX_NOTABLE_DISTANCE_KM, clamp_distance, is_valid_lat, is_valid_lng};
use crate::record::{Hotspot, Origin, RankedResult, RawHotspot};
use log::{debug, info};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const TOP_RESULTS: usize = 5;

/// Ranking modes offered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    Random,
    Top,
    Notable,
}

/// Location as supplied by a caller, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub postal_code: Option<String>,
}

pub struct RankingPipeline<S> {
    source: S,
    workers: usize,
    hotspot_limit: usize,
}

impl<S: BirdDataSource> RankingPipeline<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            workers: DEFAULT_WORKERS,
            hotspot_limit: DEFAULT_HOTSPOT_LIMIT,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_hotspot_limit(mut self, limit: usize) -> Self {
        self.hotspot_limit = limit.max(1);
        self
    }

    /// Validates the query and geocodes a postal code when no coordinates
    /// were given. Bad input is rejected before any network call.
    pub async fn resolve_origin(&self, query: &LocationQuery) -> Result<Origin> {
        match (query.lat, query.lng) {
            (Some(lat), Some(lng)) => {
                if !is_valid_lat(lat) || !is_valid_lng(lng) {
                    return Err(KestrelError::bad_input(format!(
                        "coordinates ({}, {}) are out of range",
                        lat, lng
                    )));
                }
                Ok(Origin::from_coordinates(lat, lng))
            }
            (Some(_), None) | (None, Some(_)) => Err(KestrelError::bad_input(
                "lat and lng must be provided together",
            )),
            (None, None) => {
                let postal_code = query
                    .postal_code
                    .as_deref()
                    .map(str::trim)
                    .filter(|code| !code.is_empty())
                    .ok_or_else(|| KestrelError::bad_input("provide lat/lng or a postal code"))?;
                if !is_postal_code(postal_code) {
                    return Err(KestrelError::bad_input(format!(
                        "postal code '{}' must be 5 digits",
                        postal_code
                    )));
                }
                let coords = self.source.geocode(postal_code).await?;
                debug!("Postal code {} resolved to ({}, {})", postal_code, coords.lat, coords.lng);
                Ok(Origin::from_postal_code(coords.lat, coords.lng, postal_code))
            }
        }
    }

    pub async fn run(&self, mode: Mode, origin: &Origin, distance_km: f64) -> Result<Vec<RankedResult>> {
        match mode {
            Mode::Random => Ok(vec![self.get_random_hotspot(origin, distance_km).await?]),
            Mode::Top => self.get_top_hotspots(origin, distance_km).await,
            Mode::Notable => self.get_notable_hotspots(origin, distance_km).await,
        }
    }

    /// One hotspot chosen uniformly at random, with its species roster.
    pub async fn get_random_hotspot(&self, origin: &Origin, distance_km: f64) -> Result<RankedResult> {
        let distance_km = clamp_distance(distance_km)?;
        let hotspots = self.find_hotspots(origin, distance_km).await?;
        let chosen = pick_random(hotspots, &mut rand::rng())
            .ok_or_else(|| KestrelError::not_found("No hotspots found nearby"))?;
        info!("Picked {} ({})", chosen.loc_name, chosen.loc_id);

        let records = self.source.recent_observations(&chosen.loc_id).await?;
        let activity = summarize(&records, Tracking::SPECIES);
        Ok(RankedResult::new(Hotspot::from_raw(chosen, Some(origin)), activity))
    }

    /// The most active hotspots by score.
    pub async fn get_top_hotspots(&self, origin: &Origin, distance_km: f64) -> Result<Vec<RankedResult>> {
        let distance_km = clamp_distance(distance_km)?;
        let hotspots = self.find_hotspots(origin, distance_km).await?;
        let evaluated = hotspots.len();

        let source = &self.source;
        let results = map_bounded(hotspots, self.workers, |raw| async move {
            let records = source.recent_observations(&raw.loc_id).await?;
            let activity = summarize(&records, Tracking::SPECIES);
            Ok::<_, KestrelError>(RankedResult::new(Hotspot::from_raw(raw, Some(origin)), activity))
        })
        .await?;

        let ranked = rank_top(results, TOP_RESULTS);
        info!("Ranked top {} of {} hotspots", ranked.len(), evaluated);
        Ok(ranked)
    }

    /// Hotspots with the most notable species, from one radius-wide query.
    pub async fn get_notable_hotspots(&self, origin: &Origin, distance_km: f64) -> Result<Vec<RankedResult>> {
        let distance_km = clamp_distance(distance_km)?;
        let hotspots = self.find_hotspots(origin, distance_km).await?;
        let mut lookup: HashMap<String, RawHotspot> = hotspots
            .into_iter()
            .map(|raw| (raw.loc_id.clone(), raw))
            .collect();

        let query = NotableQuery {
            lat: origin.lat,
            lng: origin.lng,
            distance_km: distance_km.min(MAX_NOTABLE_DISTANCE_KM),
        };
        let records = self.source.notable_observations(&query).await?;
        let groups = summarize_by_location(&records, Tracking::NOTABLE);
        let group_count = groups.len();

        let results: Vec<RankedResult> = groups
            .into_iter()
            .filter_map(|(loc_id, activity)| {
                let raw = lookup.remove(&loc_id)?;
                Some(RankedResult::new(Hotspot::from_raw(raw, Some(origin)), activity))
            })
            .collect();
        debug!(
            "{} of {} notable groups matched a nearby hotspot",
            results.len(),
            group_count
        );

        let ranked = rank_notable(results, TOP_RESULTS);
        info!("Ranked {} notable hotspots from {} records", ranked.len(), records.len());
        Ok(ranked)
    }

    async fn find_hotspots(&self, origin: &Origin, distance_km: f64) -> Result<Vec<RawHotspot>> {
        let query = HotspotQuery {
            lat: origin.lat,
            lng: origin.lng,
            distance_km,
            limit: self.hotspot_limit,
        };
        let mut hotspots = self.source.nearby_hotspots(&query).await?;
        if hotspots.is_empty() {
            return Err(KestrelError::not_found(format!(
                "No hotspots found within {} km",
                distance_km
            )));
        }
        hotspots.truncate(self.hotspot_limit);
        Ok(hotspots)
    }
}

fn is_postal_code(code: &str) -> bool {
    code.len() == 5 && code.bytes().all(|b| b.is_ascii_digit())
}

pub fn pick_random<R: Rng + ?Sized>(hotspots: Vec<RawHotspot>, rng: &mut R) -> Option<RawHotspot> {
    hotspots.choose(rng).cloned()
}

/// Highest score first; equal scores fall back to `locId` ascending.
pub fn rank_top(mut results: Vec<RankedResult>, n: usize) -> Vec<RankedResult> {
    results.sort_by(|a, b| {
        b.activity
            .score
            .cmp(&a.activity.score)
            .then_with(|| by_loc_id(a, b))
    });
    results.truncate(n);
    results
}

/// Most notable species first, then most checklists, then `locId` ascending.
pub fn rank_notable(mut results: Vec<RankedResult>, n: usize) -> Vec<RankedResult> {
    results.sort_by(|a, b| {
        b.activity
            .observation_count
            .cmp(&a.activity.observation_count)
            .then_with(|| b.activity.checklist_count.cmp(&a.activity.checklist_count))
            .then_with(|| by_loc_id(a, b))
    });
    results.truncate(n);
    results
}

fn by_loc_id(a: &RankedResult, b: &RankedResult) -> Ordering {
    a.hotspot.loc_id.cmp(&b.hotspot.loc_id)
}
