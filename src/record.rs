use crate::geo::{haversine_km, round_km};
use serde::{Deserialize, Serialize};

const HOTSPOT_URL_BASE: &str = "https://ebird.org/hotspot";

/// How the request location was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OriginSource {
    Coordinates,
    PostalCode,
}

/// Reference point for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub lat: f64,
    pub lng: f64,
    pub source: OriginSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl Origin {
    pub fn from_coordinates(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            source: OriginSource::Coordinates,
            postal_code: None,
        }
    }

    pub fn from_postal_code(lat: f64, lng: f64, postal_code: &str) -> Self {
        Self {
            lat,
            lng,
            source: OriginSource::PostalCode,
            postal_code: Some(postal_code.to_string()),
        }
    }

    /// Distance to a point, rounded for display.
    pub fn distance_to(&self, lat: f64, lng: f64) -> f64 {
        round_km(haversine_km(self.lat, self.lng, lat, lng))
    }
}

/// Hotspot as returned by `ref/hotspot/geo`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHotspot {
    pub loc_id: String,
    #[serde(default)]
    pub loc_name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub subnational1_code: String,
    #[serde(default)]
    pub latest_obs_dt: Option<String>,
    #[serde(default)]
    pub num_species_all_time: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub loc_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country_code: String,
    pub region_code: String,
    pub distance_km: Option<f64>,
    pub url: String,
}

impl Hotspot {
    /// Builds the client-facing hotspot. Distance always comes from the origin,
    /// never from upstream data.
    pub fn from_raw(raw: RawHotspot, origin: Option<&Origin>) -> Self {
        let distance_km = origin.map(|o| o.distance_to(raw.lat, raw.lng));
        Self {
            url: format!("{}/{}", HOTSPOT_URL_BASE, raw.loc_id),
            loc_id: raw.loc_id,
            name: raw.loc_name,
            latitude: raw.lat,
            longitude: raw.lng,
            country_code: raw.country_code,
            region_code: raw.subnational1_code,
            distance_km,
        }
    }
}

/// One observation from `data/obs/...`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRecord {
    #[serde(default)]
    pub loc_id: Option<String>,
    #[serde(default)]
    pub sub_id: Option<String>,
    #[serde(default)]
    pub species_code: String,
    #[serde(default)]
    pub com_name: Option<String>,
    #[serde(default)]
    pub sci_name: Option<String>,
    #[serde(default)]
    pub how_many: Option<u32>,
    #[serde(default)]
    pub obs_dt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Species {
    pub species_code: String,
    pub common_name: Option<String>,
    pub scientific_name: Option<String>,
}

impl Species {
    pub fn display_name(&self) -> &str {
        self.common_name
            .as_deref()
            .or(self.scientific_name.as_deref())
            .unwrap_or("")
    }
}

/// Activity folded from a hotspot's observations.
///
/// Raw sightings and unique species are kept apart; `observation_count` is the
/// one chosen for output, and `score` is always derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub checklist_count: u32,
    #[serde(skip)]
    pub raw_sighting_count: u32,
    #[serde(skip)]
    pub unique_species_count: u32,
    pub observation_count: u32,
    pub last_observation_date: Option<String>,
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species_list: Option<Vec<Species>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notable_species: Option<Vec<Species>>,
}

/// A hotspot with its activity, the unit handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    #[serde(flatten)]
    pub hotspot: Hotspot,
    #[serde(flatten)]
    pub activity: ActivitySummary,
}

impl RankedResult {
    pub fn new(hotspot: Hotspot, activity: ActivitySummary) -> Self {
        Self { hotspot, activity }
    }
}
