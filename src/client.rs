//! eBird API v2 and postal-code geocoder client.
//!
//! Endpoints used:
//!   {ebird}/ref/hotspot/geo                 nearby hotspots
//!   {ebird}/data/obs/{locId}/recent         recent observations at one hotspot
//!   {ebird}/data/obs/geo/recent/notable     notable observations in a radius
//!   {geocode}/{postalCode}                  postal code centroid

use crate::config::Config;
use crate::error::{KestrelError, Result};
use crate::geo::MAX_NOTABLE_DISTANCE_KM;
use crate::record::{ObservationRecord, RawHotspot};
use log::{debug, info, warn};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

const TOKEN_HEADER: &str = "X-eBirdApiToken";
const USER_AGENT: &str = concat!("kestrel/", env!("CARGO_PKG_VERSION"));

/// Days of history for every activity query.
pub const RECENCY_DAYS: u32 = 7;
pub const MAX_OBSERVATIONS: u32 = 500;
pub const DEFAULT_HOTSPOT_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotspotQuery {
    pub lat: f64,
    pub lng: f64,
    pub distance_km: f64,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotableQuery {
    pub lat: f64,
    pub lng: f64,
    pub distance_km: f64,
}

/// Everything the ranking pipeline needs from the outside world.
pub trait BirdDataSource {
    /// Resolves a postal code, failing with `NotFound` when it has no place.
    fn geocode(&self, postal_code: &str) -> impl Future<Output = Result<Coordinates>>;

    /// Hotspots active in the recency window, at most `query.limit` of them.
    fn nearby_hotspots(&self, query: &HotspotQuery) -> impl Future<Output = Result<Vec<RawHotspot>>>;

    /// Recent observations at one hotspot. A vanished hotspot yields none.
    fn recent_observations(&self, loc_id: &str) -> impl Future<Output = Result<Vec<ObservationRecord>>>;

    /// Notable observations at hotspots within the radius.
    fn notable_observations(
        &self,
        query: &NotableQuery,
    ) -> impl Future<Output = Result<Vec<ObservationRecord>>>;
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    places: Vec<Place>,
}

#[derive(Deserialize)]
struct Place {
    latitude: CoordValue,
    longitude: CoordValue,
}

/// Zippopotam sends coordinates as strings; accept numbers too.
#[derive(Deserialize)]
#[serde(untagged)]
enum CoordValue {
    Number(f64),
    Text(String),
}

impl Place {
    fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            lat: self.latitude.as_f64()?,
            lng: self.longitude.as_f64()?,
        })
    }
}

impl CoordValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            CoordValue::Number(n) => Some(*n),
            CoordValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// eBird takes whole kilometres.
fn dist_param(km: f64) -> u32 {
    km.round().max(1.0) as u32
}

pub fn hotspots_url(base: &str, query: &HotspotQuery) -> String {
    format!(
        "{}/ref/hotspot/geo?lat={}&lng={}&dist={}&back={}&fmt=json&maxResults={}",
        base,
        query.lat,
        query.lng,
        dist_param(query.distance_km),
        RECENCY_DAYS,
        query.limit
    )
}

pub fn recent_observations_url(base: &str, loc_id: &str) -> String {
    format!(
        "{}/data/obs/{}/recent?back={}&maxResults={}",
        base, loc_id, RECENCY_DAYS, MAX_OBSERVATIONS
    )
}

pub fn notable_observations_url(base: &str, query: &NotableQuery) -> String {
    format!(
        "{}/data/obs/geo/recent/notable?lat={}&lng={}&dist={}&back={}&hotspot=true&maxResults={}",
        base,
        query.lat,
        query.lng,
        dist_param(query.distance_km.min(MAX_NOTABLE_DISTANCE_KM)),
        RECENCY_DAYS,
        MAX_OBSERVATIONS
    )
}

pub fn geocode_url(base: &str, postal_code: &str) -> String {
    format!("{}/{}", base, postal_code)
}

/// Hotspots can be removed or merged; eBird answers those with 404 or 410.
fn is_missing_location(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::GONE
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(KestrelError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

pub struct EbirdClient {
    client: Client,
    api_key: String,
    ebird_api_base: String,
    geocode_api_base: String,
}

impl EbirdClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http_client(config.request_timeout)?;
        Ok(Self::with_client(config, client))
    }

    /// Uses a caller-built `reqwest::Client`.
    pub fn with_client(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            ebird_api_base: config.ebird_api_base.clone(),
            geocode_api_base: config.geocode_api_base.clone(),
        }
    }

    async fn provider_get(&self, url: &str) -> Result<Response> {
        debug!("GET {}", url);
        Ok(self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.api_key)
            .send()
            .await?)
    }
}

impl BirdDataSource for EbirdClient {
    async fn geocode(&self, postal_code: &str) -> Result<Coordinates> {
        let url = geocode_url(&self.geocode_api_base, postal_code);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            warn!("Geocoder returned {} for {}", response.status(), postal_code);
            return Err(KestrelError::not_found(format!(
                "No location found for postal code {}",
                postal_code
            )));
        }

        let parsed: GeocodeResponse = read_json(response).await?;
        parsed
            .places
            .first()
            .and_then(Place::coordinates)
            .ok_or_else(|| {
                KestrelError::not_found(format!("No location found for postal code {}", postal_code))
            })
    }

    async fn nearby_hotspots(&self, query: &HotspotQuery) -> Result<Vec<RawHotspot>> {
        let response = self.provider_get(&hotspots_url(&self.ebird_api_base, query)).await?;
        let mut hotspots: Vec<RawHotspot> = read_json(response).await?;
        hotspots.truncate(query.limit);
        info!(
            "Found {} hotspots within {} km of ({}, {})",
            hotspots.len(),
            query.distance_km,
            query.lat,
            query.lng
        );
        Ok(hotspots)
    }

    async fn recent_observations(&self, loc_id: &str) -> Result<Vec<ObservationRecord>> {
        let response = self
            .provider_get(&recent_observations_url(&self.ebird_api_base, loc_id))
            .await?;

        if is_missing_location(response.status()) {
            debug!("No observations for {} ({})", loc_id, response.status());
            return Ok(Vec::new());
        }

        let records: Vec<ObservationRecord> = read_json(response).await?;
        debug!("Fetched {} observations for {}", records.len(), loc_id);
        Ok(records)
    }

    async fn notable_observations(&self, query: &NotableQuery) -> Result<Vec<ObservationRecord>> {
        let response = self
            .provider_get(&notable_observations_url(&self.ebird_api_base, query))
            .await?;
        let records: Vec<ObservationRecord> = read_json(response).await?;
        info!("Fetched {} notable observations", records.len());
        Ok(records)
    }
}
