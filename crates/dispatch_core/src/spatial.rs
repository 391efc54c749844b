//! Spatial operations: pickup distances and zone discretization.
//!
//! This module provides:
//!
//! - **GeoPoint**: a two-dimensional location (`x` = longitude, `y` = latitude
//!   when the haversine metric is used)
//! - **DistanceMetric**: planar Euclidean or great-circle (haversine, km) distance
//! - **ZoneScheme**: maps a location to a discrete [`Zone`], either an H3 cell
//!   or a square grid cell, used to index learned values

use h3o::{LatLng, Resolution};
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default H3 resolution for zones (~0.7 km² cells).
pub const DEFAULT_ZONE_RESOLUTION: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
}

impl GeoPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    Euclidean,
    #[default]
    HaversineKm,
}

impl DistanceMetric {
    /// Symmetric, non-negative distance between two points.
    pub fn distance(self, a: GeoPoint, b: GeoPoint) -> f64 {
        match self {
            DistanceMetric::Euclidean => (a.x - b.x).hypot(a.y - b.y),
            DistanceMetric::HaversineKm => haversine_km(a, b),
        }
    }
}

/// Great-circle distance in km; points are (lng, lat) in degrees.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lon1) = (a.y.to_radians(), a.x.to_radians());
    let (lat2, lon2) = (b.y.to_radians(), b.x.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    // Rounding can push h a hair above 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Discrete zone identifier. For H3 schemes this is the raw cell index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Zone(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoneScheme {
    /// H3 cell at the given resolution; points must be valid (lng, lat) degrees.
    H3 { resolution: u8 },
    /// Axis-aligned square cells of `cell_size` coordinate units.
    Grid { cell_size: f64 },
}

impl Default for ZoneScheme {
    fn default() -> Self {
        ZoneScheme::H3 {
            resolution: DEFAULT_ZONE_RESOLUTION,
        }
    }
}

impl ZoneScheme {
    pub fn validate(&self) -> Result<()> {
        match *self {
            ZoneScheme::H3 { resolution } => Resolution::try_from(resolution)
                .map(|_| ())
                .map_err(|err| {
                    DispatchError::configuration(format!("invalid H3 resolution {resolution}: {err}"))
                }),
            ZoneScheme::Grid { cell_size } if cell_size.is_finite() && cell_size > 0.0 => Ok(()),
            ZoneScheme::Grid { cell_size } => Err(DispatchError::configuration(format!(
                "grid cell_size must be positive, got {cell_size}"
            ))),
        }
    }

    pub fn zone_of(&self, point: GeoPoint) -> Result<Zone> {
        match *self {
            ZoneScheme::H3 { resolution } => {
                let resolution = Resolution::try_from(resolution)
                    .map_err(|err| DispatchError::configuration(err.to_string()))?;
                let latlng = LatLng::new(point.y, point.x).map_err(|err| {
                    DispatchError::data(format!(
                        "location ({}, {}) is not a valid lng/lat: {err}",
                        point.x, point.y
                    ))
                })?;
                Ok(Zone(u64::from(latlng.to_cell(resolution))))
            }
            ZoneScheme::Grid { cell_size } => {
                if !point.is_finite() {
                    return Err(DispatchError::data(format!(
                        "location ({}, {}) is not finite",
                        point.x, point.y
                    )));
                }
                let ix = grid_index(point.x, cell_size)?;
                let iy = grid_index(point.y, cell_size)?;
                Ok(Zone(((ix as u32 as u64) << 32) | iy as u32 as u64))
            }
        }
    }
}

/// Cell index along one axis; each axis is packed into 32 bits of a [`Zone`].
fn grid_index(coordinate: f64, cell_size: f64) -> Result<i32> {
    let cell = (coordinate / cell_size).floor();
    if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&cell) {
        return Err(DispatchError::data(format!(
            "coordinate {coordinate} is outside the grid range for cell size {cell_size}"
        )));
    }
    Ok(cell as i32)
}
