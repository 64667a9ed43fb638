//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG codes the workspace knows how to reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// WGS84 / UTM zone (EPSG:326zz north, EPSG:327zz south)
    Utm { zone: u8, north: bool },
    /// Any other geographic CRS (EPSG:4001-4999)
    Geographic(u32),
    /// Any other projected CRS
    Projected(u32),
    /// Raster or layer carried no CRS information
    Unknown,
}

impl CrsCode {
    /// Classify a numeric EPSG code.
    pub fn from_epsg(code: u32) -> Self {
        match code {
            4326 => CrsCode::Epsg4326,
            3857 | 900913 => CrsCode::Epsg3857,
            32601..=32660 => CrsCode::Utm {
                zone: (code - 32600) as u8,
                north: true,
            },
            32701..=32760 => CrsCode::Utm {
                zone: (code - 32700) as u8,
                north: false,
            },
            4001..=4999 => CrsCode::Geographic(code),
            _ => CrsCode::Projected(code),
        }
    }

    /// Numeric EPSG code, if known.
    pub fn epsg(&self) -> Option<u32> {
        match self {
            CrsCode::Epsg4326 => Some(4326),
            CrsCode::Epsg3857 => Some(3857),
            CrsCode::Utm { zone, north: true } => Some(32600 + *zone as u32),
            CrsCode::Utm { zone, north: false } => Some(32700 + *zone as u32),
            CrsCode::Geographic(code) | CrsCode::Projected(code) => Some(*code),
            CrsCode::Unknown => None,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Geographic(_))
    }
}

/// A coordinate reference system identifier attached to grids and layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub code: CrsCode,
}

impl Crs {
    pub fn new(code: CrsCode) -> Self {
        Self { code }
    }

    /// Build from a numeric EPSG code.
    pub fn epsg(code: u32) -> Self {
        Self::new(CrsCode::from_epsg(code))
    }

    /// WGS84 geographic, the GeoJSON default.
    pub fn wgs84() -> Self {
        Self::new(CrsCode::Epsg4326)
    }

    pub fn unknown() -> Self {
        Self::new(CrsCode::Unknown)
    }

    /// Parse a CRS identifier string.
    ///
    /// Accepts formats like:
    /// - "EPSG:32718"
    /// - "epsg:4326"
    /// - "urn:ogc:def:crs:EPSG::32718"
    /// - "CRS:84" / "urn:ogc:def:crs:OGC:1.3:CRS84" (WGS84 lon/lat)
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        if normalized == "CRS:84" || normalized == "OGC:CRS84" || normalized.ends_with(":CRS84") {
            return Ok(Self::wgs84());
        }

        let digits = normalized
            .strip_prefix("EPSG:")
            .or_else(|| normalized.strip_prefix("URN:OGC:DEF:CRS:EPSG::"))
            .or_else(|| {
                // urn:ogc:def:crs:EPSG:6.6:32718 carries a version between the colons
                normalized
                    .strip_prefix("URN:OGC:DEF:CRS:EPSG:")
                    .and_then(|rest| rest.rsplit(':').next())
            })
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;

        digits
            .parse::<u32>()
            .map(Self::epsg)
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))
    }

    pub fn is_geographic(&self) -> bool {
        self.code.is_geographic()
    }

    pub fn is_known(&self) -> bool {
        self.code != CrsCode::Unknown
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code.epsg() {
            Some(code) => write!(f, "EPSG:{}", code),
            None => write!(f, "unknown CRS"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
