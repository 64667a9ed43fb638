//! GeoJSON vector layers drawn over the flood map.
//!
//! Multi-part geometries are flattened into their parts. The layer CRS
//! comes from the legacy `crs.properties.name` member and defaults to
//! EPSG:4326 as RFC 7946 requires.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use flood_common::{BoundingBox, Crs, FloodResult};

use crate::error::{StoreError, StoreResult};

pub type Coord = (f64, f64);

/// A single-part geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    /// Exterior ring followed by holes.
    Polygon(Vec<Vec<Coord>>),
}

impl Geometry {
    pub fn coords(&self) -> Vec<Coord> {
        match self {
            Geometry::Point(p) => vec![*p],
            Geometry::LineString(line) => line.clone(),
            Geometry::Polygon(rings) => rings.iter().flatten().copied().collect(),
        }
    }

    /// Apply a fallible function to every vertex.
    pub fn try_map_coords<E, F>(&self, f: &mut F) -> Result<Geometry, E>
    where
        F: FnMut(f64, f64) -> Result<Coord, E>,
    {
        Ok(match self {
            Geometry::Point((x, y)) => Geometry::Point(f(*x, *y)?),
            Geometry::LineString(pts) => Geometry::LineString(map_line(pts, f)?),
            Geometry::Polygon(rings) => Geometry::Polygon(
                rings
                    .iter()
                    .map(|ring| map_line(ring, f))
                    .collect::<Result<Vec<_>, E>>()?,
            ),
        })
    }
}

fn map_line<E, F>(pts: &[Coord], f: &mut F) -> Result<Vec<Coord>, E>
where
    F: FnMut(f64, f64) -> Result<Coord, E>,
{
    pts.iter().map(|(x, y)| f(*x, *y)).collect()
}

/// How a layer is drawn and labelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub label: String,
    pub color: [u8; 3],
    pub line_width: f32,
}

impl LayerStyle {
    pub fn new(label: impl Into<String>, color: [u8; 3], line_width: f32) -> Self {
        Self {
            label: label.into(),
            color,
            line_width,
        }
    }

    pub fn river() -> Self {
        Self::new("River", [0, 0, 255], 1.5)
    }

    pub fn dam() -> Self {
        Self::new("Dam", [255, 0, 0], 4.0)
    }
}

/// Parse `#rrggbb` or a basic color name.
pub fn parse_color(s: &str) -> Option<[u8; 3]> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some([channel(0)?, channel(2)?, channel(4)?]);
    }
    let rgb = match s.to_ascii_lowercase().as_str() {
        "blue" => [0, 0, 255],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "yellow" => [255, 255, 0],
        "orange" => [255, 165, 0],
        "cyan" => [0, 255, 255],
        "magenta" => [255, 0, 255],
        "gray" | "grey" => [128, 128, 128],
        _ => return None,
    };
    Some(rgb)
}

/// Geometries of one GeoJSON file in one CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    pub name: String,
    pub geometries: Vec<Geometry>,
    pub crs: Crs,
    pub style: LayerStyle,
}

impl VectorLayer {
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.geometries.iter().flat_map(|g| g.coords()))
    }

    pub fn vertex_count(&self) -> usize {
        self.geometries.iter().map(|g| g.coords().len()).sum()
    }
}

fn coord(value: &Value) -> StoreResult<Coord> {
    let arr = value
        .as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| StoreError::InvalidMetadata(format!("invalid position: {}", value)))?;
    match (arr[0].as_f64(), arr[1].as_f64()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(StoreError::InvalidMetadata(format!("non-numeric position: {}", value))),
    }
}

fn coords(value: &Value) -> StoreResult<Vec<Coord>> {
    value
        .as_array()
        .ok_or_else(|| StoreError::InvalidMetadata("expected an array of positions".to_string()))?
        .iter()
        .map(coord)
        .collect()
}

fn rings(value: &Value) -> StoreResult<Vec<Vec<Coord>>> {
    value
        .as_array()
        .ok_or_else(|| StoreError::InvalidMetadata("expected an array of rings".to_string()))?
        .iter()
        .map(coords)
        .collect()
}

fn members<'a>(value: &'a Value, key: &str) -> StoreResult<&'a Vec<Value>> {
    value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::InvalidMetadata(format!("missing '{}' array", key)))
}

fn collect_geometries(value: &Value, out: &mut Vec<Geometry>) -> StoreResult<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidMetadata("GeoJSON object without 'type'".to_string()))?;

    match kind {
        "FeatureCollection" => {
            for feature in members(value, "features")? {
                collect_geometries(feature, out)?;
            }
        }
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => {}
            Some(geometry) => collect_geometries(geometry, out)?,
        },
        "GeometryCollection" => {
            for geometry in members(value, "geometries")? {
                collect_geometries(geometry, out)?;
            }
        }
        _ => {
            let c = value
                .get("coordinates")
                .ok_or_else(|| StoreError::InvalidMetadata(format!("{} without coordinates", kind)))?;
            match kind {
                "Point" => out.push(Geometry::Point(coord(c)?)),
                "MultiPoint" => out.extend(coords(c)?.into_iter().map(Geometry::Point)),
                "LineString" => out.push(Geometry::LineString(coords(c)?)),
                "MultiLineString" => out.extend(rings(c)?.into_iter().map(Geometry::LineString)),
                "Polygon" => out.push(Geometry::Polygon(rings(c)?)),
                "MultiPolygon" => {
                    for polygon in members(value, "coordinates")? {
                        out.push(Geometry::Polygon(rings(polygon)?));
                    }
                }
                other => {
                    return Err(StoreError::UnsupportedFormat(format!(
                        "GeoJSON type '{}'",
                        other
                    )))
                }
            }
        }
    }
    Ok(())
}

fn layer_crs(value: &Value) -> StoreResult<Crs> {
    match value.pointer("/crs/properties/name").and_then(Value::as_str) {
        Some(name) => Crs::parse(name).map_err(|e| StoreError::InvalidMetadata(e.to_string())),
        None => Ok(Crs::wgs84()),
    }
}

/// Parse GeoJSON text into geometries and their CRS.
pub fn parse_geojson(text: &str) -> StoreResult<(Vec<Geometry>, Crs)> {
    let value: Value = serde_json::from_str(text)?;
    let crs = layer_crs(&value)?;
    let mut geometries = Vec::new();
    collect_geometries(&value, &mut geometries)?;
    Ok((geometries, crs))
}

/// Load a GeoJSON file as a styled layer.
pub fn read_vector_layer(path: impl AsRef<Path>, style: LayerStyle) -> FloodResult<VectorLayer> {
    let path = path.as_ref();
    let (geometries, crs) = fs::read_to_string(path)
        .map_err(StoreError::from)
        .and_then(|text| parse_geojson(&text))
        .map_err(|e| e.into_input(path))?;

    let layer = VectorLayer {
        name: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| style.label.clone()),
        geometries,
        crs,
        style,
    };
    if layer.geometries.is_empty() {
        warn!(path = %path.display(), "Vector layer has no geometries");
    }
    info!(
        path = %path.display(),
        label = %layer.style.label,
        geometries = layer.geometries.len(),
        crs = %layer.crs,
        "Loaded vector layer"
    );
    Ok(layer)
}
