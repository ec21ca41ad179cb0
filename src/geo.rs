//! Point-in-polygon containment for park areas.
//!
//! Area outlines are stored as a list of `{lat, lng}` vertices. Callers may
//! send them as coordinate pairs, point objects, or a GeoJSON `Polygon`; all
//! three are parsed into the same [`Polygon`].

use crate::error::{ParksError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(mut vertices: Vec<Point>) -> Result<Self> {
        // A closing vertex equal to the first one is implied.
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        for p in &vertices {
            if !p.lat.is_finite() || !p.lng.is_finite() {
                return Err(ParksError::InvalidPolygon(
                    "vertex coordinates must be finite".to_string(),
                ));
            }
        }
        if vertices.len() < 3 {
            return Err(ParksError::InvalidPolygon(format!(
                "need at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Self { vertices })
    }

    /// Parse a stored or submitted polygon in any accepted encoding.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => Self::new(
                items
                    .iter()
                    .map(parse_vertex)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Object(map) => {
                let kind = map.get("type").and_then(Value::as_str);
                if kind != Some("Polygon") {
                    return Err(ParksError::InvalidPolygon(
                        "object polygons must be GeoJSON of type Polygon".to_string(),
                    ));
                }
                let ring = map
                    .get("coordinates")
                    .and_then(Value::as_array)
                    .and_then(|rings| rings.first())
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        ParksError::InvalidPolygon("GeoJSON polygon has no outer ring".to_string())
                    })?;
                Self::new(
                    ring.iter()
                        .map(parse_geojson_position)
                        .collect::<Result<Vec<_>>>()?,
                )
            }
            Value::String(raw) => {
                let inner: Value = serde_json::from_str(raw)
                    .map_err(|e| ParksError::InvalidPolygon(e.to_string()))?;
                Self::from_json(&inner)
            }
            _ => Err(ParksError::InvalidPolygon(
                "expected an array of points or a GeoJSON polygon".to_string(),
            )),
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn into_vertices(self) -> Vec<Point> {
        self.vertices
    }

    /// Even-odd ray casting: cast a ray towards +lng and count edge crossings.
    pub fn contains(&self, point: Point) -> bool {
        let v = &self.vertices;
        let (x, y) = (point.lng, point.lat);
        let mut inside = false;
        let mut j = v.len() - 1;
        for i in 0..v.len() {
            let (xi, yi) = (v[i].lng, v[i].lat);
            let (xj, yj) = (v[j].lng, v[j].lat);
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

fn parse_vertex(value: &Value) -> Result<Point> {
    match value {
        Value::Array(pair) if pair.len() >= 2 => {
            let lat = pair[0].as_f64();
            let lng = pair[1].as_f64();
            match (lat, lng) {
                (Some(lat), Some(lng)) => Ok(Point { lat, lng }),
                _ => Err(ParksError::InvalidPolygon(format!(
                    "coordinate pair is not numeric: {value}"
                ))),
            }
        }
        Value::Object(map) => {
            let lat = map.get("lat").and_then(Value::as_f64);
            let lng = map
                .get("lng")
                .or_else(|| map.get("lon"))
                .and_then(Value::as_f64);
            match (lat, lng) {
                (Some(lat), Some(lng)) => Ok(Point { lat, lng }),
                _ => Err(ParksError::InvalidPolygon(format!(
                    "point needs numeric lat and lng: {value}"
                ))),
            }
        }
        _ => Err(ParksError::InvalidPolygon(format!(
            "unrecognised vertex: {value}"
        ))),
    }
}

// GeoJSON positions are [lng, lat]
fn parse_geojson_position(value: &Value) -> Result<Point> {
    let pair = value
        .as_array()
        .filter(|p| p.len() >= 2)
        .ok_or_else(|| ParksError::InvalidPolygon(format!("bad GeoJSON position: {value}")))?;
    match (pair[1].as_f64(), pair[0].as_f64()) {
        (Some(lat), Some(lng)) => Ok(Point { lat, lng }),
        _ => Err(ParksError::InvalidPolygon(format!(
            "bad GeoJSON position: {value}"
        ))),
    }
}

/// First area (in the given order) whose polygon contains `point`.
pub fn locate_area<'a, I>(areas: I, point: Point) -> Option<i64>
where
    I: IntoIterator<Item = (i64, &'a Polygon)>,
{
    areas
        .into_iter()
        .find(|(_, polygon)| polygon.contains(point))
        .map(|(id, _)| id)
}

/// Area whose code prefixes `tree_code` at a segment boundary; the longest wins.
pub fn area_by_code_prefix<'a, I>(areas: I, tree_code: &str) -> Option<i64>
where
    I: IntoIterator<Item = (i64, &'a str)>,
{
    areas
        .into_iter()
        .filter(|(_, code)| {
            !code.is_empty()
                && tree_code.len() > code.len()
                && tree_code.starts_with(code)
                && tree_code[code.len()..].starts_with('-')
        })
        .max_by_key(|(_, code)| code.len())
        .map(|(id, _)| id)
}
