//! Border-polygon background geometry.
//!
//! One shared GeoJSON file provides county boundaries drawn behind the map.
//! Only the ring outlines matter to the renderer, so the parse flattens
//! `Polygon` / `MultiPolygon` features into plain lng/lat polylines and
//! ignores every other geometry type.

use std::io::Read;

use serde::Deserialize;

use crate::store::LoadError;

/// Ring polylines in (lng, lat) order, ready for projection.
#[derive(Debug, Clone, Default)]
pub struct BorderSet {
    pub rings: Vec<Vec<[f64; 2]>>,
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

// Coordinates are parsed as Vec<f64> rather than [f64; 2] because GeoJSON
// positions may carry a third (elevation) element.
#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Other,
}

fn push_ring(rings: &mut Vec<Vec<[f64; 2]>>, ring: &[Vec<f64>]) {
    let points: Vec<[f64; 2]> = ring
        .iter()
        .filter_map(|pos| Some([*pos.first()?, *pos.get(1)?]))
        .collect();
    if points.len() >= 2 {
        rings.push(points);
    }
}

/// Parse a GeoJSON `FeatureCollection` into a [`BorderSet`].
pub fn parse_borders<R: Read>(reader: R) -> Result<BorderSet, LoadError> {
    let collection: FeatureCollection = serde_json::from_reader(reader)?;
    let mut rings = Vec::new();
    for feature in &collection.features {
        match &feature.geometry {
            Some(Geometry::Polygon { coordinates }) => {
                for ring in coordinates {
                    push_ring(&mut rings, ring);
                }
            }
            Some(Geometry::MultiPolygon { coordinates }) => {
                for polygon in coordinates {
                    for ring in polygon {
                        push_ring(&mut rings, ring);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(BorderSet { rings })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_polygon_and_multipolygon() {
        let raw = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon",
                              "coordinates": [[[-95.0, 39.0], [-95.1, 39.0], [-95.1, 39.1], [-95.0, 39.0]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "MultiPolygon",
                              "coordinates": [[[[-96.0, 40.0, 12.0], [-96.2, 40.1, 12.0], [-96.0, 40.0, 12.0]]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [-95.0, 39.0]}}
            ]
        }"#;
        let borders = parse_borders(raw.as_bytes()).unwrap();
        assert_eq!(borders.rings.len(), 2);
        assert_eq!(borders.rings[0].len(), 4);
        // Elevation element is dropped.
        assert_eq!(borders.rings[1][1], [-96.2, 40.1]);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(parse_borders("not json".as_bytes()).is_err());
    }

    #[test]
    fn test_feature_without_geometry_is_skipped() {
        let raw = r#"{"type": "FeatureCollection", "features": [{"type": "Feature"}]}"#;
        let borders = parse_borders(raw.as_bytes()).unwrap();
        assert!(borders.rings.is_empty());
    }
}
