//! Geometry transform for EML geographic coverage.
//!
//! Stored locations are GeoJSON-shaped features in longitude/latitude
//! degrees. Points carrying a `radius` property (meters) are expanded into
//! circular polygons before the bounding box and ring points are derived.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `[longitude, latitude]` in degrees.
pub type Position = [f64; 2];

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Number of segments used to approximate a circle.
pub const CIRCLE_STEPS: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

impl Geometry {
    pub fn positions(&self) -> Box<dyn Iterator<Item = &Position> + '_> {
        match self {
            Geometry::Point { coordinates } => Box::new(std::iter::once(coordinates)),
            Geometry::LineString { coordinates } => Box::new(coordinates.iter()),
            Geometry::Polygon { coordinates } => Box::new(coordinates.iter().flatten()),
            Geometry::MultiPolygon { coordinates } => {
                Box::new(coordinates.iter().flatten().flatten())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            properties: Map::new(),
        }
    }

    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self::new(Geometry::Point {
            coordinates: [longitude, latitude],
        })
    }

    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.properties
            .insert("radius".to_string(), Value::from(radius_m));
        self
    }

    /// Radius in meters, when present and positive.
    ///
    /// Accepts numeric strings since drawn features are stored with
    /// whatever the map widget emitted.
    pub fn radius(&self) -> Option<f64> {
        let radius = match self.properties.get("radius")? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }?;
        (radius.is_finite() && radius > 0.0).then_some(radius)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn as_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn contains(&self, position: &Position) -> bool {
        (self.west..=self.east).contains(&position[0])
            && (self.south..=self.north).contains(&position[1])
    }
}

/// Expands a point with a radius into a circular polygon.
///
/// Any other feature, including a point without a radius, is returned
/// unchanged.
pub fn synthesize_polygon(feature: &Feature) -> Feature {
    match (&feature.geometry, feature.radius()) {
        (Geometry::Point { coordinates }, Some(radius)) => Feature {
            geometry: Geometry::Polygon {
                coordinates: vec![circle(*coordinates, radius, CIRCLE_STEPS)],
            },
            properties: feature.properties.clone(),
        },
        _ => feature.clone(),
    }
}

/// Closed ring approximating a circle of `radius_m` meters around `center`.
///
/// Bearings step counterclockwise from north; the first position is
/// repeated at the end.
pub fn circle(center: Position, radius_m: f64, steps: usize) -> Vec<Position> {
    let steps = steps.max(3);
    let mut ring = (0..steps)
        .map(|step| {
            let bearing = (step as f64) * -360.0 / steps as f64;
            destination(center, radius_m, bearing)
        })
        .collect::<Vec<_>>();
    ring.push(ring[0]);
    ring
}

/// Great-circle destination from `origin` after `distance_m` along `bearing_deg`.
pub fn destination(origin: Position, distance_m: f64, bearing_deg: f64) -> Position {
    let lon1 = origin[0].to_radians();
    let lat1 = origin[1].to_radians();
    let bearing = bearing_deg.to_radians();
    let angular = distance_m / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    [lon2.to_degrees(), lat2.to_degrees()]
}

/// Smallest axis-aligned box enclosing every position of every feature.
///
/// Returns `None` when the features carry no positions at all.
pub fn bounding_box(features: &[Feature]) -> Option<BoundingBox> {
    let mut positions = features
        .iter()
        .flat_map(|feature| feature.geometry.positions());
    let first = positions.next()?;
    let initial = BoundingBox {
        west: first[0],
        south: first[1],
        east: first[0],
        north: first[1],
    };
    Some(positions.fold(initial, |bbox, position| BoundingBox {
        west: bbox.west.min(position[0]),
        south: bbox.south.min(position[1]),
        east: bbox.east.max(position[0]),
        north: bbox.north.max(position[1]),
    }))
}

/// Outer boundary rings of a feature, in stored winding order.
///
/// Polygons yield their first ring, multipolygons the first ring of each
/// part, lines their vertex list and points a single-position ring.
pub fn extract_rings(feature: &Feature) -> Vec<Vec<Position>> {
    match &feature.geometry {
        Geometry::Point { coordinates } => vec![vec![*coordinates]],
        Geometry::LineString { coordinates } => vec![coordinates.clone()],
        Geometry::Polygon { coordinates } => coordinates.first().cloned().into_iter().collect(),
        Geometry::MultiPolygon { coordinates } => coordinates
            .iter()
            .filter_map(|polygon| polygon.first().cloned())
            .collect(),
    }
}
