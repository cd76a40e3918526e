use chrono::NaiveDate;
use serde::Serialize;

use crate::constants::NOT_SUPPLIED;
use crate::domain::{Location, TaxonId};
use crate::geometry::{self, Feature, Position};
use crate::taxonomy::TaxonRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic_coverage: Option<GeographicCoverage>,
    pub temporal_coverage: TemporalCoverage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxonomic_coverage: Option<TaxonomicCoverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDate {
    pub calendar_date: String,
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            calendar_date: date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TemporalCoverage {
    #[serde(rename = "rangeOfDates")]
    RangeOfDates {
        #[serde(rename = "beginDate")]
        begin_date: CalendarDate,
        #[serde(rename = "endDate")]
        end_date: CalendarDate,
    },
    #[serde(rename = "singleDateTime")]
    SingleDateTime(CalendarDate),
}

pub fn build_temporal_coverage(start: NaiveDate, end: Option<NaiveDate>) -> TemporalCoverage {
    match end {
        Some(end) => TemporalCoverage::RangeOfDates {
            begin_date: start.into(),
            end_date: end.into(),
        },
        None => TemporalCoverage::SingleDateTime(start.into()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingCoordinates {
    pub west_bounding_coordinate: f64,
    pub east_bounding_coordinate: f64,
    pub north_bounding_coordinate: f64,
    pub south_bounding_coordinate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GRingPoint {
    #[serde(rename = "gRingLatitude")]
    pub latitude: f64,
    #[serde(rename = "gRingLongitude")]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GRing {
    #[serde(rename = "gRingPoint")]
    pub points: Vec<GRingPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetGPolygon {
    #[serde(rename = "datasetGPolygonOuterGRing")]
    pub outer_g_ring: GRing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeographicCoverage {
    #[serde(rename = "geographicDescription")]
    pub geographic_description: String,
    #[serde(rename = "boundingCoordinates")]
    pub bounding_coordinates: BoundingCoordinates,
    #[serde(rename = "datasetGPolygon")]
    pub polygons: Vec<DatasetGPolygon>,
}

/// Geographic coverage of a location; `None` when it has no geometry.
pub fn build_geographic_coverage(location: &Location) -> Option<GeographicCoverage> {
    if location.geometry.is_empty() {
        return None;
    }
    let features = location
        .geometry
        .iter()
        .map(geometry::synthesize_polygon)
        .collect::<Vec<Feature>>();
    let bbox = geometry::bounding_box(&features)?;

    let geographic_description = location
        .location_description
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(NOT_SUPPLIED)
        .to_string();

    let polygons = features
        .iter()
        .flat_map(geometry::extract_rings)
        .filter(|ring| !ring.is_empty())
        .map(|ring| DatasetGPolygon {
            outer_g_ring: GRing {
                points: ring.iter().map(ring_point).collect(),
            },
        })
        .collect();

    Some(GeographicCoverage {
        geographic_description,
        bounding_coordinates: BoundingCoordinates {
            west_bounding_coordinate: bbox.west,
            east_bounding_coordinate: bbox.east,
            north_bounding_coordinate: bbox.north,
            south_bounding_coordinate: bbox.south,
        },
        polygons,
    })
}

fn ring_point(position: &Position) -> GRingPoint {
    GRingPoint {
        latitude: position[1],
        longitude: position[0],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonIdAttributes {
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonIdElement {
    #[serde(rename = "$")]
    pub attributes: TaxonIdAttributes,
    #[serde(rename = "_")]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomicClassification {
    pub taxon_rank_name: String,
    pub taxon_rank_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    pub taxon_id: TaxonIdElement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomicCoverage {
    pub taxonomic_classification: Vec<TaxonomicClassification>,
}

/// Classification entries for `requested` ids, in request order.
///
/// Ids with no matching record are skipped; `None` when nothing matched.
pub fn build_taxonomic_coverage(
    requested: &[TaxonId],
    records: &[TaxonRecord],
    provider_url: &str,
) -> Option<TaxonomicCoverage> {
    let taxonomic_classification = requested
        .iter()
        .filter_map(|id| records.iter().find(|record| record.id == *id))
        .map(|record| TaxonomicClassification {
            taxon_rank_name: record.rank.clone(),
            taxon_rank_value: record.scientific_name(),
            common_name: record.english_name.clone(),
            taxon_id: TaxonIdElement {
                attributes: TaxonIdAttributes {
                    provider: provider_url.to_string(),
                },
                code: record.code.clone(),
            },
        })
        .collect::<Vec<_>>();

    if taxonomic_classification.is_empty() {
        return None;
    }
    Some(TaxonomicCoverage {
        taxonomic_classification,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    #[test]
    fn temporal_coverage_without_end_is_single_date() {
        let start = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        assert_eq!(
            build_temporal_coverage(start, None),
            TemporalCoverage::SingleDateTime(CalendarDate {
                calendar_date: "2020-05-01".to_string()
            })
        );
        let value = serde_json::to_value(build_temporal_coverage(
            start,
            NaiveDate::from_ymd_opt(2021, 5, 1),
        ))
        .unwrap();
        assert_eq!(
            value["rangeOfDates"]["endDate"]["calendarDate"],
            "2021-05-01"
        );
    }

    #[test]
    fn geographic_description_falls_back_to_sentinel() {
        let location = Location {
            location_description: Some("  ".to_string()),
            geometry: vec![Feature::point(-120.0, 50.0)],
        };
        let coverage = build_geographic_coverage(&location).unwrap();
        assert_eq!(coverage.geographic_description, NOT_SUPPLIED);
        assert_eq!(coverage.polygons.len(), 1);
        assert_eq!(coverage.polygons[0].outer_g_ring.points.len(), 1);
        assert_eq!(coverage.bounding_coordinates.west_bounding_coordinate, -120.0);
    }

    #[test]
    fn empty_rings_are_skipped() {
        let location = Location {
            location_description: None,
            geometry: vec![
                Feature::point(1.0, 2.0),
                Feature::new(Geometry::Polygon {
                    coordinates: vec![Vec::new()],
                }),
                Feature::new(Geometry::LineString {
                    coordinates: Vec::new(),
                }),
            ],
        };
        let coverage = build_geographic_coverage(&location).unwrap();
        assert_eq!(coverage.polygons.len(), 1);
        assert_eq!(coverage.polygons[0].outer_g_ring.points.len(), 1);
    }

    #[test]
    fn empty_geometry_yields_none() {
        assert_eq!(build_geographic_coverage(&Location::default()), None);
    }
}
