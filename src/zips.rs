//! ZIP-code centroid loading.
//!
//! The source is a semicolon-delimited table with one row per U.S. ZIP code
//! (`Zip;City;State;Latitude;Longitude;...;geopoint`). Only the `Zip`,
//! `State`, `Latitude` and `Longitude` columns are read; everything else,
//! including `geopoint`, is discarded.

use geo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::logging::log_data_load_stats;
use crate::projection::{parse_degrees, transform_point, validate_lon_lat, Crs};

/// One row of the ZIP table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipRecord {
    pub zip_code: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ZipRow {
    #[serde(rename = "Zip")]
    zip: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Latitude")]
    latitude: String,
    #[serde(rename = "Longitude")]
    longitude: String,
}

impl ZipRow {
    fn into_record(self, line: usize) -> Result<ZipRecord> {
        let context = format!("ZIP row {} ({})", line, self.zip);
        let latitude = parse_degrees("Latitude", &self.latitude, &context)?;
        let longitude = parse_degrees("Longitude", &self.longitude, &context)?;
        validate_lon_lat(longitude, latitude)?;

        Ok(ZipRecord {
            zip_code: self.zip,
            state: self.state,
            latitude,
            longitude,
        })
    }
}

/// A ZIP code and its centroid
#[derive(Debug, Clone, PartialEq)]
pub struct ZipPoint {
    pub zip_code: String,
    pub point: Point<f64>,
}

/// Point collection tagged with the reference system its coordinates are in
#[derive(Debug, Clone, PartialEq)]
pub struct ZipLocations {
    crs: Crs,
    points: Vec<ZipPoint>,
}

impl ZipLocations {
    /// Build a geographic collection from records, one point per record
    pub fn from_records(records: &[ZipRecord]) -> Self {
        let points = records
            .iter()
            .map(|record| ZipPoint {
                zip_code: record.zip_code.clone(),
                point: Point::new(record.longitude, record.latitude),
            })
            .collect();

        Self {
            crs: Crs::Geographic,
            points,
        }
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn points(&self) -> &[ZipPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZipPoint> {
        self.points.iter()
    }

    /// Reproject every point, keeping order and ZIP tags
    pub fn to_crs(&self, target: Crs) -> Result<Self> {
        let points = self
            .points
            .iter()
            .map(|zip| {
                Ok(ZipPoint {
                    zip_code: zip.zip_code.clone(),
                    point: transform_point(zip.point, self.crs, target)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            crs: target,
            points,
        })
    }
}

fn zip_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    Ok(csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?)
}

/// Load the ZIP records whose `State` field equals `state` exactly.
///
/// Rows for other states are skipped without validating their coordinates.
pub fn load_state_records(state: &str, path: &Path) -> Result<Vec<ZipRecord>> {
    let mut reader = zip_reader(path)?;

    let mut total = 0;
    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<ZipRow>().enumerate() {
        let row = row?;
        total += 1;
        if row.state != state {
            continue;
        }
        records.push(row.into_record(index + 2)?);
    }

    log_data_load_stats(
        &path.display().to_string(),
        total,
        records.len(),
        Some(state),
    );
    Ok(records)
}

/// ZIP centroids for one state, in geographic coordinates.
///
/// An unmatched state yields an empty collection.
pub fn get_state_zips(state: &str, path: &Path) -> Result<ZipLocations> {
    let records = load_state_records(state, path)?;
    if records.is_empty() {
        debug!(state = state, "No ZIP codes matched state");
    }
    Ok(ZipLocations::from_records(&records))
}

/// Number of ZIP rows per `State` value
pub fn count_by_state(path: &Path) -> Result<BTreeMap<String, usize>> {
    let mut reader = zip_reader(path)?;
    let mut counts = BTreeMap::new();
    for row in reader.deserialize::<ZipRow>() {
        *counts.entry(row?.state).or_insert(0) += 1;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(zip: &str, lat: f64, lon: f64) -> ZipRecord {
        ZipRecord {
            zip_code: zip.to_string(),
            state: "CA".to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_from_records_uses_lon_lat_order() {
        let zips = ZipLocations::from_records(&[record("94103", 37.77, -122.41)]);
        assert_eq!(zips.crs(), Crs::Geographic);
        assert_eq!(zips.points()[0].point.x(), -122.41);
        assert_eq!(zips.points()[0].point.y(), 37.77);
    }

    #[test]
    fn test_to_crs_keeps_order_and_tags() {
        let zips = ZipLocations::from_records(&[
            record("94103", 37.77, -122.41),
            record("90001", 33.97, -118.24),
        ]);
        let projected = zips.to_crs(Crs::WebMercator).unwrap();
        assert_eq!(projected.crs(), Crs::WebMercator);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected.points()[0].zip_code, "94103");
        assert_eq!(projected.points()[1].zip_code, "90001");
        assert!(projected.points()[0].point.x() < -13_000_000.0);
    }

    #[test]
    fn test_row_validation() {
        let row = ZipRow {
            zip: "00000".to_string(),
            state: "CA".to_string(),
            latitude: "95.0".to_string(),
            longitude: "-120.0".to_string(),
        };
        assert!(row.into_record(2).is_err());

        let row = ZipRow {
            zip: "00000".to_string(),
            state: "CA".to_string(),
            latitude: "north".to_string(),
            longitude: "-120.0".to_string(),
        };
        let err = row.into_record(7).unwrap_err();
        assert!(err.to_string().contains("ZIP row 7 (00000)"));
    }
}
