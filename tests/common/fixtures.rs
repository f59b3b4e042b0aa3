//! Reference data fixtures.
//!
//! Writes small versions of the three input files (ZIP table, bounding-box
//! table, boundary shapefile) into a temporary directory.

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, PolygonRing};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Header of the public ZIP code table
pub const ZIP_HEADER: &str =
    "Zip;City;State;Latitude;Longitude;Timezone;Daylight savings time flag;geopoint";

/// A ZIP row in the public table layout
pub fn zip_row(zip: &str, city: &str, state: &str, lat: &str, lon: &str) -> String {
    format!("{};{};{};{};{};-8;1;{},{}", zip, city, state, lat, lon, lat, lon)
}

pub fn write_zip_csv(path: &Path, rows: &[String]) -> std::io::Result<()> {
    let mut content = String::from(ZIP_HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    fs::write(path, content)
}

/// `NAME,xmin,xmax,ymin,ymax`
pub fn write_bbox_csv(path: &Path, rows: &[(&str, f64, f64, f64, f64)]) -> std::io::Result<()> {
    let mut content = String::from("NAME,xmin,xmax,ymin,ymax\n");
    for (name, xmin, xmax, ymin, ymax) in rows {
        content.push_str(&format!("{},{},{},{},{}\n", name, xmin, xmax, ymin, ymax));
    }
    fs::write(path, content)
}

/// Closed clockwise ring for a lon/lat rectangle (clockwise marks an outer ring)
pub fn rectangle_ring(lng_min: f64, lng_max: f64, lat_min: f64, lat_max: f64) -> Vec<Point> {
    vec![
        Point::new(lng_min, lat_min),
        Point::new(lng_min, lat_max),
        Point::new(lng_max, lat_max),
        Point::new(lng_max, lat_min),
        Point::new(lng_min, lat_min),
    ]
}

/// One feature per entry; each entry holds the outer rings of that feature
pub fn write_states_shapefile(
    path: &Path,
    states: &[(&str, Vec<Vec<Point>>)],
) -> Result<(), shapefile::Error> {
    let table = TableWriterBuilder::new()
        .add_character_field(FieldName::try_from("NAME").expect("valid field name"), 64);
    let mut writer = shapefile::Writer::from_path(path, table)?;

    for (name, rings) in states {
        let polygon = shapefile::Polygon::with_rings(
            rings
                .iter()
                .cloned()
                .map(PolygonRing::Outer)
                .collect(),
        );
        let mut record = Record::default();
        record.insert(
            "NAME".to_string(),
            FieldValue::Character(Some(name.to_string())),
        );
        writer.write_shape_and_record(&polygon, &record)?;
    }

    Ok(())
}

/// The three reference files plus an output location
pub struct ReferenceData {
    pub dir: TempDir,
    pub zip_csv: PathBuf,
    pub bbox_csv: PathBuf,
    pub states_shapefile: PathBuf,
    pub output: PathBuf,
}

/// California, Alaska and Hawaii as plain rectangles, with ZIP codes in
/// California, Nevada and Hawaii
pub fn reference_data() -> ReferenceData {
    let dir = tempfile::tempdir().expect("create temp dir");
    let zip_csv = dir.path().join("zips.csv");
    let bbox_csv = dir.path().join("bboxes.csv");
    let states_shapefile = dir.path().join("states.shp");
    let output = dir.path().join("data").join("plot1.png");

    write_zip_csv(
        &zip_csv,
        &[
            zip_row("94103", "San Francisco", "California", "37.7726", "-122.4099"),
            zip_row("89501", "Reno", "Nevada", "39.5261", "-119.8126"),
            zip_row("90012", "Los Angeles", "California", "34.0614", "-118.2385"),
            zip_row("96813", "Honolulu", "Hawaii", "21.3129", "-157.8580"),
            zip_row("95814", "Sacramento", "California", "38.5804", "-121.4922"),
        ],
    )
    .expect("write zip csv");

    write_bbox_csv(
        &bbox_csv,
        &[
            ("California", -124.4, -114.1, 32.5, 42.0),
            ("Nevada", -120.0, -114.0, 35.0, 42.0),
            // Spans the antimeridian; must never be used
            ("Alaska", -179.2, 179.8, 51.2, 71.4),
        ],
    )
    .expect("write bbox csv");

    write_states_shapefile(
        &states_shapefile,
        &[
            ("California", vec![rectangle_ring(-124.4, -114.1, 32.5, 42.0)]),
            (
                "Alaska",
                vec![
                    rectangle_ring(-168.0, -130.0, 54.5, 71.0),
                    rectangle_ring(-178.0, -170.0, 51.5, 53.0),
                ],
            ),
            ("Hawaii", vec![rectangle_ring(-160.3, -154.8, 18.9, 22.3)]),
        ],
    )
    .expect("write shapefile");

    ReferenceData {
        dir,
        zip_csv,
        bbox_csv,
        states_shapefile,
        output,
    }
}
