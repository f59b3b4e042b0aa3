use anyhow::Context;
use std::path::PathBuf;

use statemap::boundaries::load_state_polygons;
use statemap::zips::count_by_state;
use statemap::{framing_for, BoundingBoxTable, Config, PaddingRule};

fn main() -> anyhow::Result<()> {
    // Optional JSON config as the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load_from_file(&PathBuf::from(&path))
            .with_context(|| format!("reading config {}", path))?,
        None => Config::default(),
    };

    println!("=== BOUNDING BOXES ({}) ===", config.inputs.bbox_csv.display());
    let table = BoundingBoxTable::load(&config.inputs.bbox_csv)
        .with_context(|| format!("loading {}", config.inputs.bbox_csv.display()))?;
    for state in table.states() {
        let rule = match framing_for(state).padding {
            PaddingRule::Scaled => "scaled",
            PaddingRule::Fixed(_) => "fixed override",
        };
        match table.viewport_for(state) {
            Ok(viewport) => println!("  {:<28} {:<15} {:?}", state, rule, viewport.as_array()),
            Err(e) => println!("  {:<28} {:<15} error: {}", state, rule, e),
        }
    }

    println!(
        "\n=== BOUNDARIES ({}) ===",
        config.inputs.states_shapefile.display()
    );
    let polygons = load_state_polygons(&config.inputs.states_shapefile)
        .with_context(|| format!("loading {}", config.inputs.states_shapefile.display()))?;
    for polygon in &polygons {
        let needs_row = framing_for(&polygon.state_name).padding.needs_table_row();
        let bbox_row = if !needs_row || table.contains(&polygon.state_name) {
            ""
        } else {
            "  (no bounding-box row)"
        };
        println!(
            "  {:<28} {} part(s){}",
            polygon.state_name,
            polygon.boundary.0.len(),
            bbox_row
        );
    }

    println!("\n=== ZIP CODES ({}) ===", config.inputs.zip_csv.display());
    let counts = count_by_state(&config.inputs.zip_csv)
        .with_context(|| format!("loading {}", config.inputs.zip_csv.display()))?;
    for (state, count) in &counts {
        println!("  {:<28} {}", state, count);
    }

    Ok(())
}
