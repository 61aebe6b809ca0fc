//! Modules d'export (table CSV, GeoJSON des zones et des marqueurs)

pub mod csv;
pub mod geojson;

pub use self::csv::{export_classification, CsvOptions};
pub use self::geojson::{export_markers, export_zones};
