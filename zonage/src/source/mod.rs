//! Lecture des fichiers sources (zones GeoJSON, table des communes)

pub mod communes;
pub mod geojson;

pub use communes::{read_communes, CommuneTable};
pub use geojson::read_zone_file;
