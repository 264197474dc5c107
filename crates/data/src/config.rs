//! Data-source configuration.
//!
//! The dashboard reads a preprocessed data tree: one directory per station
//! holding the four per-station CSV tables plus a `travel_times/` directory,
//! and two shared files (`route_time_metrics.csv`, `borders.json`) at the
//! root. The tree location comes from [`DATA_DIR_ENV`], falling back to
//! [`DEFAULT_DATA_DIR`] relative to the working directory.

use std::path::PathBuf;

use bevy::prelude::*;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "LASTMILE_DATA_DIR";

/// Default data directory when [`DATA_DIR_ENV`] is unset.
pub const DEFAULT_DATA_DIR: &str = "processed_data";

/// The depot stations shipped with the preprocessed dataset.
pub const STATION_CODES: [&str; 17] = [
    "DAU1", "DBO1", "DBO2", "DBO3", "DCH1", "DCH2", "DCH3", "DCH4", "DLA3", "DLA4", "DLA5",
    "DLA7", "DLA8", "DLA9", "DSE2", "DSE4", "DSE5",
];

/// Fallback centroid for a station with zero stops (continental interior),
/// so the nation map never has to place a circle at `NaN`.
pub const DEFAULT_STATION_LAT: f64 = 39.0;
pub const DEFAULT_STATION_LNG: f64 = -95.0;

/// Where and what to load. Inserted by the binary (usually via
/// [`DataConfig::from_env`]) before [`DataPlugin`](crate::DataPlugin) runs.
#[derive(Resource, Clone, Debug)]
pub struct DataConfig {
    /// Root of the preprocessed data tree.
    pub data_dir: PathBuf,
    /// Station directories to load.
    pub station_codes: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            station_codes: STATION_CODES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl DataConfig {
    /// Build a config from the environment, using defaults where unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_lists_all_stations() {
        let config = DataConfig::default();
        assert_eq!(config.station_codes.len(), STATION_CODES.len());
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }
}
