pub mod loader;
pub mod synthetic;

pub use loader::{load_csv, load_json, parse_timestamp};
pub use synthetic::{generate_pattern_candles, generate_seeded_candles, generate_synthetic_candles};

use std::path::Path;

use common::{Candle, EngineError, Result};

/// Load candles from file, detecting format from extension
pub fn load_file(path: &Path) -> Result<Vec<Candle>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        _ => Err(EngineError::DataLoadError(format!(
            "Unsupported file format: {:?}",
            ext
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("candles.parquet")).unwrap_err();
        assert!(matches!(err, EngineError::DataLoadError(msg) if msg.contains("parquet")));
    }
}
