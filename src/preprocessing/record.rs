//! Typed sensor/feed observations

use super::{FEATURE_COLUMNS, TARGET_COLUMN};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One sensor and feed observation.
///
/// `weight` is only present for training examples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub internal_temp: f64,
    pub internal_humidity: f64,
    pub air_temp: f64,
    pub wind_speed: f64,
    pub feed_intake: f64,
    pub weight: Option<f64>,
}

impl RawRecord {
    /// Create an observation without a weight, as used for prediction
    pub fn new(
        internal_temp: f64,
        internal_humidity: f64,
        air_temp: f64,
        wind_speed: f64,
        feed_intake: f64,
    ) -> Self {
        Self {
            internal_temp,
            internal_humidity,
            air_temp,
            wind_speed,
            feed_intake,
            weight: None,
        }
    }

    /// Attach a measured weight, turning the record into a training example
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Feature values in `FEATURE_COLUMNS` order
    pub fn features(&self) -> [f64; 5] {
        [
            self.internal_temp,
            self.internal_humidity,
            self.air_temp,
            self.wind_speed,
            self.feed_intake,
        ]
    }
}

/// Build a raw table from records.
///
/// The `Weight` column is emitted when any record carries a weight;
/// a mixed set produces a null-bearing column whose null rows training drops.
pub fn records_to_frame(records: &[RawRecord]) -> Result<DataFrame> {
    let mut columns: Vec<Column> = FEATURE_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<f64> = records.iter().map(|r| r.features()[i]).collect();
            Column::new((*name).into(), values)
        })
        .collect();

    if records.iter().any(|r| r.weight.is_some()) {
        let weights: Vec<Option<f64>> = records.iter().map(|r| r.weight).collect();
        columns.push(Column::new(TARGET_COLUMN.into(), weights));
    }

    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_to_frame_without_weight() {
        let records = vec![
            RawRecord::new(30.0, 60.0, 28.0, 2.0, 120.0),
            RawRecord::new(31.0, 62.0, 29.0, 1.5, 125.0),
        ];
        let df = records_to_frame(&records).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 5);
        assert!(df.column(TARGET_COLUMN).is_err());
    }

    #[test]
    fn test_records_to_frame_with_weight() {
        let records = vec![
            RawRecord::new(30.0, 60.0, 28.0, 2.0, 120.0).with_weight(1500.0),
            RawRecord::new(31.0, 62.0, 29.0, 1.5, 125.0),
        ];
        let df = records_to_frame(&records).unwrap();
        assert_eq!(df.width(), 6);
        assert_eq!(df.column(TARGET_COLUMN).unwrap().null_count(), 1);
    }
}
