//! Risk dataset loading and validation
//!
//! A dataset is a CSV table with one row per risk-scored location. It is
//! parsed once into an immutable, ordered list of [`LocationRecord`]s.

pub mod cache;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, instrument};

use crate::models::{LocationRecord, RiskLevel};
use crate::{Result, SafeRouteError};

pub use cache::{Clock, DatasetCache, SystemClock};

/// Required fields with the column headers accepted for each, canonical name first
const REQUIRED_FIELDS: [(&str, &[&str]); 6] = [
    ("name", &["name", "nm_pol"]),
    ("area", &["area"]),
    ("latitude", &["latitude", "lat"]),
    ("longitude", &["longitude", "long", "lon"]),
    ("risk_score", &["risk_score"]),
    ("risk_level", &["risk_level"]),
];

/// Immutable snapshot of a loaded risk dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    source: String,
    records: Vec<LocationRecord>,
}

/// Column index of each required field in the header row
struct ColumnMap {
    name: usize,
    area: usize,
    latitude: usize,
    longitude: usize,
    risk_score: usize,
    risk_level: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut indices = [0usize; REQUIRED_FIELDS.len()];
        let mut missing = Vec::new();

        for (slot, (field, aliases)) in indices.iter_mut().zip(REQUIRED_FIELDS.iter()) {
            let position = aliases.iter().find_map(|alias| {
                headers
                    .iter()
                    .position(|header| header.trim().eq_ignore_ascii_case(alias))
            });
            match position {
                Some(index) => *slot = index,
                None => missing.push(*field),
            }
        }

        if !missing.is_empty() {
            return Err(SafeRouteError::missing_fields(missing));
        }

        let [name, area, latitude, longitude, risk_score, risk_level] = indices;
        Ok(Self {
            name,
            area,
            latitude,
            longitude,
            risk_score,
            risk_level,
        })
    }
}

impl Dataset {
    /// Load and validate a CSV risk dataset from a file
    #[instrument(level = "debug", skip_all, fields(source = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading risk dataset from: {:?}", path);

        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), path.display().to_string())
    }

    /// Parse and validate CSV content from any reader
    pub fn from_reader<R: Read>(reader: R, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = ColumnMap::from_headers(reader.headers()?)?;

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            // header occupies line 1
            let line = row.position().map_or(index as u64 + 2, |p| p.line());
            records.push(parse_row(&row, &columns, line)?);
        }

        info!("Loaded {} risk locations from {}", records.len(), source);
        Ok(Self { source, records })
    }

    /// Build a dataset from records already in memory
    #[must_use]
    pub fn from_records(source: impl Into<String>, records: Vec<LocationRecord>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }

    /// Identifier of the source this dataset was loaded from
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Records in source row order
    #[must_use]
    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocationRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a LocationRecord;
    type IntoIter = std::slice::Iter<'a, LocationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn cell<'a>(row: &'a StringRecord, index: usize, field: &str, line: u64) -> Result<&'a str> {
    match row.get(index).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => {
            debug!("Row on line {} has no value for {}", line, field);
            Err(SafeRouteError::DataValidation {
                message: format!("Missing value for required field '{field}' on line {line}"),
                missing_fields: vec![field.to_string()],
            })
        }
    }
}

fn number(row: &StringRecord, index: usize, field: &str, line: u64) -> Result<f64> {
    let raw = cell(row, index, field, line)?;
    raw.parse::<f64>()
        .map_err(|_| SafeRouteError::validation(format!("Invalid {field} '{raw}' on line {line}")))
}

fn parse_row(row: &StringRecord, columns: &ColumnMap, line: u64) -> Result<LocationRecord> {
    let latitude = number(row, columns.latitude, "latitude", line)?;
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(SafeRouteError::validation(format!(
            "Latitude {latitude} on line {line} is outside [-90, 90]"
        )));
    }

    let longitude = number(row, columns.longitude, "longitude", line)?;
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(SafeRouteError::validation(format!(
            "Longitude {longitude} on line {line} is outside [-180, 180]"
        )));
    }

    let risk_level = cell(row, columns.risk_level, "risk_level", line)?
        .parse::<RiskLevel>()
        .map_err(|e| SafeRouteError::validation(format!("{e} on line {line}")))?;

    Ok(LocationRecord {
        name: cell(row, columns.name, "name", line)?.to_string(),
        area: cell(row, columns.area, "area", line)?.to_string(),
        latitude,
        longitude,
        risk_score: number(row, columns.risk_score, "risk_score", line)?,
        risk_level,
    })
}
