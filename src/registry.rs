use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

pub const STATUS_ACTIVE: &str = "ACTIVE";

/// A registry entry for a reported vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VehicleRecord {
    pub id: i64,
    pub license_plate: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date_reported: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    STATUS_ACTIVE.to_string()
}

impl VehicleRecord {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_ACTIVE)
    }

    /// Human readable `year make model (color)` line.
    pub fn summary(&self) -> String {
        let na = "N/A";

        format!(
            "{} {} {} ({})",
            self.year.as_deref().unwrap_or(na),
            self.make.as_deref().unwrap_or(na),
            self.model.as_deref().unwrap_or(na),
            self.color.as_deref().unwrap_or(na),
        )
    }
}

/// Canonical form of a plate string used for lookups and deduplication.
pub fn normalize_plate(text: &str) -> String {
    text.trim().to_uppercase()
}

/// External vehicle registry.
///
/// `Ok(None)` means the plate is not registered; `Err` is a lookup failure
/// that may succeed when retried later.
pub trait Registry {
    fn lookup(&self, normalized_plate: &str) -> Result<Option<VehicleRecord>>;
}

impl<R: Registry + ?Sized> Registry for &R {
    fn lookup(&self, normalized_plate: &str) -> Result<Option<VehicleRecord>> {
        (**self).lookup(normalized_plate)
    }
}

impl<R: Registry + ?Sized> Registry for Box<R> {
    fn lookup(&self, normalized_plate: &str) -> Result<Option<VehicleRecord>> {
        (**self).lookup(normalized_plate)
    }
}

/// Registry held in memory; only `ACTIVE` records match.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    records: HashMap<String, VehicleRecord>,
}

impl MemoryRegistry {
    pub fn new<I: IntoIterator<Item = VehicleRecord>>(records: I) -> Self {
        let mut registry = Self::default();
        for record in records {
            registry.insert(record);
        }

        registry
    }

    /// Loads a JSON array of vehicle records.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let records: Vec<VehicleRecord> = serde_json::from_reader(std::io::BufReader::new(file))?;

        Ok(Self::new(records))
    }

    /// Loads a CSV export with a header row and the columns `license_plate,
    /// make, model, year, color, description, date_reported`. Shorter rows
    /// are skipped; ids follow file order starting at 1.
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut rows = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (line, row) in rows.records().enumerate() {
            let row = row?;
            if row.len() < 7 || row[0].is_empty() {
                log::warn!("registry csv: skipping row {} ({} columns)", line + 2, row.len());
                continue;
            }

            let field = |i: usize| row.get(i).filter(|v| !v.is_empty()).map(str::to_string);
            let id = records.len() as i64 + 1;

            records.push(VehicleRecord {
                id,
                license_plate: row[0].to_string(),
                make: field(1),
                model: field(2),
                year: field(3),
                color: field(4),
                description: field(5),
                date_reported: field(6),
                status: default_status(),
            });
        }

        Ok(Self::new(records))
    }

    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(std::io::BufReader::new(file))
    }

    /// Inserts or replaces the record for its plate.
    pub fn insert(&mut self, record: VehicleRecord) -> Option<VehicleRecord> {
        self.records
            .insert(normalize_plate(&record.license_plate), record)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Registry for MemoryRegistry {
    fn lookup(&self, normalized_plate: &str) -> Result<Option<VehicleRecord>> {
        Ok(self
            .records
            .get(normalized_plate)
            .filter(|r| r.is_active())
            .cloned())
    }
}
