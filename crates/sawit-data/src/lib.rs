// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod faker;
pub mod fixed;

use anyhow::{Context, Result};
use sawit_app::{FormPayload, HarvestRecord, PlantingRecord, RecordTables};
use time::Date;

pub use faker::PlotFaker;
pub use fixed::fixed_tables;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_RANDOM_PLOTS: usize = 8;

/// Where generated tables come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Fixed,
    Random { seed: u64, plots: usize },
}

impl DataOrigin {
    pub fn describe(self) -> String {
        match self {
            Self::Fixed => "fixed".to_owned(),
            Self::Random { seed, plots } => format!("random (seed {seed}, {plots} plots)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReceipt {
    pub message: String,
    pub stored: bool,
}

/// Data-access seam for the dashboard. Implementations decide whether
/// appends persist; callers must not assume they do.
pub trait RecordSource {
    fn planting_records(&mut self) -> Result<Vec<PlantingRecord>>;
    fn harvest_records(&mut self) -> Result<Vec<HarvestRecord>>;
    fn append(&mut self, payload: &FormPayload) -> Result<AppendReceipt>;

    fn load_tables(&mut self) -> Result<RecordTables> {
        let plantings = self
            .planting_records()
            .context("fetch planting records")?;
        let harvests = self.harvest_records().context("fetch harvest records")?;
        Ok(RecordTables {
            plantings,
            harvests,
        })
    }
}

pub fn generate_tables(origin: DataOrigin, reference: Date) -> RecordTables {
    match origin {
        DataOrigin::Fixed => fixed_tables(),
        DataOrigin::Random { seed, plots } => PlotFaker::new(seed, reference).tables(plots),
    }
}

/// Regenerates both tables on every fetch and acknowledges appends without
/// keeping them.
#[derive(Debug, Clone)]
pub struct MockSource {
    origin: DataOrigin,
    reference: Date,
}

impl MockSource {
    pub fn new(origin: DataOrigin, reference: Date) -> Self {
        Self { origin, reference }
    }

    fn generate(&self) -> RecordTables {
        let tables = generate_tables(self.origin, self.reference);
        tracing::debug!(
            origin = %self.origin.describe(),
            plantings = tables.plantings.len(),
            harvests = tables.harvests.len(),
            "generated record tables"
        );
        tables
    }
}

impl RecordSource for MockSource {
    fn planting_records(&mut self) -> Result<Vec<PlantingRecord>> {
        Ok(self.generate().plantings)
    }

    fn harvest_records(&mut self) -> Result<Vec<HarvestRecord>> {
        Ok(self.generate().harvests)
    }

    fn append(&mut self, payload: &FormPayload) -> Result<AppendReceipt> {
        payload
            .validate()
            .with_context(|| format!("invalid {}", payload.kind().label()))?;
        tracing::info!(kind = payload.kind().label(), "form acknowledged, not stored");
        Ok(AppendReceipt {
            message: payload.confirmation(),
            stored: false,
        })
    }

    fn load_tables(&mut self) -> Result<RecordTables> {
        Ok(self.generate())
    }
}
