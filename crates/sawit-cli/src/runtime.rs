// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use sawit_app::{FormPayload, RecordTables};
use sawit_data::RecordSource;
use time::Date;

/// Adapts a [`RecordSource`] to the dashboard. `today` is fixed for the
/// session so ages do not shift mid-render.
pub struct SourceRuntime<S> {
    source: S,
    today: Date,
}

impl<S: RecordSource> SourceRuntime<S> {
    pub fn new(source: S, today: Date) -> Self {
        Self { source, today }
    }
}

impl<S: RecordSource> sawit_tui::AppRuntime for SourceRuntime<S> {
    fn load_tables(&mut self) -> Result<RecordTables> {
        self.source.load_tables()
    }

    fn today(&self) -> Date {
        self.today
    }

    fn submit_form(&mut self, payload: &FormPayload) -> Result<String> {
        let receipt = self.source.append(payload)?;
        tracing::debug!(stored = receipt.stored, "append acknowledged");
        Ok(receipt.message)
    }
}

#[cfg(test)]
mod tests {
    use super::SourceRuntime;
    use anyhow::{Result, bail};
    use sawit_app::{FormKind, FormPayload, HarvestRecord, PlantingRecord, summarize};
    use sawit_data::{AppendReceipt, DataOrigin, MockSource, RecordSource};
    use sawit_tui::AppRuntime;
    use time::macros::date;

    struct BrokenSource;

    impl RecordSource for BrokenSource {
        fn planting_records(&mut self) -> Result<Vec<PlantingRecord>> {
            bail!("planting table offline")
        }

        fn harvest_records(&mut self) -> Result<Vec<HarvestRecord>> {
            Ok(Vec::new())
        }

        fn append(&mut self, _payload: &FormPayload) -> Result<AppendReceipt> {
            bail!("read-only source")
        }
    }

    #[test]
    fn loads_tables_from_mock_source() -> Result<()> {
        let today = date!(2026 - 10 - 16);
        let mut runtime = SourceRuntime::new(MockSource::new(DataOrigin::Fixed, today), today);
        let tables = runtime.load_tables()?;
        let summary = summarize(&tables.plantings, &tables.harvests);
        assert_eq!(summary.total_yield_kg, 59_500);
        assert_eq!(runtime.today(), today);
        Ok(())
    }

    #[test]
    fn submit_returns_confirmation_without_growing_tables() -> Result<()> {
        let today = date!(2026 - 10 - 16);
        let mut runtime = SourceRuntime::new(MockSource::new(DataOrigin::Fixed, today), today);
        let message =
            runtime.submit_form(&FormPayload::blank_for(FormKind::Harvest, today))?;
        assert_eq!(message, "harvest data for plot 1 saved");
        assert_eq!(runtime.load_tables()?.harvests.len(), 5);
        Ok(())
    }

    #[test]
    fn source_errors_carry_context() {
        let mut runtime = SourceRuntime::new(BrokenSource, date!(2026 - 10 - 16));
        let error = runtime.load_tables().expect_err("broken source fails");
        let message = format!("{error:#}");
        assert!(message.contains("fetch planting records"), "{message}");
        assert!(message.contains("planting table offline"), "{message}");

        let payload = FormPayload::blank_for(FormKind::Planting, date!(2026 - 10 - 16));
        assert!(runtime.submit_form(&payload).is_err());
    }
}
