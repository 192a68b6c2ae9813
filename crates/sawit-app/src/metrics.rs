// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Derived figures for the dashboard and monitoring views. Everything here is
//! a pure function of the record tables and the current date.

use std::collections::{BTreeMap, BTreeSet};

use time::Date;
use time::macros::format_description;

use crate::{
    DashboardSummary, GrowthStatus, HarvestRecord, MonthlyYield, PlantingRecord, PlotId,
    PlotProgress, PlotYield,
};

pub const DAYS_PER_MONTH: i64 = 30;
pub const MATURITY_MONTHS: f64 = 36.0;
pub const GROWING_THRESHOLD_PCT: f64 = 30.0;
pub const READY_THRESHOLD_PCT: f64 = 70.0;

/// Whole days since planting divided by 30, truncated toward zero. Future
/// planting dates yield a negative age.
pub fn age_in_months(planted_on: Date, today: Date) -> i64 {
    (today - planted_on).whole_days() / DAYS_PER_MONTH
}

pub fn progress_percent(age_months: i64) -> f64 {
    (age_months as f64 / MATURITY_MONTHS * 100.0).clamp(0.0, 100.0)
}

impl GrowthStatus {
    /// Both thresholds are inclusive on their lower bound: 30 is growing and
    /// 70 is ready to harvest.
    pub fn from_progress(progress_pct: f64) -> Self {
        if progress_pct >= READY_THRESHOLD_PCT {
            Self::ReadyToHarvest
        } else if progress_pct >= GROWING_THRESHOLD_PCT {
            Self::Growing
        } else {
            Self::NewlyPlanted
        }
    }
}

pub fn plot_progress(record: &PlantingRecord, today: Date) -> PlotProgress {
    let age_months = age_in_months(record.planted_on, today);
    let progress_pct = progress_percent(age_months);
    PlotProgress {
        plot_id: record.id,
        plot_name: record.plot_name.clone(),
        location: record.location.clone(),
        age_months,
        progress_pct,
        status: GrowthStatus::from_progress(progress_pct),
    }
}

pub fn summarize(plantings: &[PlantingRecord], harvests: &[HarvestRecord]) -> DashboardSummary {
    DashboardSummary {
        plot_count: plantings.len(),
        harvest_count: harvests.len(),
        total_area_ha: plantings.iter().map(|record| record.area_ha).sum(),
        total_trees: plantings
            .iter()
            .map(|record| u64::from(record.tree_count))
            .sum(),
        total_yield_kg: total_yield(harvests),
        mean_yield_kg: mean_yield(harvests),
    }
}

pub fn total_yield(harvests: &[HarvestRecord]) -> u64 {
    harvests.iter().map(|record| record.yield_kg).sum()
}

/// `None` when there are no harvest rows; the mean of nothing is not zero.
pub fn mean_yield(harvests: &[HarvestRecord]) -> Option<f64> {
    if harvests.is_empty() {
        return None;
    }
    Some(total_yield(harvests) as f64 / harvests.len() as f64)
}

pub fn month_key(date: Date) -> String {
    date.format(&format_description!("[year]-[month]")).unwrap_or_default()
}

pub fn monthly_yield(harvests: &[HarvestRecord]) -> Vec<MonthlyYield> {
    let mut by_month: BTreeMap<String, u64> = BTreeMap::new();
    for record in harvests {
        *by_month.entry(month_key(record.harvested_on)).or_default() += record.yield_kg;
    }
    by_month
        .into_iter()
        .map(|(month, yield_kg)| MonthlyYield { month, yield_kg })
        .collect()
}

/// One row per plot in `plantings` order. Plots without harvests report zero;
/// harvests that reference an unknown plot are left out.
pub fn yield_by_plot(plantings: &[PlantingRecord], harvests: &[HarvestRecord]) -> Vec<PlotYield> {
    let mut sums: BTreeMap<PlotId, u64> = BTreeMap::new();
    for record in harvests {
        *sums.entry(record.plot_id).or_default() += record.yield_kg;
    }
    plantings
        .iter()
        .map(|plot| PlotYield {
            plot_id: plot.id,
            plot_name: plot.plot_name.clone(),
            yield_kg: sums.get(&plot.id).copied().unwrap_or(0),
        })
        .collect()
}

/// An empty selection means no filter.
pub fn filter_by_location(
    plantings: &[PlantingRecord],
    selected: &BTreeSet<String>,
) -> Vec<PlantingRecord> {
    plantings
        .iter()
        .filter(|record| selected.is_empty() || selected.contains(&record.location))
        .cloned()
        .collect()
}

pub fn distinct_locations(plantings: &[PlantingRecord]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut locations = Vec::new();
    for record in plantings {
        if seen.insert(record.location.as_str()) {
            locations.push(record.location.clone());
        }
    }
    locations
}
