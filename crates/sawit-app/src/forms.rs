// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::{FormKind, Variety};

pub const MIN_PLOT_ID: i64 = 1;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(value: &str) -> Result<Date> {
    Date::parse(value, DATE_FORMAT).with_context(|| format!("parse date {value:?}"))
}

pub fn format_date(value: Date) -> String {
    value.format(DATE_FORMAT).unwrap_or_else(|_| value.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlantingFormInput {
    pub plot_name: String,
    pub planted_on: Date,
    pub area_ha: f64,
    pub tree_count: i64,
    pub variety: Variety,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestFormInput {
    pub plot_id: i64,
    pub harvested_on: Date,
    pub yield_kg: i64,
    pub worker: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormPayload {
    Planting(PlantingFormInput),
    Harvest(HarvestFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Planting(_) => FormKind::Planting,
            Self::Harvest(_) => FormKind::Harvest,
        }
    }

    /// Dates default to today, numbers to their widget minimum.
    pub fn blank_for(kind: FormKind, today: Date) -> Self {
        match kind {
            FormKind::Planting => Self::Planting(PlantingFormInput {
                plot_name: String::new(),
                planted_on: today,
                area_ha: 0.0,
                tree_count: 0,
                variety: Variety::Tenera,
                location: String::new(),
            }),
            FormKind::Harvest => Self::Harvest(HarvestFormInput {
                plot_id: MIN_PLOT_ID,
                harvested_on: today,
                yield_kg: 0,
                worker: String::new(),
                note: String::new(),
            }),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Planting(planting) => planting.validate(),
            Self::Harvest(harvest) => harvest.validate(),
        }
    }

    /// Message shown after a save. Nothing is stored, so this only echoes
    /// what was entered.
    pub fn confirmation(&self) -> String {
        match self {
            Self::Planting(planting) => format!("planting data {} saved", planting.location),
            Self::Harvest(harvest) => {
                format!("harvest data for plot {} saved", harvest.plot_id)
            }
        }
    }
}

impl PlantingFormInput {
    pub fn validate(&self) -> Result<()> {
        if !self.area_ha.is_finite() {
            bail!("area must be a number of hectares");
        }
        if self.area_ha < 0.0 {
            bail!("area cannot be negative");
        }
        if self.tree_count < 0 {
            bail!("tree count cannot be negative");
        }
        Ok(())
    }
}

impl HarvestFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.plot_id < MIN_PLOT_ID {
            bail!("plot id must be at least {MIN_PLOT_ID}");
        }
        if self.yield_kg < 0 {
            bail!("harvest yield cannot be negative");
        }
        Ok(())
    }
}
