// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::Date;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variety {
    Tenera,
    Dxp,
    Other,
}

impl Variety {
    pub const ALL: [Self; 3] = [Self::Tenera, Self::Dxp, Self::Other];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tenera => "Tenera",
            Self::Dxp => "DxP",
            Self::Other => "Lainnya",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Tenera" => Some(Self::Tenera),
            "DxP" => Some(Self::Dxp),
            "Lainnya" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Utara,
    Selatan,
    Timur,
    Barat,
}

impl Region {
    pub const ALL: [Self; 4] = [Self::Utara, Self::Selatan, Self::Timur, Self::Barat];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utara => "Utara",
            Self::Selatan => "Selatan",
            Self::Timur => "Timur",
            Self::Barat => "Barat",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Utara" => Some(Self::Utara),
            "Selatan" => Some(Self::Selatan),
            "Timur" => Some(Self::Timur),
            "Barat" => Some(Self::Barat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrowthStatus {
    NewlyPlanted,
    Growing,
    ReadyToHarvest,
}

impl GrowthStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NewlyPlanted => "newly planted",
            Self::Growing => "growing",
            Self::ReadyToHarvest => "ready to harvest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    Dashboard,
    Input,
    Monitoring,
}

impl ViewKind {
    pub const ALL: [Self; 3] = [Self::Dashboard, Self::Input, Self::Monitoring];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Input => "Input Data",
            Self::Monitoring => "Monitoring",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Input => "input",
            Self::Monitoring => "monitoring",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dashboard" => Some(Self::Dashboard),
            "input" => Some(Self::Input),
            "monitoring" => Some(Self::Monitoring),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormKind {
    Planting,
    Harvest,
}

impl FormKind {
    pub const ALL: [Self; 2] = [Self::Planting, Self::Harvest];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Planting => "planting data",
            Self::Harvest => "harvest data",
        }
    }

    pub const fn other(self) -> Self {
        match self {
            Self::Planting => Self::Harvest,
            Self::Harvest => Self::Planting,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Form(FormKind),
    Filter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantingRecord {
    pub id: PlotId,
    pub plot_name: String,
    pub planted_on: Date,
    pub area_ha: f64,
    pub tree_count: u32,
    pub variety: Variety,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRecord {
    pub id: HarvestId,
    pub plot_id: PlotId,
    pub harvested_on: Date,
    pub yield_kg: u64,
    pub worker: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordTables {
    pub plantings: Vec<PlantingRecord>,
    pub harvests: Vec<HarvestRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotProgress {
    pub plot_id: PlotId,
    pub plot_name: String,
    pub location: String,
    pub age_months: i64,
    pub progress_pct: f64,
    pub status: GrowthStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub plot_count: usize,
    pub harvest_count: usize,
    pub total_area_ha: f64,
    pub total_trees: u64,
    pub total_yield_kg: u64,
    pub mean_yield_kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyYield {
    pub month: String,
    pub yield_kg: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotYield {
    pub plot_id: PlotId,
    pub plot_name: String,
    pub yield_kg: u64,
}
