// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use sawit_app::{HarvestId, HarvestRecord, PlantingRecord, PlotId, RecordTables, Variety};
use time::Date;
use time::macros::date;

const PLANTINGS: [(i64, Date, f64, u32, Variety, &str); 3] = [
    (1, date!(2023 - 03 - 10), 10.0, 1_500, Variety::Tenera, "Blok A"),
    (2, date!(2024 - 01 - 15), 8.0, 1_200, Variety::Dxp, "Blok B"),
    (3, date!(2024 - 06 - 01), 12.0, 1_800, Variety::Tenera, "Blok C"),
];

const HARVESTS: [(i64, Date, u64, &str, &str); 5] = [
    (1, date!(2024 - 04 - 20), 12_000, "Budi", "Cuaca baik"),
    (1, date!(2024 - 07 - 18), 15_000, "Andi", "Tanah lembab"),
    (2, date!(2024 - 09 - 05), 9_000, "Sari", "Curah hujan tinggi"),
    (3, date!(2024 - 08 - 12), 11_000, "Tono", "Normal"),
    (3, date!(2024 - 10 - 15), 12_500, "Dewi", "Produktif"),
];

/// The three reference plots and their five harvests.
pub fn fixed_tables() -> RecordTables {
    RecordTables {
        plantings: fixed_plantings(),
        harvests: fixed_harvests(),
    }
}

pub fn fixed_plantings() -> Vec<PlantingRecord> {
    PLANTINGS
        .iter()
        .map(
            |&(id, planted_on, area_ha, tree_count, variety, location)| PlantingRecord {
                id: PlotId::new(id),
                plot_name: format!("Plot {id}"),
                planted_on,
                area_ha,
                tree_count,
                variety,
                location: location.to_owned(),
            },
        )
        .collect()
}

pub fn fixed_harvests() -> Vec<HarvestRecord> {
    HARVESTS
        .iter()
        .enumerate()
        .map(
            |(index, &(plot_id, harvested_on, yield_kg, worker, note))| HarvestRecord {
                id: HarvestId::new(index as i64 + 1),
                plot_id: PlotId::new(plot_id),
                harvested_on,
                yield_kg,
                worker: worker.to_owned(),
                note: note.to_owned(),
            },
        )
        .collect()
}
