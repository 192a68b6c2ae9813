// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use sawit_app::{
    HarvestId, HarvestRecord, PlantingRecord, PlotId, RecordTables, Region, Variety,
};
use time::{Date, Duration};

pub const HARVESTS_PER_PLOT: usize = 3;

const WORKERS: [&str; 10] = [
    "Budi", "Andi", "Sari", "Tono", "Dewi", "Agus", "Rina", "Joko", "Wati", "Yusuf",
];

const HARVEST_NOTES: [&str; 8] = [
    "Cuaca baik",
    "Tanah lembab",
    "Curah hujan tinggi",
    "Normal",
    "Produktif",
    "Buah matang merata",
    "Akses jalan licin",
    "Panen susulan",
];

const MIN_AGE_DAYS: i64 = 30;
const MAX_AGE_DAYS: i64 = 60 * 30;
const HARVEST_WINDOW_DAYS: i64 = 364;
const TREES_PER_HA: (i64, i64) = (136, 143);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for plot and harvest rows. Dates are drawn relative to
/// `reference`, so the same seed and reference always give the same tables.
#[derive(Debug, Clone)]
pub struct PlotFaker {
    rng: DeterministicRng,
    reference: Date,
}

impl PlotFaker {
    pub fn new(seed: u64, reference: Date) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            reference,
        }
    }

    pub fn tables(&mut self, plots: usize) -> RecordTables {
        let plantings = (0..plots)
            .map(|index| self.planting(index as i64 + 1))
            .collect::<Vec<_>>();
        let harvests = (0..plots * HARVESTS_PER_PLOT)
            .map(|index| self.harvest(index as i64 + 1, plots as i64))
            .collect();
        RecordTables {
            plantings,
            harvests,
        }
    }

    pub fn planting(&mut self, id: i64) -> PlantingRecord {
        let age_days = self.int_range_i64(MIN_AGE_DAYS, MAX_AGE_DAYS);
        let area_ha = self.int_range_i64(50, 250) as f64 / 10.0;
        let density = self.int_range_i64(TREES_PER_HA.0, TREES_PER_HA.1) as f64;
        let variety = Variety::ALL[self.rng.int_n(Variety::ALL.len())];
        let region = Region::ALL[self.rng.int_n(Region::ALL.len())];

        PlantingRecord {
            id: PlotId::new(id),
            plot_name: block_name(id),
            planted_on: self.days_before_reference(age_days),
            area_ha,
            tree_count: (area_ha * density).round() as u32,
            variety,
            location: region.as_str().to_owned(),
        }
    }

    /// `plot_id` is drawn uniformly from `1..=plots`, so a plot can end up
    /// with no harvests at all.
    pub fn harvest(&mut self, id: i64, plots: i64) -> HarvestRecord {
        let plot_id = self.int_range_i64(1, plots.max(1));
        let days_ago = self.int_range_i64(0, HARVEST_WINDOW_DAYS);
        HarvestRecord {
            id: HarvestId::new(id),
            plot_id: PlotId::new(plot_id),
            harvested_on: self.days_before_reference(days_ago),
            yield_kg: self.int_range_i64(5_000, 15_000) as u64,
            worker: self.pick(&WORKERS).to_owned(),
            note: self.pick(&HARVEST_NOTES).to_owned(),
        }
    }

    fn days_before_reference(&self, days: i64) -> Date {
        self.reference
            .checked_sub(Duration::days(days))
            .unwrap_or(self.reference)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn block_name(id: i64) -> String {
    match u8::try_from(id - 1) {
        Ok(offset) if offset < 26 => format!("Blok {}", char::from(b'A' + offset)),
        _ => format!("Blok {id}"),
    }
}
