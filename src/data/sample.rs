//! Synthetic call-center tables for demos and manual testing.
//!
//! The daily table has a weekday profile, a mild annual cycle, multiplicative
//! noise and occasional spikes (so the outlier filter has something to do).
//! The intrahour table covers the last few weeks of the daily range with 30
//! minute slots inside an operating window; each day's slots add up to that
//! day's volume.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::DayOfWeek;
use crate::error::PipelineError;
use crate::io::ingest::{COL_AHT, COL_DATE, COL_DAY, COL_INTERVAL, COL_INTERVAL_VOLUME, COL_VOLUME_ALIASES, RawTable};

/// Relative volume per weekday, Monday first.
const WEEKDAY_VOLUME: [f64; 7] = [1.25, 1.10, 1.05, 1.00, 0.95, 0.55, 0.25];

/// Relative handling time per weekday, Monday first.
const WEEKDAY_AHT: [f64; 7] = [1.05, 1.00, 1.00, 0.98, 0.97, 1.08, 1.15];

pub const DAILY_FILE: &str = "daily.csv";
pub const INTRAHOUR_FILE: &str = "intrahour.csv";

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub start: NaiveDate,
    pub days: u32,
    pub seed: u64,
    /// Mean weekday volume (calls per day).
    pub base_volume: f64,
    /// Mean handling time, seconds.
    pub base_aht: f64,
    /// Probability that a day is a spike (volume ×3).
    pub spike_prob: f64,
    /// Trailing days also emitted at intrahour resolution.
    pub intrahour_days: u32,
    pub first_slot: NaiveTime,
    pub slots_per_day: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            days: 365,
            seed: 42,
            base_volume: 1200.0,
            base_aht: 240.0,
            spike_prob: 0.02,
            intrahour_days: 28,
            first_slot: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            slots_per_day: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoData {
    pub daily: RawTable,
    pub intrahour: RawTable,
}

pub fn generate_demo(config: &DemoConfig) -> Result<DemoData, PipelineError> {
    if config.days == 0 {
        return Err(PipelineError::UnexpectedValue("demo day count must be > 0".to_string()));
    }
    if !(0.0..1.0).contains(&config.spike_prob) {
        return Err(PipelineError::UnexpectedValue("demo spike probability must be in [0, 1)".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::<f64>::new(0.0, 0.08)
        .map_err(|e| PipelineError::UnexpectedValue(format!("Noise distribution error: {e}")))?;

    let mut daily_rows = Vec::with_capacity(config.days as usize);
    let mut intrahour_rows = Vec::new();
    let intrahour_from = config.days.saturating_sub(config.intrahour_days);
    let profile = slot_profile(config.slots_per_day);

    for i in 0..config.days {
        let date = config.start + Duration::days(i64::from(i));
        let day = DayOfWeek::of(date).index();
        let season = 1.0 + 0.1 * (std::f64::consts::TAU * f64::from(date.ordinal()) / 365.25).sin();

        let mut volume = config.base_volume * WEEKDAY_VOLUME[day] * season * noise.sample(&mut rng).exp();
        if rng.gen_bool(config.spike_prob) {
            volume *= 3.0;
        }
        let volume = volume.round().max(0.0);
        let aht = (config.base_aht * WEEKDAY_AHT[day] * noise.sample(&mut rng).exp()).round();

        daily_rows.push(vec![
            date.format("%d/%m/%Y").to_string(),
            format!("{volume}"),
            format!("{aht}"),
        ]);

        if i >= intrahour_from {
            for (slot, share) in profile.iter().enumerate() {
                let time = config.first_slot + Duration::minutes(30 * slot as i64);
                let slot_volume = (volume * share * noise.sample(&mut rng).exp()).round().max(0.0);
                let slot_aht = (aht * (0.9 + 0.2 * share * profile.len() as f64 / 2.0)).round();
                intrahour_rows.push(vec![
                    time.format("%H:%M").to_string(),
                    date.format("%Y-%m-%d").to_string(),
                    format!("{slot_volume}"),
                    format!("{slot_aht}"),
                ]);
            }
        }
    }

    let daily = RawTable::new(
        DAILY_FILE,
        vec![COL_DATE.to_string(), COL_VOLUME_ALIASES[0].to_string(), COL_AHT.to_string()],
        daily_rows,
    );
    let intrahour = RawTable::new(
        INTRAHOUR_FILE,
        vec![
            COL_INTERVAL.to_string(),
            COL_DAY.to_string(),
            COL_INTERVAL_VOLUME.to_string(),
            COL_AHT.to_string(),
        ],
        intrahour_rows,
    );
    Ok(DemoData { daily, intrahour })
}

/// Write both tables into `dir` as `;`-delimited CSV, returning their paths.
pub fn write_demo(dir: &Path, data: &DemoData) -> Result<(PathBuf, PathBuf), PipelineError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| PipelineError::Io(format!("Failed to create '{}': {e}", dir.display())))?;
    let daily = dir.join(DAILY_FILE);
    let intrahour = dir.join(INTRAHOUR_FILE);
    write_table(&daily, &data.daily)?;
    write_table(&intrahour, &data.intrahour)?;
    Ok((daily, intrahour))
}

fn write_table(path: &Path, table: &RawTable) -> Result<(), PipelineError> {
    let file = File::create(path)
        .map_err(|e| PipelineError::Io(format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);
    let write_err = |e: csv::Error| PipelineError::Io(format!("Failed to write '{}': {e}", path.display()));
    writer.write_record(&table.headers).map_err(write_err)?;
    for row in &table.rows {
        writer.write_record(row).map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| PipelineError::Io(format!("Failed to flush '{}': {e}", path.display())))
}

/// Share of the day's volume per slot: a morning and an afternoon peak.
fn slot_profile(slots: u32) -> Vec<f64> {
    let n = slots.max(1) as usize;
    let raw: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 / n as f64;
            let morning = (-((x - 0.25) / 0.12).powi(2)).exp();
            let afternoon = 0.8 * (-((x - 0.7) / 0.15).powi(2)).exp();
            0.1 + morning + afternoon
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|v| v / total).collect()
}
