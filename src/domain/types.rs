//! Shared domain types.
//!
//! These types are intentionally kept lightweight and value-like so they can be:
//!
//! - passed between pipeline stages without shared mutable state
//! - exported to CSV/JSON
//! - reloaded later for display or comparisons

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Day of the week, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    #[value(name = "mon")]
    Monday,
    #[value(name = "tue")]
    Tuesday,
    #[value(name = "wed")]
    Wednesday,
    #[value(name = "thu")]
    Thursday,
    #[value(name = "fri")]
    Friday,
    #[value(name = "sat")]
    Saturday,
    #[value(name = "sun")]
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Localized (pt-BR) name used in labels and reports.
    pub fn display_name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Segunda-feira",
            DayOfWeek::Tuesday => "Terça-feira",
            DayOfWeek::Wednesday => "Quarta-feira",
            DayOfWeek::Thursday => "Quinta-feira",
            DayOfWeek::Friday => "Sexta-feira",
            DayOfWeek::Saturday => "Sábado",
            DayOfWeek::Sunday => "Domingo",
        }
    }

    /// Zero-based index, Monday = 0.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::from(date.weekday())
    }

    /// Every weekday as a set (the default day filter).
    pub fn all_set() -> BTreeSet<DayOfWeek> {
        Self::ALL.into_iter().collect()
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Composite key "Nth occurrence of weekday W within its month".
///
/// Ordering is by ordinal first, then weekday index, which is the row order used
/// in every curve and comparison table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OccurrenceLabel {
    pub ordinal: u32,
    pub weekday: DayOfWeek,
}

/// Rendered prefixes for the ordinals a month can actually contain.
const KNOWN_ORDINALS: [&str; 5] = ["1ª", "2ª", "3ª", "4ª", "5ª"];

impl OccurrenceLabel {
    pub fn new(ordinal: u32, weekday: DayOfWeek) -> Self {
        Self { ordinal, weekday }
    }
}

impl fmt::Display for OccurrenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known = (self.ordinal as usize)
            .checked_sub(1)
            .and_then(|i| KNOWN_ORDINALS.get(i));
        match known {
            Some(prefix) => write!(f, "{prefix} {}", self.weekday),
            None => write!(f, "{}ª {}", self.ordinal, self.weekday),
        }
    }
}

/// A single observation of one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Point at midnight of `date` (daily series).
    pub fn daily(date: NaiveDate, value: f64) -> Self {
        Self::new(date.and_time(NaiveTime::MIN), value)
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// A point annotated with its calendar occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledPoint {
    pub point: TimeSeriesPoint,
    pub weekday: DayOfWeek,
    pub occurrence_ordinal: u32,
}

impl LabeledPoint {
    pub fn label(&self) -> OccurrenceLabel {
        OccurrenceLabel::new(self.occurrence_ordinal, self.weekday)
    }

    pub fn value(&self) -> f64 {
        self.point.value
    }
}

/// Which metric a run works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Call volume (counts).
    Volume,
    /// Average handling time (TMA), in seconds.
    Aht,
}

impl MetricKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            MetricKind::Volume => "Volume",
            MetricKind::Aht => "TMA",
        }
    }

    /// File-name friendly identifier.
    pub fn slug(self) -> &'static str {
        match self {
            MetricKind::Volume => "volume",
            MetricKind::Aht => "tma",
        }
    }

    /// Volume adds up across a period; handling time is averaged.
    pub fn aggregation(self) -> Aggregation {
        match self {
            MetricKind::Volume => Aggregation::Additive,
            MetricKind::Aht => Aggregation::Average,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How values combine within a curve group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Sum per group; percentage of the grand total.
    Additive,
    /// Mean per group; percentage of the mean of the group means.
    Average,
}

/// Time resolution of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Intrahour,
}

impl Granularity {
    /// Smallest value a forecast may take at this resolution, for any metric.
    ///
    /// A zero forecast would break percentage-of-total normalization.
    pub fn forecast_floor(self) -> f64 {
        match self {
            Granularity::Daily => 1.0,
            Granularity::Intrahour => 0.1,
        }
    }
}

/// A single cyclic component, as selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityComponent {
    Daily,
    Weekly,
    Yearly,
}

/// Which cyclic components the forecaster models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seasonality {
    pub daily: bool,
    pub weekly: bool,
    pub yearly: bool,
}

impl Seasonality {
    /// Enable exactly the listed components.
    pub fn from_components(components: &[SeasonalityComponent]) -> Self {
        Self {
            daily: components.contains(&SeasonalityComponent::Daily),
            weekly: components.contains(&SeasonalityComponent::Weekly),
            yearly: components.contains(&SeasonalityComponent::Yearly),
        }
    }

    /// Pick components the history can support.
    ///
    /// - weekly: always
    /// - yearly: only with at least a year of history (an annual cycle fitted on
    ///   less data extrapolates badly)
    /// - daily: only when the history has sub-daily timestamps
    pub fn auto(history: &[TimeSeriesPoint]) -> Self {
        let span_days = match (history.first(), history.last()) {
            (Some(a), Some(b)) => (b.timestamp - a.timestamp).num_days(),
            _ => 0,
        };
        let sub_daily = history.iter().any(|p| p.timestamp.time() != NaiveTime::MIN);
        Self {
            daily: sub_daily,
            weekly: true,
            yearly: span_days >= 365,
        }
    }
}

/// Seasonality selection as configured: explicit, or resolved per history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonalityChoice {
    Auto,
    Fixed(Seasonality),
}

impl SeasonalityChoice {
    pub fn resolve(self, history: &[TimeSeriesPoint]) -> Seasonality {
        match self {
            SeasonalityChoice::Auto => Seasonality::auto(history),
            SeasonalityChoice::Fixed(s) => s,
        }
    }
}

/// A calendar month, e.g. `2024-07`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> NaiveDate {
        // `new`/`of` only admit valid months.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = s
            .split_once(['-', '/'])
            .and_then(|(y, m)| Some((y.parse::<i32>().ok()?, m.parse::<u32>().ok()?)));
        parsed
            .and_then(|(y, m)| YearMonth::new(y, m))
            .ok_or_else(|| format!("Invalid month '{s}'. Expected YYYY-MM."))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Index of a curve entry.
///
/// The variant order only matters for mixed maps, which the builders never
/// produce; within a variant the natural ordering applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "lowercase")]
pub enum CurveKey {
    Occurrence(OccurrenceLabel),
    Weekday(DayOfWeek),
    Slot(NaiveTime),
}

impl fmt::Display for CurveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveKey::Occurrence(label) => write!(f, "{label}"),
            CurveKey::Weekday(day) => write!(f, "{day}"),
            CurveKey::Slot(time) => write!(f, "{}", time.format("%H:%M")),
        }
    }
}

/// Raw aggregate and normalized share for one curve key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveEntry {
    pub value: f64,
    pub percentage: f64,
}

/// A normalized distribution of a metric across calendar-aligned keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub metric: MetricKind,
    pub aggregation: Aggregation,
    pub entries: BTreeMap<CurveKey, CurveEntry>,
}

impl Curve {
    pub fn get(&self, key: &CurveKey) -> Option<&CurveEntry> {
        self.entries.get(key)
    }

    pub fn percentage(&self, key: &CurveKey) -> f64 {
        self.entries.get(key).map(|e| e.percentage).unwrap_or(0.0)
    }

    pub fn total_percentage(&self) -> f64 {
        self.entries.values().map(|e| e.percentage).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where a period's curve came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodSource {
    /// History already covers the month; no forecast needed.
    Historical,
    /// Built from forecast values.
    Forecast,
}

/// Quartile-based outlier filtering parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierPolicy {
    /// `k` in `[Q1 - k·IQR, Q3 + k·IQR]`.
    pub iqr_multiplier: f64,
    /// Groups smaller than this pass through unfiltered.
    pub min_group_size: usize,
}

impl Default for OutlierPolicy {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
            min_group_size: 3,
        }
    }
}

/// A daily run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub metric: MetricKind,
    pub enabled_weekdays: BTreeSet<DayOfWeek>,
    /// Months to project. Empty means "the month after the last observation".
    pub projection_months: Vec<YearMonth>,
    pub seasonality: SeasonalityChoice,
    /// Weekdays whose occurrence groups are replaced by their mean when cleaning.
    pub collapse_weekdays: BTreeSet<DayOfWeek>,
    pub outliers: OutlierPolicy,
    /// Holiday dates fed to the forecaster (custom plus optional national list).
    pub holidays: Vec<NaiveDate>,
    /// Forecast horizon for the weekday share and monthly totals (0 disables).
    pub horizon_days: u32,

    pub export_dir: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            metric: MetricKind::Volume,
            enabled_weekdays: DayOfWeek::all_set(),
            projection_months: Vec::new(),
            seasonality: SeasonalityChoice::Auto,
            collapse_weekdays: [DayOfWeek::Sunday].into_iter().collect(),
            outliers: OutlierPolicy::default(),
            holidays: Vec::new(),
            horizon_days: 90,
            export_dir: None,
            export_curve: None,
        }
    }
}

/// An intrahour run's configuration.
#[derive(Debug, Clone)]
pub struct IntrahourConfig {
    pub input: PathBuf,
    /// Optional daily table providing the coarse forecast; without it, daily
    /// totals are aggregated from the intrahour history.
    pub daily_input: Option<PathBuf>,
    pub metric: MetricKind,
    pub month: YearMonth,
    pub enabled_weekdays: BTreeSet<DayOfWeek>,
    /// Used for both the slot forecast and the daily-target forecast.
    pub seasonality: SeasonalityChoice,
    pub outliers: OutlierPolicy,
    pub holidays: Vec<NaiveDate>,
    pub export_dir: Option<PathBuf>,
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub metric: MetricKind,
    pub aggregation: Aggregation,
    pub period: Option<YearMonth>,
    pub source: Option<PeriodSource>,
    pub entries: Vec<CurveFileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFileEntry {
    pub key: CurveKey,
    pub label: String,
    pub value: f64,
    pub percentage: f64,
}
