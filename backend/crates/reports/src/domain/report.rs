//! Report Rows
//!
//! History amounts arrive as fixed-point integers (display value x 1000).
//! Rows are built in raw units and [`Prettify::prettify`] moves them to
//! display units exactly once; the row remembers which units it holds, so a
//! second call is a no-op. Ratios (RTP, rounds per user) are unitless and
//! computed at construction.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use gateway::history::{AggregatedRecord, FinancialRecord, GamingSessionRecord, SpinRecord};
use serde::{Deserialize, Serialize};

pub const MONEY_SCALE: f64 = 1000.0;

/// Decimals kept for monetary values; the fixed-point scale is exact here
const MONEY_DECIMALS: i32 = 3;
const RATIO_DECIMALS: i32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Units {
    Raw,
    /// Rows read back from storage were stored prettified
    #[default]
    Display,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn money(raw: f64) -> f64 {
    round_to(raw / MONEY_SCALE, MONEY_DECIMALS)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        round_to(numerator / denominator, RATIO_DECIMALS)
    }
}

fn per_user(value: f64, users: i64) -> f64 {
    if users > 0 { value / users as f64 } else { 0.0 }
}

pub trait Prettify: Sized {
    /// Raw fixed-point amounts to display units; idempotent
    fn prettify(self) -> Self;
}

impl<T: Prettify> Prettify for Vec<T> {
    fn prettify(self) -> Self {
        self.into_iter().map(Prettify::prettify).collect()
    }
}

/// Column names in serialisation order, used for CSV and XLSX headers
pub trait Columns {
    const COLUMNS: &'static [&'static str];
}

/// Which report a request or export job produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Financial,
    Spins,
    Sessions,
    AggregatedByGame,
    AggregatedByCountry,
}

impl ReportKind {
    pub const fn file_prefix(&self) -> &'static str {
        match self {
            ReportKind::Financial => "financial_report",
            ReportKind::Spins => "spins_report",
            ReportKind::Sessions => "sessions_report",
            ReportKind::AggregatedByGame => "aggregated_by_game_report",
            ReportKind::AggregatedByCountry => "aggregated_by_country_report",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_prefix())
    }
}

// ============================================================================
// Financial
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub currency: String,
    pub user_count: i64,
    pub round_count: i64,
    pub wager: f64,
    pub award: f64,
    pub revenue: f64,
    pub rtp: f64,
    #[serde(skip)]
    pub units: Units,
}

impl Columns for FinancialReport {
    const COLUMNS: &'static [&'static str] = &[
        "currency",
        "user_count",
        "round_count",
        "wager",
        "award",
        "revenue",
        "rtp",
    ];
}

impl From<FinancialRecord> for FinancialReport {
    fn from(r: FinancialRecord) -> Self {
        Self {
            currency: r.currency,
            user_count: r.user_count,
            round_count: r.round_count,
            wager: r.wager as f64,
            award: r.award as f64,
            revenue: (r.wager - r.award) as f64,
            rtp: ratio(r.award as f64, r.wager as f64),
            units: Units::Raw,
        }
    }
}

impl Prettify for FinancialReport {
    fn prettify(mut self) -> Self {
        if self.units == Units::Raw {
            self.wager = money(self.wager);
            self.award = money(self.award);
            self.revenue = money(self.revenue);
            self.units = Units::Display;
        }
        self
    }
}

// ============================================================================
// Spins
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinReport {
    pub round_id: String,
    pub session_token: String,
    pub game_id: String,
    pub game: String,
    pub integrator: String,
    pub operator: String,
    pub external_user_id: String,
    pub host: String,
    pub currency: String,
    pub wager: f64,
    pub award: f64,
    pub revenue: f64,
    pub is_demo: bool,
    pub is_pfr: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub units: Units,
}

impl Columns for SpinReport {
    const COLUMNS: &'static [&'static str] = &[
        "round_id",
        "session_token",
        "game_id",
        "game",
        "integrator",
        "operator",
        "external_user_id",
        "host",
        "currency",
        "wager",
        "award",
        "revenue",
        "is_demo",
        "is_pfr",
        "created_at",
    ];
}

impl From<SpinRecord> for SpinReport {
    fn from(s: SpinRecord) -> Self {
        Self {
            round_id: s.round_id,
            session_token: s.session_token,
            game_id: s.game_id,
            game: s.game,
            integrator: s.integrator,
            operator: s.operator,
            external_user_id: s.external_user_id,
            host: s.host,
            currency: s.currency,
            wager: s.wager as f64,
            award: s.award as f64,
            revenue: (s.wager - s.award) as f64,
            is_demo: s.is_demo,
            is_pfr: s.is_pfr,
            created_at: s.created_at,
            units: Units::Raw,
        }
    }
}

impl Prettify for SpinReport {
    fn prettify(mut self) -> Self {
        if self.units == Units::Raw {
            self.wager = money(self.wager);
            self.award = money(self.award);
            self.revenue = money(self.revenue);
            self.units = Units::Display;
        }
        self
    }
}

// ============================================================================
// Gaming sessions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamingSessionReport {
    pub session_token: String,
    pub game_id: String,
    pub game: String,
    pub integrator: String,
    pub operator: String,
    pub external_user_id: String,
    pub currency: String,
    pub round_count: i64,
    pub wager: f64,
    pub award: f64,
    pub revenue: f64,
    pub rtp: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub units: Units,
}

impl Columns for GamingSessionReport {
    const COLUMNS: &'static [&'static str] = &[
        "session_token",
        "game_id",
        "game",
        "integrator",
        "operator",
        "external_user_id",
        "currency",
        "round_count",
        "wager",
        "award",
        "revenue",
        "rtp",
        "started_at",
        "finished_at",
    ];
}

impl From<GamingSessionRecord> for GamingSessionReport {
    fn from(s: GamingSessionRecord) -> Self {
        Self {
            session_token: s.session_token,
            game_id: s.game_id,
            game: s.game,
            integrator: s.integrator,
            operator: s.operator,
            external_user_id: s.external_user_id,
            currency: s.currency,
            round_count: s.round_count,
            wager: s.wager as f64,
            award: s.award as f64,
            revenue: (s.wager - s.award) as f64,
            rtp: ratio(s.award as f64, s.wager as f64),
            started_at: s.started_at,
            finished_at: s.finished_at,
            units: Units::Raw,
        }
    }
}

impl Prettify for GamingSessionReport {
    fn prettify(mut self) -> Self {
        if self.units == Units::Raw {
            self.wager = money(self.wager);
            self.award = money(self.award);
            self.revenue = money(self.revenue);
            self.units = Units::Display;
        }
        self
    }
}

// ============================================================================
// Aggregated
// ============================================================================

/// Merged unfiltered + play-for-real bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub game_id: String,
    pub game: String,
    pub country: String,
    pub currency: String,
    pub segment: String,
    pub user_count: i64,
    pub round_count: i64,
    pub wager: f64,
    pub award: f64,
    pub revenue: f64,
    pub rtp: f64,
    pub pfr_round_count: i64,
    pub pfr_wager: f64,
    pub pfr_award: f64,
    pub pfr_revenue: f64,
    pub round_per_user: f64,
    pub wager_per_user: f64,
    pub award_per_user: f64,
    pub revenue_per_user: f64,
    #[serde(skip)]
    pub units: Units,
}

impl Columns for AggregatedReport {
    const COLUMNS: &'static [&'static str] = &[
        "game_id",
        "game",
        "country",
        "currency",
        "segment",
        "user_count",
        "round_count",
        "wager",
        "award",
        "revenue",
        "rtp",
        "pfr_round_count",
        "pfr_wager",
        "pfr_award",
        "pfr_revenue",
        "round_per_user",
        "wager_per_user",
        "award_per_user",
        "revenue_per_user",
    ];
}

impl AggregatedReport {
    /// `all` supplies everything except the `pfr_*` columns
    pub fn merge(all: AggregatedRecord, pfr: Option<&AggregatedRecord>) -> Self {
        let (pfr_round_count, pfr_wager, pfr_award) = pfr
            .map(|p| (p.round_count, p.wager, p.award))
            .unwrap_or_default();
        let revenue = all.wager - all.award;
        let users = all.user_count;
        Self {
            user_count: users,
            round_count: all.round_count,
            wager: all.wager as f64,
            award: all.award as f64,
            revenue: revenue as f64,
            rtp: ratio(all.award as f64, all.wager as f64),
            pfr_round_count,
            pfr_wager: pfr_wager as f64,
            pfr_award: pfr_award as f64,
            pfr_revenue: (pfr_wager - pfr_award) as f64,
            round_per_user: round_to(per_user(all.round_count as f64, users), RATIO_DECIMALS),
            wager_per_user: per_user(all.wager as f64, users),
            award_per_user: per_user(all.award as f64, users),
            revenue_per_user: per_user(revenue as f64, users),
            game_id: all.game_id,
            game: all.game,
            country: all.country,
            currency: all.currency,
            segment: all.segment,
            units: Units::Raw,
        }
    }
}

impl Prettify for AggregatedReport {
    fn prettify(mut self) -> Self {
        if self.units == Units::Raw {
            self.wager = money(self.wager);
            self.award = money(self.award);
            self.revenue = money(self.revenue);
            self.pfr_wager = money(self.pfr_wager);
            self.pfr_award = money(self.pfr_award);
            self.pfr_revenue = money(self.pfr_revenue);
            self.wager_per_user = money(self.wager_per_user);
            self.award_per_user = money(self.award_per_user);
            self.revenue_per_user = money(self.revenue_per_user);
            self.units = Units::Display;
        }
        self
    }
}

/// Merge key of aggregated buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Game,
    Country,
}

impl Grouping {
    fn key(&self, record: &AggregatedRecord) -> (String, String, String) {
        let subject = match self {
            Grouping::Game => &record.game_id,
            Grouping::Country => &record.country,
        };
        (
            subject.clone(),
            record.currency.to_lowercase(),
            record.segment.clone(),
        )
    }
}

/// Join the unfiltered and `is_pfr` responses on (subject, currency, segment)
///
/// Order follows the unfiltered response. PFR buckets without an
/// unfiltered counterpart are dropped.
pub fn merge_pfr(
    all: Vec<AggregatedRecord>,
    pfr: Vec<AggregatedRecord>,
    grouping: Grouping,
) -> Vec<AggregatedReport> {
    let pfr_by_key: HashMap<_, _> = pfr.iter().map(|p| (grouping.key(p), p)).collect();
    all.into_iter()
        .map(|record| {
            let matched = pfr_by_key.get(&grouping.key(&record)).copied();
            AggregatedReport::merge(record, matched)
        })
        .collect()
}
