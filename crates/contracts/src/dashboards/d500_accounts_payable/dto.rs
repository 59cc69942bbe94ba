use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::selection::Selection;

/// Global filters shared by every view of the dashboard
///
/// `status` and `document_type` are comma-separated lists; `Todos` disables the filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub status: Option<String>,
    pub document_type: Option<String>,
    /// Overrides the current date for overdue and deadline computations
    pub today: Option<NaiveDate>,
}

impl DashboardQuery {
    pub fn statuses(&self) -> Selection {
        Selection::parse(self.status.as_deref())
    }

    pub fn document_types(&self) -> Selection {
        Selection::parse(self.document_type.as_deref())
    }
}

/// Month selector; missing parts default to the current month
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthRequest {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Inclusive date range; defaults depend on the view
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRangeRequest {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Upcoming-due window: either an explicit range or a month
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpcomingDueRequest {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Extra document-type filter for this view only
    pub types: Option<String>,
}

impl UpcomingDueRequest {
    pub fn types(&self) -> Selection {
        Selection::parse(self.types.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YearRequest {
    pub year: Option<i32>,
}

/// Chart toggle of the deadline distribution view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Pie,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadlineDistributionRequest {
    pub chart: Option<ChartKind>,
}

/// Option lists for the filter widgets, each starting with `Todos`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptionsResponse {
    pub statuses: Vec<String>,
    pub document_types: Vec<String>,
}

/// Header metrics for one month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewResponse {
    /// Period in format "YYYY-MM"
    pub period: String,
    pub open_balance: f64,
    pub open_balance_formatted: String,
    pub paid_amount: f64,
    pub paid_amount_formatted: String,
    pub overdue_total: f64,
    pub overdue_total_formatted: String,
    pub overdue_count: usize,
}

/// Display row for detail tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayableRow {
    pub supplier: String,
    pub document_number: String,
    pub document_type: String,
    pub due_date: Option<NaiveDate>,
    /// DD/MM/YYYY, empty when unknown
    pub due_date_formatted: String,
    pub balance_value: f64,
    pub balance_value_formatted: String,
    /// Drives row highlighting
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpcomingDueResponse {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub rows: Vec<PayableRow>,
    pub total_balance: f64,
    pub total_balance_formatted: String,
}

/// One point of a monthly series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAmount {
    /// "YYYY-MM"
    pub period: String,
    pub value: f64,
    pub value_formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsByPeriodResponse {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub rows: Vec<MonthlyAmount>,
}

/// One point of a weekly series (ISO weeks, Monday to Sunday)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAmount {
    pub iso_year: i32,
    pub iso_week: u32,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    /// "YYYY-MM-DD/YYYY-MM-DD"
    pub label: String,
    pub value: f64,
    pub value_formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuePeaksResponse {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub rows: Vec<WeeklyAmount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierTerm {
    pub supplier: String,
    /// Average of per-document average terms, in days
    pub average_term_days: f64,
    /// Number of distinct documents that entered the average
    pub documents: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierTermsResponse {
    pub rows: Vec<SupplierTerm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTypeAmount {
    pub document_type: String,
    pub value: f64,
    pub value_formatted: String,
    /// Percentage of the total, 0 when the total is 0
    pub share: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTypeDistributionResponse {
    pub rows: Vec<DocumentTypeAmount>,
    pub total: f64,
    pub total_formatted: String,
}

/// Time-to-due category of an open payable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineBucket {
    OverdueOrDueToday,
    Within7Days,
    From8To15Days,
    From16To30Days,
    MoreThan30Days,
}

impl DeadlineBucket {
    /// Fixed display order
    pub const ALL: [DeadlineBucket; 5] = [
        DeadlineBucket::OverdueOrDueToday,
        DeadlineBucket::Within7Days,
        DeadlineBucket::From8To15Days,
        DeadlineBucket::From16To30Days,
        DeadlineBucket::MoreThan30Days,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DeadlineBucket::OverdueOrDueToday => "Overdue/Due today",
            DeadlineBucket::Within7Days => "Within 7 days",
            DeadlineBucket::From8To15Days => "8 to 15 days",
            DeadlineBucket::From16To30Days => "16 to 30 days",
            DeadlineBucket::MoreThan30Days => "More than 30 days",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineBucketRow {
    pub bucket: DeadlineBucket,
    pub label: String,
    pub count: usize,
    pub value: f64,
    pub value_formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineDistributionResponse {
    pub today: NaiveDate,
    /// Echo of the requested chart type
    pub chart: ChartKind,
    pub rows: Vec<DeadlineBucketRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueRow {
    pub supplier: String,
    pub document_number: String,
    pub document_type: String,
    pub due_date: NaiveDate,
    pub due_date_formatted: String,
    pub days_overdue: i64,
    pub balance_value: f64,
    pub balance_value_formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueResponse {
    pub today: NaiveDate,
    pub rows: Vec<OverdueRow>,
    pub total: f64,
    pub total_formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastActualRow {
    /// "YYYY-MM"
    pub period: String,
    /// Open balance due in the month
    pub forecast: f64,
    /// Net amount settled in the month
    pub actual: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastVsActualResponse {
    pub year: i32,
    pub rows: Vec<ForecastActualRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub records: usize,
    pub source: String,
    /// RFC 3339 timestamp of the new snapshot
    pub loaded_at: String,
}
