use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Local, Months, NaiveDate};
use contracts::dashboards::d500_accounts_payable::{
    DashboardQuery, DateRangeRequest, DeadlineDistributionRequest, DeadlineDistributionResponse,
    DocumentTypeDistributionResponse, DuePeaksResponse, FilterOptionsResponse,
    ForecastVsActualResponse, MonthRequest, OverdueResponse, OverviewResponse, PayableRecord,
    PaymentsByPeriodResponse, ReloadResponse, SupplierTermsResponse, UpcomingDueRequest,
    UpcomingDueResponse, YearRequest,
};
use std::sync::Arc;

use crate::dashboards::d500_accounts_payable::{
    deadline,
    repository::{PayablesStore, PayablesTable},
    service,
};
use crate::shared::format::format_currency_brl;

pub type SharedStore = Arc<PayablesStore>;

fn today(query: &DashboardQuery) -> NaiveDate {
    query.today.unwrap_or_else(|| Local::now().date_naive())
}

fn filtered(table: &PayablesTable, query: &DashboardQuery) -> Vec<PayableRecord> {
    service::filter_records(table.records(), &query.statuses(), &query.document_types())
}

fn resolve_month(
    year: Option<i32>,
    month: Option<u32>,
    today: NaiveDate,
) -> Result<(i32, u32, NaiveDate, NaiveDate), StatusCode> {
    let year = year.unwrap_or(today.year());
    let month = month.unwrap_or(today.month());
    match service::month_bounds(year, month) {
        Some((first, last)) => Ok((year, month, first, last)),
        None => {
            tracing::warn!("D500 Dashboard: Invalid month {}-{}", year, month);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

fn resolve_range(
    request: &DateRangeRequest,
    default_from: NaiveDate,
    default_to: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), StatusCode> {
    let date_from = request.date_from.unwrap_or(default_from);
    let date_to = request.date_to.unwrap_or(default_to);
    if date_from > date_to {
        tracing::warn!(
            "D500 Dashboard: Inverted date range {} > {}",
            date_from,
            date_to
        );
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok((date_from, date_to))
}

/// Window of the upcoming-due view.
///
/// An explicit range wins over `year`/`month`. A lone bound is completed with
/// its own month; with no bounds the requested (or current) month is used.
fn resolve_upcoming_window(
    request: &UpcomingDueRequest,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), StatusCode> {
    let (default_from, default_to) = match (request.date_from, request.date_to) {
        (Some(from), Some(to)) => (from, to),
        (Some(from), None) => {
            let (_, _, _, last) = resolve_month(Some(from.year()), Some(from.month()), today)?;
            (from, last)
        }
        (None, Some(to)) => {
            let (_, _, first, _) = resolve_month(Some(to.year()), Some(to.month()), today)?;
            (first, to)
        }
        (None, None) => {
            let (_, _, first, last) = resolve_month(request.year, request.month, today)?;
            (first, last)
        }
    };
    let range = DateRangeRequest {
        date_from: request.date_from,
        date_to: request.date_to,
    };
    resolve_range(&range, default_from, default_to)
}

/// GET /api/d500/filters
pub async fn get_filter_options(State(store): State<SharedStore>) -> Json<FilterOptionsResponse> {
    let table = store.snapshot().await;
    Json(service::filter_options(table.records()))
}

/// GET /api/d500/overview?year=2025&month=12
pub async fn get_overview(
    State(store): State<SharedStore>,
    Query(query): Query<DashboardQuery>,
    Query(request): Query<MonthRequest>,
) -> Result<Json<OverviewResponse>, StatusCode> {
    let today = today(&query);
    let (year, month, _, _) = resolve_month(request.year, request.month, today)?;
    tracing::info!("D500 Dashboard: Getting overview for {}-{:02}", year, month);

    let table = store.snapshot().await;
    let records = filtered(&table, &query);
    Ok(Json(service::overview(
        &records,
        table.records(),
        year,
        month,
        today,
    )))
}

/// GET /api/d500/upcoming?year=2025&month=12&types=Boleto
/// GET /api/d500/upcoming?date_from=2025-12-01&date_to=2025-12-15
pub async fn get_upcoming_due(
    State(store): State<SharedStore>,
    Query(query): Query<DashboardQuery>,
    Query(request): Query<UpcomingDueRequest>,
) -> Result<Json<UpcomingDueResponse>, StatusCode> {
    let today = today(&query);
    let (date_from, date_to) = resolve_upcoming_window(&request, today)?;

    let table = store.snapshot().await;
    let records = filtered(&table, &query);
    let rows: Vec<_> = service::upcoming_due(&records, date_from, date_to, &request.types())
        .iter()
        .map(|r| service::to_payable_row(r, today))
        .collect();
    let total_balance = rows.iter().fold(0.0, |total, r| total + r.balance_value);

    tracing::info!(
        "D500 Dashboard: Returning {} upcoming payables for {}..{}",
        rows.len(),
        date_from,
        date_to
    );

    Ok(Json(UpcomingDueResponse {
        date_from,
        date_to,
        rows,
        total_balance,
        total_balance_formatted: format_currency_brl(Some(total_balance)),
    }))
}

/// GET /api/d500/payments_by_period?date_from=2025-01-01&date_to=2025-06-30
///
/// Runs over the whole table; the global filters do not apply here.
pub async fn get_payments_by_period(
    State(store): State<SharedStore>,
    Query(query): Query<DashboardQuery>,
    Query(request): Query<DateRangeRequest>,
) -> Result<Json<PaymentsByPeriodResponse>, StatusCode> {
    let today = today(&query);
    let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    let (date_from, date_to) = resolve_range(&request, year_start, today)?;

    let table = store.snapshot().await;
    let rows = service::payments_by_period(table.records(), date_from, date_to);
    tracing::info!("D500 Dashboard: Returning {} payment months", rows.len());

    Ok(Json(PaymentsByPeriodResponse {
        date_from,
        date_to,
        rows,
    }))
}

/// GET /api/d500/due_peaks?date_from=2025-01-01&date_to=2025-03-31
pub async fn get_due_peaks(
    State(store): State<SharedStore>,
    Query(query): Query<DashboardQuery>,
    Query(request): Query<DateRangeRequest>,
) -> Result<Json<DuePeaksResponse>, StatusCode> {
    let today = today(&query);
    let three_months = today.checked_add_months(Months::new(3)).unwrap_or(today);
    let (date_from, date_to) = resolve_range(&request, today, three_months)?;

    let table = store.snapshot().await;
    let records = filtered(&table, &query);
    let rows = service::due_peaks_by_week(&records, date_from, date_to);
    tracing::info!("D500 Dashboard: Returning {} due weeks", rows.len());

    Ok(Json(DuePeaksResponse {
        date_from,
        date_to,
        rows,
    }))
}

/// GET /api/d500/supplier_terms
///
/// Runs over the whole table; the global filters do not apply here.
pub async fn get_supplier_terms(State(store): State<SharedStore>) -> Json<SupplierTermsResponse> {
    let table = store.snapshot().await;
    let rows = service::average_term_by_supplier(table.records());
    tracing::info!("D500 Dashboard: Returning terms for {} suppliers", rows.len());
    Json(SupplierTermsResponse { rows })
}

/// GET /api/d500/document_types
pub async fn get_document_type_distribution(
    State(store): State<SharedStore>,
    Query(query): Query<DashboardQuery>,
) -> Json<DocumentTypeDistributionResponse> {
    let table = store.snapshot().await;
    let records = filtered(&table, &query);
    let rows = service::distribution_by_document_type(&records);
    let total = rows.iter().fold(0.0, |total, r| total + r.value);
    Json(DocumentTypeDistributionResponse {
        rows,
        total,
        total_formatted: format_currency_brl(Some(total)),
    })
}

/// GET /api/d500/deadline_buckets?chart=pie
pub async fn get_deadline_distribution(
    State(store): State<SharedStore>,
    Query(query): Query<DashboardQuery>,
    Query(request): Query<DeadlineDistributionRequest>,
) -> Json<DeadlineDistributionResponse> {
    let today = today(&query);
    let table = store.snapshot().await;
    let records = filtered(&table, &query);
    Json(DeadlineDistributionResponse {
        today,
        chart: request.chart.unwrap_or_default(),
        rows: deadline::deadline_distribution(&records, today),
    })
}

/// GET /api/d500/overdue
pub async fn get_overdue(
    State(store): State<SharedStore>,
    Query(query): Query<DashboardQuery>,
) -> Json<OverdueResponse> {
    let today = today(&query);
    let table = store.snapshot().await;
    let records = filtered(&table, &query);
    let rows = deadline::overdue_rows(&records, today);
    let total = rows.iter().fold(0.0, |total, r| total + r.balance_value);
    tracing::info!("D500 Dashboard: Returning {} overdue payables", rows.len());
    Json(OverdueResponse {
        today,
        rows,
        total,
        total_formatted: format_currency_brl(Some(total)),
    })
}

/// GET /api/d500/forecast_vs_actual?year=2025
pub async fn get_forecast_vs_actual(
    State(store): State<SharedStore>,
    Query(query): Query<DashboardQuery>,
    Query(request): Query<YearRequest>,
) -> Json<ForecastVsActualResponse> {
    let year = request.year.unwrap_or_else(|| today(&query).year());
    let table = store.snapshot().await;
    let records = filtered(&table, &query);
    Json(ForecastVsActualResponse {
        year,
        rows: service::forecast_vs_actual(&records, year),
    })
}

/// POST /api/d500/reload
pub async fn reload(State(store): State<SharedStore>) -> Result<Json<ReloadResponse>, StatusCode> {
    match store.reload().await {
        Ok(table) => Ok(Json(ReloadResponse {
            records: table.len(),
            source: table.source().display().to_string(),
            loaded_at: table.loaded_at().to_rfc3339(),
        })),
        Err(e) => {
            tracing::error!("D500 Dashboard: Failed to reload payables: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> SharedStore {
        let csv = "\
fornecedor,numero_documento,descricao_tipo_documento,data_emissao,data_vencimento,data_quitacao,valor_documento,valor_desconto,valor_saldo,status_documento
A,1,Boleto,2024-01-01,2024-01-10,,100,0,100,aberto
B,2,NF,2024-01-01,2024-02-05,,50,0,50,aberto
C,3/1,Boleto,2024-01-01,2024-01-31,2024-01-20,80,5,0,quitado
";
        let records = crate::dashboards::d500_accounts_payable::repository::parse_csv(csv.as_bytes(), b',')
            .unwrap();
        Arc::new(PayablesStore::from_table(
            PayablesTable::from_records(records, "memory.csv"),
            b',',
        ))
    }

    fn query(status: Option<&str>, today: NaiveDate) -> DashboardQuery {
        DashboardQuery {
            status: status.map(str::to_string),
            document_type: None,
            today: Some(today),
        }
    }

    #[test]
    fn test_resolve_month_rejects_invalid() {
        let today = date(2024, 6, 15);
        assert_eq!(resolve_month(None, Some(13), today), Err(StatusCode::BAD_REQUEST));
        let (year, month, first, last) = resolve_month(None, None, today).unwrap();
        assert_eq!((year, month), (2024, 6));
        assert_eq!((first, last), (date(2024, 6, 1), date(2024, 6, 30)));
    }

    #[test]
    fn test_resolve_range_rejects_inverted() {
        let request = DateRangeRequest {
            date_from: Some(date(2024, 2, 1)),
            date_to: Some(date(2024, 1, 1)),
        };
        assert_eq!(
            resolve_range(&request, date(2024, 1, 1), date(2024, 1, 1)),
            Err(StatusCode::BAD_REQUEST)
        );
    }

    #[tokio::test]
    async fn test_overview_handler() {
        let Json(response) = get_overview(
            State(store()),
            Query(query(Some("aberto"), date(2024, 1, 15))),
            Query(MonthRequest {
                year: Some(2024),
                month: Some(1),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.period, "2024-01");
        assert_eq!(response.open_balance, 100.0);
        assert_eq!(response.paid_amount, 75.0);
        assert_eq!(response.overdue_count, 1);
    }

    #[tokio::test]
    async fn test_upcoming_handler_uses_month_window() {
        let Json(response) = get_upcoming_due(
            State(store()),
            Query(query(None, date(2024, 1, 15))),
            Query(UpcomingDueRequest {
                year: Some(2024),
                month: Some(2),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.date_from, date(2024, 2, 1));
        assert_eq!(response.date_to, date(2024, 2, 29));
        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.rows[0].supplier, "B");
        assert!(!response.rows[0].is_overdue);
        assert_eq!(response.total_balance_formatted, "R$ 50,00");
    }

    #[test]
    fn test_upcoming_window_completes_lone_bound() {
        let today = date(2024, 1, 15);
        let from_only = UpcomingDueRequest {
            date_from: Some(date(2024, 3, 10)),
            ..Default::default()
        };
        assert_eq!(
            resolve_upcoming_window(&from_only, today),
            Ok((date(2024, 3, 10), date(2024, 3, 31)))
        );

        let to_only = UpcomingDueRequest {
            date_to: Some(date(2023, 11, 20)),
            ..Default::default()
        };
        assert_eq!(
            resolve_upcoming_window(&to_only, today),
            Ok((date(2023, 11, 1), date(2023, 11, 20)))
        );
    }

    #[test]
    fn test_upcoming_window_explicit_range_ignores_month() {
        let request = UpcomingDueRequest {
            date_from: Some(date(2024, 1, 1)),
            date_to: Some(date(2024, 1, 31)),
            month: Some(13),
            ..Default::default()
        };
        assert_eq!(
            resolve_upcoming_window(&request, date(2024, 1, 15)),
            Ok((date(2024, 1, 1), date(2024, 1, 31)))
        );
    }

    #[tokio::test]
    async fn test_upcoming_handler_accepts_future_start_only() {
        let Json(response) = get_upcoming_due(
            State(store()),
            Query(query(None, date(2024, 1, 15))),
            Query(UpcomingDueRequest {
                date_from: Some(date(2024, 2, 1)),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.date_from, date(2024, 2, 1));
        assert_eq!(response.date_to, date(2024, 2, 29));
        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.rows[0].supplier, "B");
    }

    #[tokio::test]
    async fn test_overview_handler_english_status() {
        let Json(response) = get_overview(
            State(store()),
            Query(query(Some("open"), date(2024, 1, 15))),
            Query(MonthRequest {
                year: Some(2024),
                month: Some(1),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.open_balance, 100.0);
        assert_eq!(response.open_balance_formatted, "R$ 100,00");
    }

    #[tokio::test]
    async fn test_deadline_handler_echoes_chart() {
        let Json(response) = get_deadline_distribution(
            State(store()),
            Query(query(None, date(2024, 1, 15))),
            Query(DeadlineDistributionRequest {
                chart: Some(contracts::dashboards::d500_accounts_payable::ChartKind::Pie),
            }),
        )
        .await;

        assert_eq!(
            response.chart,
            contracts::dashboards::d500_accounts_payable::ChartKind::Pie
        );
        assert_eq!(response.rows.len(), 5);
        // A is overdue, B is due in 21 days, C is settled
        assert_eq!(response.rows[0].count, 1);
        assert_eq!(response.rows[3].count, 1);
        assert_eq!(response.rows.iter().map(|r| r.count).sum::<usize>(), 2);
    }

    #[tokio::test]
    async fn test_reload_failure_is_server_error() {
        let result = reload(State(store())).await;
        assert_eq!(result.err(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
