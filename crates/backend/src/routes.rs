use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::d500_accounts_payable::{self, SharedStore};

/// All application routes
pub fn configure_routes(store: SharedStore) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // D500 ACCOUNTS PAYABLE DASHBOARD
        // ========================================
        .route(
            "/api/d500/filters",
            get(d500_accounts_payable::get_filter_options),
        )
        .route("/api/d500/overview", get(d500_accounts_payable::get_overview))
        .route(
            "/api/d500/upcoming",
            get(d500_accounts_payable::get_upcoming_due),
        )
        .route(
            "/api/d500/payments_by_period",
            get(d500_accounts_payable::get_payments_by_period),
        )
        .route(
            "/api/d500/due_peaks",
            get(d500_accounts_payable::get_due_peaks),
        )
        .route(
            "/api/d500/supplier_terms",
            get(d500_accounts_payable::get_supplier_terms),
        )
        .route(
            "/api/d500/document_types",
            get(d500_accounts_payable::get_document_type_distribution),
        )
        .route(
            "/api/d500/deadline_buckets",
            get(d500_accounts_payable::get_deadline_distribution),
        )
        .route("/api/d500/overdue", get(d500_accounts_payable::get_overdue))
        .route(
            "/api/d500/forecast_vs_actual",
            get(d500_accounts_payable::get_forecast_vs_actual),
        )
        .route("/api/d500/reload", post(d500_accounts_payable::reload))
        .with_state(store)
}
