// Expense Analyzer - Web Server
// REST API over one shared expense book

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use expense_analyzer::{files, logging, AppConfig, DistributionSummary, LedgerError, SharedBook};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    book: SharedBook,
    data_file: Arc<PathBuf>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Expense response: record plus its position in the ledger
#[derive(Serialize, Deserialize)]
struct ExpenseResponse {
    position: usize,
    date: String,
    category: String,
    amount: f64,
}

/// Amount may arrive as JSON number or as the raw text a form field holds
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountField {
    Number(f64),
    Text(String),
}

impl AmountField {
    fn into_text(self) -> String {
        match self {
            AmountField::Number(value) => value.to_string(),
            AmountField::Text(text) => text,
        }
    }
}

#[derive(Deserialize)]
struct NewExpense {
    date: String,
    category: String,
    amount: AmountField,
}

#[derive(Serialize)]
struct Added {
    position: usize,
}

fn ledger_error(err: LedgerError) -> Response {
    let status = match err {
        LedgerError::InvalidAmount { .. } | LedgerError::MalformedInput(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LedgerError::EmptyCategory(_) | LedgerError::PositionOutOfRange { .. } => {
            StatusCode::NOT_FOUND
        }
        LedgerError::Csv(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(error = %err, status = status.as_u16(), "request failed");

    (status, Json(ApiResponse::<()>::err(err.to_string()))).into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/expenses - All expenses in ledger order
async fn list_expenses(State(state): State<AppState>) -> impl IntoResponse {
    let response: Vec<ExpenseResponse> = state
        .book
        .snapshot()
        .into_iter()
        .enumerate()
        .map(|(position, record)| ExpenseResponse {
            position,
            date: record.date().to_string(),
            category: record.category().to_string(),
            amount: record.amount(),
        })
        .collect();

    Json(ApiResponse::ok(response))
}

/// POST /api/expenses - Append one expense
async fn add_expense(State(state): State<AppState>, Json(body): Json<NewExpense>) -> Response {
    let amount = body.amount.into_text();

    match state.book.add_expense(&body.date, &body.category, &amount) {
        Ok(position) => {
            tracing::info!(position, category = %body.category, "expense added");
            (StatusCode::CREATED, Json(ApiResponse::ok(Added { position }))).into_response()
        }
        Err(e) => ledger_error(e),
    }
}

/// DELETE /api/expenses/:position - Remove the expense at a position
async fn delete_expense(State(state): State<AppState>, Path(position): Path<usize>) -> Response {
    match state.book.delete_expense(position) {
        Ok(record) => {
            tracing::info!(position, category = %record.category(), "expense deleted");
            Json(ApiResponse::ok(ExpenseResponse {
                position,
                date: record.date().to_string(),
                category: record.category().to_string(),
                amount: record.amount(),
            }))
            .into_response()
        }
        Err(e) => ledger_error(e),
    }
}

/// GET /api/categories - Distinct categories, first-seen order
async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.book.list_categories()))
}

/// GET /api/summary/:category - Box plot statistics
async fn get_summary(State(state): State<AppState>, Path(category): Path<String>) -> Response {
    match state.book.summarize(&category) {
        Ok(summary) => Json(ApiResponse::<DistributionSummary>::ok(summary)).into_response(),
        Err(e) => ledger_error(e),
    }
}

/// GET /api/export - Ledger as CSV text
async fn export_csv(State(state): State<AppState>) -> Response {
    match state.book.export_to_text() {
        Ok(text) => ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], text).into_response(),
        Err(e) => ledger_error(e),
    }
}

/// POST /api/import - Replace the ledger with CSV text
async fn import_csv(State(state): State<AppState>, body: String) -> Response {
    match state.book.load_from_text(&body) {
        Ok(()) => {
            let count = state.book.len();
            tracing::info!(count, "ledger replaced from import");
            Json(ApiResponse::ok(count)).into_response()
        }
        Err(e) => ledger_error(e),
    }
}

/// POST /api/save - Write the ledger to the configured data file
async fn save_csv(State(state): State<AppState>) -> Response {
    let text = match state.book.export_to_text() {
        Ok(text) => text,
        Err(e) => return ledger_error(e),
    };

    match files::save_text(&text, &state.data_file) {
        Ok(()) => {
            tracing::info!(file = %state.data_file.display(), "ledger saved");
            Json(ApiResponse::ok(state.data_file.display().to_string())).into_response()
        }
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "save failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::err(format!("{:#}", e))),
            )
                .into_response()
        }
    }
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/expenses", get(list_expenses).post(add_expense))
        .route("/expenses/:position", delete(delete_expense))
        .route("/categories", get(list_categories))
        .route("/summary/:category", get(get_summary))
        .route("/export", get(export_csv))
        .route("/import", post(import_csv))
        .route("/save", post(save_csv))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init_tracing(&config.log_level);

    let book = files::load_csv_or_empty(&config.data_file)?;
    tracing::info!(
        file = %config.data_file.display(),
        records = book.records().len(),
        "ledger loaded"
    );

    let state = AppState {
        book: SharedBook::new(book),
        data_file: Arc::new(config.data_file.clone()),
    };

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;

    tracing::info!(addr = %config.server_addr, "server running");
    println!("🚀 Expense Analyzer API on http://{}/api", config.server_addr);

    axum::serve(listener, router(state))
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use expense_analyzer::ExpenseBook;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let mut book = ExpenseBook::new();
        book.load_from_text("Date,Category,Amount\n2024-01-01,Food,10\n2024-01-05,Food,20\n2024-01-10,Food,30\n")
            .unwrap();
        AppState {
            book: SharedBook::new(book),
            data_file: Arc::new(PathBuf::from("unused.csv")),
        }
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_summary_endpoint() {
        let (status, json) = send(test_state(), get("/api/summary/Food")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["median"], 20.0);
        assert_eq!(json["data"]["q1"], 15.0);
        assert_eq!(json["data"]["q3"], 25.0);
    }

    #[tokio::test]
    async fn test_summary_unknown_category_is_404() {
        let (status, json) = send(test_state(), get("/api/summary/Travel%20Abroad")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("Travel Abroad"));
    }

    #[tokio::test]
    async fn test_add_expense_and_list_categories() {
        let state = test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/api/expenses")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"date":"2024-02-01","category":"Rent","amount":"900"}"#))
            .unwrap();

        let (status, json) = send(state.clone(), request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["position"], 3);

        let (_, json) = send(state, get("/api/categories")).await;
        assert_eq!(json["data"], serde_json::json!(["Food", "Rent"]));
    }

    #[tokio::test]
    async fn test_add_invalid_amount_is_422() {
        let state = test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/api/expenses")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"date":"2024-02-01","category":"Rent","amount":"abc"}"#))
            .unwrap();

        let (status, _) = send(state.clone(), request).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.book.len(), 3);
    }

    #[tokio::test]
    async fn test_import_missing_header_keeps_ledger() {
        let state = test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/api/import")
            .body(Body::from("Category,Amount\nFood,1\n"))
            .unwrap();

        let (status, _) = send(state.clone(), request).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.book.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_out_of_range() {
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/expenses/7")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(test_state(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
