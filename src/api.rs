// Pocket Ledger - JSON API
// Axum routes over a shared Book; used by the pocket-server binary

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::{
    parse_date, Account, AccountId, BalanceCheck, BalancePoint, Book, Category, CategoryTotal,
    CategoryType, LedgerError, MonthlyPivot, NewTransaction, TransactionRow,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub book: Book,
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
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

    /// Successful call whose report has nothing to show yet
    fn no_data() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

impl<T> From<Option<T>> for ApiResponse<T> {
    fn from(report: Option<T>) -> Self {
        match report {
            Some(data) => ApiResponse::ok(data),
            None => ApiResponse::no_data(),
        }
    }
}

#[derive(Serialize)]
pub struct Created {
    id: i64,
}

/// Ledger failure rendered as an HTTP status plus envelope
pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::DuplicateName { .. } => StatusCode::CONFLICT,
            LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::Validation { .. } | LedgerError::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            LedgerError::Storage(_) | LedgerError::LockPoisoned => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            warn!(error = %self.0, status = status.as_u16(), "request rejected");
        }

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.0.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
type CreatedResult = Result<(StatusCode, Json<ApiResponse<Created>>), ApiError>;

fn created(id: i64) -> CreatedResult {
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(Created { id }))))
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    name: String,
    #[serde(default)]
    initial_balance: f64,
}

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
pub struct CreateTransactionRequest {
    date: String,
    account_id: i64,
    category_id: i64,
    #[serde(default)]
    description: Option<String>,
    amount: f64,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/accounts - Accounts ordered by name
async fn list_accounts(State(state): State<AppState>) -> ApiResult<Vec<Account>> {
    Ok(Json(ApiResponse::ok(state.book.list_accounts()?)))
}

/// POST /api/accounts
async fn create_account(
    State(state): State<AppState>,
    Json(body): Json<CreateAccountRequest>,
) -> CreatedResult {
    created(state.book.create_account(&body.name, body.initial_balance)?)
}

/// GET /api/accounts/:id/check - Reconcile one account
async fn check_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> ApiResult<BalanceCheck> {
    Ok(Json(ApiResponse::ok(state.book.check_account(id)?)))
}

/// GET /api/categories - Categories ordered by type, then name
async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    Ok(Json(ApiResponse::ok(state.book.list_categories()?)))
}

/// POST /api/categories
async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> CreatedResult {
    let kind: CategoryType = body.kind.parse()?;
    created(state.book.create_category(&body.name, kind)?)
}

/// GET /api/transactions - Newest first
async fn list_transactions(State(state): State<AppState>) -> ApiResult<Vec<TransactionRow>> {
    Ok(Json(ApiResponse::ok(state.book.list_transactions()?)))
}

/// POST /api/transactions
async fn create_transaction(
    State(state): State<AppState>,
    Json(body): Json<CreateTransactionRequest>,
) -> CreatedResult {
    let request = NewTransaction {
        date: parse_date(&body.date)?,
        account_id: body.account_id,
        category_id: body.category_id,
        description: body.description,
        amount: body.amount,
    };
    created(state.book.record_transaction(request)?)
}

/// GET /api/reports/balance - Cumulative balance series
async fn balance_report(State(state): State<AppState>) -> ApiResult<Vec<BalancePoint>> {
    Ok(Json(state.book.cumulative_balance()?.into()))
}

/// GET /api/reports/expenses - Expense totals per category
async fn expense_report(State(state): State<AppState>) -> ApiResult<Vec<CategoryTotal>> {
    Ok(Json(state.book.expenses_by_category()?.into()))
}

/// GET /api/reports/monthly - Month × category type pivot
async fn monthly_report(State(state): State<AppState>) -> ApiResult<MonthlyPivot> {
    Ok(Json(state.book.monthly_pivot()?.into()))
}

pub fn router(book: Book) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/:id/check", get(check_account))
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/reports/balance", get(balance_report))
        .route("/reports/expenses", get(expense_report))
        .route("/reports/monthly", get(monthly_report))
        .with_state(AppState { book });

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
