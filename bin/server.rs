// Transaction Importer - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use txn_import::{
    get_balance, list_categories, list_transactions, logging, setup_database, Balance, Category,
    ImportError, Importer, Transaction, TransactionRecord, VERSION,
};

/// Serve the transaction importer over HTTP
#[derive(Parser, Debug)]
#[command(name = "txn-import-server", version, about)]
struct Args {
    /// SQLite database file
    #[arg(long, env = "TXN_IMPORT_DATABASE", default_value = "transactions.db")]
    database: PathBuf,

    /// Address to listen on
    #[arg(long, env = "TXN_IMPORT_BIND", default_value = "127.0.0.1:3333")]
    bind: String,

    /// Directory for uploaded CSV files (defaults to the system temp dir)
    #[arg(long, env = "TXN_IMPORT_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Log level; RUST_LOG overrides it
    #[arg(long, env = "TXN_IMPORT_LOG", default_value = "info")]
    log_level: String,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    upload_dir: PathBuf,
}

impl AppState {
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
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
}

/// Error response: status code plus message
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        let status = if err.is_input_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(status = %self.status, "{}", self.message);

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Transactions listing with the balance
#[derive(Serialize)]
struct TransactionsResponse {
    transactions: Vec<TransactionRecord>,
    balance: Balance,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/transactions - All transactions plus balance
async fn get_transactions(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TransactionsResponse>>, ApiError> {
    let conn = state.conn()?;

    let transactions = list_transactions(&conn)?;
    let balance = get_balance(&conn)?;

    Ok(Json(ApiResponse::ok(TransactionsResponse {
        transactions,
        balance,
    })))
}

/// GET /api/categories - All categories
async fn get_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let conn = state.conn()?;

    Ok(Json(ApiResponse::ok(list_categories(&conn)?)))
}

/// POST /api/transactions/import - Body is the CSV file content
async fn import_transactions(
    State(state): State<AppState>,
    body: String,
) -> Result<(StatusCode, Json<ApiResponse<Vec<Transaction>>>), ApiError> {
    let path = state
        .upload_dir
        .join(format!("import-{}.csv", uuid::Uuid::new_v4()));

    std::fs::write(&path, body).map_err(|e| {
        ApiError::internal(format!("Failed to store upload {}: {}", path.display(), e))
    })?;

    let mut conn = state.conn()?;

    match Importer::new(&mut conn).execute(&path) {
        Ok(outcome) => {
            if let Some(err) = &outcome.cleanup_error {
                tracing::warn!("{}", err);
            }
            Ok((StatusCode::CREATED, Json(ApiResponse::ok(outcome.into_transactions()))))
        }
        Err(err) => {
            // The importer only deletes the file after a successful commit
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "could not remove failed upload");
            }
            Err(err.into())
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/transactions", get(get_transactions))
        .route("/transactions/import", post(import_transactions))
        .route("/categories", get(get_categories))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level);
    tracing::info!("txn-import-server v{} starting", VERSION);

    let conn = Connection::open(&args.database)
        .with_context(|| format!("Failed to open database {}", args.database.display()))?;
    setup_database(&conn).context("Failed to initialize database schema")?;
    tracing::info!(database = %args.database.display(), "database opened");

    let upload_dir = args.upload_dir.unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&upload_dir)
        .with_context(|| format!("Failed to create upload dir {}", upload_dir.display()))?;

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        upload_dir,
    };

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    tracing::info!("server running on http://{}", args.bind);
    println!("🚀 Server running on http://{}", args.bind);
    println!("   API: http://{}/api/transactions", args.bind);

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_state(upload_dir: &Path) -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        AppState {
            db: Arc::new(Mutex::new(conn)),
            upload_dir: upload_dir.to_path_buf(),
        }
    }

    fn uploads_left(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn test_input_errors_map_to_bad_request() {
        let missing = ImportError::InputAccess {
            path: PathBuf::from("missing.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let malformed = ImportError::MalformedInput {
            path: PathBuf::from("bad.csv"),
            source: txn_import::parser::parse_csv_bytes(b"title,type\n\xff,outcome\n").unwrap_err(),
        };

        assert_eq!(ApiError::from(missing).status, StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(malformed).status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_errors_map_to_internal_error() {
        let store = ImportError::Persistence(rusqlite::Error::QueryReturnedNoRows);

        let err = ApiError::from(store);

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_import_returns_created() {
        let dir = TempDir::new().unwrap();
        let state = test_state(dir.path());
        let body = "title,type,value,category\ncoffee,outcome,4.50,food\nsalary,income,2000,\n";

        let Ok((status, Json(response))) =
            import_transactions(State(state.clone()), body.to_string()).await
        else {
            panic!("import should succeed");
        };

        assert_eq!(status, StatusCode::CREATED);
        assert!(response.success);
        assert_eq!(response.data.map(|txs| txs.len()), Some(2));
        assert_eq!(uploads_left(&dir), 0);

        let Ok(Json(listing)) = get_transactions(State(state)).await else {
            panic!("listing should succeed");
        };
        let listing = listing.data.unwrap();
        assert_eq!(listing.transactions.len(), 2);
        assert_eq!(listing.balance.total, 2000.0 - 4.5);
    }

    #[tokio::test]
    async fn test_import_store_failure_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let state = test_state(dir.path());
        state
            .db
            .lock()
            .unwrap()
            .execute("DROP TABLE transactions", [])
            .unwrap();

        let result = import_transactions(
            State(state),
            "title,type,value,category\ncoffee,outcome,4.50,food\n".to_string(),
        )
        .await;

        let Err(err) = result else {
            panic!("import should fail");
        };
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(uploads_left(&dir), 0, "failed upload is removed");
    }

    #[tokio::test]
    async fn test_unwritable_upload_dir_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir.path().join("missing"));

        let Err(err) = import_transactions(State(state), String::new()).await else {
            panic!("upload should fail");
        };

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
