// sqlx::Error -> AppError mapping

use waitroom_core::error::AppError;

/// Convert sqlx::Error to AppError with structured information
///
/// Every store failure is a `StoreUnavailable` for the core; the message keeps
/// the SQLite detail for logs.
pub fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            match db_err.code().as_deref() {
                Some("5") | Some("517") => AppError::StoreUnavailable(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                Some("13") => {
                    AppError::StoreUnavailable(format!("Database full: {}", db_err.message()))
                }
                Some(code) => AppError::StoreUnavailable(format!(
                    "Database error [{}]: {}",
                    code,
                    db_err.message()
                )),
                None => {
                    AppError::StoreUnavailable(format!("Database error: {}", db_err.message()))
                }
            }
        }
        sqlx::Error::PoolTimedOut => {
            AppError::StoreUnavailable("Timed out waiting for a connection".to_string())
        }
        sqlx::Error::PoolClosed => AppError::StoreUnavailable("Connection pool closed".to_string()),
        sqlx::Error::Io(e) => AppError::StoreUnavailable(format!("I/O error: {}", e)),
        _ => {
            // Protocol, decode, configuration errors
            AppError::StoreUnavailable(err.to_string())
        }
    }
}
