use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::{
    error::{AppError, Result},
    models::user::User,
};

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id").map_err(|_| AppError::Internal("Missing column: id".to_string()))?,
        name: row.try_get("name").map_err(|_| AppError::Internal("Missing column: name".to_string()))?,
        password: row.try_get("password").map_err(|_| AppError::Internal("Missing column: password".to_string()))?,
    })
}

/// Finds a user by their email address.
///
/// This is the single query the gateway issues against the credential store:
/// resolve an identifier to at most one principal. Secret verification
/// happens in the service layer, never inside the SQL.
///
/// # Arguments
///
/// * `pool` - The database connection pool.
/// * `email` - The submitted identifier.
///
/// # Returns
///
/// A `Result` containing the matching `User`, if any.
pub async fn find_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, name, password
            FROM users
            WHERE email = $1
            "#,
            &[&email],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}
