use axum::{Json, extract::State, http::StatusCode};
use libsql::{Connection, params::Params};

use crate::auth::{Principal, hash_password, verify_password};
use crate::constants::*;
use crate::error::{AppError, ValidJson};
use crate::format::{format_cpf, format_name, format_phone};
use crate::models::{NewPasswordPayload, PublicUser, RegisterUserPayload, UpdateUserPayload, User};
use crate::utils::{
    db_error_with_context, trimmed, validate_cpf, validate_email, validate_password,
    validate_password_confirmation, validate_phone, validate_string_length,
};
use crate::{AppState, Db};

const USER_COLUMNS: &str = "id, first_name, last_name, email, cpf, phone, password_hash";

pub fn extract_user_from_row(row: &libsql::Row) -> Result<User, AppError> {
    let invalid = |e: libsql::Error| db_error_with_context("invalid user data", e);

    Ok(User {
        id: row.get(0).map_err(invalid)?,
        first_name: row.get(1).map_err(invalid)?,
        last_name: row.get(2).map_err(invalid)?,
        email: row.get(3).map_err(invalid)?,
        cpf: row.get(4).map_err(invalid)?,
        phone: row.get(5).map_err(invalid)?,
        password_hash: row.get(6).map_err(invalid)?,
    })
}

pub async fn get_user_by_id(db: &Db, user_id: i64) -> Result<Option<User>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
            [user_id],
        )
        .await
        .map_err(|e| db_error_with_context("failed to query user", e))?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_user_from_row(&row)?)),
        None => Ok(None),
    }
}

pub async fn get_user_by_email(db: &Db, email: &str) -> Result<Option<User>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
            [email],
        )
        .await
        .map_err(|e| db_error_with_context("failed to query user by email", e))?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_user_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Fails with a conflict when another user already holds `email` or `cpf`.
///
/// Callers hold the write guard across this check and their own write.
pub async fn ensure_user_unique(
    conn: &Connection,
    email: &str,
    cpf: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    let exclude_id = exclude_id.unwrap_or(-1);

    let mut rows = conn
        .query(
            "SELECT id FROM users WHERE email = ? AND id != ?",
            (email, exclude_id),
        )
        .await
        .map_err(|e| db_error_with_context("failed to check user email", e))?;
    if rows.next().await?.is_some() {
        return Err(AppError::conflict("email", ERR_EMAIL_TAKEN));
    }

    if let Some(cpf) = cpf {
        let mut rows = conn
            .query(
                "SELECT id FROM users WHERE cpf = ? AND id != ?",
                (cpf, exclude_id),
            )
            .await
            .map_err(|e| db_error_with_context("failed to check user cpf", e))?;
        if rows.next().await?.is_some() {
            return Err(AppError::conflict("cpf", ERR_CPF_TAKEN));
        }
    }

    Ok(())
}

pub fn validate_user_fields(
    first_name: &str,
    last_name: &str,
    email: &str,
    cpf: Option<&str>,
    phone: Option<&str>,
) -> Result<(), AppError> {
    validate_string_length(first_name, "firstName", MAX_NAME_LENGTH)?;
    validate_string_length(last_name, "lastName", MAX_NAME_LENGTH)?;
    validate_email(email)?;
    if let Some(cpf) = cpf {
        validate_cpf(cpf)?;
    }
    if let Some(phone) = phone {
        validate_phone(phone)?;
    }
    Ok(())
}

pub async fn insert_user(
    conn: &Connection,
    payload: &RegisterUserPayload,
    password_hash: String,
) -> Result<User, AppError> {
    let user = User {
        id: 0,
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        email: payload.email.trim().to_string(),
        cpf: trimmed(payload.cpf.as_deref()),
        phone: trimmed(payload.phone.as_deref()),
        password_hash,
    };

    conn.execute(
        "INSERT INTO users (first_name, last_name, email, cpf, phone, password_hash) VALUES (?, ?, ?, ?, ?, ?)",
        Params::Positional(vec![
            user.first_name.clone().into(),
            user.last_name.clone().into(),
            user.email.clone().into(),
            user.cpf.clone().into(),
            user.phone.clone().into(),
            user.password_hash.clone().into(),
        ]),
    )
    .await
    .map_err(|e| db_error_with_context("user creation failed", e))?;

    Ok(User {
        id: conn.last_insert_rowid(),
        ..user
    })
}

pub async fn get_user(principal: Principal) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let mut user = PublicUser::from(principal.0);
    user.first_name = format_name(&user.first_name);
    user.last_name = format_name(&user.last_name);
    user.cpf = user.cpf.as_deref().map(format_cpf);
    user.phone = user.phone.as_deref().map(format_phone);

    Ok((StatusCode::OK, Json(user)))
}

pub async fn update_user(
    State(app_state): State<AppState>,
    principal: Principal,
    ValidJson(payload): ValidJson<UpdateUserPayload>,
) -> Result<StatusCode, AppError> {
    validate_user_fields(
        &payload.first_name,
        &payload.last_name,
        &payload.email,
        payload.cpf.as_deref(),
        payload.phone.as_deref(),
    )?;

    if !verify_password(&payload.password, &principal.0.password_hash)? {
        return Err(AppError::validation("password", ERR_INVALID_PASSWORD));
    }

    let email = payload.email.trim().to_string();
    let cpf = trimmed(payload.cpf.as_deref());
    let conn = app_state.main_db.write().await;
    ensure_user_unique(&conn, &email, cpf.as_deref(), Some(principal.id())).await?;
    let affected_rows = conn
        .execute(
            "UPDATE users SET first_name = ?, last_name = ?, email = ?, cpf = ?, phone = ? WHERE id = ?",
            Params::Positional(vec![
                payload.first_name.trim().into(),
                payload.last_name.trim().into(),
                email.into(),
                cpf.into(),
                trimmed(payload.phone.as_deref()).into(),
                principal.id().into(),
            ]),
        )
        .await
        .map_err(|e| db_error_with_context("failed to update user", e))?;

    if affected_rows == 0 {
        return Err(AppError::Unauthorized);
    }

    tracing::info!(user_id = principal.id(), "user profile updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn new_password(
    State(app_state): State<AppState>,
    principal: Principal,
    ValidJson(payload): ValidJson<NewPasswordPayload>,
) -> Result<StatusCode, AppError> {
    validate_password(&payload.new_password, "newPassword")?;
    validate_password_confirmation(
        &payload.new_password,
        &payload.confirm_new_password,
        "confirmNewPassword",
    )?;

    if !verify_password(&payload.password, &principal.0.password_hash)? {
        return Err(AppError::validation("password", ERR_INVALID_PASSWORD));
    }

    let password_hash = hash_password(&payload.new_password)?;

    let conn = app_state.main_db.write().await;
    conn.execute(
        "UPDATE users SET password_hash = ? WHERE id = ?",
        (password_hash.as_str(), principal.id()),
    )
    .await
    .map_err(|e| db_error_with_context("failed to update password", e))?;

    tracing::info!(user_id = principal.id(), "user password changed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(app_state): State<AppState>,
    principal: Principal,
) -> Result<StatusCode, AppError> {
    let conn = app_state.main_db.write().await;
    let affected_rows = conn
        .execute("DELETE FROM users WHERE id = ?", [principal.id()])
        .await
        .map_err(|e| db_error_with_context("failed to delete user", e))?;

    if affected_rows == 0 {
        return Err(AppError::Unauthorized);
    }

    tracing::info!(user_id = principal.id(), "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
