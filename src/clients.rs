use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use libsql::{Connection, params::Params};
use time::OffsetDateTime;

use crate::auth::Principal;
use crate::constants::*;
use crate::error::{AppError, ValidJson, ValidPath, ValidQuery};
use crate::format::{format_cpf, format_name, format_phone};
use crate::listing::{
    ListItem, SortDirection, SortField, filter_by_name, filter_by_status, paginate, sort_by,
};
use crate::models::{
    Client, ClientDetail, ClientPayload, ClientProfile, GetClientQuery, ListClientsQuery,
    ListClientsResponse,
};
use crate::records::{records_for_client, statuses_by_client};
use crate::status::{ClientStatus, client_status};
use crate::transaction::with_transaction;
use crate::utils::{
    db_error_with_context, normalize_search, trimmed, validate_cpf, validate_email,
    validate_optional_string, validate_page, validate_per_page, validate_phone,
    validate_string_length, validate_uf, validate_zip_code,
};
use crate::{AppState, Db};

const CLIENT_COLUMNS: &str =
    "id, first_name, last_name, email, cpf, phone, address, complement, zip_code, district, city, uf";

impl ListItem for Client {
    type Status = ClientStatus;

    fn id(&self) -> i64 {
        self.profile.id
    }

    fn first_name(&self) -> &str {
        &self.profile.first_name
    }

    fn last_name(&self) -> &str {
        &self.profile.last_name
    }

    fn status(&self) -> ClientStatus {
        self.status
    }
}

pub fn validate_client_payload(payload: &ClientPayload) -> Result<(), AppError> {
    validate_string_length(&payload.first_name, "firstName", MAX_NAME_LENGTH)?;
    validate_string_length(&payload.last_name, "lastName", MAX_NAME_LENGTH)?;
    validate_email(&payload.email)?;
    validate_cpf(&payload.cpf)?;
    validate_phone(&payload.phone)?;
    validate_optional_string(payload.address.as_deref(), "address", MAX_ADDRESS_LENGTH)?;
    validate_optional_string(
        payload.complement.as_deref(),
        "complement",
        MAX_ADDRESS_LENGTH,
    )?;
    validate_optional_string(payload.district.as_deref(), "district", MAX_ADDRESS_LENGTH)?;
    validate_optional_string(payload.city.as_deref(), "city", MAX_ADDRESS_LENGTH)?;
    if let Some(ref zip_code) = payload.zip_code {
        validate_zip_code(zip_code)?;
    }
    if let Some(ref uf) = payload.uf {
        validate_uf(uf)?;
    }
    Ok(())
}

/// Column values in `CLIENT_COLUMNS` order, without the id.
fn client_values(payload: &ClientPayload) -> Vec<libsql::Value> {
    vec![
        payload.first_name.trim().into(),
        payload.last_name.trim().into(),
        payload.email.trim().into(),
        payload.cpf.trim().into(),
        payload.phone.trim().into(),
        trimmed(payload.address.as_deref()).into(),
        trimmed(payload.complement.as_deref()).into(),
        trimmed(payload.zip_code.as_deref()).into(),
        trimmed(payload.district.as_deref()).into(),
        trimmed(payload.city.as_deref()).into(),
        trimmed(payload.uf.as_deref()).into(),
    ]
}

pub fn extract_client_from_row(row: &libsql::Row) -> Result<ClientProfile, AppError> {
    let invalid = |e: libsql::Error| db_error_with_context("invalid client data", e);

    Ok(ClientProfile {
        id: row.get(0).map_err(invalid)?,
        first_name: row.get(1).map_err(invalid)?,
        last_name: row.get(2).map_err(invalid)?,
        email: row.get(3).map_err(invalid)?,
        cpf: row.get(4).map_err(invalid)?,
        phone: row.get(5).map_err(invalid)?,
        address: row.get(6).map_err(invalid)?,
        complement: row.get(7).map_err(invalid)?,
        zip_code: row.get(8).map_err(invalid)?,
        district: row.get(9).map_err(invalid)?,
        city: row.get(10).map_err(invalid)?,
        uf: row.get(11).map_err(invalid)?,
    })
}

pub async fn find_client_profile(db: &Db, client_id: i64) -> Result<Option<ClientProfile>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM clients WHERE id = ?", CLIENT_COLUMNS),
            [client_id],
        )
        .await
        .map_err(|e| db_error_with_context("failed to query client", e))?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_client_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Fails with a conflict when another client already holds `email` or `cpf`.
///
/// Callers hold the write guard across this check and their own write.
pub async fn ensure_client_unique(
    conn: &Connection,
    email: &str,
    cpf: &str,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    let exclude_id = exclude_id.unwrap_or(-1);

    let mut rows = conn
        .query(
            "SELECT email, cpf FROM clients WHERE (email = ? OR cpf = ?) AND id != ? LIMIT 1",
            (email, cpf, exclude_id),
        )
        .await
        .map_err(|e| db_error_with_context("failed to check existing client", e))?;

    if let Some(row) = rows.next().await? {
        let existing_email: String = row.get(0)?;
        if existing_email == email {
            return Err(AppError::conflict("email", ERR_EMAIL_TAKEN));
        }
        return Err(AppError::conflict("cpf", ERR_CPF_TAKEN));
    }

    Ok(())
}

/// Every client with its status derived from its records at `now`.
pub async fn load_clients(db: &Db, now: OffsetDateTime) -> Result<Vec<Client>, AppError> {
    let profiles = {
        let conn = db.read().await;
        let mut rows = conn
            .query(&format!("SELECT {} FROM clients", CLIENT_COLUMNS), ())
            .await
            .map_err(|e| db_error_with_context("failed to query clients", e))?;

        let mut profiles = Vec::new();
        while let Some(row) = rows.next().await? {
            profiles.push(extract_client_from_row(&row)?);
        }
        profiles
    };

    let mut statuses = statuses_by_client(db, now).await?;

    Ok(profiles
        .into_iter()
        .map(|profile| {
            let status = client_status(statuses.remove(&profile.id).unwrap_or_default());
            Client { profile, status }
        })
        .collect())
}

/// Display form of a client: capitalized names, punctuated cpf and phone.
pub fn format_client(mut client: Client) -> Client {
    client.profile.first_name = format_name(&client.profile.first_name);
    client.profile.last_name = format_name(&client.profile.last_name);
    client.profile.cpf = format_cpf(&client.profile.cpf);
    client.profile.phone = format_phone(&client.profile.phone);
    client
}

pub async fn register_client(
    State(app_state): State<AppState>,
    _principal: Principal,
    ValidJson(payload): ValidJson<ClientPayload>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    validate_client_payload(&payload)?;

    let client_id = {
        let conn = app_state.main_db.write().await;
        ensure_client_unique(&conn, payload.email.trim(), payload.cpf.trim(), None).await?;
        conn.execute(
            "INSERT INTO clients (first_name, last_name, email, cpf, phone, address, complement, zip_code, district, city, uf) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            Params::Positional(client_values(&payload)),
        )
        .await
        .map_err(|e| db_error_with_context("client creation failed", e))?;
        conn.last_insert_rowid()
    };

    let profile = find_client_profile(&app_state.main_db, client_id)
        .await?
        .ok_or_else(|| AppError::internal("client vanished after insert"))?;

    tracing::info!(client_id, "client registered");
    Ok((
        StatusCode::CREATED,
        Json(Client {
            profile,
            status: ClientStatus::UpToDate,
        }),
    ))
}

pub async fn get_client(
    State(app_state): State<AppState>,
    _principal: Principal,
    ValidPath(client_id): ValidPath<i64>,
    ValidQuery(query): ValidQuery<GetClientQuery>,
) -> Result<(StatusCode, Json<ClientDetail>), AppError> {
    let profile = find_client_profile(&app_state.main_db, client_id)
        .await?
        .ok_or_else(|| AppError::not_found("id", ERR_CLIENT_NOT_FOUND))?;

    let now = OffsetDateTime::now_utc();
    let mut records = records_for_client(&app_state.main_db, client_id, now).await?;
    if SortDirection::from_query(query.order.as_deref()) == SortDirection::Desc {
        records.reverse();
    }

    let status = client_status(records.iter().map(|record| record.status));

    Ok((
        StatusCode::OK,
        Json(ClientDetail {
            client: Client { profile, status },
            records,
        }),
    ))
}

pub async fn list_clients(
    State(app_state): State<AppState>,
    _principal: Principal,
    ValidQuery(query): ValidQuery<ListClientsQuery>,
) -> Result<(StatusCode, Json<ListClientsResponse>), AppError> {
    let page = validate_page(query.page)?;
    let per_page = validate_per_page(query.per_page)?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ClientStatus>)
        .transpose()
        .map_err(|e| AppError::validation("status", e.to_string()))?;
    let name = normalize_search(query.name.as_deref())?;

    let now = OffsetDateTime::now_utc();
    let mut clients = load_clients(&app_state.main_db, now).await?;

    if let Some(status) = status {
        clients = filter_by_status(clients, status);
    }
    if let Some(name) = name {
        clients = filter_by_name(clients, name);
    }
    if clients.is_empty() {
        return Err(AppError::not_found("data", ERR_NO_CLIENTS));
    }

    let clients = sort_by(
        clients,
        SortField::FirstName,
        SortDirection::from_query(query.order.as_deref()),
    );
    let page = paginate(clients, page, per_page)
        .map_err(|_| AppError::not_found("page", ERR_NO_CLIENTS))?;

    Ok((
        StatusCode::OK,
        Json(ListClientsResponse {
            page: page.page,
            total_pages: page.total_pages,
            total_clients: page.total_items,
            clients: page.items.into_iter().map(format_client).collect(),
        }),
    ))
}

pub async fn update_client(
    State(app_state): State<AppState>,
    _principal: Principal,
    ValidPath(client_id): ValidPath<i64>,
    ValidJson(payload): ValidJson<ClientPayload>,
) -> Result<StatusCode, AppError> {
    validate_client_payload(&payload)?;

    if find_client_profile(&app_state.main_db, client_id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found("id", ERR_CLIENT_NOT_FOUND));
    }

    let mut values = client_values(&payload);
    values.push(client_id.into());

    let conn = app_state.main_db.write().await;
    ensure_client_unique(
        &conn,
        payload.email.trim(),
        payload.cpf.trim(),
        Some(client_id),
    )
    .await?;
    let affected_rows = conn
        .execute(
            "UPDATE clients SET first_name = ?, last_name = ?, email = ?, cpf = ?, phone = ?, address = ?, complement = ?, zip_code = ?, district = ?, city = ?, uf = ? WHERE id = ?",
            Params::Positional(values),
        )
        .await
        .map_err(|e| db_error_with_context("failed to update client", e))?;

    if affected_rows == 0 {
        return Err(AppError::not_found("id", ERR_CLIENT_NOT_FOUND));
    }

    tracing::info!(client_id, "client updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes the client together with all of its records, atomically.
pub async fn delete_client(
    State(app_state): State<AppState>,
    _principal: Principal,
    ValidPath(client_id): ValidPath<i64>,
) -> Result<StatusCode, AppError> {
    let removed_records = with_transaction(&app_state.main_db, |conn| {
        Box::pin(async move {
            let removed_records = conn
                .execute("DELETE FROM records WHERE id_clients = ?", [client_id])
                .await
                .map_err(|e| db_error_with_context("failed to delete client records", e))?;

            let affected_rows = conn
                .execute("DELETE FROM clients WHERE id = ?", [client_id])
                .await
                .map_err(|e| db_error_with_context("failed to delete client", e))?;

            if affected_rows == 0 {
                return Err(AppError::not_found("id", ERR_CLIENT_NOT_FOUND));
            }

            Ok(removed_records)
        })
    })
    .await?;

    tracing::info!(client_id, removed_records, "client deleted");
    Ok(StatusCode::NO_CONTENT)
}
