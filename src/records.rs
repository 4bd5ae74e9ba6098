use std::collections::HashMap;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use time::OffsetDateTime;

use crate::auth::Principal;
use crate::clients::find_client_profile;
use crate::constants::*;
use crate::error::{AppError, ValidJson, ValidPath, ValidQuery};
use crate::listing::{
    ListItem, SortDirection, SortField, filter_by_name, filter_by_status, paginate, sort_by,
};
use crate::models::{
    CreateRecordPayload, ListRecordsQuery, ListRecordsResponse, Record, RecordEntry,
    UpdateRecordPayload,
};
use crate::status::{RecordStatus, record_status_on};
use crate::utils::{
    db_error_with_context, normalize_search, parse_date, round_cents, validate_page,
    validate_per_page, validate_string_length, validate_value,
};
use crate::{AppState, Db};

const RECORD_COLUMNS: &str = "id, id_clients, description, due_date, value, paid_out";

impl ListItem for RecordEntry {
    type Status = RecordStatus;

    fn id(&self) -> i64 {
        self.record.id
    }

    fn first_name(&self) -> &str {
        &self.client_first_name
    }

    fn last_name(&self) -> &str {
        &self.client_last_name
    }

    fn status(&self) -> RecordStatus {
        self.record.status
    }
}

pub fn validate_record_description(description: &str) -> Result<(), AppError> {
    validate_string_length(description, "description", MAX_DESCRIPTION_LENGTH)
}

/// Reads a record row (in `RECORD_COLUMNS` order) and derives its status at `now`.
pub fn extract_record_from_row(row: &libsql::Row, now: OffsetDateTime) -> Result<Record, AppError> {
    let invalid = |e: libsql::Error| db_error_with_context("invalid record data", e);

    let id: i64 = row.get(0).map_err(invalid)?;
    let id_clients: i64 = row.get(1).map_err(invalid)?;
    let description: String = row.get(2).map_err(invalid)?;
    let due_date: String = row.get(3).map_err(invalid)?;
    let value: f64 = row.get(4).map_err(invalid)?;
    let paid_out = row.get::<i64>(5).map_err(invalid)? != 0;

    let due = parse_date(&due_date)
        .map_err(|_| AppError::internal(format!("record {} has a malformed due date", id)))?;

    Ok(Record {
        id,
        id_clients,
        description,
        due_date,
        value,
        paid_out,
        status: record_status_on(paid_out, due, now),
    })
}

pub async fn find_record(db: &Db, record_id: i64, now: OffsetDateTime) -> Result<Option<Record>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM records WHERE id = ?", RECORD_COLUMNS),
            [record_id],
        )
        .await
        .map_err(|e| db_error_with_context("failed to query record", e))?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_record_from_row(&row, now)?)),
        None => Ok(None),
    }
}

/// Records owed by one client, ordered by id.
pub async fn records_for_client(
    db: &Db,
    client_id: i64,
    now: OffsetDateTime,
) -> Result<Vec<Record>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!(
                "SELECT {} FROM records WHERE id_clients = ? ORDER BY id ASC",
                RECORD_COLUMNS
            ),
            [client_id],
        )
        .await
        .map_err(|e| db_error_with_context("failed to query client records", e))?;

    let mut records = Vec::new();
    while let Some(row) = rows.next().await? {
        records.push(extract_record_from_row(&row, now)?);
    }
    Ok(records)
}

/// Status of every record, grouped by the owning client id.
pub async fn statuses_by_client(
    db: &Db,
    now: OffsetDateTime,
) -> Result<HashMap<i64, Vec<RecordStatus>>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(&format!("SELECT {} FROM records", RECORD_COLUMNS), ())
        .await
        .map_err(|e| db_error_with_context("failed to query records", e))?;

    let mut statuses: HashMap<i64, Vec<RecordStatus>> = HashMap::new();
    while let Some(row) = rows.next().await? {
        let record = extract_record_from_row(&row, now)?;
        statuses
            .entry(record.id_clients)
            .or_default()
            .push(record.status);
    }
    Ok(statuses)
}

/// Every record joined with its client's name, ordered by id.
pub async fn load_record_entries(db: &Db, now: OffsetDateTime) -> Result<Vec<RecordEntry>, AppError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT r.id, r.id_clients, r.description, r.due_date, r.value, r.paid_out, c.first_name, c.last_name \
             FROM records r JOIN clients c ON c.id = r.id_clients ORDER BY r.id ASC",
            (),
        )
        .await
        .map_err(|e| db_error_with_context("failed to query records", e))?;

    let mut entries = Vec::new();
    while let Some(row) = rows.next().await? {
        let record = extract_record_from_row(&row, now)?;
        let client_first_name: String = row
            .get(6)
            .map_err(|e| db_error_with_context("invalid record data", e))?;
        let client_last_name: String = row
            .get(7)
            .map_err(|e| db_error_with_context("invalid record data", e))?;

        entries.push(RecordEntry {
            record,
            client_name: format!("{} {}", client_first_name, client_last_name),
            client_first_name,
            client_last_name,
        });
    }
    Ok(entries)
}

/// Sum of `value` over the given records, rounded to cents.
pub fn total_value<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a Record>,
{
    round_cents(records.into_iter().map(|record| record.value).sum())
}

pub async fn register_record(
    State(app_state): State<AppState>,
    _principal: Principal,
    ValidJson(payload): ValidJson<CreateRecordPayload>,
) -> Result<(StatusCode, Json<Record>), AppError> {
    validate_record_description(&payload.description)?;
    let due = parse_date(&payload.due_date)?;
    validate_value(payload.value)?;

    if find_client_profile(&app_state.main_db, payload.id_clients)
        .await?
        .is_none()
    {
        return Err(AppError::not_found("id", ERR_CLIENT_NOT_FOUND));
    }

    let description = payload.description.trim().to_string();
    let due_date = due.to_string();

    let record_id = {
        let conn = app_state.main_db.write().await;
        conn.execute(
            "INSERT INTO records (id_clients, description, due_date, value, paid_out) VALUES (?, ?, ?, ?, ?)",
            (
                payload.id_clients,
                description.as_str(),
                due_date.as_str(),
                payload.value,
                i64::from(payload.paid_out),
            ),
        )
        .await
        .map_err(|e| db_error_with_context("record creation failed", e))?;
        conn.last_insert_rowid()
    };

    let status = record_status_on(payload.paid_out, due, OffsetDateTime::now_utc());
    tracing::info!(record_id, client_id = payload.id_clients, %status, "record registered");

    Ok((
        StatusCode::CREATED,
        Json(Record {
            id: record_id,
            id_clients: payload.id_clients,
            description,
            due_date,
            value: payload.value,
            paid_out: payload.paid_out,
            status,
        }),
    ))
}

pub async fn get_record(
    State(app_state): State<AppState>,
    _principal: Principal,
    ValidPath(record_id): ValidPath<i64>,
) -> Result<(StatusCode, Json<Record>), AppError> {
    let record = find_record(&app_state.main_db, record_id, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| AppError::not_found("id", ERR_RECORD_NOT_FOUND))?;

    Ok((StatusCode::OK, Json(record)))
}

pub async fn list_records(
    State(app_state): State<AppState>,
    _principal: Principal,
    ValidQuery(query): ValidQuery<ListRecordsQuery>,
) -> Result<(StatusCode, Json<ListRecordsResponse>), AppError> {
    let page = validate_page(query.page)?;
    let per_page = validate_per_page(query.per_page)?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<RecordStatus>)
        .transpose()
        .map_err(|e| AppError::validation("status", e.to_string()))?;
    let name = normalize_search(query.name.as_deref())?;

    // orderID wins over orderName; neither means ascending id
    let (field, direction) = match (query.order_id.as_deref(), query.order_name.as_deref()) {
        (Some(order), _) => (SortField::Id, SortDirection::from_query(Some(order))),
        (None, Some(order)) => (SortField::FirstName, SortDirection::from_query(Some(order))),
        (None, None) => (SortField::Id, SortDirection::Asc),
    };

    let now = OffsetDateTime::now_utc();
    let mut entries = load_record_entries(&app_state.main_db, now).await?;

    if let Some(status) = status {
        entries = filter_by_status(entries, status);
    }
    if let Some(name) = name {
        entries = filter_by_name(entries, name);
    }
    if entries.is_empty() {
        return Err(AppError::not_found("data", ERR_NO_RECORDS));
    }

    let value_sum = status.map(|_| total_value(entries.iter().map(|entry| &entry.record)));

    let entries = sort_by(entries, field, direction);
    let page = paginate(entries, page, per_page)
        .map_err(|_| AppError::not_found("page", ERR_NO_RECORDS))?;

    Ok((
        StatusCode::OK,
        Json(ListRecordsResponse {
            page: page.page,
            total_pages: page.total_pages,
            total_records: page.total_items,
            total_value: value_sum,
            records: page.items,
        }),
    ))
}

pub async fn update_record(
    State(app_state): State<AppState>,
    _principal: Principal,
    ValidPath(record_id): ValidPath<i64>,
    ValidJson(payload): ValidJson<UpdateRecordPayload>,
) -> Result<StatusCode, AppError> {
    validate_record_description(&payload.description)?;
    let due = parse_date(&payload.due_date)?;
    validate_value(payload.value)?;

    let conn = app_state.main_db.write().await;
    let affected_rows = conn
        .execute(
            "UPDATE records SET description = ?, due_date = ?, value = ?, paid_out = ? WHERE id = ?",
            (
                payload.description.trim(),
                due.to_string(),
                payload.value,
                i64::from(payload.paid_out),
                record_id,
            ),
        )
        .await
        .map_err(|e| db_error_with_context("failed to update record", e))?;

    if affected_rows == 0 {
        return Err(AppError::not_found("id", ERR_RECORD_NOT_FOUND));
    }

    tracing::info!(record_id, paid_out = payload.paid_out, "record updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_record(
    State(app_state): State<AppState>,
    _principal: Principal,
    ValidPath(record_id): ValidPath<i64>,
) -> Result<StatusCode, AppError> {
    let conn = app_state.main_db.write().await;

    let affected_rows = conn
        .execute("DELETE FROM records WHERE id = ?", [record_id])
        .await
        .map_err(|e| db_error_with_context("failed to delete record", e))?;

    if affected_rows == 0 {
        return Err(AppError::not_found("id", ERR_RECORD_NOT_FOUND));
    }

    tracing::info!(record_id, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}
