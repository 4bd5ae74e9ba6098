use axum::{Json, extract::State, http::StatusCode};
use time::OffsetDateTime;

use crate::AppState;
use crate::auth::Principal;
use crate::clients::{format_client, load_clients};
use crate::error::AppError;
use crate::format::format_name;
use crate::listing::filter_by_status;
use crate::models::{Client, ClientGroup, RecordEntry, RecordGroup, Summary};
use crate::records::{load_record_entries, total_value};
use crate::status::{ClientStatus, RecordStatus};

fn record_group(entries: &[RecordEntry], status: RecordStatus) -> RecordGroup {
    let records = filter_by_status(entries.to_vec(), status);
    RecordGroup {
        total: records.len(),
        records,
    }
}

fn client_group(clients: &[Client], status: ClientStatus) -> ClientGroup {
    let clients: Vec<Client> = filter_by_status(clients.to_vec(), status)
        .into_iter()
        .map(format_client)
        .collect();
    ClientGroup {
        total: clients.len(),
        clients,
    }
}

fn format_entry(mut entry: RecordEntry) -> RecordEntry {
    entry.client_name = format!(
        "{} {}",
        format_name(&entry.client_first_name),
        format_name(&entry.client_last_name)
    );
    entry
}

/// Builds the dashboard from a snapshot of records and clients.
///
/// Client names, cpfs and phones are returned in display form.
pub fn summarize(entries: &[RecordEntry], clients: &[Client]) -> Summary {
    let entries: Vec<RecordEntry> = entries.iter().cloned().map(format_entry).collect();

    let payed_records = record_group(&entries, RecordStatus::Payed);
    let pending_records = record_group(&entries, RecordStatus::Pending);
    let expired_records = record_group(&entries, RecordStatus::Expired);

    Summary {
        total_value_payed: total_value(payed_records.records.iter().map(|e| &e.record)),
        total_value_pending: total_value(pending_records.records.iter().map(|e| &e.record)),
        total_value_expired: total_value(expired_records.records.iter().map(|e| &e.record)),
        payed_records,
        pending_records,
        expired_records,
        defaulter_clients: client_group(clients, ClientStatus::Defaulter),
        up_to_date_clients: client_group(clients, ClientStatus::UpToDate),
    }
}

pub async fn home(
    State(app_state): State<AppState>,
    _principal: Principal,
) -> Result<(StatusCode, Json<Summary>), AppError> {
    let now = OffsetDateTime::now_utc();
    let entries = load_record_entries(&app_state.main_db, now).await?;
    let clients = load_clients(&app_state.main_db, now).await?;

    Ok((StatusCode::OK, Json(summarize(&entries, &clients))))
}
