use serde::{Deserialize, Serialize};

use crate::status::{ClientStatus, RecordStatus};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicUser {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            cpf: user.cpf,
            phone: user.phone,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct RegisterUserPayload {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub token: String,
}

/// Profile update; `password` is the current password and is not changed here.
#[derive(Deserialize, Debug)]
pub struct UpdateUserPayload {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct NewPasswordPayload {
    pub password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
    #[serde(rename = "confirmNewPassword")]
    pub confirm_new_password: String,
}

/// Stored columns of a client; the status is derived separately.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClientProfile {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    pub address: Option<String>,
    pub complement: Option<String>,
    pub zip_code: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub uf: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Client {
    #[serde(flatten)]
    pub profile: ClientProfile,
    pub status: ClientStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub records: Vec<Record>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ClientPayload {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    pub address: Option<String>,
    pub complement: Option<String>,
    pub zip_code: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub uf: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct GetClientQuery {
    pub order: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ListClientsQuery {
    pub order: Option<String>,
    pub status: Option<String>,
    pub name: Option<String>,
    pub page: Option<u32>,
    #[serde(rename = "perPage")]
    pub per_page: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ListClientsResponse {
    pub page: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    #[serde(rename = "totalClients")]
    pub total_clients: usize,
    pub clients: Vec<Client>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub id_clients: i64,
    pub description: String,
    pub due_date: String,
    pub value: f64,
    pub paid_out: bool,
    pub status: RecordStatus,
}

/// A record joined with the name of the client that owes it.
#[derive(Serialize, Debug, Clone)]
pub struct RecordEntry {
    #[serde(flatten)]
    pub record: Record,
    #[serde(rename = "clientName")]
    pub client_name: String,
    #[serde(skip)]
    pub client_first_name: String,
    #[serde(skip)]
    pub client_last_name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateRecordPayload {
    pub id_clients: i64,
    pub description: String,
    pub due_date: String,
    pub value: f64,
    pub paid_out: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpdateRecordPayload {
    pub description: String,
    pub due_date: String,
    pub value: f64,
    pub paid_out: bool,
}

#[derive(Deserialize, Debug, Default)]
pub struct ListRecordsQuery {
    #[serde(rename = "orderID")]
    pub order_id: Option<String>,
    #[serde(rename = "orderName")]
    pub order_name: Option<String>,
    pub status: Option<String>,
    pub name: Option<String>,
    pub page: Option<u32>,
    #[serde(rename = "perPage")]
    pub per_page: Option<u32>,
}

#[derive(Serialize, Debug)]
pub struct ListRecordsResponse {
    pub page: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    #[serde(rename = "totalRecords")]
    pub total_records: usize,
    #[serde(rename = "totalValue", skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    pub records: Vec<RecordEntry>,
}

#[derive(Serialize, Debug)]
pub struct RecordGroup {
    pub total: usize,
    pub records: Vec<RecordEntry>,
}

#[derive(Serialize, Debug)]
pub struct ClientGroup {
    pub total: usize,
    pub clients: Vec<Client>,
}

/// Dashboard totals for `GET /home`.
#[derive(Serialize, Debug)]
pub struct Summary {
    #[serde(rename = "totalValuePayed")]
    pub total_value_payed: f64,
    #[serde(rename = "totalValuePending")]
    pub total_value_pending: f64,
    #[serde(rename = "totalValueExpired")]
    pub total_value_expired: f64,
    #[serde(rename = "payedRecords")]
    pub payed_records: RecordGroup,
    #[serde(rename = "pendingRecords")]
    pub pending_records: RecordGroup,
    #[serde(rename = "expiredRecords")]
    pub expired_records: RecordGroup,
    #[serde(rename = "defaulterClients")]
    pub defaulter_clients: ClientGroup,
    #[serde(rename = "upToDateClients")]
    pub up_to_date_clients: ClientGroup,
}
