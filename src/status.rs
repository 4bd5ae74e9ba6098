//! Derived billing status.
//!
//! Neither status is stored: both are recomputed from `paid_out`, `due_date`
//! and the current instant every time a record or client is read.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use time::{Date, OffsetDateTime};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Payed,
    Pending,
    Expired,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ClientStatus {
    UpToDate,
    Defaulter,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Payed => "payed",
            RecordStatus::Pending => "pending",
            RecordStatus::Expired => "expired",
        }
    }
}

impl ClientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientStatus::UpToDate => "up-to-date",
            ClientStatus::Defaulter => "defaulter",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for RecordStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "payed" => Ok(RecordStatus::Payed),
            "pending" => Ok(RecordStatus::Pending),
            "expired" => Ok(RecordStatus::Expired),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl FromStr for ClientStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "up-to-date" => Ok(ClientStatus::UpToDate),
            "defaulter" => Ok(ClientStatus::Defaulter),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Status of a single charge at instant `now`.
///
/// Payment wins over the due date: a paid charge is `Payed` even when overdue.
pub fn record_status(paid_out: bool, due_date: OffsetDateTime, now: OffsetDateTime) -> RecordStatus {
    if paid_out {
        RecordStatus::Payed
    } else if due_date < now {
        RecordStatus::Expired
    } else {
        RecordStatus::Pending
    }
}

/// Instant at which a calendar due date starts counting: midnight UTC.
pub fn due_instant(due_date: Date) -> OffsetDateTime {
    due_date.midnight().assume_utc()
}

pub fn record_status_on(paid_out: bool, due_date: Date, now: OffsetDateTime) -> RecordStatus {
    record_status(paid_out, due_instant(due_date), now)
}

/// Aggregate status of a client from the statuses of the records it owns.
pub fn client_status<I>(statuses: I) -> ClientStatus
where
    I: IntoIterator<Item = RecordStatus>,
{
    if statuses
        .into_iter()
        .any(|status| status == RecordStatus::Expired)
    {
        ClientStatus::Defaulter
    } else {
        ClientStatus::UpToDate
    }
}
