//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. They stay plain data holders; filtering lives in the screens and
//! ordering in the sort engine.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};

use crate::sort::{FieldKey, FieldValue, SortRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    Individual,
    Company,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Individual => "Individual",
            ClientType::Company => "Company",
        }
    }
}

impl FromStr for ClientType {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Individual" => Ok(ClientType::Individual),
            "Company" => Ok(ClientType::Company),
            other => Err(anyhow!("unknown client type `{other}`")),
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    Active,
    Inactive,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "Active",
            ClientStatus::Inactive => "Inactive",
        }
    }
}

impl FromStr for ClientStatus {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Active" => Ok(ClientStatus::Active),
            "Inactive" => Ok(ClientStatus::Inactive),
            other => Err(anyhow!("unknown client status `{other}`")),
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the client table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub client_type: ClientType,
    pub email: String,
    pub status: ClientStatus,
    /// Raw timestamps as stored. They are parsed on demand so a malformed
    /// value only affects sorting and display of that one cell.
    pub created_at: String,
    pub updated_at: String,
    pub updated_by: String,
}

impl Client {
    /// Case-insensitive match against name and email. `query` is expected
    /// to be lowercased already.
    pub fn matches_query(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query) || self.email.to_lowercase().contains(query)
    }
}

impl SortRecord for Client {
    fn field_value(&self, field: FieldKey) -> Option<FieldValue<'_>> {
        match field.as_str() {
            "id" => Some(FieldValue::Integer(self.id)),
            "name" => Some(FieldValue::Text(&self.name)),
            "type" => Some(FieldValue::Text(self.client_type.as_str())),
            "email" => Some(FieldValue::Text(&self.email)),
            "status" => Some(FieldValue::Text(self.status.as_str())),
            "createdAt" => Some(FieldValue::Text(&self.created_at)),
            "updatedAt" => Some(FieldValue::Text(&self.updated_at)),
            "updatedBy" => Some(FieldValue::Text(&self.updated_by)),
            _ => None,
        }
    }
}

/// Tabs above the table; each narrows the list to one client type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientTab {
    #[default]
    All,
    Individual,
    Company,
}

impl ClientTab {
    pub const ALL: [ClientTab; 3] = [ClientTab::All, ClientTab::Individual, ClientTab::Company];

    pub fn label(&self) -> &'static str {
        match self {
            ClientTab::All => "All",
            ClientTab::Individual => "Individual",
            ClientTab::Company => "Company",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|tab| tab == self).unwrap_or(0)
    }

    /// Neighbouring tab, wrapping around at both ends.
    pub fn cycle(&self, offset: isize) -> ClientTab {
        let len = Self::ALL.len() as isize;
        let next = (self.index() as isize + offset).rem_euclid(len);
        Self::ALL[next as usize]
    }

    pub fn admits(&self, client: &Client) -> bool {
        match self {
            ClientTab::All => true,
            ClientTab::Individual => client.client_type == ClientType::Individual,
            ClientTab::Company => client.client_type == ClientType::Company,
        }
    }
}
