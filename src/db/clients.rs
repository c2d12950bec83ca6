use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use tracing::info;

use crate::models::{Client, ClientStatus, ClientType};

/// Rows written on first launch: (id, name, type, email, status, created,
/// updated, updated by).
const SEED_CLIENTS: &[(i64, &str, &str, &str, &str, &str, &str, &str)] = &[
    (10, "John Doe", "Individual", "johndoe@email.com", "Active", "2024-01-15", "2024-01-20T14:45", "Admin"),
    (11, "Test Test", "Individual", "test@test.com", "Active", "2024-01-10", "2024-01-18T16:20", "Admin"),
    (12, "Matty Jason", "Company", "Matty@Jason.com", "Inactive", "2024-01-05", "2024-01-25T11:30", "Admin 2"),
    (13, "Bruke Lancer", "Individual", "brukelancer@email.com", "Active", "2024-01-20", "2024-01-22T09:10", "system"),
    (14, "Cicily Inc", "Company", "contact@cicily.com", "Active", "2024-01-12", "2024-01-24T15:55", "manager"),
    (15, "Sammy Wills", "Individual", "sammyw@email.com", "Inactive", "2024-01-08", "2024-01-15T10:25", "admin 2"),
    (16, "Techno Games Pvt Ltd", "Company", "info@technogames.com", "Active", "2024-01-25", "2024-01-26T12:40", "system"),
    (17, "Jitu Brown", "Individual", "brownjitu@email.com", "Active", "2024-01-03", "2024-01-28T18:15", "manager"),
    (18, "Eliana Patel", "Company", "eliana@patel.com", "Inactive", "2024-01-18", "2024-01-20T17:30", "manager"),
    (19, "Elie Patel", "Company", "eli@patel.com", "Inactive", "2024-01-18", "2024-01-20T17:30", "manager 2"),
];

/// Load every client, seeding the sample set when the table is empty.
pub fn load_or_seed_clients(conn: &Connection) -> Result<Vec<Client>> {
    let existing = fetch_clients(conn)?;
    if !existing.is_empty() {
        return Ok(existing);
    }
    let seeded = seed_clients(conn)?;
    info!(seeded, "seeded sample clients");
    fetch_clients(conn)
}

/// Insert the sample clients. Returns the number of rows written.
pub fn seed_clients(conn: &Connection) -> Result<usize> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to start seed transaction")?;
    let mut written = 0;
    for (id, name, client_type, email, status, created_at, updated_at, updated_by) in SEED_CLIENTS {
        written += tx
            .execute(
                "INSERT OR IGNORE INTO clients
                    (id, name, client_type, email, status, created_at, updated_at, updated_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![id, name, client_type, email, status, created_at, updated_at, updated_by],
            )
            .context("failed to insert seed client")?;
    }
    tx.commit().context("failed to commit seed clients")?;
    Ok(written)
}

/// Retrieve every client in storage order (by id). This is the order shown
/// while no sort rule is committed.
pub fn fetch_clients(conn: &Connection) -> Result<Vec<Client>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, client_type, email, status, created_at, updated_at, updated_by
             FROM clients ORDER BY id",
        )
        .context("failed to prepare client query")?;

    let clients = stmt
        .query_map([], client_from_row)
        .context("failed to load clients")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect clients")?;

    Ok(clients)
}

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    let client_type: String = row.get(2)?;
    let status: String = row.get(4)?;
    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        client_type: client_type
            .parse::<ClientType>()
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, err.into()))?,
        email: row.get(3)?,
        status: status
            .parse::<ClientStatus>()
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, err.into()))?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        updated_by: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn insert(conn: &Connection, client: &Client) {
        conn.execute(
            "INSERT INTO clients
                (id, name, client_type, email, status, created_at, updated_at, updated_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                client.id,
                client.name,
                client.client_type.as_str(),
                client.email,
                client.status.as_str(),
                client.created_at,
                client.updated_at,
                client.updated_by,
            ],
        )
        .unwrap();
    }

    #[test]
    fn first_load_seeds_sample_clients() {
        let conn = open_in_memory().unwrap();
        let clients = load_or_seed_clients(&conn).unwrap();
        assert_eq!(clients.len(), SEED_CLIENTS.len());
        assert_eq!(clients[0].name, "John Doe");
        assert_eq!(clients[2].client_type, ClientType::Company);
        assert_eq!(clients[2].status, ClientStatus::Inactive);
    }

    #[test]
    fn existing_rows_are_not_reseeded() {
        let conn = open_in_memory().unwrap();
        let client = Client {
            id: 1,
            name: "Solo".into(),
            client_type: ClientType::Individual,
            email: "solo@example.com".into(),
            status: ClientStatus::Active,
            created_at: "2024-02-01".into(),
            updated_at: "2024-02-02T08:00".into(),
            updated_by: "Admin".into(),
        };
        insert(&conn, &client);

        let clients = load_or_seed_clients(&conn).unwrap();
        assert_eq!(clients, vec![client]);
    }

    #[test]
    fn seeding_twice_is_harmless() {
        let conn = open_in_memory().unwrap();
        assert_eq!(seed_clients(&conn).unwrap(), SEED_CLIENTS.len());
        assert_eq!(seed_clients(&conn).unwrap(), 0);
        assert_eq!(fetch_clients(&conn).unwrap().len(), SEED_CLIENTS.len());
    }
}
