pub mod query;

use sqlx::{Connection, PgConnection};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{Client, ClientChanges, ClientFilter, NewClient, Phone};

const CREATE_CLIENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS clients (
        id SERIAL PRIMARY KEY,
        first_name VARCHAR(50) NOT NULL,
        last_name VARCHAR(50) NOT NULL,
        email VARCHAR(50) NOT NULL UNIQUE
    )
"#;

const CREATE_PHONES: &str = r#"
    CREATE TABLE IF NOT EXISTS phones (
        id SERIAL PRIMARY KEY,
        client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        phone VARCHAR(15) NOT NULL
    )
"#;

/// A single PostgreSQL connection holding the clients and phones tables.
///
/// Writes are committed as they go: `add_client` and `update_client` commit
/// together with their first phone and then once per further phone, so a
/// failing phone leaves the earlier work stored. Every other writing method
/// is a single transaction.
pub struct Database {
    conn: PgConnection,
}

impl Database {
    /// Open a connection to the configured database
    pub async fn new(config: &Config) -> Result<Self> {
        let conn = PgConnection::connect(config.database_url()).await?;

        Ok(Self { conn })
    }

    /// Wrap a connection opened elsewhere
    pub fn from_connection(conn: PgConnection) -> Self {
        Self { conn }
    }

    /// Close the connection gracefully
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    // Schema operations
    pub async fn create_schema(&mut self) -> Result<()> {
        let mut tx = self.conn.begin().await?;

        sqlx::query(CREATE_CLIENTS).execute(&mut *tx).await?;
        sqlx::query(CREATE_PHONES).execute(&mut *tx).await?;

        tx.commit().await?;
        info!("schema ready");

        Ok(())
    }

    pub async fn drop_schema(&mut self) -> Result<()> {
        let mut tx = self.conn.begin().await?;

        sqlx::query("DROP TABLE IF EXISTS phones CASCADE")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DROP TABLE IF EXISTS clients CASCADE")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("schema dropped");

        Ok(())
    }

    // Client operations
    /// Insert a client and its phones, returning the new client id.
    ///
    /// The client is committed together with its first phone, then every
    /// further phone is committed on its own. A phone that fails stops the
    /// call; the client and the phones before it stay stored. If the first
    /// phone fails nothing is stored.
    pub async fn add_client(&mut self, client: &NewClient) -> Result<i32> {
        let mut phones = client.phones.iter();
        let mut tx = self.conn.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO clients (first_name, last_name, email)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(phone) = phones.next() {
            insert_phone(&mut tx, id, phone).await?;
        }

        tx.commit().await?;
        info!(client_id = id, "client added");

        for phone in phones {
            self.add_phone(id, phone).await?;
        }

        Ok(id)
    }

    /// Fetch one client by id
    pub async fn get_client(&mut self, id: i32) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT id, first_name, last_name, email FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut self.conn)
        .await?;

        Ok(client)
    }

    /// Apply `changes` to client `id`.
    ///
    /// Empty strings and an empty phone list are skipped, see
    /// [`ClientChanges`]. Fails with [`ClientError::NotFound`] if the client
    /// does not exist.
    ///
    /// Field changes and the removal of the old phones are committed with the
    /// first replacement phone; each further phone is committed on its own.
    pub async fn update_client(&mut self, id: i32, changes: &ClientChanges) -> Result<()> {
        let mut tx = self.conn.begin().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if count == 0 {
            return Err(ClientError::NotFound(id));
        }

        if let Some(mut builder) = query::update_client(id, changes) {
            debug!(sql = builder.sql(), "updating client fields");
            builder.build().execute(&mut *tx).await?;
        }

        let mut phones = changes.replacement_phones().unwrap_or_default().iter();
        if let Some(phone) = phones.next() {
            sqlx::query("DELETE FROM phones WHERE client_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_phone(&mut tx, id, phone).await?;
        }

        tx.commit().await?;
        info!(client_id = id, "client updated");

        for phone in phones {
            self.add_phone(id, phone).await?;
        }

        Ok(())
    }

    /// Delete a client; its phones go with it. Returns the number of rows removed.
    pub async fn delete_client(&mut self, id: i32) -> Result<u64> {
        let mut tx = self.conn.begin().await?;

        let removed = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        info!(client_id = id, removed, "client deleted");

        Ok(removed)
    }

    /// Search clients; see [`query::find_clients`] for how criteria combine.
    pub async fn find_clients(&mut self, filter: &ClientFilter) -> Result<Vec<Client>> {
        let Some(mut builder) = query::find_clients(filter) else {
            debug!("no search criteria given");
            return Ok(Vec::new());
        };
        debug!(sql = builder.sql(), "searching clients");

        let clients = builder
            .build_query_as::<Client>()
            .fetch_all(&mut self.conn)
            .await?;

        Ok(clients)
    }

    // Phone operations
    /// Insert one phone for an existing client
    pub async fn add_phone(&mut self, client_id: i32, phone: &str) -> Result<()> {
        let mut tx = self.conn.begin().await?;
        insert_phone(&mut tx, client_id, phone).await?;
        tx.commit().await?;
        debug!(client_id, phone, "phone added");

        Ok(())
    }

    /// Phones of one client, oldest first
    pub async fn list_phones(&mut self, client_id: i32) -> Result<Vec<Phone>> {
        let phones = sqlx::query_as::<_, Phone>(
            "SELECT id, client_id, phone FROM phones WHERE client_id = $1 ORDER BY id ASC",
        )
        .bind(client_id)
        .fetch_all(&mut self.conn)
        .await?;

        Ok(phones)
    }

    /// Delete matching phone rows of one client. Returns the number of rows removed.
    pub async fn delete_phone(&mut self, client_id: i32, phone: &str) -> Result<u64> {
        let mut tx = self.conn.begin().await?;

        let removed = sqlx::query("DELETE FROM phones WHERE client_id = $1 AND phone = $2")
            .bind(client_id)
            .bind(phone)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        debug!(client_id, phone, removed, "phone deleted");

        Ok(removed)
    }
}

async fn insert_phone(conn: &mut PgConnection, client_id: i32, phone: &str) -> Result<()> {
    sqlx::query("INSERT INTO phones (client_id, phone) VALUES ($1, $2)")
        .bind(client_id)
        .bind(phone)
        .execute(conn)
        .await?;

    Ok(())
}

/// Open the database described by `config`
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;

    Ok(db)
}
