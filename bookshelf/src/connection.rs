//! Database connection lifecycle.
//!
//! A [`Connection`] is opened once per run and closed once at the end. It is
//! an owned value: whoever needs the database holds it (or a [`BookStore`]
//! derived from it), there is no process-wide handle.

use mongodb::bson::doc;
use mongodb::event::EventHandler;
use mongodb::event::sdam::SdamEvent;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{BookshelfError, Result};
use crate::store::BookStore;

/// Application name reported to the server.
pub const APP_NAME: &str = "bookshelf";

/// An open connection to one database.
#[derive(Debug)]
pub struct Connection {
    client: Client,
    db: Database,
}

impl Connection {
    /// Connect and verify the server answers a `ping`.
    pub async fn connect(config: &Config) -> Result<Self> {
        info!("Connecting to the database");
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|source| BookshelfError::Connect { source })?;
        options.app_name.get_or_insert_with(|| APP_NAME.to_string());
        options.sdam_event_handler = Some(EventHandler::callback(log_topology_event));
        let uri_default = options.default_database.clone();

        let client =
            Client::with_options(options).map_err(|source| BookshelfError::Connect { source })?;
        let db = client.database(config.resolve_database(uri_default.as_deref()));

        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| BookshelfError::Connect { source })?;
        info!(database = db.name(), "Connected to the database");

        Ok(Self { client, db })
    }

    /// The selected database.
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Accessor for the `books` collection.
    pub fn books(&self) -> BookStore {
        BookStore::new(&self.db)
    }

    /// Close the connection. The driver's shutdown cannot fail; it waits for
    /// in-flight operations and then releases every pooled connection.
    pub async fn disconnect(self) {
        let Self { client, .. } = self;
        client.shutdown().await;
        info!("Disconnected from the database");
    }
}

/// Runtime topology events. Heartbeat failures are the driver's signal that
/// the server became unreachable; the next operation on the connection
/// returns the error.
fn log_topology_event(event: SdamEvent) {
    match event {
        SdamEvent::ServerHeartbeatFailed(failed) => {
            error!(
                server = %failed.server_address,
                error = %failed.failure,
                "Error occurred with the database connection"
            );
        }
        SdamEvent::ServerClosed(closed) => {
            debug!(server = %closed.address, "Server connection closed");
        }
        _ => {}
    }
}
