//! MongoDB connection management.
//!
//! Connects once at startup and answers the replica-set/write-command
//! capability queries the batching stage needs.

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;

use crate::error::Result;

/// A connected client plus the capability facts the pipeline needs to shape
/// its batching and write-concern behavior.
pub struct ConnectionManager {
    client: Client,
    is_replica_set: bool,
    supports_write_commands: bool,
}

impl ConnectionManager {
    /// Connect to `uri`, disabling the socket timeout (bulk inserts may take
    /// arbitrarily long to acknowledge, per §5), and probe the deployment's
    /// topology via `hello`.
    pub async fn connect(uri: &str) -> Result<Self> {
        if !crate::utils::validate::is_valid_connection_uri(uri) {
            return Err(crate::error::ImportError::InvalidConfiguration(format!(
                "'{uri}' is not a mongodb:// or mongodb+srv:// URI"
            )));
        }

        let mut options = ClientOptions::parse(uri).await?;
        options.socket_timeout = None;
        let client = Client::with_options(options)?;

        let hello = client
            .database("admin")
            .run_command(doc! { "hello": 1 })
            .await?;

        let is_replica_set = hello.get_str("setName").is_ok();
        let max_wire_version = hello.get_i32("maxWireVersion").unwrap_or(0);
        // Write commands (insert/update/delete as commands rather than legacy
        // opcodes) have been universally supported since wire version 2;
        // every server this driver can talk to satisfies it, but the check is
        // kept explicit since the batching stage's byte cap depends on it.
        let supports_write_commands = max_wire_version >= 2;

        tracing::info!(
            is_replica_set,
            supports_write_commands,
            "connected to MongoDB deployment"
        );

        Ok(Self {
            client,
            is_replica_set,
            supports_write_commands,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn is_replica_set(&self) -> bool {
        self.is_replica_set
    }

    pub fn supports_write_commands(&self) -> bool {
        self.supports_write_commands
    }
}
