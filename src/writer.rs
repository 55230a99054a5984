//! The `Writer` interface: the pipeline's one seam onto the remote
//! collection. A trait object lets the pipeline be exercised against a mock
//! in tests without a live server.

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::Database;

use crate::connection::ConnectionManager;
use crate::error::Result;

#[async_trait]
pub trait Writer: Send + Sync {
    /// Run an arbitrary database command (used for the bulk `insert` command
    /// the batcher submits).
    async fn run(&self, command: bson::Document) -> Result<bson::Document>;

    /// Insert a single document (upsert mode, no matching selector).
    async fn insert(&self, doc: bson::Document) -> Result<()>;

    /// Upsert a single document: replace the document matching `selector`,
    /// inserting it if nothing matches.
    async fn upsert(&self, selector: bson::Document, doc: bson::Document) -> Result<()>;

    /// Drop the destination collection, swallowing "namespace not found".
    async fn drop_collection(&self) -> Result<()>;

    fn is_replica_set(&self) -> bool;
    fn supports_write_commands(&self) -> bool;
    fn collection_name(&self) -> &str;
}

/// The real `Writer`, backed by a `mongodb::Database` handle.
pub struct MongoWriter {
    db: Database,
    collection_name: String,
    is_replica_set: bool,
    supports_write_commands: bool,
}

impl MongoWriter {
    pub fn new(conn: &ConnectionManager, db_name: &str, collection_name: &str) -> Self {
        Self {
            db: conn.client().database(db_name),
            collection_name: collection_name.to_string(),
            is_replica_set: conn.is_replica_set(),
            supports_write_commands: conn.supports_write_commands(),
        }
    }

    fn collection(&self) -> mongodb::Collection<bson::Document> {
        self.db.collection(&self.collection_name)
    }
}

#[async_trait]
impl Writer for MongoWriter {
    async fn run(&self, command: bson::Document) -> Result<bson::Document> {
        Ok(self.db.run_command(command).await?)
    }

    async fn insert(&self, doc: bson::Document) -> Result<()> {
        self.collection().insert_one(doc).await?;
        Ok(())
    }

    async fn upsert(&self, selector: bson::Document, doc: bson::Document) -> Result<()> {
        self.collection()
            .replace_one(selector, doc)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn drop_collection(&self) -> Result<()> {
        match self.collection().drop().await {
            Ok(()) => Ok(()),
            Err(e) => {
                if is_namespace_not_found(&e) {
                    Ok(())
                } else {
                    Err(e.into())
                }
            }
        }
    }

    fn is_replica_set(&self) -> bool {
        self.is_replica_set
    }

    fn supports_write_commands(&self) -> bool {
        self.supports_write_commands
    }

    fn collection_name(&self) -> &str {
        &self.collection_name
    }
}

/// `ns not found` (code 26) is returned when dropping a collection that
/// doesn't exist; treated as success.
fn is_namespace_not_found(err: &mongodb::error::Error) -> bool {
    use mongodb::error::ErrorKind;
    matches!(err.kind.as_ref(), ErrorKind::Command(c) if c.code == 26)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// An in-memory `Writer` used by the pipeline's own tests.
    pub struct MockWriter {
        pub is_replica_set: bool,
        pub supports_write_commands: bool,
        pub responses: Mutex<Vec<bson::Document>>,
        pub inserted: Mutex<Vec<bson::Document>>,
        pub upserted: Mutex<Vec<(bson::Document, bson::Document)>>,
    }

    impl MockWriter {
        pub fn with_responses(responses: Vec<bson::Document>) -> Self {
            Self {
                is_replica_set: true,
                supports_write_commands: true,
                responses: Mutex::new(responses),
                inserted: Mutex::new(Vec::new()),
                upserted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Writer for MockWriter {
        async fn run(&self, _command: bson::Document) -> Result<bson::Document> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(doc! { "ok": 1.0, "n": 0 })
            } else {
                Ok(responses.remove(0))
            }
        }

        async fn insert(&self, doc: bson::Document) -> Result<()> {
            self.inserted.lock().unwrap().push(doc);
            Ok(())
        }

        async fn upsert(&self, selector: bson::Document, doc: bson::Document) -> Result<()> {
            self.upserted.lock().unwrap().push((selector, doc));
            Ok(())
        }

        async fn drop_collection(&self) -> Result<()> {
            Ok(())
        }

        fn is_replica_set(&self) -> bool {
            self.is_replica_set
        }

        fn supports_write_commands(&self) -> bool {
            self.supports_write_commands
        }

        fn collection_name(&self) -> &str {
            "mock"
        }
    }

    #[tokio::test]
    async fn mock_run_returns_queued_response() {
        let writer = MockWriter::with_responses(vec![doc! { "ok": 1.0, "n": 5 }]);
        let resp = writer.run(doc! { "insert": "x" }).await.unwrap();
        assert_eq!(resp.get_i32("n").unwrap(), 5);
    }
}
