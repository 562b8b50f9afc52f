use std::{collections::HashSet, sync::Arc};
use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, Bson, doc};
use mea::rwlock::RwLock;
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    error::{Error as MongoError, ErrorKind},
    options::{ClientOptions, FindOptions, IndexOptions},
};
use tracing::{debug, trace};

use docmap_core::{
    backend::{StoreBackend, StoreBackendBuilder, UpsertOutcome},
    error::{StoreError, StoreResult},
    query::{Query, QueryVisitor},
    record::IDENTIFIER_FIELD,
};

use crate::{sanitizer::ValueSanitizer, query::MongoQueryTranslator};

const ID_FIELD: &str = "_id";
const NAMESPACE_EXISTS: i32 = 48;

fn unavailable(err: MongoError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// Builds the stored form of `document`: keys escaped, `_id` set to the document id.
fn prepare_document(id: String, document: &Bson) -> StoreResult<Document> {
    let mut prepared = document
        .as_document()
        .map(ValueSanitizer::sanitize_document)
        .ok_or_else(|| StoreError::InvalidDocument(format!(
            "expected a document, found {:?}",
            document.element_type()
        )))?;
    prepared.insert(ID_FIELD, id);

    Ok(prepared)
}

fn identifier_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { IDENTIFIER_FIELD: 1 })
        .options(IndexOptions::builder().unique(true).sparse(true).build())
        .build()
}

fn restore_document(mut document: Document) -> Bson {
    document.remove(ID_FIELD);
    Bson::Document(ValueSanitizer::restore_document(&document))
}


/// A [`StoreBackend`] backed by one MongoDB database.
///
/// Each collection maps to a MongoDB collection of the same (escaped) name, and each
/// document id becomes the `_id` of the stored document, so id lookups use the primary key
/// index. The first write to a collection also creates a unique sparse index on
/// `Identifier`, which serves the ordered range scans used for enumeration.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
    /// Collections whose `Identifier` index is known to exist.
    indexed: Arc<RwLock<HashSet<String>>>,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self {
            client,
            database,
            indexed: Arc::default(),
        }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&ValueSanitizer::sanitize_string(collection_name))
    }

    async fn ensure_indexed(&self, collection: &str) -> StoreResult<()> {
        if self.indexed.read().await.contains(collection) {
            return Ok(());
        }

        let mut indexed = self.indexed.write().await;
        if indexed.contains(collection) {
            return Ok(());
        }

        self.get_collection(collection)
            .create_index(identifier_index())
            .await
            .map_err(unavailable)?;
        indexed.insert(collection.to_string());

        debug!(collection, "created identifier index");

        Ok(())
    }

    async fn find(&self, collection: &str, filter: Document, options: FindOptions) -> StoreResult<Vec<Bson>> {
        Ok(
            self.get_collection(collection)
                .find(filter)
                .with_options(options)
                .await
                .map_err(unavailable)?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(unavailable)?
                .into_iter()
                .map(restore_document)
                .collect()
        )
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn upsert_document(&self, id: String, document: Bson, collection: &str) -> StoreResult<UpsertOutcome> {
        let replacement = prepare_document(id.clone(), &document)?;
        self.ensure_indexed(collection).await?;

        let result = self.get_collection(collection)
            .replace_one(doc! { ID_FIELD: id }, replacement)
            .upsert(true)
            .await
            .map_err(unavailable)?;

        let outcome = match result.upserted_id {
            Some(_) => UpsertOutcome::Inserted,
            None => UpsertOutcome::Replaced,
        };

        trace!(collection, ?outcome, "upserted document");

        Ok(outcome)
    }

    async fn delete_documents(&self, ids: Vec<String>, collection: &str) -> StoreResult<usize> {
        let requested = ids.len();
        let result = self.get_collection(collection)
            .delete_many(doc! { ID_FIELD: { "$in": ids } })
            .await
            .map_err(unavailable)?;

        let removed = usize::try_from(result.deleted_count).unwrap_or(usize::MAX);
        trace!(collection, requested, removed, "deleted documents");

        Ok(removed)
    }

    async fn get_documents(&self, ids: Vec<String>, collection: &str) -> StoreResult<Vec<Bson>> {
        self.find(collection, doc! { ID_FIELD: { "$in": ids } }, FindOptions::default()).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> StoreResult<Vec<Bson>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(field) = &query.sort {
            options.sort = Some(doc! { ValueSanitizer::sanitize_string(field): 1 });
        }

        let filter = match &query.filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr)?,
            None => doc! {},
        };

        self.find(collection, filter, options).await
    }

    async fn count_documents(&self, collection: &str) -> StoreResult<usize> {
        let count = self.get_collection(collection)
            .count_documents(doc! {})
            .await
            .map_err(unavailable)?;

        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }

    async fn create_collection(&self, name: &str) -> StoreResult<()> {
        let result = self.client
            .database(&self.database)
            .create_collection(&ValueSanitizer::sanitize_string(name))
            .await;

        match result {
            Ok(()) => {}
            Err(err) if matches!(*err.kind, ErrorKind::Command(ref cmd) if cmd.code == NAMESPACE_EXISTS) => {}
            Err(err) => return Err(unavailable(err)),
        }

        self.ensure_indexed(name).await
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(unavailable)?;
        self.indexed.write().await.remove(name);

        trace!(collection = name, "dropped collection");

        Ok(())
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        let mut names = self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(unavailable)?
            .iter()
            .map(|name| ValueSanitizer::restore_string(name))
            .collect::<Vec<_>>();
        names.sort();

        Ok(names)
    }

    async fn shutdown(self) -> StoreResult<()> {
        debug!(database = %self.database, "shutting down mongodb client");
        self.client.shutdown().await;

        Ok(())
    }
}

/// Builder for [`MongoDbStore`] from a connection string.
///
/// Building parses the connection string and sets up the client; the first round trip to
/// the server happens on first use.
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> StoreResult<Self::Backend> {
        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| StoreError::Initialization(e.to_string()))?;
        let client = Client::with_options(options)
            .map_err(|e| StoreError::Initialization(e.to_string()))?;

        debug!(database = %self.database, "created mongodb client");

        Ok(MongoDbStore::new(client, self.database))
    }
}
