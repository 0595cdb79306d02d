//! [`SqliteEventStore`] — the SQLite implementation of [`EventSource`].

use std::path::Path;

use bazaar_core::{
  event::EntityType,
  source::{EventSource, SourceRecords},
};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Raw analytics records for any number of stores, in a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteEventStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteEventStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Append one raw record and return its row id.
  pub async fn insert_record(
    &self,
    store_id: &str,
    kind: EntityType,
    body: &Value,
  ) -> Result<i64> {
    let row = encode_row(store_id, kind, body)?;
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO source_records (store_id, kind, body, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![row.store_id, row.kind, row.body, row.recorded_at],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  pub async fn insert_product(
    &self,
    store_id: &str,
    body: &Value,
  ) -> Result<i64> {
    self.insert_record(store_id, EntityType::Product, body).await
  }

  pub async fn insert_promotion(
    &self,
    store_id: &str,
    body: &Value,
  ) -> Result<i64> {
    self
      .insert_record(store_id, EntityType::PromotionInterval, body)
      .await
  }

  pub async fn insert_view_sample(
    &self,
    store_id: &str,
    body: &Value,
  ) -> Result<i64> {
    self.insert_record(store_id, EntityType::ViewSample, body).await
  }

  /// Append a whole bundle in one transaction; either every record lands or
  /// none does. Returns the number of records written.
  pub async fn import(
    &self,
    store_id: &str,
    records: &SourceRecords,
  ) -> Result<usize> {
    let rows = [
      (EntityType::Product, &records.products),
      (EntityType::PromotionInterval, &records.promotions),
      (EntityType::ViewSample, &records.view_samples),
    ]
    .into_iter()
    .flat_map(|(kind, bodies)| bodies.iter().map(move |body| (kind, body)))
    .map(|(kind, body)| encode_row(store_id, kind, body))
    .collect::<Result<Vec<_>>>()?;

    let count = rows.len();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO source_records (store_id, kind, body, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.store_id,
              row.kind,
              row.body,
              row.recorded_at
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(store_id, count, "imported source records");
    Ok(count)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Every store id with at least one record, sorted.
  pub async fn list_stores(&self) -> Result<Vec<String>> {
    let stores = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT store_id FROM source_records ORDER BY store_id",
        )?;
        let ids = stmt
          .query_map([], |r| r.get::<_, String>(0))?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
      })
      .await?;
    Ok(stores)
  }
}

// ─── EventSource impl ────────────────────────────────────────────────────────

impl EventSource for SqliteEventStore {
  type Error = Error;

  async fn fetch_records<'a>(
    &'a self,
    store_id: &'a str,
  ) -> Result<SourceRecords> {
    let store_id = store_id.to_owned();
    let rows: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT kind, body FROM source_records
           WHERE store_id = ?1
           ORDER BY record_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![store_id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    let mut records = SourceRecords::default();
    for (kind, body) in rows {
      let kind = match kind.parse::<EntityType>() {
        Ok(kind) => kind,
        Err(e) => {
          tracing::debug!("skipping stored record: {e}");
          continue;
        }
      };
      let body: Value = serde_json::from_str(&body)?;
      match kind {
        EntityType::Product => records.products.push(body),
        EntityType::PromotionInterval => records.promotions.push(body),
        EntityType::ViewSample => records.view_samples.push(body),
      }
    }
    Ok(records)
  }
}

// ─── Encoding ────────────────────────────────────────────────────────────────

struct RawRow {
  store_id:    String,
  kind:        &'static str,
  body:        String,
  recorded_at: String,
}

fn encode_row(
  store_id: &str,
  kind: EntityType,
  body: &Value,
) -> Result<RawRow> {
  if store_id.trim().is_empty() {
    return Err(Error::EmptyStoreId);
  }
  if !body.is_object() {
    return Err(Error::NotAnObject(kind));
  }
  Ok(RawRow {
    store_id:    store_id.to_owned(),
    kind:        kind.as_str(),
    body:        serde_json::to_string(body)?,
    recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
  })
}
