//! SQLite-backed region.
//!
//! # Responsibility
//! - Store items of any logical table as attribute cells.
//! - Serve paged equality queries and conditional puts.
//!
//! # Invariants
//! - Conditional puts run in an IMMEDIATE transaction, so the existence
//!   check and the insert are atomic across connections sharing a file.
//! - Pages are ordered by insertion and resume strictly after the cursor.
//! - Reads are always consistent; the consistent-read flag is only a hint.

use super::{
    AttributeValue, Attributes, Cursor, Item, Page, PutCondition, QueryRequest, Region,
    RegionError, RegionResult,
};
use crate::db::migrations::{current_version, latest_version};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// Region over a migrated SQLite connection.
pub struct SqliteRegion<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegion<'conn> {
    /// Wraps a connection opened through [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    ///
    /// # Errors
    /// - [`RegionError::UninitializedStore`] when migrations were not applied.
    pub fn try_new(conn: &'conn Connection) -> RegionResult<Self> {
        let actual_version = current_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RegionError::UninitializedStore {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl Region for SqliteRegion<'_> {
    fn put(
        &self,
        table: &str,
        attributes: &Attributes,
        condition: &PutCondition,
    ) -> RegionResult<Item> {
        if attributes.is_empty() {
            return Err(RegionError::InvalidData(format!(
                "cannot put an item without attributes into `{table}`"
            )));
        }
        let started_at = Instant::now();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let PutCondition::AttributeNotExists(attribute) = condition {
            let value = attributes.get(attribute).ok_or_else(|| {
                RegionError::InvalidData(format!(
                    "conditional attribute `{attribute}` is missing from the put"
                ))
            })?;
            if value_taken(&tx, table, attribute, value)? {
                debug!(
                    "event=region_put module=dynamo status=conflict table={table} attribute={attribute}"
                );
                return Err(RegionError::ConditionalCheckFailed {
                    table: table.to_string(),
                    attribute: attribute.clone(),
                });
            }
        }

        tx.execute("INSERT INTO items (table_name) VALUES (?1);", [table])?;
        let item_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO item_attributes (item_id, name, kind, value)
                 VALUES (?1, ?2, ?3, ?4);",
            )?;
            for (name, value) in attributes.iter() {
                stmt.execute(params![item_id, name, value.kind(), value.raw()])?;
            }
        }
        tx.commit()?;

        debug!(
            "event=region_put module=dynamo status=ok table={table} item_id={item_id} attributes={} duration_ms={}",
            attributes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(Item::new(table, attributes.clone()))
    }

    fn query(&self, table: &str, request: &QueryRequest) -> RegionResult<Page> {
        let started_at = Instant::now();
        let page_size = request.page_size.max(1) as usize;

        let mut sql = String::from("SELECT i.item_id FROM items i WHERE i.table_name = ?");
        let mut bind_values = vec![Value::Text(table.to_string())];

        if let Some(Cursor(after)) = request.exclusive_start {
            sql.push_str(" AND i.item_id > ?");
            bind_values.push(Value::Integer(after));
        }
        for condition in &request.conditions {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1 FROM item_attributes a
                    WHERE a.item_id = i.item_id AND a.name = ? AND a.kind = ? AND a.value = ?
                )",
            );
            bind_values.push(Value::Text(condition.attribute.clone()));
            bind_values.push(Value::Text(condition.value.kind().to_string()));
            bind_values.push(Value::Text(condition.value.raw().to_string()));
        }
        // One extra row tells whether another page follows.
        sql.push_str(" ORDER BY i.item_id LIMIT ?");
        bind_values.push(Value::Integer(page_size as i64 + 1));

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let mut item_ids = {
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(bind_values), |row| row.get::<_, i64>(0))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        let has_more = item_ids.len() > page_size;
        item_ids.truncate(page_size);

        let mut items = Vec::with_capacity(item_ids.len());
        {
            let mut stmt = tx.prepare(
                "SELECT name, kind, value FROM item_attributes WHERE item_id = ?1 ORDER BY name;",
            )?;
            for item_id in &item_ids {
                let mut attributes = Attributes::new();
                let mut rows = stmt.query([item_id])?;
                while let Some(row) = rows.next()? {
                    let name: String = row.get(0)?;
                    if !request.select.includes(&name) {
                        continue;
                    }
                    let kind: String = row.get(1)?;
                    let value = AttributeValue::from_parts(&kind, row.get(2)?)?;
                    attributes.insert(name, value);
                }
                items.push(Item::new(table, attributes));
            }
        }
        tx.commit()?;

        let last_evaluated = if has_more {
            item_ids.last().copied().map(Cursor)
        } else {
            None
        };
        debug!(
            "event=region_query module=dynamo status=ok table={table} conditions={} consistent_read={} items={} more={} duration_ms={}",
            request.conditions.len(),
            request.consistent_read,
            items.len(),
            has_more,
            started_at.elapsed().as_millis()
        );
        Ok(Page {
            items,
            last_evaluated,
        })
    }
}

fn value_taken(
    tx: &Transaction<'_>,
    table: &str,
    attribute: &str,
    value: &AttributeValue,
) -> RegionResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM items i
            JOIN item_attributes a ON a.item_id = i.item_id
            WHERE i.table_name = ?1 AND a.name = ?2 AND a.kind = ?3 AND a.value = ?4
        );",
        params![table, attribute, value.kind(), value.raw()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
