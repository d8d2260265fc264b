//! In-memory store backend
//!
//! A table-per-`Vec` stand-in for the hosted backend with the same
//! observable contract: id/timestamp assignment on insert, filtered and
//! ranged selects with embedded child rows, and referential cascade on
//! parent deletes. Used by tests and offline development.

use crate::error::{StoreError, StoreResult};
use crate::query::{FilterOp, SelectQuery};
use crate::RemoteStore;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use uuid::Uuid;

/// A parent/child link the backend enforces: deleting a parent removes the
/// child rows whose `fk` column references it, and selects may embed the
/// child table on the parent.
#[derive(Debug, Clone)]
pub struct Relation {
    pub parent: String,
    pub child: String,
    pub fk: String,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: DashMap<String, Vec<Value>>,
    relations: Vec<Relation>,
    fail_next_bulk: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parent/child relation (cascade + embed support).
    pub fn with_relation(
        mut self,
        parent: impl Into<String>,
        child: impl Into<String>,
        fk: impl Into<String>,
    ) -> Self {
        self.relations.push(Relation {
            parent: parent.into(),
            child: child.into(),
            fk: fk.into(),
        });
        self
    }

    /// Make the next `insert_many` call fail, for partial-write tests.
    pub fn fail_next_bulk_insert(&self) {
        self.fail_next_bulk.store(true, AtomicOrdering::SeqCst);
    }

    fn now() -> Value {
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    fn store_row(&self, table: &str, row: Value) -> StoreResult<Value> {
        let Value::Object(mut map) = row else {
            return Err(StoreError::Backend(format!(
                "insert into {table} requires an object row"
            )));
        };
        map.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        map.entry("created_at").or_insert_with(Self::now);
        map.insert("updated_at".to_string(), Self::now());
        let row = Value::Object(map);
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    fn relation_to(&self, parent: &str, child: &str) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|r| r.parent == parent && r.child == child)
    }

    fn children_of(&self, relation: &Relation, parent_id: &Value) -> Vec<Value> {
        self.tables
            .get(&relation.child)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.get(&relation.fk) == Some(parent_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn cascade(&self, table: &str, parent_id: &Value) {
        for relation in self.relations.iter().filter(|r| r.parent == table) {
            let removed: Vec<Value> = match self.tables.get_mut(&relation.child) {
                Some(mut rows) => {
                    let (gone, kept): (Vec<Value>, Vec<Value>) = rows
                        .drain(..)
                        .partition(|r| r.get(&relation.fk) == Some(parent_id));
                    *rows = kept;
                    gone
                }
                None => Vec::new(),
            };
            for row in removed {
                if let Some(child_id) = row.get("id") {
                    self.cascade(&relation.child, child_id);
                }
            }
        }
    }
}

fn matches(row: &Value, query: &SelectQuery) -> bool {
    query.filters.iter().all(|filter| {
        let cell = row.get(&filter.column);
        match filter.op {
            FilterOp::Eq => cell == Some(&filter.value),
            FilterOp::In => match (&filter.value, cell) {
                (Value::Array(values), Some(cell)) => values.contains(cell),
                _ => false,
            },
        }
    })
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn project(row: Value, columns: &str) -> Value {
    let Value::Object(map) = row else { return row };
    let keep: Vec<&str> = columns.split(',').map(str::trim).collect();
    let projected: Map<String, Value> = map
        .into_iter()
        .filter(|(k, _)| keep.contains(&k.as_str()))
        .collect();
    Value::Object(projected)
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn insert(&self, table: &str, row: Value) -> StoreResult<Value> {
        self.store_row(table, row)
    }

    async fn insert_many(&self, table: &str, rows: Vec<Value>) -> StoreResult<Vec<Value>> {
        if self.fail_next_bulk.swap(false, AtomicOrdering::SeqCst) {
            return Err(StoreError::Backend(format!(
                "injected bulk insert failure on {table}"
            )));
        }
        rows.into_iter()
            .map(|row| self.store_row(table, row))
            .collect()
    }

    async fn update_by_id(&self, table: &str, id: Uuid, patch: Value) -> StoreResult<Value> {
        let id_value = Value::String(id.to_string());
        let Value::Object(patch) = patch else {
            return Err(StoreError::Backend(format!(
                "update of {table} requires an object patch"
            )));
        };
        let mut rows = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::NotFound(format!("{table} row {id}")))?;
        let row = rows
            .iter_mut()
            .find(|r| r.get("id") == Some(&id_value))
            .ok_or_else(|| StoreError::NotFound(format!("{table} row {id}")))?;
        if let Value::Object(map) = row {
            for (key, value) in patch {
                map.insert(key, value);
            }
            map.insert("updated_at".to_string(), Self::now());
        }
        Ok(row.clone())
    }

    async fn delete_by_id(&self, table: &str, id: Uuid) -> StoreResult<()> {
        let id_value = Value::String(id.to_string());
        let removed = match self.tables.get_mut(table) {
            Some(mut rows) => {
                let before = rows.len();
                rows.retain(|r| r.get("id") != Some(&id_value));
                before != rows.len()
            }
            None => false,
        };
        if !removed {
            return Err(StoreError::NotFound(format!("{table} row {id}")));
        }
        self.cascade(table, &id_value);
        Ok(())
    }

    async fn delete_matching(&self, table: &str, column: &str, value: Value) -> StoreResult<()> {
        if let Some(mut rows) = self.tables.get_mut(table) {
            rows.retain(|r| r.get(column) != Some(&value));
        }
        Ok(())
    }

    async fn select(&self, table: &str, query: SelectQuery) -> StoreResult<Vec<Value>> {
        let mut rows: Vec<Value> = self
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches(r, &query)).cloned().collect())
            .unwrap_or_default();

        if let Some((column, descending)) = &query.order {
            rows.sort_by(|a, b| compare_cells(a.get(column), b.get(column)));
            if *descending {
                rows.reverse();
            }
        }

        let offset = query.offset.unwrap_or(0) as usize;
        let rows = rows.into_iter().skip(offset);
        let mut rows: Vec<Value> = match query.limit {
            Some(limit) => rows.take(limit as usize).collect(),
            None => rows.collect(),
        };

        if let Some(columns) = &query.columns {
            rows = rows.into_iter().map(|r| project(r, columns)).collect();
        }

        for embed in &query.embeds {
            let relation = self.relation_to(table, &embed.table).ok_or_else(|| {
                StoreError::Backend(format!("no relation from {table} to {}", embed.table))
            })?;
            for row in &mut rows {
                let Some(parent_id) = row.get("id").cloned() else {
                    continue;
                };
                let mut children = self.children_of(relation, &parent_id);
                if let Some(order) = &embed.order {
                    children.sort_by(|a, b| compare_cells(a.get(order), b.get(order)));
                }
                if let Value::Object(map) = row {
                    map.insert(embed.table.clone(), Value::Array(children));
                }
            }
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new().with_relation("services", "service_parts", "service_id")
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = store();
        let row = store
            .insert("services", json!({"title": "Calibration"}))
            .await
            .unwrap();
        assert!(row.get("id").is_some());
        assert!(row.get("created_at").is_some());
        assert!(row.get("updated_at").is_some());
    }

    #[tokio::test]
    async fn select_filters_and_ranges() {
        let store = store();
        for i in 0..5 {
            store
                .insert("services", json!({"title": format!("job {i}"), "flag": i % 2 == 0}))
                .await
                .unwrap();
        }
        let rows = store
            .select("services", SelectQuery::new().filter_eq("flag", true))
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);

        let rows = store
            .select("services", SelectQuery::new().range(1, 2))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn embed_attaches_ordered_children() {
        let store = store();
        let parent = store
            .insert("services", json!({"title": "Install"}))
            .await
            .unwrap();
        let parent_id = parent.get("id").unwrap().clone();
        store
            .insert_many(
                "service_parts",
                vec![
                    json!({"service_id": parent_id, "name": "B", "position": 1}),
                    json!({"service_id": parent_id, "name": "A", "position": 0}),
                ],
            )
            .await
            .unwrap();

        let rows = store
            .select(
                "services",
                SelectQuery::new().embed_ordered("service_parts", "position"),
            )
            .await
            .unwrap();
        let parts = rows[0].get("service_parts").unwrap().as_array().unwrap();
        assert_eq!(parts[0].get("name"), Some(&json!("A")));
        assert_eq!(parts[1].get("name"), Some(&json!("B")));
    }

    #[tokio::test]
    async fn embed_without_relation_is_an_error() {
        let store = store();
        store
            .insert("services", json!({"title": "Install"}))
            .await
            .unwrap();
        let result = store
            .select("services", SelectQuery::new().embed("unknown_children"))
            .await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn delete_cascades_to_children() {
        let store = store();
        let parent = store
            .insert("services", json!({"title": "Install"}))
            .await
            .unwrap();
        let parent_id = parent.get("id").unwrap().clone();
        store
            .insert(
                "service_parts",
                json!({"service_id": parent_id, "name": "Pump"}),
            )
            .await
            .unwrap();

        let id: Uuid = parent_id.as_str().unwrap().parse().unwrap();
        store.delete_by_id("services", id).await.unwrap();

        let orphans = store
            .select(
                "service_parts",
                SelectQuery::new().filter_eq("service_id", parent_id),
            )
            .await
            .unwrap();
        assert!(orphans.is_empty());
    }

    #[tokio::test]
    async fn projection_strips_columns() {
        let store = store();
        store
            .insert("services", json!({"title": "Install", "secret": 42}))
            .await
            .unwrap();
        let rows = store
            .select("services", SelectQuery::new().columns("title"))
            .await
            .unwrap();
        assert_eq!(rows[0], json!({"title": "Install"}));
    }

    #[tokio::test]
    async fn injected_bulk_failure_fires_once() {
        let store = store();
        store.fail_next_bulk_insert();
        let result = store
            .insert_many("service_parts", vec![json!({"name": "Pump"})])
            .await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(store
            .insert_many("service_parts", vec![json!({"name": "Pump"})])
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn update_merges_patch_and_reports_missing_rows() {
        let store = store();
        let row = store
            .insert("services", json!({"title": "Install", "status": "pending"}))
            .await
            .unwrap();
        let id: Uuid = row.get("id").unwrap().as_str().unwrap().parse().unwrap();

        let updated = store
            .update_by_id("services", id, json!({"status": "completed"}))
            .await
            .unwrap();
        assert_eq!(updated.get("status"), Some(&json!("completed")));
        assert_eq!(updated.get("title"), Some(&json!("Install")));

        let missing = store
            .update_by_id("services", Uuid::new_v4(), json!({"status": "x"}))
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }
}
