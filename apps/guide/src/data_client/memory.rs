//! In-memory `DataClient` used by unit tests. Implements the subset of the
//! data API the service relies on, including the two stored procedures.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use super::query::{Filter, Query, Table};
use super::{DataClient, DataError, Row};
use crate::auth::Session;

#[derive(Default)]
struct Store {
    tables: HashMap<Table, Vec<Row>>,
    /// Every call, as `"<op> <table>"`.
    calls: Vec<String>,
    /// Operations (same format as `calls`) that fail with a 500.
    failing: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MemoryDataClient {
    store: Arc<Mutex<Store>>,
}

impl MemoryDataClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        let mut store = self.store.lock().unwrap();
        store.tables.entry(table).or_default().extend(rows);
    }

    pub fn rows(&self, table: Table) -> Vec<Row> {
        let store = self.store.lock().unwrap();
        store.tables.get(&table).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.store.lock().unwrap().calls.clone()
    }

    /// Makes every later `op` on `table` fail, e.g. `fail_on("insert_rows", Table::PlanItems)`.
    pub fn fail_on(&self, op: &str, table: Table) {
        self.store
            .lock()
            .unwrap()
            .failing
            .push(format!("{op} {table}"));
    }

    fn record(&self, op: &str, target: &str) -> Result<(), DataError> {
        let mut store = self.store.lock().unwrap();
        let call = format!("{op} {target}");
        store.calls.push(call.clone());
        if store.failing.contains(&call) {
            return Err(DataError::Api {
                status: 500,
                message: format!("injected failure for {call}"),
            });
        }
        Ok(())
    }

    fn with_defaults(mut fields: Value) -> Value {
        if let Value::Object(map) = &mut fields {
            let now = json!(Utc::now());
            map.entry("id")
                .or_insert_with(|| json!(Uuid::new_v4()));
            map.entry("created_at").or_insert_with(|| now.clone());
            map.entry("updated_at").or_insert(now);
        }
        fields
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let field = row.get(filter.column()).unwrap_or(&Value::Null);
    match filter {
        Filter::Eq(_, expected) => field == expected,
        Filter::ILike(_, needle) => field
            .as_str()
            .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
        Filter::In(_, values) => values.contains(field),
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or_default()
            .total_cmp(&y.as_f64().unwrap_or_default()),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DataClient for MemoryDataClient {
    async fn fetch_rows(&self, table: Table, query: Query) -> Result<Vec<Row>, DataError> {
        self.record("fetch_rows", table.as_str())?;
        let mut rows: Vec<Row> = self
            .rows(table)
            .into_iter()
            .filter(|row| query.filters.iter().all(|f| matches(row, f)))
            .collect();

        rows.sort_by(|a, b| {
            query
                .order
                .iter()
                .map(|o| {
                    let ord = compare(
                        a.get(o.column).unwrap_or(&Value::Null),
                        b.get(o.column).unwrap_or(&Value::Null),
                    );
                    if o.ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert_row(&self, table: Table, fields: Value) -> Result<Row, DataError> {
        self.record("insert_row", table.as_str())?;
        let row = Self::with_defaults(fields);
        self.seed(table, vec![row.clone()]);
        Ok(row)
    }

    async fn insert_rows(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Row>, DataError> {
        self.record("insert_rows", table.as_str())?;
        let rows: Vec<Row> = rows.into_iter().map(Self::with_defaults).collect();
        self.seed(table, rows.clone());
        Ok(rows)
    }

    async fn update_row(&self, table: Table, id: Uuid, fields: Value) -> Result<Row, DataError> {
        self.record("update_row", table.as_str())?;
        let mut store = self.store.lock().unwrap();
        let row = store
            .tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| r["id"] == json!(id)))
            .ok_or(DataError::NotFound { table })?;
        if let (Value::Object(target), Value::Object(changes)) = (&mut *row, fields) {
            target.extend(changes);
        }
        Ok(row.clone())
    }

    async fn upsert_row(&self, table: Table, fields: Value) -> Result<Row, DataError> {
        self.record("upsert_row", table.as_str())?;
        let mut store = self.store.lock().unwrap();
        let rows = store.tables.entry(table).or_default();
        let id = fields.get("id").cloned().unwrap_or(Value::Null);
        if let Some(existing) = rows.iter_mut().find(|r| r["id"] == id) {
            if let (Value::Object(target), Value::Object(changes)) = (&mut *existing, fields) {
                target.extend(changes);
            }
            return Ok(existing.clone());
        }
        let row = Self::with_defaults(fields);
        rows.push(row.clone());
        Ok(row)
    }

    async fn delete_row(&self, table: Table, id: Uuid) -> Result<(), DataError> {
        self.record("delete_row", table.as_str())?;
        let mut store = self.store.lock().unwrap();
        if let Some(rows) = store.tables.get_mut(&table) {
            rows.retain(|r| r["id"] != json!(id));
        }
        Ok(())
    }

    async fn delete_where(&self, table: Table, filters: Vec<Filter>) -> Result<(), DataError> {
        self.record("delete_where", table.as_str())?;
        let mut store = self.store.lock().unwrap();
        if let Some(rows) = store.tables.get_mut(&table) {
            rows.retain(|r| !filters.iter().all(|f| matches(r, f)));
        }
        Ok(())
    }

    async fn invoke_procedure(&self, name: &str, args: Value) -> Result<Vec<Row>, DataError> {
        self.record("invoke_procedure", name)?;
        match name {
            "get_reviews_with_users" => {
                let place_id = args["place_id_param"].clone();
                let users = self.rows(Table::Users);
                Ok(self
                    .rows(Table::Reviews)
                    .into_iter()
                    .filter(|r| r["place_id"] == place_id)
                    .map(|mut review| {
                        let author = users.iter().find(|u| u["id"] == review["user_id"]);
                        if let Value::Object(map) = &mut review {
                            map.insert(
                                "username".into(),
                                author.map(|u| u["username"].clone()).unwrap_or(Value::Null),
                            );
                            map.insert(
                                "avatar_url".into(),
                                author.map(|u| u["avatar_url"].clone()).unwrap_or(Value::Null),
                            );
                        }
                        review
                    })
                    .collect())
            }
            "get_saved_place" => Ok(self
                .rows(Table::SavedPlaces)
                .into_iter()
                .filter(|r| {
                    r["place_id"] == args["place_id_param"] && r["user_id"] == args["user_id_param"]
                })
                .collect()),
            other => Err(DataError::Api {
                status: 404,
                message: format!("unknown procedure {other}"),
            }),
        }
    }

    fn for_session(&self, _session: &Session) -> Arc<dyn DataClient> {
        Arc::new(self.clone())
    }
}
