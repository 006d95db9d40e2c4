use crate::error::{Result, TableError};
use crate::index::Index;
use crate::record::{is_valid_text, Record};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;

/// An in-memory table: a fixed schema, the insertion-ordered heap of live
/// records, and zero or more single-column indexes.
///
/// The heap and the indexes share each record through one `Rc`. Every
/// mutation goes through `insert`/`delete`, which update both sides so an
/// index never holds a record the heap lacks, or the reverse.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    heap: Vec<Rc<Record>>,
    indexes: HashMap<String, Index>,
}

impl Table {
    pub fn new<C: AsRef<str>>(columns: &[C]) -> Result<Self> {
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        validate_schema(&columns)?;
        Ok(Self {
            columns,
            heap: Vec::new(),
            indexes: HashMap::new(),
        })
    }

    /// Builds a table and inserts `records` in order. Nothing is inserted
    /// unless the schema and every record are valid.
    pub fn load<C, I>(columns: &[C], records: I) -> Result<Self>
    where
        C: AsRef<str>,
        I: IntoIterator<Item = Record>,
    {
        let mut table = Table::new(columns)?;
        let conformed = records
            .into_iter()
            .map(|record| record.conform(&table.columns))
            .collect::<Result<Vec<_>>>()?;
        debug!(records = conformed.len(), "bulk load");
        for record in conformed {
            table.insert_conformed(record);
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Live records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.heap.iter().map(Rc::as_ref)
    }

    pub fn contains(&self, record: &Record) -> bool {
        match record.conform(&self.columns) {
            Ok(record) => self.heap.iter().any(|held| **held == record),
            Err(_) => false,
        }
    }

    pub fn insert(&mut self, record: Record) -> Result<()> {
        let record = record.conform(&self.columns)?;
        self.insert_conformed(record);
        Ok(())
    }

    fn insert_conformed(&mut self, record: Record) {
        let record = Rc::new(record);
        for index in self.indexes.values_mut() {
            index.insert(Rc::clone(&record));
        }
        self.heap.push(record);
    }

    /// Removes the first record equal in value to `record`. Returns whether
    /// one was removed; a missing or ill-shaped record removes nothing.
    pub fn delete(&mut self, record: &Record) -> bool {
        let Ok(record) = record.conform(&self.columns) else {
            return false;
        };
        let Some(pos) = self.heap.iter().position(|held| **held == record) else {
            return false;
        };
        let removed = self.heap.remove(pos);
        for index in self.indexes.values_mut() {
            index.remove(&removed);
        }
        true
    }

    /// Indexes `column` from the current heap. A second call is a no-op.
    pub fn create_index(&mut self, column: &str) -> Result<()> {
        if !self.has_column(column) {
            return Err(TableError::validation(format!(
                "cannot create an index on a non-existent column: {}",
                column
            )));
        }
        if self.indexes.contains_key(column) {
            return Ok(());
        }
        let index = Index::build(column, &self.heap);
        debug!(column, keys = index.bucket_count(), rows = index.len(), "created index");
        self.indexes.insert(column.to_string(), index);
        Ok(())
    }

    pub fn drop_index(&mut self, column: &str) -> Result<()> {
        if !self.has_column(column) {
            return Err(TableError::validation(format!("unknown column {}", column)));
        }
        if self.indexes.remove(column).is_some() {
            debug!(column, "dropped index");
        }
        Ok(())
    }

    pub fn has_index(&self, column: &str) -> bool {
        self.indexes.contains_key(column)
    }

    /// Indexed columns in schema order.
    pub fn indexed_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| self.indexes.contains_key(c.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Live keys of the index on `column`, ascending; None when unindexed.
    pub fn index_keys(&self, column: &str) -> Option<Vec<&str>> {
        self.indexes.get(column).map(|index| index.keys().collect())
    }

    /// Records held in the `column` index bucket for `key`, in bucket order.
    /// None when `column` is unindexed; empty when the key is absent.
    pub fn index_bucket(&self, column: &str, key: &str) -> Option<Vec<&Record>> {
        self.indexes
            .get(column)
            .map(|index| index.bucket(key).collect())
    }

    pub(crate) fn heap(&self) -> &[Rc<Record>] {
        &self.heap
    }

    pub(crate) fn index(&self, column: &str) -> Option<&Index> {
        self.indexes.get(column)
    }
}

fn validate_schema(columns: &[String]) -> Result<()> {
    if columns.is_empty() {
        return Err(TableError::validation("table needs at least one column"));
    }
    let mut seen = HashSet::new();
    for column in columns {
        if !is_valid_text(column) {
            return Err(TableError::validation(format!(
                "column name is not alphanumeric: {:?}",
                column
            )));
        }
        if !seen.insert(column.as_str()) {
            return Err(TableError::validation(format!("duplicate column {}", column)));
        }
    }
    Ok(())
}
