use crate::engine::Comparator;
use crate::record::Record;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::rc::Rc;

/// Ordered secondary index over one column.
///
/// Keys are the column's text values in `str` order; each bucket holds the
/// heap's own `Rc` handles for the records carrying that value. A key only
/// exists while its bucket is non-empty.
#[derive(Debug, Clone)]
pub struct Index {
    column: String,
    buckets: BTreeMap<String, Vec<Rc<Record>>>,
}

impl Index {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            buckets: BTreeMap::new(),
        }
    }

    /// Builds an index with a single pass over `records`.
    pub fn build<'a, I>(column: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = &'a Rc<Record>>,
    {
        let mut index = Index::new(column);
        for record in records {
            index.insert(Rc::clone(record));
        }
        index
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn insert(&mut self, record: Rc<Record>) {
        let key = record.get(&self.column).unwrap_or_default().to_string();
        self.buckets.entry(key).or_default().push(record);
    }

    /// Removes exactly the shared instance `record` from its bucket, pruning
    /// the bucket when it empties. Returns false when it was not indexed.
    pub fn remove(&mut self, record: &Rc<Record>) -> bool {
        let key = record.get(&self.column).unwrap_or_default();
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|held| Rc::ptr_eq(held, record)) else {
            return false;
        };
        bucket.remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        true
    }

    pub fn get(&self, key: &str) -> &[Rc<Record>] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records whose value satisfies `comparator` against `pivot`.
    ///
    /// `NotEqual` is answered from the two open ranges around the pivot,
    /// although the planner never routes it here.
    pub fn range(&self, comparator: Comparator, pivot: &str) -> Vec<Rc<Record>> {
        let bounds: Vec<(Bound<&str>, Bound<&str>)> = match comparator {
            Comparator::Equal => return self.get(pivot).to_vec(),
            Comparator::LessThan => vec![(Bound::Unbounded, Bound::Excluded(pivot))],
            Comparator::LessEq => vec![(Bound::Unbounded, Bound::Included(pivot))],
            Comparator::GreaterThan => vec![(Bound::Excluded(pivot), Bound::Unbounded)],
            Comparator::GreaterEq => vec![(Bound::Included(pivot), Bound::Unbounded)],
            Comparator::NotEqual => vec![
                (Bound::Unbounded, Bound::Excluded(pivot)),
                (Bound::Excluded(pivot), Bound::Unbounded),
            ],
        };
        let mut matched = Vec::new();
        for bound in bounds {
            for bucket in self.buckets.range::<str, _>(bound).map(|(_, bucket)| bucket) {
                matched.extend(bucket.iter().cloned());
            }
        }
        matched
    }

    /// Records in the bucket for `key`, oldest first; empty when absent.
    pub fn bucket(&self, key: &str) -> impl Iterator<Item = &Record> {
        self.get(key).iter().map(Rc::as_ref)
    }

    /// Live keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of indexed records across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
