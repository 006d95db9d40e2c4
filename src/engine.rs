//! Query engine: predicate planning, index probes, scans and intersection.

use crate::error::{Result, TableError};
use crate::record::Record;
use crate::table::Table;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use tracing::debug;

/// How a column value is compared with a predicate's value. Comparison is
/// plain `str` ordering, so `"10" < "9"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Equal,
    NotEqual,
    LessThan,
    LessEq,
    GreaterThan,
    GreaterEq,
}

impl Comparator {
    pub const ALL: [Comparator; 6] = [
        Comparator::Equal,
        Comparator::NotEqual,
        Comparator::LessThan,
        Comparator::LessEq,
        Comparator::GreaterThan,
        Comparator::GreaterEq,
    ];

    /// Whether `ordering` (column value compared to predicate value)
    /// satisfies this comparator.
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            Comparator::Equal => ordering == Ordering::Equal,
            Comparator::NotEqual => ordering != Ordering::Equal,
            Comparator::LessThan => ordering == Ordering::Less,
            Comparator::LessEq => ordering != Ordering::Greater,
            Comparator::GreaterThan => ordering == Ordering::Greater,
            Comparator::GreaterEq => ordering != Ordering::Less,
        }
    }

    pub fn evaluate(self, left: &str, right: &str) -> bool {
        self.matches(left.cmp(right))
    }

    /// Comparators an ordered index can answer from its buckets.
    pub fn is_index_friendly(self) -> bool {
        !matches!(self, Comparator::NotEqual)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Equal => "=",
            Comparator::NotEqual => "!=",
            Comparator::LessThan => "<",
            Comparator::LessEq => "<=",
            Comparator::GreaterThan => ">",
            Comparator::GreaterEq => ">=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        let comparator = match s.trim() {
            "=" | "==" | "Equal" => Comparator::Equal,
            "!=" | "<>" | "NotEqual" => Comparator::NotEqual,
            "<" | "LessThan" => Comparator::LessThan,
            "<=" | "LessEq" => Comparator::LessEq,
            ">" | "GreaterThan" => Comparator::GreaterThan,
            ">=" | "GreaterEq" => Comparator::GreaterEq,
            other => {
                return Err(TableError::validation(format!(
                    "unknown comparator: {}",
                    other
                )))
            }
        };
        Ok(comparator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: String,
    pub value: String,
    pub comparator: Comparator,
}

impl Predicate {
    pub fn new(column: impl Into<String>, comparator: Comparator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            comparator,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        record
            .get(&self.column)
            .is_some_and(|value| self.comparator.evaluate(value, &self.value))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.comparator, self.value)
    }
}

/// Positions of the predicates answered from an index and of those checked
/// record by record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    pub indexed: Vec<usize>,
    pub scanned: Vec<usize>,
}

impl QueryPlan {
    pub fn uses_index(&self) -> bool {
        !self.indexed.is_empty()
    }
}

/// Records present in every input set, compared by value.
///
/// A record counts once per set no matter how often it repeats inside that
/// set. Output follows the order of the first set and holds no duplicates.
/// No input sets yields an empty result.
pub fn intersect(sets: &[Vec<Rc<Record>>]) -> Vec<Rc<Record>> {
    let Some(first) = sets.first() else {
        return Vec::new();
    };
    // record -> (sets containing it, last set index that counted it)
    let mut frequency: HashMap<&Record, (usize, usize)> = HashMap::new();
    for (set_idx, set) in sets.iter().enumerate() {
        for record in set {
            let entry = frequency.entry(&**record).or_insert((0, usize::MAX));
            if entry.1 != set_idx {
                entry.0 += 1;
                entry.1 = set_idx;
            }
        }
    }

    let mut emitted: HashSet<&Record> = HashSet::new();
    let mut result = Vec::new();
    for record in first {
        let in_all = frequency
            .get(&**record)
            .is_some_and(|(count, _)| *count == sets.len());
        if in_all && emitted.insert(&**record) {
            result.push(Rc::clone(record));
        }
    }
    result
}

impl Table {
    /// Selects with three parallel slices: `columns[i] comparators[i] values[i]`.
    pub fn select<C, V>(
        &self,
        columns: &[C],
        values: &[V],
        comparators: &[Comparator],
    ) -> Result<Vec<Rc<Record>>>
    where
        C: AsRef<str>,
        V: AsRef<str>,
    {
        if columns.len() != values.len() || values.len() != comparators.len() {
            return Err(TableError::validation(format!(
                "predicate lengths differ: {} columns, {} values, {} comparators",
                columns.len(),
                values.len(),
                comparators.len()
            )));
        }
        let predicates: Vec<Predicate> = columns
            .iter()
            .zip(values)
            .zip(comparators)
            .map(|((column, value), comparator)| {
                Predicate::new(column.as_ref(), *comparator, value.as_ref())
            })
            .collect();
        self.select_where(&predicates)
    }

    /// Records satisfying every predicate, distinct by value.
    ///
    /// Indexed predicates are resolved against their index and intersected;
    /// the remaining predicates then filter those candidates. Without any
    /// indexed predicate the heap is scanned once.
    pub fn select_where(&self, predicates: &[Predicate]) -> Result<Vec<Rc<Record>>> {
        let plan = self.plan(predicates)?;
        debug!(
            predicates = predicates.len(),
            indexed = plan.indexed.len(),
            scanned = plan.scanned.len(),
            "planned select"
        );

        if !plan.uses_index() {
            let mut seen: HashSet<&Record> = HashSet::new();
            let mut selected = Vec::new();
            for record in self.heap() {
                if predicates.iter().all(|p| p.matches(record)) && seen.insert(record) {
                    selected.push(Rc::clone(record));
                }
            }
            return Ok(selected);
        }

        let mut partials = Vec::with_capacity(plan.indexed.len());
        for &i in &plan.indexed {
            let predicate = &predicates[i];
            let index = self.index(&predicate.column).ok_or_else(|| {
                TableError::validation(format!("no index on column {}", predicate.column))
            })?;
            partials.push(index.range(predicate.comparator, &predicate.value));
        }

        let mut candidates = intersect(&partials);
        candidates.retain(|record| plan.scanned.iter().all(|&i| predicates[i].matches(record)));
        Ok(candidates)
    }

    /// Splits predicates into index probes and record checks. Fails on an
    /// empty predicate list or an unknown column.
    pub fn plan(&self, predicates: &[Predicate]) -> Result<QueryPlan> {
        if predicates.is_empty() {
            return Err(TableError::validation("select needs at least one predicate"));
        }
        let mut plan = QueryPlan::default();
        for (i, predicate) in predicates.iter().enumerate() {
            if !self.has_column(&predicate.column) {
                return Err(TableError::validation(format!(
                    "unknown column {}",
                    predicate.column
                )));
            }
            if predicate.comparator.is_index_friendly() && self.has_index(&predicate.column) {
                plan.indexed.push(i);
            } else {
                plan.scanned.push(i);
            }
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str) -> Rc<Record> {
        Rc::new(Record::new(&["id"], &[id]).unwrap())
    }

    fn ids(records: &[Rc<Record>]) -> Vec<&str> {
        records.iter().map(|r| r.get("id").unwrap()).collect()
    }

    #[test]
    fn comparator_dispatch() {
        assert!(Comparator::LessEq.evaluate("a", "a"));
        assert!(!Comparator::LessThan.evaluate("a", "a"));
        assert!(Comparator::GreaterThan.evaluate("b", "a"));
        assert!(Comparator::NotEqual.evaluate("b", "a"));
        assert!(Comparator::LessThan.evaluate("10", "9"));
    }

    #[test]
    fn comparator_parse_and_display() {
        for comparator in Comparator::ALL {
            let parsed: Comparator = comparator.symbol().parse().unwrap();
            assert_eq!(parsed, comparator);
        }
        assert_eq!("GreaterEq".parse::<Comparator>().unwrap(), Comparator::GreaterEq);
        assert!("~".parse::<Comparator>().is_err());
    }

    #[test]
    fn intersect_examples() {
        let (one, two, three, four) = (rec("1"), rec("2"), rec("3"), rec("4"));
        let sets = vec![
            vec![one.clone(), two.clone(), three.clone()],
            vec![two.clone(), three.clone()],
        ];
        assert_eq!(ids(&intersect(&sets)), vec!["2", "3"]);

        let sets = vec![
            vec![one.clone(), two.clone()],
            vec![two.clone(), three.clone()],
            vec![two.clone(), four.clone()],
        ];
        assert_eq!(ids(&intersect(&sets)), vec!["2"]);
    }

    #[test]
    fn intersect_identity_laws() {
        let set = vec![rec("1"), rec("2")];
        assert_eq!(ids(&intersect(&[set.clone()])), vec!["1", "2"]);
        assert_eq!(ids(&intersect(&[set.clone(), set.clone()])), vec!["1", "2"]);
        assert!(intersect(&[set.clone(), Vec::new(), set]).is_empty());
        assert!(intersect(&[]).is_empty());
    }

    #[test]
    fn intersect_uses_value_equality() {
        let sets = vec![vec![rec("7")], vec![rec("7")]];
        assert_eq!(ids(&intersect(&sets)), vec!["7"]);
    }

    #[test]
    fn repeats_within_one_set_count_once() {
        let sets = vec![vec![rec("5"), rec("5")], vec![rec("6")]];
        assert!(intersect(&sets).is_empty());
    }
}
