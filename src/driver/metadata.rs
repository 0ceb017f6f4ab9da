//! Schema metadata as seen through a live connection.
//!
//! These types are never persisted; every introspection call fetches them
//! again.

/// An ordered collection of named items.
///
/// Lookups are exact first, then fall back to a lowercase comparison when
/// asked to. Insertion order is kept for iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedCollection<T> {
    items: Vec<(String, T)>,
}

impl<T> Default for NamedCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> NamedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the item stored under `name`.
    pub fn insert(&mut self, name: impl Into<String>, item: T) {
        let name = name.into();
        if let Some(slot) = self.items.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = item;
        } else {
            self.items.push((name, item));
        }
    }

    /// Names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(n, _)| n.as_str())
    }

    /// Look up an item by exact name, then (optionally) by lowercased name.
    pub fn get(&self, name: &str, case_insensitive_fallback: bool) -> Option<&T> {
        if let Some((_, item)) = self.items.iter().find(|(n, _)| n == name) {
            return Some(item);
        }
        if !case_insensitive_fallback {
            return None;
        }
        let wanted = name.to_lowercase();
        self.items
            .iter()
            .find(|(n, _)| n.to_lowercase() == wanted)
            .map(|(_, item)| item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T, S: Into<String>> FromIterator<(S, T)> for NamedCollection<T> {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut collection = NamedCollection::new();
        for (name, item) in iter {
            collection.insert(name, item);
        }
        collection
    }
}

/// A column and its CQL type as declared.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,
    pub cql_type: String,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, cql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cql_type: cql_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableMetadata {
    pub name: String,
    /// Columns in declared order.
    pub columns: Vec<ColumnMetadata>,
    pub partition_key: Vec<String>,
    pub clustering_key: Vec<String>,
}

/// A user-defined type.
#[derive(Debug, Clone, PartialEq)]
pub struct UdtMetadata {
    pub name: String,
    /// Fields in declared order.
    pub fields: Vec<ColumnMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyspaceMetadata {
    pub name: String,
    pub tables: NamedCollection<TableMetadata>,
    pub types: NamedCollection<UdtMetadata>,
}
