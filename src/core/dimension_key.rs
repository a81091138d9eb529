//! Composite dimension keys identifying a single time-series slice.
//!
//! A metric with dimensions `city` and `category` is split into one series per
//! distinct combination of values. [`DimensionKey`] is that combination: a set of
//! `name -> value` pairs whose equality and hash ignore insertion order, so it can
//! be used directly as a key in `HashMap`/`HashSet`.
//!
//! Keys are mutable through [`DimensionKey::put`]. Mutating a key after it has been
//! inserted into a hashed container breaks that container's invariants; treat keys
//! as frozen once they are shared.

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Order-independent mapping from dimension name to dimension value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionKey {
    dimensions: HashMap<String, String>,
}

impl DimensionKey {
    /// Creates an empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, overwriting any previous value for `name`.
    pub fn put(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.dimensions.insert(name.into(), value.into());
        self
    }

    /// Consuming variant of [`put`](Self::put) for building keys inline.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.put(name, value);
        self
    }

    /// Returns an independent copy of the current mapping.
    ///
    /// Later calls to [`put`](Self::put) are not visible through a snapshot taken
    /// earlier. Iteration order of the returned map is unspecified.
    pub fn as_map(&self) -> HashMap<String, String> {
        self.dimensions.clone()
    }

    /// Value for a dimension, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.dimensions.get(name).map(String::as_str)
    }

    /// Number of dimensions in the key.
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// True when the key has no dimensions.
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Iterates over `(name, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dimensions.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Names of all dimensions in the key.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    /// True when every pair in `filter` is also present in `self`.
    ///
    /// An empty filter matches every key.
    pub fn contains(&self, filter: &DimensionKey) -> bool {
        filter
            .dimensions
            .iter()
            .all(|(name, value)| self.dimensions.get(name) == Some(value))
    }

    /// Loose equality against an arbitrary, possibly absent value.
    ///
    /// Returns `false` for `None` and for values that are not a `DimensionKey`.
    pub fn equals(&self, other: Option<&dyn Any>) -> bool {
        other
            .and_then(|other| other.downcast_ref::<DimensionKey>())
            .is_some_and(|other| self == other)
    }

    /// Content hash, independent of insertion order.
    ///
    /// Each entry is hashed on its own with a fixed-seed hasher and the results are
    /// combined with wrapping addition, which is commutative and associative.
    pub fn content_hash(&self) -> u64 {
        self.dimensions
            .iter()
            .fold(0u64, |acc, (name, value)| acc.wrapping_add(entry_hash(name, value)))
    }
}

fn entry_hash(name: &str, value: &str) -> u64 {
    let mut hasher = FxHasher::default();
    name.hash(&mut hasher);
    value.hash(&mut hasher);
    hasher.finish()
}

impl PartialEq for DimensionKey {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions == other.dimensions
    }
}

impl Eq for DimensionKey {}

impl Hash for DimensionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.dimensions.len());
        state.write_u64(self.content_hash());
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sorted: BTreeMap<&str, &str> = self.iter().collect();
        write!(f, "{{")?;
        for (i, (name, value)) in sorted.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl From<HashMap<String, String>> for DimensionKey {
    fn from(dimensions: HashMap<String, String>) -> Self {
        Self { dimensions }
    }
}

impl<K, V> FromIterator<(K, V)> for DimensionKey
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            dimensions: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;

    fn std_hash(key: &DimensionKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = DimensionKey::new();
        a.put("category", "men/shoes").put("city", "redmond");

        let mut b = DimensionKey::new();
        b.put("city", "redmond").put("category", "men/shoes");

        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(std_hash(&a), std_hash(&b));
    }

    #[test]
    fn test_value_change_breaks_equality() {
        let a = DimensionKey::new()
            .with("category", "men/shoes")
            .with("city", "bellevue");
        let b = DimensionKey::new()
            .with("category", "men/shoes")
            .with("city", "redmond");

        assert_ne!(a, b);
    }

    #[test]
    fn test_swapped_values_are_different_keys() {
        let a = DimensionKey::new().with("x", "1").with("y", "2");
        let b = DimensionKey::new().with("x", "2").with("y", "1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_set_membership() {
        let a = DimensionKey::from_iter([("city", "redmond"), ("category", "men/shoes")]);
        let b = DimensionKey::from_iter([("category", "men/shoes"), ("city", "redmond")]);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_snapshot_isolation() {
        let mut key = DimensionKey::new();
        key.put("city", "redmond").put("category", "men/shoes");

        let first = key.as_map();
        assert_eq!(first.len(), 2);

        key.put("region", "west");
        assert_eq!(first.len(), 2);

        let second = key.as_map();
        assert_eq!(second.len(), 3);
        assert_eq!(second.get("region").map(String::as_str), Some("west"));
    }

    #[test]
    fn test_put_overwrites() {
        let mut key = DimensionKey::new();
        key.put("category", "A").put("category", "B");

        let map = key.as_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("category").map(String::as_str), Some("B"));
    }

    #[test]
    fn test_equals_handles_absent_and_foreign_values() {
        let key = DimensionKey::new().with("city", "redmond");
        let same = key.clone();
        let unrelated = String::from("city=redmond");

        assert!(!key.equals(None));
        assert!(!key.equals(Some(&unrelated as &dyn Any)));
        assert!(!key.equals(Some(&42_u32 as &dyn Any)));
        assert!(key.equals(Some(&same as &dyn Any)));
        assert!(key.equals(Some(&key as &dyn Any)));
    }

    #[test]
    fn test_empty_keys_are_equal() {
        assert_eq!(DimensionKey::new(), DimensionKey::default());
        assert_eq!(DimensionKey::new().content_hash(), 0);
    }

    #[test]
    fn test_contains_filter() {
        let key = DimensionKey::new()
            .with("city", "redmond")
            .with("category", "men/shoes");

        assert!(key.contains(&DimensionKey::new()));
        assert!(key.contains(&DimensionKey::new().with("city", "redmond")));
        assert!(!key.contains(&DimensionKey::new().with("city", "seattle")));
        assert!(!key.contains(&DimensionKey::new().with("region", "west")));
    }

    #[test]
    fn test_display_is_sorted() {
        let key = DimensionKey::new().with("city", "redmond").with("category", "shoes");
        assert_eq!(key.to_string(), "{category=shoes, city=redmond}");
    }

    #[test]
    fn test_serde_as_plain_object() {
        let key = DimensionKey::new().with("city", "redmond");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"city":"redmond"}"#);

        let back: DimensionKey = serde_json::from_str(r#"{"city":"redmond"}"#).unwrap();
        assert_eq!(back, key);
    }
}
