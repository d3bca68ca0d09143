//! Insertion-ordered set of categorical values.

use ahash::AHashMap;

/// The distinct values of a tags attribute, in first-occurrence order.
///
/// A value's position in this set is its bit (bitmap pack) or its code minus one
/// (integer pack), so the order must be deterministic: values are kept in a `Vec`
/// and an index maps each value back to its position.
#[derive(Debug, Clone, Default)]
pub struct Possibilities {
    values: Vec<String>,
    index: AHashMap<String, usize>,
}

impl Possibilities {
    pub fn new() -> Possibilities {
        Possibilities::default()
    }

    /// Adds `value` if it is not present yet and returns its position.
    pub fn insert(&mut self, value: &str) -> usize {
        if let Some(&pos) = self.index.get(value) {
            return pos;
        }
        let pos = self.values.len();
        self.values.push(value.to_string());
        self.index.insert(value.to_string(), pos);
        pos
    }

    /// Returns the position of `value`, or `None` if it was never inserted.
    #[inline]
    pub fn position(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    pub fn get(&self, pos: usize) -> Option<&str> {
        self.values.get(pos).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }
}

impl<S: AsRef<str>> FromIterator<S> for Possibilities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut possibilities = Possibilities::new();
        for value in iter {
            possibilities.insert(value.as_ref());
        }
        possibilities
    }
}

impl PartialEq for Possibilities {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for Possibilities {}

#[cfg(test)]
mod tests {
    use super::Possibilities;

    #[test]
    fn test_first_occurrence_order() {
        let mut p = Possibilities::new();
        assert_eq!(p.insert("red"), 0);
        assert_eq!(p.insert("green"), 1);
        assert_eq!(p.insert("red"), 0);
        assert_eq!(p.insert("blue"), 2);
        assert_eq!(p.values(), ["red", "green", "blue"]);
        assert_eq!(p.position("blue"), Some(2));
        assert_eq!(p.position("purple"), None);
        assert_eq!(p.get(1), Some("green"));
        assert_eq!(p.get(3), None);
    }

    #[test]
    fn test_from_iter_dedups() {
        let p: Possibilities = ["b", "a", "b", "c", "a"].into_iter().collect();
        assert_eq!(p.len(), 3);
        assert_eq!(p.into_values(), vec!["b", "a", "c"]);
    }
}
