use std::collections::HashMap;

/// Insertion-ordered collection of mapper nodes, bucketed by identity hash.
///
/// Lookups hash first and run the (more expensive) identity test only within the bucket.
#[derive(Debug)]
pub(crate) struct MapperIndex<M> {
    entries: Vec<M>,
    buckets: HashMap<u64, Vec<usize>>,
}

impl<M> Default for MapperIndex<M> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            buckets: HashMap::new(),
        }
    }
}

impl<M> MapperIndex<M> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Position of the first entry with `hash` accepted by `matches`.
    pub(crate) fn position(&self, hash: u64, matches: impl Fn(&M) -> bool) -> Option<usize> {
        self.buckets
            .get(&hash)?
            .iter()
            .copied()
            .find(|&index| matches(&self.entries[index]))
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut M> {
        self.entries.get_mut(index)
    }

    pub(crate) fn push(&mut self, hash: u64, entry: M) {
        self.buckets.entry(hash).or_default().push(self.entries.len());
        self.entries.push(entry);
    }

    pub(crate) fn as_slice(&self) -> &[M] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_keeps_insertion_order_across_buckets() {
        let mut index = MapperIndex::new();
        index.push(7, "a");
        index.push(3, "b");
        index.push(7, "c");

        assert_eq!(index.as_slice(), &["a", "b", "c"]);
        assert_eq!(index.position(7, |e| *e == "c"), Some(2));
        assert_eq!(index.position(3, |e| *e == "c"), None);
        assert_eq!(index.position(9, |_| true), None);

        if let Some(entry) = index.get_mut(1) {
            *entry = "B";
        }
        assert_eq!(index.as_slice()[1], "B");
    }
}
