//! One-to-one map with lookup in both directions

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use thiserror::Error;

/// An insertion would map one key to two partners
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BijectionError {
    #[error("left key is already mapped to another right value")]
    LeftTaken,
    #[error("right key is already mapped to another left value")]
    RightTaken,
}

#[derive(Debug, Clone)]
pub struct BiMap<L, R> {
    left: HashMap<L, R>,
    right: HashMap<R, L>,
}

impl<L, R> Default for BiMap<L, R> {
    fn default() -> Self {
        Self {
            left: HashMap::new(),
            right: HashMap::new(),
        }
    }
}

impl<L, R> BiMap<L, R>
where
    L: Eq + Hash + Clone,
    R: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs, failing on the first one that breaks the bijection
    pub fn try_from_pairs(pairs: impl IntoIterator<Item = (L, R)>) -> Result<Self, BijectionError> {
        let mut map = Self::new();
        for (l, r) in pairs {
            map.insert(l, r)?;
        }
        Ok(map)
    }

    /// Insert a pair. Returns `Ok(false)` if the identical pair was already
    /// present; fails without modifying the map if either key is bound to
    /// something else.
    pub fn insert(&mut self, l: L, r: R) -> Result<bool, BijectionError> {
        if let Some(existing) = self.left.get(&l) {
            return if *existing == r {
                Ok(false)
            } else {
                Err(BijectionError::LeftTaken)
            };
        }
        if self.right.contains_key(&r) {
            return Err(BijectionError::RightTaken);
        }
        self.left.insert(l.clone(), r.clone());
        self.right.insert(r, l);
        Ok(true)
    }

    pub fn get_by_left<Q>(&self, l: &Q) -> Option<&R>
    where
        L: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.left.get(l)
    }

    pub fn get_by_right<Q>(&self, r: &Q) -> Option<&L>
    where
        R: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.right.get(r)
    }

    pub fn contains_left<Q>(&self, l: &Q) -> bool
    where
        L: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.left.contains_key(l)
    }

    pub fn contains_right<Q>(&self, r: &Q) -> bool
    where
        R: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.right.contains_key(r)
    }

    /// Remove the pair containing `l`
    pub fn remove_by_left(&mut self, l: &L) -> Option<(L, R)> {
        let r = self.left.remove(l)?;
        let l = self.right.remove(&r)?;
        Some((l, r))
    }

    /// Remove the pair containing `r`
    pub fn remove_by_right(&mut self, r: &R) -> Option<(L, R)> {
        let l = self.right.remove(r)?;
        let r = self.left.remove(&l)?;
        Some((l, r))
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&L, &R)> {
        self.left.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_ways() {
        let mut map = BiMap::new();
        assert_eq!(map.insert("entry", 0), Ok(true));
        assert_eq!(map.insert("exit", 1), Ok(true));
        assert_eq!(map.get_by_left(&"exit"), Some(&1));
        assert_eq!(map.get_by_right(&0), Some(&"entry"));
        assert!(map.contains_left(&"entry"));
        assert!(!map.contains_right(&7));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_reinserting_same_pair_is_noop() {
        let mut map = BiMap::new();
        map.insert("a", 1).unwrap();
        assert_eq!(map.insert("a", 1), Ok(false));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_violations_leave_map_unchanged() {
        let mut map = BiMap::new();
        map.insert("a", 1).unwrap();
        assert_eq!(map.insert("a", 2), Err(BijectionError::LeftTaken));
        assert_eq!(map.insert("b", 1), Err(BijectionError::RightTaken));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_by_right(&2), None);
        assert_eq!(map.get_by_left(&"b"), None);
    }

    #[test]
    fn test_remove_and_from_pairs() {
        let mut map = BiMap::try_from_pairs([("a", 1), ("b", 2)]).unwrap();
        assert_eq!(map.remove_by_right(&1), Some(("a", 1)));
        assert_eq!(map.remove_by_left(&"b"), Some(("b", 2)));
        assert!(map.is_empty());
        assert!(BiMap::try_from_pairs([("a", 1), ("a", 2)]).is_err());
    }
}
