use std::collections::HashMap;
use std::hash::Hash;

/// A one-to-one correspondence between two key spaces.
///
/// Used for the L/R halves of a grammar rule's context: every K element has exactly one
/// counterpart on each side.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "L: serde::Serialize + Eq + Hash, R: serde::Serialize + Eq + Hash",
        deserialize = "L: serde::Deserialize<'de> + Eq + Hash, R: serde::Deserialize<'de> + Eq + Hash"
    ))
)]
pub struct BiMap<L, R> {
    left_to_right: HashMap<L, R>,
    right_to_left: HashMap<R, L>,
}

impl<L, R> Default for BiMap<L, R> {
    fn default() -> Self {
        BiMap {
            left_to_right: HashMap::new(),
            right_to_left: HashMap::new(),
        }
    }
}

impl<L: Eq + Hash + Clone, R: Eq + Hash + Clone> BiMap<L, R> {
    pub fn new() -> Self {
        BiMap::default()
    }

    pub fn len(&self) -> usize {
        self.left_to_right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left_to_right.is_empty()
    }

    /// Inserts the pair. Returns `false` and leaves the map untouched if either side is already
    /// mapped.
    pub fn insert(&mut self, left: L, right: R) -> bool {
        if self.left_to_right.contains_key(&left) || self.right_to_left.contains_key(&right) {
            return false;
        }
        self.left_to_right.insert(left.clone(), right.clone());
        self.right_to_left.insert(right, left);
        true
    }

    pub fn get_left(&self, left: &L) -> Option<&R> {
        self.left_to_right.get(left)
    }

    pub fn get_right(&self, right: &R) -> Option<&L> {
        self.right_to_left.get(right)
    }

    pub fn contains_left(&self, left: &L) -> bool {
        self.left_to_right.contains_key(left)
    }

    pub fn contains_right(&self, right: &R) -> bool {
        self.right_to_left.contains_key(right)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&L, &R)> {
        self.left_to_right.iter()
    }
}
