//! Tag Index Module
//!
//! Reverse index from tag to the (region, key) pairs carrying it.

use std::collections::{HashMap, HashSet};
use std::fmt;

// == Tag Target ==
/// Identifies one entry across the whole cache.
///
/// Kept as a structured pair so that region or key names containing any
/// separator character stay unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagTarget {
    pub region: String,
    pub key: String,
}

impl TagTarget {
    pub fn new(region: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for TagTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.key)
    }
}

// == Tag Index ==
/// tag -> set of targets. A tag with no targets is never stored.
#[derive(Debug, Default)]
pub struct TagIndex {
    by_tag: HashMap<String, HashSet<TagTarget>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `region/key` under each of `tags`.
    pub fn register<'a, I>(&mut self, region: &str, key: &str, tags: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for tag in tags {
            self.by_tag
                .entry(tag.clone())
                .or_default()
                .insert(TagTarget::new(region, key));
        }
    }

    /// Drops `region/key` from each of `tags`, removing tags left empty.
    pub fn retire<'a, I>(&mut self, region: &str, key: &str, tags: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let target = TagTarget::new(region, key);
        for tag in tags {
            if let Some(targets) = self.by_tag.get_mut(tag) {
                targets.remove(&target);
                if targets.is_empty() {
                    self.by_tag.remove(tag);
                }
            }
        }
    }

    /// Removes a tag and hands back everything that was indexed under it.
    pub fn take(&mut self, tag: &str) -> HashSet<TagTarget> {
        self.by_tag.remove(tag).unwrap_or_default()
    }

    /// Targets currently indexed under `tag`, sorted.
    pub fn targets(&self, tag: &str) -> Vec<TagTarget> {
        let mut targets: Vec<TagTarget> = self
            .by_tag
            .get(tag)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        targets.sort();
        targets
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashSet<TagTarget>)> {
        self.by_tag.iter()
    }
}
