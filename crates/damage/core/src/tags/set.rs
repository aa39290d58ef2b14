use std::collections::BTreeSet;

use super::Tag;

/// Ordered set of tags with hierarchical lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, tag: Tag) -> Self {
        self.0.insert(tag);
        self
    }

    pub fn insert(&mut self, tag: Tag) -> bool {
        self.0.insert(tag)
    }

    pub fn remove(&mut self, tag: &Tag) -> bool {
        self.0.remove(tag)
    }

    /// Returns true if any tag in the set equals `tag` or descends from it.
    pub fn has_tag(&self, tag: &Tag) -> bool {
        // Descendants sort directly after their ancestor, so the scan can
        // start at `tag` and stop at the first non-matching entry.
        self.0
            .range(tag.clone()..)
            .take_while(|candidate| candidate.as_str().starts_with(tag.as_str()))
            .any(|candidate| candidate.matches(tag))
    }

    /// Returns true only on an exact match.
    pub fn has_exact(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    pub fn has_all(&self, other: &TagSet) -> bool {
        other.iter().all(|tag| self.has_tag(tag))
    }

    pub fn has_any(&self, other: &TagSet) -> bool {
        other.iter().any(|tag| self.has_tag(tag))
    }

    /// Returns the first tag of `other` present in this set.
    pub fn first_match<'a>(&self, other: &'a TagSet) -> Option<&'a Tag> {
        other.iter().find(|tag| self.has_tag(tag))
    }

    pub fn extend_from(&mut self, other: &TagSet) {
        self.0.extend(other.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Tag> for TagSet {
    fn extend<I: IntoIterator<Item = Tag>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for TagSet {
    type Item = Tag;
    type IntoIter = std::collections::btree_set::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::collections::btree_set::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tags: &[&str]) -> TagSet {
        tags.iter().map(|t| Tag::new(*t).unwrap()).collect()
    }

    fn tag(s: &str) -> Tag {
        Tag::new(s).unwrap()
    }

    #[test]
    fn hierarchical_lookup_finds_descendants() {
        let tags = set(&["Damage.Immune.Fire", "Status.Stunned"]);
        assert!(tags.has_tag(&tag("Damage.Immune")));
        assert!(tags.has_tag(&tag("Damage")));
        assert!(tags.has_tag(&tag("Status.Stunned")));
        assert!(!tags.has_tag(&tag("Damage.Immune.Cold")));
    }

    #[test]
    fn hierarchical_lookup_skips_prefix_siblings() {
        let tags = set(&["Damage.Fireball", "Damage.Fire.Dot"]);
        assert!(tags.has_tag(&tag("Damage.Fire")));

        let only_sibling = set(&["Damage.Fireball"]);
        assert!(!only_sibling.has_tag(&tag("Damage.Fire")));
    }

    #[test]
    fn exact_lookup_ignores_hierarchy() {
        let tags = set(&["Damage.Immune.Fire"]);
        assert!(!tags.has_exact(&tag("Damage.Immune")));
        assert!(tags.has_exact(&tag("Damage.Immune.Fire")));
    }

    #[test]
    fn all_and_any() {
        let tags = set(&["Hit.Critical", "Hit.FromBehind"]);
        assert!(tags.has_all(&set(&["Hit.Critical", "Hit"])));
        assert!(!tags.has_all(&set(&["Hit.Critical", "Hit.Headshot"])));
        assert!(tags.has_any(&set(&["Hit.Headshot", "Hit.FromBehind"])));
        assert!(!tags.has_any(&TagSet::new()));
        assert!(tags.has_all(&TagSet::new()));
    }
}
