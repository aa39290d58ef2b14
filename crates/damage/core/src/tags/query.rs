use super::{Tag, TagSet};

/// Tag predicate: every required tag present, no forbidden tag present.
///
/// An empty query always matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TagQuery {
    pub require_all: TagSet,
    pub forbid_any: TagSet,
}

impl TagQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, tag: Tag) -> Self {
        self.require_all.insert(tag);
        self
    }

    pub fn forbid(mut self, tag: Tag) -> Self {
        self.forbid_any.insert(tag);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.require_all.is_empty() && self.forbid_any.is_empty()
    }

    pub fn matches(&self, tags: &TagSet) -> bool {
        tags.has_all(&self.require_all) && !tags.has_any(&self.forbid_any)
    }

    /// Returns the first tag that made the query fail, for diagnostics.
    pub fn first_violation<'a>(&'a self, tags: &TagSet) -> Option<&'a Tag> {
        self.require_all
            .iter()
            .find(|tag| !tags.has_tag(tag))
            .or_else(|| tags.first_match(&self.forbid_any))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> Tag {
        Tag::new(s).unwrap()
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(TagQuery::new().matches(&TagSet::new()));
        assert!(TagQuery::new().matches(&TagSet::new().with(tag("Status.Dead"))));
    }

    #[test]
    fn forbidden_ancestor_blocks_descendant() {
        let query = TagQuery::new().forbid(tag("Damage.Immune"));
        let tags = TagSet::new().with(tag("Damage.Immune.Fire"));
        assert!(!query.matches(&tags));
        assert_eq!(query.first_violation(&tags), Some(&tag("Damage.Immune")));
    }

    #[test]
    fn required_tags_must_all_be_present() {
        let query = TagQuery::new()
            .require(tag("Status.Stunned"))
            .require(tag("Hit.Critical"));
        let partial = TagSet::new().with(tag("Status.Stunned"));
        assert!(!query.matches(&partial));
        assert_eq!(query.first_violation(&partial), Some(&tag("Hit.Critical")));
        assert!(query.matches(&partial.with(tag("Hit.Critical"))));
    }
}
