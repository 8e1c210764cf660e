use crate::sbom_processing::domain::{Component, UNKNOWN_VALUE};
use std::collections::HashSet;

/// ComponentDeduplicator service for removing repeated components
///
/// Two components are the same when name, version, purl and source all match.
/// The first occurrence wins and input order is preserved.
pub struct ComponentDeduplicator;

impl ComponentDeduplicator {
    /// Builds the identity key `name@version#purl^source`
    pub fn dedup_key(component: &Component) -> String {
        format!(
            "{}@{}#{}^{}",
            component.name_or_unknown(),
            component.version_or_unknown(),
            component.purl.as_deref().unwrap_or(""),
            component
                .source
                .as_ref()
                .map(|s| s.as_str())
                .unwrap_or(UNKNOWN_VALUE)
        )
    }

    /// Removes duplicates, keeping the first occurrence of each key
    ///
    /// # Returns
    /// The retained components and the number that were dropped
    pub fn deduplicate(components: Vec<Component>) -> (Vec<Component>, usize) {
        let total = components.len();
        let mut seen = HashSet::with_capacity(total);
        let unique: Vec<Component> = components
            .into_iter()
            .filter(|component| seen.insert(Self::dedup_key(component)))
            .collect();
        let removed = total - unique.len();
        (unique, removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_processing::domain::SourceReference;

    fn tagged(name: &str, version: &str, source: &str) -> Component {
        Component::new(name, version)
            .with_purl(format!("pkg:npm/{}@{}", name, version))
            .with_source(SourceReference::new(source).unwrap())
    }

    #[test]
    fn test_dedup_key_format() {
        let component = tagged("lodash", "4.17.21", "repoA");
        assert_eq!(
            ComponentDeduplicator::dedup_key(&component),
            "lodash@4.17.21#pkg:npm/lodash@4.17.21^repoA"
        );
    }

    #[test]
    fn test_dedup_key_defaults() {
        let component = Component::default();
        assert_eq!(ComponentDeduplicator::dedup_key(&component), "unknown@unknown#^unknown");
    }

    #[test]
    fn test_same_package_from_different_sources_is_kept() {
        let components = vec![
            tagged("lodash", "4.17.21", "repoA"),
            tagged("lodash", "4.17.21", "repoB"),
            tagged("lodash", "4.17.21", "repoA"),
        ];

        let (unique, removed) = ComponentDeduplicator::deduplicate(components);

        assert_eq!(unique.len(), 2);
        assert_eq!(removed, 1);
        assert_eq!(unique[0].source.as_ref().unwrap().as_str(), "repoA");
        assert_eq!(unique[1].source.as_ref().unwrap().as_str(), "repoB");
    }

    #[test]
    fn test_first_occurrence_wins() {
        let first = tagged("a", "1", "s").with_license_id("MIT");
        let second = tagged("a", "1", "s").with_license_id("Apache-2.0");

        let (unique, _) = ComponentDeduplicator::deduplicate(vec![first, second]);

        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].first_license(), Some("MIT"));
    }

    #[test]
    fn test_purl_distinguishes_components() {
        let npm = Component::new("a", "1").with_purl("pkg:npm/a@1");
        let pypi = Component::new("a", "1").with_purl("pkg:pypi/a@1");
        let (unique, removed) = ComponentDeduplicator::deduplicate(vec![npm, pypi]);
        assert_eq!(unique.len(), 2);
        assert_eq!(removed, 0);
    }
}
