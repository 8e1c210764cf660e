use crate::sbom_processing::domain::{ProjectionRow, UNKNOWN_VALUE};
use std::collections::HashMap;

/// LicenseMapper service for filling in licenses the SBOM left unknown
///
/// The mapping is keyed by component name. Lookups try the exact name first
/// and then a case-insensitive match; when several keys differ only in case,
/// the case-insensitive match uses the lexicographically smallest key. Rows
/// that already carry a license are never touched.
#[derive(Debug, Clone, Default)]
pub struct LicenseMapper {
    exact: HashMap<String, String>,
    lowercase: HashMap<String, String>,
}

impl LicenseMapper {
    pub fn new(mapping: HashMap<String, String>) -> Self {
        let mut exact = HashMap::with_capacity(mapping.len());
        let mut lowercase = HashMap::with_capacity(mapping.len());

        let mut entries: Vec<(String, String)> = mapping.into_iter().collect();
        entries.sort();

        for (name, license) in entries {
            let license = license.trim().to_string();
            if license.is_empty() {
                continue;
            }
            lowercase
                .entry(name.to_lowercase())
                .or_insert_with(|| license.clone());
            exact.insert(name, license);
        }

        Self { exact, lowercase }
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.exact
            .get(name)
            .or_else(|| self.lowercase.get(&name.to_lowercase()))
            .map(String::as_str)
    }

    /// Replaces `"unknown"` licenses with mapped values
    ///
    /// # Returns
    /// The number of rows that were updated
    pub fn apply(&self, rows: &mut [ProjectionRow]) -> usize {
        let mut updated = 0;
        for row in rows.iter_mut().filter(|r| r.license == UNKNOWN_VALUE) {
            if let Some(license) = self.lookup(&row.name) {
                row.license = license.to_string();
                updated += 1;
            }
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(entries: &[(&str, &str)]) -> LicenseMapper {
        LicenseMapper::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_apply_fills_unknown_only() {
        let mapper = mapper(&[("lodash", "MIT"), ("react", "MIT")]);
        let mut rows = vec![
            ProjectionRow::new("lodash", "4.17.21", "unknown", "repoA"),
            ProjectionRow::new("react", "18.0.0", "BSD-3-Clause", "repoA"),
            ProjectionRow::new("left-pad", "1.0.0", "unknown", "repoA"),
        ];

        let updated = mapper.apply(&mut rows);

        assert_eq!(updated, 1);
        assert_eq!(rows[0].license, "MIT");
        assert_eq!(rows[1].license, "BSD-3-Clause");
        assert_eq!(rows[2].license, "unknown");
    }

    #[test]
    fn test_lookup_is_case_insensitive_fallback() {
        let mapper = mapper(&[("PyYAML", "MIT")]);
        assert_eq!(mapper.lookup("PyYAML"), Some("MIT"));
        assert_eq!(mapper.lookup("pyyaml"), Some("MIT"));
        assert_eq!(mapper.lookup("yaml"), None);
    }

    #[test]
    fn test_case_colliding_keys_resolve_deterministically() {
        for _ in 0..16 {
            let mapper = mapper(&[("pyyaml", "BSD"), ("PyYAML", "MIT"), ("PYYAML", "GPL")]);
            assert_eq!(mapper.lookup("pyyaml"), Some("BSD"));
            assert_eq!(mapper.lookup("PyYAML"), Some("MIT"));
            assert_eq!(mapper.lookup("Pyyaml"), Some("GPL"));
        }
    }

    #[test]
    fn test_blank_mappings_are_ignored() {
        let mapper = mapper(&[("a", "  ")]);
        assert!(mapper.is_empty());
        let mut rows = vec![ProjectionRow::new("a", "1", "unknown", "s")];
        assert_eq!(mapper.apply(&mut rows), 0);
    }
}
