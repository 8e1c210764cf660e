use crate::shared::Result;

/// Maximum length of a destination table name
const MAX_TABLE_NAME_LENGTH: usize = 200;

/// Columns written by the projection, in insertion order
pub const PROJECTION_COLUMNS: [&str; 4] = ["name", "version", "license", "source"];

/// Column added to tables created before provenance tracking existed
pub const SOURCE_COLUMN: &str = "source";

/// Default for `source` on rows written before the column existed
pub const SOURCE_COLUMN_DEFAULT: &str = "unknown";

/// ProjectionRow - one row of the tabular SBOM projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionRow {
    pub name: String,
    pub version: String,
    pub license: String,
    pub source: String,
}

impl ProjectionRow {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        license: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            license: license.into(),
            source: source.into(),
        }
    }
}

/// NewType wrapper for a destination table name
///
/// Only `[a-z0-9_]` characters, so names can be interpolated into DDL
/// without quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Derives the table for a provider and target identifier
    ///
    /// `("github", "Octo-Org/repo.js")` becomes `sbom_github_octo_org_repo_js`.
    pub fn derive(provider: &str, identifier: &str) -> Result<Self> {
        Self::new(&format!("sbom_{}_{}", provider, identifier))
    }

    /// Sanitizes an explicit table name
    pub fn new(raw: &str) -> Result<Self> {
        let sanitized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if sanitized.is_empty() || sanitized.chars().all(|c| c == '_') {
            anyhow::bail!("Table name '{}' contains no usable characters", raw);
        }

        if sanitized.len() > MAX_TABLE_NAME_LENGTH {
            anyhow::bail!(
                "Table name is too long ({} characters). Maximum allowed: {}",
                sanitized.len(),
                MAX_TABLE_NAME_LENGTH
            );
        }

        // Identifiers may not start with a digit
        if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
            return Ok(Self(format!("t_{}", sanitized)));
        }

        Ok(Self(sanitized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_table_name_is_deterministic() {
        let first = TableName::derive("github", "Octo-Org/repo.js").unwrap();
        let second = TableName::derive("github", "Octo-Org/repo.js").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_str(), "sbom_github_octo_org_repo_js");
    }

    #[test]
    fn test_explicit_table_name_is_sanitized() {
        assert_eq!(TableName::new("My Table").unwrap().as_str(), "my_table");
    }

    #[test]
    fn test_table_name_leading_digit() {
        assert_eq!(TableName::new("2024_sboms").unwrap().as_str(), "t_2024_sboms");
    }

    #[test]
    fn test_table_name_rejects_empty() {
        assert!(TableName::new("").is_err());
        assert!(TableName::new("///").is_err());
    }

    #[test]
    fn test_table_name_too_long() {
        let raw = "a".repeat(MAX_TABLE_NAME_LENGTH + 1);
        assert!(TableName::new(&raw).unwrap_err().to_string().contains("too long"));
    }
}
