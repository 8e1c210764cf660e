/// Dialect enumeration for SBOM documents
///
/// `Unknown` is only ever produced by format detection; it is never a valid
/// conversion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    CycloneDx,
    Spdx,
    Unknown,
}

impl Dialect {
    /// Human-readable dialect name, also used as the `format` object metadata tag
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::CycloneDx => "CycloneDX",
            Dialect::Spdx => "SPDX",
            Dialect::Unknown => "Unknown",
        }
    }

    /// Dialect used when handing a document to the converter.
    ///
    /// Unrecognized documents are assumed to be SPDX; callers must report a
    /// warning before relying on this.
    pub fn for_conversion(&self) -> Dialect {
        match self {
            Dialect::Unknown => Dialect::Spdx,
            other => *other,
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cyclonedx" | "cdx" => Ok(Dialect::CycloneDx),
            "spdx" => Ok(Dialect::Spdx),
            _ => Err(format!(
                "Invalid SBOM format: {}. Please specify 'cyclonedx' or 'spdx'",
                s
            )),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_dialect_from_str() {
        assert_eq!(Dialect::from_str("cyclonedx").unwrap(), Dialect::CycloneDx);
        assert_eq!(Dialect::from_str("CycloneDX").unwrap(), Dialect::CycloneDx);
        assert_eq!(Dialect::from_str("cdx").unwrap(), Dialect::CycloneDx);
        assert_eq!(Dialect::from_str("SPDX").unwrap(), Dialect::Spdx);
    }

    #[test]
    fn test_dialect_from_str_rejects_unknown() {
        let error = Dialect::from_str("swid").unwrap_err();
        assert!(error.contains("swid"));
        assert!(Dialect::from_str("unknown").is_err());
    }

    #[test]
    fn test_unknown_converts_as_spdx() {
        assert_eq!(Dialect::Unknown.for_conversion(), Dialect::Spdx);
        assert_eq!(Dialect::CycloneDx.for_conversion(), Dialect::CycloneDx);
    }

    #[test]
    fn test_dialect_display() {
        assert_eq!(Dialect::CycloneDx.to_string(), "CycloneDX");
        assert_eq!(Dialect::Spdx.to_string(), "SPDX");
    }
}
