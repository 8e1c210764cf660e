use crate::sbom_processing::domain::{Component, UNKNOWN_VALUE};

/// Property carrying the concluded license on documents converted from SPDX
pub const SPDX_LICENSE_CONCLUDED: &str = "spdx:license-concluded";

/// Property carrying the declared license on documents converted from SPDX
pub const SPDX_LICENSE_DECLARED: &str = "spdx:license-declared";

/// SPDX placeholders that mean "no information"
const SPDX_PLACEHOLDERS: [&str; 2] = ["NOASSERTION", "NONE"];

/// LicenseResolution policy for picking one license per component
///
/// Priority order:
/// 1. first entry of `licenses` (`license.id`, `license.name`, or `expression`)
/// 2. `spdx:license-concluded` property
/// 3. `spdx:license-declared` property
/// 4. `"unknown"`
///
/// `NOASSERTION` and `NONE` are skipped at every step.
pub struct LicenseResolution;

impl LicenseResolution {
    pub fn resolve(component: &Component) -> String {
        Self::informative(component.first_license())
            .or_else(|| Self::provenance_property(component, SPDX_LICENSE_CONCLUDED))
            .or_else(|| Self::provenance_property(component, SPDX_LICENSE_DECLARED))
            .unwrap_or(UNKNOWN_VALUE)
            .to_string()
    }

    fn provenance_property<'a>(component: &'a Component, name: &str) -> Option<&'a str> {
        Self::informative(component.property(name))
    }

    fn informative(value: Option<&str>) -> Option<&str> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty() && !SPDX_PLACEHOLDERS.contains(v))
    }
}
