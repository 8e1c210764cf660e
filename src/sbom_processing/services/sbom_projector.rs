use super::license_mapper::LicenseMapper;
use crate::sbom_processing::domain::{CycloneDxDocument, ProjectionRow, SourceReference};
use crate::sbom_processing::policies::LicenseResolution;

/// Rows produced for one document plus how many licenses the mapping filled
#[derive(Debug, Clone)]
pub struct Projection {
    pub rows: Vec<ProjectionRow>,
    pub mapped_licenses: usize,
}

/// SbomProjector service for flattening a document into table rows
pub struct SbomProjector;

impl SbomProjector {
    /// Projects every component to `(name, version, license, source)`
    ///
    /// Components without a `source` get `default_source`. The license
    /// mapping runs after extraction and only fills `"unknown"` values.
    pub fn project(
        document: &CycloneDxDocument,
        default_source: &SourceReference,
        mapper: &LicenseMapper,
    ) -> Projection {
        let mut rows: Vec<ProjectionRow> = document
            .components
            .iter()
            .map(|component| {
                ProjectionRow::new(
                    component.name_or_unknown(),
                    component.version_or_unknown(),
                    LicenseResolution::resolve(component),
                    component.source.as_ref().unwrap_or(default_source).as_str(),
                )
            })
            .collect();

        let mapped_licenses = mapper.apply(&mut rows);

        Projection {
            rows,
            mapped_licenses,
        }
    }
}
