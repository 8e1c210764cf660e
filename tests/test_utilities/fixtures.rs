use serde_json::{json, Value};

/// CycloneDX document whose primary component names the scanned repository
pub fn repo_sbom(repo: &str, components: Value) -> Value {
    json!({
        "bomFormat": "CycloneDX",
        "specVersion": "1.5",
        "serialNumber": format!("urn:uuid:{}", uuid::Uuid::new_v4()),
        "version": 1,
        "metadata": {
            "timestamp": "2024-05-01T00:00:00Z",
            "tools": [{"vendor": "CycloneDX", "name": "cyclonedx"}],
            "component": {"type": "application", "name": repo}
        },
        "components": components
    })
}

pub fn lodash() -> Value {
    json!({
        "type": "library",
        "name": "lodash",
        "version": "4.17.21",
        "purl": "pkg:npm/lodash@4.17.21",
        "licenses": [{"license": {"id": "MIT"}}]
    })
}

/// GitHub dependency-graph response: an SPDX document inside an `sbom` envelope
pub fn github_spdx_response() -> Value {
    json!({
        "sbom": {
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "com.github.octo/repo",
            "packages": [{
                "name": "npm:lodash",
                "versionInfo": "4.17.21",
                "externalRefs": [{
                    "referenceCategory": "PACKAGE-MANAGER",
                    "referenceType": "purl",
                    "referenceLocator": "pkg:npm/lodash@4.17.21"
                }]
            }]
        }
    })
}
