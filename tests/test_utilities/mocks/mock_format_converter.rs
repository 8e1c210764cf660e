use async_trait::async_trait;
use sbom_collector::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// FormatConverter stand-in for the external converter executable
///
/// SPDX to CycloneDX produces one component per SPDX package, keeping the
/// document name; CycloneDX to SPDX produces a minimal SPDX document.
#[derive(Default, Clone)]
pub struct MockFormatConverter {
    /// Documents handed to the converter; working files are gone after a run
    pub inputs: Arc<Mutex<Vec<Value>>>,
}

impl MockFormatConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    pub fn last_input(&self) -> Option<Value> {
        self.inputs.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl FormatConverter for MockFormatConverter {
    async fn convert(&self, input: &Path, from: Dialect, to: Dialect, output: &Path) -> Result<()> {
        let source: Value = serde_json::from_slice(&std::fs::read(input)?)?;
        self.inputs.lock().unwrap().push(source.clone());

        let converted = match (from, to) {
            (Dialect::Spdx, Dialect::CycloneDx) => {
                let components: Vec<Value> = source["packages"]
                    .as_array()
                    .map(|packages| {
                        packages
                            .iter()
                            .map(|p| json!({"name": p["name"], "version": p["versionInfo"]}))
                            .collect()
                    })
                    .unwrap_or_default();
                json!({
                    "bomFormat": "CycloneDX",
                    "specVersion": "1.5",
                    "metadata": {"component": {"name": source["name"]}},
                    "components": components
                })
            }
            _ => json!({
                "spdxVersion": "SPDX-2.3",
                "SPDXID": "SPDXRef-DOCUMENT",
                "name": source["metadata"]["component"]["name"]
            }),
        };

        std::fs::write(output, serde_json::to_vec_pretty(&converted)?)?;
        Ok(())
    }
}
