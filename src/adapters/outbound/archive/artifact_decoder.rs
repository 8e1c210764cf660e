use crate::shared::error::PipelineError;
use crate::shared::security::MAX_ARTIFACT_SIZE;
use crate::shared::Result;
use serde_json::Value;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];
const UTF8_BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

/// Container format of a downloaded artifact, judged from its leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Json,
    Gzip,
    Zip,
    Unknown,
}

/// A JSON document pulled out of an archive
#[derive(Debug, Clone, PartialEq)]
pub struct JsonMember {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Classifies an artifact by its magic bytes
pub fn sniff(bytes: &[u8]) -> ArtifactKind {
    if bytes.starts_with(&ZIP_MAGIC) {
        return ArtifactKind::Zip;
    }
    if bytes.starts_with(&GZIP_MAGIC) {
        return ArtifactKind::Gzip;
    }

    match strip_bom(bytes).iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') | Some(b'[') => ArtifactKind::Json,
        _ => ArtifactKind::Unknown,
    }
}

/// Drops a leading UTF-8 byte order mark
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes)
}

/// Parses bytes as a JSON document, rejecting anything that is not an object
///
/// A leading BOM is tolerated here; callers persisting the bytes must pass
/// them through `strip_bom` first.
pub fn parse_json_document(bytes: &[u8], origin: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_slice(strip_bom(bytes)).map_err(|e| PipelineError::MalformedPayload {
            origin: origin.to_string(),
            details: format!("invalid JSON: {}", e),
        })?;

    if !value.is_object() {
        return Err(PipelineError::MalformedPayload {
            origin: origin.to_string(),
            details: "expected a JSON object at the top level".to_string(),
        }
        .into());
    }

    Ok(value)
}

/// Decompresses a gzip artifact, bounded by `MAX_ARTIFACT_SIZE`
pub fn gunzip(bytes: &[u8], origin: &str) -> Result<Vec<u8>> {
    let decoder = flate2::read::GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .take(MAX_ARTIFACT_SIZE)
        .read_to_end(&mut out)
        .map_err(|e| PipelineError::MalformedPayload {
            origin: origin.to_string(),
            details: format!("gzip decompression failed: {}", e),
        })?;

    if out.len() as u64 >= MAX_ARTIFACT_SIZE {
        return Err(PipelineError::MalformedPayload {
            origin: origin.to_string(),
            details: format!("decompressed artifact exceeds {} bytes", MAX_ARTIFACT_SIZE),
        }
        .into());
    }

    Ok(out)
}

/// Returns every zip member that holds a JSON object, in archive order
///
/// Directories and members that do not parse as JSON objects are skipped.
/// Member bytes are returned without a leading BOM.
pub fn extract_zip_json(bytes: &[u8], origin: &str) -> Result<Vec<JsonMember>> {
    let malformed = |details: String| PipelineError::MalformedPayload {
        origin: origin.to_string(),
        details,
    };

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| malformed(format!("invalid zip archive: {}", e)))?;

    let mut members = Vec::new();
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| malformed(format!("unreadable zip entry {}: {}", i, e)))?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let mut out = Vec::new();
        entry
            .take(MAX_ARTIFACT_SIZE)
            .read_to_end(&mut out)
            .map_err(|e| malformed(format!("failed to read zip entry {}: {}", name, e)))?;
        if out.len() as u64 >= MAX_ARTIFACT_SIZE {
            return Err(malformed(format!(
                "zip entry {} exceeds size limit ({} bytes)",
                name, MAX_ARTIFACT_SIZE
            ))
            .into());
        }

        let content = strip_bom(&out);
        if parse_json_document(content, origin).is_ok() {
            members.push(JsonMember {
                name,
                bytes: content.to_vec(),
            });
        }
    }

    Ok(members)
}


#[cfg(test)]
mod tests {
    use super::test_archives::{gzip_of, zip_of};
    use super::*;

    #[test]
    fn test_sniff() {
        assert_eq!(sniff(b"  {\"bomFormat\": \"CycloneDX\"}"), ArtifactKind::Json);
        assert_eq!(sniff(b"\xef\xbb\xbf{}"), ArtifactKind::Json);
        assert_eq!(sniff(&gzip_of(b"{}")), ArtifactKind::Gzip);
        assert_eq!(sniff(&zip_of(&[("a.json", b"{}")])), ArtifactKind::Zip);
        assert_eq!(sniff(b"<html>"), ArtifactKind::Unknown);
        assert_eq!(sniff(b""), ArtifactKind::Unknown);
    }

    #[test]
    fn test_parse_json_document_rejects_non_object() {
        assert!(parse_json_document(b"{\"a\": 1}", "test").is_ok());
        let err = parse_json_document(b"[1, 2]", "test").unwrap_err();
        assert!(err.to_string().contains("Malformed payload from test"));
        assert!(parse_json_document(b"{oops", "test").is_err());
    }

    #[test]
    fn test_gunzip() {
        let compressed = gzip_of(br#"{"bomFormat": "CycloneDX"}"#);
        let decompressed = gunzip(&compressed, "test").unwrap();
        assert_eq!(decompressed, br#"{"bomFormat": "CycloneDX"}"#);
    }

    #[test]
    fn test_gunzip_rejects_garbage() {
        let mut bad = GZIP_MAGIC.to_vec();
        bad.extend_from_slice(b"not really gzip");
        assert!(gunzip(&bad, "test").is_err());
    }

    #[test]
    fn test_extract_zip_json_keeps_order_and_skips_non_json() {
        let archive = zip_of(&[
            ("README.txt", b"hello"),
            ("first.json", br#"{"bomFormat": "CycloneDX"}"#),
            ("second.json", br#"{"spdxVersion": "SPDX-2.3"}"#),
            ("list.json", b"[1]"),
        ]);

        let members = extract_zip_json(&archive, "test").unwrap();

        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["first.json", "second.json"]);
    }

    #[test]
    fn test_extract_zip_json_invalid_archive() {
        let mut bad = ZIP_MAGIC.to_vec();
        bad.extend_from_slice(b"truncated");
        let err = extract_zip_json(&bad, "test").unwrap_err();
        assert!(err.to_string().contains("invalid zip archive"));
    }
}
