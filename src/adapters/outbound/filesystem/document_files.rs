use crate::shared::error::PipelineError;
use crate::shared::security::{validate_not_symlink, validate_regular_file};
use crate::shared::Result;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Reads a working file after the symlink, type and size checks
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    validate_regular_file(path, "SBOM document")?;
    fs::read(path).map_err(|e| {
        PipelineError::FileReadError {
            path: path.to_path_buf(),
            details: e.to_string(),
        }
        .into()
    })
}

/// Reads and parses a JSON document
///
/// # Errors
/// `FileReadError` if the file cannot be read, `MalformedPayload` if it is
/// not valid JSON
pub fn read_json(path: &Path) -> Result<Value> {
    let bytes = read_bytes(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        PipelineError::MalformedPayload {
            origin: path.display().to_string(),
            details: format!("invalid JSON: {}", e),
        }
        .into()
    })
}

/// Writes bytes, refusing to follow an existing symlink at the destination
pub fn write_bytes(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(PipelineError::FileWriteError {
                path: path.to_path_buf(),
                details: format!("Parent directory does not exist: {}", parent.display()),
            }
            .into());
        }
    }

    if fs::symlink_metadata(path).is_ok() {
        validate_not_symlink(path, "write")?;
    }

    fs::write(path, content).map_err(|e| {
        PipelineError::FileWriteError {
            path: path.to_path_buf(),
            details: e.to_string(),
        }
        .into()
    })
}

/// Writes a JSON value pretty-printed
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    let content = serde_json::to_vec_pretty(value)?;
    write_bytes(path, &content)
}

/// Byte-for-byte copy of a working file
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    let bytes = read_bytes(from)?;
    write_bytes(to, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");

        write_json(&path, &json!({"bomFormat": "CycloneDX"})).unwrap();

        assert_eq!(read_json(&path).unwrap(), json!({"bomFormat": "CycloneDX"}));
    }

    #[test]
    fn test_read_json_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        fs::write(&path, "not json").unwrap();

        let err = read_json(&path).unwrap_err();
        assert!(err.to_string().contains("Malformed payload"));
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_bytes(&temp_dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_write_parent_directory_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/out.json");

        let err = write_bytes(&path, b"{}").unwrap_err();
        assert!(err.to_string().contains("Parent directory does not exist"));
    }

    #[test]
    fn test_copy_file_is_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        let from = temp_dir.path().join("a.json");
        let to = temp_dir.path().join("b.json");
        fs::write(&from, b"{ \"spacing\" :  1 }\n").unwrap();

        copy_file(&from, &to).unwrap();

        assert_eq!(fs::read(&from).unwrap(), fs::read(&to).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_refuses_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target.json");
        let link = temp_dir.path().join("link.json");
        fs::write(&target, b"{}").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(write_bytes(&link, b"{\"x\": 1}").is_err());
        assert_eq!(fs::read(&target).unwrap(), b"{}");
    }
}
