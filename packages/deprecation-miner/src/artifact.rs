//! JSON artifacts on disk.
//!
//! Everything is written as pretty-printed UTF-8 JSON with non-ASCII text
//! left unescaped, so artifacts diff cleanly and read naturally.

use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{ArtifactError, ArtifactResult};
use crate::types::fact::DeprecationFact;
use crate::types::snippet::SnippetCase;

/// Write `value` to `path` as pretty-printed JSON, creating parent
/// directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> ArtifactResult<()> {
    let io_err = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut body = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    body.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, body).map_err(io_err)?;

    debug!(path = %path.display(), "Wrote artifact");
    Ok(())
}

/// Read a JSON artifact from `path`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> ArtifactResult<T> {
    let body = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&body).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist the aggregated fact list.
pub fn write_facts(path: &Path, facts: &[DeprecationFact]) -> ArtifactResult<()> {
    write_json(path, facts)
}

/// Load a fact list written by [`write_facts`].
pub fn read_facts(path: &Path) -> ArtifactResult<Vec<DeprecationFact>> {
    read_json(path)
}

/// Load the snippet cases to verify.
pub fn read_cases(path: &Path) -> ArtifactResult<Vec<SnippetCase>> {
    read_json(path)
}

/// Location of the bundled catalog, relative to the crate root.
const BUILTIN_CASES_PATH: &str = "cases/python_deprecations.json";

const BUILTIN_CASES: &str = include_str!("../cases/python_deprecations.json");

/// The bundled catalog of Python library deprecations, each with the
/// failure its old snippet is expected to show.
pub fn builtin_cases() -> ArtifactResult<Vec<SnippetCase>> {
    serde_json::from_str(BUILTIN_CASES).map_err(|source| ArtifactError::Json {
        path: BUILTIN_CASES_PATH.into(),
        source,
    })
}
