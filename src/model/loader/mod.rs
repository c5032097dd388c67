//! Loaders for semantic-layer project files.
//!
//! Currently supports:
//! - **YAML** (.yml, .yaml) - dbt-style `semantic_models:` and `metrics:` blocks
//!
//! A path may name a single file or a directory; directories are scanned
//! recursively and files are read in sorted path order.
//!
//! # Example
//!
//! ```rust,ignore
//! use lookgen::model::loader::load_project;
//! use std::path::Path;
//!
//! let project = load_project(Path::new("models/"))?;
//! ```

mod yaml;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::Project;

/// Errors that can occur when loading a project.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Unsupported file extension
    #[error("Unsupported file extension: {extension}. Supported: .yml, .yaml")]
    UnsupportedExtension { extension: String },

    /// IO error reading file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax or shape error
    #[error("YAML error in {file}: {source}")]
    Yaml {
        file: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Missing required field
    #[error("Missing required field '{field}' in {context}")]
    MissingField { field: String, context: String },

    /// Invalid field value
    #[error("Invalid value for '{field}' in {context}: {message}")]
    InvalidValue {
        field: String,
        context: String,
        message: String,
    },
}

/// Result type for project loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Load a project from a file or directory.
pub fn load_project(path: &Path) -> LoadResult<Project> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    if path.is_dir() {
        let mut files = Vec::new();
        collect_yaml_files(path, &mut files)?;
        files.sort();

        let mut project = Project::new();
        for file in files {
            project.extend(load_file(&file)?);
        }
        return Ok(project);
    }

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !is_yaml_extension(extension) {
        return Err(LoadError::UnsupportedExtension {
            extension: extension.to_string(),
        });
    }
    load_file(path)
}

/// Load a project from a YAML string (useful for testing).
///
/// # Example
///
/// ```rust,ignore
/// let yaml = r#"
/// semantic_models:
///   - name: searches
///     entities:
///       - { name: search, type: primary }
/// "#;
/// let project = load_project_from_str(yaml, "test.yml")?;
/// ```
pub fn load_project_from_str(content: &str, filename: &str) -> LoadResult<Project> {
    yaml::parse_str(content, filename)
}

fn load_file(path: &Path) -> LoadResult<Project> {
    let content = fs::read_to_string(path)?;
    yaml::parse_str(&content, &path.display().to_string())
}

fn collect_yaml_files(dir: &Path, files: &mut Vec<PathBuf>) -> LoadResult<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_yaml_files(&path, files)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(is_yaml_extension)
        {
            files.push(path);
        }
    }
    Ok(())
}

fn is_yaml_extension(extension: &str) -> bool {
    matches!(extension, "yml" | "yaml")
}
