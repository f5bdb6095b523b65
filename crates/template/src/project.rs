//! Project files: everything needed to generate a batch of certificates
//!
//! ```json
//! {
//!   "template": "template.png",
//!   "fields": [{"name": "Name", "x": 50, "y": 180, "size": 40, "align": "center", "box_width": 700}],
//!   "data": "names.csv",
//!   "format": "pdf",
//!   "filename_pattern": "{index:3}_{Name}",
//!   "output_dir": "out"
//! }
//! ```
//!
//! Relative paths are resolved against the directory holding the project file.

use crate::parser::validate_fields;
use crate::schema::{OutputFormat, TextField};
use crate::{Result, TemplateError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Template image
    pub template: PathBuf,

    #[serde(default)]
    pub fields: Vec<TextField>,

    /// CSV dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,

    #[serde(default)]
    pub format: OutputFormat,

    /// See [`crate::filename`]
    #[serde(default)]
    pub filename_pattern: String,

    /// Field used for file names when the pattern is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_field: Option<String>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Project {
    pub fn new(template: impl Into<PathBuf>, fields: Vec<TextField>) -> Self {
        Self {
            template: template.into(),
            fields,
            data: None,
            format: OutputFormat::default(),
            filename_pattern: String::new(),
            filename_field: None,
            output_dir: default_output_dir(),
        }
    }

    /// Parse a project from JSON without touching any paths
    pub fn from_json(json: &str) -> Result<Self> {
        let project: Project =
            serde_json::from_str(json).map_err(|e| TemplateError::ProjectError(e.to_string()))?;
        validate_fields(&project.fields)?;
        Ok(project)
    }

    /// Load a project file and resolve its relative paths
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            TemplateError::ProjectError(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut project = Self::from_json(&json)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        project.template = resolve(base, &project.template);
        project.data = project.data.map(|d| resolve(base, &d));
        project.output_dir = resolve(base, &project.output_dir);
        Ok(project)
    }

    /// Write the project as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Field naming output files when the pattern is empty; defaults to the
    /// first field, or `"output"` without fields
    pub fn filename_field(&self) -> String {
        self.filename_field
            .clone()
            .filter(|f| !f.trim().is_empty())
            .or_else(|| self.fields.first().map(|f| f.name.clone()))
            .unwrap_or_else(|| "output".to_string())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
