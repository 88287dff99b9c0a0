use crate::utils::error::Result;
use crate::utils::validation::validate_relative_path;
use std::path::{Path, PathBuf};

/// A project directory populated from in-memory file contents.
#[derive(Debug, Clone)]
pub struct FixtureProject {
    root: PathBuf,
}

impl FixtureProject {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes every `(relative path, contents)` pair below `root`.
    pub fn create<'a, I>(root: impl Into<PathBuf>, files: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let project = Self::new(root);
        std::fs::create_dir_all(&project.root)?;
        for (path, contents) in files {
            project.write_file(path, contents)?;
        }
        Ok(project)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> Result<PathBuf> {
        validate_relative_path("path", relative)?;
        Ok(self.root.join(relative))
    }

    pub fn write_file(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let full_path = self.path(relative)?;
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full_path, contents)?;
        tracing::debug!("Wrote {} ({} bytes)", full_path.display(), contents.len());
        Ok(full_path)
    }

    pub fn read_file(&self, relative: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.path(relative)?)?)
    }
}
