//! Screenshot copies placed next to a report, and cleanup of everything a
//! report run created

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::{io_error, ReportError};

/// Files and directories created by one report run
#[derive(Debug, Default)]
pub(crate) struct Artifacts {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl Artifacts {
    pub fn track_file(&mut self, path: &Path) {
        self.files.push(path.to_path_buf());
    }

    pub fn track_dir(&mut self, path: &Path) {
        self.dirs.push(path.to_path_buf());
    }

    /// Best-effort removal, newest first
    pub fn remove_all(&mut self) {
        for file in self.files.drain(..).rev() {
            if let Err(e) = fs::remove_file(&file) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %file.display(), error = %e, "could not remove report file");
                }
            }
        }
        for dir in self.dirs.drain(..).rev() {
            if let Err(e) = fs::remove_dir_all(&dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %dir.display(), error = %e, "could not remove report folder");
                }
            }
        }
    }
}

/// Copies screenshots into one folder and remembers the relative reference
/// for each original path
#[derive(Debug)]
pub(crate) struct ImageCopier {
    dest_dir: PathBuf,
    folder: String,
    references: HashMap<String, String>,
    used_names: HashSet<String>,
}

impl ImageCopier {
    pub fn new(dest_dir: PathBuf, folder: String) -> Self {
        Self {
            dest_dir,
            folder,
            references: HashMap::new(),
            used_names: HashSet::new(),
        }
    }

    /// Copy one image. Missing sources are skipped.
    pub fn copy(&mut self, original: &str, artifacts: &mut Artifacts) -> Result<(), ReportError> {
        if original.is_empty() || self.references.contains_key(original) {
            return Ok(());
        }
        let source = Path::new(original);
        if !source.is_file() {
            tracing::debug!(path = original, "skipping missing image");
            return Ok(());
        }

        if !self.dest_dir.exists() {
            fs::create_dir_all(&self.dest_dir).map_err(io_error(&self.dest_dir))?;
            artifacts.track_dir(&self.dest_dir);
        }

        let name = self.unique_name(source);
        let target = self.dest_dir.join(&name);
        artifacts.track_file(&target);
        fs::copy(source, &target).map_err(io_error(&target))?;

        self.references
            .insert(original.to_string(), format!("{}/{}", self.folder, name));
        Ok(())
    }

    /// Relative reference for a copied image
    pub fn reference(&self, original: &str) -> Option<&str> {
        self.references.get(original).map(String::as_str)
    }

    /// References for a record's images in order, skipping ones not copied
    pub fn references_for<'a>(&'a self, images: &'a [String]) -> impl Iterator<Item = &'a str> + 'a {
        images.iter().filter_map(move |p| self.reference(p))
    }

    /// File name in the destination, suffixed when two sources share a name
    fn unique_name(&mut self, source: &Path) -> String {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let mut candidate = file_name.clone();
        let mut n = 1;
        while self.used_names.contains(&candidate) || self.dest_dir.join(&candidate).exists() {
            let stem = Path::new(&file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            candidate = match Path::new(&file_name).extension() {
                Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
                None => format!("{}_{}", stem, n),
            };
            n += 1;
        }
        self.used_names.insert(candidate.clone());
        candidate
    }
}
