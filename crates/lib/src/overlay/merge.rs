//! Overlay merging.
//!
//! A derived source root is a structural copy of the base with one or more
//! overlay directories laid on top. Layers are applied in order and the last
//! one to provide a path wins. Files only present in the base are carried
//! through; nothing is ever deleted from the copy and the base is never
//! written.
//!
//! Variants are assembled in a staging directory next to their final location
//! and renamed into place. The completion marker is a sibling file written
//! last, so an interrupted merge cannot be mistaken for a finished one and the
//! variant itself holds nothing but base and overlay files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::consts::{COMPLETE_SUFFIX, STAGING_SUFFIX};
use crate::overlay::{OverlayError, PatchSet, SourceOrigin, SourceRoot};
use crate::util::hash::hash_directory;
use crate::version::TargetVersion;

/// Contents of the completion marker written next to every finished variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantMarker {
  /// Marker format version.
  pub version: u32,
  pub target: TargetVersion,
  pub layers: Vec<PathBuf>,
  /// Hash of the variant contents.
  pub content_hash: String,
}

/// Produces derived source roots under a single variants directory.
#[derive(Debug, Clone)]
pub struct OverlayEngine {
  variants_dir: PathBuf,
}

impl OverlayEngine {
  pub fn new(variants_dir: impl Into<PathBuf>) -> Self {
    Self {
      variants_dir: variants_dir.into(),
    }
  }

  pub fn variants_dir(&self) -> &Path {
    &self.variants_dir
  }

  /// Version-unique location of the variant for `version`.
  pub fn variant_path(&self, version: TargetVersion) -> PathBuf {
    self.variants_dir.join(version.to_string())
  }

  /// Merge `patch` onto `base`, producing the variant for the patch's target.
  pub fn merge(&self, base: &SourceRoot, patch: &PatchSet) -> Result<SourceRoot, OverlayError> {
    if patch.base != base.name {
      return Err(OverlayError::BaseMismatch {
        patch: patch.name.clone(),
        expected: patch.base.clone(),
        actual: base.name.clone(),
      });
    }

    let mut root = merge_layers(
      base,
      std::slice::from_ref(&patch.dir),
      patch.target,
      &self.variant_path(patch.target),
    )?;
    root.name = patch.name.clone();
    Ok(root)
  }

  /// Remove every variant and leftover staging directory.
  ///
  /// Variants are regenerated on every build, so nothing here is reusable.
  pub fn clear(&self) -> Result<(), OverlayError> {
    if self.variants_dir.exists() {
      debug!(path = ?self.variants_dir, "clearing variants");
      fs::remove_dir_all(&self.variants_dir).map_err(|e| OverlayError::io(&self.variants_dir, e))?;
    }
    Ok(())
  }
}

/// Merge `layers` onto `base` in order, writing the result to `dest`.
///
/// Any existing directory at `dest` is replaced. A layer directory that does
/// not exist contributes nothing.
pub fn merge_layers(
  base: &SourceRoot,
  layers: &[PathBuf],
  version: TargetVersion,
  dest: &Path,
) -> Result<SourceRoot, OverlayError> {
  if !base.path.is_dir() {
    return Err(OverlayError::MissingBase(base.path.clone()));
  }

  for input in std::iter::once(&base.path).chain(layers) {
    check_no_overlap(dest, input)?;
  }

  info!(
    base = %base.name,
    version = %version,
    layers = layers.len(),
    dest = ?dest,
    "merging overlay"
  );

  let staging = staging_path(dest);
  let marker = marker_path(dest);
  remove_if_exists(&marker)?;
  remove_if_exists(&staging)?;
  remove_if_exists(dest)?;

  copy_tree(&base.path, &staging)?;

  for layer in layers {
    if !layer.is_dir() {
      warn!(layer = ?layer, version = %version, "patch directory does not exist, nothing to overlay");
      continue;
    }
    let applied = copy_tree(layer, &staging)?;
    debug!(layer = ?layer, files = applied, "applied overlay layer");
  }

  let content_hash = hash_directory(&staging, &[])?;

  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent).map_err(|e| OverlayError::io(parent, e))?;
  }
  fs::rename(&staging, dest).map_err(|e| OverlayError::io(dest, e))?;

  write_marker(&marker, version, layers, content_hash.0)?;

  Ok(SourceRoot {
    name: format!("{}-{}", base.name, version),
    path: dest.to_path_buf(),
    version,
    origin: SourceOrigin::Derived,
  })
}

/// Read the completion marker of a variant, if present.
pub fn read_marker(variant: &Path) -> Result<Option<VariantMarker>, OverlayError> {
  let path = marker_path(variant);
  if !path.exists() {
    return Ok(None);
  }
  let content = fs::read_to_string(&path).map_err(|e| OverlayError::io(&path, e))?;
  Ok(Some(serde_json::from_str(&content)?))
}

/// True if `variant` has a marker whose hash matches its current contents.
pub fn is_complete(variant: &Path) -> bool {
  match read_marker(variant) {
    Ok(Some(marker)) => hash_directory(variant, &[])
      .map(|hash| hash.0 == marker.content_hash)
      .unwrap_or(false),
    _ => false,
  }
}

/// Location of the completion marker for the variant at `variant`.
pub fn marker_path(variant: &Path) -> PathBuf {
  sibling(variant, COMPLETE_SUFFIX)
}

pub(crate) fn staging_path(dest: &Path) -> PathBuf {
  sibling(dest, STAGING_SUFFIX)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
  let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(suffix);
  path.with_file_name(name)
}

fn write_marker(
  marker_path: &Path,
  version: TargetVersion,
  layers: &[PathBuf],
  content_hash: String,
) -> Result<(), OverlayError> {
  let marker = VariantMarker {
    version: 1,
    target: version,
    layers: layers.to_vec(),
    content_hash,
  };
  let content = serde_json::to_string(&marker)?;
  fs::write(marker_path, format!("{}\n", content)).map_err(|e| OverlayError::io(marker_path, e))
}

fn remove_if_exists(path: &Path) -> Result<(), OverlayError> {
  if path.is_dir() {
    fs::remove_dir_all(path).map_err(|e| OverlayError::io(path, e))?;
  } else if path.exists() {
    fs::remove_file(path).map_err(|e| OverlayError::io(path, e))?;
  }
  Ok(())
}

fn check_no_overlap(dest: &Path, input: &Path) -> Result<(), OverlayError> {
  let abs = |p: &Path| std::path::absolute(p).map_err(|e| OverlayError::io(p, e));
  let dest_abs = abs(dest)?;
  let input_abs = abs(input)?;
  if dest_abs.starts_with(&input_abs) || input_abs.starts_with(&dest_abs) {
    return Err(OverlayError::Overlap {
      dest: dest.to_path_buf(),
      input: input.to_path_buf(),
    });
  }
  Ok(())
}

/// Copy every file under `src` into `dst` at the same relative path,
/// replacing whatever is already there. Symlinks are followed and copied as
/// the file they point to. Returns the number of files written.
fn copy_tree(src: &Path, dst: &Path) -> Result<usize, OverlayError> {
  let mut copied = 0;

  for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
    let entry = entry.map_err(|e| OverlayError::Walk {
      path: src.to_path_buf(),
      message: e.to_string(),
    })?;
    let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
    let target = dst.join(rel);

    if entry.file_type().is_dir() {
      if target.exists() && !target.is_dir() {
        fs::remove_file(&target).map_err(|e| OverlayError::io(&target, e))?;
      }
      fs::create_dir_all(&target).map_err(|e| OverlayError::io(&target, e))?;
    } else if entry.file_type().is_file() {
      if target.is_dir() {
        fs::remove_dir_all(&target).map_err(|e| OverlayError::io(&target, e))?;
      }
      fs::copy(entry.path(), &target).map_err(|e| OverlayError::io(entry.path(), e))?;
      copied += 1;
    }
  }

  Ok(copied)
}
