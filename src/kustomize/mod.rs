//! Kustomize manager - dependency extraction from `kustomization.yaml`.
//!
//! - **Manifest**: decoding and normalization via [`parse_kustomize`]
//! - **Bases**: remote base URLs via [`extract_base`]
//! - **Images**: image overrides via [`extract_image`]
//! - **Aggregation**: the full file via [`extract_package_file`]

pub mod base;
pub mod image;
pub mod manifest;

use tracing::trace;

use crate::config::ManagerConfig;
use crate::model::PackageFile;
use crate::traits::PackageManager;

pub use base::{extract_base, RemoteBase};
pub use image::extract_image;
pub use manifest::{parse_kustomize, KustomizeImage, Kustomization};

pub const MANAGER_ID: &str = "kustomize";

/// Extracts remote bases and image pins from a Kustomization.
///
/// Base dependencies come first, then image dependencies, each in document
/// order. Image dependencies carry the whole of `content` as their
/// replace string. Returns `None` if `content` is not a Kustomization or
/// nothing was found.
pub fn extract_package_file(content: &str) -> Option<PackageFile> {
    trace!("kustomize.extract_package_file()");

    let pkg = parse_kustomize(content)?;

    let bases = pkg.bases.iter().filter_map(|base| extract_base(base));
    let images = pkg
        .images
        .iter()
        .filter_map(extract_image)
        .map(|dep| dep.with_replace_string(content));

    PackageFile::from_deps(bases.chain(images).collect())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KustomizeManager;

impl PackageManager for KustomizeManager {
    fn manager_id(&self) -> &str {
        MANAGER_ID
    }

    fn default_config(&self) -> ManagerConfig {
        ManagerConfig::default()
    }

    fn extract_package_file(&self, content: &str) -> Option<PackageFile> {
        extract_package_file(content)
    }
}
