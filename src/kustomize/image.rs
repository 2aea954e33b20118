//! Image overrides from the `images` list.

use tracing::debug;

use super::manifest::KustomizeImage;
use crate::model::{Dependency, ImagePin};
use crate::traits::ExtractError;

/// Turns one `images` entry into a docker dependency.
///
/// The entry needs a `name` and at least one of `newTag` / `digest`.
/// `newName`, when given and non-empty, is the image that gets looked up.
pub fn extract_image(image: &KustomizeImage) -> Option<Dependency> {
    match resolve(image) {
        Ok(dep) => Some(dep),
        Err(e) => {
            debug!(error = %e, "Skipping image");
            None
        }
    }
}

fn resolve(image: &KustomizeImage) -> Result<Dependency, ExtractError> {
    let name = image
        .name
        .as_deref()
        .ok_or_else(|| ExtractError::reference("<unnamed image>", "missing 'name'"))?;

    let pin = ImagePin::classify(image.new_tag.clone(), image.digest.clone())
        .ok_or_else(|| ExtractError::reference(name, "neither 'newTag' nor 'digest' is set"))?;

    let dep_name = image.new_name.as_deref().unwrap_or(name);
    Ok(Dependency::docker(dep_name, &pin))
}
