//! Generic image-stream reconciler — "ensure this desired stream exists and
//! its tags match".
//!
//! Used for the sub-resources that are upgraded as whole objects (application
//! base images, redis and database streams) rather than surgically patched.
//! The policy is merge-only: desired tags are appended or corrected, tags
//! this operator does not declare are left alone. Stale tags are removed by
//! the tag pruner in its own step, never here.

use tracing::{debug, info};

use crate::crd::image_stream::ImageStream;
use crate::error::{Error, Result};
use crate::store::ObjectStore;

/// Reconcile `desired` against the store. Returns whether a write occurred;
/// at most one write (create or update) happens per call.
pub async fn ensure_image_stream<S: ObjectStore + ?Sized>(
    store: &S,
    desired: &ImageStream,
) -> Result<bool> {
    let name = desired.metadata.name.as_deref().unwrap_or_default();

    let mut existing = match store.get_image_stream(name).await {
        Ok(stream) => stream,
        Err(Error::NotFound { .. }) => {
            info!(%name, "creating ImageStream");
            store.create_image_stream(desired).await?;
            return Ok(true);
        }
        Err(e) => return Err(e),
    };

    let mut changed = false;
    for tag in &desired.spec.tags {
        match existing.spec.tags.iter_mut().find(|t| t.name == tag.name) {
            Some(current) if current.from != tag.from => {
                debug!(%name, tag = %tag.name, "correcting drifted tag reference");
                current.from = tag.from.clone();
                changed = true;
            }
            Some(_) => {}
            None => {
                debug!(%name, tag = %tag.name, "adding missing tag");
                existing.spec.tags.push(tag.clone());
                changed = true;
            }
        }
    }

    if changed {
        info!(%name, "updating ImageStream");
        store.update_image_stream(&existing).await?;
    }
    Ok(changed)
}
