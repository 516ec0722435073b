//! Tag pruning — in-memory removal of obsolete image-stream tags.

use crate::crd::image_stream::ImageStream;

/// Remove every tag whose name is in `obsolete` from the stream.
///
/// Returns whether the stream was modified; persisting the result is the
/// caller's job, and the caller must have fetched the stream in the same
/// step to avoid racing a concurrent writer. Removal is stable: surviving
/// tags keep their relative order. Absent tags are a silent no-op — pruning
/// is best-effort cleanup.
pub fn prune_obsolete_tags(stream: &mut ImageStream, obsolete: &[String]) -> bool {
    let before = stream.spec.tags.len();
    stream
        .spec
        .tags
        .retain(|tag| !obsolete.iter().any(|name| *name == tag.name));
    stream.spec.tags.len() != before
}
