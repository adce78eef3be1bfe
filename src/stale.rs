//! Rebuild decisions over file modification times.

use crate::runtime::Timestamp;

/// A target's own artifact needs producing when it does not exist.
pub fn output_is_stale(output: Timestamp) -> bool {
    !output.exists()
}

/// Whether `source` must be recompiled.
///
/// It must when its object is missing or older than the source, or when the
/// source is newer than the target's existing output.
pub fn source_is_stale(
    source: Timestamp,
    object: Timestamp,
    output: Timestamp,
    force: bool,
) -> bool {
    force || source > object || (output.exists() && source > output)
}

/// Whether a dependency invalidates the target that consumes it.
///
/// `reference` is the consumer's output; a dependency artifact newer than it
/// counts even if the dependency itself did not need rebuilding this time.
pub fn dependency_is_stale(rebuilt: bool, output: Timestamp, reference: Timestamp) -> bool {
    rebuilt || (reference.exists() && output > reference)
}
