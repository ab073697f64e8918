//! Locating the marked region inside a source document.

use crate::domain::errors::{CompileError, MarkerKind};
use crate::domain::model::Markers;

/// Slice `source` from the start marker (inclusive) to the end marker (exclusive).
///
/// The end marker is searched for only after the start marker, so an end marker that
/// appears solely before the start is reported as missing.
pub fn extract_region<'a>(source: &'a str, markers: &Markers) -> Result<&'a str, CompileError> {
    let start = source
        .find(&markers.start)
        .ok_or_else(|| missing(MarkerKind::Start, &markers.start))?;

    let end = source[start..]
        .find(&markers.end)
        .map(|offset| start + offset)
        .ok_or_else(|| missing(MarkerKind::End, &markers.end))?;

    Ok(&source[start..end])
}

fn missing(kind: MarkerKind, marker: &str) -> CompileError {
    CompileError::MarkerNotFound {
        kind,
        marker: marker.to_owned(),
    }
}
