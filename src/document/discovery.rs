//! Path discovery inside a CID.
//!
//! When the file path is not known up front, candidates are probed one at a
//! time and the first that looks like a PDF wins.

use crate::document::{DocumentLocation, DocumentSource, ProbeResponse};
use crate::error::{Error, Result};
use tracing::{debug, info};

/// Conventional locations tried after any explicit override.
/// The empty path is the CID root itself.
pub const CONVENTIONAL_PATHS: &[&str] = &["", "docs.pdf", "document.pdf", "index.pdf", "file.pdf"];

/// Ordered candidate paths: the override first, then the conventional
/// list, without duplicates.
#[must_use]
pub fn candidate_paths(override_path: Option<&str>) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::with_capacity(CONVENTIONAL_PATHS.len() + 1);
    let explicit = override_path.map(|p| p.trim_matches('/'));
    for path in explicit.into_iter().chain(CONVENTIONAL_PATHS.iter().copied()) {
        if !candidates.iter().any(|c| c == path) {
            candidates.push(path.to_string());
        }
    }
    candidates
}

/// Whether a probe confirms `path` as the PDF.
#[must_use]
pub fn confirms(path: &str, probe: &ProbeResponse) -> bool {
    if !probe.is_success() {
        return false;
    }
    let pdf_type = probe
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("pdf"));
    pdf_type || path.to_ascii_lowercase().ends_with(".pdf")
}

/// Probe `candidates` under `base` in order and return the first confirmed
/// location.
///
/// Probes are sequential and stop at the first confirmation. A probe that
/// errors or times out counts as unconfirmed.
///
/// # Errors
///
/// Returns [`Error::NotLocated`] listing every URL tried when nothing
/// confirms.
pub async fn locate(
    source: &dyn DocumentSource,
    base: &DocumentLocation,
    candidates: &[String],
) -> Result<DocumentLocation> {
    let mut tried = Vec::with_capacity(candidates.len());

    for path in candidates {
        let location = base.with_path(path);
        let url = location.url();

        match source.probe(&url).await {
            Ok(probe) if confirms(&location.path, &probe) => {
                info!("Located document at {url}");
                return Ok(location);
            }
            Ok(probe) => debug!(
                "Candidate {url} not confirmed (status {}, type {:?})",
                probe.status, probe.content_type
            ),
            Err(e) => debug!("Candidate {url} probe failed: {e}"),
        }
        tried.push(url);
    }

    Err(Error::NotLocated { tried })
}
