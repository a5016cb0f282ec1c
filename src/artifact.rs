//! Artifact URL builder (C13): builds the URL a launched task fetches its
//! artifacts from.

use crate::config::Config;

/// Literal string concatenation, deliberately not URL-encoded. `job_name`
/// containing a slash silently corrupts the resulting path rather than
/// being rejected or escaped; this quirk is preserved rather than fixed,
/// since fixing it is a wire-format change outside this crate's scope.
pub fn build_artifact_url(
    service_name: &str,
    job_name: &str,
    uuid: &str,
    pod: &str,
    task: &str,
    config: &Config,
) -> String {
    let base = &config.artifact_base_path;
    format!("{base}/{service_name}/{job_name}/{uuid}/{pod}/{task}")
}
