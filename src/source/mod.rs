//! Kernel source acquisition: download and extraction.
//!
//! The mirror layout is versioned twice: the major version selects the
//! `v<major>.x` directory and the full version selects the tarball name.
//! Acquisition always replaces whatever is already on disk for the
//! configured version, so after [`acquire`] exactly one extracted tree
//! exists at the canonical path and no archive is left behind.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;

use crate::config::BuildConfig;

/// Download URL for one kernel version.
pub fn archive_url(mirror: &str, version: &str) -> String {
    let major = version.split('.').next().unwrap_or(version);
    format!("{mirror}/v{major}.x/linux-{version}.tar.gz")
}

/// Tarball filename for one kernel version.
pub fn archive_filename(version: &str) -> String {
    format!("linux-{version}.tar.gz")
}

/// Where the downloaded tarball lands before extraction.
pub fn archive_path(source_dir: &Path, version: &str) -> PathBuf {
    source_dir.join(archive_filename(version))
}

/// The canonical extracted source tree for one version.
pub fn tree_path(source_dir: &Path, version: &str) -> PathBuf {
    source_dir.join(format!("linux-{version}"))
}

/// Fetch `url` into `dest`, failing on any non-success HTTP status.
pub fn download(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::blocking::get(url)
        .with_context(|| format!("fetching '{url}'"))?
        .error_for_status()
        .with_context(|| format!("fetching '{url}'"))?;

    let mut file = fs::File::create(dest)
        .with_context(|| format!("creating download target '{}'", dest.display()))?;
    response
        .copy_to(&mut file)
        .with_context(|| format!("writing '{}'", dest.display()))?;
    Ok(())
}

/// Unpack a gzip-compressed tarball into `dest_dir`.
pub fn extract_archive(archive: &Path, dest_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive)
        .with_context(|| format!("opening archive '{}'", archive.display()))?;
    tar::Archive::new(GzDecoder::new(file))
        .unpack(dest_dir)
        .with_context(|| {
            format!(
                "extracting '{}' into '{}'",
                archive.display(),
                dest_dir.display()
            )
        })?;
    Ok(())
}

/// Download and extract the configured kernel version.
///
/// Replaces any pre-existing archive or extracted tree for this version and
/// deletes the archive once extraction succeeds. Returns the path to the
/// extracted tree.
pub fn acquire(config: &BuildConfig) -> Result<PathBuf> {
    let version = &config.kernel_version;
    let url = archive_url(&config.mirror, version);
    let archive = archive_path(&config.source_dir, version);
    let tree = tree_path(&config.source_dir, version);

    fs::create_dir_all(&config.source_dir).with_context(|| {
        format!(
            "creating source directory '{}'",
            config.source_dir.display()
        )
    })?;

    if archive.exists() {
        fs::remove_file(&archive)
            .with_context(|| format!("removing stale archive '{}'", archive.display()))?;
    }

    println!("Downloading linux-{}...", version);
    println!("  URL: {}", url);
    download(&url, &archive)?;

    if tree.exists() {
        println!("  Replacing existing source tree {}", tree.display());
        fs::remove_dir_all(&tree)
            .with_context(|| format!("removing existing source tree '{}'", tree.display()))?;
    }

    println!("  Extracting {}...", archive.display());
    extract_archive(&archive, &config.source_dir)?;

    fs::remove_file(&archive)
        .with_context(|| format!("removing extracted archive '{}'", archive.display()))?;

    if !tree.is_dir() {
        bail!(
            "archive did not contain linux-{}/ (expected {})",
            version,
            tree.display()
        );
    }

    println!("  Source tree ready at {}", tree.display());
    Ok(tree)
}
