//! Source preparation: patch, kernel config, header overlay.
//!
//! Runs between acquisition and the build driver. The three sub-steps are
//! strictly ordered and each failure is fatal; a partially prepared tree is
//! not rolled back; re-running acquisition yields a clean one.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::BuildConfig;
use crate::layout::Layout;
use crate::process::Cmd;

/// Apply the version-specific patch to the extracted tree.
///
/// The patch file is checked for existence first, like the kernel config
/// below, so a missing patch fails naming the version instead of
/// surfacing as a `patch` tool error.
pub fn apply_patch(tree: &Path, patch_file: &Path, version: &str) -> Result<()> {
    if !patch_file.exists() {
        bail!(
            "failed to find linux-{}.patch (expected {})",
            version,
            patch_file.display()
        );
    }

    println!("  Applying {}...", patch_file.display());
    Cmd::new("patch")
        .arg("-d")
        .arg_path(tree)
        .args(["-p1", "-i"])
        .arg_path(patch_file)
        .error_msg("patch application failed")
        .run()
}

/// Install the version-specific kernel config as the tree's `.config`.
///
/// Fails naming the version when the config file is absent, before any
/// copy is attempted. An existing `.config` is overwritten.
pub fn install_kernel_config(tree: &Path, config_file: &Path, version: &str) -> Result<()> {
    if !config_file.exists() {
        bail!(
            "failed to find config-{} (expected {})",
            version,
            config_file.display()
        );
    }

    let dest = tree.join(".config");
    fs::copy(config_file, &dest).with_context(|| {
        format!(
            "installing '{}' as '{}'",
            config_file.display(),
            dest.display()
        )
    })?;
    println!("  Installed .config from {}", config_file.display());
    Ok(())
}

/// Copy every `*.h` file from the overlay directory into the tree's
/// `include/linux/`, overwriting on name collision.
///
/// Returns the number of headers copied. Non-header files are skipped.
pub fn overlay_headers(include_dir: &Path, tree: &Path) -> Result<usize> {
    let dest_dir = tree.join("include").join("linux");
    fs::create_dir_all(&dest_dir)
        .with_context(|| format!("creating overlay destination '{}'", dest_dir.display()))?;

    let entries = fs::read_dir(include_dir)
        .with_context(|| format!("reading overlay directory '{}'", include_dir.display()))?;

    let mut copied = 0;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("reading overlay directory '{}'", include_dir.display()))?;
        let path = entry.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != "h") {
            continue;
        }
        // file_name is always present for read_dir entries
        let name = entry.file_name();
        let dest = dest_dir.join(&name);
        fs::copy(&path, &dest)
            .with_context(|| format!("copying header '{}' to '{}'", path.display(), dest.display()))?;
        copied += 1;
    }

    Ok(copied)
}

/// Run the full preparation flow against an extracted tree.
pub fn prepare_tree(layout: &Layout, config: &BuildConfig, tree: &Path) -> Result<()> {
    let version = &config.kernel_version;
    println!("Preparing linux-{}...", version);

    apply_patch(tree, &layout.patch_file(version), version)?;
    install_kernel_config(tree, &layout.kernel_config(version), version)?;

    let copied = overlay_headers(&layout.include_dir(), tree)?;
    println!("  Overlaid {} header(s) into include/linux", copied);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preflight::command_exists;

    #[test]
    fn missing_kernel_config_fails_before_copying() {
        let temp = tempfile::tempdir().unwrap();
        let tree = temp.path().join("linux-0.0.1");
        fs::create_dir_all(&tree).unwrap();

        let err = install_kernel_config(&tree, &temp.path().join("config-0.0.1"), "0.0.1")
            .unwrap_err();
        assert!(format!("{err}").contains("config-0.0.1"));
        assert!(!tree.join(".config").exists());
    }

    #[test]
    fn kernel_config_overwrites_existing_dot_config() {
        let temp = tempfile::tempdir().unwrap();
        let tree = temp.path().join("linux-0.0.1");
        fs::create_dir_all(&tree).unwrap();
        fs::write(tree.join(".config"), "CONFIG_OLD=y\n").unwrap();

        let config_file = temp.path().join("config-0.0.1");
        fs::write(&config_file, "CONFIG_NEW=y\n").unwrap();

        install_kernel_config(&tree, &config_file, "0.0.1").unwrap();
        let installed = fs::read_to_string(tree.join(".config")).unwrap();
        assert_eq!(installed, "CONFIG_NEW=y\n");
    }

    #[test]
    fn overlay_copies_only_headers_and_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let include_dir = temp.path().join("include");
        fs::create_dir_all(&include_dir).unwrap();
        fs::write(include_dir.join("vres.h"), "#define VRES 1\n").unwrap();
        fs::write(include_dir.join("klnk.h"), "#define KLNK 1\n").unwrap();
        fs::write(include_dir.join("notes.txt"), "not a header\n").unwrap();

        let tree = temp.path().join("linux-0.0.1");
        let dest = tree.join("include/linux");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("vres.h"), "stale\n").unwrap();

        let copied = overlay_headers(&include_dir, &tree).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(
            fs::read_to_string(dest.join("vres.h")).unwrap(),
            "#define VRES 1\n"
        );
        assert!(dest.join("klnk.h").is_file());
        assert!(!dest.join("notes.txt").exists());
    }

    #[test]
    fn missing_patch_file_fails_naming_the_version() {
        let temp = tempfile::tempdir().unwrap();
        let tree = temp.path().join("linux-0.0.1");
        fs::create_dir_all(&tree).unwrap();

        let err = apply_patch(&tree, &temp.path().join("linux-0.0.1.patch"), "0.0.1")
            .unwrap_err();
        assert!(format!("{err}").contains("linux-0.0.1.patch"));
    }

    #[test]
    fn patch_is_applied_to_the_tree() {
        if !command_exists("patch") {
            eprintln!("skipping: patch not installed");
            return;
        }

        let temp = tempfile::tempdir().unwrap();
        let tree = temp.path().join("linux-0.0.1");
        fs::create_dir_all(&tree).unwrap();
        fs::write(tree.join("greeting.txt"), "hello\n").unwrap();

        let patch_file = temp.path().join("linux-0.0.1.patch");
        fs::write(
            &patch_file,
            "--- a/greeting.txt\n\
             +++ b/greeting.txt\n\
             @@ -1 +1 @@\n\
             -hello\n\
             +patched\n",
        )
        .unwrap();

        apply_patch(&tree, &patch_file, "0.0.1").unwrap();
        assert_eq!(
            fs::read_to_string(tree.join("greeting.txt")).unwrap(),
            "patched\n"
        );
    }
}
