//! The four-step kernel build driver.
//!
//! Runs the external build tool chain against a prepared source tree:
//! primary build, module build, module installation, kernel installation.
//! Each step is gated on the previous one's exit status; the first failure
//! aborts the run with nothing rolled back.
//!
//! `make install` and `make modules_install` write onto the host system.
//! Nothing here stages or sandboxes those effects.

use std::path::Path;

use anyhow::{bail, Result};

use crate::process::Cmd;

/// Run `make`, `make modules`, `make modules_install`, and `make install`
/// in strict order inside the tree.
///
/// The compile steps get `-j<jobs>`; the install steps run single-job, the
/// way the kernel's own documentation invokes them.
pub fn build_tree(tree: &Path, jobs: u32) -> Result<()> {
    if !tree.join("Makefile").exists() {
        bail!(
            "invalid kernel source at {}: no Makefile found",
            tree.display()
        );
    }

    let tree_arg = tree.to_string_lossy();
    let jobs_arg = format!("-j{jobs}");

    println!("Building kernel in {}...", tree.display());
    Cmd::new("make")
        .args(["-C", &tree_arg, &jobs_arg])
        .error_msg("Kernel build failed")
        .run_interactive()?;

    println!("  Building modules...");
    Cmd::new("make")
        .args(["-C", &tree_arg, &jobs_arg, "modules"])
        .error_msg("Module build failed")
        .run_interactive()?;

    println!("  Installing modules...");
    Cmd::new("make")
        .args(["-C", &tree_arg, "modules_install"])
        .error_msg("Module install failed")
        .run_interactive()?;

    println!("  Installing kernel...");
    Cmd::new("make")
        .args(["-C", &tree_arg, "install"])
        .error_msg("Kernel install failed")
        .run_interactive()?;

    Ok(())
}
