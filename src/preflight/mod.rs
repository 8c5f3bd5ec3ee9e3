//! Preflight checks run before any filesystem or network work.
//!
//! Validates the host up front so the build does not die halfway through
//! with a cryptic error: the host must be Linux (the build tool chain
//! installs straight onto it), and the external tools the run will invoke
//! must be on `PATH`.

use anyhow::{bail, Result};

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// External tools the build flow invokes.
///
/// Each tuple is (command_name, package_name).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("patch", "patch"), ("make", "make")];

/// Reject non-Linux hosts.
///
/// The final `make install` / `make modules_install` steps write kernel
/// artifacts onto the running system, which only makes sense on Linux.
pub fn check_platform() -> Result<()> {
    let os = std::env::consts::OS;
    if os != "linux" {
        bail!(
            "{} is not supported; kernel-forge builds on Linux hosts only",
            os
        );
    }
    Ok(())
}

/// Check that specific tools are available.
///
/// Returns `Err` listing every missing tool and the package providing it.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let mut missing = Vec::new();

    for (tool, package) in tools {
        if !command_exists(tool) {
            missing.push((*tool, *package));
        }
    }

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Full host validation: platform gate plus all of [`REQUIRED_TOOLS`].
pub fn check_host() -> Result<()> {
    check_platform()?;
    check_required_tools(REQUIRED_TOOLS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists() {
        // 'ls' should exist on any Unix system
        assert!(command_exists("ls"));
        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }

    #[test]
    fn test_check_required_tools_success() {
        let tools = &[("ls", "coreutils"), ("cat", "coreutils")];
        assert!(check_required_tools(tools).is_ok());
    }

    #[test]
    fn test_check_required_tools_failure_names_package() {
        let tools = &[("nonexistent_command_xyz", "fake-package")];
        let err = check_required_tools(tools).unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("nonexistent_command_xyz"));
        assert!(message.contains("fake-package"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_platform_gate_passes_on_linux() {
        assert!(check_platform().is_ok());
    }
}
