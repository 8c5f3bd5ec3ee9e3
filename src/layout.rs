//! Installation-root path conventions.
//!
//! Everything the builder reads lives at a fixed layout under the
//! installation root:
//!
//! ```text
//! <root>/conf/build.cfg          configuration
//! <root>/conf/config-<version>   kernel config per version
//! <root>/src/linux-<version>.patch   patch per version
//! <root>/include/*.h             header overlay set
//! ```
//!
//! This module only defines WHERE things are, not HOW they are used.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Path bundle rooted at the installation directory.
#[derive(Debug, Clone)]
pub struct Layout {
    base_dir: PathBuf,
}

impl Layout {
    /// Create a layout rooted at an explicit installation directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Resolve the installation root from the running executable.
    ///
    /// The binary is installed at `<root>/bin/kernel-forge`, so the root is
    /// the grandparent of the resolved executable path. Symlinks are
    /// followed first so a linked binary still finds its real root.
    pub fn discover() -> Result<Self> {
        let exe = std::env::current_exe().context("resolving current executable path")?;
        let exe = exe
            .canonicalize()
            .with_context(|| format!("canonicalizing executable path '{}'", exe.display()))?;
        let base_dir = exe
            .parent()
            .and_then(|bin_dir| bin_dir.parent())
            .with_context(|| {
                format!(
                    "executable '{}' has no grandparent installation root",
                    exe.display()
                )
            })?
            .to_path_buf();
        Ok(Self::new(base_dir))
    }

    /// The installation root itself.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `conf/build.cfg`, the build configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("conf").join("build.cfg")
    }

    /// `conf/config-<version>`, the kernel config for one version.
    pub fn kernel_config(&self, version: &str) -> PathBuf {
        self.base_dir.join("conf").join(format!("config-{version}"))
    }

    /// `src/linux-<version>.patch`, the patch for one version.
    pub fn patch_file(&self, version: &str) -> PathBuf {
        self.base_dir
            .join("src")
            .join(format!("linux-{version}.patch"))
    }

    /// `include/`, the header overlay directory.
    pub fn include_dir(&self) -> PathBuf {
        self.base_dir.join("include")
    }
}
