//! Fetches, patches, configures, and builds pinned Linux kernel versions.
//!
//! kernel-forge automates one job: take a kernel version pinned in
//! `conf/build.cfg`, download that tarball from the mirror, apply the local
//! patch, stage the kernel config and overlay headers, and drive the four
//! `make` steps that build and install the result onto the host.
//!
//! # Flow
//!
//! ```text
//! preflight ──► config ──► source ──► prepare ──► build
//!  (host OK?)   (build.cfg)  (fetch +   (patch,     (make, modules,
//!                            extract)   .config,     modules_install,
//!                                       headers)     install)
//! ```
//!
//! Every stage is a hard dependency of the next and every error is fatal;
//! there is no retry or rollback. A partially completed run leaves its
//! filesystem effects in place; re-running acquisition produces a clean
//! tree.
//!
//! # Installation root
//!
//! All inputs live at a fixed layout under the installation root (see
//! [`layout::Layout`]): `conf/build.cfg`, `conf/config-<version>`,
//! `src/linux-<version>.patch`, and `include/*.h`.

pub mod build;
pub mod config;
pub mod layout;
pub mod prepare;
pub mod preflight;
pub mod process;
pub mod source;

pub use config::BuildConfig;
pub use layout::Layout;
pub use process::Cmd;
