use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use kernel_forge::{build, prepare, preflight, source, BuildConfig, Layout};

fn usage() -> &'static str {
    "Usage:\n  kernel-forge build [base_dir]\n  kernel-forge prepare [base_dir]\n  kernel-forge status [base_dir]\n\nbase_dir defaults to the installation root the binary runs from."
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [cmd] if cmd == "build" => cmd_build(&resolve_layout(None)?),
        [cmd, base] if cmd == "build" => cmd_build(&resolve_layout(Some(base))?),
        [cmd] if cmd == "prepare" => cmd_prepare(&resolve_layout(None)?),
        [cmd, base] if cmd == "prepare" => cmd_prepare(&resolve_layout(Some(base))?),
        [cmd] if cmd == "status" => cmd_status(&resolve_layout(None)?),
        [cmd, base] if cmd == "status" => cmd_status(&resolve_layout(Some(base))?),
        _ => bail!(usage()),
    }
}

fn resolve_layout(base_dir: Option<&String>) -> Result<Layout> {
    match base_dir {
        Some(dir) => Ok(Layout::new(PathBuf::from(dir))),
        None => Layout::discover(),
    }
}

fn load_config(layout: &Layout) -> Result<BuildConfig> {
    let path = layout.config_file();
    BuildConfig::load(&path)
        .with_context(|| format!("loading configuration '{}'", path.display()))
}

/// Acquire and prepare the configured source tree.
fn run_prepare(layout: &Layout) -> Result<(BuildConfig, PathBuf)> {
    preflight::check_host()?;
    let config = load_config(layout)?;

    let tree = source::acquire(&config)?;
    prepare::prepare_tree(layout, &config, &tree)?;

    Ok((config, tree))
}

fn cmd_prepare(layout: &Layout) -> Result<()> {
    let (config, tree) = run_prepare(layout)?;
    println!();
    println!(
        "linux-{} prepared at {}",
        config.kernel_version,
        tree.display()
    );
    println!("Next: kernel-forge build");
    Ok(())
}

fn cmd_build(layout: &Layout) -> Result<()> {
    let (config, tree) = run_prepare(layout)?;
    build::build_tree(&tree, config.make_jobs)?;
    println!();
    println!("=== linux-{} built and installed ===", config.kernel_version);
    Ok(())
}

fn cmd_status(layout: &Layout) -> Result<()> {
    println!("kernel-forge status");
    println!("===================");
    println!();
    println!("Installation root: {}", layout.base_dir().display());

    let config_file = layout.config_file();
    if !config_file.exists() {
        println!("  Config:        NOT FOUND at {}", config_file.display());
        return Ok(());
    }

    let config = load_config(layout)?;
    println!();
    println!("Configuration:");
    println!("  Version:       {}", config.kernel_version);
    println!("  Source dir:    {}", config.source_dir.display());
    println!("  Mirror:        {}", config.mirror);
    println!("  Make jobs:     {}", config.make_jobs);
    println!();

    let version = &config.kernel_version;
    println!("Inputs:");
    report_path("Patch", &layout.patch_file(version));
    report_path("Kernel config", &layout.kernel_config(version));
    report_path("Header overlay", &layout.include_dir());
    println!();

    let tree = source::tree_path(&config.source_dir, version);
    println!("Source tree:");
    if tree.join("Makefile").exists() {
        println!("  linux-{}:   EXTRACTED at {}", version, tree.display());
        if tree.join(".config").exists() {
            println!("  .config:       INSTALLED");
        } else {
            println!("  .config:       NOT INSTALLED (run 'kernel-forge prepare')");
        }
    } else {
        println!("  linux-{}:   NOT EXTRACTED (run 'kernel-forge prepare')", version);
    }

    Ok(())
}

fn report_path(label: &str, path: &Path) {
    if path.exists() {
        println!("  {:<14}FOUND at {}", format!("{label}:"), path.display());
    } else {
        println!("  {:<14}NOT FOUND at {}", format!("{label}:"), path.display());
    }
}
