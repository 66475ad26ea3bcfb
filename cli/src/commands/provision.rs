//! `ionwf provision` — install the service binary under the runtime prefix.
//!
//! The copy is staged: the binary lands in `bin/ionwf-server.partial`, is
//! renamed into place, and the manifest recording the installed checksum is
//! written last. A re-run after an interrupted provision therefore sees no
//! manifest and repeats the install from scratch.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::output::OutputContext;

/// File name of the installed server binary.
pub const BINARY_FILENAME: &str = "ionwf-server";

/// Manifest written after a successful install.
pub const MANIFEST_FILENAME: &str = "manifest.json";

#[derive(Args)]
pub struct ProvisionArgs {
    /// Path to the server binary to install (defaults to an `ionwf-server`
    /// next to this executable)
    #[arg(long)]
    pub binary: Option<PathBuf>,

    /// Installation prefix
    #[arg(long, default_value = "/opt/ionwf")]
    pub prefix: PathBuf,

    /// Reinstall even if the installed binary is up to date
    #[arg(long)]
    pub force: bool,

    /// Report whether the prefix is provisioned without changing anything
    #[arg(long)]
    pub check: bool,
}

/// Record of what was installed, written to `<prefix>/manifest.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub sha256: String,
    pub installed_at: String,
}

/// Entry point for `ionwf provision`.
///
/// # Errors
///
/// Returns an error if argument validation, the source binary lookup, the
/// copy, or the manifest write fails.
pub fn run(ctx: &OutputContext, args: &ProvisionArgs) -> Result<()> {
    anyhow::ensure!(
        !(args.check && args.force),
        "--check and --force are mutually exclusive"
    );

    let source = resolve_source(args.binary.as_deref())?;

    match provision(&source, &args.prefix, args.force, args.check)? {
        Outcome::UpToDate(sha) => {
            ctx.success(&format!("Prefix up to date (sha256: {}...)", &sha[..12]));
        }
        Outcome::NotProvisioned => {
            ctx.info("Prefix not provisioned. Run `ionwf provision` to install.");
        }
        Outcome::Installed(dest) => {
            ctx.success(&format!("Installed {}", dest.display()));
            ctx.info("Run `ionwf install` to register the service.");
        }
    }
    Ok(())
}

/// What `provision` did (or would do, under `--check`).
#[derive(Debug)]
pub enum Outcome {
    /// Installed binary matches the source checksum.
    UpToDate(String),
    /// `--check` found no complete install.
    NotProvisioned,
    /// Binary was copied and the manifest written.
    Installed(PathBuf),
}

/// Copy the binary into the prefix unless it is already current.
///
/// # Errors
///
/// Returns an error on any filesystem failure; a partial install leaves no
/// manifest behind.
pub fn provision(source: &Path, prefix: &Path, force: bool, check: bool) -> Result<Outcome> {
    let source_sha = sha256_file(source)?;
    let bin_dir = prefix.join("bin");
    let dest = bin_dir.join(BINARY_FILENAME);

    if !force
        && dest.exists()
        && let Some(manifest) = load_manifest(prefix)?
        && manifest.sha256 == source_sha
    {
        return Ok(Outcome::UpToDate(source_sha));
    }

    if check {
        return Ok(Outcome::NotProvisioned);
    }

    std::fs::create_dir_all(&bin_dir)
        .with_context(|| format!("cannot create {}", bin_dir.display()))?;

    let partial = bin_dir.join(format!("{BINARY_FILENAME}.partial"));
    std::fs::copy(source, &partial)
        .with_context(|| format!("copying {} to {}", source.display(), partial.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&partial, std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("cannot set permissions on {}", partial.display()))?;
    }

    std::fs::rename(&partial, &dest).context("failed to finalize installed binary")?;

    write_manifest(
        prefix,
        &Manifest {
            version: env!("CARGO_PKG_VERSION").to_string(),
            sha256: source_sha,
            installed_at: chrono::Utc::now().to_rfc3339(),
        },
    )?;

    Ok(Outcome::Installed(dest))
}

/// Resolve `--binary` into a source path, defaulting to an `ionwf-server`
/// sitting next to the running executable.
fn resolve_source(flag: Option<&Path>) -> Result<PathBuf> {
    let path = match flag {
        Some(p) => p.to_path_buf(),
        None => {
            let exe = std::env::current_exe().context("cannot locate current executable")?;
            exe.parent()
                .map(|dir| dir.join(BINARY_FILENAME))
                .ok_or_else(|| anyhow::anyhow!("cannot locate current executable directory"))?
        }
    };
    anyhow::ensure!(
        path.is_file(),
        "server binary not found at {} (pass --binary)",
        path.display()
    );
    Ok(path)
}

/// Load the manifest from the prefix.
///
/// Returns `None` if the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be parsed.
fn load_manifest(prefix: &Path) -> Result<Option<Manifest>> {
    let path = prefix.join(MANIFEST_FILENAME);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let manifest = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(manifest))
}

/// Write the manifest. This is the last step of a provision; its presence
/// marks the install as complete.
fn write_manifest(prefix: &Path, manifest: &Manifest) -> Result<()> {
    let path = prefix.join(MANIFEST_FILENAME);
    let content = serde_json::to_string_pretty(manifest).context("serializing manifest")?;
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))
}

/// Compute the SHA256 digest of a file.
///
/// Returns the lowercase hex-encoded hash string.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub(crate) fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading binary")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
