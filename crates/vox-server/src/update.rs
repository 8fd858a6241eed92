//! Release lookup and self-update plumbing.
//!
//! Update checks query the GitHub releases API and compare dotted version
//! numbers numerically. Applying an update only works for a macOS .app
//! bundle install: the new bundle is staged in a temp directory and a
//! detached shell script swaps it in once this process exits.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A published release, as returned by the GitHub releases API.
#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    tag_name: String,
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
}

/// An available update: the new version and its installer archive.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateInfo {
    pub latest_version: String,
    pub download_url: String,
}

/// Errors from the self-update flow.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("failed to download update: {0}")]
    Download(String),
    #[error("{0}")]
    Unpack(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Numeric key for a dotted version string. Trailing zero segments are
/// dropped so "1.0" and "1.0.0" compare equal.
fn version_key(version: &str) -> Vec<u64> {
    let mut key: Vec<u64> = version
        .split('.')
        .map(|part| part.trim().parse().unwrap_or(0))
        .collect();
    while key.last() == Some(&0) {
        key.pop();
    }
    key
}

/// Whether `latest` is strictly newer than `current`. Segments compare
/// numerically, so "1.10.0" beats "1.9.0".
pub fn is_newer(latest: &str, current: &str) -> bool {
    if latest.is_empty() {
        return false;
    }
    version_key(latest) > version_key(current)
}

/// Picks the installer archive out of a release newer than `current`.
fn select_update(release: Release, current: &str) -> Option<UpdateInfo> {
    let latest = release.tag_name.trim_start_matches('v').to_string();
    if !is_newer(&latest, current) {
        return None;
    }

    release
        .assets
        .into_iter()
        .find(|asset| asset.name.ends_with(".zip"))
        .map(|asset| UpdateInfo {
            latest_version: latest,
            download_url: asset.browser_download_url,
        })
}

/// Queries the GitHub releases API for a version newer than `current`.
///
/// Every failure (network, HTTP status, missing zip asset) is logged and
/// reported as "no update available", never surfaced to the caller.
pub async fn check_for_update(
    client: &reqwest::Client,
    repo: &str,
    current: &str,
) -> Option<UpdateInfo> {
    let url = format!("https://api.github.com/repos/{}/releases/latest", repo);
    let release = match fetch_latest(client, &url).await {
        Ok(release) => release,
        Err(e) => {
            tracing::warn!("update check failed: {}", e);
            return None;
        }
    };

    select_update(release, current)
}

async fn fetch_latest(client: &reqwest::Client, url: &str) -> Result<Release, reqwest::Error> {
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<Release>()
        .await
}

/// Locates the .app bundle holding the running executable
/// (`Foo.app/Contents/MacOS/vox-server`), if there is one.
pub fn installed_bundle() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let bundle = exe.parent()?.parent()?.parent()?;
    if bundle.extension().is_some_and(|ext| ext == "app") {
        Some(bundle.to_path_buf())
    } else {
        None
    }
}

/// Downloads the release archive, unpacks it and launches the handoff
/// script that replaces `bundle` after this process exits.
pub async fn apply_update(
    client: &reqwest::Client,
    download_url: &str,
    bundle: &Path,
) -> Result<(), UpdateError> {
    // Staged outside RAII on purpose: the handoff script outlives this
    // process and removes the directory itself.
    let staging = tempfile::Builder::new()
        .prefix("vox_update_")
        .tempdir()?
        .keep();
    let archive_path = staging.join("update.zip");

    download_archive(client, download_url, &archive_path).await?;

    let extract_dir = staging.clone();
    tokio::task::spawn_blocking(move || -> Result<(), UpdateError> {
        let file = std::fs::File::open(&archive_path)?;
        let mut zip =
            zip::ZipArchive::new(file).map_err(|e| UpdateError::Unpack(e.to_string()))?;
        zip.extract(&extract_dir)
            .map_err(|e| UpdateError::Unpack(e.to_string()))?;
        Ok(())
    })
    .await
    .map_err(|e| UpdateError::Unpack(format!("task join error: {}", e)))??;

    let new_bundle = find_bundle(&staging)?.ok_or_else(|| {
        UpdateError::Unpack("No .app bundle found in the downloaded zip.".to_string())
    })?;

    tracing::info!(from = %new_bundle.display(), to = %bundle.display(), "staged update bundle");
    launch_handoff(&staging, bundle, &new_bundle)
}

async fn download_archive(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<(), UpdateError> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| UpdateError::Download(e.to_string()))?;

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| UpdateError::Download(e.to_string()))?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

fn find_bundle(dir: &Path) -> Result<Option<PathBuf>, std::io::Error> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "app") {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Writes and launches the script that swaps the old bundle for the new
/// one. The script waits out this process's exit, relaunches the app, then
/// removes the staging directory.
fn launch_handoff(staging: &Path, old_bundle: &Path, new_bundle: &Path) -> Result<(), UpdateError> {
    let script = format!(
        "#!/bin/bash\n\
         sleep 4\n\
         rm -rf \"{old}\"\n\
         mv \"{new}\" \"{old}\"\n\
         open \"{old}\"\n\
         rm -rf \"{staging}\"\n",
        old = old_bundle.display(),
        new = new_bundle.display(),
        staging = staging.display(),
    );
    let script_path = staging.join("update.sh");
    std::fs::write(&script_path, script)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755))?;
    }

    let mut command = std::process::Command::new("/bin/bash");
    command.arg(&script_path);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command.spawn()?;
    Ok(())
}
