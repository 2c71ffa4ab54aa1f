use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

use crate::config::HostConfig;
use crate::error::{LensError, Result};
use super::{ExtensionHost, ExtensionInfo};

/// `package.json` fields we care about
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    name: String,
    display_name: Option<String>,
    publisher: Option<String>,
    description: Option<String>,
    #[serde(default)]
    version: String,
    icon: Option<String>,
}

/// Host backed by an extensions directory on the local disk
pub struct LocalHost {
    config: HostConfig,
}

impl LocalHost {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    async fn load_extension(&self, dir: &Path) -> Result<ExtensionInfo> {
        let manifest_path = dir.join("package.json");
        let content = fs::read_to_string(&manifest_path).await?;
        let manifest: PackageManifest = serde_json::from_str(&content)?;
        let nls = load_nls(dir).await;

        let localize = |value: Option<String>| value.map(|v| resolve_nls(&v, &nls));
        let id = match manifest.publisher.as_deref() {
            Some(publisher) if !publisher.is_empty() => format!("{}.{}", publisher, manifest.name),
            _ => manifest.name.clone(),
        };

        Ok(ExtensionInfo {
            id,
            display_name: localize(manifest.display_name),
            description: localize(manifest.description),
            name: manifest.name,
            version: manifest.version,
            icon: manifest.icon,
            install_path: dir.to_path_buf(),
        })
    }
}

/// Default-locale strings referenced as `%key%` from `package.json`
async fn load_nls(dir: &Path) -> HashMap<String, String> {
    let Ok(content) = fs::read_to_string(dir.join("package.nls.json")).await else {
        return HashMap::new();
    };

    match serde_json::from_str::<HashMap<String, serde_json::Value>>(&content) {
        Ok(entries) => entries
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(text) => Some((key, text)),
                // { "message": "...", "comment": [...] } form
                other => other
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(|text| (key, text.to_string())),
            })
            .collect(),
        Err(e) => {
            warn!("Ignoring malformed package.nls.json in {}: {}", dir.display(), e);
            HashMap::new()
        }
    }
}

fn resolve_nls(value: &str, nls: &HashMap<String, String>) -> String {
    value
        .strip_prefix('%')
        .and_then(|rest| rest.strip_suffix('%'))
        .and_then(|key| nls.get(key))
        .cloned()
        .unwrap_or_else(|| value.to_string())
}

fn opener_command(target: &str) -> Command {
    #[cfg(target_os = "macos")]
    {
        let mut command = Command::new("open");
        command.arg(target);
        command
    }
    #[cfg(target_os = "windows")]
    {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", target]);
        command
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        let mut command = Command::new("xdg-open");
        command.arg(target);
        command
    }
}

async fn launch(target: &str) -> Result<()> {
    debug!("Opening {}", target);
    let status = opener_command(target)
        .status()
        .await
        .map_err(|e| LensError::Host(format!("Failed to launch opener for {}: {}", target, e)))?;

    if !status.success() {
        return Err(LensError::Host(format!(
            "Opener exited with {} for {}",
            status, target
        )));
    }
    Ok(())
}

#[async_trait]
impl ExtensionHost for LocalHost {
    async fn list_extensions(&self) -> Result<Vec<ExtensionInfo>> {
        let root = &self.config.extensions_dir;
        info!("Scanning extensions in {}", root.display());

        if !root.is_dir() {
            return Err(LensError::Host(format!(
                "Extensions directory not found: {}",
                root.display()
            )));
        }

        let candidates: Vec<_> = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir() && e.path().join("package.json").is_file())
            .map(|e| e.into_path())
            .collect();

        let mut extensions = Vec::new();
        for dir in candidates {
            match self.load_extension(&dir).await {
                Ok(extension) => extensions.push(extension),
                Err(e) => warn!("Skipping {}: {}", dir.display(), e),
            }
        }

        extensions.sort_by_key(|ext| ext.label().to_lowercase());
        info!("Found {} extensions", extensions.len());
        Ok(extensions)
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => LensError::SourceNotFound(path.display().to_string()),
            _ => LensError::Io(e),
        })
    }

    async fn open_external(&self, url: &str) -> Result<()> {
        let parsed = Url::parse(url)
            .map_err(|e| LensError::Host(format!("Invalid URL {}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LensError::Host(format!("Refusing to open non-web URL: {}", url)));
        }
        launch(parsed.as_str()).await
    }

    async fn open_file(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(LensError::SourceNotFound(path.display().to_string()));
        }
        launch(&path.to_string_lossy()).await
    }
}
