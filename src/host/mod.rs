// Host abstraction: where extensions live and how things get opened
//
// - Local: reads a VS Code style extensions directory and uses the
//   platform opener for URLs and files

pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use local::LocalHost;

use crate::config::HostConfig;
use crate::error::Result;

/// Metadata of one installed extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    /// `publisher.name`, or just `name` without a publisher
    pub id: String,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub version: String,
    /// Icon path relative to the install path
    pub icon: Option<String>,
    pub install_path: PathBuf,
}

impl ExtensionInfo {
    /// Display name, falling back to the package name
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.name)
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn icon_path(&self) -> Option<PathBuf> {
        self.icon.as_ref().map(|icon| self.install_path.join(icon))
    }
}

/// Operations the orchestrator and panel need from the host environment
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtensionHost: Send + Sync {
    /// Every installed extension
    async fn list_extensions(&self) -> Result<Vec<ExtensionInfo>>;

    /// Read a file's bytes
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Open a web URL outside the panel
    async fn open_external(&self, url: &str) -> Result<()>;

    /// Open a local file in the host
    async fn open_file(&self, path: &Path) -> Result<()>;
}

/// Factory for creating host instances
pub struct HostFactory;

impl HostFactory {
    pub fn create_host(config: HostConfig) -> Arc<dyn ExtensionHost> {
        Arc::new(LocalHost::new(config))
    }
}
