// Presentation surface for a translated README
//
// - Page: the HTML document shown to the user
// - Server: local preview server that serves the page and its resources and
//   relays link clicks back to the host

pub mod page;
pub mod server;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

pub use page::PanelPage;

use crate::error::{LensError, Result};
use crate::host::ExtensionHost;
use crate::render::ResourceResolver;

/// Rendered original and translated README plus the translated description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPair {
    pub original_html: String,
    pub translated_html: String,
    pub translated_description: String,
}

/// Messages posted by the page when an intercepted link is clicked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PanelMessage {
    OpenExternal { href: String },
    OpenFile { path: String },
}

/// Act on a message from the page
pub async fn dispatch(host: &dyn ExtensionHost, message: PanelMessage) -> Result<()> {
    match message {
        PanelMessage::OpenExternal { href } => {
            info!("Opening external link {}", href);
            host.open_external(&href).await
        }
        PanelMessage::OpenFile { path } => {
            let path = file_link_path(&path)?;
            info!("Opening file {}", path.display());
            host.open_file(&path).await
        }
    }
}

/// `file://` URLs become paths; anything else is taken as a path already
fn file_link_path(link: &str) -> Result<PathBuf> {
    if link.starts_with("file:") {
        let url = Url::parse(link)
            .map_err(|e| LensError::Host(format!("Invalid file URL {}: {}", link, e)))?;
        url.to_file_path()
            .map_err(|_| LensError::Host(format!("Not a local file URL: {}", link)))
    } else {
        Ok(PathBuf::from(link))
    }
}

/// Locators served by the preview server under `/resource`
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelResources;

impl ResourceResolver for PanelResources {
    fn resource_locator(&self, path: &Path) -> Result<String> {
        let url = Url::from_file_path(path).map_err(|_| {
            LensError::Render(format!("Cannot address relative path: {}", path.display()))
        })?;
        Ok(format!("{}{}", server::RESOURCE_PREFIX, url.path()))
    }
}

/// Plain `file://` locators for a page written to disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResources;

impl ResourceResolver for FileResources {
    fn resource_locator(&self, path: &Path) -> Result<String> {
        Url::from_file_path(path)
            .map(|url| url.to_string())
            .map_err(|_| LensError::Render(format!("Cannot address relative path: {}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockExtensionHost;
    use mockall::predicate::eq;

    #[test]
    fn test_message_wire_format() {
        let message: PanelMessage =
            serde_json::from_str(r#"{"command":"openExternal","href":"https://example.com"}"#).unwrap();
        assert_eq!(
            message,
            PanelMessage::OpenExternal {
                href: "https://example.com".to_string()
            }
        );

        let message: PanelMessage =
            serde_json::from_str(r#"{"command":"openFile","path":"/tmp/a.md"}"#).unwrap();
        assert_eq!(
            message,
            PanelMessage::OpenFile {
                path: "/tmp/a.md".to_string()
            }
        );

        assert!(serde_json::from_str::<PanelMessage>(r#"{"command":"runScript"}"#).is_err());
    }

    #[tokio::test]
    async fn test_dispatch_open_external() {
        let mut host = MockExtensionHost::new();
        host.expect_open_external()
            .with(eq("https://example.com/docs"))
            .times(1)
            .returning(|_| Ok(()));

        dispatch(
            &host,
            PanelMessage::OpenExternal {
                href: "https://example.com/docs".to_string(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_open_file_url() {
        let mut host = MockExtensionHost::new();
        host.expect_open_file()
            .withf(|path: &Path| path == Path::new("/etc/app conf.toml"))
            .times(2)
            .returning(|_| Ok(()));

        for path in ["file:///etc/app%20conf.toml", "/etc/app conf.toml"] {
            dispatch(&host, PanelMessage::OpenFile { path: path.to_string() })
                .await
                .unwrap();
        }
    }

    #[test]
    fn test_panel_locator_is_scoped_to_path() {
        let locator = PanelResources
            .resource_locator(Path::new("/ext/path/images/logo.png"))
            .unwrap();
        assert_eq!(locator, "/resource/ext/path/images/logo.png");

        let locator = PanelResources
            .resource_locator(Path::new("/ext/path/my shot.png"))
            .unwrap();
        assert_eq!(locator, "/resource/ext/path/my%20shot.png");
    }

    #[test]
    fn test_file_locator() {
        let locator = FileResources
            .resource_locator(Path::new("/ext/path/icon.png"))
            .unwrap();
        assert_eq!(locator, "file:///ext/path/icon.png");
    }

    #[test]
    fn test_relative_paths_cannot_be_addressed() {
        assert!(matches!(
            PanelResources.resource_locator(Path::new("images/logo.png")),
            Err(LensError::Render(_))
        ));
    }
}
