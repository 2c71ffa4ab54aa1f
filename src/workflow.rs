use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{LensError, Result};
use crate::host::{ExtensionHost, ExtensionInfo, HostFactory};
use crate::panel::{PanelPage, RenderedPair};
use crate::render::{DocumentRenderer, HostLinkStrategy, ResourceResolver};
use crate::translate::{TranslationPolicy, TranslatorFactory};

/// Shown in place of the README when it cannot be read
pub fn readme_not_found(file_name: &str) -> String {
    format!("{} could not be found.", file_name)
}

/// Source and translated texts of one extension, before rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationView {
    pub extension: ExtensionInfo,
    pub original: String,
    pub translated: String,
    pub translated_description: String,
}

pub struct Workflow {
    config: Config,
    host: Arc<dyn ExtensionHost>,
    policy: TranslationPolicy,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let policy = TranslatorFactory::create_policy(&config.translate)?;
        let host = HostFactory::create_host(config.host.clone());

        if policy.has_structured() {
            info!("Gemini credential found, using structured translation");
        } else {
            info!("No Gemini credential, using placeholder-protected machine translation");
        }

        Ok(Self::with_parts(config, host, policy))
    }

    pub fn with_parts(config: Config, host: Arc<dyn ExtensionHost>, policy: TranslationPolicy) -> Self {
        Self {
            config,
            host,
            policy,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn host(&self) -> Arc<dyn ExtensionHost> {
        Arc::clone(&self.host)
    }

    /// Installed extensions that may be translated
    pub async fn candidates(&self) -> Result<Vec<ExtensionInfo>> {
        let excluded = &self.config.host.excluded_prefixes;
        let candidates: Vec<ExtensionInfo> = self
            .host
            .list_extensions()
            .await?
            .into_iter()
            .filter(|ext| !excluded.iter().any(|prefix| ext.id.starts_with(prefix.as_str())))
            .collect();

        info!("{} extension(s) available for translation", candidates.len());
        Ok(candidates)
    }

    /// Exact id match first, then a case-insensitive label match
    pub fn find_extension<'a>(candidates: &'a [ExtensionInfo], query: &str) -> Result<&'a ExtensionInfo> {
        let query = query.trim();
        candidates
            .iter()
            .find(|ext| ext.id == query)
            .or_else(|| {
                let lowered = query.to_lowercase();
                candidates.iter().find(|ext| ext.label().to_lowercase() == lowered)
            })
            .ok_or_else(|| LensError::ExtensionNotFound(query.to_string()))
    }

    /// README contents, or a short notice when it cannot be read
    pub async fn load_readme(&self, extension: &ExtensionInfo) -> String {
        let path = extension.install_path.join(&self.config.host.readme_file);
        match self.host.read_file(&path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("README unavailable for {}: {}", extension.id, e);
                readme_not_found(&self.config.host.readme_file)
            }
        }
    }

    /// Read and translate the README and description of one extension
    pub async fn translate_extension(
        &self,
        extension: &ExtensionInfo,
        target_language: &str,
        progress: &ProgressBar,
    ) -> Result<TranslationView> {
        info!("Translating {} into {}", extension.id, target_language);

        progress.set_message("Loading README...");
        let original = self.load_readme(extension).await;
        progress.inc(1);

        progress.set_message("Translating...");
        let translated = self.policy.translate_markdown(&original, target_language).await?;
        let translated_description = self
            .policy
            .translate_description(extension.description_text(), target_language)
            .await?;
        progress.inc(1);

        progress.set_message("Preparing display...");

        Ok(TranslationView {
            extension: extension.clone(),
            original,
            translated,
            translated_description,
        })
    }

    /// Render both READMEs against the extension's install path
    pub fn render(&self, view: &TranslationView, resolver: &dyn ResourceResolver) -> RenderedPair {
        let strategy = HostLinkStrategy::new(&view.extension.install_path, resolver);
        let renderer = DocumentRenderer::new(strategy);

        RenderedPair {
            original_html: renderer.render(&view.original),
            translated_html: renderer.render(&view.translated),
            translated_description: view.translated_description.clone(),
        }
    }

    /// Full page for a translated extension
    pub fn present(
        &self,
        view: &TranslationView,
        target_language: &str,
        resolver: &dyn ResourceResolver,
    ) -> PanelPage {
        let pair = self.render(view, resolver);
        let icon = view.extension.icon_path().and_then(|path| {
            resolver
                .resource_locator(&path)
                .map_err(|e| warn!("Failed to resolve icon for {}: {}", view.extension.id, e))
                .ok()
        });

        PanelPage::build(&view.extension, icon.as_deref(), &pair, target_language)
    }
}
