/// Admin theme resolution
///
/// Produces the presentation configuration used by every admin page from
/// compiled-in defaults and the operator's overrides:
///
/// - [`settings`]: branding, menus, icons, search box, change-form layout
/// - [`tweaks`]: layout toggles, colour classes and the Bootswatch theme
/// - [`themes`]: the bundled theme and layout catalogue
///
/// Resolution is deterministic and allocates a fresh result on every call.
/// Unknown theme names degrade to defaults with a warning; the only hard
/// error is a malformed `search_model`.
///
/// # Example
///
/// ```
/// use fueldesk_shared::theme::{resolve, NoModels, ThemeConfig};
///
/// let config: ThemeConfig = serde_json::from_str(
///     r#"{"ui_tweaks": {"theme": "darkly"}, "site_settings": {"site_brand": "Admin"}}"#,
/// )
/// .unwrap();
///
/// let theme = resolve(config, &NoModels, "/static/").unwrap();
/// assert_eq!(theme.tweaks.body_classes, "accent-primary theme-darkly dark-mode");
/// assert_eq!(theme.settings.site_brand.as_deref(), Some("Admin"));
/// ```

pub mod settings;
pub mod themes;
pub mod tweaks;

use serde::{Deserialize, Serialize};

pub use settings::{resolve_site_settings, MenuLink, SiteSettings, SiteSettingsOverrides};
pub use tweaks::{resolve_ui_tweaks, TweakValue, UiTweakOverrides, UiTweaks};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThemeError {
    /// `search_model` must be `app.model`
    #[error("Invalid search_model {0:?}: expected \"app_label.model_name\"")]
    InvalidSearchModel(String),
}

/// Model metadata needed to resolve `search_model`
pub trait ModelLookup {
    /// Changelist URL of a registered model, `None` if it has none
    fn changelist_url(&self, app_label: &str, model_name: &str) -> Option<String>;

    /// Plural display name of a registered model, `None` if unknown
    fn verbose_name_plural(&self, app_label: &str, model_name: &str) -> Option<String>;
}

/// Lookup with no registered models
pub struct NoModels;

impl ModelLookup for NoModels {
    fn changelist_url(&self, _app_label: &str, _model_name: &str) -> Option<String> {
        None
    }

    fn verbose_name_plural(&self, _app_label: &str, _model_name: &str) -> Option<String> {
        None
    }
}

/// Contents of the theme configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub site_settings: SiteSettingsOverrides,
    pub ui_tweaks: UiTweakOverrides,
}

/// Resolved settings and tweaks, as handed to templates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTheme {
    pub settings: SiteSettings,
    pub tweaks: UiTweaks,
}

/// Resolves both halves of a [`ThemeConfig`]
pub fn resolve(
    config: ThemeConfig,
    lookup: &dyn ModelLookup,
    static_base: &str,
) -> Result<ResolvedTheme, ThemeError> {
    Ok(ResolvedTheme {
        settings: resolve_site_settings(config.site_settings, lookup)?,
        tweaks: resolve_ui_tweaks(config.ui_tweaks, static_base),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_search_model_yields_no_partial_result() {
        let mut config = ThemeConfig::default();
        config.site_settings.search_model = Some("badvalue".to_string());

        let result = resolve(config, &NoModels, "/static/");
        assert_eq!(
            result.unwrap_err(),
            ThemeError::InvalidSearchModel("badvalue".to_string())
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let config: ThemeConfig = serde_json::from_value(serde_json::json!({
            "site_settings": {"hide_apps": "Auth", "icons": {"App.Fuel": "fas fa-gas-pump"}},
            "ui_tweaks": {"theme": "nonexistent", "dark_mode_theme": "cosmo"},
        }))
        .unwrap();

        let first = resolve(config.clone(), &NoModels, "/static/").unwrap();
        let second = resolve(config, &NoModels, "/static/").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.settings.hide_apps, vec!["auth"]);
        assert_eq!(first.tweaks.theme.name, "default");
        assert_eq!(
            first.tweaks.dark_mode_theme.map(|t| t.name).as_deref(),
            Some("darkly")
        );
    }
}
