/// UI tweaks: layout toggles, colour classes and the Bootswatch theme
///
/// Toggles are booleans in configuration and become fixed CSS classes once
/// resolved. Colour settings (`accent`, `navbar`, `sidebar`, `brand_colour`)
/// are class strings used as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::themes::{
    is_dark_theme, is_theme, static_url, theme_path, DEFAULT_DARK_THEME, DEFAULT_THEME,
};

/// A tweak value: an on/off flag or a class string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TweakValue {
    Flag(bool),
    Class(String),
}

impl TweakValue {
    fn is_set(&self) -> bool {
        match self {
            TweakValue::Flag(b) => *b,
            TweakValue::Class(s) => !s.is_empty(),
        }
    }
}

/// Toggles and the class each one contributes when enabled
const TOGGLE_CLASSES: &[(&str, &str)] = &[
    ("navbar_small_text", "text-sm"),
    ("footer_small_text", "text-sm"),
    ("body_small_text", "text-sm"),
    ("brand_small_text", "text-sm"),
    ("sidebar_nav_small_text", "text-sm"),
    ("no_navbar_border", "border-bottom-0"),
    ("sidebar_disable_expand", "sidebar-no-expand"),
    ("sidebar_nav_child_indent", "nav-child-indent"),
    ("sidebar_nav_compact_style", "nav-compact"),
    ("sidebar_nav_legacy_style", "nav-legacy"),
    ("sidebar_nav_flat_style", "nav-flat"),
    ("layout_boxed", "layout-boxed"),
    ("sidebar_fixed", "layout-fixed"),
    ("navbar_fixed", "layout-navbar-fixed"),
    ("footer_fixed", "layout-footer-fixed"),
    ("actions_sticky_top", "sticky-top"),
];

/// Operator-supplied overrides, as read from the `[ui_tweaks]` table
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiTweakOverrides {
    pub navbar_small_text: Option<TweakValue>,
    pub footer_small_text: Option<TweakValue>,
    pub body_small_text: Option<TweakValue>,
    pub brand_small_text: Option<TweakValue>,
    pub brand_colour: Option<TweakValue>,
    pub accent: Option<TweakValue>,
    pub navbar: Option<TweakValue>,
    pub no_navbar_border: Option<TweakValue>,
    pub navbar_fixed: Option<TweakValue>,
    pub layout_boxed: Option<TweakValue>,
    pub footer_fixed: Option<TweakValue>,
    pub sidebar_fixed: Option<TweakValue>,
    pub sidebar: Option<TweakValue>,
    pub sidebar_nav_small_text: Option<TweakValue>,
    pub sidebar_disable_expand: Option<TweakValue>,
    pub sidebar_nav_child_indent: Option<TweakValue>,
    pub sidebar_nav_compact_style: Option<TweakValue>,
    pub sidebar_nav_legacy_style: Option<TweakValue>,
    pub sidebar_nav_flat_style: Option<TweakValue>,
    pub actions_sticky_top: Option<TweakValue>,
    pub theme: Option<String>,
    pub dark_mode_theme: Option<String>,
    pub button_classes: Option<BTreeMap<String, String>>,
}

impl UiTweakOverrides {
    fn values(self) -> Vec<(&'static str, Option<TweakValue>)> {
        vec![
            ("navbar_small_text", self.navbar_small_text),
            ("footer_small_text", self.footer_small_text),
            ("body_small_text", self.body_small_text),
            ("brand_small_text", self.brand_small_text),
            ("brand_colour", self.brand_colour),
            ("accent", self.accent),
            ("navbar", self.navbar),
            ("no_navbar_border", self.no_navbar_border),
            ("navbar_fixed", self.navbar_fixed),
            ("layout_boxed", self.layout_boxed),
            ("footer_fixed", self.footer_fixed),
            ("sidebar_fixed", self.sidebar_fixed),
            ("sidebar", self.sidebar),
            ("sidebar_nav_small_text", self.sidebar_nav_small_text),
            ("sidebar_disable_expand", self.sidebar_disable_expand),
            ("sidebar_nav_child_indent", self.sidebar_nav_child_indent),
            ("sidebar_nav_compact_style", self.sidebar_nav_compact_style),
            ("sidebar_nav_legacy_style", self.sidebar_nav_legacy_style),
            ("sidebar_nav_flat_style", self.sidebar_nav_flat_style),
            ("actions_sticky_top", self.actions_sticky_top),
        ]
    }
}

/// Defaults merged with overrides, before any class is derived
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawTweaks {
    #[serde(flatten)]
    pub values: BTreeMap<String, TweakValue>,
    pub theme: Option<String>,
    pub dark_mode_theme: Option<String>,
    pub button_classes: BTreeMap<String, String>,
}

impl Default for RawTweaks {
    fn default() -> Self {
        let flag = |k: &str| (k.to_string(), TweakValue::Flag(false));
        let class = |k: &str, v: &str| (k.to_string(), TweakValue::Class(v.to_string()));

        let values = [
            flag("navbar_small_text"),
            flag("footer_small_text"),
            flag("body_small_text"),
            flag("brand_small_text"),
            flag("brand_colour"),
            class("accent", "accent-primary"),
            class("navbar", "navbar-white navbar-light"),
            flag("no_navbar_border"),
            flag("navbar_fixed"),
            flag("layout_boxed"),
            flag("footer_fixed"),
            flag("sidebar_fixed"),
            class("sidebar", "sidebar-dark-primary"),
            flag("sidebar_nav_small_text"),
            flag("sidebar_disable_expand"),
            flag("sidebar_nav_child_indent"),
            flag("sidebar_nav_compact_style"),
            flag("sidebar_nav_legacy_style"),
            flag("sidebar_nav_flat_style"),
        ]
        .into_iter()
        .collect();

        let button_classes = ["primary", "secondary", "info", "warning", "danger", "success"]
            .into_iter()
            .map(|kind| (kind.to_string(), format!("btn-outline-{}", kind)))
            .collect();

        Self {
            values,
            theme: Some(DEFAULT_THEME.to_string()),
            dark_mode_theme: None,
            button_classes,
        }
    }
}

/// A theme name with the public URL of its stylesheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeAsset {
    pub name: String,
    pub src: String,
}

impl ThemeAsset {
    fn new(name: &str, static_base: &str) -> Self {
        Self {
            name: name.to_string(),
            src: static_url(static_base, &theme_path(name)),
        }
    }
}

/// Resolved UI tweaks, ready for templates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiTweaks {
    pub raw: RawTweaks,
    pub theme: ThemeAsset,
    pub sidebar_classes: String,
    pub navbar_classes: String,
    pub body_classes: String,
    pub actions_classes: String,
    pub sidebar_list_classes: String,
    pub brand_classes: String,
    pub footer_classes: String,
    pub button_classes: BTreeMap<String, String>,
    pub dark_mode_theme: Option<ThemeAsset>,
}

/// Merges `overrides` onto the defaults and derives the CSS class strings
///
/// An unknown `theme` falls back to `default` and an unknown or light
/// `dark_mode_theme` falls back to `darkly`, each with a warning.
pub fn resolve_ui_tweaks(overrides: UiTweakOverrides, static_base: &str) -> UiTweaks {
    let mut raw = RawTweaks::default();

    let theme_override = overrides.theme.clone();
    let dark_override = overrides.dark_mode_theme.clone();
    let buttons_override = overrides.button_classes.clone();

    for (key, value) in overrides.values() {
        if let Some(value) = value {
            raw.values.insert(key.to_string(), value);
        }
    }
    if theme_override.is_some() {
        raw.theme = theme_override;
    }
    if dark_override.is_some() {
        raw.dark_mode_theme = dark_override;
    }
    if let Some(buttons) = buttons_override {
        raw.button_classes.extend(buttons);
    }

    // Keep only enabled tweaks, each mapped to the class it contributes
    let mut active: BTreeMap<&str, String> = BTreeMap::new();
    for (key, value) in &raw.values {
        if !value.is_set() {
            continue;
        }
        let class = match TOGGLE_CLASSES.iter().find(|(toggle, _)| *toggle == key.as_str()) {
            Some((_, class)) => class.to_string(),
            None => match value {
                TweakValue::Class(s) => s.clone(),
                TweakValue::Flag(_) => continue,
            },
        };
        active.insert(key.as_str(), class);
    }

    if active.contains_key("layout_boxed") {
        active.remove("navbar_fixed");
        active.remove("footer_fixed");
    }

    let classes = |keys: &[&str]| -> String {
        keys.iter()
            .map(|k| active.get(k).map(String::as_str).unwrap_or(""))
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    };

    let theme = match raw.theme.as_deref().filter(|t| !t.is_empty()) {
        Some(t) if is_theme(t) => t.to_string(),
        Some(t) => {
            warn!(theme = %t, "Theme not found, using {}", DEFAULT_THEME);
            DEFAULT_THEME.to_string()
        }
        None => DEFAULT_THEME.to_string(),
    };

    let dark_mode_theme = match raw.dark_mode_theme.as_deref().filter(|t| !t.is_empty()) {
        Some(t) if is_dark_theme(t) => Some(t.to_string()),
        Some(t) => {
            warn!(theme = %t, "Not a dark theme, using {}", DEFAULT_DARK_THEME);
            Some(DEFAULT_DARK_THEME.to_string())
        }
        None => None,
    };

    let mut body_classes = classes(&[
        "accent",
        "body_small_text",
        "navbar_fixed",
        "footer_fixed",
        "sidebar_fixed",
        "layout_boxed",
    ]);
    body_classes.push_str(&format!(" theme-{}", theme));
    if is_dark_theme(&theme) {
        body_classes.push_str(" dark-mode");
    }

    let sidebar_classes = classes(&["sidebar", "sidebar_disable_expand"]);
    let navbar_classes = classes(&["navbar", "no_navbar_border", "navbar_small_text"]);
    let actions_classes = classes(&["actions_sticky_top"]);
    let sidebar_list_classes = classes(&[
        "sidebar_nav_small_text",
        "sidebar_nav_flat_style",
        "sidebar_nav_legacy_style",
        "sidebar_nav_child_indent",
        "sidebar_nav_compact_style",
    ]);
    let brand_classes = classes(&["brand_small_text", "brand_colour"]);
    let footer_classes = classes(&["footer_small_text"]);

    UiTweaks {
        theme: ThemeAsset::new(&theme, static_base),
        sidebar_classes,
        navbar_classes,
        body_classes: body_classes.trim().to_string(),
        actions_classes,
        sidebar_list_classes,
        brand_classes,
        footer_classes,
        button_classes: raw.button_classes.clone(),
        dark_mode_theme: dark_mode_theme.map(|t| ThemeAsset::new(&t, static_base)),
        raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATIC: &str = "/static/";

    fn on() -> Option<TweakValue> {
        Some(TweakValue::Flag(true))
    }

    #[test]
    fn test_defaults() {
        let t = resolve_ui_tweaks(UiTweakOverrides::default(), STATIC);

        assert_eq!(t.theme.name, "default");
        assert_eq!(t.theme.src, "/static/vendor/bootswatch/default/bootstrap.min.css");
        assert_eq!(t.body_classes, "accent-primary theme-default");
        assert_eq!(t.navbar_classes, "navbar-white navbar-light");
        assert_eq!(t.sidebar_classes, "sidebar-dark-primary");
        assert_eq!(t.actions_classes, "");
        assert_eq!(t.button_classes["danger"], "btn-outline-danger");
        assert!(t.dark_mode_theme.is_none());
    }

    #[test]
    fn test_toggles_map_to_classes() {
        let overrides = UiTweakOverrides {
            navbar_small_text: on(),
            no_navbar_border: on(),
            sidebar_nav_flat_style: on(),
            sidebar_nav_child_indent: on(),
            actions_sticky_top: on(),
            brand_colour: Some(TweakValue::Class("navbar-success".to_string())),
            ..Default::default()
        };

        let t = resolve_ui_tweaks(overrides, STATIC);
        assert_eq!(t.navbar_classes, "navbar-white navbar-light border-bottom-0 text-sm");
        assert_eq!(t.sidebar_list_classes, "nav-flat  nav-child-indent");
        assert_eq!(t.actions_classes, "sticky-top");
        assert_eq!(t.brand_classes, "navbar-success");
    }

    #[test]
    fn test_layout_boxed_excludes_fixed_navbar_and_footer() {
        let overrides = UiTweakOverrides {
            layout_boxed: on(),
            navbar_fixed: on(),
            footer_fixed: on(),
            sidebar_fixed: on(),
            ..Default::default()
        };

        let t = resolve_ui_tweaks(overrides, STATIC);
        assert!(t.body_classes.contains("layout-boxed"));
        assert!(t.body_classes.contains("layout-fixed"));
        assert!(!t.body_classes.contains("layout-navbar-fixed"));
        assert!(!t.body_classes.contains("layout-footer-fixed"));
    }

    #[test]
    fn test_fixed_navbar_without_boxed_layout() {
        let overrides = UiTweakOverrides {
            navbar_fixed: on(),
            ..Default::default()
        };

        let t = resolve_ui_tweaks(overrides, STATIC);
        assert!(t.body_classes.contains("layout-navbar-fixed"));
    }

    #[test]
    fn test_unknown_theme_falls_back_to_default() {
        let overrides = UiTweakOverrides {
            theme: Some("nonexistent".to_string()),
            ..Default::default()
        };

        let t = resolve_ui_tweaks(overrides, STATIC);
        assert_eq!(t.theme.name, "default");
        assert_eq!(t.theme.src, "/static/vendor/bootswatch/default/bootstrap.min.css");
        assert_eq!(t.raw.theme.as_deref(), Some("nonexistent"));
    }

    #[test]
    fn test_dark_theme_adds_dark_mode() {
        let overrides = UiTweakOverrides {
            theme: Some("cyborg".to_string()),
            ..Default::default()
        };

        let t = resolve_ui_tweaks(overrides, STATIC);
        assert!(t.body_classes.ends_with("theme-cyborg dark-mode"));
    }

    #[test]
    fn test_light_dark_mode_theme_falls_back_to_darkly() {
        let overrides = UiTweakOverrides {
            dark_mode_theme: Some("cosmo".to_string()),
            ..Default::default()
        };

        let t = resolve_ui_tweaks(overrides, STATIC);
        let dark = t.dark_mode_theme.expect("dark mode theme");
        assert_eq!(dark.name, "darkly");
        assert_eq!(dark.src, "/static/vendor/bootswatch/darkly/bootstrap.min.css");
    }

    #[test]
    fn test_disabled_class_tweak_is_dropped() {
        let overrides = UiTweakOverrides {
            accent: Some(TweakValue::Flag(false)),
            ..Default::default()
        };

        let t = resolve_ui_tweaks(overrides, STATIC);
        assert_eq!(t.body_classes, "theme-default");
    }

    #[test]
    fn test_button_classes_merge() {
        let mut buttons = BTreeMap::new();
        buttons.insert("primary".to_string(), "btn-primary".to_string());

        let overrides = UiTweakOverrides {
            button_classes: Some(buttons),
            ..Default::default()
        };

        let t = resolve_ui_tweaks(overrides, STATIC);
        assert_eq!(t.button_classes["primary"], "btn-primary");
        assert_eq!(t.button_classes["info"], "btn-outline-info");
    }

    #[test]
    fn test_overrides_deserialize_from_mixed_values() {
        let overrides: UiTweakOverrides = serde_json::from_value(serde_json::json!({
            "navbar": "navbar-dark",
            "sidebar_fixed": true,
            "unknown_tweak": 3,
        }))
        .unwrap();

        let t = resolve_ui_tweaks(overrides, STATIC);
        assert_eq!(t.navbar_classes, "navbar-dark");
        assert!(t.body_classes.contains("layout-fixed"));
    }
}
