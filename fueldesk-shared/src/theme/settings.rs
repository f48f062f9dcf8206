/// Site settings: branding, navigation and change-form layout of the admin
///
/// [`resolve_site_settings`] starts from the compiled-in defaults and applies
/// every override that is present and non-empty. Map-valued settings merge
/// key by key, so overriding one icon keeps the other default icons.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ModelLookup, ThemeError};

const DEFAULT_CHANGEFORM_FORMAT: &str = "horizontal_tabs";

/// Link in the top menu, user menu or a custom app section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuLink {
    #[serde(default)]
    pub name: Option<String>,

    /// Absolute or relative URL
    #[serde(default)]
    pub url: Option<String>,

    /// `app.model` whose changelist the link points at
    #[serde(default)]
    pub model: Option<String>,

    /// App label whose models are listed under the link
    #[serde(default)]
    pub app: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub new_window: bool,

    #[serde(default)]
    pub permissions: Vec<String>,
}

/// A single string or a list of strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_lowercase(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.to_lowercase()],
            OneOrMany::Many(v) => v.into_iter().map(|s| s.to_lowercase()).collect(),
        }
    }
}

/// Operator-supplied overrides, as read from the `[site_settings]` table
///
/// Absent keys keep their default. Keys this type does not know are kept in
/// `extra` and passed through to templates untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettingsOverrides {
    pub site_title: Option<String>,
    pub site_header: Option<String>,
    pub site_brand: Option<String>,
    pub site_logo: Option<String>,
    pub site_logo_classes: Option<String>,
    pub site_icon: Option<String>,
    pub welcome_sign: Option<String>,
    pub copyright: Option<String>,
    pub search_model: Option<String>,
    pub user_avatar: Option<String>,
    pub topmenu_links: Option<Vec<MenuLink>>,
    pub usermenu_links: Option<Vec<MenuLink>>,
    pub show_sidebar: Option<bool>,
    pub navigation_expanded: Option<bool>,
    pub hide_apps: Option<OneOrMany>,
    pub hide_models: Option<OneOrMany>,
    pub order_with_respect_to: Option<Vec<String>>,
    pub custom_links: Option<BTreeMap<String, Vec<MenuLink>>>,
    pub icons: Option<BTreeMap<String, String>>,
    pub default_icon_parents: Option<String>,
    pub default_icon_children: Option<String>,
    pub related_modal_active: Option<bool>,
    pub custom_css: Option<String>,
    pub custom_js: Option<String>,
    pub use_google_fonts_cdn: Option<bool>,
    pub show_ui_builder: Option<bool>,
    pub changeform_format: Option<String>,
    pub changeform_format_overrides: Option<BTreeMap<String, String>>,
    pub language_chooser: Option<bool>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Fully resolved site settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSettings {
    pub site_title: Option<String>,
    pub site_header: Option<String>,
    pub site_brand: Option<String>,
    pub site_logo: String,
    pub site_logo_classes: String,

    /// Favicon; falls back to `site_logo`
    pub site_icon: String,

    pub welcome_sign: String,
    pub copyright: String,
    pub search_model: Option<String>,

    /// Changelist URL of `search_model`, `"#"` if it has none
    pub search_url: Option<String>,

    /// Plural label of `search_model`
    pub search_name: Option<String>,

    pub user_avatar: Option<String>,
    pub topmenu_links: Vec<MenuLink>,
    pub usermenu_links: Vec<MenuLink>,
    pub show_sidebar: bool,
    pub navigation_expanded: bool,

    /// Lower-cased app labels left out of the side menu
    pub hide_apps: Vec<String>,

    /// Lower-cased `app.model` names left out of the side menu
    pub hide_models: Vec<String>,

    pub order_with_respect_to: Vec<String>,
    pub custom_links: BTreeMap<String, Vec<MenuLink>>,

    /// Lower-cased `app` or `app.model` keys to lower-cased icon classes
    pub icons: BTreeMap<String, String>,

    pub default_icon_parents: String,
    pub default_icon_children: String,
    pub related_modal_active: bool,
    pub custom_css: Option<String>,
    pub custom_js: Option<String>,
    pub use_google_fonts_cdn: bool,
    pub show_ui_builder: bool,
    pub changeform_format: String,
    pub changeform_format_overrides: BTreeMap<String, String>,
    pub language_chooser: bool,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        let icons = [
            ("auth", "fas fa-users-cog"),
            ("auth.user", "fas fa-user"),
            ("auth.Group", "fas fa-users"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            site_title: None,
            site_header: None,
            site_brand: None,
            site_logo: "vendor/adminlte/img/AdminLTELogo.png".to_string(),
            site_logo_classes: "img-circle".to_string(),
            site_icon: String::new(),
            welcome_sign: "Welcome".to_string(),
            copyright: String::new(),
            search_model: None,
            search_url: None,
            search_name: None,
            user_avatar: None,
            topmenu_links: Vec::new(),
            usermenu_links: Vec::new(),
            show_sidebar: true,
            navigation_expanded: true,
            hide_apps: Vec::new(),
            hide_models: Vec::new(),
            order_with_respect_to: Vec::new(),
            custom_links: BTreeMap::new(),
            icons,
            default_icon_parents: "fas fa-chevron-circle-right".to_string(),
            default_icon_children: "fas fa-circle".to_string(),
            related_modal_active: false,
            custom_css: None,
            custom_js: None,
            use_google_fonts_cdn: true,
            show_ui_builder: false,
            changeform_format: DEFAULT_CHANGEFORM_FORMAT.to_string(),
            changeform_format_overrides: BTreeMap::new(),
            language_chooser: false,
            extra: BTreeMap::new(),
        }
    }
}

impl SiteSettings {
    /// Icon class for a menu entry keyed `app` or `app.model`
    pub fn icon_for(&self, key: &str, is_parent: bool) -> &str {
        match self.icons.get(&key.to_lowercase()) {
            Some(icon) => icon,
            None if is_parent => &self.default_icon_parents,
            None => &self.default_icon_children,
        }
    }

    /// Change-form layout for `app.model`
    pub fn changeform_format_for(&self, model_key: &str) -> &str {
        self.changeform_format_overrides
            .get(&model_key.to_lowercase())
            .unwrap_or(&self.changeform_format)
    }

    pub fn is_hidden(&self, app_label: &str, model_key: &str) -> bool {
        self.hide_apps.iter().any(|a| a == &app_label.to_lowercase())
            || self.hide_models.iter().any(|m| m == &model_key.to_lowercase())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn merge_map<V>(base: &mut BTreeMap<String, V>, overrides: Option<BTreeMap<String, V>>) {
    if let Some(overrides) = overrides {
        base.extend(overrides);
    }
}

/// Python-style `str.title()`: upper-cases the first letter of every run of
/// letters and lower-cases the rest
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }

    out
}

fn split_search_model(search_model: &str) -> Result<(&str, &str), ThemeError> {
    let mut parts = search_model.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(app), Some(model), None) => Ok((app, model)),
        _ => Err(ThemeError::InvalidSearchModel(search_model.to_string())),
    }
}

/// Merges `overrides` onto the defaults and derives the computed settings
///
/// # Errors
///
/// [`ThemeError::InvalidSearchModel`] when `search_model` is not of the form
/// `app.model`.
pub fn resolve_site_settings(
    overrides: SiteSettingsOverrides,
    lookup: &dyn ModelLookup,
) -> Result<SiteSettings, ThemeError> {
    let mut s = SiteSettings::default();
    let o = overrides;

    if let Some(v) = non_empty(o.site_title) {
        s.site_title = Some(v);
    }
    if let Some(v) = non_empty(o.site_header) {
        s.site_header = Some(v);
    }
    if let Some(v) = non_empty(o.site_brand) {
        s.site_brand = Some(v);
    }
    if let Some(v) = non_empty(o.site_logo) {
        s.site_logo = v;
    }
    if let Some(v) = non_empty(o.site_logo_classes) {
        s.site_logo_classes = v;
    }
    if let Some(v) = non_empty(o.welcome_sign) {
        s.welcome_sign = v;
    }
    if let Some(v) = non_empty(o.copyright) {
        s.copyright = v;
    }
    s.search_model = non_empty(o.search_model);
    s.user_avatar = non_empty(o.user_avatar);
    if let Some(v) = o.topmenu_links {
        s.topmenu_links = v;
    }
    if let Some(v) = o.usermenu_links {
        s.usermenu_links = v;
    }
    if let Some(v) = o.show_sidebar {
        s.show_sidebar = v;
    }
    if let Some(v) = o.navigation_expanded {
        s.navigation_expanded = v;
    }
    if let Some(v) = o.hide_apps {
        s.hide_apps = v.into_lowercase();
    }
    if let Some(v) = o.hide_models {
        s.hide_models = v.into_lowercase();
    }
    if let Some(v) = o.order_with_respect_to {
        s.order_with_respect_to = v;
    }
    merge_map(&mut s.custom_links, o.custom_links);
    merge_map(&mut s.icons, o.icons);
    if let Some(v) = non_empty(o.default_icon_parents) {
        s.default_icon_parents = v;
    }
    if let Some(v) = non_empty(o.default_icon_children) {
        s.default_icon_children = v;
    }
    if let Some(v) = o.related_modal_active {
        s.related_modal_active = v;
    }
    s.custom_css = non_empty(o.custom_css);
    s.custom_js = non_empty(o.custom_js);
    if let Some(v) = o.use_google_fonts_cdn {
        s.use_google_fonts_cdn = v;
    }
    if let Some(v) = o.show_ui_builder {
        s.show_ui_builder = v;
    }
    if let Some(v) = non_empty(o.changeform_format) {
        s.changeform_format = v;
    }
    merge_map(&mut s.changeform_format_overrides, o.changeform_format_overrides);
    if let Some(v) = o.language_chooser {
        s.language_chooser = v;
    }
    s.extra = o.extra.into_iter().filter(|(_, v)| !v.is_null()).collect();

    if let Some(search_model) = &s.search_model {
        let (app, model) = split_search_model(search_model)?;

        s.search_url = Some(
            lookup
                .changelist_url(app, &model.to_lowercase())
                .unwrap_or_else(|| "#".to_string()),
        );
        s.search_name = Some(match lookup.verbose_name_plural(app, model) {
            Some(plural) => title_case(&plural),
            None => format!("{}s", model),
        });
    }

    s.icons = s
        .icons
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
        .collect();

    s.site_icon = non_empty(o.site_icon).unwrap_or_else(|| s.site_logo.clone());

    s.changeform_format_overrides = s
        .changeform_format_overrides
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
        .collect();

    Ok(s)
}
