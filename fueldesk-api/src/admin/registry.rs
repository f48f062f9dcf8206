/// Models exposed in the admin console and the side menu built from them

use fueldesk_shared::theme::{MenuLink, ModelLookup, SiteSettings};
use serde::Serialize;

/// App label every FuelDesk model lives under
pub const APP_LABEL: &str = "app";

pub const REPORT_URL: &str = "/admin/app/report/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminModel {
    User,
    Fuel,
    Payment,
    Machine,
    Creditor,
}

impl AdminModel {
    /// Registration order, also the default menu order
    pub const ALL: [AdminModel; 5] = [
        AdminModel::User,
        AdminModel::Fuel,
        AdminModel::Payment,
        AdminModel::Machine,
        AdminModel::Creditor,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.model_name().eq_ignore_ascii_case(name))
    }

    /// Lower-case model name used in URLs
    pub fn model_name(self) -> &'static str {
        match self {
            AdminModel::User => "user",
            AdminModel::Fuel => "fuel",
            AdminModel::Payment => "payment",
            AdminModel::Machine => "machine",
            AdminModel::Creditor => "creditor",
        }
    }

    pub fn verbose_name(self) -> &'static str {
        self.model_name()
    }

    pub fn verbose_name_plural(self) -> &'static str {
        match self {
            AdminModel::User => "users",
            AdminModel::Fuel => "fuels",
            AdminModel::Payment => "payments",
            AdminModel::Machine => "machines",
            AdminModel::Creditor => "creditors",
        }
    }

    /// `app.model`, the key used by icons, hide lists and layout overrides
    pub fn key(self) -> String {
        format!("{}.{}", APP_LABEL, self.model_name())
    }

    /// Changelist column headers
    pub fn list_display(self) -> &'static [&'static str] {
        match self {
            AdminModel::User => &["Name", "Mobile no.", "Authorisation"],
            AdminModel::Fuel => &["Type", "Price"],
            AdminModel::Payment => &["Mode", "Allowed subcategory"],
            AdminModel::Machine => &["Name", "Fuel", "Reading"],
            AdminModel::Creditor => &["Payment", "Name", "Limit warning", "Limit stop credit"],
        }
    }

    pub fn changelist_url(self) -> String {
        format!("/admin/{}/{}/", APP_LABEL, self.model_name())
    }

    pub fn add_url(self) -> String {
        format!("{}add/", self.changelist_url())
    }

    pub fn change_url(self, id: i64) -> String {
        format!("{}{}/change/", self.changelist_url(), id)
    }

    pub fn delete_url(self, id: i64) -> String {
        format!("{}{}/delete/", self.changelist_url(), id)
    }
}

/// Model metadata for theme resolution
pub struct AdminRegistry;

impl ModelLookup for AdminRegistry {
    fn changelist_url(&self, app_label: &str, model_name: &str) -> Option<String> {
        (app_label == APP_LABEL)
            .then(|| AdminModel::from_name(model_name))
            .flatten()
            .map(AdminModel::changelist_url)
    }

    fn verbose_name_plural(&self, app_label: &str, model_name: &str) -> Option<String> {
        (app_label == APP_LABEL)
            .then(|| AdminModel::from_name(model_name))
            .flatten()
            .map(|m| m.verbose_name_plural().to_string())
    }
}

/// Side menu section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuApp {
    pub name: String,
    pub icon: String,
    pub models: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    pub name: String,
    pub url: String,
    pub icon: String,
    pub new_window: bool,
    pub active: bool,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn resolve_link(link: &MenuLink, settings: &SiteSettings, current_url: &str) -> MenuItem {
    let url = link
        .model
        .as_deref()
        .and_then(|key| key.split_once('.'))
        .and_then(|(app, model)| AdminRegistry.changelist_url(app, model))
        .or_else(|| link.url.clone())
        .unwrap_or_else(|| "#".to_string());

    MenuItem {
        name: link.name.clone().unwrap_or_default(),
        active: url == current_url,
        icon: link
            .icon
            .clone()
            .unwrap_or_else(|| settings.default_icon_children.clone()),
        new_window: link.new_window,
        url,
    }
}

/// Builds the side menu
///
/// Hidden apps and models are skipped, models follow
/// `order_with_respect_to` (unlisted ones keep registration order), and
/// custom links for the app are appended. A fixed "Others" section links the
/// report page.
pub fn side_menu(settings: &SiteSettings, current_url: &str) -> Vec<MenuApp> {
    let mut menu = Vec::new();

    if !settings.hide_apps.iter().any(|a| a == APP_LABEL) {
        let position = |key: &str| {
            settings
                .order_with_respect_to
                .iter()
                .position(|o| o.eq_ignore_ascii_case(key))
                .unwrap_or(usize::MAX)
        };

        let mut models: Vec<AdminModel> = AdminModel::ALL
            .into_iter()
            .filter(|m| !settings.is_hidden(APP_LABEL, &m.key()))
            .collect();
        models.sort_by_key(|m| position(&m.key()));

        let mut items: Vec<MenuItem> = models
            .into_iter()
            .map(|m| {
                let url = m.changelist_url();
                MenuItem {
                    name: capitalize(m.verbose_name_plural()),
                    icon: settings.icon_for(&m.key(), false).to_string(),
                    new_window: false,
                    active: current_url.starts_with(&url),
                    url,
                }
            })
            .collect();

        if let Some(links) = settings.custom_links.get(APP_LABEL) {
            items.extend(links.iter().map(|l| resolve_link(l, settings, current_url)));
        }

        menu.push(MenuApp {
            name: capitalize(APP_LABEL),
            icon: settings.icon_for(APP_LABEL, true).to_string(),
            models: items,
        });
    }

    menu.push(MenuApp {
        name: "Others".to_string(),
        icon: settings.default_icon_parents.clone(),
        models: vec![MenuItem {
            name: "Report".to_string(),
            url: REPORT_URL.to_string(),
            icon: settings.default_icon_children.clone(),
            new_window: false,
            active: current_url == REPORT_URL,
        }],
    });

    menu
}
