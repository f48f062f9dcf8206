/// Bundled Bootswatch themes and change-form layouts

/// Every selectable theme, in menu order
pub const THEMES: &[&str] = &[
    "default",
    "cerulean",
    "cosmo",
    "flatly",
    "journal",
    "litera",
    "lumen",
    "lux",
    "materia",
    "minty",
    "pulse",
    "sandstone",
    "simplex",
    "sketchy",
    "spacelab",
    "united",
    "yeti",
    "darkly",
    "cyborg",
    "slate",
    "solar",
    "superhero",
];

/// Themes that also switch the admin into dark mode
pub const DARK_THEMES: &[&str] = &["darkly", "cyborg", "slate", "solar", "superhero"];

pub const DEFAULT_THEME: &str = "default";
pub const DEFAULT_DARK_THEME: &str = "darkly";

pub fn is_theme(name: &str) -> bool {
    THEMES.contains(&name)
}

pub fn is_dark_theme(name: &str) -> bool {
    DARK_THEMES.contains(&name)
}

/// Stylesheet path of a theme, relative to the static root
pub fn theme_path(name: &str) -> String {
    format!("vendor/bootswatch/{}/bootstrap.min.css", name)
}

/// Joins a static-root-relative path onto the public static URL
pub fn static_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_themes_are_themes() {
        assert!(DARK_THEMES.iter().all(|t| is_theme(t)));
        assert_eq!(THEMES.len(), 22);
    }

    #[test]
    fn test_theme_path() {
        assert_eq!(theme_path("cosmo"), "vendor/bootswatch/cosmo/bootstrap.min.css");
        assert_eq!(
            static_url("/static/", &theme_path("cosmo")),
            "/static/vendor/bootswatch/cosmo/bootstrap.min.css"
        );
        assert_eq!(static_url("/static", "a.css"), "/static/a.css");
    }
}
