use crossterm::style::{Color, Stylize};
use serde_json::{json, Value};

use crate::config::{darker, hex_to_rgb, ThemeMode, DEFAULT_ACCENT, HOVER_FACTOR};
use crate::tweaks::{Configuration, Feature};

pub const RESTART_HINT: &str = "Please restart your computer after desired tweaks are set.";

struct Palette {
    styled: bool,
    accent: Color,
    secondary: Color,
    dim: Option<Color>,
}

impl Palette {
    fn new(document: &Configuration, styled: bool) -> Self {
        let theme = document.theme.clone().unwrap_or_default();
        let (r, g, b) = theme.accent_rgb();
        let hex = format!("#{:02x}{:02x}{:02x}", r, g, b);
        let secondary = darker(&hex, HOVER_FACTOR)
            .as_deref()
            .and_then(hex_to_rgb)
            .map(|(r, g, b)| Color::Rgb { r, g, b })
            .unwrap_or(Color::Blue);
        let dim = match document.theme_mode() {
            ThemeMode::Dark => Some(Color::Grey),
            ThemeMode::Light => Some(Color::DarkGrey),
            ThemeMode::System => None,
        };

        Self {
            styled,
            accent: Color::Rgb { r, g, b },
            secondary,
            dim,
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.styled {
            text.with(self.accent).bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn category(&self, text: &str) -> String {
        if self.styled {
            text.with(self.secondary).to_string()
        } else {
            text.to_string()
        }
    }

    fn marker(&self, enabled: bool) -> String {
        let text = if enabled { "[on] " } else { "[off]" };
        match (self.styled, enabled) {
            (false, _) => text.to_string(),
            (true, true) => text.with(self.accent).bold().to_string(),
            (true, false) => text.dim().to_string(),
        }
    }

    fn faint(&self, text: &str) -> String {
        match (self.styled, self.dim) {
            (false, _) => text.to_string(),
            (true, Some(color)) => text.with(color).to_string(),
            (true, None) => text.dim().to_string(),
        }
    }
}

fn selected<'a>(document: &'a Configuration, feature: Option<&'a str>) -> impl Iterator<Item = &'a Feature> {
    document.tweaks.iter().filter(move |f| {
        feature.map_or(true, |wanted| f.feature.trim().eq_ignore_ascii_case(wanted.trim()))
    })
}

/// Human-readable listing of features, categories and tweak states.
pub fn render_listing(document: &Configuration, feature: Option<&str>, styled: bool) -> String {
    let palette = Palette::new(document, styled);
    let mut lines = Vec::new();

    for f in selected(document, feature) {
        lines.push(palette.heading(&f.feature));
        if f.categories.is_empty() {
            lines.push(format!("  {}", palette.faint(&format!("'{}' content coming soon...", f.feature))));
        }
        for category in &f.categories {
            lines.push(format!("  {}", palette.category(&category.category)));
            for item in &category.items {
                lines.push(format!("    {} {}", palette.marker(item.enabled), item.name.trim()));
                if !item.purpose.trim().is_empty() {
                    lines.push(format!("          {}", palette.faint(item.purpose.trim())));
                }
            }
        }
        lines.push(String::new());
    }

    if lines.is_empty() {
        return match feature {
            Some(name) => format!("No feature named '{}'.\n", name.trim()),
            None => "No tweaks available.\n".to_string(),
        };
    }

    lines.push(palette.faint(RESTART_HINT));
    lines.join("\n") + "\n"
}

pub fn render_theme(document: &Configuration, styled: bool) -> String {
    let palette = Palette::new(document, styled);
    let theme = document.theme.clone().unwrap_or_default();
    let (r, g, b) = theme.accent_rgb();
    let accent = format!("#{:02x}{:02x}{:02x}", r, g, b);
    let hover = darker(&accent, HOVER_FACTOR).unwrap_or_else(|| DEFAULT_ACCENT.to_string());

    let mut lines = vec![
        format!("mode:   {}", document.theme_mode()),
        format!("accent: {} (hover {})", palette.heading(&accent), palette.category(&hover)),
    ];
    if let Some(stored) = theme.accent_color.as_deref() {
        if hex_to_rgb(stored).is_none() {
            lines.push(palette.faint(&format!("stored accent '{}' is invalid, using default", stored)));
        }
    }
    lines.join("\n") + "\n"
}

/// Machine-readable listing. Command keys are spelled `on` / `off` here.
pub fn listing_json(document: &Configuration, feature: Option<&str>) -> Value {
    let features: Vec<Value> = selected(document, feature)
        .map(|f| {
            json!({
                "feature": f.feature,
                "categories": f.categories.iter().map(|c| json!({
                    "category": c.category,
                    "items": c.items.iter().map(|item| json!({
                        "name": item.name,
                        "purpose": item.purpose,
                        "enabled": item.enabled,
                        "on": item.enable_command,
                        "off": item.disable_command,
                    })).collect::<Vec<_>>(),
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    let theme = document.theme.clone().unwrap_or_default();
    json!({
        "tweaks": features,
        "theme": {
            "mode": document.theme_mode().as_str(),
            "accent_color": theme.accent_color,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
tweaks:
  - feature: Optimizer
    categories:
      - category: Privacy
        items:
          - name: Disable Telemetry
            purpose: Stops diagnostic uploads.
            enabled: true
            true: a
            false: b
          - name: Disable Ads
  - feature: Apps
theme:
  mode: dark
"#;

    fn doc() -> Configuration {
        Configuration::parse(DOC).unwrap().unwrap()
    }

    #[test]
    fn plain_listing_shows_state_and_placeholder() {
        let text = render_listing(&doc(), None, false);
        assert!(text.contains("Optimizer\n  Privacy\n"));
        assert!(text.contains("[on]  Disable Telemetry"));
        assert!(text.contains("Stops diagnostic uploads."));
        assert!(text.contains("[off] Disable Ads"));
        assert!(text.contains("'Apps' content coming soon..."));
        assert!(text.trim_end().ends_with(RESTART_HINT));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn listing_filters_by_feature() {
        let text = render_listing(&doc(), Some("apps"), false);
        assert!(text.contains("Apps"));
        assert!(!text.contains("Optimizer"));

        let missing = render_listing(&doc(), Some("Games"), false);
        assert_eq!(missing, "No feature named 'Games'.\n");
    }

    #[test]
    fn styled_listing_keeps_content() {
        let text = render_listing(&doc(), None, true);
        assert!(text.contains("Optimizer"));
        assert!(text.contains("Disable Telemetry"));
        assert!(text.contains("content coming soon"));
    }

    #[test]
    fn theme_report_falls_back_to_default_accent() {
        let text = render_theme(&doc(), false);
        assert!(text.contains("mode:   dark"));
        assert!(text.contains("accent: #3b8ed0"));
    }

    #[test]
    fn json_listing_carries_commands() {
        let value = listing_json(&doc(), None);
        let item = &value["tweaks"][0]["categories"][0]["items"][0];
        assert_eq!(item["name"], "Disable Telemetry");
        assert_eq!(item["enabled"], true);
        assert_eq!(item["on"], "a");
        assert_eq!(value["theme"]["mode"], "dark");
        assert!(value["theme"]["accent_color"].is_null());
    }
}
