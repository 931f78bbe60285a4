//! Title-keyword theme selection for the page's decorative elements.

use std::f64::consts::PI;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    Gold,
    Red,
    Blue,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Wave,
    Dots,
    Floral,
    Heart,
    Rose,
    Curves,
    Bubble,
    Cloud,
    Leaf,
    Vine,
    Flower,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub name: ThemeName,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub background: &'static str,
    pub patterns: [Pattern; 3],
}

pub static GOLD: Theme = Theme {
    name: ThemeName::Gold,
    primary: "#D4AF37",
    secondary: "#B8860B",
    accent: "#F0E68C",
    background: "#FFF8DC",
    patterns: [Pattern::Wave, Pattern::Dots, Pattern::Floral],
};

pub static RED: Theme = Theme {
    name: ThemeName::Red,
    primary: "#DC143C",
    secondary: "#8B0000",
    accent: "#FF6347",
    background: "#FFE4E1",
    patterns: [Pattern::Heart, Pattern::Rose, Pattern::Curves],
};

pub static BLUE: Theme = Theme {
    name: ThemeName::Blue,
    primary: "#4169E1",
    secondary: "#191970",
    accent: "#87CEEB",
    background: "#E0F7FA",
    patterns: [Pattern::Wave, Pattern::Bubble, Pattern::Cloud],
};

pub static GREEN: Theme = Theme {
    name: ThemeName::Green,
    primary: "#228B22",
    secondary: "#006400",
    accent: "#90EE90",
    background: "#F0FFF0",
    patterns: [Pattern::Leaf, Pattern::Vine, Pattern::Flower],
};

const LOVE_KEYWORDS: &[&str] = &["婚", "嫁", "爱", "心", "wedding", "bridal", "love", "heart"];
const OCEAN_KEYWORDS: &[&str] = &["海", "蓝", "水", "ocean", "blue", "water"];
const NATURE_KEYWORDS: &[&str] = &["绿", "森", "叶", "自然", "green", "forest", "leaf", "nature"];

/// First match wins: love, then ocean, then nature, else gold.
pub fn select_theme(title: &str) -> &'static Theme {
    let title = title.to_lowercase();
    let hit = |keywords: &[&str]| keywords.iter().any(|k| title.contains(k));

    if hit(LOVE_KEYWORDS) {
        &RED
    } else if hit(OCEAN_KEYWORDS) {
        &BLUE
    } else if hit(NATURE_KEYWORDS) {
        &GREEN
    } else {
        &GOLD
    }
}

impl Theme {
    /// `#RRGGBB` as `rgba(r, g, b, alpha)`.
    pub fn primary_rgba(&self, alpha: f32) -> String {
        let channel = |i: usize| u8::from_str_radix(&self.primary[i..i + 2], 16).unwrap_or(0);
        format!("rgba({}, {}, {}, {})", channel(1), channel(3), channel(5), alpha)
    }
}

impl Pattern {
    /// Inline SVG strip (100x20 viewBox) drawn in the theme's colors.
    pub fn svg(self, theme: &Theme) -> String {
        let p = theme.primary;
        let body = match self {
            Pattern::Wave => format!(r#"<path d="M0,10 Q25,5 50,10 T100,10" stroke="{p}" stroke-width="1" fill="none"/>"#),
            Pattern::Dots => (0..5)
                .map(|i| format!(r#"<circle cx="{}" cy="10" r="1" fill="{p}"/>"#, 40 + i * 5))
                .collect(),
            Pattern::Floral => format!(
                r#"<path d="M10,10 Q15,5 20,10 Q25,15 30,10 Q35,5 40,10" stroke="{p}" stroke-width="1" fill="none"/><circle cx="20" cy="10" r="2" fill="{p}"/>"#
            ),
            Pattern::Heart => format!(
                r#"<path d="M10,10 C10,5 15,5 15,10 C15,15 10,15 10,10 Z" fill="{p}"/><path d="M15,10 C15,5 20,5 20,10 C20,15 15,15 15,10 Z" fill="{p}"/>"#
            ),
            Pattern::Rose => format!(
                r#"<circle cx="10" cy="10" r="3" fill="{p}"/><path d="M7,10 Q5,7 10,5 Q15,7 13,10 Q15,13 10,15 Q5,13 7,10 Z" fill="{}"/>"#,
                theme.secondary
            ),
            Pattern::Curves => format!(r#"<path d="M0,10 C25,0 25,20 50,10 C75,0 75,20 100,10" stroke="{p}" stroke-width="1" fill="none"/>"#),
            Pattern::Bubble => (0..5)
                .map(|i| format!(r#"<circle cx="{}" cy="10" r="3" fill="{p}"/>"#, 10 + i * 20))
                .collect(),
            Pattern::Cloud => format!(
                r#"<path d="M10,10 C5,10 5,5 10,5 C15,5 15,10 10,10 Z" fill="{p}"/><path d="M20,10 C15,10 15,5 20,5 C25,5 25,10 20,10 Z" fill="{p}"/><path d="M15,12 C10,12 10,7 15,7 C20,7 20,12 15,12 Z" fill="{p}"/>"#
            ),
            Pattern::Leaf => format!(r#"<path d="M10,10 Q5,5 15,5 Q20,10 15,15 Q5,15 10,10 Z" fill="{p}"/>"#),
            Pattern::Vine => {
                let mut s = format!(r#"<path d="M0,10 C25,5 25,15 50,10 C75,5 75,15 100,10" stroke="{p}" stroke-width="1" fill="none"/>"#);
                for i in 0..5 {
                    s.push_str(&format!(r#"<circle cx="{}" cy="10" r="2" fill="{p}"/>"#, i * 25));
                }
                s
            }
            Pattern::Flower => {
                let mut s = format!(r#"<circle cx="10" cy="10" r="2" fill="{p}"/>"#);
                for i in 0..5 {
                    let a = i as f64 * 2.0 * PI / 5.0;
                    let (x5, y5) = (10.0 + 5.0 * a.cos(), 10.0 + 5.0 * a.sin());
                    s.push_str(&format!(
                        r#"<path d="M10,10 L{x5:.2},{y5:.2}" stroke="{p}" stroke-width="1" fill="none"/>"#
                    ));
                }
                s
            }
        };
        format!(r#"<svg class="pattern" width="100%" height="20" viewBox="0 0 100 20" xmlns="http://www.w3.org/2000/svg">{body}</svg>"#)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keyword_classes_map_to_themes() {
        assert_eq!(select_theme("足金婚嫁龙凤手镯").name, ThemeName::Red);
        assert_eq!(select_theme("深海之蓝 项链").name, ThemeName::Blue);
        assert_eq!(select_theme("翡翠绿叶吊坠").name, ThemeName::Green);
        assert_eq!(select_theme("足金和田玉吊坠 祥云如意").name, ThemeName::Gold);
        assert_eq!(select_theme("").name, ThemeName::Gold);
    }

    #[test]
    fn priority_is_red_then_blue_then_green() {
        assert_eq!(select_theme("海洋之心").name, ThemeName::Red);
        assert_eq!(select_theme("森林湖水").name, ThemeName::Blue);
        assert_eq!(select_theme("自然之爱 海").name, ThemeName::Red);
    }

    #[test]
    fn latin_keywords_are_case_insensitive() {
        assert_eq!(select_theme("Bridal Pearl Set").name, ThemeName::Red);
        assert_eq!(select_theme("OCEAN drop earrings").name, ThemeName::Blue);
        assert_eq!(select_theme("Forest charm").name, ThemeName::Green);
    }

    #[test]
    fn theme_records_are_fixed() {
        assert_eq!(RED.patterns, [Pattern::Heart, Pattern::Rose, Pattern::Curves]);
        assert_eq!(GOLD.primary_rgba(0.3), "rgba(212, 175, 55, 0.3)");
        assert!(Pattern::Bubble.svg(&BLUE).contains("#4169E1"));
        assert_eq!(Pattern::Flower.svg(&GREEN).matches("<path").count(), 5);
    }
}
