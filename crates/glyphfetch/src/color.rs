//! Icon size variants and color token resolution.

/// Jewel-tone palette keys understood by the theme layer.
///
/// Each maps to an `--icon-{key}` CSS variable owned by the embedding
/// application's theme.
pub const JEWEL_PALETTE: [&str; 6] = [
    "amethyst", "citrine", "emerald", "ruby", "sapphire", "topaz",
];

/// Icon size variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IconSize {
    /// Small (16px hint).
    Small,
    /// Medium (24px hint). The default.
    #[default]
    Medium,
    /// Large (32px hint).
    Large,
}

impl IconSize {
    /// The attribute value used by the widget layer (`sm`, `md`, `lg`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "sm",
            Self::Medium => "md",
            Self::Large => "lg",
        }
    }

    /// Pixel size hint for the render surface.
    pub fn pixels(self) -> u32 {
        match self {
            Self::Small => 16,
            Self::Medium => 24,
            Self::Large => 32,
        }
    }
}

impl std::str::FromStr for IconSize {
    type Err = ();

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "sm" => Ok(Self::Small),
            "md" => Ok(Self::Medium),
            "lg" => Ok(Self::Large),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for IconSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve an optional color token to a CSS color value.
///
/// A known palette key maps to its theme variable reference; any other
/// non-empty token passes through unchanged as a literal CSS color. `None`
/// or an empty token means no override: the icon inherits the ambient text
/// color.
pub fn resolve_color(token: Option<&str>) -> Option<String> {
    let token = token?.trim();
    if token.is_empty() {
        return None;
    }
    if JEWEL_PALETTE.contains(&token) {
        Some(format!("var(--icon-{token})"))
    } else {
        Some(token.to_string())
    }
}
