use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static HEX_TRIPLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#?([0-9A-Fa-f]{6}|[0-9A-Fa-f]{3})$").expect("Invalid hex color regex")
});

/// An opaque RGB color persisted as an HTML hex triplet (`#RRGGBB`).
///
/// There is no alpha channel; anything finer than 8 bits per channel is lost
/// on the way through the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const DEEP_SKY_BLUE: Color = Color::rgb(0x00, 0xBF, 0xFF);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Encode as `#RRGGBB` (upper-case hex digits).
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::DEEP_SKY_BLUE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color: {0:?}")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    /// Accepts `#RRGGBB`, `#RGB`, with or without the leading `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = HEX_TRIPLET
            .captures(trimmed)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| ParseColorError(s.to_string()))?;

        let channel = |hex: &str| {
            u8::from_str_radix(hex, 16).map_err(|_| ParseColorError(s.to_string()))
        };

        if digits.len() == 3 {
            // #RGB expands each nibble: #1AF -> #11AAFF
            let expand = |i: usize| channel(digits[i..i + 1].repeat(2).as_str());
            Ok(Color::rgb(expand(0)?, expand(1)?, expand(2)?))
        } else {
            Ok(Color::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            ))
        }
    }
}
