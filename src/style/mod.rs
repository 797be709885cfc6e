//! # Colours
//!
//! The cut-guide palette. Guide colours are chosen by name from a fixed set;
//! anything else degrades to black with a warning so a typo never costs a
//! whole print run.

use std::fmt;
use std::str::FromStr;

use crate::error::ProxyError;

/// An RGB colour with components in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return Color::BLACK;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Named colours available for cut guides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuideColor {
    #[default]
    Black,
    White,
    Blue,
    Red,
    Green,
    Yellow,
    Orange,
}

impl GuideColor {
    pub const ALL: [GuideColor; 7] = [
        GuideColor::Black,
        GuideColor::White,
        GuideColor::Blue,
        GuideColor::Red,
        GuideColor::Green,
        GuideColor::Yellow,
        GuideColor::Orange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GuideColor::Black => "black",
            GuideColor::White => "white",
            GuideColor::Blue => "blue",
            GuideColor::Red => "red",
            GuideColor::Green => "green",
            GuideColor::Yellow => "yellow",
            GuideColor::Orange => "orange",
        }
    }

    /// Stroke colour used in the PDF.
    pub fn color(&self) -> Color {
        match self {
            GuideColor::Black => Color::BLACK,
            GuideColor::White => Color::WHITE,
            GuideColor::Blue => Color::rgb(0.0, 0.0, 1.0),
            GuideColor::Red => Color::rgb(1.0, 0.0, 0.0),
            GuideColor::Green => Color::hex("#008000"),
            GuideColor::Yellow => Color::rgb(1.0, 1.0, 0.0),
            GuideColor::Orange => Color::hex("#ffa500"),
        }
    }

    /// Look up a colour by name, falling back to black with a warning.
    pub fn resolve(name: &str) -> GuideColor {
        match name.parse() {
            Ok(color) => color,
            Err(e) => {
                log::warn!("{}. Defaulting to black.", e);
                GuideColor::Black
            }
        }
    }
}

impl FromStr for GuideColor {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        GuideColor::ALL
            .iter()
            .copied()
            .find(|c| c.name() == lower)
            .ok_or_else(|| ProxyError::UnknownColor(s.to_string()))
    }
}

impl fmt::Display for GuideColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
