//! Colours and linear gradients.
//!
//! Colour values come from markup attributes (`<font color=#FF0000>`) and
//! from theme files. Both accept a hex colour, and theme files and `bgcolor`
//! additionally accept a gradient description `c1,c2[,c3],angle`.

use thiserror::Error;

use crate::geometry::Rect;

/// An sRGB colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colour {
    /// Red channel (0-255).
    pub r: u8,
    /// Green channel (0-255).
    pub g: u8,
    /// Blue channel (0-255).
    pub b: u8,
    /// Alpha channel (0-255, 255 = fully opaque).
    pub a: u8,
}

/// Failure to read a colour or gradient description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColourParseError {
    /// Not a 3, 4, 6 or 8 digit hex colour.
    #[error("invalid hex colour '{0}'")]
    InvalidHex(String),
    /// Neither a hex colour nor a known colour name.
    #[error("unknown colour '{0}'")]
    UnknownColour(String),
    /// A comma separated value that is not `c1,c2[,c3],angle`.
    #[error("invalid gradient '{0}'")]
    InvalidGradient(String),
}

impl Colour {
    /// Black (#000000)
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// White (#ffffff)
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// An opaque colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// A colour with explicit alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let short = |i: usize| u8::from_str_radix(&hex[i..=i].repeat(2), 16).ok();
        let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Self::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgb(long(0)?, long(2)?, long(4)?)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// The sixteen basic HTML colour keywords plus `transparent`.
    #[must_use]
    pub fn from_named(name: &str) -> Option<Self> {
        let colour = match name.trim().to_ascii_lowercase().as_str() {
            "white" => Self::WHITE,
            "black" => Self::BLACK,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "aqua" | "cyan" => Self::rgb(0, 255, 255),
            "fuchsia" | "magenta" => Self::rgb(255, 0, 255),
            "lime" => Self::rgb(0, 255, 0),
            "maroon" => Self::rgb(128, 0, 0),
            "navy" => Self::rgb(0, 0, 128),
            "olive" => Self::rgb(128, 128, 0),
            "purple" => Self::rgb(128, 0, 128),
            "silver" => Self::rgb(192, 192, 192),
            "teal" => Self::rgb(0, 128, 128),
            "transparent" => Self::TRANSPARENT,
            _ => return None,
        };
        Some(colour)
    }

    /// Parse a hex colour or colour keyword.
    ///
    /// # Errors
    ///
    /// [`ColourParseError::InvalidHex`] for a malformed `#` value and
    /// [`ColourParseError::UnknownColour`] for anything else unrecognised.
    pub fn parse(value: &str) -> Result<Self, ColourParseError> {
        let value = value.trim();
        if value.starts_with('#') {
            Self::from_hex(value).ok_or_else(|| ColourParseError::InvalidHex(value.to_string()))
        } else {
            Self::from_named(value).ok_or_else(|| ColourParseError::UnknownColour(value.to_string()))
        }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Channel-wise multiply, each channel scaled by `other / 255`.
    #[must_use]
    pub fn multiply(self, other: Self) -> Self {
        Self {
            r: mul_channel(self.r, other.r),
            g: mul_channel(self.g, other.g),
            b: mul_channel(self.b, other.b),
            a: mul_channel(self.a, other.a),
        }
    }

    /// Linear interpolation towards `other`, `t` clamped to `0.0..=1.0`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: lerp_channel(self.r, other.r, t),
            g: lerp_channel(self.g, other.g, t),
            b: lerp_channel(self.b, other.b, t),
            a: lerp_channel(self.a, other.a, t),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn mul_channel(a: u8, b: u8) -> u8 {
    // (a * b + 127) / 255 stays within u8 for all inputs.
    ((a as u16 * b as u16 + 127) / 255) as u8
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp_channel(from: u8, to: u8, t: f32) -> u8 {
    (f32::from(to) - f32::from(from))
        .mul_add(t, f32::from(from))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// A linear gradient of two or three colour stops.
///
/// The angle is in degrees, measured counter-clockwise from a left-to-right
/// gradient, so `90` runs from bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub struct ColourGradient {
    /// Direction of the gradient in degrees.
    pub angle: f32,
    /// Evenly spaced colour stops, first to last.
    pub stops: Vec<Colour>,
}

impl ColourGradient {
    /// Create a gradient. An empty stop list behaves as black.
    #[must_use]
    pub const fn new(angle: f32, stops: Vec<Colour>) -> Self {
        Self { angle, stops }
    }

    /// The first stop, used wherever only a single colour can be drawn.
    #[must_use]
    pub fn first_colour(&self) -> Colour {
        self.stops.first().copied().unwrap_or(Colour::BLACK)
    }

    /// Colour at position `t` along the gradient (`0.0` first stop, `1.0` last).
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn colour_at(&self, t: f32) -> Colour {
        match self.stops.as_slice() {
            [] => Colour::BLACK,
            [only] => *only,
            stops => {
                let segments = (stops.len() - 1) as f32;
                let scaled = t.clamp(0.0, 1.0) * segments;
                let index = (scaled.floor() as usize).min(stops.len() - 2);
                stops[index].lerp(stops[index + 1], scaled - index as f32)
            }
        }
    }

    /// Colour of the gradient at point `(px, py)` when it is stretched over
    /// `bounds`.
    #[must_use]
    pub fn colour_at_point(&self, bounds: &Rect, px: f32, py: f32) -> Colour {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        // Screen y grows downward, so a positive angle points up.
        let (dx, dy) = (cos, -sin);
        let project = |x: f32, y: f32| x.mul_add(dx, y * dy);
        let corners = [
            project(bounds.x, bounds.y),
            project(bounds.right(), bounds.y),
            project(bounds.x, bounds.bottom()),
            project(bounds.right(), bounds.bottom()),
        ];
        let min = corners.iter().copied().fold(f32::INFINITY, f32::min);
        let max = corners.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if max - min <= f32::EPSILON {
            return self.first_colour();
        }
        self.colour_at((project(px, py) - min) / (max - min))
    }
}

/// Either a flat colour or a gradient; most theme colours may be either.
#[derive(Debug, Clone, PartialEq)]
pub enum ColourOrGradient {
    /// A single colour.
    Colour(Colour),
    /// A linear gradient.
    Gradient(ColourGradient),
}

impl ColourOrGradient {
    /// The flat colour, or the gradient's first stop.
    #[must_use]
    pub fn base_colour(&self) -> Colour {
        match self {
            Self::Colour(colour) => *colour,
            Self::Gradient(gradient) => gradient.first_colour(),
        }
    }

    /// Colour at a point, for drawing over `bounds`.
    #[must_use]
    pub fn colour_at_point(&self, bounds: &Rect, px: f32, py: f32) -> Colour {
        match self {
            Self::Colour(colour) => *colour,
            Self::Gradient(gradient) => gradient.colour_at_point(bounds, px, py),
        }
    }

    /// True when nothing would be drawn.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        match self {
            Self::Colour(colour) => colour.a == 0,
            Self::Gradient(gradient) => gradient.stops.iter().all(|stop| stop.a == 0),
        }
    }
}

impl From<Colour> for ColourOrGradient {
    fn from(colour: Colour) -> Self {
        Self::Colour(colour)
    }
}

impl Default for ColourOrGradient {
    fn default() -> Self {
        Self::Colour(Colour::BLACK)
    }
}

/// Parse a colour, or a gradient description `c1,c2[,c3],angle`.
///
/// # Errors
///
/// Any unreadable stop or angle, or a stop count other than two or three,
/// is an error. Callers report it and fall back to black.
pub fn parse_colour_or_gradient(value: &str) -> Result<ColourOrGradient, ColourParseError> {
    if !value.contains(',') {
        return Colour::parse(value).map(ColourOrGradient::Colour);
    }

    let invalid = || ColourParseError::InvalidGradient(value.to_string());
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let Some((angle, colours)) = parts.split_last() else {
        return Err(invalid());
    };
    if !(2..=3).contains(&colours.len()) {
        return Err(invalid());
    }
    let angle: i32 = angle.parse().map_err(|_| invalid())?;
    let stops = colours
        .iter()
        .map(|part| Colour::parse(part).map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;

    #[allow(clippy::cast_precision_loss)]
    let angle = angle as f32;
    Ok(ColourOrGradient::Gradient(ColourGradient::new(angle, stops)))
}
