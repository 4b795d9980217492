// HSV plus alpha is the canonical editing space. RGB, hex and CSS strings are
// projections recomputed from it and are never stored on their own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub fn unit(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

pub fn normalize_hue(h: f32) -> f32 {
    if !h.is_finite() {
        return 0.0;
    }
    let wrapped = h.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsva {
    h: f32,
    s: f32,
    v: f32,
    a: f32,
}

impl Default for Hsva {
    fn default() -> Self {
        Self::new(210.0, 0.6, 0.8, 1.0)
    }
}

impl Hsva {
    pub fn new(h: f32, s: f32, v: f32, a: f32) -> Self {
        Self {
            h: normalize_hue(h),
            s: unit(s),
            v: unit(v),
            a: unit(a),
        }
    }

    pub fn from_rgba(rgba: &Rgba) -> Self {
        let (h, s, v) = rgb_to_hsv(rgba.r, rgba.g, rgba.b);
        Self::new(h, s, v, rgba.a)
    }

    pub fn h(&self) -> f32 {
        self.h
    }

    pub fn s(&self) -> f32 {
        self.s
    }

    pub fn v(&self) -> f32 {
        self.v
    }

    pub fn a(&self) -> f32 {
        self.a
    }

    pub fn set_hue(&mut self, h: f32) {
        self.h = normalize_hue(h);
    }

    pub fn set_saturation(&mut self, s: f32) {
        self.s = unit(s);
    }

    pub fn set_value(&mut self, v: f32) {
        self.v = unit(v);
    }

    pub fn set_alpha(&mut self, a: f32) {
        self.a = unit(a);
    }

    // Re-clamps after deserialization, where fields bypass the setters.
    pub fn sanitized(self) -> Self {
        Self::new(self.h, self.s, self.v, self.a)
    }

    pub fn to_rgb(&self) -> Rgb {
        hsv_to_rgb(self.h, self.s, self.v)
    }

    pub fn to_rgba(&self) -> Rgba {
        self.to_rgb().with_alpha(self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn with_alpha(self, a: f32) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: unit(a),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    pub fn is_opaque(&self) -> bool {
        alpha_byte(self.a) == u8::MAX
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("empty hex color")]
    Empty,
    #[error("'{0}' is not a hex digit")]
    NonHexDigit(char),
    #[error("expected 3, 4, 6 or 8 hex digits, got {0}")]
    BadLength(usize),
}

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let h = normalize_hue(h);
    let s = unit(s);
    let v = unit(v);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Rgb::new(to_byte(r + m), to_byte(g + m), to_byte(b + m))
}

pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max == 0.0 { 0.0 } else { delta / max };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    (normalize_hue(h), s, v)
}

pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Rgb {
    let h = normalize_hue(h);
    let s = unit(s);
    let l = unit(l);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match (h / 60.0) as u8 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgb::new(to_byte(r + m), to_byte(g + m), to_byte(b + m))
}

pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("{:02X}{:02X}{:02X}", r, g, b)
}

pub fn alpha_byte(a: f32) -> u8 {
    (unit(a) * 255.0).round() as u8
}

pub fn with_alpha_to_hex8(r: u8, g: u8, b: u8, a: f32) -> String {
    format!("{}{:02X}", rgb_to_hex(r, g, b), alpha_byte(a))
}

pub fn hex_to_rgba(input: &str) -> Result<Rgba, HexError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(HexError::Empty);
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(HexError::NonHexDigit(bad));
    }

    let expanded: String = match digits.len() {
        3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => format!("{}FF", digits),
        8 => digits.to_string(),
        n => return Err(HexError::BadLength(n)),
    };

    // Every char is ASCII here, so byte ranges line up with digits.
    let byte = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).unwrap_or(0);

    Ok(Rgba {
        r: byte(0),
        g: byte(2),
        b: byte(4),
        a: byte(6) as f32 / 255.0,
    })
}

pub fn rgba_to_css_string(rgba: &Rgba) -> String {
    format!("rgba({}, {}, {}, {:.3})", rgba.r, rgba.g, rgba.b, unit(rgba.a))
}

fn to_byte(channel: f32) -> u8 {
    (unit(channel) * 255.0).round() as u8
}
