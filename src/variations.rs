use crate::color::{hex_to_rgba, hsv_to_rgb, rgb_to_hex, Hsva, Rgb};

pub const CHANNEL_OFFSETS: [i16; 11] = [-80, -60, -40, -20, -10, 0, 10, 20, 40, 60, 80];

#[derive(Debug, Clone, PartialEq)]
pub struct Swatch {
    pub label: String,
    pub rgb: Rgb,
}

impl Swatch {
    pub fn hex(&self) -> String {
        format!("#{}", rgb_to_hex(self.rgb.r, self.rgb.g, self.rgb.b))
    }
}

pub fn tints_and_shades(color: &Hsva) -> Vec<Swatch> {
    let (h, s, v) = (color.h(), color.s(), color.v());
    let mut swatches = Vec::with_capacity(9);

    for i in (1..=4).rev() {
        let step = i as f32 / 6.0;
        swatches.push(Swatch {
            label: format!("+{}%", i * 10),
            rgb: hsv_to_rgb(h, s, v + (1.0 - v) * step),
        });
    }

    swatches.push(Swatch {
        label: "Base".to_string(),
        rgb: color.to_rgb(),
    });

    for i in 1..=4 {
        let step = i as f32 / 6.0;
        swatches.push(Swatch {
            label: format!("-{}%", i * 10),
            rgb: hsv_to_rgb(h, s, v * (1.0 - step)),
        });
    }

    swatches
}

pub fn lighten_darken_hex(hex: &str, amount: i16) -> String {
    let Ok(rgba) = hex_to_rgba(hex) else {
        return hex.to_string();
    };
    let adjust = |c: u8| (c as i16 + amount).clamp(0, 255) as u8;
    format!("#{}", rgb_to_hex(adjust(rgba.r), adjust(rgba.g), adjust(rgba.b)))
}

pub fn channel_offsets(hex: &str) -> Vec<String> {
    CHANNEL_OFFSETS
        .iter()
        .map(|&amount| lighten_darken_hex(hex, amount))
        .collect()
}
