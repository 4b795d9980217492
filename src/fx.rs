use egui::{Color32, FontId, Pos2, Rect, Sense, Ui, Vec2};
use ultimate_rgb::color::hsl_to_rgb;

pub struct Ring {
    pub count: usize,
    // Radius as a fraction of the larger viewport side.
    pub radius: f32,
    pub hue_offset: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
    pub period_secs: f64,
    pub reverse: bool,
    pub size_base: f32,
}

pub const RINGS: [Ring; 3] = [
    Ring {
        count: 18,
        radius: 0.18,
        hue_offset: 0.0,
        saturation: 0.85,
        lightness: 0.60,
        alpha: 0.24,
        period_secs: 80.0,
        reverse: false,
        size_base: 9.0,
    },
    Ring {
        count: 24,
        radius: 0.28,
        hue_offset: 60.0,
        saturation: 0.80,
        lightness: 0.58,
        alpha: 0.20,
        period_secs: 110.0,
        reverse: true,
        size_base: 8.0,
    },
    Ring {
        count: 30,
        radius: 0.38,
        hue_offset: 300.0,
        saturation: 0.72,
        lightness: 0.55,
        alpha: 0.18,
        period_secs: 140.0,
        reverse: false,
        size_base: 7.0,
    },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dot {
    pub center: Pos2,
    pub radius: f32,
    pub color: Color32,
}

impl Ring {
    pub fn color(&self, hue: f32) -> Color32 {
        let rgb = hsl_to_rgb(hue + self.hue_offset, self.saturation, self.lightness);
        Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, (self.alpha * 255.0).round() as u8)
    }

    pub fn rotation(&self, time: f64) -> f32 {
        let turns = (time / self.period_secs).fract() as f32;
        let angle = turns * std::f32::consts::TAU;
        if self.reverse {
            -angle
        } else {
            angle
        }
    }

    pub fn dots(&self, viewport: Rect, hue: f32, time: f64) -> Vec<Dot> {
        let color = self.color(hue);
        let radius = viewport.width().max(viewport.height()) * self.radius;
        let rotation = self.rotation(time);
        let step = std::f32::consts::TAU / self.count as f32;

        (0..self.count)
            .map(|i| {
                let angle = rotation + step * i as f32;
                Dot {
                    center: viewport.center() + Vec2::angled(angle) * radius,
                    radius: (self.size_base + (i % 6) as f32) * 0.5,
                    color,
                }
            })
            .collect()
    }
}

pub fn paint_orbits(painter: &egui::Painter, viewport: Rect, hue: f32, time: f64) {
    for ring in &RINGS {
        for dot in ring.dots(viewport, hue, time) {
            painter.circle_filled(dot.center, dot.radius * 2.0, dot.color.gamma_multiply(0.25));
            painter.circle_filled(dot.center, dot.radius, dot.color);
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    current: char,
    previous: Option<char>,
    changed_at: f64,
}

#[derive(Debug, Clone)]
pub struct Odometer {
    slots: Vec<Slot>,
    duration: f64,
}

impl Odometer {
    pub fn new(duration: f64) -> Self {
        Self {
            slots: Vec::new(),
            duration,
        }
    }

    pub fn set(&mut self, text: &str, now: f64) {
        let chars: Vec<char> = text.chars().collect();
        self.slots.truncate(chars.len());
        for (i, ch) in chars.into_iter().enumerate() {
            match self.slots.get_mut(i) {
                Some(slot) if slot.current == ch => {}
                Some(slot) => {
                    slot.previous = Some(slot.current);
                    slot.current = ch;
                    slot.changed_at = now;
                }
                None => self.slots.push(Slot {
                    current: ch,
                    previous: None,
                    changed_at: now,
                }),
            }
        }
    }

    pub fn text(&self) -> String {
        self.slots.iter().map(|s| s.current).collect()
    }

    pub fn progress(&self, i: usize, now: f64) -> f32 {
        let Some(slot) = self.slots.get(i) else {
            return 1.0;
        };
        if slot.previous.is_none() || self.duration <= 0.0 {
            return 1.0;
        }
        let t = ((now - slot.changed_at) / self.duration).clamp(0.0, 1.0) as f32;
        // ease-out cubic
        1.0 - (1.0 - t).powi(3)
    }

    pub fn is_animating(&self, now: f64) -> bool {
        (0..self.slots.len()).any(|i| self.progress(i, now) < 1.0)
    }

    pub fn show(&mut self, ui: &mut Ui, text: &str, font: FontId, color: Color32) -> egui::Response {
        let now = ui.input(|i| i.time);
        self.set(text, now);

        let glyph = ui.fonts(|f| f.glyph_width(&font, '0'));
        let line = ui.fonts(|f| f.row_height(&font));
        let size = Vec2::new(glyph * self.slots.len() as f32, line);
        let (rect, response) = ui.allocate_exact_size(size, Sense::hover());

        let painter = ui.painter().with_clip_rect(rect);
        for (i, slot) in self.slots.iter().enumerate() {
            let p = self.progress(i, now);
            let x = rect.left() + glyph * (i as f32 + 0.5);
            let incoming = Pos2::new(x, rect.center().y + line * (1.0 - p));
            painter.text(
                incoming,
                egui::Align2::CENTER_CENTER,
                slot.current,
                font.clone(),
                color.gamma_multiply(p),
            );
            if let (Some(prev), true) = (slot.previous, p < 1.0) {
                let outgoing = Pos2::new(x, rect.center().y - line * p);
                painter.text(
                    outgoing,
                    egui::Align2::CENTER_CENTER,
                    prev,
                    font.clone(),
                    color.gamma_multiply(1.0 - p),
                );
            }
        }

        if self.is_animating(now) {
            ui.ctx().request_repaint();
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(1000.0, 500.0))
    }

    #[test]
    fn rings_orbit_the_viewport_center() {
        for ring in &RINGS {
            let dots = ring.dots(viewport(), 210.0, 12.5);
            assert_eq!(dots.len(), ring.count);
            for dot in dots {
                let distance = (dot.center - viewport().center()).length();
                assert!(
                    (distance - 1000.0 * ring.radius).abs() < 0.01,
                    "dot at {distance} should sit on the ring"
                );
            }
        }
    }

    #[test]
    fn reverse_rings_turn_the_other_way() {
        let t = RINGS[1].period_secs / 4.0;
        assert!(RINGS[0].rotation(RINGS[0].period_secs / 4.0) > 0.0);
        assert!(RINGS[1].rotation(t) < 0.0);
        assert!(RINGS[0].rotation(RINGS[0].period_secs).abs() < 1e-4, "full period returns home");
    }

    #[test]
    fn ring_colors_follow_hue() {
        assert_ne!(RINGS[0].color(0.0), RINGS[0].color(180.0));
        assert_eq!(RINGS[0].color(0.0).a(), 61);
        let rgb = hsl_to_rgb(0.0, 0.80, 0.58);
        assert_eq!(
            RINGS[1].color(300.0),
            Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, 51),
            "second ring is offset by 60 degrees"
        );
    }

    #[test]
    fn odometer_rolls_only_changed_digits() {
        let mut odo = Odometer::new(0.5);
        odo.set("210°", 0.0);
        assert!(!odo.is_animating(0.0), "initial text appears settled");

        odo.set("215°", 1.0);
        assert_eq!(odo.text(), "215°");
        assert_eq!(odo.progress(0, 1.1), 1.0);
        assert_eq!(odo.progress(1, 1.1), 1.0);
        assert!(odo.progress(2, 1.1) < 1.0);
        assert!(odo.is_animating(1.1));
        assert!(!odo.is_animating(1.5));
    }

    #[test]
    fn odometer_handles_length_changes() {
        let mut odo = Odometer::new(0.5);
        odo.set("100%", 0.0);
        odo.set("5%", 1.0);
        assert_eq!(odo.text(), "5%");
        odo.set("50%", 2.0);
        assert_eq!(odo.text(), "50%");
        assert_eq!(odo.progress(2, 2.0), 1.0, "appended slot has nothing to roll from");
    }
}
