use crate::clipboard::{CopyOutcome, CopyTarget, TransientFlag};
use crate::color::{rgba_to_css_string, rgb_to_hex, with_alpha_to_hex8, Hsva, Rgb, Rgba};
use crate::hex::{self, HexInput};
use crate::mapper::{Control, ControlLayout, ControlValue, DragController, Pointer, PointerEvent};
use crate::palette::{KeyValueStore, Palette, PaletteStore};
use crate::variations::{self, Swatch};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Copied(CopyTarget),
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct HexField {
    text: String,
    error: Option<String>,
    focused: bool,
}

impl HexField {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

pub struct PickerOptions {
    pub initial: Hsva,
    pub palette_capacity: usize,
    pub copy_feedback: Duration,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            initial: Hsva::default(),
            palette_capacity: crate::palette::DEFAULT_CAPACITY,
            copy_feedback: Duration::from_millis(1400),
        }
    }
}

pub struct Picker {
    color: Hsva,
    hex_field: HexField,
    palette: PaletteStore,
    drag: DragController,
    copied: TransientFlag<CopyStatus>,
}

impl Picker {
    pub fn new(store: Arc<dyn KeyValueStore>, options: PickerOptions) -> Self {
        let palette = PaletteStore::load(store, options.palette_capacity);
        let mut picker = Self {
            color: options.initial.sanitized(),
            hex_field: HexField::default(),
            palette,
            drag: DragController::new(),
            copied: TransientFlag::new(options.copy_feedback),
        };
        picker.sync_hex_field();
        picker
    }

    pub fn color(&self) -> Hsva {
        self.color
    }

    pub fn rgb(&self) -> Rgb {
        self.color.to_rgb()
    }

    pub fn rgba(&self) -> Rgba {
        self.color.to_rgba()
    }

    pub fn hex6(&self) -> String {
        let rgb = self.rgb();
        rgb_to_hex(rgb.r, rgb.g, rgb.b)
    }

    pub fn hex8(&self) -> String {
        let rgb = self.rgb();
        with_alpha_to_hex8(rgb.r, rgb.g, rgb.b, self.color.a())
    }

    pub fn display_hex(&self) -> String {
        hex::canonical_hex(&self.rgba())
    }

    pub fn css(&self) -> String {
        rgba_to_css_string(&self.rgba())
    }

    pub fn rgb_readout(&self) -> String {
        let rgb = self.rgb();
        format!("{}, {}, {}", rgb.r, rgb.g, rgb.b)
    }

    pub fn hue_readout(&self) -> String {
        format!("{}°", self.color.h().round() as u32 % 360)
    }

    pub fn hsv_readout(&self) -> String {
        format!(
            "{}, {}%, {}%",
            self.color.h().round() as u32 % 360,
            (self.color.s() * 100.0).round() as u32,
            (self.color.v() * 100.0).round() as u32
        )
    }

    pub fn alpha_readout(&self) -> String {
        format!("{}%", self.alpha_percent())
    }

    pub fn alpha_percent(&self) -> u32 {
        (self.color.a() * 100.0).round() as u32
    }

    pub fn hex_field(&self) -> &HexField {
        &self.hex_field
    }

    pub fn palette(&self) -> &Palette {
        self.palette.palette()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn active_control(&self) -> Option<Control> {
        self.drag.active_control()
    }

    pub fn set_hue(&mut self, h: f32) {
        self.color.set_hue(h);
        self.sync_hex_field();
    }

    pub fn set_saturation_value(&mut self, s: f32, v: f32) {
        self.color.set_saturation(s);
        self.color.set_value(v);
        self.sync_hex_field();
    }

    pub fn set_alpha(&mut self, a: f32) {
        self.color.set_alpha(a);
        self.sync_hex_field();
    }

    pub fn set_alpha_percent_text(&mut self, text: &str) {
        let digits: String = text.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
        let percent = digits.parse::<u32>().unwrap_or(0).min(100);
        self.set_alpha(percent as f32 / 100.0);
    }

    fn apply(&mut self, value: ControlValue) {
        match value {
            ControlValue::SaturationValue { s, v } => self.set_saturation_value(s, v),
            ControlValue::Hue(h) => self.set_hue(h),
            ControlValue::Alpha(a) => self.set_alpha(a),
        }
    }

    pub fn begin_drag(&mut self, control: Control, pointer: Pointer, layout: &impl ControlLayout) {
        if let Some(value) = self.drag.on_drag_start(control, pointer, layout) {
            self.apply(value);
        }
    }

    pub fn drag_move(&mut self, pointer: Pointer, layout: &impl ControlLayout) {
        if let Some(value) = self.drag.on_drag_move(pointer, layout) {
            self.apply(value);
        }
    }

    pub fn end_drag(&mut self) -> bool {
        self.drag.on_drag_end()
    }

    pub fn pointer_event(&mut self, event: PointerEvent, layout: &impl ControlLayout) {
        if let Some(value) = self.drag.handle(event, layout) {
            self.apply(value);
        }
    }

    // Text typed into the hex field. Valid input replaces the color;
    // invalid input only sets the error and keeps the raw text.
    pub fn edit_hex(&mut self, text: &str) -> bool {
        self.hex_field.text = text.to_string();
        match hex::parse_and_validate(text) {
            HexInput::Valid { rgba } => {
                self.color = Hsva::from_rgba(&rgba);
                self.hex_field.error = None;
                true
            }
            HexInput::Invalid { reason } => {
                self.hex_field.error = Some(reason);
                false
            }
        }
    }

    pub fn set_hex_focus(&mut self, focused: bool) {
        self.hex_field.focused = focused;
        self.sync_hex_field();
    }

    fn sync_hex_field(&mut self) {
        if !self.hex_field.focused {
            self.hex_field.text = self.display_hex();
            self.hex_field.error = None;
        }
    }

    pub fn add_current_to_palette(&mut self) -> bool {
        let hex = self.display_hex();
        let added = self.palette.add(&hex);
        if added {
            crate::log_info!("Added {} to palette", hex);
        }
        added
    }

    pub fn remove_from_palette(&mut self, hex: &str) -> bool {
        let removed = self.palette.remove(hex);
        if removed {
            crate::log_info!("Removed {} from palette", hex);
        }
        removed
    }

    pub fn select_swatch(&mut self, hex: &str) -> bool {
        let Some(rgba) = hex::parse_and_validate(hex).rgba() else {
            return false;
        };
        self.color = Hsva::from_rgba(&rgba);
        self.hex_field.focused = false;
        self.sync_hex_field();
        true
    }

    pub fn swatches(&self) -> Vec<Swatch> {
        variations::tints_and_shades(&self.color)
    }

    pub fn channel_offsets(&self) -> Vec<String> {
        variations::channel_offsets(&self.hex6())
    }

    pub fn copy_text(&self, target: CopyTarget) -> String {
        match target {
            CopyTarget::Hex => self.display_hex(),
            CopyTarget::Css => self.css(),
            CopyTarget::Rgb => format!("rgb({})", self.rgb_readout()),
        }
    }

    pub fn note_copy_result(&mut self, target: CopyTarget, outcome: CopyOutcome, now: Instant) {
        let status = match outcome {
            CopyOutcome::Copied => CopyStatus::Copied(target),
            CopyOutcome::Failed => CopyStatus::Failed,
        };
        self.copied.set(status, now);
    }

    pub fn copy_status(&self, now: Instant) -> Option<CopyStatus> {
        self.copied.get(now).copied()
    }

    pub fn copy_status_remaining(&self, now: Instant) -> Option<Duration> {
        self.copied.remaining(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::Bounds;
    use crate::palette::DEFAULT_PALETTE;
    use crate::state::MemoryStore;

    fn picker() -> Picker {
        Picker::new(Arc::new(MemoryStore::new()), PickerOptions::default())
    }

    fn layout(control: Control) -> Option<Bounds> {
        match control {
            Control::SaturationValue => Some(Bounds::new(0.0, 0.0, 100.0, 100.0)),
            Control::Hue => Some(Bounds::new(0.0, 120.0, 360.0, 10.0)),
            Control::Alpha => Some(Bounds::new(0.0, 140.0, 100.0, 10.0)),
        }
    }

    #[test]
    fn starts_from_the_default_color() {
        let p = picker();
        assert_eq!(p.color(), Hsva::new(210.0, 0.6, 0.8, 1.0));
        assert_eq!(p.hex6(), "528FCC");
        assert_eq!(p.display_hex(), "#528FCC");
        assert_eq!(p.hex_field().text(), "#528FCC");
        assert_eq!(p.palette().entries(), DEFAULT_PALETTE);
    }

    #[test]
    fn display_hex_gains_alpha_when_translucent() {
        let mut p = picker();
        p.set_alpha(0.5);
        assert_eq!(p.display_hex(), "#528FCC80");
        assert_eq!(p.hex8(), "528FCC80");
        assert_eq!(p.css(), "rgba(82, 143, 204, 0.500)");
        assert_eq!(p.alpha_readout(), "50%");
    }

    #[test]
    fn readouts_round_components() {
        let mut p = picker();
        p.set_hue(359.6);
        p.set_saturation_value(0.123, 0.987);
        assert_eq!(p.hue_readout(), "0°");
        assert_eq!(p.hsv_readout(), "0, 12%, 99%");
    }

    #[test]
    fn valid_hex_replaces_color_and_alpha() {
        let mut p = picker();
        assert!(p.edit_hex("#FF000080"));
        let c = p.color();
        assert_eq!(c.h(), 0.0);
        assert_eq!(c.s(), 1.0);
        assert_eq!(c.v(), 1.0);
        assert!((c.a() - 0.5).abs() <= 1.0 / 255.0);
        assert_eq!(p.hex_field().error(), None);
    }

    #[test]
    fn invalid_hex_keeps_state_and_raw_text() {
        let mut p = picker();
        p.set_hex_focus(true);
        let before = p.color();

        for bad in ["#12", "#1234567", "zzzzzz"] {
            assert!(!p.edit_hex(bad));
            assert_eq!(p.color(), before, "{bad} must not change the color");
            assert_eq!(p.hex_field().text(), bad, "raw text stays visible");
            assert!(p.hex_field().error().is_some(), "{bad} should report an error");
        }
    }

    #[test]
    fn focused_field_is_not_reverted_by_other_edits() {
        let mut p = picker();
        p.set_hex_focus(true);
        p.edit_hex("#12");
        p.set_alpha(0.3);
        assert_eq!(p.hex_field().text(), "#12");
        assert!(p.hex_field().error().is_some());
    }

    #[test]
    fn blur_resyncs_field_and_clears_error() {
        let mut p = picker();
        p.set_hex_focus(true);
        p.edit_hex("#12");
        p.set_hex_focus(false);
        assert_eq!(p.hex_field().text(), "#528FCC");
        assert_eq!(p.hex_field().error(), None);
    }

    #[test]
    fn sv_drag_maps_corners() {
        let mut p = picker();
        p.begin_drag(Control::SaturationValue, Pointer::new(0.0, 0.0), &layout);
        assert_eq!((p.color().s(), p.color().v()), (0.0, 1.0));

        p.drag_move(Pointer::new(100.0, 100.0), &layout);
        assert_eq!((p.color().s(), p.color().v()), (1.0, 0.0));

        p.pointer_event(PointerEvent::Up(Pointer::new(500.0, 500.0)), &layout);
        assert!(!p.is_dragging());

        p.drag_move(Pointer::new(50.0, 50.0), &layout);
        assert_eq!((p.color().s(), p.color().v()), (1.0, 0.0), "moves after pointer-up are ignored");
    }

    #[test]
    fn hue_and_alpha_drags_update_only_their_channel() {
        let mut p = picker();
        p.begin_drag(Control::Hue, Pointer::new(90.0, 125.0), &layout);
        assert_eq!(p.color().h(), 90.0);
        assert_eq!(p.color().s(), 0.6);
        assert!(p.end_drag());

        p.begin_drag(Control::Alpha, Pointer::new(25.0, 145.0), &layout);
        assert_eq!(p.color().a(), 0.25);
        assert_eq!(p.color().h(), 90.0);
        p.end_drag();
        assert!(!p.end_drag());
    }

    #[test]
    fn hue_bar_right_edge_picks_pure_red() {
        let mut p = picker();
        p.set_saturation_value(1.0, 1.0);
        p.begin_drag(Control::Hue, Pointer::new(360.0, 125.0), &layout);
        assert_eq!(p.color().h(), 0.0);
        assert_eq!(p.hex6(), "FF0000");

        p.drag_move(Pointer::new(900.0, 125.0), &layout);
        assert_eq!(p.hex6(), "FF0000", "overshooting the bar stays red");
        p.end_drag();
    }

    #[test]
    fn alpha_percent_text_is_forgiving() {
        let mut p = picker();
        p.set_alpha_percent_text("42");
        assert_eq!(p.alpha_percent(), 42);
        p.set_alpha_percent_text("");
        assert_eq!(p.alpha_percent(), 0);
        p.set_alpha_percent_text("250");
        assert_eq!(p.alpha_percent(), 100);
        p.set_alpha_percent_text("7abc");
        assert_eq!(p.alpha_percent(), 7);
    }

    #[test]
    fn adding_current_color_is_idempotent() {
        let mut p = picker();
        let before = p.palette().len();
        assert!(p.add_current_to_palette());
        assert!(!p.add_current_to_palette());
        assert_eq!(p.palette().len(), before + 1);
        assert_eq!(p.palette().entries()[0], "#528FCC");
    }

    #[test]
    fn selecting_a_swatch_sets_color() {
        let mut p = picker();
        assert!(p.select_swatch("#06D6A0"));
        assert_eq!(p.hex6(), "06D6A0");
        assert_eq!(p.hex_field().text(), "#06D6A0");

        let before = p.color();
        assert!(!p.select_swatch("#nope"));
        assert_eq!(p.color(), before);
    }

    #[test]
    fn remove_from_palette_persists() {
        let store = Arc::new(MemoryStore::new());
        let mut p = Picker::new(store.clone(), PickerOptions::default());
        assert!(p.remove_from_palette("#FF6B6B"));
        let saved = store.get(crate::palette::PALETTE_KEY).unwrap().unwrap();
        assert!(!saved.contains("#FF6B6B"), "saved palette still has it: {saved}");
    }

    #[test]
    fn copy_status_is_transient() {
        let mut p = picker();
        let now = Instant::now();
        p.note_copy_result(CopyTarget::Css, CopyOutcome::Copied, now);
        assert_eq!(p.copy_status(now), Some(CopyStatus::Copied(CopyTarget::Css)));
        assert_eq!(p.copy_status(now + Duration::from_secs(2)), None);

        p.note_copy_result(CopyTarget::Hex, CopyOutcome::Failed, now);
        assert_eq!(p.copy_status(now), Some(CopyStatus::Failed));
    }

    #[test]
    fn copy_text_per_target() {
        let p = picker();
        assert_eq!(p.copy_text(CopyTarget::Hex), "#528FCC");
        assert_eq!(p.copy_text(CopyTarget::Css), "rgba(82, 143, 204, 1.000)");
        assert_eq!(p.copy_text(CopyTarget::Rgb), "rgb(82, 143, 204)");
    }

    #[test]
    fn variations_follow_current_color() {
        let mut p = picker();
        p.select_swatch("#808080");
        assert_eq!(p.channel_offsets()[5], "#808080");
        assert_eq!(p.swatches()[4].hex(), "#808080");
    }
}
