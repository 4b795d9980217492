use crate::fx::{self, Odometer};
use chrono::Datelike;
use egui::{Align, Color32, FontId, Layout, Mesh, Pos2, Rect, RichText, Sense, Shape, Stroke, Vec2};
use std::sync::Arc;
use std::time::{Duration, Instant};
use ultimate_rgb::clipboard::{finish_copy, ClipboardBackend, ClipboardError, ClipboardService, CopyOutcome, CopyTarget};
use ultimate_rgb::color::{alpha_byte, hsv_to_rgb, Hsva, Rgba};
use ultimate_rgb::mapper::{Bounds, Control, ControlLayout, Pointer, PointerEvent};
use ultimate_rgb::picker::{CopyStatus, Picker};
use ultimate_rgb::state::{AppState, StateManager};
use ultimate_rgb::log_info;

const NEWS_URL: &str = "https://t.me/StocksiUltimate_bot?start=r61558uUltimateRGB";

const BACKGROUND: Color32 = Color32::from_rgb(0x23, 0x23, 0x23);
const CHECKER_TILE: Color32 = Color32::from_rgb(0x2c, 0x2c, 0x2c);
const LABEL: Color32 = Color32::from_rgb(212, 212, 216);
const MUTED: Color32 = Color32::from_rgb(161, 161, 170);
const ERROR: Color32 = Color32::from_rgb(248, 113, 113);

const SV_HEIGHT: f32 = 280.0;
const BAR_HEIGHT: f32 = 16.0;
const SWATCH: Vec2 = Vec2::new(32.0, 32.0);

struct PlatformClipboard<'a> {
    ctx: &'a egui::Context,
}

impl ClipboardBackend for PlatformClipboard<'_> {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.ctx.output_mut(|o| o.copied_text = text.to_string());
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ControlRects {
    sv: Option<Rect>,
    hue: Option<Rect>,
    alpha: Option<Rect>,
}

impl ControlLayout for ControlRects {
    fn bounds(&self, control: Control) -> Option<Bounds> {
        let rect = match control {
            Control::SaturationValue => self.sv,
            Control::Hue => self.hue,
            Control::Alpha => self.alpha,
        }?;
        Some(Bounds::new(rect.left(), rect.top(), rect.width(), rect.height()))
    }
}

pub struct PickerGui {
    picker: Picker,
    state: Option<Arc<StateManager>>,
    clipboard: ClipboardService,
    pending_copies: usize,

    rects: ControlRects,
    hue_odometer: Odometer,
    alpha_odometer: Odometer,
    alpha_text: String,
    alpha_focused: bool,

    show_background: bool,
    saved_color: Hsva,
    saved_window_size: [f32; 2],
    first_frame: bool,
}

impl PickerGui {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        picker: Picker,
        state: Option<Arc<StateManager>>,
        settings: AppState,
    ) -> Self {
        log_info!("Initializing picker window");

        cc.egui_ctx.style_mut(|style| {
            style.visuals.panel_fill = BACKGROUND;
            style.interaction.selectable_labels = false;
        });

        let saved_color = picker.color();
        Self {
            alpha_text: picker.alpha_percent().to_string(),
            picker,
            state,
            clipboard: ClipboardService::spawn(),
            pending_copies: 0,
            rects: ControlRects::default(),
            hue_odometer: Odometer::new(0.5),
            alpha_odometer: Odometer::new(0.5),
            alpha_focused: false,
            show_background: settings.show_background,
            saved_color,
            saved_window_size: settings.window_size,
            first_frame: true,
        }
    }

    fn update_settings(&self, f: impl FnOnce(&mut AppState)) {
        if let Some(state) = &self.state {
            state.update(f);
        }
    }

    // Feeds global pointer state into the open drag session. Releasing the
    // button ends it, and so does the pointer leaving the window or the
    // window losing focus.
    fn track_pointer(&mut self, ctx: &egui::Context) {
        if !self.picker.is_dragging() {
            return;
        }

        let (pos, down, focused) = ctx.input(|i| (i.pointer.latest_pos(), i.pointer.primary_down(), i.focused));
        let event = match pos {
            _ if !focused => PointerEvent::Cancel,
            None => PointerEvent::Cancel,
            Some(p) if down => PointerEvent::Move(Pointer::new(p.x, p.y)),
            Some(p) => PointerEvent::Up(Pointer::new(p.x, p.y)),
        };

        let rects = self.rects;
        self.picker.pointer_event(event, &rects);
        ctx.request_repaint();
    }

    fn press(&mut self, control: Control, response: &egui::Response) {
        if !response.is_pointer_button_down_on() || self.picker.active_control() == Some(control) {
            return;
        }
        if let Some(pos) = response.interact_pointer_pos() {
            let rects = self.rects;
            self.picker.begin_drag(control, Pointer::new(pos.x, pos.y), &rects);
        }
    }

    fn copy(&mut self, ctx: &egui::Context, target: CopyTarget) {
        let text = self.picker.copy_text(target);
        if self.clipboard.request(target, text.clone()) {
            self.pending_copies += 1;
            ctx.request_repaint_after(Duration::from_millis(16));
            return;
        }

        let primary = Err(ClipboardError::Unavailable("clipboard worker stopped".to_string()));
        let outcome = finish_copy(primary, &mut PlatformClipboard { ctx }, &text);
        self.picker.note_copy_result(target, outcome, Instant::now());
    }

    fn poll_clipboard(&mut self, ctx: &egui::Context, now: Instant) {
        for result in self.clipboard.poll() {
            self.pending_copies = self.pending_copies.saturating_sub(1);
            let outcome = finish_copy(result.result, &mut PlatformClipboard { ctx }, &result.text);
            if outcome == CopyOutcome::Copied {
                log_info!("Copied {}: {}", result.target.label(), result.text);
            }
            self.picker.note_copy_result(result.target, outcome, now);
        }

        if self.pending_copies > 0 {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }

    fn persist_changes(&mut self, ctx: &egui::Context) {
        let color = self.picker.color();
        if !self.picker.is_dragging() && color != self.saved_color {
            self.saved_color = color;
            self.update_settings(|s| s.last_color = Some(color));
        }

        let (size, down) = ctx.input(|i| {
            (
                i.viewport().inner_rect.map(|r| [r.width(), r.height()]),
                i.pointer.any_down(),
            )
        });
        if let Some(size) = size {
            let resized = (size[0] - self.saved_window_size[0]).abs() > 0.5
                || (size[1] - self.saved_window_size[1]).abs() > 0.5;
            if resized && !down {
                self.saved_window_size = size;
                self.update_settings(|s| s.window_size = size);
            }
        }
    }

    fn paint_background(&self, ctx: &egui::Context) {
        let rect = ctx.screen_rect();
        let painter = ctx.layer_painter(egui::LayerId::background());
        painter.rect_filled(rect, 0.0, BACKGROUND);
        if self.show_background {
            let time = ctx.input(|i| i.time);
            fx::paint_orbits(&painter, rect, self.picker.color().h(), time);
            ctx.request_repaint_after(Duration::from_millis(33));
        }
    }

    fn header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Ultimate RGB").size(20.0).strong().color(LABEL));
            ui.label(RichText::new("HEX + Alpha").color(MUTED));

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.hyperlink_to(RichText::new("Instant news service ↗").size(12.0), NEWS_URL);
                ui.add_space(12.0);
                if ui.checkbox(&mut self.show_background, "Background").changed() {
                    let show = self.show_background;
                    if let Some(state) = &self.state {
                        state.update(|s| s.show_background = show);
                    }
                }
            });
        });
    }

    fn controls_column(&mut self, ui: &mut egui::Ui) {
        section_label(ui, "Palette (saturation × value)");
        let (rect, response) = ui.allocate_exact_size(Vec2::new(ui.available_width(), SV_HEIGHT), Sense::click_and_drag());
        self.rects.sv = Some(rect);
        self.press(Control::SaturationValue, &response);
        response.on_hover_cursor(egui::CursorIcon::Crosshair);

        let color = self.picker.color();
        let current = to_color32(&self.picker.rgba());
        paint_sv_panel(ui.painter(), rect, color.h());
        let thumb = Pos2::new(rect.left() + color.s() * rect.width(), rect.top() + (1.0 - color.v()) * rect.height());
        paint_thumb(ui.painter(), thumb, 10.0, current);

        ui.add_space(16.0);
        ui.horizontal(|ui| {
            ui.label(RichText::new("Hue").color(LABEL));
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                self.hue_odometer.show(ui, &self.picker.hue_readout(), FontId::monospace(13.0), MUTED);
            });
        });
        let (rect, response) = ui.allocate_exact_size(Vec2::new(ui.available_width(), BAR_HEIGHT), Sense::click_and_drag());
        self.rects.hue = Some(rect);
        self.press(Control::Hue, &response);
        response.on_hover_cursor(egui::CursorIcon::ResizeHorizontal);

        let h = self.picker.color().h();
        paint_gradient(ui.painter(), rect, 36, |t| {
            let rgb = hsv_to_rgb(t * 360.0, 1.0, 1.0);
            Color32::from_rgb(rgb.r, rgb.g, rgb.b)
        });
        let pure = hsv_to_rgb(h, 1.0, 1.0);
        paint_thumb(
            ui.painter(),
            Pos2::new(rect.left() + h / 360.0 * rect.width(), rect.center().y),
            12.0,
            Color32::from_rgb(pure.r, pure.g, pure.b),
        );

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            ui.label(RichText::new("Alpha").color(LABEL));
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                self.alpha_odometer.show(ui, &self.picker.alpha_readout(), FontId::monospace(13.0), MUTED);
            });
        });
        let (rect, response) = ui.allocate_exact_size(Vec2::new(ui.available_width(), BAR_HEIGHT), Sense::click_and_drag());
        self.rects.alpha = Some(rect);
        self.press(Control::Alpha, &response);
        response.on_hover_cursor(egui::CursorIcon::ResizeHorizontal);

        let rgb = self.picker.rgb();
        paint_checkerboard(ui.painter(), rect, 8.0);
        paint_gradient(ui.painter(), rect, 1, |t| {
            Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, alpha_byte(t))
        });
        paint_thumb(
            ui.painter(),
            Pos2::new(rect.left() + self.picker.color().a() * rect.width(), rect.center().y),
            12.0,
            to_color32(&self.picker.rgba()),
        );

        ui.add_space(20.0);
        section_label(ui, "Tints and shades");
        let mut picked = None;
        ui.horizontal_wrapped(|ui| {
            for swatch in self.picker.swatches() {
                let fill = Color32::from_rgb(swatch.rgb.r, swatch.rgb.g, swatch.rgb.b);
                let hex = swatch.hex();
                if swatch_button(ui, fill, SWATCH, &format!("{} {}", swatch.label, hex)).clicked() {
                    picked = Some(hex);
                }
            }
        });
        if let Some(hex) = picked {
            self.picker.select_swatch(&hex);
        }
    }

    fn details_column(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, now: Instant) {
        section_label(ui, "Preview");
        let (rect, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), 112.0), Sense::hover());
        let current = to_color32(&self.picker.rgba());
        let (left, right) = rect.split_left_right_at_fraction(0.5);
        paint_checkerboard(ui.painter(), left, 8.0);
        ui.painter().rect_filled(left.shrink(8.0), 12.0, current);
        ui.painter().rect_filled(right.shrink(8.0), 12.0, current.to_opaque());

        ui.add_space(12.0);
        section_label(ui, "HEX");
        ui.horizontal(|ui| {
            let mut text = self.picker.hex_field().text().to_string();
            let response = ui.add(
                egui::TextEdit::singleline(&mut text)
                    .font(egui::TextStyle::Monospace)
                    .desired_width(ui.available_width() - 90.0),
            );
            if response.gained_focus() {
                self.picker.set_hex_focus(true);
            }
            if response.changed() {
                self.picker.edit_hex(&text);
            }
            if response.lost_focus() {
                self.picker.set_hex_focus(false);
            }
            self.copy_button(ui, ctx, CopyTarget::Hex, now);
        });
        if let Some(error) = self.picker.hex_field().error() {
            ui.label(RichText::new(error).size(12.0).color(ERROR));
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label(RichText::new("Alpha").color(LABEL));
            if !self.alpha_focused {
                self.alpha_text = self.picker.alpha_percent().to_string();
            }
            let response = ui.add(egui::TextEdit::singleline(&mut self.alpha_text).desired_width(48.0));
            self.alpha_focused = response.has_focus();
            if response.changed() {
                self.picker.set_alpha_percent_text(&self.alpha_text);
            }
            ui.label(RichText::new("%").color(MUTED));
        });

        ui.add_space(8.0);
        egui::Grid::new("readouts")
            .num_columns(3)
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                ui.label(RichText::new("RGB").color(MUTED));
                ui.monospace(self.picker.rgb_readout());
                self.copy_button(ui, ctx, CopyTarget::Rgb, now);
                ui.end_row();

                ui.label(RichText::new("HSV").color(MUTED));
                ui.monospace(self.picker.hsv_readout());
                ui.label("");
                ui.end_row();

                ui.label(RichText::new("CSS").color(MUTED));
                ui.monospace(self.picker.css());
                self.copy_button(ui, ctx, CopyTarget::Css, now);
                ui.end_row();
            });

        if self.picker.copy_status(now) == Some(CopyStatus::Failed) {
            ui.label(RichText::new("Copy failed").size(12.0).color(ERROR));
        }

        ui.add_space(16.0);
        ui.horizontal(|ui| {
            section_label(ui, "My palette");
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("+ Add").on_hover_text("Save the current color").clicked() {
                    self.picker.add_current_to_palette();
                }
            });
        });

        let mut picked = None;
        let mut removed = None;
        ui.horizontal_wrapped(|ui| {
            for hex in self.picker.palette().entries() {
                let Some(rgba) = ultimate_rgb::hex::parse_and_validate(hex).rgba() else {
                    continue;
                };
                let response = swatch_button(ui, to_color32(&rgba), SWATCH, hex);
                if response.clicked() {
                    picked = Some(hex.clone());
                }
                response.context_menu(|ui| {
                    if ui.button("Remove").clicked() {
                        removed = Some(hex.clone());
                        ui.close_menu();
                    }
                });
            }
        });
        if let Some(hex) = picked {
            self.picker.select_swatch(&hex);
        }
        if let Some(hex) = removed {
            self.picker.remove_from_palette(&hex);
        }
        ui.label(
            RichText::new(format!(
                "{} / {} · right-click a swatch to remove it",
                self.picker.palette().len(),
                self.picker.palette().capacity()
            ))
            .size(11.0)
            .color(MUTED),
        );

        ui.add_space(16.0);
        section_label(ui, "Lighter / darker");
        let mut picked = None;
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 4.0;
            for hex in self.picker.channel_offsets() {
                let Some(rgba) = ultimate_rgb::hex::parse_and_validate(&hex).rgba() else {
                    continue;
                };
                if swatch_button(ui, to_color32(&rgba), Vec2::new(24.0, 24.0), &hex).clicked() {
                    picked = Some(hex);
                }
            }
        });
        if let Some(hex) = picked {
            self.picker.select_swatch(&hex);
        }
    }

    fn copy_button(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, target: CopyTarget, now: Instant) {
        let copied = self.picker.copy_status(now) == Some(CopyStatus::Copied(target));
        let label = if copied { "Copied!" } else { "Copy" };
        let response = ui
            .add_sized([72.0, 20.0], egui::Button::new(label))
            .on_hover_text(format!("Copy {}", target.label()));
        if response.clicked() {
            self.copy(ctx, target);
        }
    }
}

impl eframe::App for PickerGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
            self.first_frame = false;
        }

        let now = Instant::now();
        self.track_pointer(ctx);
        self.poll_clipboard(ctx, now);
        self.paint_background(ctx);

        egui::TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(BACKGROUND.gamma_multiply(0.8))
                    .inner_margin(egui::Margin::symmetric(16.0, 10.0)),
            )
            .show(ctx, |ui| self.header(ui));

        egui::TopBottomPanel::bottom("footer")
            .frame(egui::Frame::none().inner_margin(egui::Margin::symmetric(16.0, 8.0)))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    let year = chrono::Local::now().year();
                    ui.label(RichText::new(format!("© {} Ultimate RGB", year)).size(11.0).color(MUTED));
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().inner_margin(16.0))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.columns(2, |columns| {
                        self.controls_column(&mut columns[0]);
                        self.details_column(&mut columns[1], ctx, now);
                    });
                });
            });

        self.persist_changes(ctx);

        if let Some(left) = self.picker.copy_status_remaining(now) {
            ctx.request_repaint_after(left);
        }
    }
}

fn section_label(ui: &mut egui::Ui, text: &str) {
    ui.label(RichText::new(text).size(13.0).strong().color(LABEL));
}

fn to_color32(rgba: &Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(rgba.r, rgba.g, rgba.b, alpha_byte(rgba.a))
}

fn paint_checkerboard(painter: &egui::Painter, rect: Rect, cell: f32) {
    let painter = painter.with_clip_rect(rect.intersect(painter.clip_rect()));
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let cols = (rect.width() / cell).ceil() as usize;
    let rows = (rect.height() / cell).ceil() as usize;
    for row in 0..rows {
        for col in 0..cols {
            if (row + col) % 2 == 0 {
                let min = rect.min + Vec2::new(col as f32 * cell, row as f32 * cell);
                painter.rect_filled(Rect::from_min_size(min, Vec2::splat(cell)), 0.0, CHECKER_TILE);
            }
        }
    }
}

fn paint_sv_panel(painter: &egui::Painter, rect: Rect, hue: f32) {
    const STEPS: u32 = 24;
    let mut mesh = Mesh::default();

    for row in 0..=STEPS {
        for col in 0..=STEPS {
            let s = col as f32 / STEPS as f32;
            let v = 1.0 - row as f32 / STEPS as f32;
            let rgb = hsv_to_rgb(hue, s, v);
            let pos = Pos2::new(rect.left() + s * rect.width(), rect.top() + (1.0 - v) * rect.height());
            mesh.colored_vertex(pos, Color32::from_rgb(rgb.r, rgb.g, rgb.b));
        }
    }

    let stride = STEPS + 1;
    for row in 0..STEPS {
        for col in 0..STEPS {
            let i = row * stride + col;
            mesh.add_triangle(i, i + 1, i + stride);
            mesh.add_triangle(i + 1, i + stride + 1, i + stride);
        }
    }

    painter.add(Shape::mesh(mesh));
}

fn paint_gradient(painter: &egui::Painter, rect: Rect, steps: u32, color_at: impl Fn(f32) -> Color32) {
    let mut mesh = Mesh::default();
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let color = color_at(t);
        let x = rect.left() + t * rect.width();
        mesh.colored_vertex(Pos2::new(x, rect.top()), color);
        mesh.colored_vertex(Pos2::new(x, rect.bottom()), color);
        if i > 0 {
            let base = (i - 1) * 2;
            mesh.add_triangle(base, base + 1, base + 2);
            mesh.add_triangle(base + 1, base + 3, base + 2);
        }
    }
    painter.add(Shape::mesh(mesh));
}

fn paint_thumb(painter: &egui::Painter, center: Pos2, radius: f32, fill: Color32) {
    painter.circle_filled(center + Vec2::new(0.0, 1.5), radius + 1.0, Color32::from_black_alpha(80));
    painter.circle(center, radius, fill, Stroke::new(2.0, Color32::WHITE));
}

fn swatch_button(ui: &mut egui::Ui, fill: Color32, size: Vec2, hover: &str) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(size, Sense::click());
    if fill.a() < 255 {
        paint_checkerboard(ui.painter(), rect, 6.0);
    }
    ui.painter().rect_filled(rect, 6.0, fill);
    if response.hovered() {
        ui.painter().rect_stroke(rect, 6.0, Stroke::new(1.5, Color32::WHITE));
    }
    response.on_hover_text(hover)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_rects_report_bounds_per_control() {
        let rects = ControlRects {
            sv: Some(Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(300.0, 280.0))),
            hue: Some(Rect::from_min_size(Pos2::new(10.0, 320.0), Vec2::new(300.0, 16.0))),
            alpha: None,
        };

        let sv = rects.bounds(Control::SaturationValue).expect("sv is laid out");
        assert_eq!((sv.left, sv.top, sv.width, sv.height), (10.0, 20.0, 300.0, 280.0));
        assert!(rects.bounds(Control::Hue).is_some());
        assert!(rects.bounds(Control::Alpha).is_none(), "alpha was never laid out");
    }

    #[test]
    fn translucent_colors_keep_their_alpha() {
        let rgba = Rgba { r: 255, g: 0, b: 0, a: 0.5 };
        assert_eq!(to_color32(&rgba).a(), 128);
        let opaque = Rgba { r: 1, g: 2, b: 3, a: 1.0 };
        assert_eq!(to_color32(&opaque), Color32::from_rgb(1, 2, 3));
    }
}
