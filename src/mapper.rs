// A drag session subscribes to pointer-move and pointer-up on the whole
// input surface, not just the control, so a fast drag that overshoots a
// narrow slider keeps tracking. The session owns its Subscriptions and
// dropping it unregisters both, whichever way the drag ends.

use crate::color::normalize_hue;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
}

impl Pointer {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    // A control with no usable size has not been laid out yet.
    pub fn is_mounted(&self) -> bool {
        [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }

    pub fn clamp_local(&self, pointer: Pointer) -> (f32, f32) {
        let x = if pointer.x.is_nan() { self.left } else { pointer.x };
        let y = if pointer.y.is_nan() { self.top } else { pointer.y };
        (
            (x - self.left).clamp(0.0, self.width),
            (y - self.top).clamp(0.0, self.height),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    SaturationValue,
    Hue,
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    SaturationValue { s: f32, v: f32 },
    Hue(f32),
    Alpha(f32),
}

impl Control {
    pub fn map(self, pointer: Pointer, bounds: Option<Bounds>) -> Option<ControlValue> {
        let bounds = bounds.filter(Bounds::is_mounted)?;
        let (x, y) = bounds.clamp_local(pointer);
        let fx = x / bounds.width;

        Some(match self {
            Control::SaturationValue => ControlValue::SaturationValue {
                s: fx,
                v: 1.0 - y / bounds.height,
            },
            // The right edge is 360, which wraps to red like the left edge.
            Control::Hue => ControlValue::Hue(normalize_hue((fx * 360.0).round())),
            Control::Alpha => ControlValue::Alpha(fx),
        })
    }
}

pub trait ControlLayout {
    fn bounds(&self, control: Control) -> Option<Bounds>;
}

impl<F> ControlLayout for F
where
    F: Fn(Control) -> Option<Bounds>,
{
    fn bounds(&self, control: Control) -> Option<Bounds> {
        self(control)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    Move,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move(Pointer),
    Up(Pointer),
    // Pointer capture lost: window blur, touch cancel, button released
    // while outside the window.
    Cancel,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    active: Vec<(u64, PointerEventKind)>,
}

#[derive(Default)]
pub struct PointerSurface {
    listeners: Arc<Mutex<Listeners>>,
}

impl PointerSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: PointerEventKind) -> Subscription {
        let mut listeners = self.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.active.push((id, kind));

        Subscription {
            id,
            kind,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().active.len()
    }

    pub fn has_listener(&self, kind: PointerEventKind) -> bool {
        self.listeners.lock().active.iter().any(|(_, k)| *k == kind)
    }
}

// Handle to a registered listener. Unregisters on drop.
pub struct Subscription {
    id: u64,
    kind: PointerEventKind,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn kind(&self) -> PointerEventKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().active.retain(|(id, _)| *id != self.id);
        }
    }
}

pub struct DragSession {
    control: Control,
    _on_move: Subscription,
    _on_up: Subscription,
}

impl DragSession {
    pub fn control(&self) -> Control {
        self.control
    }
}

#[derive(Default)]
pub struct DragController {
    surface: PointerSurface,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(&self) -> &PointerSurface {
        &self.surface
    }

    pub fn active_control(&self) -> Option<Control> {
        self.session.as_ref().map(DragSession::control)
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn on_drag_start(
        &mut self,
        control: Control,
        pointer: Pointer,
        layout: &impl ControlLayout,
    ) -> Option<ControlValue> {
        self.on_drag_end();

        let value = control.map(pointer, layout.bounds(control))?;
        self.session = Some(DragSession {
            control,
            _on_move: self.surface.subscribe(PointerEventKind::Move),
            _on_up: self.surface.subscribe(PointerEventKind::Up),
        });
        Some(value)
    }

    pub fn on_drag_move(
        &mut self,
        pointer: Pointer,
        layout: &impl ControlLayout,
    ) -> Option<ControlValue> {
        let control = self.active_control()?;
        control.map(pointer, layout.bounds(control))
    }

    pub fn on_drag_end(&mut self) -> bool {
        self.session.take().is_some()
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        layout: &impl ControlLayout,
    ) -> Option<ControlValue> {
        match event {
            PointerEvent::Move(pointer) => self.on_drag_move(pointer, layout),
            PointerEvent::Up(_) | PointerEvent::Cancel => {
                self.on_drag_end();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL: Bounds = Bounds {
        left: 10.0,
        top: 20.0,
        width: 200.0,
        height: 100.0,
    };

    fn layout(control: Control) -> Option<Bounds> {
        match control {
            Control::SaturationValue => Some(PANEL),
            Control::Hue => Some(Bounds::new(10.0, 140.0, 360.0, 16.0)),
            Control::Alpha => Some(Bounds::new(10.0, 170.0, 100.0, 16.0)),
        }
    }

    fn unmounted(_: Control) -> Option<Bounds> {
        None
    }

    #[test]
    fn sv_top_left_is_white() {
        let value = Control::SaturationValue.map(Pointer::new(10.0, 20.0), Some(PANEL));
        assert_eq!(value, Some(ControlValue::SaturationValue { s: 0.0, v: 1.0 }));
    }

    #[test]
    fn sv_bottom_right_is_black_full_saturation() {
        let value = Control::SaturationValue.map(Pointer::new(210.0, 120.0), Some(PANEL));
        assert_eq!(value, Some(ControlValue::SaturationValue { s: 1.0, v: 0.0 }));
    }

    #[test]
    fn pointer_outside_clamps_to_nearest_edge() {
        let value = Control::SaturationValue.map(Pointer::new(-500.0, 9000.0), Some(PANEL));
        assert_eq!(value, Some(ControlValue::SaturationValue { s: 0.0, v: 0.0 }));

        let value = Control::Alpha.map(Pointer::new(1e6, 0.0), layout(Control::Alpha));
        assert_eq!(value, Some(ControlValue::Alpha(1.0)));
    }

    #[test]
    fn hue_rounds_to_whole_degrees() {
        let bounds = layout(Control::Hue);
        assert_eq!(
            Control::Hue.map(Pointer::new(10.0 + 90.4, 0.0), bounds),
            Some(ControlValue::Hue(90.0))
        );
        assert_eq!(
            Control::Hue.map(Pointer::new(10.0, 0.0), bounds),
            Some(ControlValue::Hue(0.0))
        );
        assert_eq!(
            Control::Hue.map(Pointer::new(10.0 + 360.0, 0.0), bounds),
            Some(ControlValue::Hue(0.0)),
            "right edge wraps to red"
        );
        assert_eq!(
            Control::Hue.map(Pointer::new(10.0 + 359.6, 0.0), bounds),
            Some(ControlValue::Hue(0.0))
        );
        assert_eq!(
            Control::Hue.map(Pointer::new(10.0 + 359.4, 0.0), bounds),
            Some(ControlValue::Hue(359.0))
        );
    }

    #[test]
    fn degenerate_bounds_are_ignored() {
        for bounds in [
            Bounds::new(0.0, 0.0, 0.0, 10.0),
            Bounds::new(0.0, 0.0, 10.0, -1.0),
            Bounds::new(f32::NAN, 0.0, 10.0, 10.0),
        ] {
            assert_eq!(Control::Alpha.map(Pointer::new(1.0, 1.0), Some(bounds)), None);
        }
        assert_eq!(Control::Hue.map(Pointer::new(1.0, 1.0), None), None);
    }

    #[test]
    fn drag_start_registers_move_and_up_listeners() {
        let mut drag = DragController::new();
        let value = drag.on_drag_start(Control::Alpha, Pointer::new(60.0, 175.0), &layout);

        assert_eq!(value, Some(ControlValue::Alpha(0.5)));
        assert_eq!(drag.active_control(), Some(Control::Alpha));
        assert!(drag.surface().has_listener(PointerEventKind::Move));
        assert!(drag.surface().has_listener(PointerEventKind::Up));
        assert_eq!(drag.surface().listener_count(), 2);
    }

    #[test]
    fn drag_end_releases_listeners_and_is_idempotent() {
        let mut drag = DragController::new();
        drag.on_drag_start(Control::Hue, Pointer::new(10.0, 145.0), &layout);

        assert!(drag.on_drag_end());
        assert_eq!(drag.surface().listener_count(), 0);
        assert!(!drag.on_drag_end());
        assert!(!drag.on_drag_end());
        assert_eq!(drag.surface().listener_count(), 0);
    }

    #[test]
    fn repeated_drags_do_not_leak_listeners() {
        let mut drag = DragController::new();
        for i in 0..50 {
            drag.on_drag_start(Control::SaturationValue, Pointer::new(i as f32, 30.0), &layout);
            assert_eq!(drag.surface().listener_count(), 2, "after start #{i}");
        }
        drag.handle(PointerEvent::Up(Pointer::new(-1.0, -1.0)), &layout);
        assert_eq!(drag.surface().listener_count(), 0);
    }

    #[test]
    fn pointer_up_far_outside_any_control_still_ends_session() {
        let mut drag = DragController::new();
        drag.on_drag_start(Control::SaturationValue, Pointer::new(50.0, 50.0), &layout);
        drag.handle(PointerEvent::Up(Pointer::new(-4000.0, 4000.0)), &layout);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn cancel_ends_session() {
        let mut drag = DragController::new();
        drag.on_drag_start(Control::Hue, Pointer::new(50.0, 145.0), &layout);
        assert_eq!(drag.handle(PointerEvent::Cancel, &layout), None);
        assert_eq!(drag.surface().listener_count(), 0);
    }

    #[test]
    fn move_tracks_outside_the_control() {
        let mut drag = DragController::new();
        drag.on_drag_start(Control::Alpha, Pointer::new(20.0, 175.0), &layout);
        let value = drag.handle(PointerEvent::Move(Pointer::new(500.0, -300.0)), &layout);
        assert_eq!(value, Some(ControlValue::Alpha(1.0)));
    }

    #[test]
    fn move_uses_latest_bounds() {
        let mut drag = DragController::new();
        drag.on_drag_start(Control::Alpha, Pointer::new(10.0, 0.0), &layout);

        let shifted = |_: Control| Some(Bounds::new(110.0, 0.0, 100.0, 10.0));
        let value = drag.on_drag_move(Pointer::new(160.0, 0.0), &shifted);
        assert_eq!(value, Some(ControlValue::Alpha(0.5)));
    }

    #[test]
    fn move_without_session_is_ignored() {
        let mut drag = DragController::new();
        assert_eq!(drag.on_drag_move(Pointer::new(20.0, 30.0), &layout), None);
    }

    #[test]
    fn unmounted_control_drops_events_silently() {
        let mut drag = DragController::new();
        assert_eq!(
            drag.on_drag_start(Control::SaturationValue, Pointer::new(1.0, 1.0), &unmounted),
            None
        );
        assert!(!drag.is_dragging());
        assert_eq!(drag.surface().listener_count(), 0);

        drag.on_drag_start(Control::Hue, Pointer::new(20.0, 145.0), &layout);
        assert_eq!(drag.on_drag_move(Pointer::new(30.0, 145.0), &unmounted), None);
        assert!(drag.is_dragging(), "losing layout mid-drag does not end the session");
    }

    #[test]
    fn subscription_outliving_surface_drops_cleanly() {
        let surface = PointerSurface::new();
        let sub = surface.subscribe(PointerEventKind::Move);
        assert_eq!(sub.kind(), PointerEventKind::Move);
        drop(surface);
        drop(sub);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn mapped_values_stay_in_range(
                x in -1e5_f32..1e5,
                y in -1e5_f32..1e5,
                w in 1.0_f32..4000.0,
                h in 1.0_f32..4000.0,
            ) {
                let bounds = Some(Bounds::new(0.0, 0.0, w, h));
                let pointer = Pointer::new(x, y);

                match Control::SaturationValue.map(pointer, bounds) {
                    Some(ControlValue::SaturationValue { s, v }) => {
                        prop_assert!((0.0..=1.0).contains(&s), "s = {}", s);
                        prop_assert!((0.0..=1.0).contains(&v), "v = {}", v);
                    }
                    other => prop_assert!(false, "unexpected {:?}", other),
                }
                match Control::Hue.map(pointer, bounds) {
                    Some(ControlValue::Hue(hue)) => {
                        prop_assert!((0.0..360.0).contains(&hue), "hue = {}", hue)
                    }
                    other => prop_assert!(false, "unexpected {:?}", other),
                }
                match Control::Alpha.map(pointer, bounds) {
                    Some(ControlValue::Alpha(a)) => {
                        prop_assert!((0.0..=1.0).contains(&a), "a = {}", a)
                    }
                    other => prop_assert!(false, "unexpected {:?}", other),
                }
            }
        }
    }
}
