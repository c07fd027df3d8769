//! Pointer routing
//!
//! Window-pixel events are converted to grid-local pixels and broadcast to
//! every item. The layout keeps the hovered unit cell and the right-button
//! drag selection.

use super::layout::{Layout, LayoutState};
use crate::host::Frontend;
use crate::items::{Modifiers, MouseButtons, MouseData, MouseEventKind};

/// Pointer event in window pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerEvent {
    pub x: i32,
    pub y: i32,
    /// Button that changed state (press and release only)
    pub button: MouseButtons,
    /// Buttons held after the event
    pub buttons: MouseButtons,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(x: i32, y: i32, buttons: MouseButtons) -> Self {
        Self { x, y, buttons, ..Default::default() }
    }

    pub fn with_button(mut self, button: MouseButtons) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

fn broadcast(state: &mut LayoutState, e: &PointerEvent, kind: MouseEventKind, host: &dyn Frontend) {
    let cfg = state.cfg;
    let (x, y) = cfg.window_to_grid(e.x, e.y);
    let data = MouseData { x, y, buttons: e.buttons, modifiers: e.modifiers, kind };
    for item in &mut state.items {
        item.mouse_event(&data, &cfg, host);
    }
}

impl Layout {
    pub fn mouse_moved(&self, e: &PointerEvent) {
        let mut s = self.state.lock();
        broadcast(&mut s, e, MouseEventKind::Move, self.host());

        let hovered = s.items.iter().rev().find(|item| item.hovered()).map(|item| item.base().hovered_cell);
        s.hovered_cell = hovered.unwrap_or_default();

        if hovered.is_some() && e.buttons.contains(MouseButtons::RIGHT) {
            s.selection_end = s.hovered_cell;
            s.dragging = true;
        } else {
            s.clear_selection_state();
        }
    }

    pub fn mouse_pressed(&self, e: &PointerEvent) {
        let mut s = self.state.lock();
        broadcast(&mut s, e, MouseEventKind::Press, self.host());
        if e.button == MouseButtons::RIGHT {
            s.selection_start = s.hovered_cell;
        } else {
            s.clear_selection_state();
        }
    }

    /// The selection survives the release so the context menu can act on it
    pub fn mouse_released(&self, e: &PointerEvent) {
        let mut s = self.state.lock();
        broadcast(&mut s, e, MouseEventKind::Release, self.host());
        s.dragging = false;
    }

    pub fn mouse_double_clicked(&self, e: &PointerEvent) {
        let mut s = self.state.lock();
        broadcast(&mut s, e, MouseEventKind::DoubleClick, self.host());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::items::kind;
    use crate::registry::ItemRegistry;
    use crate::test_support::{HostCommand, MockFrontend};
    use std::sync::Arc;

    fn layout(host: Arc<MockFrontend>) -> Layout {
        let layout = Layout::new(Arc::new(ItemRegistry::with_defaults()), host);
        // Window is twice the canvas: scale 2, no letterbox
        layout.resize(1920, 1080, 3840, 2160);
        layout
    }

    #[test]
    fn test_hover_converts_window_pixels() {
        let layout = layout(Arc::new(MockFrontend::default()));
        layout.mouse_moved(&PointerEvent::new(1000, 600, MouseButtons::NONE));
        // (500, 300) in grid pixels
        assert_eq!(layout.hovered_cell(), Cell::unit(1, 1));

        layout.mouse_moved(&PointerEvent::new(-50, 10, MouseButtons::NONE));
        assert_eq!(layout.hovered_cell(), Cell::default());
    }

    #[test]
    fn test_selection_is_normalized() {
        let layout = layout(Arc::new(MockFrontend::default()));
        // Drag from the bottom-right unit cell towards the top-left
        layout.mouse_moved(&PointerEvent::new(3000, 1800, MouseButtons::NONE));
        layout.mouse_pressed(&PointerEvent::new(3000, 1800, MouseButtons::RIGHT).with_button(MouseButtons::RIGHT));
        layout.mouse_moved(&PointerEvent::new(1000, 600, MouseButtons::RIGHT));
        assert_eq!(layout.selection(), Some(Cell::new(1, 1, 3, 3)));

        layout.mouse_released(&PointerEvent::new(1000, 600, MouseButtons::NONE).with_button(MouseButtons::RIGHT));
        assert_eq!(layout.selection(), None);
        // Opening the menu revives the selection
        layout.context_menu();
        assert_eq!(layout.selection(), Some(Cell::new(1, 1, 3, 3)));
    }

    #[test]
    fn test_left_press_clears_selection() {
        let layout = layout(Arc::new(MockFrontend::default()));
        layout.set_selection(Cell::unit(0, 0), Cell::unit(2, 2));
        layout.mouse_pressed(&PointerEvent::new(10, 10, MouseButtons::LEFT).with_button(MouseButtons::LEFT));
        assert_eq!(layout.selection(), None);
    }

    #[test]
    fn test_moving_without_right_button_drops_selection() {
        let layout = layout(Arc::new(MockFrontend::default()));
        layout.mouse_moved(&PointerEvent::new(10, 10, MouseButtons::NONE));
        layout.mouse_pressed(&PointerEvent::new(10, 10, MouseButtons::RIGHT).with_button(MouseButtons::RIGHT));
        layout.mouse_moved(&PointerEvent::new(1000, 10, MouseButtons::RIGHT));
        assert!(layout.selection().is_some());
        layout.mouse_moved(&PointerEvent::new(1000, 10, MouseButtons::NONE));
        assert_eq!(layout.selection(), None);
    }

    #[test]
    fn test_click_reaches_scene_item() {
        let host = Arc::new(MockFrontend::with_scenes(&["Intro", "Main"]));
        let layout = layout(host.clone());
        let widget = layout.new_item_widget(kind::SCENE).unwrap().map(|w| match w {
            crate::items::ConfigWidget::Scene(mut o) => {
                o.selected = Some("Main".into());
                crate::items::ConfigWidget::Scene(o)
            }
            other => other,
        });
        layout.add_widget_at(kind::SCENE, Cell::unit(0, 0), widget.as_ref()).unwrap();

        layout.mouse_moved(&PointerEvent::new(100, 100, MouseButtons::NONE));
        layout.mouse_pressed(&PointerEvent::new(100, 100, MouseButtons::LEFT).with_button(MouseButtons::LEFT));
        assert_eq!(host.commands(), vec![HostCommand::SetProgram("Main".into())]);
    }
}
