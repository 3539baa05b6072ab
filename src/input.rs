use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const MIDDLE: Self = Self(1);
    pub const RIGHT: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Pointer event in client pixels, origin at the container's top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub client: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,
}

impl PointerEvent {
    pub fn moved(x: f32, y: f32) -> Self {
        Self {
            client: Vec2::new(x, y),
            button: None,
        }
    }

    pub fn button(x: f32, y: f32, button: MouseButton) -> Self {
        Self {
            client: Vec2::new(x, y),
            button: Some(button),
        }
    }
}

/// Converts client pixels into normalized device coordinates: x grows to the
/// right, y grows upward, both spanning [-1, 1] across the container.
pub fn pointer_to_ndc(client: Vec2, (width, height): (u32, u32)) -> Vec2 {
    let width = width.max(1) as f32;
    let height = height.max(1) as f32;
    Vec2::new(client.x / width * 2.0 - 1.0, -(client.y / height) * 2.0 + 1.0)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn mouse_button_from_winit(button: winit::event::MouseButton) -> MouseButton {
    use winit::event::MouseButton as WinitMouseButton;
    let index = match button {
        WinitMouseButton::Left => 0,
        WinitMouseButton::Middle => 1,
        WinitMouseButton::Right => 2,
        WinitMouseButton::Back => 3,
        WinitMouseButton::Forward => 4,
        WinitMouseButton::Other(value) => value.min(u8::MAX as u16) as u8,
    };
    MouseButton::new(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_maps_to_origin() {
        assert_eq!(pointer_to_ndc(Vec2::new(400.0, 300.0), (800, 600)), Vec2::ZERO);
    }

    #[test]
    fn corners_map_to_unit_square() {
        let size = (800, 600);
        assert_eq!(pointer_to_ndc(Vec2::ZERO, size), Vec2::new(-1.0, 1.0));
        assert_eq!(
            pointer_to_ndc(Vec2::new(800.0, 600.0), size),
            Vec2::new(1.0, -1.0)
        );
    }

    #[test]
    fn zero_sized_container_does_not_divide_by_zero() {
        let ndc = pointer_to_ndc(Vec2::new(0.5, 0.5), (0, 0));
        assert!(ndc.is_finite());
    }

    #[test]
    fn button_events_carry_their_button() {
        let event = PointerEvent::button(1.0, 2.0, MouseButton::RIGHT);
        assert_eq!(event.button.map(MouseButton::index), Some(2));
        assert_eq!(PointerEvent::moved(1.0, 2.0).button, None);
    }
}
