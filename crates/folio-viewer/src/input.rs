// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Input handling: map winit events into UI events.

use egui_winit::winit::{
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::ui_state::UiEvent;

#[derive(Default)]
pub struct InputOutcome {
    pub ui_event: Option<UiEvent>,
    pub resized: Option<PhysicalSize<u32>>,
}

/// `egui_wants_keys` is true while a text field or similar has keyboard focus;
/// page shortcuts are suppressed then.
pub fn handle_window_event(event: &WindowEvent, egui_wants_keys: bool) -> InputOutcome {
    let mut out = InputOutcome::default();
    match event {
        WindowEvent::Resized(size) => out.resized = Some(*size),
        WindowEvent::KeyboardInput { event, .. } => {
            if event.state == ElementState::Pressed && !event.repeat && !egui_wants_keys {
                if let PhysicalKey::Code(code) = event.physical_key {
                    out.ui_event = key_event(code);
                }
            }
        }
        WindowEvent::CloseRequested => out.ui_event = Some(UiEvent::ExitClicked),
        _ => {}
    }
    out
}

/// Shortcut table: 1-5 jump to pages, Escape backs out, F2 toggles the
/// controls, M toggles the music.
pub fn key_event(code: KeyCode) -> Option<UiEvent> {
    let page = match code {
        KeyCode::Digit1 | KeyCode::Numpad1 => 0,
        KeyCode::Digit2 | KeyCode::Numpad2 => 1,
        KeyCode::Digit3 | KeyCode::Numpad3 => 2,
        KeyCode::Digit4 | KeyCode::Numpad4 => 3,
        KeyCode::Digit5 | KeyCode::Numpad5 => 4,
        KeyCode::Escape => return Some(UiEvent::Escape),
        KeyCode::F2 => return Some(UiEvent::ToggleControls),
        KeyCode::KeyM => return Some(UiEvent::ToggleMusic),
        _ => return None,
    };
    Some(UiEvent::Navigate(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_map_to_page_indices() {
        assert_eq!(key_event(KeyCode::Digit1), Some(UiEvent::Navigate(0)));
        assert_eq!(key_event(KeyCode::Numpad4), Some(UiEvent::Navigate(3)));
        assert_eq!(key_event(KeyCode::Digit5), Some(UiEvent::Navigate(4)));
        assert_eq!(key_event(KeyCode::Digit6), None);
    }

    #[test]
    fn escape_f2_and_music() {
        assert_eq!(key_event(KeyCode::Escape), Some(UiEvent::Escape));
        assert_eq!(key_event(KeyCode::F2), Some(UiEvent::ToggleControls));
        assert_eq!(key_event(KeyCode::KeyM), Some(UiEvent::ToggleMusic));
        assert_eq!(key_event(KeyCode::KeyW), None);
    }

    #[test]
    fn resize_and_close_are_reported() {
        let out = handle_window_event(&WindowEvent::Resized(PhysicalSize::new(640, 480)), false);
        assert_eq!(out.resized, Some(PhysicalSize::new(640, 480)));
        assert!(out.ui_event.is_none());
        let out = handle_window_event(&WindowEvent::CloseRequested, false);
        assert_eq!(out.ui_event, Some(UiEvent::ExitClicked));
    }
}
