// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Window-event handling for the App.

use egui_winit::winit::{event::WindowEvent, window::WindowId};

use crate::{app::App, input};

impl App {
    pub fn handle_window_event(&mut self, window_id: WindowId, event: WindowEvent) {
        let Some(win) = self
            .viewport
            .as_ref()
            .map(|vp| vp.window)
            .filter(|w| w.id() == window_id)
        else {
            return;
        };

        let outcome = input::handle_window_event(&event, self.egui_ctx.wants_keyboard_input());
        if let (Some(size), Some(vp)) = (outcome.resized, self.viewport.as_mut()) {
            if vp.gpu.resize(size) {
                let (w, h) = (vp.gpu.config.width, vp.gpu.config.height);
                if let Some(host) = self.scene.as_mut() {
                    host.backend_mut().resize(w, h);
                }
            }
        }
        if let Some(ev) = outcome.ui_event {
            self.apply_ui_event(ev);
        }

        if let Some(vp) = self.viewport.as_mut() {
            if vp.egui_state.on_window_event(win, &event).repaint {
                win.request_redraw();
            }
        }
    }
}
