// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Winit-backed RedrawPort implementation for the viewer.

use egui_winit::winit::window::Window;
use folio_app_core::redraw_port::RedrawPort;

#[derive(Clone)]
pub struct WinitRedrawPort {
    win: &'static Window,
}

impl WinitRedrawPort {
    pub fn new(win: &'static Window) -> Self {
        Self { win }
    }
}

impl RedrawPort for WinitRedrawPort {
    fn request_redraw(&self) {
        self.win.request_redraw();
    }
}
