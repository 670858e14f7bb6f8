// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The portfolio window: surface, egui input state and the egui renderer.

use egui_wgpu::Renderer;
use egui_winit::winit::{event_loop::ActiveEventLoop, window::Window};
use egui_winit::State as EguiWinitState;

use crate::{gpu::Gpu, render_port::WinitRedrawPort};

pub struct Viewport {
    pub window: &'static Window,
    pub gpu: Gpu,
    pub egui_state: EguiWinitState,
    pub egui_renderer: Renderer,
    pub redraw: WinitRedrawPort,
}

impl Viewport {
    /// Attach egui to a window whose surface is already configured.
    pub fn new(
        window: &'static Window,
        gpu: Gpu,
        egui_ctx: &egui::Context,
        event_loop: &ActiveEventLoop,
    ) -> Self {
        let egui_state = EguiWinitState::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            event_loop,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.max_tex as usize),
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.config.format,
            egui_wgpu::RendererOptions::default(),
        );
        Self {
            window,
            gpu,
            egui_state,
            egui_renderer,
            redraw: WinitRedrawPort::new(window),
        }
    }
}
