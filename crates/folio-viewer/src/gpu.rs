// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Surface, device and presentation setup for the viewer window.

use anyhow::{anyhow, Result};
use egui_wgpu::wgpu;
use egui_winit::winit::dpi::PhysicalSize;
use egui_winit::winit::window::Window;
use tracing::info;

/// Device, queue and the configured window surface.
pub struct Gpu {
    pub surface: wgpu::Surface<'static>,
    /// Kept for format capability queries and adapter naming in the scene.
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub max_tex: u32,
    present_modes: Vec<wgpu::PresentMode>,
}

/// Fifo when `vsync`, else the first tear-allowed mode the surface offers.
fn present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }
    available
        .iter()
        .copied()
        .find(|m| {
            matches!(
                m,
                wgpu::PresentMode::Immediate | wgpu::PresentMode::AutoNoVsync
            )
        })
        .unwrap_or(wgpu::PresentMode::Fifo)
}

impl Gpu {
    /// Configure `window` for presenting.
    pub async fn new(window: &'static Window, vsync: bool) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("no GPU adapter: {e}"))?;
        let limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("folio-viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(limits.clone()),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let max_tex = limits.max_texture_dimension_2d;
        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.clamp(1, max_tex),
            height: size.height.clamp(1, max_tex),
            present_mode: present_mode(&caps.present_modes, vsync),
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        info!(
            adapter = %adapter.get_info().name,
            ?format,
            mode = ?config.present_mode,
            "surface configured"
        );

        Ok(Self {
            surface,
            adapter,
            device,
            queue,
            config,
            max_tex,
            present_modes: caps.present_modes,
        })
    }

    /// Reconfigure for a new window size; false while minimized.
    pub fn resize(&mut self, size: PhysicalSize<u32>) -> bool {
        if size.width == 0 || size.height == 0 {
            return false;
        }
        self.config.width = size.width.min(self.max_tex);
        self.config.height = size.height.min(self.max_tex);
        self.surface.configure(&self.device, &self.config);
        true
    }

    /// Switch the present mode from the control panel.
    pub fn set_vsync(&mut self, vsync: bool) {
        let mode = present_mode(&self.present_modes, vsync);
        if self.config.present_mode != mode {
            self.config.present_mode = mode;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_always_uses_fifo() {
        let modes = [wgpu::PresentMode::Immediate, wgpu::PresentMode::Fifo];
        assert_eq!(present_mode(&modes, true), wgpu::PresentMode::Fifo);
        assert_eq!(present_mode(&modes, false), wgpu::PresentMode::Immediate);
        assert_eq!(
            present_mode(&[wgpu::PresentMode::Fifo], false),
            wgpu::PresentMode::Fifo
        );
    }
}
