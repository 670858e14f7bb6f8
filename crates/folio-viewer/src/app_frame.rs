// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-frame tick for the App.

use anyhow::{anyhow, Result};
use folio_app_core::{banner::BannerKind, redraw_port::RedrawPort};
use folio_core::nav::TransitionPhase;
use tracing::{debug, error};

use crate::{app::App, render, ui};

impl App {
    pub fn frame(&mut self) -> Result<()> {
        let now = self.now();
        let (win, raw_input) = {
            let vp = self
                .viewport
                .as_mut()
                .ok_or_else(|| anyhow!("no viewport"))?;
            let raw = vp.egui_state.take_egui_input(vp.window);
            (vp.window, raw)
        };

        let report = self.session.frame(now, self.scene.as_mut());
        if report.ready_fired {
            debug!("scene ready; revealing menu");
        }
        if let Some(notice) = &report.notice {
            self.banners.push_notice(notice, now);
        }
        for fallback in &report.fallbacks {
            self.banners.push_fallback(fallback, now);
        }
        if let Some(err) = &report.scene_error {
            error!(%err, "scene failed; continuing without backdrop");
            self.banners
                .push(BannerKind::Error, "3D scene stopped", err.to_string(), now);
            if let Some(mut host) = self.scene.take() {
                host.detach();
            }
        }

        self.banners.retain_visible(now);
        let banners = self.banners.visible(now);

        let egui_ctx = self.egui_ctx.clone();
        let full_output = egui_ctx.run(raw_input, |ctx| ui::draw(ctx, self, &banners, now));

        let animating = self.scene.is_some()
            || !banners.is_empty()
            || self.session.gate().phase() != TransitionPhase::Shown
            || self.pages.copy_feedback.showing(now);
        let egui_wants_repaint = full_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|v| v.repaint_delay.is_zero());

        let vp = self
            .viewport
            .as_mut()
            .ok_or_else(|| anyhow!("no viewport"))?;
        vp.egui_state
            .handle_platform_output(win, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_desc = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [vp.gpu.config.width, vp.gpu.config.height],
            pixels_per_point: win.scale_factor() as f32,
        };

        render::render_frame(
            vp,
            self.scene.as_ref(),
            self.session.render(),
            &paint_jobs,
            full_output.textures_delta,
            &screen_desc,
        )?;

        if animating || egui_wants_repaint {
            vp.redraw.request_redraw();
        }
        Ok(())
    }
}
