// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render helper: encodes the backdrop scene (or a plain clear) and draws egui on top.

use anyhow::{bail, Result};
use egui_wgpu::wgpu;
use folio_core::{RenderConfig, SceneHost};

use crate::{scene_gpu::GpuScene, viewport::Viewport};

/// Shown behind the pages when no scene is mounted.
const BACKDROP: wgpu::Color = wgpu::Color {
    r: 0.035,
    g: 0.04,
    b: 0.07,
    a: 1.0,
};

pub fn render_frame(
    vp: &mut Viewport,
    scene: Option<&SceneHost<GpuScene>>,
    cfg: &RenderConfig,
    paint_jobs: &[egui::epaint::ClippedPrimitive],
    textures_delta: egui::TexturesDelta,
    screen_desc: &egui_wgpu::ScreenDescriptor,
) -> Result<()> {
    let gpu = &mut vp.gpu;

    let frame = match gpu.surface.get_current_texture() {
        Ok(f) => f,
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            gpu.resize(vp.window.inner_size());
            match gpu.surface.get_current_texture() {
                Ok(f) => f,
                Err(_) => return Ok(()),
            }
        }
        Err(wgpu::SurfaceError::OutOfMemory) => bail!("surface out of memory"),
        Err(_) => return Ok(()),
    };
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("main-encoder"),
        });

    let drawn = scene.is_some_and(|host| {
        host.backend()
            .encode(host, cfg, gpu.aspect(), &mut encoder, &view)
    });
    if !drawn {
        let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(BACKDROP),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
    }
    let cmd_main = encoder.finish();

    let egui_renderer = &mut vp.egui_renderer;
    let cmd_ui = {
        let mut egui_encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui-encoder"),
            });

        for (id, delta) in &textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, *id, delta);
        }
        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut egui_encoder,
            paint_jobs,
            screen_desc,
        );
        {
            let rpass = egui_encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            let mut rpass = rpass.forget_lifetime();
            egui_renderer.render(&mut rpass, paint_jobs, screen_desc);
        }
        for id in &textures_delta.free {
            egui_renderer.free_texture(id);
        }

        egui_encoder.finish()
    };

    gpu.queue.submit([cmd_main, cmd_ui]);
    frame.present();
    Ok(())
}
