// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! folio-viewer: native portfolio viewer.
//!
//! `folio-viewer [CONTENT_DIR]` shows the portfolio pages in a window over the
//! animated backdrop. Settings come from `viewer.json` in the user config
//! directory.

use anyhow::Result;
use egui_winit::winit::event_loop::EventLoop;
use tracing::info;

mod app;
mod app_events;
mod app_frame;
mod assets;
mod camera;
mod gpu;
mod input;
mod mesh;
mod music;
mod render;
mod render_port;
mod scene_gpu;
mod ui;
mod ui_effects;
mod ui_state;
mod viewport;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .init();
    info!(version = env!("CARGO_PKG_VERSION"), "folio viewer starting");
    let mut app = app::App::new();
    EventLoop::new()?.run_app(&mut app)?;
    info!("folio viewer closed");
    Ok(())
}
