// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port trait for UI layers to ask for another frame without depending on a
//! specific windowing crate.

/// Minimal redraw port; implementations forward to the window's `request_redraw`.
///
/// The portfolio animates continuously while the scene is mounted, but static
/// pages (constrained devices, failed scene) only need frames while a page
/// transition or banner fade is running.
pub trait RedrawPort {
    /// Request a redraw of the main surface/window.
    fn request_redraw(&self);
}
