// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for Folio front ends (documents, settings,
//! banners, background music).
//! Keeps UI/runtime adapters thin and framework-agnostic.

pub mod audio;
pub mod banner;
pub mod document;
pub mod redraw_port;
pub mod settings;
