// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stateless egui render helpers for the pages, banners and the render controls.

use std::time::Duration;

use egui::{self, Color32, Context, RichText, Ui};
use folio_app_core::banner::{BannerKind, BannerRender};
use folio_core::{
    content::{ImageFit, SkillLevel},
    render_config::{ShadowType, SHADOW_MAP_SIZES, SKYBOX_OPTIONS, WATER_REFLECTION_SIZES},
    views::{stat_tiles, ImageSource, IMAGE_UNAVAILABLE},
    Page, RenderUpdate, Rgb,
};

use crate::{
    app::App,
    ui_state::{Overlay, UiEvent},
};

/// Resting top margin of a page; the transition offset moves around it.
const PAGE_TOP: f32 = 28.0;
const ACCENT: Color32 = Color32::from_rgb(0x00, 0xd4, 0xff);
const CARD_THUMB: egui::Vec2 = egui::vec2(240.0, 135.0);
const SLIDE: egui::Vec2 = egui::vec2(560.0, 315.0);

fn color(c: Rgb) -> Color32 {
    Color32::from_rgb(c.0[0], c.0[1], c.0[2])
}

pub fn draw(ctx: &Context, app: &mut App, banners: &[BannerRender], now: Duration) {
    draw_nav(ctx, app);

    let (mounted, visual) = app.session.view(now);
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.inner_margin(egui::Margin::symmetric(32, 0)))
        .show(ctx, |ui| {
            ui.multiply_opacity(visual.opacity);
            ui.add_space(PAGE_TOP + visual.offset_y);
            if mounted != Page::Home && ui.button("◀ Back").clicked() {
                app.apply_ui_event(UiEvent::Back);
            }
            match mounted {
                Page::Home => draw_home(ui, app),
                Page::About => draw_about(ui, app, now),
                Page::Experience => draw_experience(ui, app),
                Page::Projects => draw_projects(ui, app),
                Page::Skills => draw_skills(ui, app),
            }
        });

    draw_banners(ctx, app, banners);
    if app.ui.overlay == Overlay::Controls {
        draw_controls(ctx, app);
    }
}

fn draw_nav(ctx: &Context, app: &mut App) {
    egui::TopBottomPanel::top("nav").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new("FOLIO").strong().color(ACCENT));
            ui.separator();
            for page in Page::ALL {
                let label = format!("{} {}", page.index() + 1, page.title());
                if ui
                    .selectable_label(app.ui.page == page, label)
                    .clicked()
                {
                    app.apply_ui_event(UiEvent::Navigate(page.index()));
                }
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Exit").clicked() {
                    app.apply_ui_event(UiEvent::ExitClicked);
                }
                if app.music.available()
                    && ui
                        .selectable_label(app.music.is_playing(), "Music (M)")
                        .clicked()
                {
                    app.apply_ui_event(UiEvent::ToggleMusic);
                }
                if app.scene.is_some() {
                    let open = app.ui.overlay == Overlay::Controls;
                    if ui.selectable_label(open, "Controls (F2)").clicked() {
                        app.apply_ui_event(UiEvent::ToggleControls);
                    }
                }
            });
        });
    });
}

fn draw_home(ui: &mut Ui, app: &mut App) {
    ui.vertical_centered(|ui| {
        ui.add_space(60.0);
        let profile = &app.pages.about.profile;
        let name = if profile.name.is_empty() {
            "Portfolio"
        } else {
            profile.name.as_str()
        };
        ui.heading(RichText::new(name).size(42.0).strong());
        if !profile.title.is_empty() {
            ui.label(RichText::new(&profile.title).size(18.0).color(ACCENT));
        }
        ui.add_space(36.0);
        if !app.session.menu_ready() {
            ui.spinner();
            ui.label("Loading scene...");
            return;
        }
        let entries = [
            ("Projects", Page::Projects),
            ("Experiences", Page::Experience),
            ("Skills", Page::Skills),
            ("About", Page::About),
        ];
        for (label, page) in entries {
            let button = egui::Button::new(RichText::new(label).size(22.0))
                .min_size(egui::vec2(220.0, 40.0));
            if ui.add(button).clicked() {
                app.apply_ui_event(UiEvent::Navigate(page.index()));
            }
            ui.add_space(6.0);
        }
        ui.add_space(18.0);
        ui.label(RichText::new("Press 1-5 to jump, Esc to go back").weak());
    });
}

/// Draw `src` into a `size` box, or the unavailable placeholder when it has no
/// URI or its load failed.
fn image(ui: &mut Ui, src: &ImageSource, size: egui::Vec2, fit: ImageFit) {
    let loaded = match src {
        ImageSource::Uri(uri) => ui
            .ctx()
            .try_load_texture(
                uri,
                egui::TextureOptions::LINEAR,
                egui::load::SizeHint::default(),
            )
            .is_ok()
            .then_some(uri),
        ImageSource::Unavailable => None,
    };
    let Some(uri) = loaded else {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.add_sized(size - egui::vec2(12.0, 12.0), egui::Label::new(IMAGE_UNAVAILABLE));
        });
        return;
    };
    let img = egui::Image::new(uri.as_str());
    let img = match fit {
        ImageFit::Cover => img.fit_to_exact_size(size).maintain_aspect_ratio(false),
        ImageFit::Contain => img.max_size(size),
    };
    ui.add(img);
}

fn draw_about(ui: &mut Ui, app: &mut App, now: Duration) {
    let mut copy = None;
    egui::ScrollArea::vertical().show(ui, |ui| {
        let about = &app.pages.about;
        let p = &about.profile;
        ui.horizontal(|ui| {
            image(ui, &app.pages.avatar, egui::vec2(128.0, 128.0), ImageFit::Cover);
            ui.vertical(|ui| {
                ui.heading(RichText::new(&p.name).size(30.0).strong());
                ui.label(RichText::new(&p.title).color(ACCENT));
                if !p.tagline.is_empty() {
                    ui.label(RichText::new(&p.tagline).italics());
                }
                if !p.location.is_empty() {
                    ui.label(format!("📍 {}", p.location));
                }
                if p.available {
                    ui.label(RichText::new("● Available for work").color(Color32::LIGHT_GREEN));
                }
            });
        });
        ui.add_space(12.0);
        ui.label(&p.bio);
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            for (value, label) in stat_tiles(about) {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new(value).size(24.0).strong().color(ACCENT));
                        ui.label(label);
                    });
                });
            }
        });
        ui.add_space(12.0);

        let c = &about.contact;
        ui.heading("Contact");
        if !c.email.is_empty() {
            ui.horizontal(|ui| {
                ui.label(format!("✉ {}", c.email));
                if ui.button("Copy").clicked() {
                    copy = Some(c.email.clone());
                }
                if app.pages.copy_feedback.showing(now) {
                    ui.label(RichText::new("Copied!").color(Color32::LIGHT_GREEN));
                }
            });
        }
        if !c.phone.is_empty() {
            ui.label(format!("☎ {}", c.phone));
        }
        if !c.website.is_empty() {
            ui.hyperlink(&c.website);
        }
        if !about.social.is_empty() {
            ui.add_space(8.0);
            ui.horizontal_wrapped(|ui| {
                for link in &about.social {
                    ui.hyperlink_to(&link.platform, &link.url);
                }
            });
        }
    });
    if let Some(email) = copy {
        app.apply_ui_event(UiEvent::CopyEmail(email));
    }
}

fn draw_experience(ui: &mut Ui, app: &App) {
    ui.heading("Experience");
    ui.add_space(8.0);
    let list = &app.pages.experience;
    if let Some(placeholder) = list.placeholder {
        ui.label(RichText::new(placeholder).weak());
        return;
    }
    egui::ScrollArea::vertical().show(ui, |ui| {
        for item in &list.items {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&item.title).size(18.0).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(RichText::new(&item.period).weak());
                    });
                });
                ui.label(RichText::new(&item.organization).color(ACCENT));
                if !item.subtitle.is_empty() {
                    ui.label(RichText::new(&item.subtitle).weak());
                }
                for point in &item.points {
                    ui.label(format!("• {point}"));
                }
                for achievement in &item.achievements {
                    ui.label(RichText::new(format!("★ {achievement}")).color(Color32::GOLD));
                }
            });
            ui.add_space(8.0);
        }
    });
}

fn draw_projects(ui: &mut Ui, app: &mut App) {
    let mut event = None;
    if let Some((_, detail)) = app.pages.detail.as_mut() {
        let project = &detail.project;
        ui.horizontal(|ui| {
            ui.heading(&project.title);
            ui.label(RichText::new(project.status.label()).weak());
            if ui.button("Close").clicked() {
                event = Some(UiEvent::CloseProject);
            }
        });
        ui.label(RichText::new(format!("{:?}", project.kind)).color(color(project.kind.color())));
        egui::ScrollArea::vertical().show(ui, |ui| {
            if let Some(src) = detail.current_image() {
                image(ui, src, SLIDE, detail.project.images_fit);
            }
            if detail.slides.len() > 1 {
                ui.horizontal(|ui| {
                    if ui.button("◀").clicked() {
                        detail.slides.prev_slide();
                    }
                    let at = detail.slides.current().map_or(0, |i| i + 1);
                    ui.label(format!("{at} / {}", detail.slides.len()));
                    if ui.button("▶").clicked() {
                        detail.slides.next_slide();
                    }
                });
            }
            let project = &detail.project;
            ui.add_space(8.0);
            ui.label(if project.long_description.is_empty() {
                &project.description
            } else {
                &project.long_description
            });
            if !project.features.is_empty() {
                ui.add_space(8.0);
                ui.strong("Features");
                for feature in &project.features {
                    ui.label(format!("• {feature}"));
                }
            }
            if !project.technologies.is_empty() {
                ui.add_space(8.0);
                ui.horizontal_wrapped(|ui| {
                    for tech in &project.technologies {
                        ui.label(RichText::new(tech).monospace().color(ACCENT));
                    }
                });
            }
            ui.horizontal(|ui| {
                if let Some(url) = &project.github_url {
                    ui.hyperlink_to("Source", url);
                }
                if let Some(url) = &project.live_url {
                    ui.hyperlink_to("Live", url);
                }
            });
        });
    } else {
        ui.heading("Projects");
        ui.add_space(8.0);
        let list = &app.pages.project_list;
        if let Some(placeholder) = list.placeholder {
            ui.label(RichText::new(placeholder).weak());
            return;
        }
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                for (i, card) in list.cards.iter().enumerate() {
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.set_width(CARD_THUMB.x);
                        ui.vertical(|ui| {
                            image(ui, &card.thumbnail, CARD_THUMB, card.fit);
                            ui.label(RichText::new(&card.title).strong());
                            ui.horizontal(|ui| {
                                ui.label(
                                    RichText::new(format!("{:?}", card.kind))
                                        .color(color(card.kind.color())),
                                );
                                ui.label(RichText::new(card.status.label()).weak());
                            });
                            ui.label(&card.description);
                            if ui.button("View").clicked() {
                                event = Some(UiEvent::OpenProject(i));
                            }
                        });
                    });
                }
            });
        });
    }
    if let Some(ev) = event {
        app.apply_ui_event(ev);
    }
}

fn draw_skills(ui: &mut Ui, app: &mut App) {
    ui.heading("Skills");
    ui.horizontal(|ui| {
        for level in SkillLevel::ALL {
            ui.label(RichText::new("■").color(color(level.color())));
            ui.label(level.name());
            ui.add_space(8.0);
        }
    });
    ui.add_space(8.0);
    let tree = &mut app.pages.skills;
    let mut toggle = None;
    egui::ScrollArea::vertical().show(ui, |ui| {
        for row in tree.rows() {
            ui.horizontal(|ui| {
                ui.add_space(row.depth as f32 * 18.0);
                if row.has_children {
                    let arrow = if row.expanded { "▾" } else { "▸" };
                    if ui.small_button(arrow).clicked() {
                        toggle = Some(row.path.clone());
                    }
                }
                let text = RichText::new(&row.name).color(color(row.level.color()));
                let response = ui.label(if row.depth == 0 { text.strong() } else { text });
                if let Some(node) = tree.node(&row.path) {
                    let mut hover = node.description().unwrap_or_default().to_string();
                    if let Some(years) = node.years() {
                        hover = format!("{hover}\n{years} years · {}", row.level.name());
                    }
                    if !hover.trim().is_empty() {
                        response.on_hover_text(hover.trim());
                    }
                }
            });
        }
    });
    if let Some(path) = toggle {
        tree.toggle(&path);
    }
}

fn draw_banners(ctx: &Context, app: &mut App, banners: &[BannerRender]) {
    if banners.is_empty() {
        return;
    }
    let mut dismissed = Vec::new();
    egui::Area::new("banners".into())
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
        .show(ctx, |ui| {
            for b in banners {
                let fill = match b.kind {
                    BannerKind::Info => Color32::from_rgb(0x1d, 0x3b, 0x53),
                    BannerKind::Warn => Color32::from_rgb(0x5a, 0x44, 0x10),
                    BannerKind::Error => Color32::from_rgb(0x5c, 0x1a, 0x1a),
                };
                ui.scope(|ui| {
                    ui.multiply_opacity(b.opacity);
                    egui::Frame::popup(ui.style()).fill(fill).show(ui, |ui| {
                        ui.set_max_width(320.0);
                        ui.horizontal(|ui| {
                            ui.strong(&b.title);
                            if ui.small_button("✕").clicked() {
                                dismissed.push(b.id);
                            }
                        });
                        if let Some(body) = &b.body {
                            ui.label(body);
                        }
                    });
                });
                ui.add_space(6.0);
            }
        });
    for id in dismissed {
        app.banners.dismiss(id);
    }
}

fn slider(
    ui: &mut Ui,
    label: &str,
    value: f32,
    range: std::ops::RangeInclusive<f32>,
    make: fn(f32) -> RenderUpdate,
    out: &mut Vec<RenderUpdate>,
) {
    let mut v = value;
    if ui.add(egui::Slider::new(&mut v, range).text(label)).changed() {
        out.push(make(v));
    }
}

fn checkbox(
    ui: &mut Ui,
    label: &str,
    value: bool,
    make: fn(bool) -> RenderUpdate,
    out: &mut Vec<RenderUpdate>,
) {
    let mut v = value;
    if ui.checkbox(&mut v, label).changed() {
        out.push(make(v));
    }
}

fn swatch(
    ui: &mut Ui,
    label: &str,
    value: Rgb,
    make: fn(Rgb) -> RenderUpdate,
    out: &mut Vec<RenderUpdate>,
) {
    ui.horizontal(|ui| {
        let mut rgb = value.0;
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            out.push(make(Rgb(rgb)));
        }
        ui.label(label);
    });
}

fn size_combo(
    ui: &mut Ui,
    label: &str,
    value: u32,
    options: &[u32],
    make: fn(u32) -> RenderUpdate,
    out: &mut Vec<RenderUpdate>,
) {
    let mut selected = value;
    egui::ComboBox::from_label(label)
        .selected_text(value.to_string())
        .show_ui(ui, |ui| {
            for &size in options {
                ui.selectable_value(&mut selected, size, size.to_string());
            }
        });
    if selected != value {
        out.push(make(selected));
    }
}

fn draw_controls(ctx: &Context, app: &mut App) {
    let cfg = app.session.render().clone();
    let mut updates = Vec::new();
    let mut open = true;
    egui::Window::new("Render controls")
        .open(&mut open)
        .default_width(320.0)
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-16.0, 48.0))
        .show(ctx, |ui| {
            ui.label(format!(
                "Quality tier {} · {}",
                app.session.degradation_level().0,
                if cfg.scene_loaded { "scene ready" } else { "loading" }
            ));
            egui::CollapsingHeader::new("Lighting")
                .default_open(true)
                .show(ui, |ui| {
                    slider(
                        ui,
                        "Ambient",
                        cfg.ambient_light_intensity,
                        0.0..=2.0,
                        RenderUpdate::AmbientLightIntensity,
                        &mut updates,
                    );
                    slider(
                        ui,
                        "Sun intensity",
                        cfg.directional_light_intensity,
                        0.0..=2.0,
                        RenderUpdate::DirectionalLightIntensity,
                        &mut updates,
                    );
                    swatch(ui, "Sun colour", cfg.sun_color, RenderUpdate::SunColor, &mut updates);
                    slider(
                        ui,
                        "Azimuth",
                        cfg.sun_azimuth,
                        0.0..=360.0,
                        RenderUpdate::SunAzimuth,
                        &mut updates,
                    );
                    slider(
                        ui,
                        "Elevation",
                        cfg.sun_elevation,
                        0.0..=90.0,
                        RenderUpdate::SunElevation,
                        &mut updates,
                    );
                });
            egui::CollapsingHeader::new("Shadow").show(ui, |ui| {
                let mut kind = cfg.shadow_type;
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut kind, ShadowType::Basic, "Basic");
                    ui.selectable_value(&mut kind, ShadowType::Soft, "Soft");
                });
                if kind != cfg.shadow_type {
                    updates.push(RenderUpdate::ShadowType(kind));
                }
                size_combo(
                    ui,
                    "Shadow map",
                    cfg.shadow_map_size,
                    &SHADOW_MAP_SIZES,
                    RenderUpdate::ShadowMapSize,
                    &mut updates,
                );
            });
            egui::CollapsingHeader::new("Water").show(ui, |ui| {
                size_combo(
                    ui,
                    "Reflection",
                    cfg.water_reflection_size,
                    &WATER_REFLECTION_SIZES,
                    RenderUpdate::WaterReflectionSize,
                    &mut updates,
                );
                swatch(ui, "Water colour", cfg.water_color, RenderUpdate::WaterColor, &mut updates);
                checkbox(
                    ui,
                    "Water fog",
                    cfg.water_fog_enabled,
                    RenderUpdate::WaterFogEnabled,
                    &mut updates,
                );
            });
            egui::CollapsingHeader::new("Post-processing").show(ui, |ui| {
                checkbox(
                    ui,
                    "Vignette",
                    cfg.vignette_enabled,
                    RenderUpdate::VignetteEnabled,
                    &mut updates,
                );
                slider(
                    ui,
                    "Offset",
                    cfg.vignette_offset,
                    0.0..=1.0,
                    RenderUpdate::VignetteOffset,
                    &mut updates,
                );
                slider(
                    ui,
                    "Darkness",
                    cfg.vignette_darkness,
                    0.0..=1.0,
                    RenderUpdate::VignetteDarkness,
                    &mut updates,
                );
                ui.separator();
                checkbox(
                    ui,
                    "Depth of field",
                    cfg.depth_of_field_enabled,
                    RenderUpdate::DepthOfFieldEnabled,
                    &mut updates,
                );
                slider(
                    ui,
                    "Focal length",
                    cfg.dof_focal_length,
                    1.0..=100.0,
                    RenderUpdate::DofFocalLength,
                    &mut updates,
                );
                slider(
                    ui,
                    "Bokeh",
                    cfg.dof_bokeh_scale,
                    0.0..=10.0,
                    RenderUpdate::DofBokehScale,
                    &mut updates,
                );
                ui.separator();
                checkbox(
                    ui,
                    "Chromatic aberration",
                    cfg.chromatic_aberration_enabled,
                    RenderUpdate::ChromaticAberrationEnabled,
                    &mut updates,
                );
                slider(
                    ui,
                    "Offset X",
                    cfg.chromatic_aberration_offset[0],
                    0.0..=0.01,
                    RenderUpdate::ChromaticAberrationOffsetX,
                    &mut updates,
                );
                slider(
                    ui,
                    "Offset Y",
                    cfg.chromatic_aberration_offset[1],
                    0.0..=0.01,
                    RenderUpdate::ChromaticAberrationOffsetY,
                    &mut updates,
                );
            });
            egui::CollapsingHeader::new("Environment").show(ui, |ui| {
                checkbox(ui, "Fog", cfg.fog_enabled, RenderUpdate::FogEnabled, &mut updates);
                let current = SKYBOX_OPTIONS
                    .iter()
                    .find(|o| o.file == cfg.skybox)
                    .map_or(cfg.skybox.as_str(), |o| o.label);
                egui::ComboBox::from_label("Skybox")
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for option in &SKYBOX_OPTIONS {
                            let on = option.file == cfg.skybox;
                            if ui.selectable_label(on, option.label).clicked() && !on {
                                updates.push(RenderUpdate::Skybox(option.file.to_string()));
                            }
                        }
                    });
                checkbox(
                    ui,
                    "Auto-rotate",
                    cfg.auto_rotate,
                    RenderUpdate::AutoRotate,
                    &mut updates,
                );
                slider(
                    ui,
                    "Rotate speed",
                    cfg.auto_rotate_speed,
                    0.0..=10.0,
                    RenderUpdate::AutoRotateSpeed,
                    &mut updates,
                );
                let mut vsync = app.settings.vsync;
                if ui.checkbox(&mut vsync, "VSync").changed() {
                    app.settings.vsync = vsync;
                    if let Some(vp) = app.viewport.as_mut() {
                        vp.gpu.set_vsync(vsync);
                    }
                }
            });
        });
    for update in updates {
        app.session.update_render(update);
    }
    if !open {
        app.apply_ui_event(UiEvent::CloseOverlay);
    }
}
