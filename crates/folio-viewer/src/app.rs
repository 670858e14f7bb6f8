// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Top-level application wiring and event loop handler.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use egui_extras::install_image_loaders;
use egui_winit::winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::{Window, WindowAttributes},
};
use folio_app_core::{
    audio::BackgroundMusic,
    banner::{BannerKind, BannerQueue},
    document::DocumentService,
    settings::{ViewerSettings, SETTINGS_KEY},
};
use folio_content_fs::FsDocumentStore;
use folio_core::{
    content::{About, ContentBundle, Project},
    views::{
        AssetResolver, CopyFeedback, ExperienceList, ImageSource, ProjectDetail, ProjectList,
        SkillTree,
    },
    DeviceProbe, FolioSession, SceneHost,
};
use tracing::{error, info, warn};

use crate::{
    assets::FsAssetResolver,
    gpu::Gpu,
    music::{self, Track},
    scene_gpu::GpuScene,
    ui_effects::{self, UiEffectsRunner},
    ui_state::{self, UiState},
    viewport::Viewport,
};

const BANNER_CAPACITY: usize = 8;

/// Page view-models built once from the content documents.
pub struct Pages {
    pub about: About,
    pub avatar: ImageSource,
    pub experience: ExperienceList,
    pub project_list: ProjectList,
    pub projects: Vec<Project>,
    /// Open detail view and the list index it belongs to.
    pub detail: Option<(usize, ProjectDetail)>,
    pub skills: SkillTree,
    pub copy_feedback: CopyFeedback,
    resolver: FsAssetResolver,
}

impl Pages {
    pub fn new(content: ContentBundle, resolver: FsAssetResolver) -> Self {
        let avatar = resolver
            .resolve(&content.about.profile.avatar)
            .map_or(ImageSource::Unavailable, ImageSource::Uri);
        Self {
            avatar,
            experience: ExperienceList::new(&content.experiences),
            project_list: ProjectList::new(&content.projects, &resolver),
            projects: content.projects.projects,
            detail: None,
            skills: SkillTree::new(content.skills.skill_tree),
            copy_feedback: CopyFeedback::default(),
            about: content.about,
            resolver,
        }
    }

    /// Build or drop the detail view so it matches `open`.
    pub fn sync_detail(&mut self, open: Option<usize>) {
        let current = self.detail.as_ref().map(|(i, _)| *i);
        if current == open {
            return;
        }
        self.detail = open.and_then(|i| {
            self.projects
                .get(i)
                .map(|p| (i, ProjectDetail::new(p, &self.resolver)))
        });
    }
}

pub struct App {
    /// The window, once the event loop has resumed.
    pub viewport: Option<Viewport>,
    pub egui_ctx: egui::Context,
    pub ui_runner: ui_effects::RealEffectsRunner,
    pub ui: UiState,
    pub session: FolioSession,
    pub scene: Option<SceneHost<GpuScene>>,
    pub banners: BannerQueue,
    pub pages: Pages,
    pub music: BackgroundMusic<Track>,
    pub settings: ViewerSettings,
    pub asset_dir: PathBuf,
    origin: Instant,
    shutdown_requested: bool,
}

impl App {
    pub fn new() -> Self {
        let egui_ctx = egui::Context::default();
        install_image_loaders(&egui_ctx);
        let origin = Instant::now();
        let mut banners = BannerQueue::new(BANNER_CAPACITY);

        let settings = match FsDocumentStore::user_config() {
            Ok(store) => {
                DocumentService::new(store).load_or_default::<ViewerSettings>(SETTINGS_KEY)
            }
            Err(err) => {
                warn!(%err, "config directory unavailable; using default settings");
                banners.push(
                    BannerKind::Warn,
                    "Settings unavailable",
                    format!("Using defaults ({err})"),
                    Duration::ZERO,
                );
                ViewerSettings::default()
            }
        };

        let content_dir = content_dir(std::env::args_os().nth(1).map(PathBuf::from), &settings);
        info!(dir = %content_dir.display(), "loading content");
        let content = DocumentService::new(FsDocumentStore::rooted(&content_dir)).load_content();
        let asset_dir = settings
            .asset_dir
            .clone()
            .unwrap_or_else(|| content_dir.clone());
        let music = music::background_music(&asset_dir, &settings);

        let session = FolioSession::new(
            folio_core::RenderConfig::default(),
            settings.perf.clone(),
            Duration::ZERO,
        );

        Self {
            viewport: None,
            egui_ctx,
            ui_runner: ui_effects::RealEffectsRunner,
            ui: UiState::default(),
            session,
            scene: None,
            banners,
            pages: Pages::new(content, FsAssetResolver::new(&asset_dir)),
            music,
            settings,
            asset_dir,
            origin,
            shutdown_requested: false,
        }
    }

    /// Time since startup; every core component runs on this clock.
    pub fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    pub fn apply_ui_event(&mut self, ev: ui_state::UiEvent) {
        let now = self.now();
        let ev_clone = ev.clone();
        let (next, effects) = ui_state::reduce(&self.ui, ev);
        self.ui = next;
        self.pages.sync_detail(self.ui.open_project);
        let followups = self
            .ui_runner
            .run(effects, &mut self.session, &self.egui_ctx, now);
        match ev_clone {
            ui_state::UiEvent::ShutdownRequested => self.shutdown_requested = true,
            ui_state::UiEvent::EmailCopied => self.pages.copy_feedback.copied(now),
            ui_state::UiEvent::ToggleMusic => {
                let on = self.music.toggle();
                info!(on, "background music");
            }
            _ => {}
        }
        for ev in followups {
            self.apply_ui_event(ev);
        }
    }

    /// Classify the host, then mount the scene unless the device is constrained.
    fn mount_scene(&mut self, window: &Window, gpu: &Gpu) {
        let now = self.now();
        let width = window.inner_size().to_logical::<f32>(window.scale_factor()).width;
        let probe = native_device(&self.settings, width);
        let cap = self.session.detect_device(Some(&probe));
        info!(mobile = cap.is_mobile, "device classified");
        if !self.session.should_mount_scene() {
            return;
        }

        let built = GpuScene::new(gpu, self.asset_dir.clone(), self.settings.model.clone());
        let backend = match built {
            Ok(backend) => backend,
            Err(err) => {
                self.session.scene_unavailable(&err.to_string());
                self.banners
                    .push(BannerKind::Error, "3D scene unavailable", err.to_string(), now);
                return;
            }
        };
        let mut host = SceneHost::new(backend);
        match self.session.attach_scene(&mut host, now) {
            Ok(fallbacks) => {
                for fallback in &fallbacks {
                    self.banners.push_fallback(fallback, now);
                }
                self.scene = Some(host);
            }
            Err(err) => {
                error!(%err, "scene attach failed");
                self.banners
                    .push(BannerKind::Error, "3D scene unavailable", err.to_string(), now);
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Device facts for a desktop window: the settings override, else the window
/// width and the configured touch screen. Native hosts have no user agent.
fn native_device(settings: &ViewerSettings, logical_width: f32) -> DeviceProbe {
    settings.device.clone().unwrap_or(DeviceProbe {
        user_agent: None,
        touch: settings.touch_screen,
        viewport_width: Some(logical_width),
    })
}

/// Command-line argument, then the setting, then the bundled `content/`.
fn content_dir(arg: Option<PathBuf>, settings: &ViewerSettings) -> PathBuf {
    if let Some(dir) = arg.or_else(|| settings.content_dir.clone()) {
        return dir;
    }
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("content")));
    [Some(PathBuf::from("content")), beside_exe]
        .into_iter()
        .flatten()
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("content"))
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewport.is_some() {
            return;
        }
        let [w, h] = self.settings.window_size;
        let window = match event_loop.create_window(
            WindowAttributes::default()
                .with_title("Folio")
                .with_inner_size(LogicalSize::new(w, h))
                .with_visible(true),
        ) {
            Ok(window) => window,
            Err(err) => {
                error!(%err, "window creation failed");
                event_loop.exit();
                return;
            }
        };
        let window: &'static Window = Box::leak(Box::new(window));
        let gpu = match pollster::block_on(Gpu::new(window, self.settings.vsync)) {
            Ok(gpu) => gpu,
            Err(err) => {
                error!(error = %format!("{err:#}"), "gpu init failed");
                event_loop.exit();
                return;
            }
        };
        self.mount_scene(window, &gpu);
        self.viewport = Some(Viewport::new(window, gpu, &self.egui_ctx, event_loop));
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: egui_winit::winit::window::WindowId,
        event: WindowEvent,
    ) {
        self.handle_window_event(window_id, event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewport.is_none() {
            return;
        }
        if self.shutdown_requested {
            if let Some(host) = self.scene.as_mut() {
                host.detach();
            }
            event_loop.exit();
            return;
        }
        if let Err(err) = self.frame() {
            error!(error = %format!("{err:#}"), "frame failed");
            event_loop.exit();
        }
    }
}
