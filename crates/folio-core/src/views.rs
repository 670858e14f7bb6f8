// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Page view-models: what each page shows, independent of the UI toolkit.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};

use crate::content::{
    About, EndDate, Experience, ExperienceDoc, ImageFit, Project, ProjectDoc, ProjectKind,
    ProjectStatus, SkillLevel, SkillNode,
};

/// Experience page placeholder for an empty list.
pub const EXPERIENCE_EMPTY: &str = "No experiences to display yet.";
/// Projects page placeholder for an empty list.
pub const PROJECTS_EMPTY: &str = "No projects to display yet.";
/// Shown in place of an image that cannot be displayed.
pub const IMAGE_UNAVAILABLE: &str = "Image unavailable";
/// How long the "copied" confirmation stays up on the About page.
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// Maps logical asset names from content documents to loadable URIs.
pub trait AssetResolver {
    /// URI for `name`, or `None` when the asset is unknown.
    fn resolve(&self, name: &str) -> Option<String>;
}

impl<F: Fn(&str) -> Option<String>> AssetResolver for F {
    fn resolve(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Where an image comes from, or that it has none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Loadable URI.
    Uri(String),
    /// Render [`IMAGE_UNAVAILABLE`] instead.
    Unavailable,
}

impl ImageSource {
    fn resolve(resolver: &dyn AssetResolver, name: &str) -> Self {
        if name.is_empty() {
            return ImageSource::Unavailable;
        }
        resolver
            .resolve(name)
            .map_or(ImageSource::Unavailable, ImageSource::Uri)
    }
}

// ── experience ─────────────────────────────────────────────────────────

/// `"Mar 2021"` for any date string chrono can read; the raw text otherwise.
pub fn format_month(raw: &str) -> String {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()));
    date.map_or_else(|| raw.to_string(), |d| d.format("%b %Y").to_string())
}

/// `"Mar 2021 - Present"` style period of a position.
pub fn period(exp: &Experience) -> String {
    let end = match &exp.end_date {
        EndDate::Current => "Present".to_string(),
        EndDate::Date(d) => format_month(d),
    };
    format!("{} - {end}", format_month(&exp.start_date))
}

/// One rendered position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExperienceItem {
    /// Role title.
    pub title: String,
    /// Employer.
    pub organization: String,
    /// `"Full-time · Berlin"`.
    pub subtitle: String,
    /// Formatted period.
    pub period: String,
    /// Bullet points.
    pub points: Vec<String>,
    /// Achievements (section hidden when empty).
    pub achievements: Vec<String>,
}

/// Experience page content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExperienceList {
    /// Rendered positions.
    pub items: Vec<ExperienceItem>,
    /// Placeholder text when there are no items.
    pub placeholder: Option<&'static str>,
}

impl ExperienceList {
    /// Build from the document.
    pub fn new(doc: &ExperienceDoc) -> Self {
        let items: Vec<_> = doc
            .experiences
            .iter()
            .map(|e| ExperienceItem {
                title: e.title.clone(),
                organization: e.organization_name.clone(),
                subtitle: [e.occupation_type.as_str(), e.location.as_str()]
                    .into_iter()
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" · "),
                period: period(e),
                points: e.desc_points.clone(),
                achievements: e.achievements.clone(),
            })
            .collect();
        let placeholder = items.is_empty().then_some(EXPERIENCE_EMPTY);
        Self { items, placeholder }
    }
}

// ── projects ───────────────────────────────────────────────────────────

/// A project card in the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectCard {
    /// Project id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Blurb.
    pub description: String,
    /// Category.
    pub kind: ProjectKind,
    /// Progress.
    pub status: ProjectStatus,
    /// Thumbnail.
    pub thumbnail: ImageSource,
    /// Thumbnail fit.
    pub fit: ImageFit,
}

/// Projects page content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectList {
    /// Cards in document order.
    pub cards: Vec<ProjectCard>,
    /// Placeholder text when there are no cards.
    pub placeholder: Option<&'static str>,
}

impl ProjectList {
    /// Build from the document, resolving thumbnails.
    pub fn new(doc: &ProjectDoc, assets: &dyn AssetResolver) -> Self {
        let cards: Vec<_> = doc
            .projects
            .iter()
            .map(|p| ProjectCard {
                id: p.id.clone(),
                title: p.title.clone(),
                description: p.description.clone(),
                kind: p.kind,
                status: p.status,
                thumbnail: ImageSource::resolve(assets, &p.thumbnail),
                fit: p.thumbnail_fit,
            })
            .collect();
        let placeholder = cards.is_empty().then_some(PROJECTS_EMPTY);
        Self { cards, placeholder }
    }
}

/// Wrap-around image carousel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlideShow {
    len: usize,
    index: usize,
}

impl SlideShow {
    /// Carousel over `len` slides, starting at the first.
    pub fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    /// Number of slides.
    pub fn len(&self) -> usize {
        self.len
    }

    /// No slides at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current slide, if any.
    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    /// Advance, wrapping from the last slide to the first.
    pub fn next_slide(&mut self) {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
    }

    /// Go back, wrapping from the first slide to the last.
    pub fn prev_slide(&mut self) {
        if self.len > 0 {
            self.index = (self.index + self.len - 1) % self.len;
        }
    }
}

/// Full project view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectDetail {
    /// The project record.
    pub project: Project,
    /// Resolved slideshow images.
    pub images: Vec<ImageSource>,
    /// Carousel position.
    pub slides: SlideShow,
}

impl ProjectDetail {
    /// Detail view for `project`.
    pub fn new(project: &Project, assets: &dyn AssetResolver) -> Self {
        let images: Vec<_> = project
            .images
            .iter()
            .map(|name| ImageSource::resolve(assets, name))
            .collect();
        Self {
            slides: SlideShow::new(images.len()),
            images,
            project: project.clone(),
        }
    }

    /// Image under the carousel cursor.
    pub fn current_image(&self) -> Option<&ImageSource> {
        self.slides.current().and_then(|i| self.images.get(i))
    }
}

// ── skills ─────────────────────────────────────────────────────────────

/// Children-index path from the root; the root is `[]`.
pub type SkillPath = Vec<usize>;

/// One visible row of the flattened tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillRow {
    /// Path of the node.
    pub path: SkillPath,
    /// Depth (root = 0).
    pub depth: usize,
    /// Name.
    pub name: String,
    /// Level (for the colour).
    pub level: SkillLevel,
    /// Whether the node can be expanded.
    pub has_children: bool,
    /// Whether its children are shown.
    pub expanded: bool,
}

/// Collapsible skill tree; nodes shallower than the initial depth start expanded.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillTree {
    root: SkillNode,
    expanded: BTreeSet<SkillPath>,
}

impl SkillTree {
    /// Depth expanded on first display.
    pub const INITIAL_DEPTH: usize = 1;

    /// Tree over `root` with the initial expansion.
    pub fn new(root: SkillNode) -> Self {
        fn walk(node: &SkillNode, path: &mut SkillPath, out: &mut BTreeSet<SkillPath>) {
            if path.len() >= SkillTree::INITIAL_DEPTH || node.children.is_empty() {
                return;
            }
            out.insert(path.clone());
            for (i, child) in node.children.iter().enumerate() {
                path.push(i);
                walk(child, path, out);
                path.pop();
            }
        }
        let mut expanded = BTreeSet::new();
        walk(&root, &mut Vec::new(), &mut expanded);
        Self { root, expanded }
    }

    /// Root node.
    pub fn root(&self) -> &SkillNode {
        &self.root
    }

    /// Node at `path`.
    pub fn node(&self, path: &[usize]) -> Option<&SkillNode> {
        path.iter()
            .try_fold(&self.root, |node, &i| node.children.get(i))
    }

    /// Flip expansion of the node at `path`. Returns the new state, or `None` for
    /// unknown paths and leaves.
    pub fn toggle(&mut self, path: &[usize]) -> Option<bool> {
        let node = self.node(path)?;
        if node.children.is_empty() {
            return None;
        }
        if self.expanded.remove(path) {
            Some(false)
        } else {
            self.expanded.insert(path.to_vec());
            Some(true)
        }
    }

    /// Visible rows in depth-first order.
    pub fn rows(&self) -> Vec<SkillRow> {
        let mut out = Vec::new();
        self.collect(&self.root, &mut Vec::new(), &mut out);
        out
    }

    fn collect(&self, node: &SkillNode, path: &mut SkillPath, out: &mut Vec<SkillRow>) {
        let expanded = self.expanded.contains(path.as_slice());
        out.push(SkillRow {
            path: path.clone(),
            depth: path.len(),
            name: node.name.clone(),
            level: node.level(),
            has_children: !node.children.is_empty(),
            expanded,
        });
        if expanded {
            for (i, child) in node.children.iter().enumerate() {
                path.push(i);
                self.collect(child, path, out);
                path.pop();
            }
        }
    }
}

// ── about ──────────────────────────────────────────────────────────────

/// `(value, label)` pairs for the stats strip.
pub fn stat_tiles(about: &About) -> [(String, &'static str); 4] {
    let s = &about.stats;
    [
        (s.years_experience.to_string(), "Years XP"),
        (s.projects_completed.to_string(), "Quests Done"),
        (format!("{}K", s.lines_of_code / 1000), "Lines Written"),
        (s.coffee_consumed.to_string(), "Coffee"),
    ]
}

/// "Copied!" confirmation state for the e-mail button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CopyFeedback {
    copied_at: Option<Duration>,
}

impl CopyFeedback {
    /// The address was copied at `now`.
    pub fn copied(&mut self, now: Duration) {
        self.copied_at = Some(now);
    }

    /// Whether the confirmation is showing at `now`.
    pub fn showing(&self, now: Duration) -> bool {
        self.copied_at
            .is_some_and(|t| now.saturating_sub(t) < COPY_FEEDBACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> SkillNode {
        SkillNode {
            name: name.into(),
            ..SkillNode::default()
        }
    }

    fn branch(name: &str, children: Vec<SkillNode>) -> SkillNode {
        SkillNode {
            name: name.into(),
            children,
            ..SkillNode::default()
        }
    }

    #[test]
    fn dates_format_as_short_month() {
        assert_eq!(format_month("2021-03-15"), "Mar 2021");
        assert_eq!(format_month("2019-11"), "Nov 2019");
        assert_eq!(format_month("2020-01-01T00:00:00Z"), "Jan 2020");
        assert_eq!(format_month("someday"), "someday");
        let exp = Experience {
            start_date: "2022-06-01".into(),
            ..Experience::default()
        };
        assert_eq!(period(&exp), "Jun 2022 - Present");
    }

    #[test]
    fn empty_lists_render_placeholders() {
        let none = |_: &str| -> Option<String> { None };
        assert_eq!(ExperienceList::new(&ExperienceDoc::default()).placeholder, Some(EXPERIENCE_EMPTY));
        let list = ProjectList::new(&ProjectDoc::default(), &none);
        assert!(list.cards.is_empty());
        assert_eq!(list.placeholder, Some(PROJECTS_EMPTY));
    }

    #[test]
    fn slideshow_wraps_both_ways() {
        let mut s = SlideShow::new(3);
        s.prev_slide();
        assert_eq!(s.current(), Some(2));
        s.next_slide();
        assert_eq!(s.current(), Some(0));
        let mut empty = SlideShow::new(0);
        empty.next_slide();
        assert_eq!(empty.current(), None);
    }

    #[test]
    fn unresolved_images_are_unavailable() {
        let project = Project {
            images: vec!["a.png".into(), "missing.png".into()],
            ..Project::default()
        };
        let assets = |n: &str| (n == "a.png").then(|| format!("file:///assets/{n}"));
        let detail = ProjectDetail::new(&project, &assets);
        assert_eq!(detail.images[1], ImageSource::Unavailable);
        assert_eq!(
            detail.current_image(),
            Some(&ImageSource::Uri("file:///assets/a.png".into()))
        );
    }

    #[test]
    fn skill_tree_starts_at_depth_one_and_toggles() {
        let root = branch(
            "Skills",
            vec![branch("Languages", vec![leaf("Rust"), leaf("C++")]), leaf("Art")],
        );
        let mut tree = SkillTree::new(root);
        let names: Vec<_> = tree.rows().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["Skills", "Languages", "Art"]);

        assert_eq!(tree.toggle(&[0]), Some(true));
        assert_eq!(tree.rows().len(), 5);
        assert_eq!(tree.toggle(&[1]), None);
        assert_eq!(tree.toggle(&[]), Some(false));
        assert_eq!(tree.rows().len(), 1);
    }

    #[test]
    fn copy_feedback_expires() {
        let mut fb = CopyFeedback::default();
        assert!(!fb.showing(Duration::ZERO));
        fb.copied(Duration::from_millis(100));
        assert!(fb.showing(Duration::from_millis(2099)));
        assert!(!fb.showing(Duration::from_millis(2100)));
    }
}
