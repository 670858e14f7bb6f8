// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Portfolio content records as they appear in the JSON documents.
//!
//! Documents are not validated. Missing optional fields default to empty and a
//! document that cannot be read or parsed is replaced by its empty default, so a
//! page always has something to render (possibly its empty state).

use std::collections::BTreeMap;
use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::render_config::Rgb;

/// Logical names of the content documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKey {
    /// Profile, contact, social links and stats.
    About,
    /// Work history.
    Experiences,
    /// Project catalogue.
    Projects,
    /// Skill tree.
    Skills,
}

impl ContentKey {
    /// All documents.
    pub const ALL: [ContentKey; 4] = [
        ContentKey::About,
        ContentKey::Experiences,
        ContentKey::Projects,
        ContentKey::Skills,
    ];

    /// Store key (file stem) of the document.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKey::About => "about",
            ContentKey::Experiences => "experiences",
            ContentKey::Projects => "projects",
            ContentKey::Skills => "skills",
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content decoding failure.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The document exists but is not valid for its schema.
    #[error("content document `{key}` is malformed: {source}")]
    Parse {
        /// Document that failed.
        key: ContentKey,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}

/// Field decoders that never fail a whole record over one bad value.
///
/// A field with the wrong shape (including `null`) reads as its default, and a
/// list keeps every entry that decodes, dropping only the malformed ones.
mod lenient {
    use serde::{de::DeserializeOwned, Deserialize, Deserializer};
    use serde_json::Value;
    use tracing::warn;

    pub fn field<'de, D, T>(de: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(de)?;
        if value.is_null() {
            return Ok(T::default());
        }
        Ok(T::deserialize(value).unwrap_or_else(|err| {
            warn!(error = %err, "content field has the wrong shape; using default");
            T::default()
        }))
    }

    pub fn list<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let items = match Value::deserialize(de)? {
            Value::Array(items) => items,
            Value::Null => return Ok(Vec::new()),
            other => {
                warn!(found = %other, "content list is not an array; using empty list");
                return Ok(Vec::new());
            }
        };
        Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match T::deserialize(item) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(index, error = %err, "dropping malformed content entry");
                    None
                }
            })
            .collect())
    }

    /// Counts accept integers, non-negative floats (rounded) and numeric strings.
    pub fn count<'de, D, T>(de: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u64> + Default,
    {
        let value = Value::deserialize(de)?;
        let n = value
            .as_u64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.round() as u64)
            })
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()));
        Ok(n.and_then(|n| T::try_from(n).ok()).unwrap_or_else(|| {
            if !value.is_null() {
                warn!(found = %value, "content count is not a number; using 0");
            }
            T::default()
        }))
    }
}

/// Decode one document strictly.
pub fn decode<T: DeserializeOwned>(key: ContentKey, raw: &str) -> Result<T, ContentError> {
    serde_json::from_str(raw).map_err(|source| ContentError::Parse { key, source })
}

/// Decode one document, substituting the empty default when it is missing or bad.
pub fn decode_or_default<T: DeserializeOwned + Default>(key: ContentKey, raw: Option<&str>) -> T {
    let Some(raw) = raw else {
        warn!(%key, "content document missing; using empty default");
        return T::default();
    };
    decode(key, raw).unwrap_or_else(|err| {
        warn!(error = %err, "content document unreadable; using empty default");
        T::default()
    })
}

// ── about ──────────────────────────────────────────────────────────────

/// Profile card.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    /// Display name.
    #[serde(deserialize_with = "lenient::field")]
    pub name: String,
    /// Job title.
    #[serde(deserialize_with = "lenient::field")]
    pub title: String,
    /// One-line tagline.
    #[serde(deserialize_with = "lenient::field")]
    pub tagline: String,
    /// Avatar asset name.
    #[serde(deserialize_with = "lenient::field")]
    pub avatar: String,
    /// Free-form biography.
    #[serde(deserialize_with = "lenient::field")]
    pub bio: String,
    /// Location text.
    #[serde(deserialize_with = "lenient::field")]
    pub location: String,
    /// Open to work.
    #[serde(deserialize_with = "lenient::field")]
    pub available: bool,
}

/// Contact block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    /// E-mail address (copyable).
    #[serde(deserialize_with = "lenient::field")]
    pub email: String,
    /// Phone number.
    #[serde(deserialize_with = "lenient::field")]
    pub phone: String,
    /// Personal site.
    #[serde(deserialize_with = "lenient::field")]
    pub website: String,
}

/// One social profile link.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLink {
    /// Platform name.
    #[serde(deserialize_with = "lenient::field")]
    pub platform: String,
    /// Profile URL.
    #[serde(deserialize_with = "lenient::field")]
    pub url: String,
    /// Icon glyph or name.
    #[serde(deserialize_with = "lenient::field")]
    pub icon: String,
}

/// Headline numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    /// Years of experience.
    #[serde(deserialize_with = "lenient::count")]
    pub years_experience: u32,
    /// Completed projects.
    #[serde(deserialize_with = "lenient::count")]
    pub projects_completed: u32,
    /// Cups of coffee.
    #[serde(deserialize_with = "lenient::count")]
    pub coffee_consumed: u64,
    /// Lines of code written.
    #[serde(deserialize_with = "lenient::count")]
    pub lines_of_code: u64,
}

/// The `about` document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct About {
    /// Profile card.
    #[serde(deserialize_with = "lenient::field")]
    pub profile: Profile,
    /// Contact block.
    #[serde(deserialize_with = "lenient::field")]
    pub contact: Contact,
    /// Social links.
    #[serde(deserialize_with = "lenient::list")]
    pub social: Vec<SocialLink>,
    /// Stats.
    #[serde(deserialize_with = "lenient::field")]
    pub stats: Stats,
}

// ── experiences ────────────────────────────────────────────────────────

/// End of a position: a date string or the literal `"Current"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EndDate {
    /// Still in the role.
    #[default]
    Current,
    /// Date string as written in the document.
    Date(String),
}

impl From<String> for EndDate {
    fn from(s: String) -> Self {
        if s == "Current" {
            EndDate::Current
        } else {
            EndDate::Date(s)
        }
    }
}

impl From<EndDate> for String {
    fn from(d: EndDate) -> Self {
        match d {
            EndDate::Current => "Current".to_string(),
            EndDate::Date(s) => s,
        }
    }
}

/// One position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Experience {
    /// Role title.
    #[serde(deserialize_with = "lenient::field")]
    pub title: String,
    /// Full-time, contract, ...
    #[serde(deserialize_with = "lenient::field")]
    pub occupation_type: String,
    /// Employer.
    #[serde(deserialize_with = "lenient::field")]
    pub organization_name: String,
    /// Start date string.
    #[serde(deserialize_with = "lenient::field")]
    pub start_date: String,
    /// End date.
    #[serde(deserialize_with = "lenient::field")]
    pub end_date: EndDate,
    /// Location text.
    #[serde(deserialize_with = "lenient::field")]
    pub location: String,
    /// Bullet points.
    #[serde(deserialize_with = "lenient::list")]
    pub desc_points: Vec<String>,
    /// Key achievements.
    #[serde(deserialize_with = "lenient::list")]
    pub achievements: Vec<String>,
}

/// The `experiences` document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceDoc {
    /// Positions, most recent first by convention.
    #[serde(deserialize_with = "lenient::list")]
    pub experiences: Vec<Experience>,
}

// ── projects ───────────────────────────────────────────────────────────

/// Project category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectKind {
    /// Games.
    Game,
    /// Web sites and apps.
    Web,
    /// Rendering and graphics work.
    Graphics,
    /// Desktop or mobile applications.
    Application,
    /// Art.
    Art,
    /// Libraries.
    Library,
    /// Anything else, including unknown categories.
    #[default]
    #[serde(other)]
    Misc,
}

impl ProjectKind {
    /// Label colour used on cards.
    pub fn color(self) -> Rgb {
        match self {
            ProjectKind::Game => Rgb([0x00, 0xff, 0x88]),
            ProjectKind::Web => Rgb([0xff, 0xb8, 0x00]),
            ProjectKind::Graphics => Rgb([0x7e, 0xd7, 0xd9]),
            ProjectKind::Application => Rgb([0xff, 0x33, 0x66]),
            ProjectKind::Art => Rgb([0x00, 0xd4, 0xff]),
            ProjectKind::Library => Rgb([0x6c, 0x9e, 0xff]),
            ProjectKind::Misc => Rgb([0x8a, 0x8f, 0x98]),
        }
    }
}

/// Project progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    /// Shipped.
    Completed,
    /// Under way.
    #[serde(rename = "In Progress")]
    InProgress,
    /// Not started; also used for unknown values.
    #[default]
    #[serde(other)]
    Planned,
}

impl ProjectStatus {
    /// Human label.
    pub fn label(self) -> &'static str {
        match self {
            ProjectStatus::Completed => "Completed",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Planned => "Planned",
        }
    }
}

/// How an image fills its frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    /// Fill and crop.
    #[default]
    Cover,
    /// Fit inside, letterboxed.
    Contain,
}

/// One project.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    /// Stable identifier.
    #[serde(deserialize_with = "lenient::field")]
    pub id: String,
    /// Title.
    #[serde(deserialize_with = "lenient::field")]
    pub title: String,
    /// Card blurb.
    #[serde(deserialize_with = "lenient::field")]
    pub description: String,
    /// Detail text.
    #[serde(deserialize_with = "lenient::field")]
    pub long_description: String,
    /// Thumbnail asset name.
    #[serde(deserialize_with = "lenient::field")]
    pub thumbnail: String,
    /// Thumbnail fit.
    #[serde(deserialize_with = "lenient::field")]
    pub thumbnail_fit: ImageFit,
    /// Slideshow asset names.
    #[serde(deserialize_with = "lenient::list")]
    pub images: Vec<String>,
    /// Slideshow fit.
    #[serde(deserialize_with = "lenient::field")]
    pub images_fit: ImageFit,
    /// Technology tags.
    #[serde(deserialize_with = "lenient::list")]
    pub technologies: Vec<String>,
    /// Category.
    #[serde(rename = "type")]
    #[serde(deserialize_with = "lenient::field")]
    pub kind: ProjectKind,
    /// Progress.
    #[serde(deserialize_with = "lenient::field")]
    pub status: ProjectStatus,
    /// Source link.
    #[serde(deserialize_with = "lenient::field")]
    pub github_url: Option<String>,
    /// Live link.
    #[serde(deserialize_with = "lenient::field")]
    pub live_url: Option<String>,
    /// Feature bullets.
    #[serde(deserialize_with = "lenient::list")]
    pub features: Vec<String>,
}

/// The `projects` document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDoc {
    /// Projects in display order.
    #[serde(deserialize_with = "lenient::list")]
    pub projects: Vec<Project>,
}

// ── skills ─────────────────────────────────────────────────────────────

/// Proficiency, with its legend colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SkillLevel {
    /// Top level.
    Master,
    /// Expert.
    Expert,
    /// Advanced.
    Advanced,
    /// Default when a node has no level.
    #[default]
    Intermediate,
    /// Beginner.
    Beginner,
}

impl SkillLevel {
    /// Legend order.
    pub const ALL: [SkillLevel; 5] = [
        SkillLevel::Master,
        SkillLevel::Expert,
        SkillLevel::Advanced,
        SkillLevel::Intermediate,
        SkillLevel::Beginner,
    ];

    /// Parse a level name; unknown names are `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.name() == s)
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            SkillLevel::Master => "Master",
            SkillLevel::Expert => "Expert",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Beginner => "Beginner",
        }
    }

    /// Legend colour.
    pub fn color(self) -> Rgb {
        match self {
            SkillLevel::Master => Rgb([0x00, 0xd4, 0xff]),
            SkillLevel::Expert => Rgb([0x00, 0xff, 0x88]),
            SkillLevel::Advanced => Rgb([0xff, 0xb8, 0x00]),
            SkillLevel::Intermediate => Rgb([0xff, 0x6b, 0x35]),
            SkillLevel::Beginner => Rgb([0xff, 0x33, 0x66]),
        }
    }
}

/// One node of the skill tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillNode {
    /// Skill or category name.
    #[serde(deserialize_with = "lenient::field")]
    pub name: String,
    /// Free-form attributes (`level`, `icon`, `description`, `years`, ...).
    #[serde(deserialize_with = "lenient::field")]
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// Sub-skills.
    #[serde(deserialize_with = "lenient::list")]
    pub children: Vec<SkillNode>,
}

impl SkillNode {
    fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(serde_json::Value::as_str)
    }

    /// Level attribute; missing or unknown reads as Intermediate.
    pub fn level(&self) -> SkillLevel {
        self.attr_str("level")
            .and_then(SkillLevel::parse)
            .unwrap_or_default()
    }

    /// Icon attribute.
    pub fn icon(&self) -> Option<&str> {
        self.attr_str("icon")
    }

    /// Description attribute.
    pub fn description(&self) -> Option<&str> {
        self.attr_str("description")
    }

    /// Years of experience attribute.
    pub fn years(&self) -> Option<f64> {
        self.attributes.get("years").and_then(serde_json::Value::as_f64)
    }
}

/// The `skills` document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkillDoc {
    /// Root of the tree.
    #[serde(deserialize_with = "lenient::field")]
    pub skill_tree: SkillNode,
}

/// Every content document, decoded leniently.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentBundle {
    /// `about`.
    pub about: About,
    /// `experiences`.
    pub experiences: ExperienceDoc,
    /// `projects`.
    pub projects: ProjectDoc,
    /// `skills`.
    pub skills: SkillDoc,
}

impl ContentBundle {
    /// Decode each document from whatever `read` returns for its key.
    pub fn from_raw(mut read: impl FnMut(ContentKey) -> Option<String>) -> Self {
        Self {
            about: decode_or_default(ContentKey::About, read(ContentKey::About).as_deref()),
            experiences: decode_or_default(
                ContentKey::Experiences,
                read(ContentKey::Experiences).as_deref(),
            ),
            projects: decode_or_default(
                ContentKey::Projects,
                read(ContentKey::Projects).as_deref(),
            ),
            skills: decode_or_default(ContentKey::Skills, read(ContentKey::Skills).as_deref()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn experience_end_date_current_is_special() {
        let doc: ExperienceDoc = decode(
            ContentKey::Experiences,
            r#"{"experiences":[
                {"title":"Engineer","organizationName":"Acme","startDate":"2021-03-01","endDate":"Current"},
                {"title":"Intern","startDate":"2019-06-01","endDate":"2019-09-01","descPoints":["a"]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(doc.experiences[0].end_date, EndDate::Current);
        assert_eq!(doc.experiences[1].end_date, EndDate::Date("2019-09-01".into()));
        assert_eq!(doc.experiences[1].desc_points, vec!["a".to_string()]);
        assert!(doc.experiences[0].achievements.is_empty());
    }

    #[test]
    fn project_enums_tolerate_unknowns() {
        let doc: ProjectDoc = decode(
            ContentKey::Projects,
            r#"{"projects":[{"id":"x","type":"Game","status":"In Progress","thumbnailFit":"contain"},
                            {"id":"y","type":"Sculpture","status":"Abandoned"}]}"#,
        )
        .unwrap();
        assert_eq!(doc.projects[0].kind, ProjectKind::Game);
        assert_eq!(doc.projects[0].status, ProjectStatus::InProgress);
        assert_eq!(doc.projects[0].thumbnail_fit, ImageFit::Contain);
        assert_eq!(doc.projects[1].kind, ProjectKind::Misc);
        assert_eq!(doc.projects[1].status, ProjectStatus::Planned);
    }

    #[test]
    fn one_bad_entry_keeps_its_neighbours() {
        let doc: ExperienceDoc = decode_or_default(
            ContentKey::Experiences,
            Some(
                r#"{"experiences":[
                    {"title":"Engineer","startDate":"2021-03-01","endDate":null},
                    {"title":"Lead","startDate":2022,"endDate":"Current","descPoints":["a",7,"b"]},
                    42,
                    {"title":"Intern","endDate":"2019-09-01"}
                ]}"#,
            ),
        );
        let titles: Vec<_> = doc.experiences.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Engineer", "Lead", "Intern"]);
        assert_eq!(doc.experiences[0].end_date, EndDate::Current);
        assert_eq!(doc.experiences[1].start_date, "");
        assert_eq!(doc.experiences[1].desc_points, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(doc.experiences[2].end_date, EndDate::Date("2019-09-01".into()));
    }

    #[test]
    fn stats_accept_loose_numbers() {
        let about: About = decode(
            ContentKey::About,
            r#"{"profile":{"name":"Ada","available":"yes"},
                "stats":{"yearsExperience":4.6,"projectsCompleted":"12","coffeeConsumed":-3,"linesOfCode":null},
                "social":[{"platform":"GitHub","url":"https://github.com/ada"},{"platform":["x"]}]}"#,
        )
        .unwrap();
        assert_eq!(about.profile.name, "Ada");
        assert!(!about.profile.available);
        assert_eq!(about.stats.years_experience, 5);
        assert_eq!(about.stats.projects_completed, 12);
        assert_eq!(about.stats.coffee_consumed, 0);
        assert_eq!(about.stats.lines_of_code, 0);
        assert_eq!(about.social.len(), 2);
        assert_eq!(about.social[1].platform, "");
    }

    #[test]
    fn broken_documents_become_empty() {
        let bundle = ContentBundle::from_raw(|key| match key {
            ContentKey::Projects => Some("{ not json".into()),
            ContentKey::Skills => Some(r#"{"skillTree":{"name":"Root","children":[{"name":"Rust","attributes":{"level":"Expert","years":4}}]}}"#.into()),
            _ => None,
        });
        assert!(bundle.projects.projects.is_empty());
        assert!(bundle.experiences.experiences.is_empty());
        let rust = &bundle.skills.skill_tree.children[0];
        assert_eq!(rust.level(), SkillLevel::Expert);
        assert_eq!(rust.years(), Some(4.0));
        assert_eq!(bundle.skills.skill_tree.level(), SkillLevel::Intermediate);
    }
}
