use serde::{Deserialize, Serialize};

/// Full channel-aware ad package returned by the text model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdPackage {
    pub campaign_brief: CampaignBrief,
    pub audience: Audience,
    pub kpi: Kpi,
    pub variants: Vec<Variant>,
    pub assets: Vec<Asset>,
    pub style_guide: StyleGuide,
    pub production_checklist: Vec<String>,
    pub disclaimer_legal: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CampaignBrief {
    pub title: String,
    pub hook: String,
    pub value_props: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Audience {
    pub age_range: String,
    pub segments: Vec<String>,
    pub insight: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Kpi {
    pub primary: String,
    pub goal: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoryboardScene {
    pub scene_id: String,
    pub duration_s: f64,
    pub shot_type: String,
    pub camera_move: String,
    pub framing: String,
    pub action: String,
    pub dialogue_vo: String,
    pub onscreen_text: String,
    pub color_palette: Vec<String>,
    pub typography: String,
    pub music_sfx: String,
    pub transition: String,
    pub assets_needed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdCopy {
    pub headline: String,
    pub body: String,
    pub cta: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSpecs {
    pub resolution: String,
    pub format: String,
    pub filename: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AbTest {
    pub label: String,
    pub change: String,
}

/// One channel-specific rendering of the package.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Variant {
    pub id: String,
    pub channel: String,
    pub duration_s: f64,
    pub aspect_ratio: String,
    pub storyboard: Vec<StoryboardScene>,
    pub copy: AdCopy,
    pub render_specs: RenderSpecs,
    pub ab_tests: Vec<AbTest>,
    pub legal_note: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    #[default]
    Image,
    Video,
    Audio,
    Font,
}

impl AssetType {
    pub const ALL: [&'static str; 4] = ["image", "video", "audio", "font"];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Asset {
    pub id: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub purpose: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StyleGuide {
    pub colors: Vec<String>,
    pub typography: String,
    pub logo_placement: String,
    pub motion_easing: String,
}
