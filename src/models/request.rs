use serde::{Deserialize, Serialize};

/// Channels offered as checkboxes on the campaign form.
pub const CHANNEL_OPTIONS: [&str; 5] = [
    "TikTok",
    "YouTube",
    "Instagram Feed",
    "Instagram Reels",
    "Billboard",
];

/// Campaign inputs submitted by the form.
///
/// Images are referenced by upload id; the bytes live in the media store
/// until the user removes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdGenRequest {
    pub product_description: String,
    #[serde(default)]
    pub product_images: Vec<String>,
    #[serde(default)]
    pub celebrity_images: Vec<String>,
    #[serde(default)]
    pub campaign_goals: String,
    #[serde(default)]
    pub brand_guidelines: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub regions: String,
}

impl AdGenRequest {
    /// Names of required fields left blank, in form order.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        [
            ("productDescription", &self.product_description),
            ("campaignGoals", &self.campaign_goals),
            ("tone", &self.tone),
            ("regions", &self.regions),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Scene fields needed to prompt the image and video models.
///
/// Concept storyboards carry a mood; ad package storyboards carry a camera move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneMediaRequest {
    pub scene_id: String,
    pub shot_type: String,
    pub action: String,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub camera_move: Option<String>,
}
