use serde::{Deserialize, Serialize};

/// Single ad concept: copy plus a short storyboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CreativeOutput {
    pub headline: String,
    pub body: String,
    pub cta: String,
    pub storyboard: Vec<ConceptScene>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConceptScene {
    pub scene_id: String,
    pub description: String,
    pub action: String,
    pub shot_type: String,
    pub mood: String,
}
