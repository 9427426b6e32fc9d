//! Prompt text and response schemas for the text, image and video models.
//!
//! Schemas use the OpenAPI subset Gemini accepts in `responseSchema`
//! (`STRING`, `NUMBER`, `ARRAY`, `OBJECT`, `enum`, `required`).

use serde_json::{json, Value};

use crate::models::{AdGenRequest, AssetType, SceneMediaRequest};

pub const NO_BRAND_GUIDELINES: &str = "No specific brand guidelines provided.";
pub const NO_CHANNELS: &str = "Choose the most suitable channels.";

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

fn channel_list(channels: &[String]) -> String {
    let selected: Vec<&str> = channels
        .iter()
        .map(|c| c.as_str())
        .filter(|c| !c.trim().is_empty())
        .collect();
    if selected.is_empty() {
        NO_CHANNELS.to_string()
    } else {
        selected.join(", ")
    }
}

/// Instruction for the full multi-channel ad package.
pub fn build_ad_package_prompt(
    request: &AdGenRequest,
    product_image_count: usize,
    celebrity_image_count: usize,
) -> String {
    format!(
        r#"
You are AdGen — a multimodal advertising creative generator.
Your role is to turn campaign inputs into a complete, production-ready ad package.
You MUST output a valid JSON object matching the provided schema.

**Campaign Inputs:**
- **Product Description:** {description}
- **Campaign Goals:** {goals}
- **Brand Guidelines:** {guidelines}
- **Tone:** {tone}
- **Channels:** {channels}
- **Target Regions:** {regions}

**Attached Assets:**
- {product_images} product image(s).
- {celebrity_images} celebrity/influencer image(s).

Generate:
1. A campaign brief with a title, a hook and key value propositions.
2. The target audience (age range, segments, core insight) and a primary KPI with a measurable goal.
3. One variant per channel, each with its duration, aspect ratio, a storyboard of 3-6 scenes
   (shot type, camera move, framing, action, dialogue/VO, on-screen text, color palette,
   typography, music/SFX, transition, assets needed), copy (headline, body, CTA),
   render specs, A/B test ideas and a legal note.
4. The list of assets to produce, a style guide, a production checklist and a legal disclaimer.
Localize copy and cultural references for the target regions.
"#,
        description = request.product_description,
        goals = request.campaign_goals,
        guidelines = or_placeholder(&request.brand_guidelines, NO_BRAND_GUIDELINES),
        tone = request.tone,
        channels = channel_list(&request.channels),
        regions = request.regions,
        product_images = product_image_count,
        celebrity_images = celebrity_image_count,
    )
}

/// Instruction for the short single-concept output.
pub fn build_creative_prompt(
    request: &AdGenRequest,
    product_image_count: usize,
    celebrity_image_count: usize,
) -> String {
    format!(
        r#"
You are AdGen — a multimodal advertising creative generator.
Your role is to take user inputs and generate a compelling ad concept.
You MUST output a valid JSON object matching the provided schema.

**User Inputs:**
- **Product Description:** {description}
- **Tone:** {tone}
- **Campaign Goals:** {goals}
- **Brand Guidelines:** {guidelines}
- **Channels:** {channels}
- **Target Regions:** {regions}

**Attached Assets:**
- {product_images} product image(s).
- {celebrity_images} celebrity/influencer image(s).

Based on these inputs, generate an ad concept including:
1. A catchy headline.
2. A short body copy.
3. A clear call to action (CTA).
4. A storyboard with 3 distinct scenes. For each scene, provide a scene_id (e.g., 's1'), a detailed visual description, the key action, the shot_type (e.g., 'wide shot', 'close-up'), and the overall mood (e.g., 'energetic', 'serene').
"#,
        description = request.product_description,
        tone = request.tone,
        goals = or_placeholder(&request.campaign_goals, "Not specified."),
        guidelines = or_placeholder(&request.brand_guidelines, NO_BRAND_GUIDELINES),
        channels = channel_list(&request.channels),
        regions = or_placeholder(&request.regions, "Global."),
        product_images = product_image_count,
        celebrity_images = celebrity_image_count,
    )
}

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn number() -> Value {
    json!({ "type": "NUMBER" })
}

fn array_of(items: Value) -> Value {
    json!({ "type": "ARRAY", "items": items })
}

/// Object schema whose properties are all required, in declaration order.
fn object(properties: Vec<(&str, Value)>) -> Value {
    let required: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
    let mut props = serde_json::Map::new();
    for (name, schema) in properties {
        props.insert(name.to_string(), schema);
    }
    json!({
        "type": "OBJECT",
        "properties": props,
        "required": required,
        "propertyOrdering": required,
    })
}

fn storyboard_scene_schema() -> Value {
    object(vec![
        ("scene_id", string()),
        ("duration_s", number()),
        ("shot_type", string()),
        ("camera_move", string()),
        ("framing", string()),
        ("action", string()),
        ("dialogue_vo", string()),
        ("onscreen_text", string()),
        ("color_palette", array_of(string())),
        ("typography", string()),
        ("music_sfx", string()),
        ("transition", string()),
        ("assets_needed", array_of(string())),
    ])
}

/// Schema matching [`crate::models::AdPackage`].
pub fn ad_package_schema() -> Value {
    object(vec![
        (
            "campaign_brief",
            object(vec![
                ("title", string()),
                ("hook", string()),
                ("value_props", array_of(string())),
            ]),
        ),
        (
            "audience",
            object(vec![
                ("age_range", string()),
                ("segments", array_of(string())),
                ("insight", string()),
            ]),
        ),
        ("kpi", object(vec![("primary", string()), ("goal", string())])),
        (
            "variants",
            array_of(object(vec![
                ("id", string()),
                ("channel", string()),
                ("duration_s", number()),
                ("aspect_ratio", string()),
                ("storyboard", array_of(storyboard_scene_schema())),
                (
                    "copy",
                    object(vec![
                        ("headline", string()),
                        ("body", string()),
                        ("cta", string()),
                    ]),
                ),
                (
                    "render_specs",
                    object(vec![
                        ("resolution", string()),
                        ("format", string()),
                        ("filename", string()),
                    ]),
                ),
                (
                    "ab_tests",
                    array_of(object(vec![("label", string()), ("change", string())])),
                ),
                ("legal_note", string()),
            ])),
        ),
        (
            "assets",
            array_of(object(vec![
                ("id", string()),
                ("type", json!({ "type": "STRING", "enum": AssetType::ALL })),
                ("purpose", string()),
                ("notes", string()),
            ])),
        ),
        (
            "style_guide",
            object(vec![
                ("colors", array_of(string())),
                ("typography", string()),
                ("logo_placement", string()),
                ("motion_easing", string()),
            ]),
        ),
        ("production_checklist", array_of(string())),
        ("disclaimer_legal", string()),
    ])
}

/// Schema matching [`crate::models::CreativeOutput`].
pub fn creative_output_schema() -> Value {
    object(vec![
        ("headline", string()),
        ("body", string()),
        ("cta", string()),
        (
            "storyboard",
            array_of(object(vec![
                ("scene_id", string()),
                ("description", string()),
                ("action", string()),
                ("shot_type", string()),
                ("mood", string()),
            ])),
        ),
    ])
}

fn mood_clause(scene: &SceneMediaRequest) -> String {
    match scene.mood.as_deref().map(str::trim) {
        Some(mood) if !mood.is_empty() => format!(", {} mood", mood),
        _ => String::new(),
    }
}

pub fn scene_image_prompt(scene: &SceneMediaRequest) -> String {
    format!(
        "Cinematic photo, {}{}. Action: \"{}\". Style: hyper-realistic, professional commercial photography.",
        scene.shot_type,
        mood_clause(scene),
        scene.action
    )
}

pub fn scene_video_prompt(scene: &SceneMediaRequest) -> String {
    let mut prompt = format!(
        "Cinematic video, {}{}. Action: \"{}\". High-resolution, professional commercial footage.",
        scene.shot_type,
        mood_clause(scene),
        scene.action
    );
    if let Some(camera) = scene.camera_move.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!(" Camera: {}.", camera));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> AdGenRequest {
        AdGenRequest {
            product_description: "An eco-friendly, solar-powered backpack for tech-savvy hikers."
                .to_string(),
            product_images: vec!["p1".to_string(), "p2".to_string()],
            celebrity_images: vec![],
            campaign_goals: "Increase brand awareness among millennials".to_string(),
            brand_guidelines: "Primary color: #FFFFFF. Avoid playful fonts.".to_string(),
            tone: "Energetic and inspiring".to_string(),
            channels: vec!["TikTok".to_string(), "Billboard".to_string()],
            regions: "North America, Japan, Brazil".to_string(),
        }
    }

    #[test]
    fn test_ad_package_prompt_contains_every_field_verbatim() {
        let request = sample_request();
        let prompt = build_ad_package_prompt(&request, 2, 0);

        assert!(prompt.contains(&request.product_description));
        assert!(prompt.contains(&request.campaign_goals));
        assert!(prompt.contains(&request.brand_guidelines));
        assert!(prompt.contains(&request.tone));
        assert!(prompt.contains(&request.regions));
        assert!(prompt.contains("TikTok, Billboard"));
        assert!(prompt.contains("2 product image(s)."));
        assert!(prompt.contains("0 celebrity/influencer image(s)."));
    }

    #[test]
    fn test_creative_prompt_contains_every_field_verbatim() {
        let request = sample_request();
        let prompt = build_creative_prompt(&request, 2, 1);

        assert!(prompt.contains(&request.product_description));
        assert!(prompt.contains(&request.tone));
        assert!(prompt.contains(&request.campaign_goals));
        assert!(prompt.contains(&request.brand_guidelines));
        assert!(prompt.contains(&request.regions));
        assert!(prompt.contains("1 celebrity/influencer image(s)."));
        assert!(prompt.contains("3 distinct scenes"));
    }

    #[test]
    fn test_absent_optional_fields_use_placeholders() {
        let request = AdGenRequest {
            brand_guidelines: String::new(),
            channels: vec![],
            ..sample_request()
        };
        let prompt = build_ad_package_prompt(&request, 0, 0);

        assert!(prompt.contains(NO_BRAND_GUIDELINES));
        assert!(prompt.contains(NO_CHANNELS));
    }

    #[test]
    fn test_ad_package_schema_requires_top_level_sections() {
        let schema = ad_package_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();

        for key in [
            "campaign_brief",
            "audience",
            "kpi",
            "variants",
            "assets",
            "style_guide",
            "production_checklist",
            "disclaimer_legal",
        ] {
            assert!(required.contains(&key), "missing {}", key);
        }

        let scene = &schema["properties"]["variants"]["items"]["properties"]["storyboard"]["items"];
        assert_eq!(scene["properties"]["camera_move"]["type"], "STRING");
        assert_eq!(
            schema["properties"]["assets"]["items"]["properties"]["type"]["enum"],
            json!(["image", "video", "audio", "font"])
        );
    }

    #[test]
    fn test_creative_schema_scene_fields() {
        let schema = creative_output_schema();
        let scene = &schema["properties"]["storyboard"]["items"]["properties"];
        for key in ["scene_id", "description", "action", "shot_type", "mood"] {
            assert_eq!(scene[key]["type"], "STRING");
        }
    }

    #[test]
    fn test_scene_prompts() {
        let scene = SceneMediaRequest {
            scene_id: "s1".to_string(),
            shot_type: "close-up".to_string(),
            action: "hiker opens the solar panel".to_string(),
            mood: Some("serene".to_string()),
            camera_move: None,
        };

        assert_eq!(
            scene_image_prompt(&scene),
            "Cinematic photo, close-up, serene mood. Action: \"hiker opens the solar panel\". Style: hyper-realistic, professional commercial photography."
        );
        assert_eq!(
            scene_video_prompt(&scene),
            "Cinematic video, close-up, serene mood. Action: \"hiker opens the solar panel\". High-resolution, professional commercial footage."
        );

        let package_scene = SceneMediaRequest {
            mood: None,
            camera_move: Some("slow dolly in".to_string()),
            ..scene
        };
        assert_eq!(
            scene_video_prompt(&package_scene),
            "Cinematic video, close-up. Action: \"hiker opens the solar panel\". High-resolution, professional commercial footage. Camera: slow dolly in."
        );
    }
}
