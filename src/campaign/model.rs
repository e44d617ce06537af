use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of marketing surface a campaign renders as.
///
/// Serialized with the backend's short codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignType {
    #[serde(rename = "BAN")]
    Banner,
    #[serde(rename = "MOD")]
    Modal,
    #[serde(rename = "WID")]
    Widget,
    #[serde(rename = "FLT")]
    Floater,
    #[serde(rename = "SUR")]
    Survey,
    #[serde(rename = "STR")]
    Story,
    #[serde(rename = "REL")]
    Reel,
    #[serde(rename = "BTS")]
    BottomSheet,
    #[serde(rename = "CSAT")]
    Csat,
    #[serde(rename = "PIP")]
    Pip,
}

impl CampaignType {
    pub const ALL: [CampaignType; 10] = [
        CampaignType::Banner,
        CampaignType::Modal,
        CampaignType::Widget,
        CampaignType::Floater,
        CampaignType::Survey,
        CampaignType::Story,
        CampaignType::Reel,
        CampaignType::BottomSheet,
        CampaignType::Csat,
        CampaignType::Pip,
    ];

    /// Short code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            CampaignType::Banner => "BAN",
            CampaignType::Modal => "MOD",
            CampaignType::Widget => "WID",
            CampaignType::Floater => "FLT",
            CampaignType::Survey => "SUR",
            CampaignType::Story => "STR",
            CampaignType::Reel => "REL",
            CampaignType::BottomSheet => "BTS",
            CampaignType::Csat => "CSAT",
            CampaignType::Pip => "PIP",
        }
    }

    /// Resolve a discriminant. Accepts short codes and long names in any
    /// case (`"BAN"`, `"banner"`, `"bottom_sheet"`).
    pub fn from_discriminant(tag: &str) -> Option<Self> {
        let normalized: String = tag
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "BAN" | "BANNER" => Some(CampaignType::Banner),
            "MOD" | "MODAL" => Some(CampaignType::Modal),
            "WID" | "WIDGET" => Some(CampaignType::Widget),
            "FLT" | "FLOATER" => Some(CampaignType::Floater),
            "SUR" | "SURVEY" => Some(CampaignType::Survey),
            "STR" | "STORY" | "STORIES" => Some(CampaignType::Story),
            "REL" | "REEL" | "REELS" => Some(CampaignType::Reel),
            "BTS" | "BOTTOMSHEET" => Some(CampaignType::BottomSheet),
            "CSAT" => Some(CampaignType::Csat),
            "PIP" => Some(CampaignType::Pip),
            _ => None,
        }
    }
}

impl std::fmt::Display for CampaignType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerDetails {
    pub id: Option<String>,
    pub image: Option<String>,
    pub lottie_data: Option<String>,
    pub link: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub styling: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalItem {
    pub image: Option<String>,
    pub link: Option<String>,
    pub size: Option<String>,
    pub background_opacity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalDetails {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, alias = "modals")]
    pub items: Vec<ModalItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetImage {
    pub id: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetDetails {
    pub id: Option<String>,
    /// Layout variant, e.g. "full" or "half".
    #[serde(rename = "type")]
    pub widget_type: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    #[serde(default)]
    pub widget_images: Vec<WidgetImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloaterDetails {
    pub id: Option<String>,
    pub image: Option<String>,
    pub lottie_data: Option<String>,
    pub link: Option<String>,
    pub position: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyDetails {
    pub id: Option<String>,
    pub name: Option<String>,
    pub survey_question: Option<String>,
    /// Option key to label, ordered by key.
    #[serde(default)]
    pub survey_options: BTreeMap<String, String>,
    #[serde(default)]
    pub has_others: bool,
    pub styling: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySlide {
    pub id: Option<String>,
    pub image: Option<String>,
    pub video: Option<String>,
    pub link: Option<String>,
    pub button_text: Option<String>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryGroup {
    pub id: Option<String>,
    pub name: Option<String>,
    pub thumbnail: Option<String>,
    pub ring_color: Option<String>,
    pub order: Option<i64>,
    #[serde(default)]
    pub slides: Vec<StorySlide>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDetails {
    pub id: Option<String>,
    #[serde(default)]
    pub groups: Vec<StoryGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reel {
    pub id: Option<String>,
    pub video: Option<String>,
    pub thumbnail: Option<String>,
    pub description_text: Option<String>,
    pub button_text: Option<String>,
    pub link: Option<String>,
    pub likes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelDetails {
    pub id: Option<String>,
    #[serde(default)]
    pub reels: Vec<Reel>,
    pub styling: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottomSheetDetails {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Ordered content blocks; their shape is owned by the view layer.
    #[serde(default)]
    pub elements: Vec<serde_json::Value>,
    pub corner_radius: Option<f64>,
    #[serde(default)]
    pub enable_cross_button: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsatDetails {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description_text: Option<String>,
    pub thumbnail_image: Option<String>,
    pub height: Option<f64>,
    #[serde(default)]
    pub feedback_option: Vec<String>,
    pub styling: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipDetails {
    pub id: Option<String>,
    pub small_video: Option<String>,
    pub large_video: Option<String>,
    pub link: Option<String>,
    pub button_text: Option<String>,
    pub position: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Typed campaign payload, one variant per [`CampaignType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CampaignDetails {
    Banner(BannerDetails),
    Modal(ModalDetails),
    Widget(WidgetDetails),
    Floater(FloaterDetails),
    Survey(SurveyDetails),
    Story(StoryDetails),
    Reel(ReelDetails),
    BottomSheet(BottomSheetDetails),
    Csat(CsatDetails),
    Pip(PipDetails),
}

impl CampaignDetails {
    pub fn campaign_type(&self) -> CampaignType {
        match self {
            CampaignDetails::Banner(_) => CampaignType::Banner,
            CampaignDetails::Modal(_) => CampaignType::Modal,
            CampaignDetails::Widget(_) => CampaignType::Widget,
            CampaignDetails::Floater(_) => CampaignType::Floater,
            CampaignDetails::Survey(_) => CampaignType::Survey,
            CampaignDetails::Story(_) => CampaignType::Story,
            CampaignDetails::Reel(_) => CampaignType::Reel,
            CampaignDetails::BottomSheet(_) => CampaignType::BottomSheet,
            CampaignDetails::Csat(_) => CampaignType::Csat,
            CampaignDetails::Pip(_) => CampaignType::Pip,
        }
    }
}

/// A backend-configured marketing unit.
///
/// Only produced by [`crate::campaign::decode`], which guarantees
/// `details.campaign_type() == campaign_type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    pub id: String,
    pub campaign_type: CampaignType,
    /// Placement hint for the view layer (e.g. widget slot name).
    pub position: Option<String>,
    pub screen: Option<String>,
    pub details: CampaignDetails,
}

impl Campaign {
    pub fn is_at(&self, position: &str) -> bool {
        self.position.as_deref() == Some(position)
    }
}
