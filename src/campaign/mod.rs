//! Campaign model, payload decoding and the in-memory registry the view
//! layer reads from.

pub mod decoder;
mod model;
mod registry;

pub use decoder::{decode, decode_feed};
pub use model::{
    BannerDetails, BottomSheetDetails, Campaign, CampaignDetails, CampaignType, CsatDetails,
    FloaterDetails, ModalDetails, ModalItem, PipDetails, Reel, ReelDetails, StoryDetails,
    StoryGroup, StorySlide, SurveyDetails, WidgetDetails, WidgetImage,
};
pub use registry::CampaignRegistry;
