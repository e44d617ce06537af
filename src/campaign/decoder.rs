//! Campaign payload decoding.
//!
//! The backend is not consistent about the shape of a campaign's `details`
//! field: the same campaign may arrive with a bare object or with that
//! object wrapped in an array. Decoding runs an ordered list of candidate
//! extractors over the raw JSON value and keeps the first candidate that
//! deserializes into the details type the discriminant selects, so the
//! array form never leaves this module.
//!
//! Anything that cannot be decoded is dropped and logged at debug level;
//! one bad campaign never fails the rest of a feed.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::model::{Campaign, CampaignDetails, CampaignType};

type Candidate = fn(&Value) -> Option<&Value>;

/// Where the details object may be found, in order of preference.
const DETAILS_CANDIDATES: [Candidate; 2] = [bare_object, first_element];

fn bare_object(raw: &Value) -> Option<&Value> {
    raw.is_object().then_some(raw)
}

/// Surplus elements are ignored.
fn first_element(raw: &Value) -> Option<&Value> {
    raw.as_array()?.first().filter(|first| first.is_object())
}

fn parse_details<T: DeserializeOwned>(raw: &Value) -> Option<T> {
    DETAILS_CANDIDATES
        .iter()
        .filter_map(|candidate| candidate(raw))
        .find_map(|value| match T::deserialize(value) {
            Ok(details) => Some(details),
            Err(e) => {
                tracing::debug!("Details candidate rejected: {}", e);
                None
            }
        })
}

fn resolve_details(campaign_type: CampaignType, raw: &Value) -> Option<CampaignDetails> {
    match campaign_type {
        CampaignType::Banner => parse_details(raw).map(CampaignDetails::Banner),
        CampaignType::Modal => parse_details(raw).map(CampaignDetails::Modal),
        CampaignType::Widget => parse_details(raw).map(CampaignDetails::Widget),
        CampaignType::Floater => parse_details(raw).map(CampaignDetails::Floater),
        CampaignType::Survey => parse_details(raw).map(CampaignDetails::Survey),
        CampaignType::Story => parse_details(raw).map(CampaignDetails::Story),
        CampaignType::Reel => parse_details(raw).map(CampaignDetails::Reel),
        CampaignType::BottomSheet => parse_details(raw).map(CampaignDetails::BottomSheet),
        CampaignType::Csat => parse_details(raw).map(CampaignDetails::Csat),
        CampaignType::Pip => parse_details(raw).map(CampaignDetails::Pip),
    }
}

/// Envelope fields shared by every campaign.
#[derive(Debug, Deserialize)]
struct Envelope {
    id: Value,
    #[serde(alias = "campaignType")]
    campaign_type: String,
    position: Option<String>,
    screen: Option<String>,
}

fn campaign_id(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a single campaign payload.
///
/// Returns `None` when the payload has no usable `id`, no recognizable
/// discriminant, or `details` that resolve to nothing (including an empty
/// array).
pub fn decode(raw: &Value) -> Option<Campaign> {
    if !raw.is_object() {
        tracing::debug!("Dropping campaign payload that is not an object");
        return None;
    }

    let envelope = match Envelope::deserialize(raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!("Dropping campaign with malformed envelope: {}", e);
            return None;
        }
    };

    let Some(id) = campaign_id(&envelope.id) else {
        tracing::debug!("Dropping campaign without a usable id");
        return None;
    };

    let Some(campaign_type) = CampaignType::from_discriminant(&envelope.campaign_type) else {
        tracing::debug!(
            "Dropping campaign {}: unrecognized type {:?}",
            id,
            envelope.campaign_type
        );
        return None;
    };

    let details = raw
        .get("details")
        .and_then(|details| resolve_details(campaign_type, details));

    let Some(details) = details else {
        tracing::debug!("Dropping {} campaign {}: details did not resolve", campaign_type, id);
        return None;
    };

    Some(Campaign {
        id,
        campaign_type,
        position: envelope.position,
        screen: envelope.screen,
        details,
    })
}

/// Decode a campaign feed.
///
/// Accepts either a bare array of campaigns or an object carrying them
/// under `campaigns`. Undecodable entries are skipped.
pub fn decode_feed(raw: &Value) -> Vec<Campaign> {
    let items: &[Value] = match raw {
        Value::Array(items) => items,
        Value::Object(object) => match object.get("campaigns") {
            Some(Value::Array(items)) => items,
            _ => {
                tracing::debug!("Campaign feed has no campaigns array");
                &[]
            }
        },
        _ => {
            tracing::debug!("Campaign feed is neither an array nor an object");
            &[]
        }
    };

    let campaigns: Vec<Campaign> = items.iter().filter_map(decode).collect();

    let dropped = items.len() - campaigns.len();
    if dropped > 0 {
        tracing::debug!("Decoded {} campaigns, dropped {}", campaigns.len(), dropped);
    }

    campaigns
}
