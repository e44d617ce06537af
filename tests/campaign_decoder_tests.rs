//! Integration tests for campaign payload decoding and the registry.

use campaignkit::campaign::{decode, decode_feed, BannerDetails, StoryDetails};
use campaignkit::{CampaignDetails, CampaignRegistry, CampaignType};
use serde_json::json;

fn banner_details() -> serde_json::Value {
    json!({
        "id": "d1",
        "image": "https://cdn.example.com/banner.png",
        "link": "https://example.com/sale",
        "width": 320.0,
        "height": 90.0
    })
}

// ============================================================================
// Details Shape Tests
// ============================================================================

#[test]
fn test_bare_and_wrapped_details_decode_equal() {
    let bare = json!({"id": "c1", "campaign_type": "BAN", "details": banner_details()});
    let wrapped = json!({"id": "c1", "campaign_type": "BAN", "details": [banner_details()]});

    let from_bare = decode(&bare).unwrap();
    let from_wrapped = decode(&wrapped).unwrap();

    assert_eq!(from_bare, from_wrapped);
    match from_bare.details {
        CampaignDetails::Banner(BannerDetails { image, width, .. }) => {
            assert_eq!(image.as_deref(), Some("https://cdn.example.com/banner.png"));
            assert_eq!(width, Some(320.0));
        }
        other => panic!("expected banner details, got {:?}", other),
    }
}

#[test]
fn test_surplus_array_elements_are_ignored() {
    let raw = json!({
        "id": "c1",
        "campaign_type": "BAN",
        "details": [banner_details(), {"image": "second.png"}]
    });

    let campaign = decode(&raw).unwrap();
    match campaign.details {
        CampaignDetails::Banner(details) => assert_eq!(details.id.as_deref(), Some("d1")),
        other => panic!("expected banner details, got {:?}", other),
    }
}

#[test]
fn test_empty_details_array_is_dropped() {
    let raw = json!({"id": "c1", "campaign_type": "BAN", "details": []});
    assert!(decode(&raw).is_none());
}

#[test]
fn test_unknown_discriminant_is_dropped() {
    let raw = json!({"id": "c1", "campaign_type": "TOOLTIP", "details": banner_details()});
    assert!(decode(&raw).is_none());
}

#[test]
fn test_missing_id_is_dropped() {
    let raw = json!({"campaign_type": "BAN", "details": banner_details()});
    assert!(decode(&raw).is_none());

    let blank = json!({"id": "", "campaign_type": "BAN", "details": banner_details()});
    assert!(decode(&blank).is_none());
}

#[test]
fn test_camel_case_discriminant_field() {
    let raw = json!({"id": "c1", "campaignType": "WID", "details": {"type": "carousel"}});

    let campaign = decode(&raw).unwrap();
    assert_eq!(campaign.campaign_type, CampaignType::Widget);
    assert_eq!(campaign.details.campaign_type(), CampaignType::Widget);
}

// ============================================================================
// Variant Tests
// ============================================================================

#[test]
fn test_every_type_decodes_from_empty_details() {
    for campaign_type in CampaignType::ALL {
        let raw = json!({"id": "c1", "campaign_type": campaign_type.code(), "details": {}});
        let campaign = decode(&raw).unwrap_or_else(|| panic!("{} did not decode", campaign_type));

        assert_eq!(campaign.campaign_type, campaign_type);
        assert_eq!(campaign.details.campaign_type(), campaign_type);
    }
}

#[test]
fn test_story_groups_decode_from_single_object() {
    let raw = json!({
        "id": "s1",
        "campaign_type": "STR",
        "details": [{
            "groups": [
                {"name": "New", "slides": [{"image": "1.png"}, {"video": "2.mp4"}]},
                {"name": "Sale", "slides": []}
            ]
        }]
    });

    let campaign = decode(&raw).unwrap();
    match campaign.details {
        CampaignDetails::Story(StoryDetails { groups, .. }) => {
            assert_eq!(groups.len(), 2);
            assert_eq!(groups[0].slides.len(), 2);
            assert_eq!(groups[1].name.as_deref(), Some("Sale"));
        }
        other => panic!("expected story details, got {:?}", other),
    }
}

#[test]
fn test_survey_options_and_modal_alias() {
    let survey = json!({
        "id": "sv1",
        "campaign_type": "SUR",
        "details": {
            "survey_question": "How did we do?",
            "survey_options": {"a": "Great", "b": "Fine"},
            "has_others": true
        }
    });
    match decode(&survey).unwrap().details {
        CampaignDetails::Survey(details) => {
            assert_eq!(details.survey_options.len(), 2);
            assert!(details.has_others);
        }
        other => panic!("expected survey details, got {:?}", other),
    }

    let modal = json!({
        "id": "m1",
        "campaign_type": "MOD",
        "details": {"modals": [{"image": "m.png", "size": "60"}]}
    });
    match decode(&modal).unwrap().details {
        CampaignDetails::Modal(details) => assert_eq!(details.items.len(), 1),
        other => panic!("expected modal details, got {:?}", other),
    }
}

// ============================================================================
// Feed Tests
// ============================================================================

#[test]
fn test_feed_skips_bad_entries() {
    let feed = json!([
        {"id": "c1", "campaign_type": "BAN", "details": banner_details()},
        {"id": "c2", "campaign_type": "NOPE", "details": {}},
        "garbage",
        {"id": "c3", "campaign_type": "PIP", "details": [{"small_video": "s.mp4"}]}
    ]);

    let campaigns = decode_feed(&feed);
    let ids: Vec<&str> = campaigns.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c3"]);
}

#[test]
fn test_feed_accepts_wrapped_object() {
    let feed = json!({"campaigns": [{"id": 7, "campaign_type": "FLT", "details": {}}]});

    let campaigns = decode_feed(&feed);
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].id, "7");
}

#[test]
fn test_feed_of_wrong_shape_is_empty() {
    assert!(decode_feed(&json!({"data": []})).is_empty());
    assert!(decode_feed(&json!(42)).is_empty());
}

// ============================================================================
// Registry Tests
// ============================================================================

#[test]
fn test_registry_lookup() {
    let registry = CampaignRegistry::new();
    assert!(registry.is_empty());

    registry.update(decode_feed(&json!([
        {"id": "w1", "campaign_type": "WID", "position": "top", "details": {}},
        {"id": "w2", "campaign_type": "WID", "position": "bottom", "details": {}},
        {"id": "b1", "campaign_type": "BAN", "details": banner_details()}
    ])));

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.by_type(CampaignType::Widget).len(), 2);
    assert_eq!(
        registry
            .first_of(CampaignType::Widget, Some("bottom"))
            .map(|c| c.id),
        Some("w2".to_string())
    );
    assert_eq!(
        registry.first_of(CampaignType::Widget, None).map(|c| c.id),
        Some("w1".to_string())
    );
    assert!(registry.first_of(CampaignType::Pip, None).is_none());
}

#[test]
fn test_registry_update_replaces_snapshot() {
    let registry = CampaignRegistry::new();
    registry.update(decode_feed(&json!([
        {"id": "a", "campaign_type": "BAN", "details": {}}
    ])));

    let before = registry.snapshot();
    registry.update(decode_feed(&json!([
        {"id": "b", "campaign_type": "MOD", "details": {}}
    ])));

    // readers holding the old snapshot are unaffected
    assert_eq!(before[0].id, "a");
    assert_eq!(registry.snapshot()[0].id, "b");

    registry.clear();
    assert!(registry.is_empty());
}
