use parking_lot::RwLock;
use std::sync::Arc;

use super::model::{Campaign, CampaignType};

/// Latest fetched campaigns, read by the view layer.
///
/// The content is an immutable snapshot swapped wholesale on every
/// [`update`](Self::update); a reader holding a snapshot never sees a
/// partially applied fetch.
#[derive(Debug, Default)]
pub struct CampaignRegistry {
    snapshot: RwLock<Arc<Vec<Campaign>>>,
}

impl CampaignRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot. Latest fetch wins; nothing is merged.
    pub fn update(&self, campaigns: Vec<Campaign>) {
        let count = campaigns.len();
        *self.snapshot.write() = Arc::new(campaigns);
        tracing::debug!("Campaign registry updated with {} campaigns", count);
    }

    pub fn snapshot(&self) -> Arc<Vec<Campaign>> {
        Arc::clone(&self.snapshot.read())
    }

    /// All campaigns matching `predicate`, in feed order.
    pub fn query<F>(&self, predicate: F) -> Vec<Campaign>
    where
        F: Fn(&Campaign) -> bool,
    {
        self.snapshot()
            .iter()
            .filter(|campaign| predicate(campaign))
            .cloned()
            .collect()
    }

    pub fn by_type(&self, campaign_type: CampaignType) -> Vec<Campaign> {
        self.query(|campaign| campaign.campaign_type == campaign_type)
    }

    /// First campaign of `campaign_type`, restricted to `position` if given.
    pub fn first_of(&self, campaign_type: CampaignType, position: Option<&str>) -> Option<Campaign> {
        self.snapshot()
            .iter()
            .find(|campaign| {
                campaign.campaign_type == campaign_type
                    && position.map_or(true, |position| campaign.is_at(position))
            })
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        *self.snapshot.write() = Arc::new(Vec::new());
    }
}
