pub const USER_CREATED: &str = "user.created";
pub const USER_UPDATED: &str = "user.updated";
pub const POINTS_EARNED: &str = "points.earned";
pub const POINTS_REDEEMED: &str = "points.redeemed";
pub const TIER_CHANGED: &str = "tier.changed";
pub const REWARD_REDEEMED: &str = "reward.redeemed";
pub const CAMPAIGN_COMPLETED: &str = "campaign.completed";
pub const TRANSACTION_CREATED: &str = "transaction.created";

/// Event used by admin connectivity checks when none is given.
pub const WEBHOOK_TEST: &str = "webhook.test";

pub const KNOWN_EVENTS: [&str; 8] = [
    USER_CREATED,
    USER_UPDATED,
    POINTS_EARNED,
    POINTS_REDEEMED,
    TIER_CHANGED,
    REWARD_REDEEMED,
    CAMPAIGN_COMPLETED,
    TRANSACTION_CREATED,
];

pub fn is_known_event(event: &str) -> bool {
    KNOWN_EVENTS.contains(&event)
}
