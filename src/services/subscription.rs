use crate::models::webhook_endpoint::WebhookEndpoint;

/// Active endpoints subscribed to `event`, in input order.
pub fn eligible_endpoints<'a>(event: &str, endpoints: &'a [WebhookEndpoint]) -> Vec<&'a WebhookEndpoint> {
    if event.is_empty() {
        return Vec::new();
    }
    endpoints
        .iter()
        .filter(|endpoint| endpoint.is_eligible_for(event))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn endpoint(id: i64, events: &[&str], active: bool) -> WebhookEndpoint {
        WebhookEndpoint {
            id,
            name: format!("endpoint-{}", id),
            url: format!("https://example.com/{}", id),
            secret: "s".into(),
            events: events.iter().map(|e| e.to_string()).collect(),
            is_active: active,
            created_at: Utc::now(),
            last_triggered_at: None,
            success_rate: 100.0,
        }
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        assert!(eligible_endpoints("user.created", &[]).is_empty());
        let eps = vec![endpoint(1, &["user.created"], true)];
        assert!(eligible_endpoints("", &eps).is_empty());
    }

    #[test]
    fn inactive_endpoints_are_never_selected() {
        let eps = vec![
            endpoint(1, &["user.created"], false),
            endpoint(2, &["user.created"], true),
        ];
        let ids: Vec<i64> = eligible_endpoints("user.created", &eps)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn keeps_input_order_and_checks_subscription() {
        let eps = vec![
            endpoint(3, &["tier.changed", "points.earned"], true),
            endpoint(1, &["points.earned"], true),
            endpoint(2, &["user.created"], true),
        ];
        let ids: Vec<i64> = eligible_endpoints("points.earned", &eps)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
        assert!(eligible_endpoints("campaign.completed", &eps).is_empty());
    }
}
