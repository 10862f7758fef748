use url::Url;

use crate::error::{Error, Result};
use crate::services::events::is_known_event;

pub fn validate_webhook_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| Error::BadRequest(format!("invalid url: {}", e)))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(()),
        "http" | "https" => Err(Error::BadRequest("url must include a host".into())),
        other => Err(Error::BadRequest(format!(
            "unsupported url scheme '{}'",
            other
        ))),
    }
}

/// Rejects unknown event names and collapses duplicates, keeping first-seen order.
pub fn normalize_events(events: &[String]) -> Result<Vec<String>> {
    if events.is_empty() {
        return Err(Error::BadRequest("at least one event is required".into()));
    }
    let mut out: Vec<String> = Vec::with_capacity(events.len());
    for event in events {
        let event = event.trim();
        if !is_known_event(event) {
            return Err(Error::BadRequest(format!("unknown event '{}'", event)));
        }
        if !out.iter().any(|e| e == event) {
            out.push(event.to_string());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https_urls_only() {
        assert!(validate_webhook_url("https://hooks.example.com/loyalty").is_ok());
        assert!(validate_webhook_url("http://localhost:9000/in").is_ok());
        assert!(validate_webhook_url("ftp://example.com/x").is_err());
        assert!(validate_webhook_url("not a url").is_err());
    }

    #[test]
    fn events_are_deduplicated_in_order() {
        let events = vec![
            "tier.changed".to_string(),
            "user.created".to_string(),
            "tier.changed".to_string(),
        ];
        assert_eq!(
            normalize_events(&events).unwrap(),
            vec!["tier.changed".to_string(), "user.created".to_string()]
        );
    }

    #[test]
    fn unknown_or_missing_events_are_rejected() {
        assert!(normalize_events(&[]).is_err());
        assert!(normalize_events(&["points.vanished".to_string()]).is_err());
    }
}
