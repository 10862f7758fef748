use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub const SECRET_PREFIX: &str = "whsec_";
const SECRET_LENGTH: usize = 32;

pub fn generate_webhook_secret() -> String {
    let body: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect();
    format!("{}{}", SECRET_PREFIX, body)
}

/// Keeps the prefix and the last four characters, e.g. `whsec_****Ab12`.
pub fn mask_secret(secret: &str) -> String {
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if secret.starts_with(SECRET_PREFIX) {
        format!("{}****{}", SECRET_PREFIX, tail)
    } else {
        format!("****{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secrets_are_prefixed_and_unique() {
        let a = generate_webhook_secret();
        let b = generate_webhook_secret();
        assert!(a.starts_with(SECRET_PREFIX));
        assert_eq!(a.len(), SECRET_PREFIX.len() + SECRET_LENGTH);
        assert_ne!(a, b);
    }

    #[test]
    fn masking_keeps_only_the_tail() {
        assert_eq!(mask_secret("whsec_abcdefgh1234"), "whsec_****1234");
        assert_eq!(mask_secret("abc"), "****abc");
    }
}
