use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

/// Generates the random `state` value sent with the login redirect.
///
/// Returns a 22-character URL-safe string (16 random bytes → base64url).
#[must_use]
pub fn generate_state() -> String {
    let random_bytes: [u8; 16] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_length() {
        assert_eq!(generate_state().len(), 22);
    }

    #[test]
    fn test_state_url_safe() {
        let state = generate_state();
        assert!(
            state
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "state should be URL-safe: {state}"
        );
    }

    #[test]
    fn test_state_uniqueness() {
        assert_ne!(generate_state(), generate_state(), "states should be unique");
    }
}
