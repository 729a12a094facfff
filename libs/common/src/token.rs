use rand::RngCore;

/// Number of random bytes behind a session token (128 bits).
pub const SESSION_TOKEN_BYTES: usize = 16;

/// Generates an opaque, unguessable session token as lowercase hex.
///
/// # Examples
/// ```
/// let token = kiosk_common::session_token();
/// assert_eq!(token.len(), 32);
/// ```
pub fn session_token() -> String {
    let mut buf = [0u8; SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_format() {
        let token = session_token();
        assert_eq!(token.len(), SESSION_TOKEN_BYTES * 2);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_uniqueness() {
        let a = session_token();
        let b = session_token();
        assert_ne!(a, b);
    }
}
