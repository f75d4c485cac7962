use rand::seq::SliceRandom;
use rand::Rng;

use super::SessionError;

/// Characters used for generated codes; no 0/O or 1/I look-alikes.
pub const SESSION_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const GENERATED_CODE_LEN: usize = 8;
pub const MIN_CODE_LEN: usize = 4;
pub const MAX_CODE_LEN: usize = 32;

pub const PARTICIPANT_COLORS: [&str; 10] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#FFD700", "#FF69B4", "#00CED1",
];

pub fn generate_session_code() -> String {
    let mut rng = rand::thread_rng();
    (0..GENERATED_CODE_LEN)
        .map(|_| SESSION_CODE_ALPHABET[rng.gen_range(0..SESSION_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Codes typed by users: ASCII alphanumerics only, so they are always a
/// single valid store path segment.
pub fn is_valid_session_code(code: &str) -> bool {
    (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

pub fn ensure_valid_code(code: &str) -> Result<(), SessionError> {
    if is_valid_session_code(code) {
        Ok(())
    } else {
        Err(SessionError::InvalidCode(code.to_string()))
    }
}

pub fn assign_color() -> &'static str {
    PARTICIPANT_COLORS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PARTICIPANT_COLORS[0])
}
