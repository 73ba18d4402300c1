/// KV key layout for voice prints.
///
/// ```text
/// vp:{user_id}   → msgpack VoicePrint
/// ```

/// Prefix shared by every voice-print key.
pub const PRINT_PREFIX: &str = "vp:";

/// KV key for a user's voice print. Format: "vp:{user_id}"
pub fn print_key(user_id: &str) -> String {
    format!("{PRINT_PREFIX}{user_id}")
}

/// Recover the user id from a voice-print key.
pub fn user_id_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(PRINT_PREFIX)
}
