use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::AuthError;

const TOKEN_BYTES: usize = 32;

/// 32 random bytes from the OS, base64url without padding (43 chars).
pub(crate) fn new_session_token() -> Result<String, AuthError> {
    let mut buf = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut buf).map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

/// Numeric code with each digit drawn uniformly from 0-9.
///
/// Bytes >= 250 are rejected so `byte % 10` carries no modulo bias.
pub(crate) fn new_numeric_code(len: usize) -> Result<String, AuthError> {
    let mut code = String::with_capacity(len);
    let mut buf = [0u8; 16];
    while code.len() < len {
        getrandom::fill(&mut buf).map_err(|e| AuthError::Entropy(e.to_string()))?;
        for &b in &buf {
            if b < 250 {
                code.push(char::from(b'0' + b % 10));
                if code.len() == len {
                    break;
                }
            }
        }
    }
    Ok(code)
}

/// Short prefix of a token, safe to log.
pub fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}…")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tokens_are_long_and_distinct() {
        let tokens: HashSet<String> = (0..100).map(|_| new_session_token().unwrap()).collect();
        assert_eq!(tokens.len(), 100);
        for t in &tokens {
            assert_eq!(t.len(), 43);
            assert!(t.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn numeric_code_has_requested_length() {
        for len in [1, 4, 6, 10, 40] {
            let code = new_numeric_code(len).unwrap();
            assert_eq!(code.len(), len);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn numeric_code_uses_every_digit() {
        let digits: HashSet<char> = (0..50)
            .flat_map(|_| new_numeric_code(20).unwrap().chars().collect::<Vec<_>>())
            .collect();
        assert_eq!(digits.len(), 10);
    }

    #[test]
    fn mask_keeps_only_prefix() {
        assert_eq!(mask_token("abcdefghijkl"), "abcdef…");
        assert_eq!(mask_token("ab"), "ab…");
    }
}
