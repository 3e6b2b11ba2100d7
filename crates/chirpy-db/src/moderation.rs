//! Write-time checks applied to a chirp body before it is stored.

use crate::error::{DbError, Result};

pub const MAX_CHIRP_LENGTH: usize = 140;

pub const MASK: &str = "****";

const DENYLIST: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

/// Reject bodies over [`MAX_CHIRP_LENGTH`] characters and mask denylisted words.
pub fn enforce(body: &str) -> Result<String> {
    let len = body.chars().count();
    if len > MAX_CHIRP_LENGTH {
        return Err(DbError::TooLong {
            len,
            max: MAX_CHIRP_LENGTH,
        });
    }
    Ok(mask(body))
}

/// Replace whole whitespace-delimited words matching the denylist, ignoring
/// case. Words are rejoined with single spaces.
pub fn mask(body: &str) -> String {
    body.split_whitespace()
        .map(|word| if is_denied(word) { MASK } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_denied(word: &str) -> bool {
    let lower = word.to_lowercase();
    DENYLIST.iter().any(|denied| lower == *denied)
}
