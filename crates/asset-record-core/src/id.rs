//! Asset identifiers: `asset_` followed by the 32 lowercase hex digits of a
//! v4 UUID.

use uuid::Uuid;

pub const ASSET_ID_PREFIX: &str = "asset_";

/// Generate a fresh asset id.
pub fn generate() -> String {
  format!("{ASSET_ID_PREFIX}{}", Uuid::new_v4().simple())
}

/// Whether `id` matches `^asset_[a-f0-9]+$`.
pub fn is_valid(id: &str) -> bool {
  id.strip_prefix(ASSET_ID_PREFIX).is_some_and(|hex| {
    !hex.is_empty() && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generated_ids_match_the_pattern() {
    let id = generate();
    assert!(is_valid(&id), "{id}");
    assert_eq!(id.len(), ASSET_ID_PREFIX.len() + 32);
  }

  #[test]
  fn rejects_foreign_shapes() {
    assert!(is_valid("asset_0a1b"));
    assert!(!is_valid("asset_"));
    assert!(!is_valid("asset_0A1B"));
    assert!(!is_valid("asset_xyz"));
    assert!(!is_valid("thing_0a1b"));
    assert!(!is_valid(""));
  }
}
