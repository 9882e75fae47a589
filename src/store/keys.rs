/// Key layout for the Fjall partitions
///
/// Partition structure:
/// - `recipes`: recipe:{id} -> Recipe (JSON)
/// - `titles`: title:{title} -> id (string), the unique index on `title`
use crate::recipes::RecipeId;

const RECIPE_PREFIX: &str = "recipe:";
const TITLE_PREFIX: &str = "title:";

/// Encode a recipe key: recipe:{id}
pub fn encode_recipe_key(id: &RecipeId) -> Vec<u8> {
    format!("{RECIPE_PREFIX}{id}").into_bytes()
}

/// Decode a recipe key: recipe:{id} -> id
pub fn decode_recipe_key(key: &[u8]) -> Option<RecipeId> {
    let key_str = std::str::from_utf8(key).ok()?;
    key_str.strip_prefix(RECIPE_PREFIX)?.parse().ok()
}

/// Encode a title index key: title:{title}
pub fn encode_title_key(title: &str) -> Vec<u8> {
    format!("{TITLE_PREFIX}{title}").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_key_encoding() {
        let id: RecipeId = "0192f6d2-7c3a-7000-8000-000000000001".parse().unwrap();
        let key = encode_recipe_key(&id);
        assert_eq!(key, b"recipe:0192f6d2-7c3a-7000-8000-000000000001");
        assert_eq!(decode_recipe_key(&key), Some(id));
    }

    #[test]
    fn test_decode_rejects_foreign_keys() {
        assert_eq!(decode_recipe_key(b"title:Pancakes"), None);
        assert_eq!(decode_recipe_key(b"recipe:not-a-uuid"), None);
    }

    #[test]
    fn test_title_key_is_exact() {
        assert_eq!(encode_title_key("Pancakes"), b"title:Pancakes");
        assert_ne!(encode_title_key("Pancakes"), encode_title_key("pancakes"));
    }
}
