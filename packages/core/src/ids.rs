/// Generate a prefixed entity id, e.g. `task-V1StGXR8_Z5jdHi6B-myT`.
///
/// The prefix makes ids self-describing in logs and foreign-key columns.
pub fn entity_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_carries_prefix() {
        let id = entity_id("task");
        assert!(id.starts_with("task-"));
        assert!(id.len() > "task-".len());
    }

    #[test]
    fn test_entity_ids_are_unique() {
        assert_ne!(entity_id("team"), entity_id("team"));
    }
}
