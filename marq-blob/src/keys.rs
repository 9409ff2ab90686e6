use crate::ObjectKey;

/// Strategy for deriving asset object keys
pub trait AssetKeyStrategy: Send + Sync {
    /// Key prefix for everything one entity owns in one asset category.
    fn entity_prefix(&self, category: &str, entity_id: &str) -> String;

    /// Full key for one asset of an entity.
    fn object_key(&self, category: &str, entity_id: &str, segment: &str) -> ObjectKey;

    /// Rewrite `key` so it belongs to another entity, keeping category and
    /// trailing segment. Used when cloning an entity's assets.
    fn rekey(&self, key: &ObjectKey, entity_id: &str) -> Option<ObjectKey>;
}

/// Default key strategy: `[prefix/]category/entity_id/segment`
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyStrategy {
    container_prefix: Option<String>,
}

impl DefaultKeyStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container_prefix(prefix: impl Into<String>) -> Self {
        Self {
            container_prefix: Some(prefix.into()),
        }
    }
}

impl AssetKeyStrategy for DefaultKeyStrategy {
    fn entity_prefix(&self, category: &str, entity_id: &str) -> String {
        match &self.container_prefix {
            Some(prefix) => format!("{prefix}/{category}/{entity_id}"),
            None => format!("{category}/{entity_id}"),
        }
    }

    fn object_key(&self, category: &str, entity_id: &str, segment: &str) -> ObjectKey {
        ObjectKey::new(format!(
            "{}/{}",
            self.entity_prefix(category, entity_id),
            segment
        ))
    }

    fn rekey(&self, key: &ObjectKey, entity_id: &str) -> Option<ObjectKey> {
        // layout is [prefix/]category/entity/segment; swap the entity part
        let skip = usize::from(self.container_prefix.is_some());
        let parts: Vec<&str> = key.as_str().split('/').collect();
        if parts.len() < skip + 3 {
            return None;
        }
        let mut parts: Vec<String> = parts.into_iter().map(String::from).collect();
        parts[skip + 1] = entity_id.to_string();
        Some(ObjectKey::new(parts.join("/")))
    }
}
