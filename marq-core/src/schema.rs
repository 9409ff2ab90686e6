//! Schema descriptors.
//!
//! Every collection registers a [`SchemaDescriptor`] once, up front. Generic
//! behavior (search condition building, soft-delete filters, populate
//! targets) reads these static descriptors instead of reflecting on live
//! documents, so field kinds are facts, not guesses.

/// Conventional field names with cross-collection meaning.
pub const SOFT_DELETE_FIELD: &str = "deletedAt";
pub const STATUS_FIELD: &str = "status";
pub const ITEM_STATUS_FIELD: &str = "item_status";
pub const SLUG_FIELD: &str = "slug";

/// Declared kind of a document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain string value; a search candidate.
    String,
    /// Single reference to a document in `target`.
    Reference { target: String },
    /// Array of references to documents in `target`.
    ReferenceList { target: String },
    /// Anything else (numbers, dates, nested objects, image details).
    Other,
}

/// One declared field of a collection, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Reference {
                target: target.into(),
            },
        )
    }

    pub fn reference_list(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::ReferenceList {
                target: target.into(),
            },
        )
    }

    pub fn other(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Other)
    }
}

/// Registration-time description of one collection.
///
/// Field order is significant: result-text fallback walks fields in
/// declaration order.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    collection: String,
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(collection: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            collection: collection.into(),
            fields,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Names of all string-typed fields, in declaration order.
    pub fn string_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::String)
            .map(|f| f.name.as_str())
    }

    /// Whether the soft-delete convention applies to this collection.
    pub fn soft_deletes(&self) -> bool {
        self.has_field(SOFT_DELETE_FIELD)
    }

    /// Draft-status fields present on this schema, if any.
    pub fn draft_status_fields(&self) -> Vec<&str> {
        [STATUS_FIELD, ITEM_STATUS_FIELD]
            .into_iter()
            .filter(|name| self.has_field(name))
            .collect()
    }

    /// The reference field search results should populate, if any.
    ///
    /// `category` takes priority over `season`; the two are mutually
    /// exclusive in practice.
    pub fn populate_target(&self) -> Option<&FieldDescriptor> {
        ["category", "season"].into_iter().find_map(|name| {
            self.fields.iter().find(|f| {
                f.name == name
                    && matches!(
                        f.kind,
                        FieldKind::Reference { .. } | FieldKind::ReferenceList { .. }
                    )
            })
        })
    }

    /// Reference target collection of `field`, if it is a reference.
    pub fn reference_target(&self, field: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name == field).and_then(|f| match &f.kind {
            FieldKind::Reference { target } | FieldKind::ReferenceList { target } => {
                Some(target.as_str())
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn podcast_schema() -> SchemaDescriptor {
        SchemaDescriptor::new(
            "podcasts",
            vec![
                FieldDescriptor::string("title"),
                FieldDescriptor::string("description"),
                FieldDescriptor::other(SOFT_DELETE_FIELD),
                FieldDescriptor::string(STATUS_FIELD),
                FieldDescriptor::reference("season", "seasons"),
            ],
        )
    }

    #[test]
    fn string_fields_keep_declaration_order() {
        let schema = podcast_schema();
        let fields: Vec<_> = schema.string_fields().collect();
        assert_eq!(fields, vec!["title", "description", "status"]);
    }

    #[test]
    fn soft_delete_and_draft_detection() {
        let schema = podcast_schema();
        assert!(schema.soft_deletes());
        assert_eq!(schema.draft_status_fields(), vec![STATUS_FIELD]);
    }

    #[test]
    fn category_populate_wins_over_season() {
        let schema = SchemaDescriptor::new(
            "coins",
            vec![
                FieldDescriptor::string("name"),
                FieldDescriptor::reference("season", "seasons"),
                FieldDescriptor::reference("category", "categories"),
            ],
        );
        assert_eq!(schema.populate_target().unwrap().name, "category");
    }

    #[test]
    fn non_reference_category_is_not_a_populate_target() {
        let schema = SchemaDescriptor::new(
            "pages",
            vec![
                FieldDescriptor::string("title"),
                FieldDescriptor::string("category"),
            ],
        );
        assert!(schema.populate_target().is_none());
    }
}
