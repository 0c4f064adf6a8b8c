//! # Collection Schema
//!
//! The typed field layout and vectorizer configuration of the forum-post
//! collection. The original project went through one schema revision (the
//! conversation field gained a size cap plus an uncapped twin), so the
//! revisions are expressed as versioned configuration of a single builder
//! rather than duplicated definitions.

/// Data type of a collection field, in the service's own type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Text,
    Date,
    Bool,
}

impl FieldType {
    /// The wire name the schema API expects.
    pub fn wire_name(&self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::Bool => "boolean",
        }
    }
}

/// One typed field of a collection.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub description: String,
}

impl FieldSpec {
    pub fn new(name: &str, field_type: FieldType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            description: description.to_string(),
        }
    }
}

/// A named vector fed by one or more source text fields.
#[derive(Debug, Clone)]
pub struct VectorizerSpec {
    pub name: String,
    pub source_fields: Vec<String>,
}

impl VectorizerSpec {
    pub fn new(name: &str, source_fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            source_fields: source_fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// A full collection definition: name, description, fields and vectorizers.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub name: String,
    pub description: String,
    pub fields: Vec<FieldSpec>,
    pub vectorizers: Vec<VectorizerSpec>,
}

/// Schema revisions of the forum-post collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaVersion {
    /// The first layout: a single uncapped `conversation` field.
    Original,
    /// The revised layout: `conversation` is size-capped for indexing and the
    /// uncapped text lives in `conversation_full`.
    #[default]
    CappedConversation,
}

/// Builds the forum-post collection schema for the given revision.
pub fn forum_post_schema(name: &str, version: SchemaVersion) -> CollectionSchema {
    let mut fields = vec![
        FieldSpec::new(
            "user_id",
            FieldType::Int,
            "Unique identifier for the user creating the thread.",
        ),
        FieldSpec::new(
            "conversation",
            FieldType::Text,
            match version {
                SchemaVersion::Original => "Text of the entire forum conversation thread.",
                SchemaVersion::CappedConversation => {
                    "Text of the forum conversation thread, capped for indexing."
                }
            },
        ),
    ];
    if version == SchemaVersion::CappedConversation {
        fields.push(FieldSpec::new(
            "conversation_full",
            FieldType::Text,
            "Uncapped text of the entire forum conversation thread.",
        ));
    }
    fields.extend([
        FieldSpec::new(
            "date_created",
            FieldType::Date,
            "Date and time when the thread was first created.",
        ),
        FieldSpec::new(
            "has_accepted_answer",
            FieldType::Bool,
            "Whether the thread has an accepted answer.",
        ),
        FieldSpec::new("title", FieldType::Text, "Title text of the forum thread."),
        FieldSpec::new(
            "topic_id",
            FieldType::Int,
            "Unique identifier for the topic of the thread.",
        ),
    ]);

    CollectionSchema {
        name: name.to_string(),
        description: "This collection contains conversations from a support forum.".to_string(),
        fields,
        vectorizers: vec![
            VectorizerSpec::new("default", &["conversation", "title"]),
            VectorizerSpec::new("title", &["title"]),
        ],
    }
}
