//! # Category Registries
//!
//! The closed label sets shared by the enrichment and analysis stages. Each
//! registry maps a short snake_case code to a human-readable definition. The
//! same registry is used twice: rendered into the instruction text sent to the
//! remote annotator, and as the validation set that analysis steps use to
//! discard labels the annotator invented on its own.

/// A fixed enumeration of category codes and their definitions.
///
/// Entry order is meaningful: it is the order codes are rendered into
/// annotator instructions and the order rows/columns appear in reports.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRegistry {
    field: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl CategoryRegistry {
    pub const fn new(
        field: &'static str,
        entries: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { field, entries }
    }

    /// The enriched property this registry constrains.
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(code, _)| *code)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().copied()
    }

    /// Whether `code` is a member of this registry. Annotator output that
    /// fails this check is treated as noise downstream.
    pub fn contains(&self, code: &str) -> bool {
        self.entries.iter().any(|(c, _)| *c == code)
    }

    /// Comma-separated code list for interpolation into instructions.
    pub fn code_list(&self) -> String {
        self.codes().collect::<Vec<_>>().join(", ")
    }

    /// One `- code: definition` line per entry, for annotator instructions.
    pub fn definition_lines(&self) -> String {
        self.entries
            .iter()
            .map(|(code, definition)| format!("- {code}: {definition}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The primary technical domain of a forum thread.
pub const TECHNICAL_DOMAINS: CategoryRegistry = CategoryRegistry::new(
    "technicalDomain",
    &[
        (
            "server_setup",
            "Setup and configuration of the vector database server",
        ),
        (
            "ingestion",
            "Ingesting data, including collection configuration, creation and data import such as batch imports",
        ),
        (
            "queries",
            "Querying the database, including vector, keyword, and hybrid queries",
        ),
        (
            "deployment",
            "Deployment, including Docker, Kubernetes, and cloud deployment",
        ),
        (
            "security",
            "Security-related issues, including authentication, authorization, and data protection",
        ),
        (
            "integration",
            "About integrating the database with other systems or tools",
        ),
        ("others", "Others not covered by the above categories"),
    ],
);

/// The fundamental issue behind the user's question.
pub const ROOT_CAUSES: CategoryRegistry = CategoryRegistry::new(
    "rootCauseCategory",
    &[
        (
            "conceptual_misunderstanding",
            "A misunderstanding of the database's underlying concepts or specific functionality",
        ),
        (
            "incorrect_configuration",
            "Incorrect configuration of the database or its components",
        ),
        (
            "incorrect_usage",
            "Incorrect usage of the database, such as incorrect API calls or queries",
        ),
        (
            "data_modeling",
            "Issues related to data modeling, such as schema design or data relationships",
        ),
        (
            "performance",
            "Performance-related issues, such as slow queries or high resource usage",
        ),
        (
            "bug_or_limit",
            "A bug or limitation in the product, not allowing the user to do what they wanted",
        ),
        ("other", "Others not covered by the above categories"),
    ],
);

/// How the user was accessing the database when they hit their problem.
pub const ACCESS_CONTEXTS: CategoryRegistry = CategoryRegistry::new(
    "accessContext",
    &[
        ("python_client", "Using the official Python client library"),
        (
            "ts_client",
            "Using the official JavaScript/TypeScript client library",
        ),
        ("go_client", "Using the official Go/Golang client library"),
        ("java_client", "Using the official Java client library"),
        ("cloud_console", "Through the hosted cloud console"),
        (
            "llm_framework",
            "Through an LLM framework, such as LangChain or LlamaIndex",
        ),
        (
            "rest_api",
            "Using the REST API directly, including GraphQL queries",
        ),
        ("other", "Others not covered by the above categories"),
    ],
);

/// The registry constraining `field`, if that field is registry-backed.
pub fn registry_for(field: &str) -> Option<&'static CategoryRegistry> {
    match field {
        "technicalDomain" => Some(&TECHNICAL_DOMAINS),
        "rootCauseCategory" => Some(&ROOT_CAUSES),
        "accessContext" => Some(&ACCESS_CONTEXTS),
        _ => None,
    }
}
