//! # Standard Enrichment Operations
//!
//! The seven annotations applied to every forum thread. The categorical ones
//! interpolate their registry's codes and definitions into the instruction,
//! and the same registry later validates what the annotator actually
//! returned.

use super::{EnrichKind, EnrichmentOperation};
use crate::categories::{CategoryRegistry, ACCESS_CONTEXTS, ROOT_CAUSES, TECHNICAL_DOMAINS};

fn registry_instruction(registry: &CategoryRegistry, question: &str, example: &str) -> String {
    format!(
        "{question} The answer must be one of the following categories:\n\
         {codes}\n\n\
         The definitions of the categories are as follows:\n\
         {definitions}\n\
         {example}\n\n\
         Remember that the answer must be one of these categories: {codes}",
        codes = registry.code_list(),
        definitions = registry.definition_lines(),
    )
}

pub fn technical_complexity() -> EnrichmentOperation {
    EnrichmentOperation::append_property(
        "technicalComplexity",
        EnrichKind::Int,
        &["conversation"],
        "Rate the technical complexity of the user's forum post query \
         on a scale from 1 to 5, where 1 is very simple and 5 is very complex.",
    )
}

pub fn technical_domain() -> EnrichmentOperation {
    EnrichmentOperation::append_property(
        "technicalDomain",
        EnrichKind::Text,
        &["conversation", "title"],
        registry_instruction(
            &TECHNICAL_DOMAINS,
            "Identify the primary technical domain of the user's forum post query.",
            "",
        ),
    )
}

pub fn root_cause_category() -> EnrichmentOperation {
    EnrichmentOperation::append_property(
        "rootCauseCategory",
        EnrichKind::Text,
        &["conversation", "title"],
        registry_instruction(
            &ROOT_CAUSES,
            "Based on the text, what was the fundamental issue behind the user's question?",
            "For example, if the user was confused about how to use a specific feature, \
             the answer should be \"conceptual_misunderstanding\".",
        ),
    )
}

pub fn access_context() -> EnrichmentOperation {
    EnrichmentOperation::append_property(
        "accessContext",
        EnrichKind::Text,
        &["conversation", "title"],
        registry_instruction(
            &ACCESS_CONTEXTS,
            "Based on the text, how was the user trying to access the database?",
            "For example, if the user was using the Python client library, \
             the answer should be \"python_client\".",
        ),
    )
}

pub fn caused_by_outdated_stack() -> EnrichmentOperation {
    EnrichmentOperation::append_property(
        "causedByOutdatedStack",
        EnrichKind::Bool,
        &["conversation", "title"],
        "Based on the text, was the user's question caused by an outdated version \
         of the database or its components, such as the client library being used?",
    )
}

pub fn is_documentation_gap() -> EnrichmentOperation {
    EnrichmentOperation::append_property(
        "isDocumentationGap",
        EnrichKind::Bool,
        &["conversation", "title"],
        "Based on the text, identify whether the user's question was caused by a lack \
         of documentation or unclear instructions.\n\n\
         This does not include cases where the documentation exists, and the user did \
         not find it, or did not read it. This also does not include cases where there \
         was a bug in the code, or the user was using an outdated version of the \
         database or its components.\n\n\
         Only mark this as true if the user was asking about a feature or an aspect \
         that is not covered by the documentation, or the documentation was unclear \
         or incorrect.",
    )
}

pub fn summary() -> EnrichmentOperation {
    EnrichmentOperation::append_property(
        "summary",
        EnrichKind::Text,
        &["conversation", "title"],
        "Summarize the user's question and the solution provided in a few sentences, \
         like this:\n\
         {\n\
             \"question\": \"<SUMMARY OF THE QUESTION>\",\n\
             \"solution\": \"<SUMMARY OF THE SOLUTION>\"\n\
         }\n\n\
         If there was no solution provided, set \"solution\": null.",
    )
}

/// The full standard operation set, in the order they were declared in the
/// original pipeline.
pub fn standard_operations() -> Vec<EnrichmentOperation> {
    vec![
        technical_complexity(),
        technical_domain(),
        root_cause_category(),
        access_context(),
        caused_by_outdated_stack(),
        is_documentation_gap(),
        summary(),
    ]
}
