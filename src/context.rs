//! Rendering retrieved items into a prompt-ready context block.

use crate::item::{ItemMetadata, KnowledgeItem};

/// Render items into the text block injected ahead of the user prompt.
///
/// Each item gets a 1-based index, a tag naming where it came from, its
/// content, and a citation line when the metadata carries sources. An empty
/// input produces an empty string so callers can skip the section entirely.
pub fn format_context(items: &[KnowledgeItem]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut block = String::from("Relevant knowledge from evidence base:\n\n");
    for (position, item) in items.iter().enumerate() {
        block.push_str(&format!(
            "{}. {} {}\n",
            position + 1,
            source_tag(item),
            item.content
        ));

        let sources = item.sources();
        if !sources.is_empty() {
            let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
            block.push_str(&format!("Sources: {}\n", names.join(", ")));
        }
        block.push('\n');
    }
    block
}

fn source_tag(item: &KnowledgeItem) -> String {
    match &item.metadata {
        ItemMetadata::Fact { .. } => "[FACT]".to_string(),
        ItemMetadata::Myth { .. } => "[MYTH]".to_string(),
        ItemMetadata::Document {
            file_name,
            chunk_index,
            total_chunks,
            ..
        } => format!(
            "[PDF: {file_name}, Chunk {}/{}]",
            chunk_index + 1,
            total_chunks
        ),
    }
}
