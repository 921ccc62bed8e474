//! Knowledge source loading and the domain catalogue.
//!
//! Knowledge sources are flat `site,domain,description` records loaded from a
//! CSV table at startup. The catalogue groups them by domain in first-seen
//! order and renders the listing that seeds the agent's instructions.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("Failed to read knowledge sources from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Missing required columns: {0:?}")]
    MissingColumns(Vec<String>),
}

/// A single curated documentation site.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeSource {
    pub site: String,
    pub domain: String,
    pub description: String,
}

const REQUIRED_COLUMNS: [&str; 3] = ["site", "domain", "description"];

/// Load and validate knowledge sources from a CSV file.
///
/// The header row must contain `site`, `domain` and `description`; a missing
/// column is a startup error, not something to paper over at request time.
pub fn load_knowledge_sources(path: impl AsRef<Path>) -> Result<Vec<KnowledgeSource>, CatalogueError> {
    let path_str = path.as_ref().display().to_string();
    let wrap = |source: csv::Error| CatalogueError::Read {
        path: path_str.clone(),
        source,
    };

    let mut reader = csv::Reader::from_path(path.as_ref()).map_err(wrap)?;

    let headers = reader.headers().map_err(wrap)?;
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CatalogueError::MissingColumns(missing));
    }

    let mut sources = Vec::new();
    for record in reader.deserialize() {
        let source: KnowledgeSource = record.map_err(wrap)?;
        sources.push(source);
    }

    Ok(sources)
}

/// Read-only grouped view of the knowledge sources.
///
/// Built once per startup and shared immutably by every controller; swapping
/// the source table means restarting, not mutating.
#[derive(Debug, Clone)]
pub struct DomainCatalogue {
    /// Markdown listing injected into the system prompt
    pub text: String,
    /// Distinct domains in first-occurrence order
    pub domains: Vec<String>,
}

impl DomainCatalogue {
    /// Group sources by domain in first-occurrence order and render the
    /// catalogue text: one heading per domain, one bullet per site.
    pub fn build(sources: &[KnowledgeSource]) -> Self {
        let mut domains: Vec<String> = Vec::new();
        let mut groups: Vec<Vec<&KnowledgeSource>> = Vec::new();

        for source in sources {
            match domains.iter().position(|d| *d == source.domain) {
                Some(idx) => groups[idx].push(source),
                None => {
                    domains.push(source.domain.clone());
                    groups.push(vec![source]);
                }
            }
        }

        let mut text = String::new();
        for (domain, group) in domains.iter().zip(&groups) {
            text.push_str(&format!("\n## {}\n\n", domain));
            for source in group {
                text.push_str(&format!("- {}: {}\n", source.site, source.description));
            }
            text.push('\n');
        }

        Self { text, domains }
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
