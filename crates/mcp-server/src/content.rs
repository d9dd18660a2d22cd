use crate::compliance;
use crate::registry::{ids, Registry};
use rtlscope_protocol::{CapabilityKind, DispatchError, InvocationResult};
use serde_json::json;
use std::path::PathBuf;

/// Where a resource's bytes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceSource {
    /// A UTF-8 file under the docs directory.
    DocFile(&'static str),
    ComplianceChecklists,
    Catalog,
}

fn source_for(id: &str) -> Option<ResourceSource> {
    match id {
        ids::CODING_GUIDELINES => Some(ResourceSource::DocFile("coding-guidelines.md")),
        ids::BUILD_REFERENCE => Some(ResourceSource::DocFile("build-reference.md")),
        ids::COMPLIANCE_CHECKLISTS => Some(ResourceSource::ComplianceChecklists),
        ids::CATALOG => Some(ResourceSource::Catalog),
        _ => None,
    }
}

/// Maps resource ids to documents on disk or synthesized in memory.
#[derive(Debug, Clone)]
pub struct ContentResolver {
    docs_dir: PathBuf,
    registry: &'static Registry,
}

impl ContentResolver {
    pub fn new(docs_dir: impl Into<PathBuf>, registry: &'static Registry) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            registry,
        }
    }

    /// Resolve a registered resource id.
    ///
    /// An unreadable backing file yields a single fallback block flagged as an error rather
    /// than a protocol error. An id with no content source is a wiring fault.
    pub async fn resolve(&self, id: &str) -> Result<InvocationResult, DispatchError> {
        let source = source_for(id).ok_or_else(|| {
            DispatchError::internal(format!("no content source bound to resource `{id}`"))
        })?;

        match source {
            ResourceSource::DocFile(name) => {
                let path = self.docs_dir.join(name);
                match tokio::fs::read_to_string(&path).await {
                    Ok(text) => Ok(InvocationResult::text(text)),
                    Err(err) => {
                        log::warn!("resource {id} unavailable: {}: {err}", path.display());
                        Ok(InvocationResult::failure(format!(
                            "Resource {id} is not available: could not read {} ({err}).",
                            path.display()
                        )))
                    }
                }
            }
            ResourceSource::ComplianceChecklists => {
                Ok(InvocationResult::text(compliance::render_all()))
            }
            ResourceSource::Catalog => self.catalog().map(InvocationResult::text),
        }
    }

    fn catalog(&self) -> Result<String, DispatchError> {
        let registry = self.registry;
        let document = json!({
            "resources": registry.list(CapabilityKind::Resource),
            "tools": registry.list(CapabilityKind::Tool),
            "prompts": registry.list(CapabilityKind::Prompt),
        });
        serde_json::to_string_pretty(&document)
            .map_err(|err| DispatchError::internal(format!("failed to render catalog: {err}")))
    }
}
