//! Wire-level vocabulary shared by the rtlscope server and CLI.
//!
//! Everything here is transport-agnostic: capability descriptors, the invocation request,
//! the content-block result envelope and the protocol error taxonomy.

mod capability;
mod content;
mod error;

pub use capability::{
    CapabilityKind, Descriptor, ParamDefault, ParamKind, ParamSpec, PromptDescriptor,
    PromptParam, ResourceDescriptor, ToolDescriptor,
};
pub use content::{ContentBlock, InvocationResult};
pub use error::{DispatchError, ErrorEnvelope, ErrorKind};

/// Named arguments of an invocation, as received from the client.
pub type Arguments = serde_json::Map<String, serde_json::Value>;

/// A single capability invocation: resource read, tool call or prompt render.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub kind: CapabilityKind,
    pub id: String,
    pub arguments: Arguments,
}

impl InvocationRequest {
    pub fn new(kind: CapabilityKind, id: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            kind,
            id: id.into(),
            arguments,
        }
    }

    pub fn tool(id: impl Into<String>, arguments: Arguments) -> Self {
        Self::new(CapabilityKind::Tool, id, arguments)
    }

    pub fn prompt(id: impl Into<String>, arguments: Arguments) -> Self {
        Self::new(CapabilityKind::Prompt, id, arguments)
    }

    pub fn resource(id: impl Into<String>) -> Self {
        Self::new(CapabilityKind::Resource, id, Arguments::new())
    }
}
