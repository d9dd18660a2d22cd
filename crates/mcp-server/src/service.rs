//! MCP adapter: maps rmcp requests onto the [`Dispatcher`] and back.

use crate::dispatch::Dispatcher;
use rmcp::model::{
    AnnotateAble, CallToolRequestParam, CallToolResult, Content, GetPromptRequestParam,
    GetPromptResult, Implementation, ListPromptsResult, ListResourcesResult, ListToolsResult,
    PaginatedRequestParam, Prompt, RawResource, ReadResourceRequestParam, ReadResourceResult,
    Resource, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData as McpError, ServerHandler};
use rtlscope_protocol::{
    CapabilityKind, DispatchError, ErrorKind, InvocationResult, PromptDescriptor,
    ResourceDescriptor, ToolDescriptor,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;

const INSTRUCTIONS: &str = "rtlscope analyzes SystemVerilog sources and cocotb Makefiles. \
Use analyze-source and check-compatibility for interface facts, suggest-build-fixes and \
run-analysis for builds, and check-compliance for review checklists (always UNVERIFIED). \
Findings come from heuristic pattern rules, not a parser.";

#[derive(Clone)]
pub struct RtlscopeService {
    dispatcher: Dispatcher,
}

impl RtlscopeService {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

/// Protocol errors keep their structured envelope in `data`.
pub fn to_mcp_error(err: DispatchError) -> McpError {
    let message = err.to_string();
    let Some(envelope) = err.envelope() else {
        log::error!("{message}");
        return McpError::internal_error(message, None);
    };
    let data = serde_json::to_value(&envelope).ok();
    match (envelope.kind, envelope.variant) {
        (ErrorKind::UnknownCapability, CapabilityKind::Resource) => {
            McpError::resource_not_found(message, data)
        }
        _ => McpError::invalid_params(message, data),
    }
}

fn from_json<T: DeserializeOwned>(value: Value) -> Result<T, McpError> {
    serde_json::from_value(value)
        .map_err(|err| McpError::internal_error(format!("failed to build MCP payload: {err}"), None))
}

fn tool_to_mcp(tool: &ToolDescriptor) -> Tool {
    Tool::new(tool.id, tool.description, Arc::new(tool.input_schema()))
}

fn resource_to_mcp(resource: &ResourceDescriptor) -> Resource {
    let mut raw = RawResource::new(resource.id, resource.display_name);
    raw.description = Some(resource.description.to_string());
    raw.mime_type = Some(resource.media_type.to_string());
    raw.no_annotation()
}

fn prompt_to_mcp(prompt: &PromptDescriptor) -> Result<Prompt, McpError> {
    let arguments: Vec<Value> = prompt
        .parameters
        .iter()
        .map(|param| {
            json!({
                "name": param.name,
                "description": param.description,
                "required": param.required,
            })
        })
        .collect();
    from_json(json!({
        "name": prompt.id,
        "description": prompt.description,
        "arguments": arguments,
    }))
}

fn tool_result(result: InvocationResult) -> CallToolResult {
    let content = result
        .content
        .iter()
        .map(|block| Content::text(block.as_text().to_string()))
        .collect();
    if result.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for RtlscopeService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_prompts()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            let tools = self
                .dispatcher
                .registry()
                .tools()
                .iter()
                .map(tool_to_mcp)
                .collect();
            Ok(ListToolsResult::with_all_items(tools))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let arguments = request.arguments.unwrap_or_default();
            let result = self
                .dispatcher
                .call_tool(&request.name, &arguments)
                .await
                .map_err(to_mcp_error)?;
            Ok(tool_result(result))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            let resources = self
                .dispatcher
                .registry()
                .resources()
                .iter()
                .map(resource_to_mcp)
                .collect();
            Ok(ListResourcesResult::with_all_items(resources))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = request.uri;
            let result = self
                .dispatcher
                .read_resource(&uri)
                .await
                .map_err(to_mcp_error)?;
            let media_type = self
                .dispatcher
                .registry()
                .resource(&uri)
                .map(|resource| resource.media_type)
                .unwrap_or("text/plain");
            // The fallback block is prose even when the resource itself is JSON.
            let media_type = if result.is_error { "text/plain" } else { media_type };
            let contents: Vec<Value> = result
                .content
                .iter()
                .map(|block| json!({"uri": uri, "mimeType": media_type, "text": block.as_text()}))
                .collect();
            from_json(json!({ "contents": contents }))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        async move {
            let prompts = self
                .dispatcher
                .registry()
                .prompts()
                .iter()
                .map(prompt_to_mcp)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ListPromptsResult::with_all_items(prompts))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<GetPromptResult, McpError>> + Send + '_ {
        async move {
            let arguments = request.arguments.unwrap_or_default();
            let result = self
                .dispatcher
                .render_prompt(&request.name, &arguments)
                .map_err(to_mcp_error)?;
            let description = self
                .dispatcher
                .registry()
                .prompt(&request.name)
                .map(|prompt| prompt.description);
            from_json(json!({
                "description": description,
                "messages": [{
                    "role": "user",
                    "content": {"type": "text", "text": result.joined_text()},
                }],
            }))
        }
    }
}
