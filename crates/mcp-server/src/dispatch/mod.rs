//! Request validation and routing.
//!
//! ```text
//! InvocationRequest
//!     │
//!     ├─ registry lookup ──── unknown id ────────────> UnknownCapability
//!     ├─ argument check ───── bad or missing arg ────> InvalidArguments
//!     ├─ handler ──────────── collaborator failure ──> is_error content block
//!     └─ InvocationResult
//! ```
//!
//! Nothing is cached between requests.

mod prompts;
mod tools;
mod validate;

pub use validate::{validate_prompt_args, validate_tool_args, ValidatedArgs};

use crate::config::ServerConfig;
use crate::content::ContentResolver;
use crate::registry::Registry;
use rtlscope_protocol::{
    Arguments, CapabilityKind, Descriptor, DispatchError, InvocationRequest, InvocationResult,
};
use rtlscope_runner::{ProcessRunner, TokioProcessRunner};
use std::sync::Arc;

#[derive(Clone)]
pub struct Dispatcher {
    registry: &'static Registry,
    config: Arc<ServerConfig>,
    runner: Arc<dyn ProcessRunner>,
    resolver: Arc<ContentResolver>,
}

impl Dispatcher {
    pub fn new(config: ServerConfig) -> Self {
        let runner = TokioProcessRunner::with_capture_limit(config.max_capture_bytes);
        Self::with_runner(config, Arc::new(runner))
    }

    pub fn with_runner(config: ServerConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let registry = Registry::builtin();
        let resolver = ContentResolver::new(config.docs_dir.clone(), registry);
        Self {
            registry,
            config: Arc::new(config),
            runner,
            resolver: Arc::new(resolver),
        }
    }

    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub(crate) fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    pub fn list(&self, kind: CapabilityKind) -> Vec<Descriptor<'static>> {
        self.registry.list(kind)
    }

    pub async fn handle(&self, request: &InvocationRequest) -> Result<InvocationResult, DispatchError> {
        match request.kind {
            CapabilityKind::Resource => self.read_resource(&request.id).await,
            CapabilityKind::Tool => self.call_tool(&request.id, &request.arguments).await,
            CapabilityKind::Prompt => self.render_prompt(&request.id, &request.arguments),
        }
    }

    pub async fn read_resource(&self, id: &str) -> Result<InvocationResult, DispatchError> {
        log::debug!("resource read {id}");
        if self.registry.resource(id).is_none() {
            return Err(DispatchError::unknown(CapabilityKind::Resource, id));
        }
        self.resolver.resolve(id).await
    }

    pub async fn call_tool(
        &self,
        id: &str,
        arguments: &Arguments,
    ) -> Result<InvocationResult, DispatchError> {
        log::debug!("tool call {id}");
        let tool = self
            .registry
            .tool(id)
            .ok_or_else(|| DispatchError::unknown(CapabilityKind::Tool, id))?;
        let args = validate_tool_args(tool, arguments)?;
        tools::invoke(self, tool, &args).await
    }

    pub fn render_prompt(
        &self,
        id: &str,
        arguments: &Arguments,
    ) -> Result<InvocationResult, DispatchError> {
        log::debug!("prompt render {id}");
        let prompt = self
            .registry
            .prompt(id)
            .ok_or_else(|| DispatchError::unknown(CapabilityKind::Prompt, id))?;
        let args = validate_prompt_args(prompt, arguments)?;
        prompts::render(prompt, &args).map(InvocationResult::text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ids;
    use crate::test_support::RecordingRunner;
    use rtlscope_protocol::ErrorKind;
    use serde_json::json;

    fn dispatcher_with(runner: Arc<RecordingRunner>, docs_dir: &std::path::Path) -> Dispatcher {
        let config = ServerConfig {
            docs_dir: docs_dir.to_path_buf(),
            ..ServerConfig::default()
        };
        Dispatcher::with_runner(config, runner)
    }

    fn tool_request(id: &str, args: serde_json::Value) -> InvocationRequest {
        InvocationRequest::tool(id, args.as_object().cloned().unwrap_or_default())
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected_without_spawning() {
        let runner = Arc::new(RecordingRunner::default());
        let tmp = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with(runner.clone(), tmp.path());

        let err = dispatcher
            .handle(&tool_request("run-everything", json!({"analysisTarget": "."})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::UnknownCapability));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_required_parameter_is_rejected_without_spawning() {
        let runner = Arc::new(RecordingRunner::default());
        let tmp = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with(runner.clone(), tmp.path());

        let err = dispatcher
            .handle(&tool_request(ids::RUN_ANALYSIS, json!({"mode": "sim"})))
            .await
            .unwrap_err();
        let envelope = err.envelope().unwrap();
        assert_eq!(envelope.kind, ErrorKind::InvalidArguments);
        assert_eq!(envelope.parameter.as_deref(), Some("analysisTarget"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn run_analysis_passes_mode_as_make_target() {
        let runner = Arc::new(RecordingRunner::default());
        let tmp = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with(runner.clone(), tmp.path());
        let target = tmp.path().to_string_lossy().to_string();

        let result = dispatcher
            .handle(&tool_request(
                ids::RUN_ANALYSIS,
                json!({"analysisTarget": target, "mode": "lint"}),
            ))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert!(result.joined_text().contains("exited with status 0"));
        assert!(result.joined_text().contains("build ok"));

        dispatcher
            .handle(&tool_request(ids::RUN_ANALYSIS, json!({"analysisTarget": target})))
            .await
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "make");
        assert_eq!(calls[0].args, vec!["lint".to_string()]);
        assert_eq!(calls[0].working_dir, tmp.path());
        assert!(calls[1].args.is_empty());
    }

    #[tokio::test]
    async fn failed_build_becomes_an_error_block() {
        let runner = Arc::new(RecordingRunner::failing("make: *** No rule to make target 'sim'."));
        let tmp = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with(runner, tmp.path());

        let result = dispatcher
            .handle(&tool_request(
                ids::RUN_ANALYSIS,
                json!({"analysisTarget": tmp.path().to_string_lossy(), "mode": "sim"}),
            ))
            .await
            .unwrap();
        assert!(result.is_error);
        assert_eq!(result.content.len(), 1);
        let text = result.joined_text();
        assert!(text.contains("exited with status 2"));
        assert!(text.contains("No rule to make target 'sim'"));
    }

    #[tokio::test]
    async fn suggest_build_fixes_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let makefile = tmp.path().join("Makefile");
        std::fs::write(&makefile, "SIM=verilator\n").unwrap();
        let dispatcher = dispatcher_with(Arc::new(RecordingRunner::default()), tmp.path());

        let result = dispatcher
            .handle(&tool_request(
                ids::SUGGEST_BUILD_FIXES,
                json!({"buildScriptPath": makefile.to_string_lossy()}),
            ))
            .await
            .unwrap();
        let text = result.joined_text();

        assert!(!result.is_error);
        assert!(text.contains("Simulator: verilator"));
        assert!(text.contains("- TOPLEVEL_LANG not specified"));
        assert!(text.contains("- VERILOG_SOURCES not specified"));
        assert!(!text.contains("Simulator not specified"));
        assert!(text.contains("\nTOPLEVEL_LANG ?= verilog\n"));
        assert!(text.contains("\nVERILOG_SOURCES += $(PWD)/<toplevel>.sv\n"));
    }

    #[tokio::test]
    async fn unreadable_source_is_an_error_block_not_a_protocol_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with(Arc::new(RecordingRunner::default()), tmp.path());
        let missing = tmp.path().join("missing.sv");

        let result = dispatcher
            .handle(&tool_request(
                ids::ANALYZE_SOURCE,
                json!({"filePath": missing.to_string_lossy()}),
            ))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.joined_text().starts_with("Could not read "));
    }

    #[tokio::test]
    async fn analyze_source_resolves_packages_from_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("bus_pkg.sv"),
            "package bus_pkg; typedef logic [7:0] byte_t; endpackage\n",
        )
        .unwrap();
        let top = tmp.path().join("top.sv");
        std::fs::write(
            &top,
            "module top(input logic clk, output logic ready);\n  import bus_pkg::*;\n  import dma_pkg::*;\nendmodule\n",
        )
        .unwrap();
        let dispatcher = dispatcher_with(Arc::new(RecordingRunner::default()), tmp.path());

        let result = dispatcher
            .handle(&tool_request(
                ids::ANALYZE_SOURCE,
                json!({"filePath": top.to_string_lossy()}),
            ))
            .await
            .unwrap();
        let text = result.joined_text();
        assert!(text.contains("Modules: top"));
        assert!(text.contains("Ports (2): clk, ready"));
        assert!(text.contains("Dependencies (2): bus_pkg, dma_pkg"));
        assert!(text.contains("Unresolved dependencies: dma_pkg\n"));

        let result = dispatcher
            .handle(&tool_request(
                ids::ANALYZE_SOURCE,
                json!({"filePath": top.to_string_lossy(), "checkDependencies": false}),
            ))
            .await
            .unwrap();
        assert!(!result.joined_text().contains("Unresolved"));
    }

    #[tokio::test]
    async fn check_compatibility_reports_port_differences() {
        let tmp = tempfile::tempdir().unwrap();
        let left = tmp.path().join("a.sv");
        let right = tmp.path().join("b.sv");
        std::fs::write(&left, "module a(input clk, input rst_n, output q); endmodule").unwrap();
        std::fs::write(&right, "module b(input clk, output q); endmodule").unwrap();
        let dispatcher = dispatcher_with(Arc::new(RecordingRunner::default()), tmp.path());

        let result = dispatcher
            .handle(&tool_request(
                ids::CHECK_COMPATIBILITY,
                json!({"leftFile": left.to_string_lossy(), "rightFile": right.to_string_lossy()}),
            ))
            .await
            .unwrap();
        let text = result.joined_text();
        assert!(text.contains(&format!("Ports only in {}: rst_n", left.display())));
        assert!(text.contains("Shared ports: clk, q"));
        assert!(text.contains("Verdict: port sets differ"));
    }

    #[tokio::test]
    async fn compliance_items_are_unverified() {
        let tmp = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with(Arc::new(RecordingRunner::default()), tmp.path());

        let result = dispatcher
            .handle(&tool_request(
                ids::CHECK_COMPLIANCE,
                json!({"requirementCategory": "reset"}),
            ))
            .await
            .unwrap();
        let text = result.joined_text();
        assert!(text.contains("- [UNVERIFIED] RST-1"));
        assert!(text.contains("not derived from analysis"));
    }

    #[tokio::test]
    async fn unknown_resource_and_missing_doc_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with(Arc::new(RecordingRunner::default()), tmp.path());

        let err = dispatcher
            .handle(&InvocationRequest::resource("rtlscope://docs/nope"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::UnknownCapability));

        let result = dispatcher
            .handle(&InvocationRequest::resource(ids::CODING_GUIDELINES))
            .await
            .unwrap();
        assert_eq!(result.content.len(), 1);
        assert!(result.joined_text().contains("is not available"));
    }

    #[tokio::test]
    async fn prompts_render_and_validate() {
        let tmp = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with(Arc::new(RecordingRunner::default()), tmp.path());

        let result = dispatcher
            .handle(&InvocationRequest::prompt(
                ids::REVIEW_MODULE,
                json!({"moduleName": "alu", "focus": "timing"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            ))
            .await
            .unwrap();
        assert!(result.joined_text().contains("`alu` with a focus on timing"));

        let err = dispatcher
            .handle(&InvocationRequest::prompt(ids::REVIEW_MODULE, Arguments::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidArguments));

        let err = dispatcher
            .handle(&InvocationRequest::prompt("summarize", Arguments::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::UnknownCapability));
    }
}
