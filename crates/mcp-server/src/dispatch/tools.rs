use super::validate::ValidatedArgs;
use super::Dispatcher;
use crate::compliance::{self, RequirementCategory};
use crate::registry::ids;
use rtlscope_extract::{
    analyze_build_script, compare_interfaces, extract, BuildScriptReport, ExtractedFacts,
    InterfaceDiff,
};
use rtlscope_protocol::{DispatchError, InvocationResult, ToolDescriptor};
use rtlscope_runner::{CommandSpec, ProcessOutcome, RunError};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SOURCE_EXTENSIONS: &[&str] = &["sv", "svh", "v"];

/// Collaborator failures. These become an `is_error` content block, never a protocol error.
#[derive(Error, Debug)]
enum HandlerError {
    #[error("Could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Build run failed: {0}")]
    Run(#[source] RunError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl HandlerError {
    fn report(&self) -> String {
        let mut out = self.to_string();
        if let Self::Run(source) = self {
            push_stream(&mut out, "stdout", source.stdout());
            push_stream(&mut out, "stderr", source.stderr());
            if source.truncated() {
                out.push_str("\n\n(output truncated)");
            }
        }
        out
    }
}

/// Route a validated tool call to its handler.
pub(super) async fn invoke(
    dispatcher: &Dispatcher,
    tool: &ToolDescriptor,
    args: &ValidatedArgs,
) -> Result<InvocationResult, DispatchError> {
    let outcome = match tool.id {
        ids::RUN_ANALYSIS => run_analysis(dispatcher, args).await,
        ids::ANALYZE_SOURCE => analyze_source(args).await,
        ids::CHECK_COMPATIBILITY => check_compatibility(args).await,
        ids::SUGGEST_BUILD_FIXES => suggest_build_fixes(args).await,
        ids::CHECK_COMPLIANCE => check_compliance(args),
        other => {
            return Err(DispatchError::internal(format!(
                "no handler bound to tool `{other}`"
            )))
        }
    };

    match outcome {
        Ok(text) => Ok(InvocationResult::text(text)),
        Err(HandlerError::Dispatch(err)) => Err(err),
        Err(err) => {
            log::warn!("tool {} failed: {err}", tool.id);
            Ok(InvocationResult::failure(err.report()))
        }
    }
}

async fn read_text(path: &Path) -> Result<String, HandlerError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| HandlerError::Read {
            path: path.to_path_buf(),
            source,
        })
}

async fn run_analysis(dispatcher: &Dispatcher, args: &ValidatedArgs) -> Result<String, HandlerError> {
    let target = PathBuf::from(args.required_str("analysisTarget")?);
    let mode = args.str("mode").unwrap_or("all");
    let config = dispatcher.config();

    let mut spec = CommandSpec::new(&config.make_program, &target).timeout(config.run_timeout());
    if mode != "all" {
        spec = spec.arg(mode);
    }

    let outcome = dispatcher
        .runner()
        .run(&spec)
        .await
        .map_err(HandlerError::Run)?;
    Ok(render_run(&spec, &outcome))
}

fn render_run(spec: &CommandSpec, outcome: &ProcessOutcome) -> String {
    let mut out = format!(
        "`{spec}` in {} exited with status {}.",
        spec.working_dir.display(),
        outcome.exit_code
    );
    push_stream(&mut out, "stdout", &outcome.stdout);
    push_stream(&mut out, "stderr", &outcome.stderr);
    if outcome.truncated {
        out.push_str("\n\n(output truncated)");
    }
    out
}

fn push_stream(out: &mut String, label: &str, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    let _ = write!(out, "\n\n--- {label} ---\n{}", text.trim_end());
}

fn join_or_none(items: &BTreeSet<String>) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

async fn analyze_source(args: &ValidatedArgs) -> Result<String, HandlerError> {
    let path = PathBuf::from(args.required_str("filePath")?);
    let text = read_text(&path).await?;
    let facts = extract(&text);

    let unresolved = if args.bool("checkDependencies").unwrap_or(true) {
        Some(unresolved_dependencies(&path, &facts).await)
    } else {
        None
    };
    Ok(render_facts(&path, &facts, unresolved.as_ref()))
}

/// Imported packages declared neither in the file itself nor in a sibling source file.
async fn unresolved_dependencies(path: &Path, facts: &ExtractedFacts) -> BTreeSet<String> {
    let mut missing: BTreeSet<String> = facts
        .dependencies
        .difference(&facts.modules)
        .cloned()
        .collect();
    if missing.is_empty() {
        return missing;
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(err) => {
            log::debug!("cannot list {} for package lookup: {err}", dir.display());
            return missing;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let sibling = entry.path();
        let is_source = sibling
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
        if !is_source || sibling.file_name() == path.file_name() {
            continue;
        }
        match tokio::fs::read_to_string(&sibling).await {
            Ok(text) => {
                let declared = extract(&text).modules;
                missing.retain(|package| !declared.contains(package));
            }
            Err(err) => log::debug!("skipping {}: {err}", sibling.display()),
        }
        if missing.is_empty() {
            break;
        }
    }
    missing
}

fn render_facts(path: &Path, facts: &ExtractedFacts, unresolved: Option<&BTreeSet<String>>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Analysis of {}", path.display());
    let _ = writeln!(out, "Modules: {}", join_or_none(&facts.modules));
    let _ = writeln!(out, "Ports ({}): {}", facts.ports.len(), join_or_none(&facts.ports));
    let _ = writeln!(
        out,
        "Signals ({}): {}",
        facts.named_signals.len(),
        join_or_none(&facts.named_signals)
    );
    let _ = writeln!(
        out,
        "Dependencies ({}): {}",
        facts.dependencies.len(),
        join_or_none(&facts.dependencies)
    );
    if let Some(missing) = unresolved {
        let _ = writeln!(out, "Unresolved dependencies: {}", join_or_none(missing));
    }
    push_issues(&mut out, &facts.issues);
    out
}

fn push_issues(out: &mut String, issues: &[String]) {
    if issues.is_empty() {
        out.push_str("Issues: none\n");
        return;
    }
    out.push_str("Issues:\n");
    for issue in issues {
        let _ = writeln!(out, "- {issue}");
    }
}

async fn check_compatibility(args: &ValidatedArgs) -> Result<String, HandlerError> {
    let left_path = PathBuf::from(args.required_str("leftFile")?);
    let right_path = PathBuf::from(args.required_str("rightFile")?);
    let left = extract(&read_text(&left_path).await?);
    let right = extract(&read_text(&right_path).await?);
    let diff = compare_interfaces(&left, &right);
    Ok(render_diff(&left_path, &right_path, &diff))
}

fn render_diff(left: &Path, right: &Path, diff: &InterfaceDiff) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Interface comparison: {} vs {}",
        left.display(),
        right.display()
    );
    let _ = writeln!(out, "Ports only in {}: {}", left.display(), join_or_none(&diff.only_left));
    let _ = writeln!(out, "Ports only in {}: {}", right.display(), join_or_none(&diff.only_right));
    let _ = writeln!(out, "Shared ports: {}", join_or_none(&diff.shared));
    let _ = writeln!(
        out,
        "Dependencies only in {}: {}",
        left.display(),
        join_or_none(&diff.dependencies_only_left)
    );
    let _ = writeln!(
        out,
        "Dependencies only in {}: {}",
        right.display(),
        join_or_none(&diff.dependencies_only_right)
    );
    let verdict = if diff.ports_match() {
        "port sets match"
    } else {
        "port sets differ"
    };
    let _ = writeln!(out, "Verdict: {verdict}");
    out
}

async fn suggest_build_fixes(args: &ValidatedArgs) -> Result<String, HandlerError> {
    let path = PathBuf::from(args.required_str("buildScriptPath")?);
    let text = read_text(&path).await?;
    let report = analyze_build_script(&text);
    Ok(render_build_report(&path, &report))
}

fn render_build_report(path: &Path, report: &BuildScriptReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Build script: {}", path.display());
    let _ = writeln!(out, "Simulator: {}", report.simulator_name);
    let list = |items: &[String]| {
        if items.is_empty() {
            "(none)".to_string()
        } else {
            items.join(", ")
        }
    };
    let _ = writeln!(out, "Targets: {}", list(report.targets.as_slice()));
    let _ = writeln!(out, "Includes: {}", list(report.dependencies.as_slice()));
    push_issues(&mut out, &report.issues);

    if report.failed_checks.is_empty() {
        out.push_str("\nNo fixes needed: all build checks passed.\n");
        return out;
    }
    out.push_str("\nRecommended additions:\n");
    for check in &report.failed_checks {
        let _ = writeln!(out, "{}", check.suggested_line());
    }
    out
}

fn check_compliance(args: &ValidatedArgs) -> Result<String, HandlerError> {
    let raw = args.required_str("requirementCategory")?;
    let category = RequirementCategory::parse(raw).ok_or_else(|| {
        DispatchError::internal(format!("validated category `{raw}` has no checklist"))
    })?;
    Ok(compliance::render_checklist(category))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_report_lists_recommendations_in_check_order() {
        let report = analyze_build_script("SIM ?= verilator\n");
        let text = render_build_report(Path::new("Makefile"), &report);

        assert!(text.contains("Simulator: verilator"));
        let tail = text.split("Recommended additions:\n").nth(1).unwrap();
        let lines: Vec<_> = tail.lines().collect();
        assert_eq!(
            lines,
            vec![
                "TOPLEVEL_LANG ?= verilog",
                "VERILOG_SOURCES += $(PWD)/<toplevel>.sv"
            ]
        );
    }

    #[test]
    fn clean_build_script_needs_no_fixes() {
        let report = analyze_build_script(
            "SIM ?= icarus\nTOPLEVEL_LANG ?= verilog\nVERILOG_SOURCES += top.sv\n",
        );
        let text = render_build_report(Path::new("Makefile"), &report);
        assert!(text.contains("Issues: none"));
        assert!(text.contains("No fixes needed"));
    }

    #[test]
    fn run_failure_report_carries_status_and_stderr() {
        let err = HandlerError::Run(RunError::NonZeroExit {
            command: "make sim".to_string(),
            code: Some(2),
            stdout: String::new(),
            stderr: "No rule to make target 'sim'\n".to_string(),
            truncated: false,
        });
        let report = err.report();
        assert!(report.starts_with("Build run failed: `make sim` exited with status 2"));
        assert!(report.contains("--- stderr ---\nNo rule to make target 'sim'"));
        assert!(!report.contains("--- stdout ---"));
        assert!(!report.contains("(output truncated)"));
    }

    #[test]
    fn timed_out_report_notes_truncated_output() {
        let err = HandlerError::Run(RunError::TimedOut {
            command: "make sim".to_string(),
            after: std::time::Duration::from_secs(600),
            stdout: "x".repeat(64),
            stderr: String::new(),
            truncated: true,
        });
        let report = err.report();
        assert!(report.starts_with("Build run failed: `make sim` timed out after 600s"));
        assert!(report.contains("--- stdout ---"));
        assert!(report.ends_with("\n\n(output truncated)"));
    }

    #[test]
    fn facts_render_unresolved_only_when_checked() {
        let facts = extract("module top(input logic clk); import bus_pkg::*; endmodule");
        let missing: BTreeSet<String> = ["bus_pkg".to_string()].into();

        let checked = render_facts(Path::new("top.sv"), &facts, Some(&missing));
        assert!(checked.contains("Unresolved dependencies: bus_pkg"));
        assert!(checked.contains("Ports (1): clk"));

        let unchecked = render_facts(Path::new("top.sv"), &facts, None);
        assert!(!unchecked.contains("Unresolved"));
    }
}
