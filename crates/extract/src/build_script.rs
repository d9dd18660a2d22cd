use crate::patterns::{strip_make_comments, MAKE_INCLUDE, MAKE_SIMULATOR, MAKE_TARGET};
use crate::types::{BuildCheck, BuildScriptReport};

/// Simulator name reported when the build script never assigns `SIM`.
pub const SIMULATOR_NOT_SPECIFIED: &str = "not_specified";

const TOPLEVEL_LANG_MARKER: &str = "TOPLEVEL_LANG";
const VERILOG_SOURCES_MARKER: &str = "VERILOG_SOURCES";

/// Analyze a cocotb-style Makefile.
///
/// Checks always run in [`BuildCheck::ORDER`], so the diagnostics for a given input are
/// stable.
pub fn analyze_build_script(text: &str) -> BuildScriptReport {
    let text = strip_make_comments(text);

    let simulator_name = MAKE_SIMULATOR
        .captures(&text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| SIMULATOR_NOT_SPECIFIED.to_string());

    let targets = dedup_in_order(MAKE_TARGET.captures_iter(&text).map(|caps| caps[1].to_string()));
    let dependencies =
        dedup_in_order(MAKE_INCLUDE.captures_iter(&text).map(|caps| caps[1].to_string()));

    let failed_checks: Vec<BuildCheck> = BuildCheck::ORDER
        .into_iter()
        .filter(|check| match check {
            BuildCheck::SimulatorUnset => simulator_name == SIMULATOR_NOT_SPECIFIED,
            BuildCheck::MissingToplevelLang => !text.contains(TOPLEVEL_LANG_MARKER),
            BuildCheck::MissingVerilogSources => !text.contains(VERILOG_SOURCES_MARKER),
        })
        .collect();
    let issues = failed_checks
        .iter()
        .map(|check| check.diagnostic().to_string())
        .collect();

    BuildScriptReport {
        simulator_name,
        targets,
        dependencies,
        failed_checks,
        issues,
    }
}

fn dedup_in_order(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
