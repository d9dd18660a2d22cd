use super::validate::ValidatedArgs;
use crate::registry::ids;
use rtlscope_protocol::{DispatchError, PromptDescriptor};

/// Render a prompt template with validated arguments into one user message.
pub(super) fn render(prompt: &PromptDescriptor, args: &ValidatedArgs) -> Result<String, DispatchError> {
    match prompt.id {
        ids::REVIEW_MODULE => {
            let module = args.required_str("moduleName")?;
            let focus = args.str("focus").unwrap_or("correctness");
            Ok(review_module(module, focus))
        }
        ids::WRITE_TESTBENCH => {
            let module = args.required_str("moduleName")?;
            let simulator = args.str("simulator").unwrap_or("verilator");
            Ok(write_testbench(module, simulator))
        }
        ids::EXPLAIN_BUILD_FAILURE => {
            let log = args.required_str("errorLog")?;
            let script = args.str("buildScriptPath").unwrap_or("Makefile");
            Ok(explain_build_failure(log, script))
        }
        other => Err(DispatchError::internal(format!(
            "no template bound to prompt `{other}`"
        ))),
    }
}

fn review_module(module: &str, focus: &str) -> String {
    format!(
        "Review the SystemVerilog module `{module}` with a focus on {focus}.\n\
         \n\
         1. Call `analyze-source` on the file that declares `{module}` to list its ports, \
         signals and imported packages. Treat unresolved packages as findings.\n\
         2. Compare the module against the `rtlscope://docs/coding-guidelines` resource.\n\
         3. Fetch the relevant checklist with `check-compliance` and go through each item. \
         The checklist is not evidence; confirm every item from the source yourself.\n\
         \n\
         Report findings ordered by severity, each with the line or construct it refers to. \
         Mark anything you could not confirm as unverified."
    )
}

fn write_testbench(module: &str, simulator: &str) -> String {
    format!(
        "Write a cocotb testbench for the module `{module}`, targeting the {simulator} simulator.\n\
         \n\
         Start by calling `analyze-source` on the module's file so the testbench drives every \
         input port and checks every output port it reports.\n\
         \n\
         Provide two files:\n\
         - `test_{module}.py` with an async reset sequence first, then one test per behaviour.\n\
         - A `Makefile` that sets `SIM ?= {simulator}`, `TOPLEVEL_LANG ?= verilog`, \
         `VERILOG_SOURCES`, `TOPLEVEL = {module}` and `MODULE = test_{module}`, and includes \
         `$(shell cocotb-config --makefiles)/Makefile.sim`.\n\
         \n\
         Run `suggest-build-fixes` on the Makefile before handing it over."
    )
}

fn explain_build_failure(log: &str, script: &str) -> String {
    format!(
        "A simulation or lint build driven by `{script}` failed with this output:\n\
         \n\
         ```\n\
         {log}\n\
         ```\n\
         \n\
         Explain the most likely root cause in a few sentences, quoting the log line that \
         shows it. Then call `suggest-build-fixes` on `{script}` and say whether any missing \
         build variable explains the failure. Finish with the smallest change that should make \
         the build pass."
    )
}
