use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Facts pulled out of one source text. Not persisted across calls.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ExtractedFacts {
    /// Packages named by `import <pkg>::...` statements.
    pub dependencies: BTreeSet<String>,

    /// Identifiers introduced by wire/reg/logic-like declarations.
    pub named_signals: BTreeSet<String>,

    /// Identifiers introduced by input/output/inout declarations.
    pub ports: BTreeSet<String>,

    /// Declared module, interface, package and program names.
    pub modules: BTreeSet<String>,

    /// Heuristic diagnostics, in rule order.
    pub issues: Vec<String>,
}

impl ExtractedFacts {
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
            && self.named_signals.is_empty()
            && self.ports.is_empty()
            && self.modules.is_empty()
            && self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
    Inout,
}

impl PortDirection {
    pub(crate) fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "input" => Some(Self::Input),
            "output" => Some(Self::Output),
            "inout" => Some(Self::Inout),
            _ => None,
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Inout => "inout",
        })
    }
}

/// Build policy checks, in the order they are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildCheck {
    SimulatorUnset,
    MissingToplevelLang,
    MissingVerilogSources,
}

impl BuildCheck {
    pub const ORDER: [BuildCheck; 3] = [
        Self::SimulatorUnset,
        Self::MissingToplevelLang,
        Self::MissingVerilogSources,
    ];

    pub fn diagnostic(self) -> &'static str {
        match self {
            Self::SimulatorUnset => "Simulator not specified (set SIM)",
            Self::MissingToplevelLang => "TOPLEVEL_LANG not specified",
            Self::MissingVerilogSources => "VERILOG_SOURCES not specified",
        }
    }

    /// The Makefile line that satisfies this check.
    pub fn suggested_line(self) -> &'static str {
        match self {
            Self::SimulatorUnset => "SIM ?= verilator",
            Self::MissingToplevelLang => "TOPLEVEL_LANG ?= verilog",
            Self::MissingVerilogSources => "VERILOG_SOURCES += $(PWD)/<toplevel>.sv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildScriptReport {
    pub simulator_name: String,
    /// Line-leading `name:` targets, first occurrence order.
    pub targets: Vec<String>,
    /// Paths named by `include` directives, first occurrence order.
    pub dependencies: Vec<String>,
    pub failed_checks: Vec<BuildCheck>,
    /// One diagnostic per failed check, same order as `failed_checks`.
    pub issues: Vec<String>,
}

/// Port and dependency differences between two sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceDiff {
    pub only_left: BTreeSet<String>,
    pub only_right: BTreeSet<String>,
    pub shared: BTreeSet<String>,
    pub dependencies_only_left: BTreeSet<String>,
    pub dependencies_only_right: BTreeSet<String>,
}

impl InterfaceDiff {
    pub fn ports_match(&self) -> bool {
        self.only_left.is_empty() && self.only_right.is_empty()
    }
}
