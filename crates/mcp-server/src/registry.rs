//! The fixed capability catalogue.
//!
//! Tables are `const` and populated once; there is no runtime registration API. Lookups are
//! exact id matches within one namespace.

use crate::compliance::CATEGORY_NAMES;
use rtlscope_protocol::{
    CapabilityKind, Descriptor, DispatchError, ParamDefault, ParamKind, ParamSpec,
    PromptDescriptor, PromptParam, ResourceDescriptor, ToolDescriptor,
};
use std::collections::HashSet;
use thiserror::Error;

pub mod ids {
    pub const CODING_GUIDELINES: &str = "rtlscope://docs/coding-guidelines";
    pub const BUILD_REFERENCE: &str = "rtlscope://docs/build-reference";
    pub const COMPLIANCE_CHECKLISTS: &str = "rtlscope://docs/compliance-checklists";
    pub const CATALOG: &str = "rtlscope://catalog";

    pub const RUN_ANALYSIS: &str = "run-analysis";
    pub const ANALYZE_SOURCE: &str = "analyze-source";
    pub const CHECK_COMPATIBILITY: &str = "check-compatibility";
    pub const SUGGEST_BUILD_FIXES: &str = "suggest-build-fixes";
    pub const CHECK_COMPLIANCE: &str = "check-compliance";

    pub const REVIEW_MODULE: &str = "review-module";
    pub const WRITE_TESTBENCH: &str = "write-testbench";
    pub const EXPLAIN_BUILD_FAILURE: &str = "explain-build-failure";
}

pub const RUN_MODES: &[&str] = &["all", "sim", "lint", "clean"];

pub const RESOURCES: &[ResourceDescriptor] = &[
    ResourceDescriptor {
        id: ids::CODING_GUIDELINES,
        display_name: "SystemVerilog coding guidelines",
        media_type: "text/markdown",
        description: "House style for synthesizable SystemVerilog: naming, resets, clocking.",
    },
    ResourceDescriptor {
        id: ids::BUILD_REFERENCE,
        display_name: "cocotb Makefile reference",
        media_type: "text/markdown",
        description: "Variables and targets expected in a cocotb simulation Makefile.",
    },
    ResourceDescriptor {
        id: ids::COMPLIANCE_CHECKLISTS,
        display_name: "Compliance checklists",
        media_type: "text/markdown",
        description: "All review checklists used by check-compliance, one section per category.",
    },
    ResourceDescriptor {
        id: ids::CATALOG,
        display_name: "Capability catalogue",
        media_type: "application/json",
        description: "Every resource, tool and prompt this server exposes, as JSON.",
    },
];

const RUN_ANALYSIS_SHAPE: &[ParamSpec] = &[
    ParamSpec {
        name: "analysisTarget",
        description: "Directory containing the build script (Makefile) to run.",
        kind: ParamKind::String,
        required: true,
        default: None,
    },
    ParamSpec {
        name: "mode",
        description: "Make target to run; `all` runs the default target.",
        kind: ParamKind::Enum(RUN_MODES),
        required: false,
        default: Some(ParamDefault::Str("all")),
    },
];

const ANALYZE_SOURCE_SHAPE: &[ParamSpec] = &[
    ParamSpec {
        name: "filePath",
        description: "SystemVerilog source file to analyze.",
        kind: ParamKind::String,
        required: true,
        default: None,
    },
    ParamSpec {
        name: "checkDependencies",
        description: "Report imported packages not declared in this file or its siblings.",
        kind: ParamKind::Boolean,
        required: false,
        default: Some(ParamDefault::Bool(true)),
    },
];

const CHECK_COMPATIBILITY_SHAPE: &[ParamSpec] = &[
    ParamSpec {
        name: "leftFile",
        description: "First SystemVerilog source file.",
        kind: ParamKind::String,
        required: true,
        default: None,
    },
    ParamSpec {
        name: "rightFile",
        description: "Second SystemVerilog source file.",
        kind: ParamKind::String,
        required: true,
        default: None,
    },
];

const SUGGEST_BUILD_FIXES_SHAPE: &[ParamSpec] = &[ParamSpec {
    name: "buildScriptPath",
    description: "Path to the cocotb Makefile to inspect.",
    kind: ParamKind::String,
    required: true,
    default: None,
}];

const CHECK_COMPLIANCE_SHAPE: &[ParamSpec] = &[ParamSpec {
    name: "requirementCategory",
    description: "Checklist to return.",
    kind: ParamKind::Enum(CATEGORY_NAMES),
    required: true,
    default: None,
}];

pub const TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        id: ids::RUN_ANALYSIS,
        description: "Run the build script in a directory (make) and report exit status and output.",
        input_shape: RUN_ANALYSIS_SHAPE,
    },
    ToolDescriptor {
        id: ids::ANALYZE_SOURCE,
        description: "Extract modules, ports, signals and imported packages from a SystemVerilog file.",
        input_shape: ANALYZE_SOURCE_SHAPE,
    },
    ToolDescriptor {
        id: ids::CHECK_COMPATIBILITY,
        description: "Compare the ports and package imports of two SystemVerilog files.",
        input_shape: CHECK_COMPATIBILITY_SHAPE,
    },
    ToolDescriptor {
        id: ids::SUGGEST_BUILD_FIXES,
        description: "Check a cocotb Makefile for missing SIM, TOPLEVEL_LANG and VERILOG_SOURCES and suggest lines to add.",
        input_shape: SUGGEST_BUILD_FIXES_SHAPE,
    },
    ToolDescriptor {
        id: ids::CHECK_COMPLIANCE,
        description: "Return the review checklist for a requirement category. Items are UNVERIFIED.",
        input_shape: CHECK_COMPLIANCE_SHAPE,
    },
];

pub const PROMPTS: &[PromptDescriptor] = &[
    PromptDescriptor {
        id: ids::REVIEW_MODULE,
        description: "Review a SystemVerilog module against the coding guidelines.",
        parameters: &[
            PromptParam {
                name: "moduleName",
                description: "Module to review.",
                required: true,
                default: None,
            },
            PromptParam {
                name: "focus",
                description: "Review emphasis, e.g. correctness, timing, readability.",
                required: false,
                default: Some("correctness"),
            },
        ],
    },
    PromptDescriptor {
        id: ids::WRITE_TESTBENCH,
        description: "Draft a cocotb testbench and Makefile for a module.",
        parameters: &[
            PromptParam {
                name: "moduleName",
                description: "Top-level module under test.",
                required: true,
                default: None,
            },
            PromptParam {
                name: "simulator",
                description: "Simulator to target (SIM value).",
                required: false,
                default: Some("verilator"),
            },
        ],
    },
    PromptDescriptor {
        id: ids::EXPLAIN_BUILD_FAILURE,
        description: "Explain a failed simulation or lint build from its log.",
        parameters: &[
            PromptParam {
                name: "errorLog",
                description: "Captured build output.",
                required: true,
                default: None,
            },
            PromptParam {
                name: "buildScriptPath",
                description: "Makefile that drove the build.",
                required: false,
                default: Some("Makefile"),
            },
        ],
    },
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: CapabilityKind, id: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub struct Registry {
    resources: &'static [ResourceDescriptor],
    tools: &'static [ToolDescriptor],
    prompts: &'static [PromptDescriptor],
}

static BUILTIN: Registry = Registry {
    resources: RESOURCES,
    tools: TOOLS,
    prompts: PROMPTS,
};

impl Registry {
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    pub fn from_tables(
        resources: &'static [ResourceDescriptor],
        tools: &'static [ToolDescriptor],
        prompts: &'static [PromptDescriptor],
    ) -> Result<Self, RegistryError> {
        ensure_unique(CapabilityKind::Resource, resources.iter().map(|d| d.id))?;
        ensure_unique(CapabilityKind::Tool, tools.iter().map(|d| d.id))?;
        ensure_unique(CapabilityKind::Prompt, prompts.iter().map(|d| d.id))?;
        Ok(Self {
            resources,
            tools,
            prompts,
        })
    }

    pub fn resources(&self) -> &'static [ResourceDescriptor] {
        self.resources
    }

    pub fn tools(&self) -> &'static [ToolDescriptor] {
        self.tools
    }

    pub fn prompts(&self) -> &'static [PromptDescriptor] {
        self.prompts
    }

    /// Full catalogue of one namespace, in declaration order.
    pub fn list(&self, kind: CapabilityKind) -> Vec<Descriptor<'static>> {
        match kind {
            CapabilityKind::Resource => self.resources.iter().map(Descriptor::Resource).collect(),
            CapabilityKind::Tool => self.tools.iter().map(Descriptor::Tool).collect(),
            CapabilityKind::Prompt => self.prompts.iter().map(Descriptor::Prompt).collect(),
        }
    }

    pub fn resource(&self, id: &str) -> Option<&'static ResourceDescriptor> {
        self.resources.iter().find(|d| d.id == id)
    }

    pub fn tool(&self, id: &str) -> Option<&'static ToolDescriptor> {
        self.tools.iter().find(|d| d.id == id)
    }

    pub fn prompt(&self, id: &str) -> Option<&'static PromptDescriptor> {
        self.prompts.iter().find(|d| d.id == id)
    }

    pub fn describe(
        &self,
        kind: CapabilityKind,
        id: &str,
    ) -> Result<Descriptor<'static>, DispatchError> {
        let found = match kind {
            CapabilityKind::Resource => self.resource(id).map(Descriptor::Resource),
            CapabilityKind::Tool => self.tool(id).map(Descriptor::Tool),
            CapabilityKind::Prompt => self.prompt(id).map(Descriptor::Prompt),
        };
        found.ok_or_else(|| DispatchError::unknown(kind, id))
    }
}

fn ensure_unique(
    kind: CapabilityKind,
    ids: impl Iterator<Item = &'static str>,
) -> Result<(), RegistryError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(RegistryError::DuplicateId { kind, id });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_have_unique_ids() {
        assert!(Registry::from_tables(RESOURCES, TOOLS, PROMPTS).is_ok());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        const TWICE: &[ToolDescriptor] = &[TOOLS[0], TOOLS[0]];
        let err = Registry::from_tables(RESOURCES, TWICE, PROMPTS).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateId {
                kind: CapabilityKind::Tool,
                id: ids::RUN_ANALYSIS
            }
        );
    }

    #[test]
    fn same_id_in_different_namespaces_is_allowed() {
        const TOOL: &[ToolDescriptor] = &[ToolDescriptor {
            id: "shared",
            description: "",
            input_shape: &[],
        }];
        const PROMPT: &[PromptDescriptor] = &[PromptDescriptor {
            id: "shared",
            description: "",
            parameters: &[],
        }];
        assert!(Registry::from_tables(&[], TOOL, PROMPT).is_ok());
    }

    #[test]
    fn listing_keeps_declaration_order() {
        let registry = Registry::builtin();
        let tools: Vec<_> = registry
            .list(CapabilityKind::Tool)
            .iter()
            .map(|d| d.id())
            .collect();
        assert_eq!(
            tools,
            vec![
                ids::RUN_ANALYSIS,
                ids::ANALYZE_SOURCE,
                ids::CHECK_COMPATIBILITY,
                ids::SUGGEST_BUILD_FIXES,
                ids::CHECK_COMPLIANCE,
            ]
        );
        assert_eq!(registry.list(CapabilityKind::Resource).len(), 4);
        assert_eq!(registry.list(CapabilityKind::Prompt).len(), 3);
    }

    #[test]
    fn describe_matches_exact_ids_only() {
        let registry = Registry::builtin();
        let found = registry
            .describe(CapabilityKind::Tool, ids::ANALYZE_SOURCE)
            .unwrap();
        assert_eq!(found.id(), ids::ANALYZE_SOURCE);
        assert_eq!(found.kind(), CapabilityKind::Tool);

        for near_miss in ["analyze", "ANALYZE-SOURCE", "analyze-source "] {
            let err = registry.describe(CapabilityKind::Tool, near_miss).unwrap_err();
            assert!(matches!(err, DispatchError::UnknownCapability { .. }));
        }
        assert!(registry
            .describe(CapabilityKind::Prompt, ids::ANALYZE_SOURCE)
            .is_err());
    }

    #[test]
    fn every_declared_id_is_describable() {
        let registry = Registry::builtin();
        let declared = RESOURCES
            .iter()
            .map(|d| (CapabilityKind::Resource, d.id))
            .chain(TOOLS.iter().map(|d| (CapabilityKind::Tool, d.id)))
            .chain(PROMPTS.iter().map(|d| (CapabilityKind::Prompt, d.id)));
        for (kind, id) in declared {
            let found = registry.describe(kind, id).unwrap();
            assert_eq!(found.id(), id);
            assert_eq!(found.kind(), kind);
        }
    }
}
