//! Static review checklists served by `check-compliance` and the checklist resource.
//!
//! Nothing here inspects a design. Every item is reported as `UNVERIFIED`; a human (or a
//! later analysis pass) has to confirm it.

use std::fmt::Write as _;

pub const UNVERIFIED: &str = "UNVERIFIED";

pub const CATEGORY_NAMES: &[&str] = &["naming", "reset", "clocking", "verification"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementCategory {
    Naming,
    Reset,
    Clocking,
    Verification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: &'static str,
    pub requirement: &'static str,
}

const NAMING: &[ChecklistItem] = &[
    ChecklistItem {
        id: "NAM-1",
        requirement: "Module names are lower_snake_case and match their file name",
    },
    ChecklistItem {
        id: "NAM-2",
        requirement: "Active-low signals carry an `_n` suffix",
    },
    ChecklistItem {
        id: "NAM-3",
        requirement: "Clock inputs are named `clk` or end in `_clk`",
    },
    ChecklistItem {
        id: "NAM-4",
        requirement: "Parameters and localparams are UPPER_SNAKE_CASE",
    },
];

const RESET: &[ChecklistItem] = &[
    ChecklistItem {
        id: "RST-1",
        requirement: "All resettable flops in a module use the same reset polarity",
    },
    ChecklistItem {
        id: "RST-2",
        requirement: "Asynchronous resets are synchronized on deassertion",
    },
    ChecklistItem {
        id: "RST-3",
        requirement: "Control-state registers have explicit reset values",
    },
    ChecklistItem {
        id: "RST-4",
        requirement: "Reset is driven only by the reset synchronizer, never by datapath logic",
    },
];

const CLOCKING: &[ChecklistItem] = &[
    ChecklistItem {
        id: "CLK-1",
        requirement: "Sequential logic uses `always_ff` on a single clock edge",
    },
    ChecklistItem {
        id: "CLK-2",
        requirement: "Each clock-domain crossing goes through a documented synchronizer",
    },
    ChecklistItem {
        id: "CLK-3",
        requirement: "Clocks are gated only through the clock-gating cell",
    },
    ChecklistItem {
        id: "CLK-4",
        requirement: "`always_comb` blocks infer no latches",
    },
];

const VERIFICATION: &[ChecklistItem] = &[
    ChecklistItem {
        id: "VER-1",
        requirement: "The module has a cocotb testbench with its own Makefile",
    },
    ChecklistItem {
        id: "VER-2",
        requirement: "The testbench drives and checks reset before any traffic",
    },
    ChecklistItem {
        id: "VER-3",
        requirement: "Interface handshakes are covered by assertions",
    },
    ChecklistItem {
        id: "VER-4",
        requirement: "Lint runs clean with the project's Verilator warning set",
    },
];

impl RequirementCategory {
    pub const ALL: [RequirementCategory; 4] =
        [Self::Naming, Self::Reset, Self::Clocking, Self::Verification];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Naming => "naming",
            Self::Reset => "reset",
            Self::Clocking => "clocking",
            Self::Verification => "verification",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == raw)
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Naming => "Naming conventions",
            Self::Reset => "Reset strategy",
            Self::Clocking => "Clocking and CDC",
            Self::Verification => "Verification readiness",
        }
    }

    pub const fn items(self) -> &'static [ChecklistItem] {
        match self {
            Self::Naming => NAMING,
            Self::Reset => RESET,
            Self::Clocking => CLOCKING,
            Self::Verification => VERIFICATION,
        }
    }
}

fn write_items(out: &mut String, category: RequirementCategory) {
    for item in category.items() {
        let _ = writeln!(out, "- [{UNVERIFIED}] {}: {}", item.id, item.requirement);
    }
}

/// Checklist for one category, as returned by `check-compliance`.
pub fn render_checklist(category: RequirementCategory) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Compliance checklist: {}", category.title());
    out.push('\n');
    let _ = writeln!(
        out,
        "Status is not derived from analysis of the design. Each item stays {UNVERIFIED} until a reviewer confirms it."
    );
    out.push('\n');
    write_items(&mut out, category);
    out
}

/// Every category in one markdown document.
pub fn render_all() -> String {
    let mut out = String::from("# Compliance checklists\n\n");
    let _ = writeln!(
        out,
        "Items are listed as {UNVERIFIED}; `check-compliance` returns one category at a time."
    );
    for category in RequirementCategory::ALL {
        let _ = write!(out, "\n## {} (`{}`)\n\n", category.title(), category.as_str());
        write_items(&mut out, category);
    }
    out
}
