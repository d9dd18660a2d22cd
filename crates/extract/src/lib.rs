//! # rtlscope extract
//!
//! Heuristic fact extraction from SystemVerilog sources and cocotb-style Makefiles.
//!
//! These are named pattern rules, not parsers. They find what a reviewer would find by
//! grepping: imported packages, declared signals and ports, build targets and a few build
//! policy violations. Correctness of the underlying hardware description is out of scope.
//!
//! ```text
//! source text
//!     │
//!     ├──> strip comments, blank out packed/unpacked dimensions
//!     │
//!     ├──> dependency rule   import <pkg>::*;
//!     ├──> signal rule       wire|reg|logic|bit|tri|wand|wor <names>
//!     ├──> port rule         input|output|inout <names>
//!     ├──> module rule       module|interface|package|program <name>
//!     │
//!     └──> ExtractedFacts { sets + ordered issues }
//! ```
//!
//! Every function in this crate is a pure function of its input.
//!
//! ```rust
//! use rtlscope_extract::extract;
//!
//! let facts = extract("module top(input logic clk); import bus_pkg::*; endmodule");
//! assert!(facts.ports.contains("clk"));
//! assert!(facts.dependencies.contains("bus_pkg"));
//! ```

mod build_script;
mod compare;
mod patterns;
mod source;
mod types;

pub use build_script::{analyze_build_script, SIMULATOR_NOT_SPECIFIED};
pub use compare::compare_interfaces;
pub use source::extract;
pub use types::{BuildCheck, BuildScriptReport, ExtractedFacts, InterfaceDiff, PortDirection};
