use crate::types::{ExtractedFacts, InterfaceDiff};

/// Compare the port and dependency sets of two extracted sources.
pub fn compare_interfaces(left: &ExtractedFacts, right: &ExtractedFacts) -> InterfaceDiff {
    InterfaceDiff {
        only_left: left.ports.difference(&right.ports).cloned().collect(),
        only_right: right.ports.difference(&left.ports).cloned().collect(),
        shared: left.ports.intersection(&right.ports).cloned().collect(),
        dependencies_only_left: left
            .dependencies
            .difference(&right.dependencies)
            .cloned()
            .collect(),
        dependencies_only_right: right
            .dependencies
            .difference(&left.dependencies)
            .cloned()
            .collect(),
    }
}
