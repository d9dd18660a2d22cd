use crate::patterns::{
    declared_names, normalize_source, CONTAINER, DIRECTION, ENDMODULE_KEYWORD, IMPORT,
    IMPORT_ITEM, MODULE_KEYWORD, NET_TYPE,
};
use crate::types::{ExtractedFacts, PortDirection};
use std::collections::{BTreeMap, BTreeSet};

/// Extract dependencies, signals, ports and containers from SystemVerilog text.
///
/// Pure and deterministic; empty or non-matching input yields empty facts.
pub fn extract(source: &str) -> ExtractedFacts {
    if source.trim().is_empty() {
        return ExtractedFacts::default();
    }

    let text = normalize_source(source);
    let dependencies = extract_dependencies(&text);
    let named_signals = extract_signals(&text);
    let port_directions = extract_port_directions(&text);
    let modules = CONTAINER
        .captures_iter(&text)
        .map(|caps| caps[1].to_string())
        .collect::<BTreeSet<_>>();

    let mut issues = Vec::new();
    if modules.is_empty() {
        issues.push("No module, interface or package declaration found".to_string());
    }

    let opened = MODULE_KEYWORD.find_iter(&text).count();
    let closed = ENDMODULE_KEYWORD.find_iter(&text).count();
    if opened != closed {
        issues.push(format!(
            "Unbalanced module/endmodule: {opened} module vs {closed} endmodule"
        ));
    }

    for (name, directions) in &port_directions {
        if directions.len() > 1 {
            let listed = directions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            issues.push(format!(
                "Port `{name}` declared with conflicting directions: {listed}"
            ));
        }
    }

    ExtractedFacts {
        dependencies,
        named_signals,
        ports: port_directions.into_keys().collect(),
        modules,
        issues,
    }
}

fn extract_dependencies(text: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for caps in IMPORT.captures_iter(text) {
        for item in caps[1].split(',') {
            if let Some(item_caps) = IMPORT_ITEM.captures(item) {
                out.insert(item_caps[1].to_string());
            }
        }
    }
    out
}

fn extract_signals(text: &str) -> BTreeSet<String> {
    let direction_starts: Vec<usize> = DIRECTION.find_iter(text).map(|m| m.start()).collect();
    let mut out = BTreeSet::new();
    for m in NET_TYPE.find_iter(text) {
        let stop = direction_starts
            .iter()
            .copied()
            .find(|&start| start > m.end())
            .unwrap_or(text.len());
        out.extend(declared_names(text, m.end(), stop));
    }
    out
}

fn extract_port_directions(text: &str) -> BTreeMap<String, BTreeSet<PortDirection>> {
    let matches: Vec<_> = DIRECTION.captures_iter(text).collect();
    let mut out: BTreeMap<String, BTreeSet<PortDirection>> = BTreeMap::new();

    for (idx, caps) in matches.iter().enumerate() {
        let Some(keyword) = caps.get(1) else {
            continue;
        };
        let Some(direction) = PortDirection::from_keyword(keyword.as_str()) else {
            continue;
        };
        let stop = matches
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |next| next.start());
        for name in declared_names(text, keyword.end(), stop) {
            out.entry(name).or_default().insert(direction);
        }
    }
    out
}
