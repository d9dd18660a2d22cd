use rtlscope_protocol::{
    Arguments, CapabilityKind, DispatchError, ParamKind, PromptDescriptor, ToolDescriptor,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Arguments that passed validation, with defaults applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs {
    values: BTreeMap<&'static str, Value>,
}

impl ValidatedArgs {
    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    /// A parameter the descriptor marks required. Absence here means the handler and its
    /// descriptor disagree, which is a wiring fault rather than a client error.
    pub fn required_str(&self, name: &str) -> Result<&str, DispatchError> {
        self.str(name).ok_or_else(|| {
            DispatchError::internal(format!("validated arguments lack required `{name}`"))
        })
    }
}

/// Present and non-null. `null` counts as omitted.
fn supplied<'a>(args: &'a Arguments, name: &str) -> Option<&'a Value> {
    args.get(name).filter(|value| !value.is_null())
}

fn reject_undeclared(
    kind: CapabilityKind,
    id: &str,
    args: &Arguments,
    declared: impl Fn(&str) -> bool,
) -> Result<(), DispatchError> {
    match args.keys().find(|name| !declared(name.as_str())) {
        Some(name) => Err(DispatchError::invalid(kind, id, name.as_str(), "is not accepted")),
        None => Ok(()),
    }
}

fn check_required_text(
    kind: CapabilityKind,
    id: &str,
    name: &str,
    text: &str,
    required: bool,
) -> Result<(), DispatchError> {
    if required && text.trim().is_empty() {
        return Err(DispatchError::invalid(kind, id, name, "must not be empty"));
    }
    Ok(())
}

/// Check `args` against a tool's input shape: declared names only, required parameters
/// present, primitive kinds and enum membership respected.
pub fn validate_tool_args(
    tool: &ToolDescriptor,
    args: &Arguments,
) -> Result<ValidatedArgs, DispatchError> {
    let kind = CapabilityKind::Tool;
    let mut values = BTreeMap::new();

    for param in tool.input_shape {
        let Some(value) = supplied(args, param.name) else {
            if param.required {
                return Err(DispatchError::invalid(kind, tool.id, param.name, "is required"));
            }
            if let Some(default) = param.default {
                values.insert(param.name, default.to_value());
            }
            continue;
        };

        match param.kind {
            ParamKind::String => {
                let text = value.as_str().ok_or_else(|| {
                    DispatchError::invalid(kind, tool.id, param.name, "must be a string")
                })?;
                check_required_text(kind, tool.id, param.name, text, param.required)?;
            }
            ParamKind::Boolean => {
                if !value.is_boolean() {
                    return Err(DispatchError::invalid(
                        kind,
                        tool.id,
                        param.name,
                        "must be a boolean",
                    ));
                }
            }
            ParamKind::Enum(allowed) => {
                let text = value.as_str().unwrap_or_default();
                if !value.is_string() || !allowed.contains(&text) {
                    return Err(DispatchError::invalid(
                        kind,
                        tool.id,
                        param.name,
                        format!("must be one of: {}", allowed.join(", ")),
                    ));
                }
            }
        }
        values.insert(param.name, value.clone());
    }

    reject_undeclared(kind, tool.id, args, |name| tool.param(name).is_some())?;
    Ok(ValidatedArgs { values })
}

/// Prompt parameters are all strings; optional ones fall back to their documented default.
pub fn validate_prompt_args(
    prompt: &PromptDescriptor,
    args: &Arguments,
) -> Result<ValidatedArgs, DispatchError> {
    let kind = CapabilityKind::Prompt;
    let mut values = BTreeMap::new();

    for param in prompt.parameters {
        let Some(value) = supplied(args, param.name) else {
            if param.required {
                return Err(DispatchError::invalid(kind, prompt.id, param.name, "is required"));
            }
            if let Some(default) = param.default {
                values.insert(param.name, Value::String(default.to_string()));
            }
            continue;
        };
        let text = value.as_str().ok_or_else(|| {
            DispatchError::invalid(kind, prompt.id, param.name, "must be a string")
        })?;
        check_required_text(kind, prompt.id, param.name, text, param.required)?;
        values.insert(param.name, value.clone());
    }

    reject_undeclared(kind, prompt.id, args, |name| prompt.param(name).is_some())?;
    Ok(ValidatedArgs { values })
}
