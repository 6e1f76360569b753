//! Runtime-neutral values exposed through frame bindings.
//!
//! A trace provider converts whatever its runtime holds into [`Value`]. The
//! adapter only needs three things from a value: a type name, a display
//! string, and (for composites) an ordered list of named children.

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde_json::Value as Json;
use smol_str::SmolStr;

use crate::error::RenderError;

/// Name → value bindings of one scope, in declaration order.
pub type Bindings = IndexMap<SmolStr, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Map(IndexMap<String, Value>),
    /// Instance with inspectable attributes.
    Object {
        type_name: SmolStr,
        fields: IndexMap<SmolStr, Value>,
    },
    /// Value the runtime can only describe by type. `repr` is `None` when the
    /// runtime failed to produce a display string.
    Opaque {
        type_name: SmolStr,
        repr: Option<String>,
    },
}

impl Value {
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "dict",
            Self::Object { type_name, .. } | Self::Opaque { type_name, .. } => type_name,
        }
    }

    /// Full display string. Strings render bare at the top level and quoted
    /// when nested inside a container.
    pub fn render(&self) -> Result<String, RenderError> {
        let mut out = String::new();
        self.write_display(&mut out, false)?;
        Ok(out)
    }

    /// Children a client may expand, or an empty list for scalars.
    #[must_use]
    pub fn children(&self) -> Vec<(String, Value)> {
        match self {
            Self::List(items) | Self::Tuple(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| (format!("[{idx}]"), item.clone()))
                .collect(),
            Self::Map(entries) => entries
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            Self::Object { fields, .. } => fields
                .iter()
                .filter(|(name, _)| !name.starts_with('_'))
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// True for composites with at least one visible child.
    #[must_use]
    pub fn has_children(&self) -> bool {
        match self {
            Self::List(items) | Self::Tuple(items) => !items.is_empty(),
            Self::Map(entries) => !entries.is_empty(),
            Self::Object { fields, .. } => fields.keys().any(|name| !name.starts_with('_')),
            _ => false,
        }
    }

    /// Decode the JSON encoding used by recorded traces.
    ///
    /// Plain JSON maps onto the obvious variants. Three tagged objects encode
    /// the rest: `{"$tuple": [..]}`, `{"$object": "T", "fields": {..}}` and
    /// `{"$opaque": "T", "repr": ".."}`.
    #[must_use]
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Self::None,
            Json::Bool(value) => Self::Bool(*value),
            Json::Number(number) => match number.as_i64() {
                Some(value) => Self::Int(value),
                None => Self::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(value) => Self::Str(value.clone()),
            Json::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Json::Object(map) => {
                if let Some(Json::Array(items)) = map.get("$tuple") {
                    return Self::Tuple(items.iter().map(Self::from_json).collect());
                }
                if let Some(Json::String(type_name)) = map.get("$object") {
                    let fields = match map.get("fields") {
                        Some(Json::Object(fields)) => fields
                            .iter()
                            .map(|(name, value)| (SmolStr::new(name), Self::from_json(value)))
                            .collect(),
                        _ => IndexMap::new(),
                    };
                    return Self::Object {
                        type_name: SmolStr::new(type_name),
                        fields,
                    };
                }
                if let Some(Json::String(type_name)) = map.get("$opaque") {
                    return Self::Opaque {
                        type_name: SmolStr::new(type_name),
                        repr: map.get("repr").and_then(Json::as_str).map(str::to_string),
                    };
                }
                Self::Map(
                    map.iter()
                        .map(|(key, value)| (key.clone(), Self::from_json(value)))
                        .collect(),
                )
            }
        }
    }

    fn write_display(&self, out: &mut String, nested: bool) -> Result<(), RenderError> {
        match self {
            Self::None => out.push_str("None"),
            Self::Bool(true) => out.push_str("True"),
            Self::Bool(false) => out.push_str("False"),
            Self::Int(value) => {
                let _ = write!(out, "{value}");
            }
            Self::Float(value) => push_float(out, *value),
            Self::Str(value) if nested => push_quoted(out, value),
            Self::Str(value) => out.push_str(value),
            Self::List(items) => {
                out.push('[');
                write_items(out, items)?;
                out.push(']');
            }
            Self::Tuple(items) => {
                out.push('(');
                write_items(out, items)?;
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Self::Map(entries) => {
                out.push('{');
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    push_quoted(out, key);
                    out.push_str(": ");
                    value.write_display(out, true)?;
                }
                out.push('}');
            }
            Self::Object { type_name, .. } => {
                let _ = write!(out, "<{type_name} object>");
            }
            Self::Opaque { type_name, repr } => match repr {
                Some(repr) => out.push_str(repr),
                None => {
                    return Err(RenderError {
                        type_name: type_name.to_string(),
                    })
                }
            },
        }
        Ok(())
    }
}

fn write_items(out: &mut String, items: &[Value]) -> Result<(), RenderError> {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        item.write_display(out, true)?;
    }
    Ok(())
}

fn push_float(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("nan");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "inf" } else { "-inf" });
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        let _ = write!(out, "{value:.1}");
    } else {
        let _ = write!(out, "{value}");
    }
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
}
