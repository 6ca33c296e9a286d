//! Tool descriptions compiled from declared callables.
//!
//! A [`Candidate`] is what a tool source declares: a name, documentation,
//! and parameters with optional type names and defaults. [`compile`] turns
//! it into a [`ToolDescriptor`], which renders the JSON Schema the model
//! sees and is the reference for binding the arguments the model sends
//! back.

use super::ToolError;
use crate::model::ToolSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A parameter as declared by a tool source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    /// Declared type name, e.g. `int`, `Vec<String>`, `Optional[str]`.
    #[serde(default, rename = "type")]
    pub declared_type: Option<String>,
    pub default: Option<Value>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, declared_type: Option<&str>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.map(str::to_string),
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// A callable offered by a tool source, before compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub doc: Option<String>,
    pub params: Vec<ParamDecl>,
    pub safe: bool,
}

impl Candidate {
    /// Declared defaults, keyed by parameter name.
    pub fn defaults(&self) -> Map<String, Value> {
        self.params
            .iter()
            .filter_map(|p| Some((p.name.clone(), p.default.clone()?)))
            .collect()
    }
}

/// JSON Schema type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Integer,
    Number,
    String,
    Boolean,
    Array,
    Object,
    /// No declared type; the schema places no constraint.
    Any,
}

impl SemanticType {
    /// Map a declared type name to a schema type.
    ///
    /// Accepts both Python and Rust spellings. Optional wrappers are
    /// unwrapped; names nobody recognises are treated as strings.
    pub fn from_declared(declared: Option<&str>) -> Self {
        match declared.map(str::trim) {
            None | Some("") => SemanticType::Any,
            Some(name) => Self::from_name(name),
        }
    }

    fn from_name(name: &str) -> Self {
        if let Some(inner) = unwrap_generic(name, "Option<", '>')
            .or_else(|| unwrap_generic(name, "Optional[", ']'))
        {
            return Self::from_name(inner.trim());
        }

        if name.contains('|') {
            let members: Vec<&str> = name
                .split('|')
                .map(str::trim)
                .filter(|m| *m != "None")
                .collect();
            if let [single] = members.as_slice() {
                return Self::from_name(single);
            }
            return SemanticType::String;
        }

        let base = name.split(['<', '[']).next().unwrap_or(name).trim();
        match base {
            "int" | "integer" | "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16"
            | "u32" | "u64" | "u128" | "usize" => SemanticType::Integer,
            "float" | "number" | "f32" | "f64" => SemanticType::Number,
            "bool" | "boolean" => SemanticType::Boolean,
            "list" | "List" | "array" | "tuple" | "Tuple" | "set" | "Set" | "Vec" | "VecDeque"
            | "HashSet" | "BTreeSet" => SemanticType::Array,
            "dict" | "Dict" | "object" | "map" | "Map" | "HashMap" | "BTreeMap" => {
                SemanticType::Object
            }
            _ => SemanticType::String,
        }
    }

    fn schema(self) -> Value {
        match self {
            SemanticType::Integer => json!({"type": "integer"}),
            SemanticType::Number => json!({"type": "number"}),
            SemanticType::String => json!({"type": "string"}),
            SemanticType::Boolean => json!({"type": "boolean"}),
            SemanticType::Array => json!({"type": "array"}),
            SemanticType::Object => json!({"type": "object"}),
            SemanticType::Any => json!({}),
        }
    }
}

fn unwrap_generic<'a>(name: &'a str, open: &str, close: char) -> Option<&'a str> {
    name.strip_prefix(open)?.strip_suffix(close)
}

/// One compiled parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub semantic_type: SemanticType,
    pub required: bool,
}

/// Everything the model is told about a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// In declaration order.
    pub parameters: Vec<Parameter>,
    pub safe: bool,
}

impl ToolDescriptor {
    /// JSON Schema for the argument object, properties in declaration
    /// order.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.semantic_type.schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            schema: self.input_schema(),
        }
    }
}

/// Compile a candidate. Returns `None` when it has no documentation.
pub fn compile(candidate: &Candidate) -> Option<ToolDescriptor> {
    let description = summary(candidate.doc.as_deref()?)?;
    let parameters = candidate
        .params
        .iter()
        .map(|p| Parameter {
            name: p.name.clone(),
            semantic_type: SemanticType::from_declared(p.declared_type.as_deref()),
            required: p.default.is_none(),
        })
        .collect();

    Some(ToolDescriptor {
        name: candidate.name.clone(),
        description,
        parameters,
        safe: candidate.safe,
    })
}

/// First paragraph of `doc`, lines trimmed and joined with single spaces.
fn summary(doc: &str) -> Option<String> {
    let paragraph: Vec<&str> = doc
        .lines()
        .map(str::trim)
        .skip_while(|line| line.is_empty())
        .take_while(|line| !line.is_empty())
        .collect();
    if paragraph.is_empty() {
        None
    } else {
        Some(paragraph.join(" "))
    }
}

/// Check the model's arguments against a descriptor and fill defaults.
///
/// The result holds exactly the declared parameters that were given or
/// have a default, in declaration order.
pub fn bind_arguments(
    descriptor: &ToolDescriptor,
    defaults: &Map<String, Value>,
    arguments: Value,
) -> Result<Map<String, Value>, ToolError> {
    let mut given = match arguments {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(ToolError::InvalidInput(format!(
                "arguments must be a JSON object, got {other}"
            )));
        }
    };

    if let Some(unknown) = given
        .keys()
        .find(|key| !descriptor.parameters.iter().any(|p| &p.name == *key))
    {
        return Err(ToolError::InvalidInput(format!(
            "unexpected argument '{unknown}'"
        )));
    }

    let mut bound = Map::new();
    for param in &descriptor.parameters {
        if let Some(value) = given.remove(&param.name) {
            bound.insert(param.name.clone(), value);
        } else if let Some(default) = defaults.get(&param.name) {
            bound.insert(param.name.clone(), default.clone());
        } else if param.required {
            return Err(ToolError::InvalidInput(format!(
                "missing required argument '{}'",
                param.name
            )));
        }
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_numbers() -> Candidate {
        Candidate {
            name: "add_numbers".into(),
            doc: Some(
                "Adds two numbers together and returns the result.\n\n    \
                 This is a simple arithmetic tool that takes two integers\n    \
                 and returns their sum.\n"
                    .into(),
            ),
            params: vec![
                ParamDecl::new("a", Some("int")),
                ParamDecl::new("b", Some("int")),
            ],
            safe: false,
        }
    }

    #[test]
    fn description_is_first_paragraph() {
        let candidate = Candidate {
            doc: Some("\n  Greets a person\n  by name.\n\n  Returns a greeting.\n".into()),
            ..add_numbers()
        };
        let descriptor = compile(&candidate).unwrap();
        assert_eq!(descriptor.description, "Greets a person by name.");
    }

    #[test]
    fn undocumented_candidates_are_not_compiled() {
        let mut candidate = add_numbers();
        candidate.doc = None;
        assert!(compile(&candidate).is_none());
        candidate.doc = Some("   \n\n  ".into());
        assert!(compile(&candidate).is_none());
    }

    #[test]
    fn schema_lists_typed_required_parameters_in_order() {
        let schema = compile(&add_numbers()).unwrap().input_schema();
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "a": {"type": "integer"},
                    "b": {"type": "integer"},
                },
                "required": ["a", "b"],
            })
        );
        let keys: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn defaults_make_parameters_optional() {
        let candidate = Candidate {
            name: "greet".into(),
            doc: Some("Greets.".into()),
            params: vec![
                ParamDecl::new("name", Some("str")),
                ParamDecl::new("excited", Some("bool")).with_default(json!(false)),
            ],
            safe: true,
        };
        let descriptor = compile(&candidate).unwrap();
        assert!(descriptor.safe);
        assert_eq!(descriptor.input_schema()["required"], json!(["name"]));
        assert_eq!(candidate.defaults(), json!({"excited": false}).as_object().unwrap().clone());
    }

    #[test]
    fn declared_type_mapping() {
        let cases = [
            (Some("int"), SemanticType::Integer),
            (Some("u64"), SemanticType::Integer),
            (Some("float"), SemanticType::Number),
            (Some("f64"), SemanticType::Number),
            (Some("str"), SemanticType::String),
            (Some("String"), SemanticType::String),
            (Some("&str"), SemanticType::String),
            (Some("bool"), SemanticType::Boolean),
            (Some("list[int]"), SemanticType::Array),
            (Some("Vec<String>"), SemanticType::Array),
            (Some("tuple"), SemanticType::Array),
            (Some("dict"), SemanticType::Object),
            (Some("HashMap<String, i32>"), SemanticType::Object),
            (Some("Option<i32>"), SemanticType::Integer),
            (Some("Optional[float]"), SemanticType::Number),
            (Some("int | None"), SemanticType::Integer),
            (Some("Widget"), SemanticType::String),
            (None, SemanticType::Any),
        ];
        for (declared, expected) in cases {
            assert_eq!(SemanticType::from_declared(declared), expected, "{declared:?}");
        }
    }

    #[test]
    fn untyped_parameter_has_empty_schema() {
        let candidate = Candidate {
            name: "echo".into(),
            doc: Some("Echo.".into()),
            params: vec![ParamDecl::new("x", None)],
            safe: false,
        };
        let schema = compile(&candidate).unwrap().input_schema();
        assert_eq!(schema["properties"]["x"], json!({}));
    }

    #[test]
    fn binding_checks_names_and_fills_defaults() {
        let candidate = Candidate {
            name: "greet".into(),
            doc: Some("Greets.".into()),
            params: vec![
                ParamDecl::new("name", Some("str")),
                ParamDecl::new("punctuation", Some("str")).with_default(json!("!")),
            ],
            safe: false,
        };
        let descriptor = compile(&candidate).unwrap();
        let defaults = candidate.defaults();

        let bound = bind_arguments(&descriptor, &defaults, json!({"name": "World"})).unwrap();
        assert_eq!(Value::Object(bound), json!({"name": "World", "punctuation": "!"}));

        let err = bind_arguments(&descriptor, &defaults, json!({})).unwrap_err();
        assert_eq!(
            err,
            ToolError::InvalidInput("missing required argument 'name'".into())
        );

        let err = bind_arguments(&descriptor, &defaults, json!({"name": "x", "loud": true}))
            .unwrap_err();
        assert_eq!(err, ToolError::InvalidInput("unexpected argument 'loud'".into()));

        assert!(bind_arguments(&descriptor, &defaults, json!([1, 2])).is_err());
    }
}
