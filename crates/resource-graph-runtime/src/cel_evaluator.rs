//! The default [`Evaluator`] implementation, backed by the `cel` crate (a CEL — Common
//! Expression Language — interpreter). This is the only module besides
//! [`evaluator`](crate::evaluator) that is allowed to name the `cel` crate; everything else
//! in this crate reaches expressions through the trait boundary.

use cel::{Context, Program, Value as CelValue};

use crate::evaluator::{Bindings, CompiledProgram, Environment, EnvironmentSpec, Evaluator, EvaluatorError};

/// Compiles and runs expressions with [`cel`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CelEvaluator;

impl Evaluator for CelEvaluator {
    fn environment(&self, spec: &EnvironmentSpec) -> Box<dyn Environment> {
        Box::new(CelEnvironment {
            variables: spec.variables.clone(),
        })
    }
}

struct CelEnvironment {
    variables: Vec<String>,
}

impl Environment for CelEnvironment {
    fn compile(&self, expression: &str) -> Result<Box<dyn CompiledProgram>, EvaluatorError> {
        let program = Program::compile(expression)
            .map_err(|err| EvaluatorError::new(format!("failed to compile expression: {err}")))?;
        Ok(Box::new(CelProgram {
            program,
            variables: self.variables.clone(),
        }))
    }
}

struct CelProgram {
    program: Program,
    variables: Vec<String>,
}

impl CompiledProgram for CelProgram {
    fn evaluate(&self, bindings: &Bindings) -> Result<serde_json::Value, EvaluatorError> {
        let mut context = Context::default();
        for name in &self.variables {
            let value = bindings
                .get(name)
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            context
                .add_variable(name.as_str(), json_to_cel(&value))
                .map_err(|err| EvaluatorError::new(format!("failed to bind \"{name}\": {err}")))?;
        }

        let result = self
            .program
            .execute(&context)
            .map_err(|err| EvaluatorError::new(err.to_string()))?;

        cel_to_json(result).ok_or_else(|| {
            EvaluatorError::new("evaluated value has no JSON representation".to_string())
        })
    }
}

fn json_to_cel(value: &serde_json::Value) -> CelValue {
    match value {
        serde_json::Value::Null => CelValue::Null,
        serde_json::Value::Bool(b) => CelValue::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                CelValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                CelValue::UInt(u)
            } else {
                CelValue::Float(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => CelValue::String(s.clone().into()),
        serde_json::Value::Array(items) => {
            CelValue::List(items.iter().map(json_to_cel).collect::<Vec<_>>().into())
        }
        serde_json::Value::Object(map) => CelValue::Map(
            map.iter()
                .map(|(k, v)| (k.clone().into(), json_to_cel(v)))
                .collect::<std::collections::HashMap<_, _>>()
                .into(),
        ),
    }
}

/// Lowers a [`CelValue`] to [`serde_json::Value`]. Returns `None` for values that have no
/// JSON representation (functions, unresolved idents) — the caller turns that into a hard
/// conversion-failure error rather than silently leaving the cell unresolved, per the
/// decision recorded for the conversion-failure open question.
fn cel_to_json(value: CelValue) -> Option<serde_json::Value> {
    match value {
        CelValue::Null => Some(serde_json::Value::Null),
        CelValue::Bool(b) => Some(serde_json::Value::Bool(b)),
        CelValue::Int(i) => Some(serde_json::Value::from(i)),
        CelValue::UInt(u) => Some(serde_json::Value::from(u)),
        CelValue::Float(f) => serde_json::Number::from_f64(f).map(serde_json::Value::Number),
        CelValue::String(s) => Some(serde_json::Value::String((*s).clone())),
        CelValue::Bytes(_) | CelValue::Duration(_) | CelValue::Timestamp(_) => None,
        CelValue::List(items) => items
            .iter()
            .cloned()
            .map(cel_to_json)
            .collect::<Option<Vec<_>>>()
            .map(serde_json::Value::Array),
        CelValue::Map(map) => {
            let mut object = serde_json::Map::new();
            for (key, value) in map.map.iter() {
                let key = match key {
                    cel::objects::Key::String(s) => (**s).clone(),
                    cel::objects::Key::Int(i) => i.to_string(),
                    cel::objects::Key::Uint(u) => u.to_string(),
                    cel::objects::Key::Bool(b) => b.to_string(),
                };
                object.insert(key, cel_to_json(value.clone())?);
            }
            Some(serde_json::Value::Object(object))
        }
        CelValue::Function(..) => None,
    }
}
