// Trace steps and JSON-safe snapshots of live bindings

use crate::interpreter::constants::MAX_SAFE_INTEGER;
use crate::memory::value::Value;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};
use std::rc::Rc;

/// One captured step: the host line that just ran and the bindings visible there
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    /// 1-based line in the host program
    pub line_number: usize,
    pub scope: Map<String, serde_json::Value>,
}

impl TraceStep {
    pub fn new(line_number: usize, scope: Map<String, serde_json::Value>) -> Self {
        TraceStep { line_number, scope }
    }

    /// Snapshot of a single binding, if it was captured at this step
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.scope.get(name)
    }
}

/// Ordered record of one simulated run
///
/// Steps are kept in the order they were produced. Line numbers are not
/// monotonic: loops and calls jump backwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    steps: Vec<TraceStep>,
}

impl Trace {
    pub fn new() -> Self {
        Trace::default()
    }

    /// Append a step to the end of the trace
    pub fn push(&mut self, step: TraceStep) {
        self.steps.push(step);
    }

    /// Get a step by index
    pub fn get(&self, index: usize) -> Option<&TraceStep> {
        self.steps.get(index)
    }

    /// Get the number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TraceStep> {
        self.steps.iter()
    }
}

impl FromIterator<TraceStep> for Trace {
    fn from_iter<I: IntoIterator<Item = TraceStep>>(iter: I) -> Self {
        Trace {
            steps: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a TraceStep;
    type IntoIter = std::slice::Iter<'a, TraceStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Deep, cycle-free JSON copy of a value.
///
/// Returns `None` for functions and for values that contain a cycle, since
/// neither has a JSON representation. Functions nested in containers become
/// `null` in arrays and are left out of objects.
pub fn to_snapshot(value: &Value) -> Option<serde_json::Value> {
    if value.is_function() {
        return None;
    }
    let mut path = Vec::new();
    snapshot_inner(value, &mut path).ok()
}

struct Cycle;

/// Containers on the path from the root to the value being copied
type Path = Vec<*const ()>;

fn snapshot_inner(value: &Value, path: &mut Path) -> Result<serde_json::Value, Cycle> {
    use serde_json::Value as Json;

    Ok(match value {
        Value::Undefined | Value::Null | Value::Function(_) | Value::Native(_) => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::BigInt(n) => Json::String(n.to_string()),
        Value::Str(s) => Json::String(s.to_string()),
        Value::Array(items) => {
            let ptr = Rc::as_ptr(items).cast::<()>();
            if path.contains(&ptr) {
                return Err(Cycle);
            }
            path.push(ptr);
            let copied = items
                .borrow()
                .iter()
                .map(|item| snapshot_inner(item, path))
                .collect::<Result<Vec<_>, _>>();
            path.pop();
            Json::Array(copied?)
        }
        Value::Object(fields) => {
            let ptr = Rc::as_ptr(fields).cast::<()>();
            if path.contains(&ptr) {
                return Err(Cycle);
            }
            path.push(ptr);
            let mut map = Map::new();
            let mut result = Ok(());
            for (key, field) in fields.borrow().iter() {
                if field.is_function() || matches!(field, Value::Undefined) {
                    continue;
                }
                match snapshot_inner(field, path) {
                    Ok(json) => {
                        map.insert(key.clone(), json);
                    }
                    Err(cycle) => {
                        result = Err(cycle);
                        break;
                    }
                }
            }
            path.pop();
            result?;
            Json::Object(map)
        }
    })
}

/// Integral values in the safe range become JSON integers; NaN and the
/// infinities become `null` as `JSON.stringify` does.
fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        // -0 collapses to 0 here
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashMap;
    use serde_json::json;

    #[test]
    fn test_primitive_snapshots() {
        assert_eq!(to_snapshot(&Value::Number(4.0)), Some(json!(4)));
        assert_eq!(to_snapshot(&Value::Number(2.5)), Some(json!(2.5)));
        assert_eq!(to_snapshot(&Value::Number(f64::NAN)), Some(json!(null)));
        assert_eq!(to_snapshot(&Value::string("hi")), Some(json!("hi")));
        assert_eq!(to_snapshot(&Value::Undefined), Some(json!(null)));
    }

    #[test]
    fn test_bigint_is_stringified() {
        let big = BigInt::parse_bytes(b"123456789012345678901234567890", 10).unwrap();
        assert_eq!(
            to_snapshot(&Value::BigInt(big)),
            Some(json!("123456789012345678901234567890"))
        );
    }

    #[test]
    fn test_nested_containers_are_deep_copied() {
        let inner = Value::array(vec![Value::Number(1.0), Value::Number(2.0)]);
        let outer = Value::array(vec![inner.clone(), inner.clone()]);
        let snapshot = to_snapshot(&outer).unwrap();

        if let Value::Array(items) = &inner {
            items.borrow_mut().push(Value::Number(3.0));
        }
        // Shared but acyclic references are fine, and the copy is detached
        assert_eq!(snapshot, json!([[1, 2], [1, 2]]));
    }

    #[test]
    fn test_functions_are_omitted() {
        let mut fields = FxHashMap::default();
        fields.insert("f".to_string(), Value::Native(crate::memory::value::NativeFunction("parseInt")));
        fields.insert("n".to_string(), Value::Number(1.0));
        let object = Value::object(fields);

        assert_eq!(to_snapshot(&object), Some(json!({ "n": 1 })));
        assert_eq!(
            to_snapshot(&Value::Native(crate::memory::value::NativeFunction("parseInt"))),
            None
        );
    }

    #[test]
    fn test_cycle_yields_none() {
        let array = Value::array(Vec::new());
        if let Value::Array(items) = &array {
            items.borrow_mut().push(array.clone());
        }
        assert_eq!(to_snapshot(&array), None);
        // Break the cycle so the test does not leak
        if let Value::Array(items) = &array {
            items.borrow_mut().clear();
        }
    }

    #[test]
    fn test_trace_serializes_as_array() {
        let mut scope = Map::new();
        scope.insert("x".to_string(), json!(1));
        let trace: Trace = vec![TraceStep::new(1, scope)].into_iter().collect();

        let text = serde_json::to_string(&trace).unwrap();
        assert_eq!(text, r#"[{"lineNumber":1,"scope":{"x":1}}]"#);
    }
}
