//! WebAssembly bindings exposed through `wasm-bindgen`.
//! The handle wraps one [`Session`]; node ids cross the boundary as plain
//! integers and filter values as JS objects.

#![cfg(feature = "wasm-bindings")]

use wasm_bindgen::prelude::*;

use serde_wasm_bindgen::{from_value, to_value};

use crate::config::CatalogConfig;
use crate::convert::convert;
use crate::session::Session;
use crate::tree::NodeId;

/// A condition-builder session owned from JavaScript.
#[wasm_bindgen]
pub struct SessionHandle {
    inner: Session,
}

#[wasm_bindgen]
impl SessionHandle {
    #[wasm_bindgen(js_name = rootId)]
    pub fn root_id(&self) -> Result<u32, JsValue> {
        node_to_js(self.inner.root())
    }

    /// Ids of every reachable condition.
    pub fn conditions(&self) -> Result<Vec<u32>, JsValue> {
        self.inner.conditions().into_iter().map(node_to_js).collect()
    }

    #[wasm_bindgen(js_name = addCondition)]
    pub fn add_condition(&mut self, group: u32) -> Result<u32, JsValue> {
        let group = self.node(group)?;
        self.inner
            .add_condition(group)
            .map_err(to_js_error)
            .and_then(node_to_js)
    }

    #[wasm_bindgen(js_name = addGroup)]
    pub fn add_group(&mut self, group: u32) -> Result<u32, JsValue> {
        let group = self.node(group)?;
        self.inner
            .add_group(group)
            .map_err(to_js_error)
            .and_then(node_to_js)
    }

    pub fn remove(&mut self, parent: u32, child: u32) -> Result<(), JsValue> {
        let (parent, child) = (self.node(parent)?, self.node(child)?);
        self.inner.remove(parent, child).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setLogicalOperator)]
    pub fn set_logical_operator(&mut self, group: u32, op: &str) -> Result<(), JsValue> {
        let group = self.node(group)?;
        self.inner
            .set_logical_operator(group, op)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setField)]
    pub fn set_field(&mut self, condition: u32, key: &str) -> Result<(), JsValue> {
        let condition = self.node(condition)?;
        self.inner
            .set_field(condition, key)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setOperator)]
    pub fn set_operator(&mut self, condition: u32, operator: &str) -> Result<(), JsValue> {
        let condition = self.node(condition)?;
        self.inner
            .set_operator(condition, operator)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setOperand)]
    pub fn set_operand(&mut self, condition: u32, id: &str, value: JsValue) -> Result<(), JsValue> {
        let condition = self.node(condition)?;
        let value: serde_json::Value =
            from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))?;
        self.inner
            .set_operand(condition, id, value)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = addValue)]
    pub fn add_value(&mut self, condition: u32, value: JsValue) -> Result<(), JsValue> {
        let condition = self.node(condition)?;
        let value: serde_json::Value =
            from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))?;
        self.inner
            .add_value(condition, value)
            .map_err(to_js_error)
    }

    /// Canonical filter object, or `null` for an empty tree.
    pub fn serialize(&self) -> Result<JsValue, JsValue> {
        to_value(&self.inner.serialize()).map_err(|err| JsValue::from_str(&err.to_string()))
    }

    pub fn markup(&self) -> Option<String> {
        self.inner.markup()
    }
}

impl SessionHandle {
    /// Node handle for `id` while it is still reachable from the root.
    fn reachable(&self, id: u32) -> Option<NodeId> {
        let node = NodeId::from_index(usize::try_from(id).ok()?);
        self.inner.tree().is_reachable(node).then_some(node)
    }

    fn node(&self, id: u32) -> Result<NodeId, JsValue> {
        self.reachable(id)
            .ok_or_else(|| JsValue::from_str(&format!("node {id} is not part of the tree")))
    }
}

/// Create a session from a YAML catalog configuration.
#[wasm_bindgen(js_name = loadSession)]
pub fn load_session(yaml: &str) -> Result<SessionHandle, JsValue> {
    console_error_panic_hook::set_once();
    let config = CatalogConfig::from_yaml_str(yaml).map_err(to_js_error)?;
    let inner = Session::from_config(&config).map_err(to_js_error)?;
    Ok(SessionHandle { inner })
}

/// Convert a canonical filter object into its logical-expression AST.
#[wasm_bindgen(js_name = convertFilter)]
pub fn convert_filter(filter: JsValue) -> Result<JsValue, JsValue> {
    let filter: serde_json::Value =
        from_value(filter).map_err(|err| JsValue::from_str(&err.to_string()))?;
    to_value(&convert(&filter)).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn node_to_js(id: NodeId) -> Result<u32, JsValue> {
    u32::try_from(id.index())
        .map_err(|_| JsValue::from_str(&format!("node {id} does not fit a 32-bit id")))
}

fn to_js_error(err: crate::error::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_session_from_yaml() {
        let yaml = r#"
fields:
  - key: age
    title: Age
    type: number
"#;
        let mut handle = load_session(yaml).expect("session loads");
        let condition = handle.conditions().expect("ids fit")[0];
        handle.set_operator(condition, "is empty").expect("operator set");
        assert_eq!(handle.markup().as_deref(), Some("Age is empty"));
        assert_eq!(handle.root_id().expect("root id fits"), 0);
    }

    #[test]
    fn detached_condition_is_refused() {
        let yaml = r#"
fields:
  - key: age
    title: Age
    type: number
"#;
        let mut handle = load_session(yaml).expect("session loads");
        let root = handle.root_id().expect("root id fits");
        let condition = handle.conditions().expect("ids fit")[0];
        handle.remove(root, condition).expect("condition removed");
        assert_eq!(handle.reachable(condition), None);
        assert!(handle.reachable(root).is_some());
        assert!(handle.conditions().expect("ids fit").is_empty());
    }
}
