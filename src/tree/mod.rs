//! Runtime expression tree instantiated from a schema.
//!
//! Nodes live in an arena owned by [`Tree`] and are addressed by
//! [`NodeId`]. Each node owns a [`Line`] of expressions; child nodes are
//! kept as an ordered id list. Detached nodes stay in the arena but are no
//! longer reachable from the root.
//!
//! All state changes go through the tree. User actions ([`Tree::change`],
//! [`Tree::add_value`], [`Tree::refresh`]) assign the new state and then run
//! the schema hook, which may cascade into further edits through a
//! [`Cascade`]. The tree keeps a stack of nodes whose hooks are running and
//! refuses to replace Line entries on a strict ancestor of any of them.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{BindingError, Error, Result};
use crate::schema::{Hook, NodeKind, SchemaBuilder, SchemaNode};

mod line;
mod scope;

pub use line::{ExprState, Expression, Line};
pub use scope::{Cascade, Scope};

/// Handle to a node in a [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One instantiated schema node.
#[derive(Clone, Debug)]
pub struct Node {
    schema: Rc<SchemaNode>,
    line: Line,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn id(&self) -> &str {
        &self.schema.id
    }

    pub fn schema(&self) -> &Rc<SchemaNode> {
        &self.schema
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    /// Nodes whose hooks are currently running, innermost last.
    active: Vec<NodeId>,
}

impl Tree {
    /// Instantiate `schema`: its Line in declaration order, then one child
    /// per node template, recursively.
    pub fn build(schema: Rc<SchemaNode>) -> Self {
        let mut tree = Tree {
            nodes: Vec::new(),
            root: NodeId(0),
            active: Vec::new(),
        };
        tree.root = tree.instantiate(schema, None);
        tree
    }

    fn instantiate(&mut self, schema: Rc<SchemaNode>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let templates = schema.nodes.clone();
        self.nodes.push(Node {
            line: Line::instantiate(&schema.line),
            schema,
            children: Vec::new(),
            parent,
        });
        for template in templates {
            let child = self.instantiate(template, Some(id));
            self.nodes[id.0].children.push(child);
        }
        id
    }

    // ── Structure ────────────────────────────────────────────────────

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(Error::UnknownNode(id))
    }

    /// Node lookup for ids already validated by this tree.
    pub(crate) fn slot(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    pub fn line(&self, id: NodeId) -> Result<&Line> {
        Ok(self.node(id)?.line())
    }

    /// Expression `id` in the node's Line, searching nested groups.
    pub fn expression(&self, node: NodeId, id: &str) -> Result<&Expression> {
        self.node(node)?
            .line
            .find(id)
            .ok_or_else(|| BindingError::MissingEntry(id.to_owned()).into())
    }

    fn expression_mut(&mut self, node: NodeId, id: &str) -> Result<&mut Expression> {
        self.nodes
            .get_mut(node.0)
            .ok_or(Error::UnknownNode(node))?
            .line
            .find_mut(id)
            .ok_or_else(|| BindingError::MissingEntry(id.to_owned()).into())
    }

    /// Read-only evaluation scope for a node or one of its expressions.
    pub fn scope(&self, node: NodeId, expr: Option<&str>) -> Result<Scope<'_>> {
        let owner = self.node(node)?;
        let expression = match expr {
            Some(id) => Some(self.expression(node, id)?),
            None => None,
        };
        Ok(Scope::new(self, node, owner, expression))
    }

    /// Reachable nodes below and including `id`, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.node(id)?;
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Reachable nodes instantiated from the schema node `schema_id`.
    pub fn nodes_with_id(&self, schema_id: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .unwrap_or_default()
            .into_iter()
            .filter(|id| self.nodes[id.0].id() == schema_id)
            .collect()
    }

    /// True if `id` is the root or hangs below it.
    pub fn is_reachable(&self, id: NodeId) -> bool {
        id == self.root || self.is_ancestor(self.root, id)
    }

    /// True if `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes.get(node.0).and_then(|n| n.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes[parent.0].parent;
        }
        false
    }

    /// Append a child instantiated from `template`.
    ///
    /// The template is looked up among the parent's node templates. A parent
    /// may also instantiate its own schema, which is how logical groups nest.
    pub fn add_child(&mut self, parent: NodeId, template: &str) -> Result<NodeId> {
        let parent_schema = Rc::clone(&self.node(parent)?.schema);
        let schema = match parent_schema.template(template) {
            Some(schema) => Rc::clone(schema),
            None if parent_schema.id == template => Rc::clone(&parent_schema),
            None => return Err(BindingError::UnknownTemplate(template.to_owned()).into()),
        };
        let child = self.instantiate(schema, Some(parent));
        self.nodes[parent.0].children.push(child);
        debug!(%parent, %child, template, "child node added");
        Ok(child)
    }

    /// Detach `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let node = self
            .nodes
            .get_mut(parent.0)
            .ok_or(Error::UnknownNode(parent))?;
        let index = node
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(Error::UnknownNode(child))?;
        node.children.remove(index);
        self.nodes[child.0].parent = None;
        debug!(%parent, %child, "child node removed");
        Ok(())
    }

    // ── User actions ─────────────────────────────────────────────────

    /// Assign `value` to `id` and run its change hook.
    ///
    /// If the hook fails, the previous value is restored before the error is
    /// returned. Edits the hook made before failing are kept. A multiselect
    /// is emptied and then refilled item by item through [`Tree::add_value`],
    /// so its add rule applies to every item.
    pub fn change(&mut self, node: NodeId, id: &str, value: Value) -> Result<()> {
        let expr = self.expression(node, id)?;
        if expr.kind() == NodeKind::MultiSelect {
            return self.replace_values(node, id, value);
        }
        let previous = expr.value().cloned();
        self.set_value(node, id, value)?;
        if let Err(err) = self.fire_change(node, id) {
            if let Some(previous) = previous {
                debug!(%node, expr = id, error = %err, "change hook failed, value restored");
                self.set_value(node, id, previous)?;
            }
            return Err(err);
        }
        Ok(())
    }

    fn replace_values(&mut self, node: NodeId, id: &str, value: Value) -> Result<()> {
        let items = match value {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        self.clear(node, id)?;
        for item in items {
            self.add_value(node, id, item)?;
        }
        self.fire_change(node, id)
    }

    /// Add `value` to a multiselect through its add hook, or append it when
    /// the schema declares none.
    pub fn add_value(&mut self, node: NodeId, id: &str, value: Value) -> Result<()> {
        let expr = self.expression(node, id)?;
        if expr.kind() != NodeKind::MultiSelect {
            return Err(BindingError::NotAValue(id.to_owned()).into());
        }
        match expr.schema().spec.add.clone() {
            Some(hook) => {
                trace!(%node, expr = id, "running add hook");
                self.active.push(node);
                let result = hook(&mut Cascade::new(self, node, id), value);
                self.active.pop();
                result
            }
            None => self.push_value(node, id, value),
        }
    }

    /// Remove every occurrence of `value` from a multiselect.
    pub fn remove_value(&mut self, node: NodeId, id: &str, value: &Value) -> Result<bool> {
        let expr = self.expression_mut(node, id)?;
        if expr.kind() != NodeKind::MultiSelect {
            return Err(BindingError::NotAValue(id.to_owned()).into());
        }
        Ok(expr.remove(value))
    }

    /// Run the refresh hook of `id`, if any.
    pub fn refresh(&mut self, node: NodeId, id: &str) -> Result<()> {
        let hook = self.expression(node, id)?.schema().spec.refresh.clone();
        match hook {
            Some(hook) => self.run_hook(node, id, &hook),
            None => Ok(()),
        }
    }

    // ── Hook-level edits ─────────────────────────────────────────────

    /// Assign without running hooks.
    pub fn set_value(&mut self, node: NodeId, id: &str, value: Value) -> Result<()> {
        let expr = self.expression_mut(node, id)?;
        if expr.assign(value) {
            Ok(())
        } else {
            Err(BindingError::NotAValue(id.to_owned()).into())
        }
    }

    pub fn clear(&mut self, node: NodeId, id: &str) -> Result<()> {
        self.expression_mut(node, id)?.clear();
        Ok(())
    }

    pub(crate) fn push_value(&mut self, node: NodeId, id: &str, value: Value) -> Result<()> {
        if self.expression_mut(node, id)?.push(value) {
            Ok(())
        } else {
            Err(BindingError::NotAValue(id.to_owned()).into())
        }
    }

    pub(crate) fn set_options(&mut self, node: NodeId, id: &str, options: Vec<Value>) -> Result<()> {
        self.expression_mut(node, id)?.set_options(options);
        Ok(())
    }

    /// Run the change hook of `id` without assigning anything.
    pub fn fire_change(&mut self, node: NodeId, id: &str) -> Result<()> {
        let hook = self.expression(node, id)?.schema().spec.change.clone();
        match hook {
            Some(hook) => self.run_hook(node, id, &hook),
            None => Ok(()),
        }
    }

    fn run_hook(&mut self, node: NodeId, id: &str, hook: &Hook) -> Result<()> {
        trace!(%node, expr = id, depth = self.active.len(), "running hook");
        self.active.push(node);
        let result = hook(&mut Cascade::new(self, node, id));
        self.active.pop();
        result
    }

    /// Replace the top-level Line entry `id` of `node` with a group built by
    /// `declare`, or append it if absent.
    pub fn put(
        &mut self,
        node: NodeId,
        id: &str,
        declare: impl FnOnce(&mut SchemaBuilder),
    ) -> Result<()> {
        self.node(node)?;
        if let Some(&active) = self
            .active
            .iter()
            .find(|&&active| self.is_ancestor(node, active))
        {
            return Err(Error::ReentrantReplace {
                active,
                target: node,
                id: id.to_owned(),
            });
        }

        let mut scope = SchemaBuilder::scoped(id, NodeKind::Group);
        declare(&mut scope);
        let schema = Rc::new(scope.finish()?);
        debug!(%node, group = id, entries = schema.line.len(), "line entry replaced");
        self.nodes[node.0].line.put(Expression::instantiate(schema));
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Options of a select: refreshed options if a hook set them, otherwise
    /// the declared rule evaluated now.
    pub fn options(&self, node: NodeId, id: &str) -> Result<Vec<Value>> {
        let expr = self.expression(node, id)?;
        if let Some(options) = expr.refreshed_options() {
            return Ok(options.to_vec());
        }
        match &expr.schema().spec.options {
            Some(rule) => Ok(rule.eval(&Scope::new(self, node, self.slot(node), Some(expr)))),
            None => Ok(Vec::new()),
        }
    }

    /// Current value of a select, checked against its options.
    pub fn selected(&self, node: NodeId, id: &str) -> Result<Value> {
        let value = self
            .expression(node, id)?
            .value()
            .ok_or_else(|| BindingError::NotAValue(id.to_owned()))?;
        let options = self.options(node, id)?;
        if value.is_null() || options.is_empty() || options.contains(value) {
            Ok(value.clone())
        } else {
            Err(BindingError::ValueOutOfRange {
                id: id.to_owned(),
                value: value.to_string(),
            }
            .into())
        }
    }

    /// Active class names of a node (`expr = None`) or of one expression,
    /// in declaration order.
    pub fn classes(&self, node: NodeId, expr: Option<&str>) -> Result<Vec<String>> {
        let scope = self.scope(node, expr)?;
        let spec = match scope.expression() {
            Some(expression) => &expression.schema().spec,
            None => &scope.node().schema.spec,
        };
        Ok(spec
            .classes
            .iter()
            .filter(|(_, flag)| flag.eval(&scope))
            .map(|(name, _)| name.clone())
            .collect())
    }

    /// Active class names of the node itself.
    pub fn node_classes(&self, node: NodeId) -> Result<Vec<String>> {
        self.classes(node, None)
    }

    pub fn validate(&self, node: NodeId, id: &str) -> Result<Vec<String>> {
        Ok(self.scope(node, Some(id))?.validate())
    }

    pub fn is_valid(&self, node: NodeId, id: &str) -> Result<bool> {
        Ok(self.validate(node, id)?.is_empty())
    }

    /// Display text for option `key` of a select.
    pub fn label(&self, node: NodeId, id: &str, key: &str) -> Result<Option<String>> {
        let scope = self.scope(node, Some(id))?;
        Ok(scope
            .expression()
            .and_then(|expr| expr.schema().spec.label.as_ref())
            .and_then(|getter| getter(&scope, key)))
    }

    /// Type name for option `key` of a select.
    pub fn type_of(&self, node: NodeId, id: &str, key: &str) -> Result<Option<String>> {
        let scope = self.scope(node, Some(id))?;
        Ok(scope
            .expression()
            .and_then(|expr| expr.schema().spec.type_of.as_ref())
            .and_then(|getter| getter(&scope, key)))
    }

    pub fn placeholder(&self, node: NodeId, id: &str) -> Result<Option<&str>> {
        Ok(self.expression(node, id)?.schema().spec.placeholder.as_deref())
    }
}

#[cfg(test)]
mod tests;
