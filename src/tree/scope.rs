//! Evaluation contexts handed to schema rules and hooks.
//!
//! [`Scope`] is the read-only view used by computed attributes, label
//! getters and validators. [`Cascade`] is the mutable view given to
//! `change`, `refresh` and `add` hooks; every edit it makes goes through the
//! owning [`Tree`], which enforces the re-entrancy rule on replacements.

use serde_json::Value;

use super::{Expression, Line, Node, NodeId, Tree};
use crate::error::Result;
use crate::schema::SchemaBuilder;

/// Read-only view of one node and, optionally, one of its expressions.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    tree: &'a Tree,
    node: NodeId,
    owner: &'a Node,
    expression: Option<&'a Expression>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        tree: &'a Tree,
        node: NodeId,
        owner: &'a Node,
        expression: Option<&'a Expression>,
    ) -> Self {
        Self {
            tree,
            node,
            owner,
            expression,
        }
    }

    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn node(&self) -> &'a Node {
        self.owner
    }

    /// Line of the owning node.
    pub fn line(&self) -> &'a Line {
        self.owner.line()
    }

    pub fn expression(&self) -> Option<&'a Expression> {
        self.expression
    }

    pub fn value(&self) -> Option<&'a Value> {
        self.expression.and_then(Expression::value)
    }

    pub fn values(&self) -> &'a [Value] {
        self.expression.and_then(Expression::values).unwrap_or(&[])
    }

    /// Value of another expression in the owning node's Line.
    pub fn value_of(&self, id: &str) -> Option<&'a Value> {
        self.line().find(id).and_then(Expression::value)
    }

    pub fn has_value(&self) -> bool {
        self.expression.is_some_and(Expression::has_value)
    }

    /// Run the expression's validator. No validator means no problems.
    pub fn validate(&self) -> Vec<String> {
        match self
            .expression
            .and_then(|expr| expr.schema().spec.validate.as_ref())
        {
            Some(rule) => rule(self),
            None => Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

/// Mutable context of a running hook.
pub struct Cascade<'a> {
    tree: &'a mut Tree,
    node: NodeId,
    expr: String,
}

impl<'a> Cascade<'a> {
    pub(crate) fn new(tree: &'a mut Tree, node: NodeId, expr: impl Into<String>) -> Self {
        Self {
            tree,
            node,
            expr: expr.into(),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Id of the expression whose hook is running.
    pub fn expr_id(&self) -> &str {
        &self.expr
    }

    pub fn tree(&self) -> &Tree {
        self.tree
    }

    /// Read-only view of the hook's own expression.
    pub fn scope(&self) -> Result<Scope<'_>> {
        self.tree.scope(self.node, Some(&self.expr))
    }

    pub fn line(&self) -> &Line {
        self.tree.slot(self.node).line()
    }

    pub fn value(&self) -> Option<&Value> {
        self.line().find(&self.expr).and_then(Expression::value)
    }

    pub fn values(&self) -> &[Value] {
        self.line()
            .find(&self.expr)
            .and_then(Expression::values)
            .unwrap_or(&[])
    }

    pub fn value_of(&self, id: &str) -> Option<&Value> {
        self.line().find(id).and_then(Expression::value)
    }

    /// Assign without firing the target's change hook.
    pub fn set_value(&mut self, id: &str, value: Value) -> Result<()> {
        self.tree.set_value(self.node, id, value)
    }

    pub fn clear(&mut self, id: &str) -> Result<()> {
        self.tree.clear(self.node, id)
    }

    /// Append to the hook's own multiselect.
    pub fn push_value(&mut self, value: Value) -> Result<()> {
        self.tree.push_value(self.node, &self.expr, value)
    }

    /// Replace the options of the hook's own expression.
    pub fn set_options(&mut self, options: Vec<Value>) -> Result<()> {
        self.tree.set_options(self.node, &self.expr, options)
    }

    /// Run the change hook of `id` on the same node.
    pub fn fire(&mut self, id: &str) -> Result<()> {
        self.tree.fire_change(self.node, id)
    }

    pub fn validate(&self, id: &str) -> Result<Vec<String>> {
        self.tree.validate(self.node, id)
    }

    /// Replace the Line entry `id` of this node with a freshly declared group.
    pub fn put(&mut self, id: &str, declare: impl FnOnce(&mut SchemaBuilder)) -> Result<()> {
        self.tree.put(self.node, id, declare)
    }

    /// Like [`Cascade::put`] on another node. Strict ancestors of a node
    /// whose hook is running are refused.
    pub fn put_at(
        &mut self,
        target: NodeId,
        id: &str,
        declare: impl FnOnce(&mut SchemaBuilder),
    ) -> Result<()> {
        self.tree.put(target, id, declare)
    }
}
