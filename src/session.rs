//! One user's condition-builder session.
//!
//! A [`Session`] owns the catalog, the validator, the optional suggestion
//! source, the schema declared over them and the single live tree. Every
//! edit goes through the tree's cascade; reads of the composed filter run
//! serialize → convert → visit.

use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::ast::{LogicalExpression, Operand};
use crate::catalog::FieldCatalog;
use crate::config::CatalogConfig;
use crate::convert::convert;
use crate::error::Result;
use crate::markup::MarkupVisitor;
use crate::schema::SchemaNode;
use crate::schema::where_schema::{
    self, CONDITION, FIELD, IN_OPERAND, LOGICAL, LOGICAL_OP, OPERATOR, WhereSchema,
};
use crate::serialize::serialize;
use crate::suggest::Suggest;
use crate::tree::{NodeId, Tree};
use crate::validator::Validator;

pub struct Session {
    catalog: Rc<FieldCatalog>,
    validator: Rc<Validator>,
    schema: Rc<SchemaNode>,
    tree: Tree,
    visitor: MarkupVisitor,
}

impl Session {
    /// Session over `catalog` with type-only validation and no suggestions.
    pub fn new(catalog: FieldCatalog) -> Result<Self> {
        let catalog = Rc::new(catalog);
        let validator = Validator::new(Rc::clone(&catalog));
        Self::with_parts(catalog, validator, None)
    }

    pub fn with_parts(
        catalog: Rc<FieldCatalog>,
        validator: Validator,
        suggest: Option<Rc<dyn Suggest>>,
    ) -> Result<Self> {
        let validator = Rc::new(validator);
        let mut factory = WhereSchema::new(Rc::clone(&catalog), Rc::clone(&validator));
        if let Some(suggest) = suggest {
            factory = factory.with_suggest(suggest);
        }
        let schema = factory.factory()?;
        let tree = Tree::build(Rc::clone(&schema));
        let visitor = MarkupVisitor::for_catalog(Rc::clone(&catalog), Rc::clone(&validator));
        debug!(fields = catalog.fields().len(), "session created");
        Ok(Self {
            catalog,
            validator,
            schema,
            tree,
            visitor,
        })
    }

    /// Session from a loaded configuration, with its rules and suggestions.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let catalog = Rc::new(config.catalog()?);
        let validator = config.validator(Rc::clone(&catalog));
        let suggestions = config.suggestions();
        let suggest: Option<Rc<dyn Suggest>> = if suggestions.is_empty() {
            None
        } else {
            Some(Rc::new(suggestions))
        };
        Self::with_parts(catalog, validator, suggest)
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Direct tree access for hosts driving expressions by id.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Discard all edits and start over from the schema.
    pub fn reset(&mut self) {
        self.tree = Tree::build(Rc::clone(&self.schema));
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Reachable conditions, in document order.
    pub fn conditions(&self) -> Vec<NodeId> {
        self.tree.nodes_with_id(CONDITION)
    }

    /// Reachable logical groups, root first.
    pub fn groups(&self) -> Vec<NodeId> {
        self.tree.nodes_with_id(LOGICAL)
    }

    pub fn add_condition(&mut self, group: NodeId) -> Result<NodeId> {
        self.tree.add_child(group, CONDITION)
    }

    /// Add a nested logical group; it starts with one default condition.
    pub fn add_group(&mut self, group: NodeId) -> Result<NodeId> {
        self.tree.add_child(group, LOGICAL)
    }

    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.tree.remove_child(parent, child)
    }

    /// Switch a group between `AND` and `OR`.
    pub fn set_logical_operator(&mut self, group: NodeId, op: &str) -> Result<()> {
        self.tree.change(group, LOGICAL_OP, Value::from(op))
    }

    pub fn set_field(&mut self, condition: NodeId, key: &str) -> Result<()> {
        self.tree.change(condition, FIELD, Value::from(key))
    }

    pub fn set_operator(&mut self, condition: NodeId, operator: &str) -> Result<()> {
        self.tree.change(condition, OPERATOR, Value::from(operator))
    }

    /// Edit an operand input (`#value`, `#from`, `#to`). A list given for
    /// `#in-operand` replaces it under the same rule as [`Session::add_value`].
    pub fn set_operand(&mut self, condition: NodeId, id: &str, value: Value) -> Result<()> {
        self.tree.change(condition, id, value)
    }

    /// Add to the `in` list; falsy and duplicate values are ignored.
    pub fn add_value(&mut self, condition: NodeId, value: Value) -> Result<()> {
        self.tree.add_value(condition, IN_OPERAND, value)
    }

    pub fn remove_value(&mut self, condition: NodeId, value: &Value) -> Result<bool> {
        self.tree.remove_value(condition, IN_OPERAND, value)
    }

    pub fn operand(&self, condition: NodeId) -> Result<Operand> {
        where_schema::operand(&self.tree, condition)
    }

    /// Canonical filter object of the whole tree.
    pub fn serialize(&self) -> Option<Value> {
        serialize(&self.tree)
    }

    pub fn expression(&self) -> Option<LogicalExpression> {
        self.serialize().as_ref().and_then(convert)
    }

    /// Display string of the composed filter, `None` when it is empty.
    pub fn markup(&self) -> Option<String> {
        self.expression().map(|ast| self.visitor.visit(&ast))
    }
}
