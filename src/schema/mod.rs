//! Declarative schema model for the expression tree.
//!
//! A schema is a tree of [`SchemaNode`] descriptors. Each descriptor
//! declares its kind, static attributes, dynamic attribute rules and hooks.
//! Container kinds (`Node`, `Group`) declare child expression descriptors
//! that form their Line, and `Node` descriptors may declare child node
//! templates. Descriptors are pure description: instantiating them is the
//! job of [`crate::tree::Tree`].
//!
//! Dynamic attributes are [`Attr::Computed`] rules evaluated against an
//! explicit [`Scope`]; they never capture tree references. Mutation is
//! reserved for the `change`, `refresh` and `add` hooks, which receive a
//! [`Cascade`].

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;
use crate::tree::{Cascade, Scope};

pub mod builder;
pub mod where_schema;

pub use builder::{SchemaBuilder, build};

// ── Kinds and attribute rules ────────────────────────────────────────

/// Kind of a schema descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Tree node owning a Line and child nodes (logical group, condition).
    Node,
    /// Nested container inside a Line (operand group).
    Group,
    Select,
    MultiSelect,
    Input,
    Label,
}

impl NodeKind {
    pub const fn is_container(self) -> bool {
        matches!(self, NodeKind::Node | NodeKind::Group)
    }
}

pub type Computed<T> = Rc<dyn Fn(&Scope<'_>) -> T>;
pub type Hook = Rc<dyn Fn(&mut Cascade<'_>) -> Result<()>>;
pub type AddHook = Rc<dyn Fn(&mut Cascade<'_>, Value) -> Result<()>>;
pub type ValidateFn = Rc<dyn Fn(&Scope<'_>) -> Vec<String>>;
pub type KeyGetter = Rc<dyn Fn(&Scope<'_>, &str) -> Option<String>>;

/// An attribute value: fixed, or computed from the current state on read.
pub enum Attr<T> {
    Static(T),
    Computed(Computed<T>),
}

impl<T: Clone> Attr<T> {
    pub fn computed(rule: impl Fn(&Scope<'_>) -> T + 'static) -> Self {
        Attr::Computed(Rc::new(rule))
    }

    pub fn eval(&self, scope: &Scope<'_>) -> T {
        match self {
            Attr::Static(value) => value.clone(),
            Attr::Computed(rule) => rule(scope),
        }
    }
}

impl<T> From<T> for Attr<T> {
    fn from(value: T) -> Self {
        Attr::Static(value)
    }
}

impl<T: Clone> Clone for Attr<T> {
    fn clone(&self) -> Self {
        match self {
            Attr::Static(value) => Attr::Static(value.clone()),
            Attr::Computed(rule) => Attr::Computed(Rc::clone(rule)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Attr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Attr::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

// ── Serialization projection ─────────────────────────────────────────

/// Which property of a Line expression a projection reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    Value,
    Values,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SerializeEntry {
    /// Copy `property` of the Line expression `source` to `key`.
    Project {
        source: String,
        property: Projection,
        key: String,
    },
    /// Emit a fixed `key: value` pair.
    Constant { key: String, value: Value },
}

/// How a node contributes to the canonical filter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SerializeSpec {
    entries: Vec<SerializeEntry>,
}

impl SerializeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(
        mut self,
        source: impl Into<String>,
        property: Projection,
        key: impl Into<String>,
    ) -> Self {
        self.entries.push(SerializeEntry::Project {
            source: source.into(),
            property,
            key: key.into(),
        });
        self
    }

    pub fn constant(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push(SerializeEntry::Constant {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn entries(&self) -> &[SerializeEntry] {
        &self.entries
    }
}

// ── Descriptor attributes ────────────────────────────────────────────

/// Static attributes, rules and hooks of one descriptor.
#[derive(Clone, Default)]
pub struct ExprSpec {
    pub(crate) classes: Vec<(String, Attr<bool>)>,
    pub(crate) options: Option<Attr<Vec<Value>>>,
    pub(crate) value: Value,
    pub(crate) values: Vec<Value>,
    pub(crate) text: Option<String>,
    pub(crate) placeholder: Option<String>,
    pub(crate) label: Option<KeyGetter>,
    pub(crate) type_of: Option<KeyGetter>,
    pub(crate) change: Option<Hook>,
    pub(crate) refresh: Option<Hook>,
    pub(crate) validate: Option<ValidateFn>,
    pub(crate) add: Option<AddHook>,
}

impl ExprSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class flag, static or computed.
    pub fn class(mut self, name: impl Into<String>, flag: impl Into<Attr<bool>>) -> Self {
        self.classes.push((name.into(), flag.into()));
        self
    }

    /// Declare several always-on class flags.
    pub fn classes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.classes.push((name.into(), Attr::Static(true)));
        }
        self
    }

    pub fn options(mut self, options: impl Into<Attr<Vec<Value>>>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Initial value for select and input kinds.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Initial values for multiselect kinds.
    pub fn values(mut self, values: Vec<Value>) -> Self {
        self.values = values;
        self
    }

    /// Text of a label.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    pub fn label(mut self, getter: impl Fn(&Scope<'_>, &str) -> Option<String> + 'static) -> Self {
        self.label = Some(Rc::new(getter));
        self
    }

    pub fn type_of(
        mut self,
        getter: impl Fn(&Scope<'_>, &str) -> Option<String> + 'static,
    ) -> Self {
        self.type_of = Some(Rc::new(getter));
        self
    }

    pub fn on_change(mut self, hook: impl Fn(&mut Cascade<'_>) -> Result<()> + 'static) -> Self {
        self.change = Some(Rc::new(hook));
        self
    }

    pub fn on_refresh(mut self, hook: impl Fn(&mut Cascade<'_>) -> Result<()> + 'static) -> Self {
        self.refresh = Some(Rc::new(hook));
        self
    }

    pub fn on_add(
        mut self,
        hook: impl Fn(&mut Cascade<'_>, Value) -> Result<()> + 'static,
    ) -> Self {
        self.add = Some(Rc::new(hook));
        self
    }

    /// Validation rule. Must not mutate anything.
    pub fn validate(mut self, rule: impl Fn(&Scope<'_>) -> Vec<String> + 'static) -> Self {
        self.validate = Some(Rc::new(rule));
        self
    }
}

impl fmt::Debug for ExprSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classes: Vec<&str> = self.classes.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("ExprSpec")
            .field("classes", &classes)
            .field("options", &self.options)
            .field("value", &self.value)
            .field("values", &self.values)
            .field("text", &self.text)
            .field("has_change", &self.change.is_some())
            .field("has_refresh", &self.refresh.is_some())
            .field("has_validate", &self.validate.is_some())
            .field("has_add", &self.add.is_some())
            .finish()
    }
}

/// Node-level attribute accepted by [`SchemaBuilder::attr`].
#[derive(Clone, Debug)]
pub enum NodeAttr {
    Serialize(SerializeSpec),
    Class(String, Attr<bool>),
}

impl NodeAttr {
    pub fn class(name: impl Into<String>, flag: impl Into<Attr<bool>>) -> Self {
        NodeAttr::Class(name.into(), flag.into())
    }
}

// ── Descriptor ───────────────────────────────────────────────────────

/// One node of the declarative schema.
#[derive(Clone, Debug)]
pub struct SchemaNode {
    pub id: String,
    pub kind: NodeKind,
    pub spec: ExprSpec,
    pub serialize: Option<SerializeSpec>,
    /// Child expression descriptors, in declaration order.
    pub line: Vec<Rc<SchemaNode>>,
    /// Child node templates.
    pub nodes: Vec<Rc<SchemaNode>>,
}

impl SchemaNode {
    pub fn template(&self, id: &str) -> Option<&Rc<SchemaNode>> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
