//! Chained schema builder.
//!
//! Every chaining method returns `&mut Self`. The first authoring mistake
//! (a duplicate sibling id) is remembered and surfaced by
//! [`SchemaBuilder::factory`]; later declarations are still accepted so the
//! closure can run to completion.

use std::rc::Rc;

use tracing::warn;

use super::{ExprSpec, NodeAttr, NodeKind, SchemaNode, SerializeSpec};
use crate::error::{Error, Result};

const ROOT_SCOPE: &str = "#schema";

/// Start a schema declaration.
pub fn build() -> SchemaBuilder {
    SchemaBuilder::scoped(ROOT_SCOPE, NodeKind::Node)
}

/// Builder for one container descriptor and everything nested in it.
pub struct SchemaBuilder {
    id: String,
    kind: NodeKind,
    spec: ExprSpec,
    serialize: Option<SerializeSpec>,
    line: Vec<Rc<SchemaNode>>,
    nodes: Vec<Rc<SchemaNode>>,
    error: Option<Error>,
}

impl SchemaBuilder {
    pub(crate) fn scoped(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            spec: ExprSpec::default(),
            serialize: None,
            line: Vec::new(),
            nodes: Vec::new(),
            error: None,
        }
    }

    /// Declare a child node template.
    pub fn node(&mut self, id: &str, declare: impl FnOnce(&mut SchemaBuilder)) -> &mut Self {
        if self.claim(id) {
            let mut child = SchemaBuilder::scoped(id, NodeKind::Node);
            declare(&mut child);
            if let Some(node) = self.absorb(child) {
                self.nodes.push(node);
            }
        }
        self
    }

    /// Declare a nested group in this container's Line.
    pub fn group(&mut self, id: &str, declare: impl FnOnce(&mut SchemaBuilder)) -> &mut Self {
        if self.claim(id) {
            let mut child = SchemaBuilder::scoped(id, NodeKind::Group);
            declare(&mut child);
            if let Some(group) = self.absorb(child) {
                self.line.push(group);
            }
        }
        self
    }

    pub fn attr(&mut self, attr: NodeAttr) -> &mut Self {
        match attr {
            NodeAttr::Serialize(spec) => self.serialize = Some(spec),
            NodeAttr::Class(name, flag) => self.spec.classes.push((name, flag)),
        }
        self
    }

    pub fn select(&mut self, id: &str, spec: ExprSpec) -> &mut Self {
        self.leaf(id, NodeKind::Select, spec)
    }

    pub fn multiselect(&mut self, id: &str, spec: ExprSpec) -> &mut Self {
        self.leaf(id, NodeKind::MultiSelect, spec)
    }

    pub fn input(&mut self, id: &str, spec: ExprSpec) -> &mut Self {
        self.leaf(id, NodeKind::Input, spec)
    }

    pub fn label(&mut self, id: &str, spec: ExprSpec) -> &mut Self {
        self.leaf(id, NodeKind::Label, spec)
    }

    /// Finish the declaration and return the root descriptor.
    ///
    /// The root is the first node declared at top level.
    pub fn factory(self) -> Result<Rc<SchemaNode>> {
        let scope = self.finish()?;
        let mut nodes = scope.nodes.into_iter();
        let root = nodes.next().ok_or(Error::MissingRoot)?;
        let ignored: Vec<&str> = nodes.as_slice().iter().map(|n| n.id.as_str()).collect();
        if !ignored.is_empty() {
            warn!(root = %root.id, ?ignored, "extra top-level nodes are not reachable");
        }
        Ok(root)
    }

    /// Finish this scope as a standalone descriptor.
    pub(crate) fn finish(self) -> Result<SchemaNode> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(SchemaNode {
            id: self.id,
            kind: self.kind,
            spec: self.spec,
            serialize: self.serialize,
            line: self.line,
            nodes: self.nodes,
        })
    }

    fn leaf(&mut self, id: &str, kind: NodeKind, spec: ExprSpec) -> &mut Self {
        if self.claim(id) {
            self.line.push(Rc::new(SchemaNode {
                id: id.to_owned(),
                kind,
                spec,
                serialize: None,
                line: Vec::new(),
                nodes: Vec::new(),
            }));
        }
        self
    }

    /// Check sibling uniqueness, recording the first violation.
    fn claim(&mut self, id: &str) -> bool {
        let taken = self
            .line
            .iter()
            .chain(self.nodes.iter())
            .any(|sibling| sibling.id == id);
        if taken {
            self.fail(Error::DuplicateId {
                parent: self.id.clone(),
                id: id.to_owned(),
            });
        }
        !taken
    }

    fn absorb(&mut self, child: SchemaBuilder) -> Option<Rc<SchemaNode>> {
        match child.finish() {
            Ok(node) => Some(Rc::new(node)),
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }

    fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}
