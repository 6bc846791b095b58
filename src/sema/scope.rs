//! Symbol scope chain (spec §4.3), grounded on the teacher's C frontend
//! scope table: an owned parent chain mutated in place via
//! `push_child`/`pop_to_parent` rather than a borrowed lifetime chain.

use std::collections::HashMap;
use crate::ast::Scalar;

#[derive(Debug)]
pub struct Scope {
    vars: HashMap<String, Scalar>,
    parent: Option<Box<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Self { vars: HashMap::new(), parent: None }
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: Scalar) {
        self.vars.insert(name.into(), ty);
    }

    pub fn declared_in_this_scope(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> Option<Scalar> {
        if let Some(ty) = self.vars.get(name) {
            return Some(*ty);
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    pub fn push_child(&mut self) {
        let old = std::mem::replace(self, Scope::new());
        self.parent = Some(Box::new(old));
    }

    pub fn pop_to_parent(&mut self) -> bool {
        if let Some(parent) = self.parent.take() {
            *self = *parent;
            true
        } else {
            false
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
