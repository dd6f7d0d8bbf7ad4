//! Lenses derived from schema structure.
//!
//! [`optics_for`] walks a schema and produces a tree of [`Lens`]es, one per
//! struct field and tuple element, each focusing from the root value. Nodes
//! the walk cannot see through (unions, declarations, lazy nodes) are
//! leaves.
//!
//! # Example
//! ```rust,ignore
//! use schemata::{optics_for, Step};
//!
//! let optics = optics_for(&schema);
//! let lens = optics.field("b").and_then(|b| b.field("c")).unwrap().lens();
//! let updated = lens.set(&value, Value::from(2)).unwrap();
//! ```

use indexmap::IndexMap;

use crate::ast::{Ast, AstKind};
use crate::value::Value;

/// One step into a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    Key(String),
    Index(usize),
}

/// A path into a value with get and set.
///
/// Lenses compose by concatenating their paths, so composition is
/// associative and [`Lens::id`] is its identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Lens {
    steps: Vec<Step>,
}

impl Lens {
    /// Focus on the whole value.
    pub fn id() -> Self {
        Self::default()
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self {
            steps: vec![Step::Key(key.into())],
        }
    }

    pub fn index(index: usize) -> Self {
        Self {
            steps: vec![Step::Index(index)],
        }
    }

    /// `self` then `other`.
    #[must_use]
    pub fn compose(&self, other: &Lens) -> Lens {
        let mut steps = self.steps.clone();
        steps.extend(other.steps.iter().cloned());
        Lens { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The focused part, if the path exists.
    pub fn get<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.steps.iter().try_fold(root, |current, step| match (step, current) {
            (Step::Key(key), Value::Object(map)) => map.get(key),
            (Step::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        })
    }

    /// A copy of `root` with the focused part replaced.
    ///
    /// A missing final key is inserted; any other missing step yields
    /// `None`.
    pub fn set(&self, root: &Value, value: Value) -> Option<Value> {
        set_at(root, &self.steps, value)
    }

    /// A copy of `root` with `f` applied to the focused part.
    pub fn modify(&self, root: &Value, f: impl FnOnce(&Value) -> Value) -> Option<Value> {
        let updated = f(self.get(root)?);
        self.set(root, updated)
    }
}

fn set_at(current: &Value, steps: &[Step], value: Value) -> Option<Value> {
    let Some((step, rest)) = steps.split_first() else {
        return Some(value);
    };
    match (step, current) {
        (Step::Key(key), Value::Object(map)) => {
            let updated = match map.get(key) {
                Some(child) => set_at(child, rest, value)?,
                None if rest.is_empty() => value,
                None => return None,
            };
            let mut map = map.clone();
            map.insert(key.clone(), updated);
            Some(Value::Object(map))
        }
        (Step::Index(index), Value::Array(items)) => {
            let updated = set_at(items.get(*index)?, rest, value)?;
            let mut items = items.clone();
            items[*index] = updated;
            Some(Value::Array(items))
        }
        _ => None,
    }
}

/// A lens and the lenses of the parts below it.
#[derive(Debug, Clone)]
pub struct Optics {
    lens: Lens,
    children: IndexMap<Step, Optics>,
}

impl Optics {
    pub fn lens(&self) -> &Lens {
        &self.lens
    }

    pub fn children(&self) -> &IndexMap<Step, Optics> {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, step: &Step) -> Option<&Optics> {
        self.children.get(step)
    }

    pub fn field(&self, key: &str) -> Option<&Optics> {
        self.children.get(&Step::Key(key.to_string()))
    }

    pub fn element(&self, index: usize) -> Option<&Optics> {
        self.children.get(&Step::Index(index))
    }
}

/// Build the optics tree of `ast`.
pub fn optics_for(ast: &Ast) -> Optics {
    build(ast, Lens::id())
}

fn build(ast: &Ast, lens: Lens) -> Optics {
    let mut node = ast;
    loop {
        match node.kind() {
            AstKind::Refinement(refinement) => node = &refinement.from,
            AstKind::TypeAlias(alias) => node = &alias.expansion,
            _ => break,
        }
    }
    let children = match node.kind() {
        AstKind::Struct(s) => s
            .fields
            .iter()
            .map(|field| {
                let step = Step::Key(field.key.clone());
                let child = build(&field.ast, lens.compose(&Lens::key(field.key.clone())));
                (step, child)
            })
            .collect(),
        AstKind::Tuple(tuple) => tuple
            .elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                let child = build(&element.ast, lens.compose(&Lens::index(index)));
                (Step::Index(index), child)
            })
            .collect(),
        _ => IndexMap::new(),
    };
    Optics { lens, children }
}
