// src/core/traverser.rs

//! A configurable depth-first walk over a model tree.

use crate::core::base::{FileModelError, Model, VisitResult};
use std::fmt;

type Predicate<'f, A> = Box<dyn Fn(&dyn Model, &A) -> bool + 'f>;
type Action<'f, A> = Box<dyn FnMut(&mut dyn Model, &mut A) -> VisitResult + 'f>;

/// Walks a tree depth-first, threading an accumulator of type `A` through the walk.
///
/// For every node: if `should_execute` holds, run the pre-traverse action; then visit each
/// child for which `should_traverse` holds, in declaration order; then, if
/// `should_execute` holds, run the post-traverse action. Unset predicates default to
/// true and unset actions do nothing.
pub struct ModelTreeTraverser<'f, A> {
    should_traverse: Option<Predicate<'f, A>>,
    should_execute: Option<Predicate<'f, A>>,
    pre_traverse: Option<Action<'f, A>>,
    post_traverse: Option<Action<'f, A>>,
}

impl<A> fmt::Debug for ModelTreeTraverser<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelTreeTraverser")
            .field("should_traverse", &self.should_traverse.is_some())
            .field("should_execute", &self.should_execute.is_some())
            .field("pre_traverse", &self.pre_traverse.is_some())
            .field("post_traverse", &self.post_traverse.is_some())
            .finish()
    }
}

impl<A> Default for ModelTreeTraverser<'_, A> {
    fn default() -> Self {
        Self {
            should_traverse: None,
            should_execute: None,
            pre_traverse: None,
            post_traverse: None,
        }
    }
}

impl<'f, A> ModelTreeTraverser<'f, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_should_traverse(mut self, predicate: impl Fn(&dyn Model, &A) -> bool + 'f) -> Self {
        self.should_traverse = Some(Box::new(predicate));
        self
    }

    pub fn with_should_execute(mut self, predicate: impl Fn(&dyn Model, &A) -> bool + 'f) -> Self {
        self.should_execute = Some(Box::new(predicate));
        self
    }

    pub fn with_pre_traverse(
        mut self,
        action: impl FnMut(&mut dyn Model, &mut A) -> VisitResult + 'f,
    ) -> Self {
        self.pre_traverse = Some(Box::new(action));
        self
    }

    pub fn with_post_traverse(
        mut self,
        action: impl FnMut(&mut dyn Model, &mut A) -> VisitResult + 'f,
    ) -> Self {
        self.post_traverse = Some(Box::new(action));
        self
    }

    /// Walks the tree below `root` (inclusive) and returns the final accumulator.
    ///
    /// # Errors
    /// The first error returned by an action, or by a child that could not be borrowed.
    pub fn traverse(&mut self, root: &mut dyn Model, initial: A) -> Result<A, FileModelError> {
        let mut accumulator = initial;
        self.walk(root, &mut accumulator)?;
        Ok(accumulator)
    }

    fn walk(&mut self, node: &mut dyn Model, accumulator: &mut A) -> VisitResult {
        if self.executes(node, accumulator)
            && let Some(pre) = self.pre_traverse.as_mut()
        {
            pre(node, accumulator)?;
        }

        node.visit_children_mut(&mut |child: &mut dyn Model| {
            if self.traverses(child, accumulator) {
                self.walk(child, accumulator)
            } else {
                Ok(())
            }
        })?;

        if self.executes(node, accumulator)
            && let Some(post) = self.post_traverse.as_mut()
        {
            post(node, accumulator)?;
        }
        Ok(())
    }

    fn traverses(&self, node: &dyn Model, accumulator: &A) -> bool {
        self.should_traverse
            .as_ref()
            .is_none_or(|predicate| predicate(node, accumulator))
    }

    fn executes(&self, node: &dyn Model, accumulator: &A) -> bool {
        self.should_execute
            .as_ref()
            .is_none_or(|predicate| predicate(node, accumulator))
    }
}
