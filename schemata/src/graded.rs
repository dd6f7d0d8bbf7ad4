//! Three-state results.
//!
//! A [`Graded`] value is either a clean success, a success carrying
//! non-fatal warnings, or a failure. Decoders use it so a single pass can
//! report every problem in the input while still producing a value when no
//! problem was fatal.
//!
//! | Variant   | Value | Errors        |
//! |-----------|-------|---------------|
//! | `Success` | yes   | none          |
//! | `Warning` | yes   | one or more   |
//! | `Failure` | no    | one or more   |

use std::ops::Deref;

use serde::Serialize;

use crate::error::{DecodeError, PathSegment};

/// A vector with at least one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NonEmpty<T> {
    items: Vec<T>,
}

impl<T> NonEmpty<T> {
    pub fn new(head: T) -> Self {
        Self { items: vec![head] }
    }

    /// `None` when `items` is empty.
    pub fn from_vec(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn append(&mut self, other: NonEmpty<T>) {
        self.items.extend(other.items);
    }

    pub fn first(&self) -> &T {
        &self.items[0]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> NonEmpty<U> {
        NonEmpty {
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

impl<T> Deref for NonEmpty<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> IntoIterator for NonEmpty<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a NonEmpty<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Success, success with warnings, or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Graded<E, A> {
    Success(A),
    Warning(NonEmpty<E>, A),
    Failure(NonEmpty<E>),
}

impl<E, A> Graded<E, A> {
    pub fn success(value: A) -> Self {
        Self::Success(value)
    }

    pub fn warning(error: E, value: A) -> Self {
        Self::Warning(NonEmpty::new(error), value)
    }

    pub fn failure(error: E) -> Self {
        Self::Failure(NonEmpty::new(error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(..))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// True for `Success` and `Warning`.
    pub fn has_value(&self) -> bool {
        !self.is_failure()
    }

    pub fn value(&self) -> Option<&A> {
        match self {
            Self::Success(value) | Self::Warning(_, value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn into_value(self) -> Option<A> {
        match self {
            Self::Success(value) | Self::Warning(_, value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn errors(&self) -> Option<&NonEmpty<E>> {
        match self {
            Self::Success(_) => None,
            Self::Warning(errors, _) | Self::Failure(errors) => Some(errors),
        }
    }

    /// Errors and warnings, empty on success.
    pub fn error_list(&self) -> &[E] {
        self.errors().map(NonEmpty::as_slice).unwrap_or(&[])
    }

    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> Graded<E, B> {
        match self {
            Self::Success(value) => Graded::Success(f(value)),
            Self::Warning(errors, value) => Graded::Warning(errors, f(value)),
            Self::Failure(errors) => Graded::Failure(errors),
        }
    }

    pub fn map_errors<F>(self, f: impl FnMut(E) -> F) -> Graded<F, A> {
        match self {
            Self::Success(value) => Graded::Success(value),
            Self::Warning(errors, value) => Graded::Warning(errors.map(f), value),
            Self::Failure(errors) => Graded::Failure(errors.map(f)),
        }
    }

    /// Sequence a dependent step.
    ///
    /// Warnings from `self` are kept in front of whatever the step reports;
    /// a failure short-circuits.
    pub fn and_then<B>(self, f: impl FnOnce(A) -> Graded<E, B>) -> Graded<E, B> {
        match self {
            Self::Success(value) => f(value),
            Self::Failure(errors) => Graded::Failure(errors),
            Self::Warning(mut warnings, value) => match f(value) {
                Graded::Success(next) => Graded::Warning(warnings, next),
                Graded::Warning(more, next) => {
                    warnings.append(more);
                    Graded::Warning(warnings, next)
                }
                Graded::Failure(more) => {
                    warnings.append(more);
                    Graded::Failure(warnings)
                }
            },
        }
    }

    /// Combine two independent results, accumulating every error.
    pub fn zip<B>(self, other: Graded<E, B>) -> Graded<E, (A, B)> {
        match (self, other) {
            (Self::Success(a), Graded::Success(b)) => Graded::Success((a, b)),
            (Self::Success(a), Graded::Warning(errors, b))
            | (Self::Warning(errors, a), Graded::Success(b)) => Graded::Warning(errors, (a, b)),
            (Self::Warning(mut errors, a), Graded::Warning(more, b)) => {
                errors.append(more);
                Graded::Warning(errors, (a, b))
            }
            (Self::Failure(mut errors), other) => {
                if let Some(more) = other.into_errors() {
                    errors.append(more);
                }
                Graded::Failure(errors)
            }
            (this, Graded::Failure(more)) => match this.into_errors() {
                Some(mut errors) => {
                    errors.append(more);
                    Graded::Failure(errors)
                }
                None => Graded::Failure(more),
            },
        }
    }

    pub fn into_errors(self) -> Option<NonEmpty<E>> {
        match self {
            Self::Success(_) => None,
            Self::Warning(errors, _) | Self::Failure(errors) => Some(errors),
        }
    }

    /// Drop warnings; keep failures.
    pub fn into_result(self) -> Result<A, NonEmpty<E>> {
        match self {
            Self::Success(value) | Self::Warning(_, value) => Ok(value),
            Self::Failure(errors) => Err(errors),
        }
    }

    /// Treat warnings as failures.
    pub fn into_strict_result(self) -> Result<A, NonEmpty<E>> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Warning(errors, _) | Self::Failure(errors) => Err(errors),
        }
    }
}

impl<A> Graded<DecodeError, A> {
    /// Prefix every error path with `segment`.
    pub fn at(self, segment: PathSegment) -> Self {
        self.map_errors(|error| error.at(segment.clone()))
    }
}

/// Collects errors from many independent sub-results.
#[derive(Debug)]
pub struct Accumulator<E> {
    errors: Vec<E>,
    failed: bool,
}

impl<E> Default for Accumulator<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Accumulator<E> {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            failed: false,
        }
    }

    /// Record the errors of `result` and hand back its value, if any.
    pub fn absorb<A>(&mut self, result: Graded<E, A>) -> Option<A> {
        match result {
            Graded::Success(value) => Some(value),
            Graded::Warning(errors, value) => {
                self.errors.extend(errors);
                Some(value)
            }
            Graded::Failure(errors) => {
                self.errors.extend(errors);
                self.failed = true;
                None
            }
        }
    }

    pub fn fail(&mut self, error: E) {
        self.errors.push(error);
        self.failed = true;
    }

    pub fn warn(&mut self, error: E) {
        self.errors.push(error);
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// `Failure` if anything failed, `Warning` if anything warned, else
    /// `Success(value)`.
    pub fn finish<A>(self, value: A) -> Graded<E, A> {
        match (self.failed, NonEmpty::from_vec(self.errors)) {
            (true, Some(errors)) => Graded::Failure(errors),
            (false, Some(errors)) => Graded::Warning(errors, value),
            (_, None) => Graded::Success(value),
        }
    }
}
