//! Predicates with a human readable description.
//!
//! Validators only call [`Matcher::check`]; how a matcher is composed is up
//! to the test. The [`matchers`](crate::matchers) module holds the common
//! message and message-list matchers.

use std::{fmt, sync::Arc};

/// Outcome of a match: `Err` carries the mismatch description.
pub type MatchResult = std::result::Result<(), String>;

pub struct Matcher<T: ?Sized> {
    description: String,
    predicate: Arc<dyn Fn(&T) -> MatchResult + Send + Sync>,
}

impl<T: ?Sized + 'static> Matcher<T> {
    pub fn new<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> MatchResult + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Builds a matcher from a plain boolean predicate.
    pub fn when<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let description = description.into();
        let mismatch = format!("did not match <{description}>");

        Self::new(description, move |candidate| {
            if predicate(candidate) {
                Ok(())
            } else {
                Err(mismatch.to_owned())
            }
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn check(&self, candidate: &T) -> MatchResult {
        (self.predicate)(candidate)
    }

    pub fn matches(&self, candidate: &T) -> bool {
        self.check(candidate).is_ok()
    }

    pub fn describe_mismatch(&self, candidate: &T) -> Option<String> {
        self.check(candidate).err()
    }

    pub fn and(self, other: Matcher<T>) -> Matcher<T> {
        let description = format!("({} and {})", self.description, other.description);

        Matcher::new(description, move |candidate| {
            self.check(candidate)?;
            other.check(candidate)
        })
    }

    pub fn or(self, other: Matcher<T>) -> Matcher<T> {
        let description = format!("({} or {})", self.description, other.description);

        Matcher::new(description, move |candidate| {
            let Err(left) = self.check(candidate) else {
                return Ok(());
            };

            other
                .check(candidate)
                .map_err(|right| format!("{left} and {right}"))
        })
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Matcher<T> {
        let description = format!("not {}", self.description);
        let mismatch = format!("matched <{}>", self.description);

        Matcher::new(description, move |candidate| match self.check(candidate) {
            Ok(()) => Err(mismatch.to_owned()),
            Err(_) => Ok(()),
        })
    }
}

impl<T: ?Sized> Clone for Matcher<T> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Matcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("description", &self.description)
            .finish()
    }
}

impl<T: ?Sized> fmt::Display for Matcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
