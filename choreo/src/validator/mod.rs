//! Assertions over what the saga did.
//!
//! Each validator watches one piece of fixture infrastructure and turns its
//! recorded state into an `Ok(())` or an [`Error`](crate::Error). A failing
//! assertion never touches the state it inspected.

mod command;
mod event;
mod repository;
mod scheduler;

pub use command::CommandValidator;
pub use event::EventValidator;
pub use repository::RepositoryContentValidator;
pub use scheduler::EventSchedulerValidator;

use choreo_store::Message;

use crate::{
    error::{AssertionFailure, Result},
    matcher::Matcher,
};

pub(crate) fn describe_list(messages: &[Message]) -> String {
    let items = messages
        .iter()
        .map(|message| format!("<{message}>"))
        .collect::<Vec<_>>()
        .join(", ");

    format!("[{items}]")
}

fn assert_sequence_equal(kind: &str, expected: &[Message], actual: &[Message]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(AssertionFailure::new(format!(
            "Got wrong number of {kind}s. Expected <{}>, got <{}>.\nExpected: {}\nActual:   {}",
            expected.len(),
            actual.len(),
            describe_list(expected),
            describe_list(actual)
        ))
        .into());
    }

    for (index, (expected, actual)) in expected.iter().zip(actual).enumerate() {
        if !expected.same_payload(actual) {
            return Err(AssertionFailure::new(format!(
                "Unexpected {kind} at position {index} (0-based). Expected <{expected}>, got <{actual}>."
            ))
            .into());
        }
    }

    Ok(())
}

fn assert_sequence_matching(
    kind: &str,
    matcher: &Matcher<[Message]>,
    actual: &[Message],
) -> Result<()> {
    match matcher.check(actual) {
        Ok(()) => Ok(()),
        Err(mismatch) => Err(AssertionFailure::new(format!(
            "Incorrect {kind}s. Expected <{matcher}>, but {mismatch}.\nActual: {}",
            describe_list(actual)
        ))
        .into()),
    }
}
