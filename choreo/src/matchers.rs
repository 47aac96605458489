//! Ready-made matchers for messages and message lists.

use choreo_store::{Message, PayloadType};
use glob_match::glob_match;
use serde::Serialize;

use crate::{error::Result, matcher::Matcher, validator::describe_list};

/// Same payload as `expected`: equal name and data.
pub fn equal_to(expected: Message) -> Matcher<Message> {
    let description = expected.to_string();

    Matcher::new(description, move |actual: &Message| {
        if expected.same_payload(actual) {
            Ok(())
        } else {
            Err(format!("was <{actual}>"))
        }
    })
}

pub fn payload_equal_to<P: PayloadType + Serialize>(payload: &P) -> Result<Matcher<Message>> {
    Ok(equal_to(Message::from_payload(payload)?))
}

pub fn payload_of_type<P: PayloadType>() -> Matcher<Message> {
    named(P::payload_type())
}

/// Message name matching a glob pattern, e.g. `order-*`.
pub fn named(pattern: impl Into<String>) -> Matcher<Message> {
    let pattern = pattern.into();

    Matcher::new(format!("message named {pattern}"), move |actual: &Message| {
        if glob_match(&pattern, &actual.name) {
            Ok(())
        } else {
            Err(format!("was named <{}>", actual.name))
        }
    })
}

pub fn any_message() -> Matcher<Message> {
    Matcher::when("any message", |_: &Message| true)
}

pub fn no_messages() -> Matcher<[Message]> {
    Matcher::new("no messages", |actual: &[Message]| {
        if actual.is_empty() {
            Ok(())
        } else {
            Err(format!("got {}", describe_list(actual)))
        }
    })
}

pub fn no_commands() -> Matcher<[Message]> {
    Matcher::new("no commands", |actual: &[Message]| {
        no_messages().check(actual)
    })
}

pub fn no_events() -> Matcher<[Message]> {
    Matcher::new("no events", |actual: &[Message]| no_messages().check(actual))
}

fn describe_all(kind: &str, matchers: &[Matcher<Message>]) -> String {
    let items = matchers
        .iter()
        .map(|matcher| format!("<{matcher}>"))
        .collect::<Vec<_>>()
        .join(", ");

    format!("{kind} [{items}]")
}

/// Exactly one message per matcher, in the same order.
pub fn exact_sequence_of(matchers: Vec<Matcher<Message>>) -> Matcher<[Message]> {
    let description = describe_all("exact sequence of", &matchers);

    Matcher::new(description, move |actual: &[Message]| {
        for (index, matcher) in matchers.iter().enumerate() {
            let Some(message) = actual.get(index) else {
                return Err(format!(
                    "ran out of messages at position {index} expecting <{matcher}>"
                ));
            };

            if let Err(mismatch) = matcher.check(message) {
                return Err(format!("position {index} {mismatch}"));
            }
        }

        if actual.len() > matchers.len() {
            return Err(format!(
                "got unexpected {}",
                describe_list(&actual[matchers.len()..])
            ));
        }

        Ok(())
    })
}

/// Every matcher satisfied in order, other messages allowed in between.
pub fn sequence_of(matchers: Vec<Matcher<Message>>) -> Matcher<[Message]> {
    let description = describe_all("sequence of", &matchers);

    Matcher::new(description, move |actual: &[Message]| {
        let mut messages = actual.iter();

        for matcher in matchers.iter() {
            if !messages.any(|message| matcher.matches(message)) {
                return Err(format!(
                    "no message matching <{matcher}> in order in {}",
                    describe_list(actual)
                ));
            }
        }

        Ok(())
    })
}

/// Every matcher satisfied by at least one message, in any order.
pub fn list_with_all_of(matchers: Vec<Matcher<Message>>) -> Matcher<[Message]> {
    let description = describe_all("list with all of", &matchers);

    Matcher::new(description, move |actual: &[Message]| {
        let missing = matchers
            .iter()
            .filter(|matcher| !actual.iter().any(|message| matcher.matches(message)))
            .map(|matcher| format!("<{matcher}>"))
            .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "no message matching {} in {}",
                missing.join(", "),
                describe_list(actual)
            ))
        }
    })
}

/// At least one message satisfying at least one matcher.
pub fn list_with_any_of(matchers: Vec<Matcher<Message>>) -> Matcher<[Message]> {
    let description = describe_all("list with any of", &matchers);

    Matcher::new(description, move |actual: &[Message]| {
        let found = actual
            .iter()
            .any(|message| matchers.iter().any(|matcher| matcher.matches(message)));

        if found {
            Ok(())
        } else {
            Err(format!("none matched in {}", describe_list(actual)))
        }
    })
}
