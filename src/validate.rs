//! Checks that a receiver can run a decorator, and explains when it cannot.

use crate::method::MethodSignature;
use crate::receiver::{ReceiverKind, ReceiverRef};

/// Hands back `receiver` when it can run `decorator`; otherwise the
/// diagnostic explaining why not. Callers choose the error variant.
pub(crate) fn validate<'a>(
    decorator: &str,
    receiver: Option<&'a ReceiverRef>,
    method: Option<&MethodSignature>,
) -> std::result::Result<&'a ReceiverRef, String> {
    match receiver {
        Some(receiver) if receiver.responds_to(decorator) => Ok(receiver),
        _ => Err(diagnostic(decorator, receiver, method)),
    }
}

fn diagnostic(decorator: &str, receiver: Option<&ReceiverRef>, method: Option<&MethodSignature>) -> String {
    let location_hint = method.map(|method| {
        format!(
            "Cannot decorate `{}` (defined at `{}`).",
            method.formal_name(),
            method.location()
        )
    });

    let searched = receiver.map_or_else(|| "any registered receiver".to_string(), |receiver| receiver.describe());
    let base_message = format!("Decorator method `{decorator}` cannot be found on `{searched}`.");

    let definition_hint = receiver
        .filter(|receiver| receiver.counterpart_responds_to(decorator))
        .map(|receiver| remediation(decorator, receiver));

    [location_hint, Some(base_message), definition_hint]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}

fn remediation(decorator: &str, receiver: &ReceiverRef) -> String {
    let type_name = receiver.type_name();
    match receiver.kind() {
        ReceiverKind::Class => format!(
            "It is, however, an instance method of `{type_name}`. To use this decorator method, either \
             A) supply an instance of `{type_name}` to the `from` option (instead of the type itself), \
             B) convert the instance method `{type_name}#{decorator}` to a type-level method, or \
             C) create a new type-level method on `{type_name}` with the same name."
        ),
        ReceiverKind::Instance => format!(
            "It is, however, a method of this instance's type. To use this decorator method, either \
             A) supply the `{type_name}` type itself to the `from` option (instead of an instance of it), \
             B) convert the type-level method `{type_name}::{decorator}` to an instance method, or \
             C) create a new instance method on `{type_name}` with the same name."
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;

    use super::*;
    use crate::context::{MethodKind, TargetId};
    use crate::method::SourceLocation;
    use crate::receiver::DecoratorSet;

    fn passthrough() -> DecoratorSet {
        DecoratorSet::class("Helpers").with("shout", |_, next, _| next.proceed())
    }

    fn signature() -> MethodSignature {
        MethodSignature::new(
            TargetId::next(),
            "Foo",
            "bar",
            MethodKind::Instance,
            SourceLocation::new("src/foo.rs", 12),
        )
    }

    #[test]
    fn responding_receiver_passes() {
        let receiver = passthrough().into_ref();
        assert!(validate("shout", Some(&receiver), None).is_ok());
    }

    #[test]
    fn missing_decorator_names_receiver() {
        let receiver = passthrough().into_ref();
        let message = validate("whisper", Some(&receiver), None).err().unwrap();
        assert_eq!(message, "Decorator method `whisper` cannot be found on `Helpers`.");
    }

    #[test]
    fn known_method_adds_location() {
        let receiver = passthrough().into_ref();
        let message = validate("whisper", Some(&receiver), Some(&signature())).err().unwrap();
        assert!(message.starts_with("Cannot decorate `Foo#bar` (defined at `src/foo.rs:12`)."));
    }

    #[test]
    fn unresolved_receiver_is_reported() {
        let message = validate("whisper", None, None).err().unwrap();
        assert!(message.contains("any registered receiver"));
    }

    #[test]
    fn class_with_instance_method_suggests_instance() {
        let receiver: ReceiverRef = Arc::new(DecoratorSet::class("Helpers").with_counterpart("whisper"));
        let message = validate("whisper", Some(&receiver), None).err().unwrap();
        assert!(message.contains("an instance method of `Helpers`"));
        assert!(message.contains("A) supply an instance of `Helpers`"));
        assert!(message.contains("`Helpers#whisper`"));
    }

    #[test]
    fn instance_with_class_method_suggests_type() {
        let receiver = DecoratorSet::instance("Helpers")
            .with("other", |_, _, _| Ok(Value::Null))
            .with_counterpart("whisper")
            .into_ref();
        let message = validate("whisper", Some(&receiver), None).err().unwrap();
        assert!(message.contains("cannot be found on `#<Helpers>`"));
        assert!(message.contains("A) supply the `Helpers` type itself"));
        assert!(message.contains("`Helpers::whisper`"));
    }
}
