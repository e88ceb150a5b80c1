//! Panic payload formatting helpers.
//!
//! Step handlers run behind `catch_unwind`; a panic becomes an `ERROR` outcome
//! whose message is extracted here. String payloads are used directly, common
//! scalar payloads are rendered with `Display`, and anything else produces a
//! localized placeholder naming the payload as opaque.

use std::any::Any;

/// Formats a panic payload into a readable message.
///
/// # Examples
///
/// ```
/// use kumo::panic_message;
/// use std::any::Any;
///
/// let payload: Box<dyn Any + Send> = Box::new("boom");
/// assert_eq!(panic_message(payload.as_ref()), "boom");
/// ```
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .or_else(|| payload.downcast_ref::<i32>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<i64>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<u32>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<u64>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<usize>().map(ToString::to_string))
        .unwrap_or_else(|| {
            crate::localization::message_with_args("panic-message-opaque-payload", |args| {
                args.set("type", "Box<dyn Any>".to_string());
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_string_payloads() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(payload.as_ref()), "kaboom");
    }

    #[test]
    fn formats_integer_payloads() {
        let payload: Box<dyn Any + Send> = Box::new(42_u64);
        assert_eq!(panic_message(payload.as_ref()), "42");
    }

    #[test]
    fn describes_opaque_payloads() {
        struct Opaque;
        let payload: Box<dyn Any + Send> = Box::new(Opaque);
        assert!(panic_message(payload.as_ref()).contains("Box<dyn Any>"));
    }
}
