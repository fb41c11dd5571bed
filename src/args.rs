//! Argument helpers: rendering for span labels and log records, and conversion of
//! named arguments into the positional form legacy driver calls take.

use crate::driver::{NamedValue, Value};
use crate::error::{Error, Result};

/// Render arguments for a span label or log field.
///
/// Positional arguments render as `$ordinal`, named ones as `:name`.
pub fn format_args(args: &[NamedValue]) -> String {
    let rendered: Vec<String> = args
        .iter()
        .map(|arg| match &arg.name {
            Some(name) => format!(":{} = {:?}", name, arg.value),
            None => format!("${} = {:?}", arg.ordinal, arg.value),
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

/// Render positional values the same way [`format_args`] renders unnamed arguments.
pub fn format_values(values: &[Value]) -> String {
    let rendered: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, value)| format!("${} = {:?}", i + 1, value))
        .collect();
    format!("[{}]", rendered.join(", "))
}

/// Convert context-style arguments into the positional values a legacy call expects.
///
/// Each value lands at `ordinal - 1`. Named arguments, ordinals outside `1..=len` and
/// repeated ordinals cannot be expressed positionally and are rejected.
pub fn named_value_to_value(args: &[NamedValue]) -> Result<Vec<Value>> {
    let mut slots: Vec<Option<Value>> = vec![None; args.len()];

    for arg in args {
        if arg.name.as_deref().is_some_and(|name| !name.is_empty()) {
            return Err(Error::NamedParameters);
        }
        if arg.ordinal == 0 || arg.ordinal > args.len() {
            return Err(Error::InvalidOrdinal {
                ordinal: arg.ordinal,
                count: args.len(),
            });
        }
        let slot = &mut slots[arg.ordinal - 1];
        if slot.is_some() {
            return Err(Error::DuplicateOrdinal(arg.ordinal));
        }
        *slot = Some(arg.value.clone());
    }

    // Every slot is filled: there are as many distinct in-range ordinals as slots.
    Ok(slots.into_iter().flatten().collect())
}
