//! Field assignment from `key=value` tokens

use zbot_core::{Record, Setter, Value};

/// Apply `setter` to `record`, returning how many assignments were applied.
///
/// `true`/`false` (any case) become booleans; every other value is stored as
/// a string. With `skip_blank`, empty values are ignored. Nothing is saved.
pub fn edit(record: &mut Record, setter: &Setter, skip_blank: bool) -> usize {
    let mut count = 0;
    for (key, value) in setter {
        if skip_blank && value.is_empty() {
            continue;
        }
        count += 1;
        record.set(key.clone(), coerce(value));
    }
    count
}

fn coerce(value: &str) -> Value {
    if value.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if value.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else {
        Value::String(value.to_string())
    }
}
