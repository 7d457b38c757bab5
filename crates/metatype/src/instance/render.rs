// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Canonical textual rendering.
//!
//! A composite renders as a brace block, one `name : value` line per slot in
//! slot order, each part preceded by the current indent plus a tab:
//!
//! ```text
//! {
//! <TAB>d : <TAB>1
//! <TAB>b : <TAB>true
//! }
//! ```
//!
//! Nested composites open their block inline and indent one tab deeper.
//! This format is compared byte for byte.

use crate::config::DEFAULT_DATE_FORMAT;
use crate::instance::{Instance, Referenceable, ReferenceableInstance, Struct, Value};
use std::fmt::{self, Write};

const NULL: &str = "<null>";

/// Write a brace block of `name : value` lines.
pub(crate) fn write_block<'a, I>(out: &mut String, prefix: &str, date_format: &str, entries: I)
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let inner = format!("{}\t", prefix);
    out.push_str("{\n");
    for (name, value) in entries {
        write_line(out, &inner, name, |out| {
            write_value(out, value, &inner, date_format)
        });
    }
    out.push_str(prefix);
    out.push('}');
}

fn write_line<F: FnOnce(&mut String)>(out: &mut String, inner: &str, name: &str, value: F) {
    out.push_str(inner);
    out.push_str(name);
    out.push_str(" : ");
    out.push_str(inner);
    value(out);
    out.push('\n');
}

pub(crate) fn write_instance(out: &mut String, inst: &Instance, prefix: &str, date_format: &str) {
    let slots = inst.values();
    write_block(
        out,
        prefix,
        date_format,
        inst.layout().names().zip(slots.iter()),
    );
}

/// Class object: the id line, the class slots, then one nested block per
/// attached trait.
pub(crate) fn write_object(
    out: &mut String,
    obj: &ReferenceableInstance,
    prefix: &str,
    date_format: &str,
) {
    let inner = format!("{}\t", prefix);
    let slots = obj.instance().values();
    out.push_str("{\n");
    write_line(out, &inner, "id", |out| out.push_str(&obj.id().to_string()));
    for (name, value) in obj.instance().layout().names().zip(slots.iter()) {
        write_line(out, &inner, name, |out| {
            write_value(out, value, &inner, date_format)
        });
    }
    for (name, tr) in obj.traits() {
        write_line(out, &inner, name, |out| {
            write_instance(out, tr, &inner, date_format)
        });
    }
    out.push_str(prefix);
    out.push('}');
}

fn write_bag(out: &mut String, bag: &Struct, prefix: &str, date_format: &str) {
    write_block(out, prefix, date_format, bag.iter());
}

fn write_referenceable(out: &mut String, bag: &Referenceable, prefix: &str, date_format: &str) {
    let inner = format!("{}\t", prefix);
    out.push_str("{\n");
    if let Some(id) = bag.id() {
        write_line(out, &inner, "id", |out| out.push_str(&id.to_string()));
    }
    for (name, value) in bag.values().iter() {
        write_line(out, &inner, name, |out| {
            write_value(out, value, &inner, date_format)
        });
    }
    out.push_str(prefix);
    out.push('}');
}

/// Write one value; `prefix` is the indent of the line holding it.
pub(crate) fn write_value(out: &mut String, value: &Value, prefix: &str, date_format: &str) {
    match value {
        Value::Null => out.push_str(NULL),
        Value::Boolean(v) => push_display(out, v),
        Value::Byte(v) => push_display(out, v),
        Value::Short(v) => push_display(out, v),
        Value::Int(v) => push_display(out, v),
        Value::Long(v) => push_display(out, v),
        // Debug keeps the fractional part of whole numbers (`1.0`).
        Value::Float(v) => push_debug(out, v),
        Value::Double(v) => push_debug(out, v),
        Value::BigInt(v) => push_display(out, v),
        Value::BigDecimal(v) => push_display(out, v),
        Value::String(s) => out.push_str(s),
        Value::Date(d) => {
            if write!(out, "{}", d.format(date_format)).is_err() {
                out.push_str(&d.to_rfc3339());
            }
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, prefix, date_format);
            }
            out.push(']');
        }
        Value::Map(entries) => {
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, k, prefix, date_format);
                out.push('=');
                write_value(out, v, prefix, date_format);
            }
            out.push('}');
        }
        Value::Struct(bag) => write_bag(out, bag, prefix, date_format),
        Value::Instance(inst) => write_instance(out, inst, prefix, date_format),
        Value::Referenceable(bag) => write_referenceable(out, bag, prefix, date_format),
        Value::Object(obj) => write_object(out, obj, prefix, date_format),
        Value::Reference(id) => push_display(out, id),
    }
}

fn push_display<T: fmt::Display>(out: &mut String, v: T) {
    let _ = write!(out, "{}", v);
}

fn push_debug<T: fmt::Debug>(out: &mut String, v: T) {
    let _ = write!(out, "{:?}", v);
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_value(&mut out, self, "", DEFAULT_DATE_FORMAT);
        f.write_str(&out)
    }
}

impl fmt::Display for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_bag(&mut out, self, "", DEFAULT_DATE_FORMAT);
        f.write_str(&out)
    }
}

impl fmt::Display for Referenceable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_referenceable(&mut out, self, "", DEFAULT_DATE_FORMAT);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn render(v: &Value) -> String {
        let mut out = String::new();
        write_value(&mut out, v, "", DEFAULT_DATE_FORMAT);
        out
    }

    #[test]
    fn test_scalars() {
        assert_eq!(render(&Value::Null), "<null>");
        assert_eq!(render(&Value::Boolean(false)), "false");
        assert_eq!(render(&Value::Byte(-3)), "-3");
        assert_eq!(render(&Value::Float(1.0)), "1.0");
        assert_eq!(render(&Value::Double(2.5)), "2.5");
        assert_eq!(render(&Value::from("x y")), "x y");
    }

    #[test]
    fn test_date_uses_format() {
        let d = Utc.with_ymd_and_hms(2014, 12, 11, 0, 0, 0).unwrap();
        assert_eq!(render(&Value::Date(d)), "2014-12-11T00:00:00.000Z");
        let mut out = String::new();
        write_value(&mut out, &Value::Date(d), "", "%Y/%m/%d");
        assert_eq!(out, "2014/12/11");
    }

    #[test]
    fn test_containers() {
        assert_eq!(render(&Value::from(vec![1, 1])), "[1, 1]");
        let map = Value::Map(vec![
            (Value::from("a"), Value::Double(1.0)),
            (Value::from("b"), Value::Double(2.0)),
        ]);
        assert_eq!(render(&map), "{a=1.0, b=2.0}");
    }

    #[test]
    fn test_nested_bag_indents() {
        let bag = Struct::new("outer")
            .with("n", 1)
            .with("inner", Struct::new("inner").with("m", true));
        assert_eq!(
            bag.to_string(),
            "{\n\tn : \t1\n\tinner : \t{\n\t\tm : \t\ttrue\n\t}\n}"
        );
    }
}
