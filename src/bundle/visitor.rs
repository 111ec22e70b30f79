use serde_json::Value;

use crate::parse::{DEFINITIONS_PREFIX, SchemaRef};

/// Visits every schema reference nested anywhere inside a schema node,
/// in document order.
///
/// References are string leaves that are exactly `#/components/schemas/<Name>`,
/// regardless of their key: `$ref` values, discriminator mappings, and
/// extensions all count.
#[derive(Debug)]
pub struct RefVisitor<'a> {
    stack: Vec<&'a Value>,
}

impl<'a> RefVisitor<'a> {
    #[inline]
    pub fn new(root: &'a Value) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for RefVisitor<'a> {
    type Item = SchemaRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(top) = self.stack.pop() {
            match top {
                Value::Object(map) => self.stack.extend(map.values().rev()),
                Value::Array(items) => self.stack.extend(items.iter().rev()),
                Value::String(s) => {
                    if let Ok(r) = SchemaRef::parse(s) {
                        return Some(r);
                    }
                }
                Value::Null | Value::Bool(_) | Value::Number(_) => continue,
            }
        }
        None
    }
}

/// Rewrites every `#/components/schemas/<Name>` reference nested
/// inside `value` to `#/definitions/<Name>`.
pub fn rewrite_refs_to_definitions(value: &mut Value) {
    let mut stack = vec![value];
    while let Some(top) = stack.pop() {
        match top {
            Value::Object(map) => stack.extend(map.values_mut()),
            Value::Array(items) => stack.extend(items.iter_mut()),
            Value::String(s) => {
                if let Ok(r) = SchemaRef::parse(s) {
                    *s = format!("{DEFINITIONS_PREFIX}{}", r.name());
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => continue,
        }
    }
}
