//! Field layout enumeration with transitive flattening.
//!
//! Walks the declared instance fields of a class in declaration order. A field stored by
//! reference or as a scalar becomes one [`TypeLayoutEntry`]; a flattened field is replaced by
//! the entries of its value class, with the field name prepended as `name.` and the field
//! offset added to every nested offset. Nested flattening is walked with an explicit stack of
//! frames whose height is bounded by [`crate::SessionConfig::max_flattening_depth`].

use std::sync::Arc;

use tracing::trace;

use crate::{
    layout::{DataKind, TypeLayout, TypeLayoutBuilder, TypeLayoutEntry},
    metadata::{ClassHandle, FieldDescriptor},
    ClassEnv, Error, Result,
};

/// Pending fields of one class being expanded
struct Frame {
    class: ClassHandle,
    fields: Arc<[FieldDescriptor]>,
    next: usize,
    prefix: String,
    base: i64,
}

/// Build the flattened layout of `class`
pub(crate) fn enumerate(env: &ClassEnv, class: ClassHandle) -> Result<TypeLayout> {
    let limit = env.config().max_flattening_depth;
    let header = i64::from(env.config().object_header_size);
    let mut builder = TypeLayoutBuilder::new();
    let mut stack = vec![Frame {
        class,
        fields: env.declared_fields(class)?,
        next: 0,
        prefix: String::new(),
        base: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(field) = frame.fields.get(frame.next).cloned() else {
            stack.pop();
            continue;
        };
        frame.next += 1;
        if field.is_static() {
            continue;
        }

        let owner = frame.class;
        let base = frame.base + i64::from(field.offset);
        let name = format!("{}{}", frame.prefix, field.name);

        if env.is_field_flattened(owner, &field.name)? {
            if stack.len() > limit {
                return Err(Error::RecursionLimit(limit));
            }
            let nested = env.flattened_field_type(owner, &field.name)?;
            trace!(class = %owner, field = %name, nested = %nested, base, "descending into flattened field");
            stack.push(Frame {
                class: nested,
                fields: env.declared_fields(nested)?,
                next: 0,
                prefix: name + ".",
                base,
            });
            continue;
        }

        let kind = field
            .signature_char()
            .and_then(DataKind::from_signature)
            .ok_or_else(|| {
                malformed_error!(
                    "Field {} of {} has invalid signature '{}'",
                    field.name,
                    owner,
                    field.signature
                )
            })?;
        let offset = i32::try_from(base + header).map_err(|_| {
            malformed_error!("Offset of field {} of {} exceeds 32 bits", field.name, owner)
        })?;
        trace!(class = %owner, field = %name, offset, "type layout entry");
        builder.add(TypeLayoutEntry::new(
            offset,
            kind,
            name,
            field.modifiers(),
            field.signature,
        ));
    }

    Ok(builder.build())
}
