use crate::ast::{Primitive, SchemaFile, TypeRef};
use crate::error::{ConversionError, Result};
use crate::imports::sanitize_alias;

/// Flow type used for `i64` fields annotated with `js.type = "Long"`.
pub const LONG_TYPE: &str = "Long";

/// Maps schema type references to Flow type expressions.
///
/// Holds only borrowed, read-only context: the file being converted (to tell
/// same-file names from foreign ones) and the caller's name transform.
pub struct TypeConverter<'a> {
    file: &'a SchemaFile,
    transform: &'a dyn Fn(&str) -> String,
}

impl<'a> TypeConverter<'a> {
    pub fn new(file: &'a SchemaFile, transform: &'a dyn Fn(&str) -> String) -> Self {
        Self { file, transform }
    }

    pub fn convert(&self, ty: &TypeRef) -> Result<String> {
        match ty {
            TypeRef::Primitive(primitive) => Ok(Self::convert_primitive(*primitive).to_string()),
            TypeRef::List(element) | TypeRef::Set(element) => {
                Ok(format!("Array<{}>", self.convert(element)?))
            }
            TypeRef::Map(key, value) => Ok(format!(
                "{{[{}]: {}}}",
                self.convert(key)?,
                self.convert(value)?
            )),
            TypeRef::Named(id) => Ok(self.named(id)),
            TypeRef::Annotated(inner, _) => {
                if ty.is_long() {
                    Ok(LONG_TYPE.to_string())
                } else {
                    self.convert(inner)
                }
            }
            TypeRef::Unknown(kind) => Err(ConversionError::UnsupportedType { kind: kind.clone() }),
        }
    }

    fn convert_primitive(primitive: Primitive) -> &'static str {
        match primitive {
            Primitive::Bool => "boolean",
            Primitive::Byte
            | Primitive::I8
            | Primitive::I16
            | Primitive::I32
            | Primitive::I64
            | Primitive::Double => "number",
            Primitive::String | Primitive::Binary => "string",
            Primitive::Void => "void",
        }
    }

    /// Renders a reference to a declared name.
    ///
    /// `alias.Name` points into an included file. The prefix names that file's
    /// import and is not transformed, only `Name` is.
    pub fn named(&self, id: &str) -> String {
        if let Some((alias, name)) = id.rsplit_once('.') {
            return format!("{}.{}", sanitize_alias(alias), (self.transform)(name));
        }

        if self.file.definition(id).is_none() {
            tracing::debug!(
                file = %self.file.path.display(),
                name = id,
                "reference does not resolve to a definition in this file"
            );
        }
        (self.transform)(id)
    }
}
