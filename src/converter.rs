use crate::ast::{
    ConstDef, ConstValue, Definition, EnumDef, Field, Literal, SchemaFile, ServiceDef, StructDef,
    TypeRef, TypedefDef,
};
use crate::error::{ConversionError, Result};
use crate::format::{Formatter, Syntax};
use crate::imports::{self, sanitize_alias};
use crate::types::TypeConverter;

/// Emitted in place of a type the converter cannot render.
const FALLBACK_TYPE: &str = "any";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Start the output with a `// Source: <path>` comment.
    pub include_source_path: bool,
    pub syntax: Syntax,
}

/// Converts one schema file into Flow declarations.
///
/// Nothing is cached or mutated: converting the same file twice produces the
/// same text.
pub struct FlowConverter<'a> {
    file: &'a SchemaFile,
    transform: &'a dyn Fn(&str) -> String,
    options: ConvertOptions,
    types: TypeConverter<'a>,
}

impl<'a> FlowConverter<'a> {
    pub fn new(
        file: &'a SchemaFile,
        transform: &'a dyn Fn(&str) -> String,
        options: ConvertOptions,
    ) -> Self {
        Self {
            file,
            transform,
            options,
            types: TypeConverter::new(file, transform),
        }
    }

    /// Generates the file and runs it through `formatter`.
    pub fn convert(&self, formatter: &dyn Formatter) -> Result<String> {
        let source = self.generate();
        tracing::debug!(
            file = %self.file.path.display(),
            syntax = self.options.syntax.name(),
            "formatting generated declarations"
        );
        formatter
            .format(&source, self.options.syntax)
            .map_err(|source| ConversionError::Format {
                path: self.file.path.clone(),
                source,
            })
    }

    /// Unformatted output: header comment, imports, then one section per
    /// definition, separated by blank lines.
    pub fn generate(&self) -> String {
        let mut sections = Vec::with_capacity(self.file.definitions.len() + 2);

        if self.options.include_source_path {
            sections.push(format!("// Source: {}", self.file.path.display()));
        }
        sections.push(imports::import_block(self.file));
        sections.extend(
            self.file
                .definitions
                .iter()
                .filter_map(|def| self.convert_definition(def)),
        );

        sections
            .into_iter()
            .filter(|section| !section.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Returns `None` for definitions that are skipped.
    pub fn convert_definition(&self, def: &Definition) -> Option<String> {
        match def {
            Definition::Struct(def) | Definition::Exception(def) => Some(self.convert_struct(def)),
            Definition::Union(def) => Some(self.convert_union(def)),
            Definition::Enum(def) => Some(self.convert_enum(def)),
            Definition::Typedef(def) => Some(self.convert_typedef(def)),
            Definition::Service(def) => Some(self.convert_service(def)),
            Definition::Const(def) => Some(self.convert_const(def)),
            Definition::Other { .. } => {
                tracing::warn!(
                    file = %self.file.path.display(),
                    kind = def.kind(),
                    name = def.name().unwrap_or("<anonymous>"),
                    "skipping unsupported definition"
                );
                None
            }
        }
    }

    fn name(&self, name: &str) -> String {
        (self.transform)(name)
    }

    fn convert_struct(&self, def: &StructDef) -> String {
        format!(
            "export type {} = {};",
            self.name(&def.name),
            self.exact_object(&def.name, &def.fields)
        )
    }

    fn convert_union(&self, def: &StructDef) -> String {
        let variants = if def.fields.is_empty() {
            "{||}".to_string()
        } else {
            def.fields
                .iter()
                .map(|field| {
                    format!(
                        "{{|{}: {}|}}",
                        field.name,
                        self.field_type(&def.name, &field.name, &field.value_type)
                    )
                })
                .collect::<Vec<_>>()
                .join(" | ")
        };

        format!("export type {} = {};", self.name(&def.name), variants)
    }

    fn convert_enum(&self, def: &EnumDef) -> String {
        let name = self.name(&def.name);

        let labels = if def.members.is_empty() {
            "empty".to_string()
        } else {
            def.members
                .iter()
                .map(|member| format!("\"{}\"", member.name))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let entries: String = def
            .members
            .iter()
            .enumerate()
            .map(|(index, member)| {
                format!("  {}: {},\n", member.name, member.value.unwrap_or(index as i64))
            })
            .collect();
        let value_map = if entries.is_empty() {
            "{}".to_string()
        } else {
            format!("{{\n{}}}", entries)
        };

        format!(
            "export type {name} = {labels};\nexport const {name}ValueMap = {value_map};"
        )
    }

    fn convert_typedef(&self, def: &TypedefDef) -> String {
        format!(
            "export type {} = {};",
            self.name(&def.name),
            self.field_type(&def.name, &def.name, &def.value_type)
        )
    }

    fn convert_service(&self, def: &ServiceDef) -> String {
        let body = if def.functions.is_empty() {
            "{||}".to_string()
        } else {
            let members: String = def
                .functions
                .iter()
                .map(|function| {
                    let params = function
                        .params
                        .iter()
                        .map(|param| {
                            format!(
                                "{}: {}",
                                param.name,
                                self.field_type(&def.name, &param.name, &param.value_type)
                            )
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    let returns = self.field_type(&def.name, &function.name, &function.returns);
                    format!("  {}: ({}) => {};\n", function.name, params, returns)
                })
                .collect();
            format!("{{|\n{}|}}", members)
        };

        format!("export type {} = {};", self.name(&def.name), body)
    }

    fn convert_const(&self, def: &ConstDef) -> String {
        format!(
            "export const {}: {} = {};",
            self.name(&def.name),
            self.field_type(&def.name, &def.name, &def.value_type),
            self.render_value(&def.value)
        )
    }

    /// Renders a constant value as a JavaScript expression.
    pub fn render_value(&self, value: &ConstValue) -> String {
        match value {
            ConstValue::Literal { value } => render_literal(value),
            ConstValue::List { values } => format!(
                "[{}]",
                values
                    .iter()
                    .map(|value| self.render_value(value))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            ConstValue::Map { entries } => {
                if entries.is_empty() {
                    return "{}".to_string();
                }
                let entries = entries
                    .iter()
                    .map(|entry| {
                        format!(
                            "{}: {}",
                            self.render_key(&entry.key),
                            self.render_value(&entry.value)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{}}}", entries)
            }
            ConstValue::Identifier { name } => self.render_identifier(name),
        }
    }

    /// Object literal key. Strings, booleans and non-negative numbers are
    /// written as they are. Anything else becomes a computed key.
    fn render_key(&self, key: &ConstValue) -> String {
        let plain = match key {
            ConstValue::Literal { value } => match value {
                Literal::String(_) | Literal::Bool(_) => true,
                Literal::Int(n) => *n >= 0,
                Literal::Double(n) => n.is_finite() && n.is_sign_positive(),
            },
            _ => false,
        };

        if plain {
            self.render_value(key)
        } else {
            format!("[{}]", self.render_value(key))
        }
    }

    /// `Name` and `Name.MEMBER` that point into this file go through the
    /// transform. `alias.Name` is an include reference and is rendered the
    /// way type references are. Anything else is kept as written.
    fn render_identifier(&self, id: &str) -> String {
        match id.rsplit_once('.') {
            Some((owner, member)) if self.file.definition(owner).is_some() => {
                format!("{}.{}", self.name(owner), member)
            }
            Some((alias, name)) => format!("{}.{}", sanitize_alias(alias), self.name(name)),
            None if self.file.definition(id).is_some() => self.name(id),
            None => id.to_string(),
        }
    }

    fn exact_object(&self, owner: &str, fields: &[Field]) -> String {
        if fields.is_empty() {
            return "{||}".to_string();
        }

        let body: String = fields
            .iter()
            .map(|field| {
                let optional_marker = if field.optional { "?" } else { "" };
                format!(
                    "  {}{}: {};\n",
                    field.name,
                    optional_marker,
                    self.field_type(owner, &field.name, &field.value_type)
                )
            })
            .collect();

        format!("{{|\n{}|}}", body)
    }

    /// Converts one type position. A type that cannot be rendered becomes
    /// `any` for that position only, with a warning.
    fn field_type(&self, owner: &str, field: &str, ty: &TypeRef) -> String {
        self.types.convert(ty).unwrap_or_else(|err| {
            tracing::warn!(
                file = %self.file.path.display(),
                definition = owner,
                field,
                error = %err,
                "unsupported type, emitting `any` in its place"
            );
            FALLBACK_TYPE.to_string()
        })
    }
}

fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::Bool(value) => value.to_string(),
        Literal::Int(value) => value.to_string(),
        Literal::Double(value) if value.is_infinite() => {
            if value.is_sign_positive() {
                "Infinity".to_string()
            } else {
                "-Infinity".to_string()
            }
        }
        Literal::Double(value) => value.to_string(),
        Literal::String(value) => quote(value),
    }
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}
