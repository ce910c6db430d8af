//! Import statement synthesis for one schema file.

use crate::ast::{Definition, SchemaFile};
use std::path::{Component, Path};

/// Appended once when any type in the file renders as `Long`.
pub const LONG_IMPORT: &str = "import Long from 'long';";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub alias: String,
    pub module: String,
}

impl Import {
    pub fn statement(&self) -> String {
        format!("import * as {} from '{}';", self.alias, self.module)
    }
}

/// Builds the full import block: one namespace import per include, in header
/// order, then the `Long` import if needed. Empty when there is nothing to
/// import.
pub fn import_block(file: &SchemaFile) -> String {
    let mut lines: Vec<String> = includes(file).iter().map(Import::statement).collect();
    if uses_long(file) {
        lines.push(LONG_IMPORT.to_string());
    }
    lines.join("\n")
}

pub fn includes(file: &SchemaFile) -> Vec<Import> {
    let schema_dir = file.path.parent().unwrap_or_else(|| Path::new(""));
    let paths: Vec<&str> = file.includes().collect();
    let defaults: Vec<String> = paths.iter().map(|path| default_alias(path)).collect();

    resolve_aliases(&defaults)
        .into_iter()
        .zip(paths)
        .map(|(alias, path)| Import {
            alias,
            module: module_path(path, schema_dir),
        })
        .collect()
}

/// Makes every alias unique, left to right.
///
/// Alias `i` is prefixed with `_` while it still equals one of the default
/// aliases after it, or one of the aliases already settled before it. With
/// two includes named `bar` the first becomes `_bar` and the second keeps
/// `bar`; the output is fully determined by the header order.
pub fn resolve_aliases(defaults: &[String]) -> Vec<String> {
    let mut aliases = defaults.to_vec();
    for i in 0..aliases.len() {
        loop {
            let (settled, pending) = aliases.split_at(i);
            let candidate = &pending[0];
            if !pending[1..].contains(candidate) && !settled.contains(candidate) {
                break;
            }
            aliases[i] = format!("_{}", aliases[i]);
        }
    }
    aliases
}

/// File basename without its extension, usable as a JavaScript identifier.
pub fn default_alias(include: &str) -> String {
    let stem = Path::new(include)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize_alias(&stem)
}

pub(crate) fn sanitize_alias(alias: &str) -> String {
    let sanitized: String = alias
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();

    match sanitized.chars().next() {
        None => "_".to_string(),
        Some(first) if first.is_ascii_digit() => format!("_{sanitized}"),
        Some(_) => sanitized,
    }
}

/// Module specifier for an include: extension dropped, `/`-separated, and
/// `./` added when the path has no directory part. Absolute includes are made
/// relative to the including file's directory when they live below it.
pub fn module_path(include: &str, schema_dir: &Path) -> String {
    let path = Path::new(include);
    let path = if path.is_absolute() {
        path.strip_prefix(schema_dir).unwrap_or(path)
    } else {
        path
    };
    let path = path.with_extension("");

    let parts: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::CurDir => Some(".".to_string()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir => Some(String::new()),
            Component::Prefix(_) => None,
        })
        .collect();
    let joined = parts.join("/");

    if parts.len() == 1 {
        format!("./{joined}")
    } else {
        joined
    }
}

/// Whether any type the converter renders in this file is `Long`.
pub fn uses_long(file: &SchemaFile) -> bool {
    file.definitions.iter().any(|def| match def {
        Definition::Struct(def) | Definition::Exception(def) | Definition::Union(def) => {
            def.fields.iter().any(|field| field.value_type.uses_long())
        }
        Definition::Typedef(def) => def.value_type.uses_long(),
        Definition::Service(def) => def.functions.iter().any(|function| {
            function.returns.uses_long()
                || function
                    .params
                    .iter()
                    .any(|param| param.value_type.uses_long())
        }),
        Definition::Const(def) => def.value_type.uses_long(),
        Definition::Enum(_) | Definition::Other { .. } => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(defaults: &[&str]) -> Vec<String> {
        let defaults: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
        resolve_aliases(&defaults)
    }

    #[test]
    fn distinct_aliases_are_untouched() {
        assert_eq!(aliases(&["foo", "bar"]), vec!["foo", "bar"]);
    }

    #[test]
    fn earlier_include_yields_on_collision() {
        assert_eq!(aliases(&["bar", "bar"]), vec!["_bar", "bar"]);
    }

    #[test]
    fn three_way_collision_stays_unique() {
        assert_eq!(aliases(&["x", "x", "x"]), vec!["_x", "__x", "x"]);
    }

    #[test]
    fn prefixed_alias_is_checked_again() {
        assert_eq!(aliases(&["bar", "_bar", "bar"]), vec!["__bar", "_bar", "bar"]);
    }

    #[test]
    fn settled_aliases_are_respected() {
        assert_eq!(aliases(&["_bar", "bar", "bar"]), vec!["_bar", "__bar", "bar"]);
    }

    #[test]
    fn module_paths() {
        let dir = Path::new("/idl/service");
        assert_eq!(module_path("shared.thrift", dir), "./shared");
        assert_eq!(module_path("./shared.thrift", dir), "./shared");
        assert_eq!(module_path("foo/bar.thrift", dir), "foo/bar");
        assert_eq!(module_path("../common/base.thrift", dir), "../common/base");
        assert_eq!(module_path("/idl/service/nested/x.thrift", dir), "nested/x");
    }

    #[test]
    fn default_alias_is_an_identifier() {
        assert_eq!(default_alias("foo/bar.thrift"), "bar");
        assert_eq!(default_alias("common-types.thrift"), "common_types");
        assert_eq!(default_alias("1common.thrift"), "_1common");
        assert_eq!(default_alias("v2/2fa.thrift"), "_2fa");
        assert_eq!(sanitize_alias(""), "_");
    }
}
