use convert_case::{Case, Casing};

/// Casing applied to every declared type and value name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameCase {
    #[default]
    Preserve,
    Pascal,
    Camel,
    Snake,
    Constant,
}

impl NameCase {
    pub fn apply(self, name: &str) -> String {
        match self {
            NameCase::Preserve => name.to_string(),
            NameCase::Pascal => name.to_case(Case::Pascal),
            NameCase::Camel => name.to_case(Case::Camel),
            NameCase::Snake => name.to_case(Case::Snake),
            NameCase::Constant => name.to_case(Case::Constant),
        }
    }
}
