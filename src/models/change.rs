use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

macro_rules! change_kinds {
    ($($variant:ident => $name:literal,)+) => {
        /// Change types emitted by the distiller. Names outside the known
        /// vocabulary are kept verbatim in `Unknown`.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ChangeKind {
            $($variant,)+
            Unknown(String),
        }

        impl ChangeKind {
            /// Every known kind. `Unknown` is not listed.
            pub const ALL: &'static [ChangeKind] = &[$(ChangeKind::$variant,)+];

            pub fn as_str(&self) -> &str {
                match self {
                    $(ChangeKind::$variant => $name,)+
                    ChangeKind::Unknown(name) => name.as_str(),
                }
            }

            /// Lenient counterpart of `FromStr`: never fails.
            pub fn from_name(name: &str) -> Self {
                name.parse()
                    .unwrap_or_else(|_| ChangeKind::Unknown(name.to_string()))
            }
        }

        impl FromStr for ChangeKind {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(ChangeKind::$variant),)+
                    other => Err(format!("unknown change kind: {}", other)),
                }
            }
        }
    };
}

change_kinds! {
    AddingAttributeModifiability => "ADDING_ATTRIBUTE_MODIFIABILITY",
    AddingClassDerivability => "ADDING_CLASS_DERIVABILITY",
    AddingMethodOverridability => "ADDING_METHOD_OVERRIDABILITY",
    AdditionalClass => "ADDITIONAL_CLASS",
    AdditionalFunctionality => "ADDITIONAL_FUNCTIONALITY",
    AdditionalObjectState => "ADDITIONAL_OBJECT_STATE",
    AlternativePartDelete => "ALTERNATIVE_PART_DELETE",
    AlternativePartInsert => "ALTERNATIVE_PART_INSERT",
    AttributeRenaming => "ATTRIBUTE_RENAMING",
    AttributeTypeChange => "ATTRIBUTE_TYPE_CHANGE",
    ClassRenaming => "CLASS_RENAMING",
    CommentDelete => "COMMENT_DELETE",
    CommentInsert => "COMMENT_INSERT",
    CommentMove => "COMMENT_MOVE",
    CommentUpdate => "COMMENT_UPDATE",
    ConditionExpressionChange => "CONDITION_EXPRESSION_CHANGE",
    DecreasingAccessibilityChange => "DECREASING_ACCESSIBILITY_CHANGE",
    DocDelete => "DOC_DELETE",
    DocInsert => "DOC_INSERT",
    DocUpdate => "DOC_UPDATE",
    IncreasingAccessibilityChange => "INCREASING_ACCESSIBILITY_CHANGE",
    MethodRenaming => "METHOD_RENAMING",
    ParameterDelete => "PARAMETER_DELETE",
    ParameterInsert => "PARAMETER_INSERT",
    ParameterOrderingChange => "PARAMETER_ORDERING_CHANGE",
    ParameterRenaming => "PARAMETER_RENAMING",
    ParameterTypeChange => "PARAMETER_TYPE_CHANGE",
    ParentClassChange => "PARENT_CLASS_CHANGE",
    ParentClassDelete => "PARENT_CLASS_DELETE",
    ParentClassInsert => "PARENT_CLASS_INSERT",
    ParentInterfaceChange => "PARENT_INTERFACE_CHANGE",
    ParentInterfaceDelete => "PARENT_INTERFACE_DELETE",
    ParentInterfaceInsert => "PARENT_INTERFACE_INSERT",
    RemovedClass => "REMOVED_CLASS",
    RemovedFunctionality => "REMOVED_FUNCTIONALITY",
    RemovedObjectState => "REMOVED_OBJECT_STATE",
    RemovingAttributeModifiability => "REMOVING_ATTRIBUTE_MODIFIABILITY",
    RemovingClassDerivability => "REMOVING_CLASS_DERIVABILITY",
    RemovingMethodOverridability => "REMOVING_METHOD_OVERRIDABILITY",
    ReturnTypeChange => "RETURN_TYPE_CHANGE",
    ReturnTypeDelete => "RETURN_TYPE_DELETE",
    ReturnTypeInsert => "RETURN_TYPE_INSERT",
    StatementDelete => "STATEMENT_DELETE",
    StatementInsert => "STATEMENT_INSERT",
    StatementOrderingChange => "STATEMENT_ORDERING_CHANGE",
    StatementParentChange => "STATEMENT_PARENT_CHANGE",
    StatementUpdate => "STATEMENT_UPDATE",
    UnclassifiedChange => "UNCLASSIFIED_CHANGE",
}

impl ChangeKind {
    pub fn is_known(&self) -> bool {
        !matches!(self, ChangeKind::Unknown(_))
    }

    pub fn is_statement_level(&self) -> bool {
        self.is_known() && self.as_str().starts_with("STATEMENT_")
    }
}

impl Serialize for ChangeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChangeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ChangeKind::from_name(&name))
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single edit the distiller found between two versions of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicChange {
    #[serde(rename = "change_type")]
    pub change_kind: ChangeKind,
    pub changed_entity: String,
    #[serde(default)]
    pub parent_entity: Option<String>,
}

impl AtomicChange {
    pub fn new(change_kind: ChangeKind, changed_entity: impl Into<String>) -> Self {
        Self {
            change_kind,
            changed_entity: changed_entity.into(),
            parent_entity: None,
        }
    }

    pub fn with_parent(mut self, parent_entity: impl Into<String>) -> Self {
        self.parent_entity = Some(parent_entity.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_kind_names_round_trip_through_from_str() {
        for kind in ChangeKind::ALL {
            assert_eq!(kind.as_str().parse::<ChangeKind>().unwrap(), *kind);
        }
        assert!("STATEMENT_TELEPORT".parse::<ChangeKind>().is_err());
        assert_eq!(
            ChangeKind::from_name("STATEMENT_TELEPORT"),
            ChangeKind::Unknown("STATEMENT_TELEPORT".to_string())
        );
    }

    #[test]
    fn test_statement_level() {
        assert!(ChangeKind::StatementInsert.is_statement_level());
        assert!(ChangeKind::StatementParentChange.is_statement_level());
        assert!(!ChangeKind::AdditionalFunctionality.is_statement_level());
        assert!(!ChangeKind::from_name("STATEMENT_TELEPORT").is_statement_level());
    }

    #[test]
    fn test_deserialize_distiller_record() {
        let change: AtomicChange = serde_json::from_str(
            r#"{"change_type": "STATEMENT_INSERT", "changed_entity": "IF_STATEMENT", "parent_entity": "METHOD"}"#,
        )
        .unwrap();
        assert_eq!(change.change_kind, ChangeKind::StatementInsert);
        assert_eq!(change.changed_entity, "IF_STATEMENT");
        assert_eq!(change.parent_entity.as_deref(), Some("METHOD"));
    }

    #[test]
    fn test_unknown_kind_survives_deserialization() {
        let change: AtomicChange = serde_json::from_str(
            r#"{"change_type": "SOME_NEW_KIND", "changed_entity": "FIELD"}"#,
        )
        .unwrap();
        assert_eq!(change.change_kind, ChangeKind::Unknown("SOME_NEW_KIND".to_string()));
        assert_eq!(
            serde_json::to_value(&change.change_kind).unwrap(),
            serde_json::json!("SOME_NEW_KIND")
        );
    }
}
