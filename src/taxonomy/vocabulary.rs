//! Fixed change-kind vocabularies and entity labels the rules refer to.

use crate::models::ChangeKind;

pub const DATA_KINDS: &[ChangeKind] = &[
    ChangeKind::AddingAttributeModifiability,
    ChangeKind::AdditionalObjectState,
    ChangeKind::AttributeRenaming,
    ChangeKind::AttributeTypeChange,
    ChangeKind::RemovedObjectState,
    ChangeKind::RemovingAttributeModifiability,
];

/// No distiller kind is computational on its own; computation is only
/// recognised through the statement-level rule.
pub const COMPUTATION_KINDS: &[ChangeKind] = &[];

pub const INTERFACE_KINDS: &[ChangeKind] = &[
    ChangeKind::AdditionalClass,
    ChangeKind::ClassRenaming,
    ChangeKind::DecreasingAccessibilityChange,
    ChangeKind::IncreasingAccessibilityChange,
    ChangeKind::MethodRenaming,
    ChangeKind::ParameterDelete,
    ChangeKind::ParameterInsert,
    ChangeKind::ParameterOrderingChange,
    ChangeKind::ParameterRenaming,
    ChangeKind::ParameterTypeChange,
    ChangeKind::ParentInterfaceChange,
    ChangeKind::ParentInterfaceDelete,
    ChangeKind::ParentInterfaceInsert,
    ChangeKind::RemovedClass,
    ChangeKind::ReturnTypeChange,
    ChangeKind::ReturnTypeDelete,
    ChangeKind::ReturnTypeInsert,
    ChangeKind::AddingClassDerivability,
    ChangeKind::RemovingClassDerivability,
    ChangeKind::AddingMethodOverridability,
    ChangeKind::RemovingMethodOverridability,
    ChangeKind::ParentClassChange,
    ChangeKind::ParentClassDelete,
    ChangeKind::ParentClassInsert,
];

pub const LOGIC_CONTROL_KINDS: &[ChangeKind] = &[
    ChangeKind::AlternativePartDelete,
    ChangeKind::AlternativePartInsert,
    ChangeKind::ConditionExpressionChange,
];

pub const OTHER_KINDS: &[ChangeKind] = &[
    ChangeKind::CommentDelete,
    ChangeKind::CommentInsert,
    ChangeKind::CommentMove,
    ChangeKind::CommentUpdate,
    ChangeKind::DocDelete,
    ChangeKind::DocInsert,
    ChangeKind::DocUpdate,
];

pub const VARIABLE_DECLARATION_STATEMENT: &str = "VARIABLE_DECLARATION_STATEMENT";
pub const MODIFIER: &str = "MODIFIER";
pub const TYPE_PARAMETER: &str = "TYPE_PARAMETER";
pub const METHOD: &str = "METHOD";

pub const COMPUTATION_STATEMENTS: &[&str] = &["ASSIGNMENT", "POSTFIX_EXPRESSION"];

pub const INTERFACE_STATEMENTS: &[&str] = &[
    "METHOD_INVOCATION",
    "CONSTRUCTOR_INVOCATION",
    "SYNCHRONIZED_STATEMENT",
];

pub const CONTROL_FLOW_STATEMENTS: &[&str] = &[
    "IF_STATEMENT",
    "FOREACH_STATEMENT",
    "CONTINUE_STATEMENT",
    "RETURN_STATEMENT",
    "THROW_STATEMENT",
    "SWITCH_CASE",
    "SWITCH_STATEMENT",
    "BREAK_STATEMENT",
    "CATCH_CLAUSE",
    "TRY_STATEMENT",
    "FOR_STATEMENT",
    "WHILE_STATEMENT",
    "DO_STATEMENT",
];

pub const FUNCTIONALITY_SUFFIX: &str = "_FUNCTIONALITY";
