pub mod sources;
pub mod vocabulary;

use crate::error::{Error, Result};
use crate::models::{AtomicChange, Category, ChangeKind, ClassificationTally};

pub use sources::is_source_file;
use vocabulary::*;

#[derive(Debug, Clone)]
pub enum Predicate {
    /// Change kind is one of the listed kinds, whatever it touched.
    KindIn(&'static [ChangeKind]),
    /// A `STATEMENT_*` change on one of the listed entity labels.
    StatementOn(&'static [&'static str]),
    /// Change kind name ends with `suffix` and the entity is `entity`.
    SuffixOn {
        suffix: &'static str,
        entity: &'static str,
    },
    KindOn {
        kind: ChangeKind,
        entity: &'static str,
    },
}

impl Predicate {
    pub fn matches(&self, change: &AtomicChange) -> bool {
        let entity = change.changed_entity.as_str();
        match self {
            Predicate::KindIn(kinds) => kinds.contains(&change.change_kind),
            Predicate::StatementOn(labels) => {
                change.change_kind.is_statement_level() && labels.iter().any(|l| *l == entity)
            }
            Predicate::SuffixOn { suffix, entity: label } => {
                change.change_kind.is_known()
                    && change.change_kind.as_str().ends_with(suffix)
                    && entity == *label
            }
            Predicate::KindOn { kind, entity: label } => {
                change.change_kind == *kind && entity == *label
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    pub category: Category,
    pub predicate: Predicate,
}

impl Rule {
    pub fn new(name: &'static str, category: Category, predicate: Predicate) -> Self {
        Self {
            name,
            category,
            predicate,
        }
    }

    pub fn matches(&self, change: &AtomicChange) -> bool {
        self.predicate.matches(change)
    }
}

/// Maps atomic changes onto maintenance categories.
///
/// Rules are tried in order and the first match wins, so the order of the
/// `init_*` calls is the category precedence: data, computation, interface,
/// logic/control, other.
pub struct ChangeTaxonomy {
    rules: Vec<Rule>,
}

impl ChangeTaxonomy {
    pub fn new() -> Self {
        let mut taxonomy = Self { rules: Vec::new() };

        taxonomy.init_data();
        taxonomy.init_computation();
        taxonomy.init_interface();
        taxonomy.init_logic_control();
        taxonomy.init_other();

        taxonomy
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    fn init_data(&mut self) {
        self.rules.extend([
            Rule::new("data-kinds", Category::Data, Predicate::KindIn(DATA_KINDS)),
            Rule::new(
                "data-variable-declaration",
                Category::Data,
                Predicate::StatementOn(&[VARIABLE_DECLARATION_STATEMENT]),
            ),
            Rule::new(
                "data-modifier",
                Category::Data,
                Predicate::KindOn {
                    kind: ChangeKind::UnclassifiedChange,
                    entity: MODIFIER,
                },
            ),
        ]);
    }

    fn init_computation(&mut self) {
        self.rules.extend([
            Rule::new(
                "computation-kinds",
                Category::Computation,
                Predicate::KindIn(COMPUTATION_KINDS),
            ),
            Rule::new(
                "computation-statements",
                Category::Computation,
                Predicate::StatementOn(COMPUTATION_STATEMENTS),
            ),
        ]);
    }

    fn init_interface(&mut self) {
        self.rules.extend([
            Rule::new(
                "interface-kinds",
                Category::Interface,
                Predicate::KindIn(INTERFACE_KINDS),
            ),
            Rule::new(
                "interface-invocations",
                Category::Interface,
                Predicate::StatementOn(INTERFACE_STATEMENTS),
            ),
            Rule::new(
                "interface-functionality",
                Category::Interface,
                Predicate::SuffixOn {
                    suffix: FUNCTIONALITY_SUFFIX,
                    entity: METHOD,
                },
            ),
            Rule::new(
                "interface-type-parameter",
                Category::Interface,
                Predicate::KindOn {
                    kind: ChangeKind::UnclassifiedChange,
                    entity: TYPE_PARAMETER,
                },
            ),
        ]);
    }

    fn init_logic_control(&mut self) {
        self.rules.extend([
            Rule::new(
                "logic-control-kinds",
                Category::LogicControl,
                Predicate::KindIn(LOGIC_CONTROL_KINDS),
            ),
            Rule::new(
                "logic-control-statements",
                Category::LogicControl,
                Predicate::StatementOn(CONTROL_FLOW_STATEMENTS),
            ),
        ]);
    }

    fn init_other(&mut self) {
        self.rules
            .push(Rule::new("other-kinds", Category::Other, Predicate::KindIn(OTHER_KINDS)));
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn classify(&self, change: &AtomicChange) -> Result<Category> {
        let category = self
            .rules
            .iter()
            .find(|rule| rule.matches(change))
            .map(|rule| rule.category)
            .ok_or_else(|| Error::UnclassifiedChange {
                change_kind: change.change_kind.to_string(),
                changed_entity: change.changed_entity.clone(),
            })?;

        tracing::debug!(
            "ChangeType: {}, ChangedEntity: {}, ChangedParentEntity: {}, ResultingLabel: {}",
            change.change_kind,
            change.changed_entity,
            change.parent_entity.as_deref().unwrap_or("-"),
            category
        );

        Ok(category)
    }

    /// Every rule that matches, in precedence order.
    pub fn matching_rules<'a>(
        &'a self,
        change: &'a AtomicChange,
    ) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(move |rule| rule.matches(change))
    }

    /// Folds a file's changes into a tally. Fails on the first change no rule
    /// covers; the caller decides what to do with the file.
    pub fn tally(&self, changes: &[AtomicChange]) -> Result<ClassificationTally> {
        let mut tally = ClassificationTally::new();
        for change in changes {
            tally.increment(self.classify(change)?);
        }
        Ok(tally)
    }
}

impl Default for ChangeTaxonomy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: &[&str] = &[
        "IF_STATEMENT",
        "VARIABLE_DECLARATION_STATEMENT",
        "METHOD",
        "MODIFIER",
        "TYPE_PARAMETER",
        "ASSIGNMENT",
        "METHOD_INVOCATION",
        "FIELD",
    ];

    fn classify(kind: ChangeKind, entity: &str) -> Result<Category> {
        ChangeTaxonomy::new().classify(&AtomicChange::new(kind, entity))
    }

    #[test]
    fn test_vocabulary_kinds_ignore_entity() {
        let vocabularies = [
            (DATA_KINDS, Category::Data),
            (COMPUTATION_KINDS, Category::Computation),
            (INTERFACE_KINDS, Category::Interface),
            (LOGIC_CONTROL_KINDS, Category::LogicControl),
            (OTHER_KINDS, Category::Other),
        ];
        for (kinds, expected) in vocabularies {
            for kind in kinds {
                for label in LABELS {
                    let category = classify(kind.clone(), label).unwrap();
                    assert_eq!(category, expected, "{} on {}", kind, label);
                }
            }
        }
    }

    #[test]
    fn test_variable_declaration_statements_are_data() {
        for kind in ChangeKind::ALL.iter().filter(|k| k.is_statement_level()) {
            assert_eq!(
                classify(kind.clone(), VARIABLE_DECLARATION_STATEMENT).unwrap(),
                Category::Data
            );
        }
        assert_eq!(
            classify(ChangeKind::StatementUpdate, "ASSIGNMENT").unwrap(),
            Category::Computation
        );
        assert_eq!(
            classify(ChangeKind::StatementUpdate, "RETURN_STATEMENT").unwrap(),
            Category::LogicControl
        );
    }

    #[test]
    fn test_statement_changes_follow_entity() {
        let cases = [
            ("POSTFIX_EXPRESSION", Category::Computation),
            ("METHOD_INVOCATION", Category::Interface),
            ("CONSTRUCTOR_INVOCATION", Category::Interface),
            ("SYNCHRONIZED_STATEMENT", Category::Interface),
            ("IF_STATEMENT", Category::LogicControl),
            ("CATCH_CLAUSE", Category::LogicControl),
            ("DO_STATEMENT", Category::LogicControl),
        ];
        for (label, expected) in cases {
            assert_eq!(classify(ChangeKind::StatementInsert, label).unwrap(), expected);
        }
    }

    #[test]
    fn test_unclassified_kind_depends_on_entity() {
        assert_eq!(classify(ChangeKind::UnclassifiedChange, MODIFIER).unwrap(), Category::Data);
        assert_eq!(
            classify(ChangeKind::UnclassifiedChange, TYPE_PARAMETER).unwrap(),
            Category::Interface
        );
        assert!(matches!(
            classify(ChangeKind::UnclassifiedChange, "JAVADOC"),
            Err(Error::UnclassifiedChange { .. })
        ));
    }

    #[test]
    fn test_unknown_kind_matches_no_rule() {
        for name in ["SOME_NEW_KIND", "STATEMENT_TELEPORT", "EXTRA_FUNCTIONALITY"] {
            let kind = ChangeKind::from_name(name);
            for label in LABELS {
                match classify(kind.clone(), label) {
                    Err(Error::UnclassifiedChange { change_kind, .. }) => {
                        assert_eq!(change_kind, name)
                    }
                    other => panic!("{} on {} classified as {:?}", name, label, other),
                }
            }
        }
    }

    #[test]
    fn test_functionality_on_method_is_interface() {
        assert_eq!(
            classify(ChangeKind::AdditionalFunctionality, METHOD).unwrap(),
            Category::Interface
        );
        assert_eq!(
            classify(ChangeKind::RemovedFunctionality, METHOD).unwrap(),
            Category::Interface
        );
        assert!(classify(ChangeKind::AdditionalFunctionality, "FIELD").is_err());
    }

    #[test]
    fn test_statement_on_unlisted_entity_is_unclassified() {
        let err = classify(ChangeKind::StatementInsert, "LABELED_STATEMENT").unwrap_err();
        match err {
            Error::UnclassifiedChange { change_kind, changed_entity } => {
                assert_eq!(change_kind, "STATEMENT_INSERT");
                assert_eq!(changed_entity, "LABELED_STATEMENT");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_data_wins_over_interface_when_both_match() {
        let mut rules = ChangeTaxonomy::new().rules().to_vec();
        // An interface rule broad enough to also claim variable declarations.
        rules.insert(
            3,
            Rule::new(
                "interface-any-statement",
                Category::Interface,
                Predicate::StatementOn(&[VARIABLE_DECLARATION_STATEMENT, "METHOD_INVOCATION"]),
            ),
        );
        let taxonomy = ChangeTaxonomy::with_rules(rules);
        let change = AtomicChange::new(ChangeKind::StatementInsert, VARIABLE_DECLARATION_STATEMENT)
            .with_parent("METHOD_INVOCATION");

        let matched: Vec<_> = taxonomy.matching_rules(&change).map(|r| r.category).collect();
        assert_eq!(matched, vec![Category::Data, Category::Interface]);
        assert_eq!(taxonomy.classify(&change).unwrap(), Category::Data);
    }

    #[test]
    fn test_rule_order_is_category_precedence() {
        let taxonomy = ChangeTaxonomy::new();
        let order: Vec<Category> = taxonomy.rules().iter().map(|r| r.category).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert_eq!(order.first(), Some(&Category::Data));
        assert_eq!(order.last(), Some(&Category::Other));
    }

    #[test]
    fn test_tally_counts_each_change_once() {
        let changes = vec![
            AtomicChange::new(ChangeKind::StatementInsert, "IF_STATEMENT"),
            AtomicChange::new(ChangeKind::StatementUpdate, "ASSIGNMENT"),
            AtomicChange::new(ChangeKind::CommentInsert, "LINE_COMMENT"),
            AtomicChange::new(ChangeKind::StatementDelete, "IF_STATEMENT"),
        ];
        let tally = ChangeTaxonomy::new().tally(&changes).unwrap();
        assert_eq!(tally.get(Category::LogicControl), 2);
        assert_eq!(tally.get(Category::Computation), 1);
        assert_eq!(tally.get(Category::Other), 1);
        assert_eq!(tally.total(), 4);
    }
}
