use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    #[serde(rename = "DATA")]
    Data,
    #[serde(rename = "COMPUTATION")]
    Computation,
    #[serde(rename = "INTERFACE")]
    Interface,
    #[serde(rename = "LOGIC_CONTROL")]
    LogicControl,
    #[serde(rename = "OTHER")]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Data,
        Category::Computation,
        Category::Interface,
        Category::LogicControl,
        Category::Other,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Data => write!(f, "DATA"),
            Category::Computation => write!(f, "COMPUTATION"),
            Category::Interface => write!(f, "INTERFACE"),
            Category::LogicControl => write!(f, "LOGIC_CONTROL"),
            Category::Other => write!(f, "OTHER"),
        }
    }
}

/// Per-category counts. Only categories that occurred are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationTally {
    counts: BTreeMap<Category, u32>,
}

impl ClassificationTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, category: Category) {
        *self.counts.entry(category).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &ClassificationTally) {
        for (category, count) in &other.counts {
            *self.counts.entry(*category).or_insert(0) += count;
        }
    }

    pub fn get(&self, category: Category) -> u32 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, u32)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }
}

impl FromIterator<(Category, u32)> for ClassificationTally {
    fn from_iter<I: IntoIterator<Item = (Category, u32)>>(iter: I) -> Self {
        let mut tally = Self::new();
        for (category, count) in iter {
            *tally.counts.entry(category).or_insert(0) += count;
        }
        tally
    }
}

/// What got stored for a commit pair.
///
/// `NotAnalyzed` means no eligible file pair existed, which is not the same
/// thing as a tally of zeros. It persists as a NULL `changes` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "changes", rename_all = "snake_case")]
pub enum ChangeSummary {
    NotAnalyzed,
    Tally(ClassificationTally),
}

impl ChangeSummary {
    pub fn from_tally(tally: ClassificationTally) -> Self {
        if tally.is_empty() {
            ChangeSummary::NotAnalyzed
        } else {
            ChangeSummary::Tally(tally)
        }
    }

    pub fn tally(&self) -> Option<&ClassificationTally> {
        match self {
            ChangeSummary::NotAnalyzed => None,
            ChangeSummary::Tally(t) => Some(t),
        }
    }

    /// JSON column value: `None` for `NotAnalyzed`.
    pub fn to_column(&self) -> serde_json::Result<Option<String>> {
        self.tally().map(serde_json::to_string).transpose()
    }

    pub fn from_column(column: Option<String>) -> serde_json::Result<Self> {
        match column {
            None => Ok(ChangeSummary::NotAnalyzed),
            Some(json) => Ok(ChangeSummary::from_tally(serde_json::from_str(&json)?)),
        }
    }
}

/// One stored result row, with the revisions it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitChanges {
    pub old_commit_id: i64,
    pub new_commit_id: i64,
    pub old_revision: String,
    pub new_revision: String,
    /// `None` when no eligible file pair existed.
    pub changes: Option<ClassificationTally>,
}

impl CommitChanges {
    pub fn summary(&self) -> ChangeSummary {
        match &self.changes {
            Some(tally) => ChangeSummary::from_tally(tally.clone()),
            None => ChangeSummary::NotAnalyzed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_serializes_with_category_names() {
        let tally: ClassificationTally =
            [(Category::LogicControl, 2), (Category::Data, 1)].into_iter().collect();
        let json = serde_json::to_string(&tally).unwrap();
        assert_eq!(json, r#"{"DATA":1,"LOGIC_CONTROL":2}"#);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_empty_tally_is_not_analyzed() {
        let summary = ChangeSummary::from_tally(ClassificationTally::new());
        assert_eq!(summary, ChangeSummary::NotAnalyzed);
        assert_eq!(summary.to_column().unwrap(), None);
        assert_eq!(ChangeSummary::from_column(None).unwrap(), ChangeSummary::NotAnalyzed);
    }

    #[test]
    fn test_merge_adds_counts() {
        let mut a: ClassificationTally = [(Category::Other, 1)].into_iter().collect();
        let b: ClassificationTally =
            [(Category::Other, 2), (Category::Interface, 1)].into_iter().collect();
        a.merge(&b);
        assert_eq!(a.get(Category::Other), 3);
        assert_eq!(a.get(Category::Interface), 1);
        assert_eq!(a.get(Category::Computation), 0);
    }
}
