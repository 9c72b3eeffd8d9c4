//! Records and filter tuples

use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, AppResult};
use crate::quiz::field::ClassificationField;

/// A stored question. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRecord {
    pub id: i64,
    pub classification: Classification,
    pub question_text: String,
    pub options: [String; 4],
    /// 1-based, always within 1..=4
    pub correct_option: u8,
    pub explanation: Option<String>,
}

impl ClassificationRecord {
    /// 0-based index of the correct option, as Telegram quiz polls expect
    pub fn correct_index(&self) -> u8 {
        self.correct_option.saturating_sub(1)
    }
}

/// The six classification values of a record or a filter tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub board: Option<String>,
    pub year: Option<String>,
    pub exam: Option<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub subtopic: Option<String>,
}

impl Classification {
    pub fn get(&self, field: ClassificationField) -> Option<&str> {
        match field {
            ClassificationField::Board => self.board.as_deref(),
            ClassificationField::Year => self.year.as_deref(),
            ClassificationField::Exam => self.exam.as_deref(),
            ClassificationField::Subject => self.subject.as_deref(),
            ClassificationField::Topic => self.topic.as_deref(),
            ClassificationField::Subtopic => self.subtopic.as_deref(),
        }
    }

    pub fn set(&mut self, field: ClassificationField, value: Option<String>) {
        let slot = match field {
            ClassificationField::Board => &mut self.board,
            ClassificationField::Year => &mut self.year,
            ClassificationField::Exam => &mut self.exam,
            ClassificationField::Subject => &mut self.subject,
            ClassificationField::Topic => &mut self.topic,
            ClassificationField::Subtopic => &mut self.subtopic,
        };
        *slot = value;
    }
}

/// A user's filter tuple. `None` (or an empty string) means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub user_id: i64,
    pub values: Classification,
}

impl FilterState {
    pub fn unconstrained(user_id: i64) -> Self {
        Self {
            user_id,
            values: Classification::default(),
        }
    }

    /// The value of `field` when it actually constrains a search
    pub fn constraint(&self, field: ClassificationField) -> Option<&str> {
        self.values.get(field).filter(|v| !v.is_empty())
    }

    /// Every set field as an equality constraint, in drill-down order
    pub fn constraints(&self) -> Vec<(ClassificationField, &str)> {
        ClassificationField::all()
            .filter_map(|field| self.constraint(field).map(|value| (field, value)))
            .collect()
    }

    /// Same as [`constraints`](Self::constraints) but never including `excluded`
    pub fn constraints_excluding(&self, excluded: ClassificationField) -> Vec<(ClassificationField, &str)> {
        self.constraints()
            .into_iter()
            .filter(|(field, _)| *field != excluded)
            .collect()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.constraints().is_empty()
    }
}

/// A fully collected record waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub classification: Classification,
    pub question_text: String,
    pub options: [String; 4],
    pub correct_option: u8,
    pub explanation: Option<String>,
}

impl NewRecord {
    /// Checks the record invariants the schema also enforces.
    pub fn validate(&self) -> AppResult<()> {
        if self.question_text.trim().is_empty() {
            return Err(AppError::Validation("question text is empty".to_string()));
        }
        if let Some(n) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(AppError::Validation(format!("option {} is empty", n + 1)));
        }
        if !(1..=4).contains(&self.correct_option) {
            return Err(AppError::Validation(format!(
                "correct option {} is outside 1..=4",
                self.correct_option
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constraints_skip_unset_and_empty() {
        let mut filters = FilterState::unconstrained(1);
        assert!(filters.is_unconstrained());

        filters.values.set(ClassificationField::Board, Some("CBSE".to_string()));
        filters.values.set(ClassificationField::Subtopic, Some(String::new()));
        filters.values.set(ClassificationField::Topic, Some("Constitution".to_string()));

        assert_eq!(
            filters.constraints(),
            vec![
                (ClassificationField::Board, "CBSE"),
                (ClassificationField::Topic, "Constitution")
            ]
        );
        assert_eq!(
            filters.constraints_excluding(ClassificationField::Topic),
            vec![(ClassificationField::Board, "CBSE")]
        );
    }

    #[test]
    fn test_validate_rejects_bad_correct_option() {
        let record = NewRecord {
            classification: Classification::default(),
            question_text: "Q".to_string(),
            options: ["a", "b", "c", "d"].map(String::from),
            correct_option: 5,
            explanation: None,
        };
        assert!(matches!(record.validate(), Err(AppError::Validation(_))));
    }
}
