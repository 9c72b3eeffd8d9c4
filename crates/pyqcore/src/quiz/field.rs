use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::core::error::AppError;

/// The six classification dimensions, ordered from broadest to narrowest.
///
/// Column names in dynamic SQL come only from [`ClassificationField::column`],
/// so a field name supplied by a user can never reach a query as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ClassificationField {
    Board,
    Year,
    Exam,
    Subject,
    Topic,
    Subtopic,
}

impl ClassificationField {
    /// Drill-down order: board → year → exam → subject → topic → subtopic
    pub fn all() -> impl Iterator<Item = ClassificationField> {
        Self::iter()
    }

    /// Column name in both `records` and `filter_sessions`
    pub const fn column(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Year => "year",
            Self::Exam => "exam",
            Self::Subject => "subject",
            Self::Topic => "topic",
            Self::Subtopic => "subtopic",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Board => "Board",
            Self::Year => "Year",
            Self::Exam => "Exam",
            Self::Subject => "Subject",
            Self::Topic => "Topic",
            Self::Subtopic => "Subtopic",
        }
    }

    /// Plural used in "No … for current filters." notices
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Board => "boards",
            Self::Year => "years",
            Self::Exam => "exams",
            Self::Subject => "subjects",
            Self::Topic => "topics",
            Self::Subtopic => "subtopics",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Board => "📚",
            Self::Year => "📅",
            Self::Exam => "🧪",
            Self::Subject => "📖",
            Self::Topic => "🧩",
            Self::Subtopic => "🔹",
        }
    }

    /// Validates a field name at the boundary.
    pub fn parse(name: &str) -> Result<Self, AppError> {
        name.parse::<Self>().map_err(|_| AppError::UnknownField(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        for field in ClassificationField::all() {
            assert_eq!(ClassificationField::parse(field.column()).unwrap(), field);
            assert_eq!(field.to_string(), field.column());
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_injection() {
        assert!(matches!(
            ClassificationField::parse("question_text"),
            Err(AppError::UnknownField(_))
        ));
        assert!(ClassificationField::parse("board = board; DROP TABLE records").is_err());
        assert!(ClassificationField::parse("Board").is_err());
    }

    #[test]
    fn test_drill_down_order() {
        let order: Vec<&str> = ClassificationField::all().map(|f| f.column()).collect();
        assert_eq!(order, ["board", "year", "exam", "subject", "topic", "subtopic"]);
    }
}
