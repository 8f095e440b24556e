//! Categorical values shown and filtered in the events views.

/// A selectable value of a categorical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        FilterOption {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Editorial news value, 6 being the most important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Newsvalue {
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
}

impl Newsvalue {
    /// Highest first, the order the filter lists them in.
    pub const ALL: [Newsvalue; 6] = [
        Newsvalue::Six,
        Newsvalue::Five,
        Newsvalue::Four,
        Newsvalue::Three,
        Newsvalue::Two,
        Newsvalue::One,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Newsvalue::One),
            "2" => Some(Newsvalue::Two),
            "3" => Some(Newsvalue::Three),
            "4" => Some(Newsvalue::Four),
            "5" => Some(Newsvalue::Five),
            "6" => Some(Newsvalue::Six),
            _ => None,
        }
    }

    pub fn score(self) -> u8 {
        match self {
            Newsvalue::One => 1,
            Newsvalue::Two => 2,
            Newsvalue::Three => 3,
            Newsvalue::Four => 4,
            Newsvalue::Five => 5,
            Newsvalue::Six => 6,
        }
    }

    pub fn value(self) -> String {
        self.score().to_string()
    }

    pub fn options() -> Vec<FilterOption> {
        Self::ALL
            .iter()
            .map(|nv| FilterOption::new(nv.value(), nv.value()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Internal,
    Public,
}

impl Visibility {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "internal" => Some(Visibility::Internal),
            "public" => Some(Visibility::Public),
            _ => None,
        }
    }

    pub fn value(self) -> &'static str {
        match self {
            Visibility::Internal => "internal",
            Visibility::Public => "public",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Visibility::Internal => "Intern",
            Visibility::Public => "Publik",
        }
    }

    pub fn options() -> Vec<FilterOption> {
        [Visibility::Internal, Visibility::Public]
            .iter()
            .map(|v| FilterOption::new(v.value(), v.label()))
            .collect()
    }
}

/// Whether an event has planning items attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanningStatus {
    Planned,
    Unplanned,
}

impl PlanningStatus {
    pub fn value(self) -> &'static str {
        match self {
            PlanningStatus::Planned => "planned",
            PlanningStatus::Unplanned => "unplanned",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlanningStatus::Planned => "Planerad",
            PlanningStatus::Unplanned => "Ej planerad",
        }
    }

    pub fn options() -> Vec<FilterOption> {
        [PlanningStatus::Planned, PlanningStatus::Unplanned]
            .iter()
            .map(|s| FilterOption::new(s.value(), s.label()))
            .collect()
    }
}
