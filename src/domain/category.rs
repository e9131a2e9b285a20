use serde::{Deserialize, Serialize};

use super::TransactionKind;

/// Label of the sentinel choice that lets the user type their own category.
pub const OTHERS: &str = "Others";

/// Longest custom category label accepted.
pub const MAX_CUSTOM_LABEL_LEN: usize = 50;

/// Categories the wallet recognizes out of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryTag {
    Salary,
    Gift,
    CashDeposit,
    FoodAndDrink,
    Shopping,
    Housing,
    Bills,
    Transport,
    Entertainment,
    /// Reserved for the two halves of a transfer
    Transfer,
}

const INCOME_TAGS: &[CategoryTag] = &[
    CategoryTag::Salary,
    CategoryTag::Gift,
    CategoryTag::CashDeposit,
    CategoryTag::Transfer,
];

const EXPENSE_TAGS: &[CategoryTag] = &[
    CategoryTag::FoodAndDrink,
    CategoryTag::Shopping,
    CategoryTag::Housing,
    CategoryTag::Bills,
    CategoryTag::Transport,
    CategoryTag::Entertainment,
    CategoryTag::Transfer,
];

const ALL_TAGS: &[CategoryTag] = &[
    CategoryTag::Salary,
    CategoryTag::Gift,
    CategoryTag::CashDeposit,
    CategoryTag::FoodAndDrink,
    CategoryTag::Shopping,
    CategoryTag::Housing,
    CategoryTag::Bills,
    CategoryTag::Transport,
    CategoryTag::Entertainment,
    CategoryTag::Transfer,
];

impl CategoryTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryTag::Salary => "Salary",
            CategoryTag::Gift => "Gift",
            CategoryTag::CashDeposit => "Cash Deposit",
            CategoryTag::FoodAndDrink => "Food & Drink",
            CategoryTag::Shopping => "Shopping",
            CategoryTag::Housing => "Housing",
            CategoryTag::Bills => "Bills",
            CategoryTag::Transport => "Transport",
            CategoryTag::Entertainment => "Entertainment",
            CategoryTag::Transfer => "Transfer",
        }
    }

    /// Look up a tag by its display label, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        ALL_TAGS
            .iter()
            .copied()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(label))
    }

    /// Tags recognized for the given kind, in display order.
    pub fn for_kind(kind: TransactionKind) -> &'static [CategoryTag] {
        match kind {
            TransactionKind::Income => INCOME_TAGS,
            TransactionKind::Expense => EXPENSE_TAGS,
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, CategoryTag::Transfer)
    }
}

impl std::fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction category: either one of the recognized tags, or a free-text
/// label supplied through the "Others" choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Category {
    Listed(CategoryTag),
    Custom(String),
}

impl Category {
    /// Build a category from a form-style selection. Choosing "Others" takes
    /// the custom label; anything else must name a recognized tag.
    pub fn from_selection(selection: &str, custom_label: Option<&str>) -> Result<Self, CategoryError> {
        if selection.trim().eq_ignore_ascii_case(OTHERS) {
            return Ok(Category::Custom(
                custom_label.unwrap_or_default().trim().to_string(),
            ));
        }
        CategoryTag::from_label(selection)
            .map(Category::Listed)
            .ok_or_else(|| CategoryError::Unknown(selection.trim().to_string()))
    }

    /// Decode a category as persisted. Stored labels that match a tag come
    /// back as that tag; everything else was a custom label.
    pub fn from_stored(label: &str) -> Self {
        match ALL_TAGS.iter().copied().find(|tag| tag.as_str() == label) {
            Some(tag) => Category::Listed(tag),
            None => Category::Custom(label.to_string()),
        }
    }

    /// The label that is persisted and displayed.
    pub fn label(&self) -> &str {
        match self {
            Category::Listed(tag) => tag.as_str(),
            Category::Custom(label) => label,
        }
    }

    /// Trim surrounding whitespace from a custom label.
    pub fn normalized(self) -> Self {
        match self {
            Category::Custom(label) => Category::Custom(label.trim().to_string()),
            listed => listed,
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, Category::Listed(CategoryTag::Transfer))
    }

    /// Check that this category may be used for a directly recorded
    /// transaction of the given kind. Transfers are only produced by the
    /// two-sided transfer path and are rejected here.
    pub fn validate_for(&self, kind: TransactionKind) -> Result<(), CategoryError> {
        match self {
            Category::Listed(tag) if tag.is_reserved() => Err(CategoryError::Reserved(*tag)),
            Category::Listed(tag) => {
                if CategoryTag::for_kind(kind).contains(tag) {
                    Ok(())
                } else {
                    Err(CategoryError::NotAllowedForKind { tag: *tag, kind })
                }
            }
            Category::Custom(label) => {
                let label = label.trim();
                if label.is_empty() {
                    return Err(CategoryError::BlankCustomLabel);
                }
                if label.chars().count() > MAX_CUSTOM_LABEL_LEN {
                    return Err(CategoryError::CustomLabelTooLong(label.chars().count()));
                }
                // A custom label spelled like a reserved tag would decode as
                // that tag once stored.
                if let Some(tag) = CategoryTag::from_label(label).filter(CategoryTag::is_reserved) {
                    return Err(CategoryError::Reserved(tag));
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Labels offered for a kind, including the trailing "Others" choice.
pub fn category_choices(kind: TransactionKind) -> Vec<&'static str> {
    CategoryTag::for_kind(kind)
        .iter()
        .map(CategoryTag::as_str)
        .chain(std::iter::once(OTHERS))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    Unknown(String),
    BlankCustomLabel,
    CustomLabelTooLong(usize),
    Reserved(CategoryTag),
    NotAllowedForKind { tag: CategoryTag, kind: TransactionKind },
}

impl std::fmt::Display for CategoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryError::Unknown(label) => write!(f, "unknown category '{}'", label),
            CategoryError::BlankCustomLabel => write!(f, "a custom category name is required"),
            CategoryError::CustomLabelTooLong(len) => write!(
                f,
                "custom category is {} characters long (max {})",
                len, MAX_CUSTOM_LABEL_LEN
            ),
            CategoryError::Reserved(tag) => {
                write!(f, "category '{}' is reserved for transfers between accounts", tag)
            }
            CategoryError::NotAllowedForKind { tag, kind } => {
                write!(f, "category '{}' cannot be used for {} transactions", tag, kind)
            }
        }
    }
}

impl std::error::Error for CategoryError {}
