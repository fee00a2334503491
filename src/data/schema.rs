//! Table Schema Module
//! Explicit per-column type declarations for the three source tables.

use std::fmt;

/// How a source column is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Integer key (`id`, `client_id`, ...)
    Identifier,
    Integer,
    Float,
    /// Free text or category label, kept as-is
    Categorical,
    /// `$1,234.50` style monetary string
    Currency,
    /// Timestamp string, parsed to a datetime
    DateString,
    /// `Yes` / anything else
    Flag,
}

impl ColumnKind {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Identifier => "identifier",
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Currency => "currency",
            ColumnKind::DateString => "date",
            ColumnKind::Flag => "flag",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived bucket columns computed by the cleaner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// `floor(current_age / 10) * 10`
    AgeGroup,
    /// `floor(credit_score / 100) * 100`
    CreditScoreGroup,
    /// `round(per_capita_income / 10000) * 10000`
    IncomeBracket,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

impl ColumnDef {
    pub const fn required(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DerivedDef {
    pub name: &'static str,
    pub source: &'static str,
    pub bucket: Bucket,
}

#[derive(Debug)]
pub struct TableSchema {
    /// Table name in the store
    pub name: &'static str,
    /// Source file name searched for by the loader
    pub source_file: &'static str,
    pub columns: &'static [ColumnDef],
    pub derived: &'static [DerivedDef],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Declared kind of a column; undeclared columns are carried as text.
    pub fn kind_of(&self, name: &str) -> ColumnKind {
        self.column(name)
            .map(|c| c.kind)
            .unwrap_or(ColumnKind::Categorical)
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.required)
    }
}

pub static USERS: TableSchema = TableSchema {
    name: "users",
    source_file: "users_data.csv",
    columns: &[
        ColumnDef::required("id", ColumnKind::Identifier),
        ColumnDef::required("current_age", ColumnKind::Integer),
        ColumnDef::new("retirement_age", ColumnKind::Integer),
        ColumnDef::new("birth_year", ColumnKind::Integer),
        ColumnDef::new("birth_month", ColumnKind::Integer),
        ColumnDef::required("gender", ColumnKind::Categorical),
        ColumnDef::new("address", ColumnKind::Categorical),
        ColumnDef::new("latitude", ColumnKind::Float),
        ColumnDef::new("longitude", ColumnKind::Float),
        ColumnDef::required("per_capita_income", ColumnKind::Currency),
        ColumnDef::new("yearly_income", ColumnKind::Currency),
        ColumnDef::required("total_debt", ColumnKind::Currency),
        ColumnDef::required("credit_score", ColumnKind::Integer),
        ColumnDef::required("num_credit_cards", ColumnKind::Integer),
    ],
    derived: &[
        DerivedDef {
            name: "age_group",
            source: "current_age",
            bucket: Bucket::AgeGroup,
        },
        DerivedDef {
            name: "credit_score_group",
            source: "credit_score",
            bucket: Bucket::CreditScoreGroup,
        },
        DerivedDef {
            name: "income_bracket",
            source: "per_capita_income",
            bucket: Bucket::IncomeBracket,
        },
    ],
};

pub static CARDS: TableSchema = TableSchema {
    name: "cards",
    source_file: "cards_data.csv",
    columns: &[
        ColumnDef::required("id", ColumnKind::Identifier),
        ColumnDef::required("client_id", ColumnKind::Identifier),
        ColumnDef::required("card_brand", ColumnKind::Categorical),
        ColumnDef::required("card_type", ColumnKind::Categorical),
        ColumnDef::new("card_number", ColumnKind::Categorical),
        ColumnDef::new("expires", ColumnKind::Categorical),
        ColumnDef::new("cvv", ColumnKind::Categorical),
        ColumnDef::new("has_chip", ColumnKind::Categorical),
        ColumnDef::new("num_cards_issued", ColumnKind::Integer),
        ColumnDef::required("credit_limit", ColumnKind::Currency),
        ColumnDef::new("acct_open_date", ColumnKind::Categorical),
        ColumnDef::new("year_pin_last_changed", ColumnKind::Integer),
        ColumnDef::required("card_on_dark_web", ColumnKind::Flag),
    ],
    derived: &[],
};

pub static TRANSACTIONS: TableSchema = TableSchema {
    name: "transactions",
    source_file: "transactions_data.csv",
    columns: &[
        ColumnDef::required("id", ColumnKind::Identifier),
        ColumnDef::required("date", ColumnKind::DateString),
        ColumnDef::required("client_id", ColumnKind::Identifier),
        ColumnDef::new("card_id", ColumnKind::Identifier),
        ColumnDef::required("amount", ColumnKind::Currency),
        ColumnDef::new("use_chip", ColumnKind::Categorical),
        ColumnDef::new("merchant_id", ColumnKind::Identifier),
        ColumnDef::new("merchant_city", ColumnKind::Categorical),
        ColumnDef::new("merchant_state", ColumnKind::Categorical),
        ColumnDef::new("zip", ColumnKind::Float),
        ColumnDef::required("mcc", ColumnKind::Integer),
        ColumnDef::new("errors", ColumnKind::Categorical),
    ],
    derived: &[],
};

/// All tables in load order.
pub static ALL_TABLES: [&TableSchema; 3] = [&USERS, &CARDS, &TRANSACTIONS];
