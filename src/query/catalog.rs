//! The fixed analytical queries.
//!
//! Ordering clauses carry explicit tie-breaks so output is reproducible.

/// How a query result is drawn as a bar chart.
#[derive(Debug, Clone, Copy)]
pub struct ChartSpec {
    /// Columns joined with " / " to label each bar
    pub label_columns: &'static [&'static str],
    pub value_column: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct QuerySpec {
    /// Result name, also the exported file stem
    pub name: &'static str,
    pub title: &'static str,
    pub sql: &'static str,
    pub chart: Option<ChartSpec>,
}

pub static QUERIES: [QuerySpec; 10] = [
    QuerySpec {
        name: "card_counts_by_brand_type",
        title: "Cards by brand and type",
        sql: "SELECT card_brand, card_type, COUNT(*) AS num_cards
              FROM cards
              GROUP BY card_brand, card_type
              ORDER BY num_cards DESC, card_brand, card_type",
        chart: Some(ChartSpec {
            label_columns: &["card_brand", "card_type"],
            value_column: "num_cards",
            x_label: "Brand / type",
            y_label: "Number of cards",
        }),
    },
    QuerySpec {
        name: "top_mcc_by_txn_count",
        title: "Top merchant categories by frequency",
        sql: "SELECT mcc, COUNT(*) AS txn_count, SUM(amount) AS total_amount
              FROM transactions
              GROUP BY mcc
              ORDER BY txn_count DESC, total_amount DESC
              LIMIT 10",
        chart: Some(ChartSpec {
            label_columns: &["mcc"],
            value_column: "txn_count",
            x_label: "MCC code",
            y_label: "Number of transactions",
        }),
    },
    QuerySpec {
        name: "monthly_transactions",
        title: "Transactions per month",
        sql: "SELECT strftime('%Y-%m', date) AS month,
                     COUNT(*) AS txn_count,
                     SUM(amount) AS total_amount
              FROM transactions
              WHERE date IS NOT NULL
              GROUP BY month
              ORDER BY month",
        chart: Some(ChartSpec {
            label_columns: &["month"],
            value_column: "txn_count",
            x_label: "Month",
            y_label: "Number of transactions",
        }),
    },
    QuerySpec {
        name: "users_by_age_group",
        title: "Age distribution of users",
        sql: "SELECT age_group, COUNT(*) AS num_users
              FROM users
              GROUP BY age_group
              ORDER BY age_group",
        chart: Some(ChartSpec {
            label_columns: &["age_group"],
            value_column: "num_users",
            x_label: "Age group",
            y_label: "Number of users",
        }),
    },
    QuerySpec {
        name: "amount_by_credit_score_group",
        title: "Average transaction amount by credit score",
        sql: "SELECT u.credit_score_group,
                     AVG(t.amount) AS avg_amount,
                     COUNT(*) AS txn_count
              FROM transactions t
              JOIN users u ON t.client_id = u.id
              GROUP BY u.credit_score_group
              ORDER BY u.credit_score_group",
        chart: Some(ChartSpec {
            label_columns: &["credit_score_group"],
            value_column: "avg_amount",
            x_label: "Credit score group",
            y_label: "Average amount",
        }),
    },
    QuerySpec {
        name: "avg_cards_per_user",
        title: "Average cards per user",
        sql: "SELECT AVG(num_credit_cards) AS avg_num_credit_cards FROM users",
        chart: None,
    },
    QuerySpec {
        name: "dark_web_card_pct",
        title: "Cards seen on the dark web",
        sql: "SELECT SUM(CASE WHEN card_on_dark_web = 1 THEN 1 ELSE 0 END) * 100.0 / COUNT(*)
                     AS dark_web_pct
              FROM cards",
        chart: None,
    },
    QuerySpec {
        name: "debt_by_num_cards",
        title: "Average debt by number of cards",
        sql: "SELECT num_credit_cards,
                     AVG(total_debt) AS avg_total_debt,
                     COUNT(*) AS num_users
              FROM users
              GROUP BY num_credit_cards
              ORDER BY num_credit_cards",
        chart: Some(ChartSpec {
            label_columns: &["num_credit_cards"],
            value_column: "avg_total_debt",
            x_label: "Credit cards held",
            y_label: "Average total debt",
        }),
    },
    QuerySpec {
        name: "credit_limit_by_brand_type",
        title: "Average credit limit by brand and type",
        sql: "SELECT card_brand, card_type,
                     AVG(credit_limit) AS avg_credit_limit,
                     COUNT(*) AS num_cards
              FROM cards
              GROUP BY card_brand, card_type
              ORDER BY avg_credit_limit DESC, card_brand, card_type",
        chart: Some(ChartSpec {
            label_columns: &["card_brand", "card_type"],
            value_column: "avg_credit_limit",
            x_label: "Brand / type",
            y_label: "Average credit limit",
        }),
    },
    QuerySpec {
        name: "credit_score_by_income_bracket",
        title: "Average credit score by income bracket",
        sql: "SELECT income_bracket,
                     AVG(credit_score) AS avg_credit_score,
                     COUNT(*) AS num_users
              FROM users
              GROUP BY income_bracket
              ORDER BY income_bracket",
        chart: Some(ChartSpec {
            label_columns: &["income_bracket"],
            value_column: "avg_credit_score",
            x_label: "Per-capita income bracket",
            y_label: "Average credit score",
        }),
    },
];

pub fn find_query(name: &str) -> Option<&'static QuerySpec> {
    QUERIES.iter().find(|q| q.name == name)
}
