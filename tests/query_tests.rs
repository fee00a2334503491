//! Query catalog behavior against a populated store.

mod common;

use card_insights::query::{find_query, QueryRunner, QUERIES};
use card_insights::store::Store;
use common::{default_store, store_with, CARDS_CSV, TRANSACTIONS_CSV, USERS_CSV};
use polars::prelude::*;
use tempfile::TempDir;

fn run(store: &Store, name: &str) -> DataFrame {
    QueryRunner::run(store, find_query(name).unwrap()).unwrap().df
}

fn i64s(df: &DataFrame, column: &str) -> Vec<Option<i64>> {
    df.column(column).unwrap().i64().unwrap().into_iter().collect()
}

fn f64s(df: &DataFrame, column: &str) -> Vec<Option<f64>> {
    df.column(column)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn strs(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    df.column(column)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

#[test]
fn users_by_age_group_buckets_by_decade() {
    let dir = TempDir::new().unwrap();
    let df = run(&default_store(dir.path()), "users_by_age_group");
    assert_eq!(i64s(&df, "age_group"), vec![Some(30), Some(40)]);
    assert_eq!(i64s(&df, "num_users"), vec![Some(1), Some(1)]);
}

#[test]
fn credit_score_by_income_bracket() {
    let dir = TempDir::new().unwrap();
    let df = run(&default_store(dir.path()), "credit_score_by_income_bracket");
    assert_eq!(i64s(&df, "income_bracket"), vec![Some(40000), Some(50000)]);
    assert_eq!(f64s(&df, "avg_credit_score"), vec![Some(710.0), Some(810.0)]);
    assert_eq!(i64s(&df, "num_users"), vec![Some(1), Some(1)]);
}

#[test]
fn monthly_transactions_sum_a_month() {
    let dir = TempDir::new().unwrap();
    let df = run(&default_store(dir.path()), "monthly_transactions");
    assert_eq!(strs(&df, "month"), vec![Some("2019-01".to_string())]);
    assert_eq!(i64s(&df, "txn_count"), vec![Some(2)]);
    assert_eq!(f64s(&df, "total_amount"), vec![Some(30.0)]);
}

#[test]
fn monthly_transactions_skip_unparseable_dates() {
    let dir = TempDir::new().unwrap();
    let transactions = format!("{TRANSACTIONS_CSV}102,someday,1,10,$5.00,5411\n");
    let store = store_with(dir.path(), USERS_CSV, CARDS_CSV, &transactions);
    let df = run(&store, "monthly_transactions");
    assert_eq!(df.height(), 1);
    assert_eq!(i64s(&df, "txn_count"), vec![Some(2)]);
}

#[test]
fn top_mcc_is_limited_and_ties_break_on_amount() {
    let dir = TempDir::new().unwrap();
    let mut transactions = String::from("id,date,client_id,card_id,amount,mcc\n");
    let mut id = 1;
    let mut push = |amount: &str, mcc: i64| {
        transactions.push_str(&format!("{id},2019-02-01,1,10,{amount},{mcc}\n"));
        id += 1;
    };
    // Two MCCs with three transactions each, the second with more money
    for _ in 0..3 {
        push("$1.00", 1000);
        push("$50.00", 2000);
    }
    for mcc in 3000..3012 {
        push("$5.00", mcc);
    }

    let store = store_with(dir.path(), USERS_CSV, CARDS_CSV, &transactions);
    let df = run(&store, "top_mcc_by_txn_count");

    assert_eq!(df.height(), 10);
    let mccs = i64s(&df, "mcc");
    assert_eq!(&mccs[..2], &[Some(2000), Some(1000)]);
    let counts = i64s(&df, "txn_count");
    assert!(counts.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn dark_web_pct_extremes() {
    let dir = TempDir::new().unwrap();
    let none = run(&default_store(dir.path()), "dark_web_card_pct");
    assert_eq!(f64s(&none, "dark_web_pct"), vec![Some(0.0)]);

    let all = CARDS_CSV.replace(",No", ",Yes");
    let store = store_with(dir.path(), USERS_CSV, &all, TRANSACTIONS_CSV);
    let all = run(&store, "dark_web_card_pct");
    assert_eq!(f64s(&all, "dark_web_pct"), vec![Some(100.0)]);
}

#[test]
fn dark_web_pct_is_a_percentage() {
    let dir = TempDir::new().unwrap();
    let cards = CARDS_CSV.replacen(",No", ",Yes", 1);
    let store = store_with(dir.path(), USERS_CSV, &cards, TRANSACTIONS_CSV);
    let pct = f64s(&run(&store, "dark_web_card_pct"), "dark_web_pct")[0].unwrap();
    assert!((0.0..=100.0).contains(&pct));
    assert!((pct - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn card_counts_order_by_count_then_brand() {
    let dir = TempDir::new().unwrap();
    let df = run(&default_store(dir.path()), "card_counts_by_brand_type");
    assert_eq!(
        strs(&df, "card_brand"),
        vec![Some("Visa".to_string()), Some("Mastercard".to_string())]
    );
    assert_eq!(i64s(&df, "num_cards"), vec![Some(2), Some(1)]);
}

#[test]
fn amount_by_credit_score_group_joins_users() {
    let dir = TempDir::new().unwrap();
    let df = run(&default_store(dir.path()), "amount_by_credit_score_group");
    assert_eq!(i64s(&df, "credit_score_group"), vec![Some(700), Some(800)]);
    assert_eq!(f64s(&df, "avg_amount"), vec![Some(10.0), Some(20.0)]);
}

#[test]
fn every_query_runs_in_catalog_order() {
    let dir = TempDir::new().unwrap();
    let store = default_store(dir.path());
    let results = QueryRunner::run_all(&store).unwrap();
    let names: Vec<&str> = results.iter().map(|r| r.name()).collect();
    let expected: Vec<&str> = QUERIES.iter().map(|q| q.name).collect();
    assert_eq!(names, expected);

    let avg = results.iter().find(|r| r.name() == "avg_cards_per_user").unwrap();
    assert_eq!(f64s(&avg.df, "avg_num_credit_cards"), vec![Some(4.0)]);
}

#[test]
fn credit_limit_by_brand_type_orders_by_average_desc() {
    let dir = TempDir::new().unwrap();
    let df = run(&default_store(dir.path()), "credit_limit_by_brand_type");
    assert_eq!(
        strs(&df, "card_brand"),
        vec![Some("Visa".to_string()), Some("Mastercard".to_string())]
    );
    assert_eq!(
        strs(&df, "card_type"),
        vec![Some("Debit".to_string()), Some("Credit".to_string())]
    );
    assert_eq!(f64s(&df, "avg_credit_limit"), vec![Some(16697.5), Some(500.0)]);
    assert_eq!(i64s(&df, "num_cards"), vec![Some(2), Some(1)]);
}

#[test]
fn credit_limit_ties_break_on_brand_then_type() {
    let dir = TempDir::new().unwrap();
    let cards = "\
id,client_id,card_brand,card_type,credit_limit,card_on_dark_web
1,1,Visa,Debit,$700,No
2,1,Amex,Credit,$700,No
3,2,Amex,Debit,$700,No
4,2,Discover,Credit,$900,No
";
    let store = store_with(dir.path(), USERS_CSV, cards, TRANSACTIONS_CSV);
    let df = run(&store, "credit_limit_by_brand_type");
    let labels: Vec<String> = strs(&df, "card_brand")
        .into_iter()
        .zip(strs(&df, "card_type"))
        .map(|(b, t)| format!("{}/{}", b.unwrap(), t.unwrap()))
        .collect();
    assert_eq!(labels, vec!["Discover/Credit", "Amex/Credit", "Amex/Debit", "Visa/Debit"]);
}

#[test]
fn debt_by_num_cards_ascending() {
    let dir = TempDir::new().unwrap();
    let df = run(&default_store(dir.path()), "debt_by_num_cards");
    assert_eq!(i64s(&df, "num_credit_cards"), vec![Some(3), Some(5)]);
    assert_eq!(f64s(&df, "avg_total_debt"), vec![Some(127613.0), Some(0.0)]);
    assert_eq!(i64s(&df, "num_users"), vec![Some(1), Some(1)]);
}
