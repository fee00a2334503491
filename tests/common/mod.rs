//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use card_insights::data::{CleanTable, DataCleaner, DataLoader, TableSchema, CARDS, TRANSACTIONS, USERS};
use card_insights::store::Store;
use std::fs;
use std::path::{Path, PathBuf};

pub const USERS_CSV: &str = "\
id,current_age,retirement_age,gender,per_capita_income,yearly_income,total_debt,credit_score,num_credit_cards
1,34,67,Female,\"$45,000\",\"$59,696\",\"$127,613\",710,3
2,41,65,Male,\"$52,500\",\"$77,254\",$0,810,5
";

pub const CARDS_CSV: &str = "\
id,client_id,card_brand,card_type,credit_limit,card_on_dark_web
10,1,Visa,Debit,\"$24,295\",No
11,1,Mastercard,Credit,$500,No
12,2,Visa,Debit,\"$9,100\",No
";

pub const TRANSACTIONS_CSV: &str = "\
id,date,client_id,card_id,amount,mcc
100,2019-01-05,1,10,$10.00,5411
101,2019-01-20,2,12,$20.00,5812
";

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// The three default source files in `dir`.
pub fn write_sources(dir: &Path) {
    write_file(dir, "users_data.csv", USERS_CSV);
    write_file(dir, "cards_data.csv", CARDS_CSV);
    write_file(dir, "transactions_data.csv", TRANSACTIONS_CSV);
}

pub fn clean_csv(schema: &'static TableSchema, dir: &Path, content: &str) -> CleanTable {
    let path = write_file(dir, schema.source_file, content);
    let raw = DataLoader::load_table(schema, &path).unwrap();
    DataCleaner::clean_table(&raw).unwrap()
}

/// In-memory store holding the given sources.
pub fn store_with(dir: &Path, users: &str, cards: &str, transactions: &str) -> Store {
    let mut store = Store::open_in_memory().unwrap();
    for (schema, content) in [(&USERS, users), (&CARDS, cards), (&TRANSACTIONS, transactions)] {
        let table = clean_csv(schema, dir, content);
        store.replace_table(schema.name, &table.df).unwrap();
    }
    store
}

pub fn default_store(dir: &Path) -> Store {
    store_with(dir, USERS_CSV, CARDS_CSV, TRANSACTIONS_CSV)
}
