#![allow(dead_code)]
use tablefacade::TableEntity;

#[derive(TableEntity)]
#[table_name = "status"]
enum Status {
    Active,
    Retired,
}

fn main() {}
