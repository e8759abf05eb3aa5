#![allow(dead_code)]
use tablefacade::TableEntity;

#[derive(TableEntity)]
#[table_name = "unit"]
struct Unit;

fn main() {}
