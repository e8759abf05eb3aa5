#![allow(dead_code)]
use tablefacade::TableEntity;

#[derive(TableEntity)]
#[table_name = "numbers"]
struct Numbers {
    #[column_name = 42]
    id: i32,
}

fn main() {}
