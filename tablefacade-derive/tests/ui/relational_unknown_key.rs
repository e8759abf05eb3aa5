#![allow(dead_code)]
use tablefacade::TableEntity;

#[derive(TableEntity)]
#[relational(schema = "public")]
struct Scoped {
    #[column_name = "id"]
    id: i32,
}

fn main() {}
