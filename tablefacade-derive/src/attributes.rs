//! Attribute parsing utilities

use syn::{Attribute, ExprLit, Lit, LitStr};

/// `#[relational(value = "...", name = "...")]`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Relational {
    pub value: Option<String>,
    pub name: Option<String>,
}

impl Relational {
    /// Non-empty `value` wins over `name`.
    pub fn preferred(&self) -> Option<&str> {
        match (self.value.as_deref(), self.name.as_deref()) {
            (Some(value), _) if !value.is_empty() => Some(value),
            (_, Some(name)) => Some(name),
            (value, None) => value,
        }
    }
}

/// Table annotations of a struct.
#[derive(Debug, Default)]
pub struct TableAttributes {
    pub table_name: Option<String>,
    pub relational: Option<Relational>,
}

/// Column annotations of a field.
#[derive(Debug, Default)]
pub struct ColumnAttributes {
    pub column_name: Option<String>,
    pub relational: Option<Relational>,
}

impl ColumnAttributes {
    pub fn is_mapped(&self) -> bool {
        self.column_name.is_some() || self.relational.is_some()
    }
}

/// Value of a `#[name = "..."]` attribute.
fn name_value_str(attr: &Attribute) -> syn::Result<String> {
    let meta = attr.meta.require_name_value()?;
    match &meta.value {
        syn::Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

fn parse_relational(attr: &Attribute) -> syn::Result<Relational> {
    let mut relational = Relational::default();
    attr.parse_nested_meta(|meta| {
        let slot = if meta.path.is_ident("value") {
            &mut relational.value
        } else if meta.path.is_ident("name") {
            &mut relational.name
        } else {
            return Err(meta.error("expected `value` or `name`"));
        };
        let lit: LitStr = meta.value()?.parse()?;
        *slot = Some(lit.value());
        Ok(())
    })?;
    Ok(relational)
}

/// Extract table annotations from struct attributes
pub fn parse_table_attributes(attrs: &[Attribute]) -> syn::Result<TableAttributes> {
    let mut parsed = TableAttributes::default();
    for attr in attrs {
        if attr.path().is_ident("table_name") {
            parsed.table_name = Some(name_value_str(attr)?);
        } else if attr.path().is_ident("relational") {
            parsed.relational = Some(parse_relational(attr)?);
        }
    }
    Ok(parsed)
}

/// Extract column annotations from field attributes
pub fn parse_column_attributes(attrs: &[Attribute]) -> syn::Result<ColumnAttributes> {
    let mut parsed = ColumnAttributes::default();
    for attr in attrs {
        if attr.path().is_ident("column_name") {
            parsed.column_name = Some(name_value_str(attr)?);
        } else if attr.path().is_ident("relational") {
            parsed.relational = Some(parse_relational(attr)?);
        }
    }
    Ok(parsed)
}
