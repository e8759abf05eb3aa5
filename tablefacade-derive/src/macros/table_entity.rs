//! Derive macro for `TableEntity`
//!
//! Emits a `table_descriptor()` listing the struct's table annotations, one
//! `FieldDescriptor` per annotated field, and a named reader/writer pair per field.
//! Accessors are plain non-capturing closures coerced to fn pointers.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

use crate::attributes::{parse_column_attributes, parse_table_attributes};
use crate::utils;

pub fn derive_table_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let type_name = struct_name.to_string();

    let fields = match &input.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        Data::Struct(syn::DataStruct {
            fields: Fields::Unit,
            ..
        }) => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "TableEntity needs named fields to map onto columns",
            ))
        }
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "TableEntity can only be derived for structs with named fields",
            ))
        }
    };

    let table = parse_table_attributes(&input.attrs)?;
    let table_name = table
        .table_name
        .as_ref()
        .map(|name| quote! { .table_name(#name) });
    let relational_table = table.relational.as_ref().map(|relational| {
        let value = relational.value.as_deref().unwrap_or("");
        let name = relational.name.as_deref().unwrap_or("");
        quote! { .relational_table(#value, #name) }
    });

    let mut entries: Vec<TokenStream2> = Vec::new();
    for field in fields {
        let columns = parse_column_attributes(&field.attrs)?;
        if !columns.is_mapped() {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_type = &field.ty;
        let field_name = utils::field_name(ident);
        let capitalized = utils::capitalize_first(&field_name);
        let setter = format!("set{capitalized}");
        let is_getter = format!("is{capitalized}");
        let get_getter = format!("get{capitalized}");

        let column_name = columns
            .column_name
            .as_ref()
            .map(|column| quote! { .column_name(#column) });
        let relational_column = columns
            .relational
            .as_ref()
            .and_then(|relational| relational.preferred().map(str::to_string))
            .map(|column| quote! { .relational_column(#column) });

        entries.push(quote! {
            .field(
                ::tablefacade::FieldDescriptor::of::<#field_type>(#field_name)
                    #column_name
                    #relational_column
            )
            .reader(
                if <#field_type as ::tablefacade::ValueType>::KIND == ::tablefacade::ValueKind::Bool {
                    #is_getter
                } else {
                    #get_getter
                },
                |entity: &Self| -> ::tablefacade::Value {
                    ::tablefacade::ValueType::into_value(::core::clone::Clone::clone(&entity.#ident))
                },
            )
            .writer(
                #setter,
                <#field_type as ::tablefacade::ValueType>::KIND,
                |entity: &mut Self, value: ::tablefacade::Value| -> ::core::result::Result<(), ::tablefacade::ValueError> {
                    entity.#ident = <#field_type as ::tablefacade::ValueType>::try_from_value(value)?;
                    ::core::result::Result::Ok(())
                },
            )
        });
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::tablefacade::TableEntity for #struct_name #ty_generics #where_clause {
            fn table_descriptor() -> ::tablefacade::TableDescriptor<Self> {
                ::tablefacade::TableDescriptor::new(#type_name)
                    #table_name
                    #relational_table
                    #(#entries)*
            }
        }
    })
}
