//! Derive macro for entity contracts.
//!
//! This crate provides the `#[derive(Entity)]` macro, which maps a struct to
//! a table for the bulk update and delete builders of `oxide-bulk-core`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitStr, Meta};

/// Derives the `Entity` trait for a struct.
///
/// # Attributes
///
/// - `#[entity(table = "table_name")]` - Specifies the SQL table name
///   (optional, defaults to snake_case of struct name)
///
/// # Field Attributes
///
/// - `#[column(primary_key)]` - Marks the field as the key
/// - `#[column(name = "column_name")]` - Specifies the storage column
///   (optional, defaults to field name)
/// - `#[column(skip)]` - Leaves the field out of the contract
///
/// Every mapped field must be `Clone` and convert into a SQL value through
/// `ToSqlValue`.
///
/// # Generated Items
///
/// An implementation of `oxide_bulk_core::Entity` with `TABLE`, `FIELDS` in
/// declaration order, and `values()` returning the field values in the same
/// order.
#[proc_macro_derive(Entity, attributes(entity, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Entity derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Entity derive only supports structs",
            ));
        }
    };

    let mut mapped: Vec<MappedField> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let attrs = parse_column_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let member = field_name.unraw().to_string();
        mapped.push(MappedField {
            ident: field_name.clone(),
            column: attrs.name.unwrap_or_else(|| member.clone()),
            member,
            primary_key: attrs.primary_key,
        });
    }

    for (i, field) in mapped.iter().enumerate() {
        if mapped[..i].iter().any(|f| f.column == field.column) {
            return Err(syn::Error::new_spanned(
                &field.ident,
                format!("column `{}` is mapped twice", field.column),
            ));
        }
    }

    let field_defs = mapped.iter().map(|f| {
        let member = &f.member;
        let column = &f.column;
        let primary_key = f.primary_key;
        quote! {
            ::oxide_bulk_core::FieldDef {
                member: #member,
                column: #column,
                primary_key: #primary_key,
            }
        }
    });

    let values = mapped.iter().map(|f| {
        let ident = &f.ident;
        quote! {
            ::oxide_bulk_core::ToSqlValue::to_sql_value(
                ::core::clone::Clone::clone(&self.#ident)
            )
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::oxide_bulk_core::Entity for #struct_name #ty_generics #where_clause {
            const TABLE: &'static str = #table_name;

            const FIELDS: &'static [::oxide_bulk_core::FieldDef] = &[
                #(#field_defs),*
            ];

            fn values(&self) -> ::std::vec::Vec<::oxide_bulk_core::SqlValue> {
                ::std::vec![#(#values),*]
            }
        }
    })
}

struct MappedField {
    ident: Ident,
    member: String,
    column: String,
    primary_key: bool,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    primary_key: bool,
    skip: bool,
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("entity") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    let value: LitStr = meta.value()?.parse()?;
                    table_name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown entity attribute"))
                }
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    // Default to snake_case of struct name
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    result.primary_key = true;
                } else if meta.path.is_ident("skip") {
                    result.skip = true;
                } else if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else {
                    return Err(meta.error("unknown column attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
