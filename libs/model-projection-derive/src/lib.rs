use proc_macro::TokenStream;
use quote::{quote, ToTokens};
use syn::ext::IdentExt;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitStr, Type};

/// Derive macro for projectable records.
///
/// Generates `model_projection::Record` (a static field table plus typed
/// accessors) and the value-record impls of `AsRecord` / `NestedField`.
///
/// # Example
///
/// ```ignore
/// #[derive(Record)]
/// pub struct Order {
///     #[json(name = "id")]
///     pub id: u64,
///
///     #[json(name = "note")]
///     pub note: Option<String>,
///
///     #[json(name = "lines", nested)]
///     pub lines: Vec<Box<OrderLine>>,
/// }
/// ```
///
/// Field attributes:
/// - `name = "..."`: wire name. Falls back to `#[serde(rename = "...")]`.
///   Fields with neither stay in the table without a wire name.
/// - `nilable`: treat the field as optional even when its declared type
///   does not end in `Option` (e.g. `type MaybeNote = Option<String>`). The
///   type must still be an `Option`. Without it, only fields written as
///   `Option<_>` are cleared by `filter_fields`.
/// - `nested`: read through `NestedField` (records, pointers to records,
///   sequences of them) instead of `ToValue`.
#[proc_macro_derive(Record, attributes(json))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

struct FieldAttrs {
    wire_name: Option<String>,
    nested: bool,
    nilable: bool,
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;
    let name_str = name.to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Record only supports structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Record only supports structs")),
    };

    let mut table_tokens = Vec::new();
    let mut read_arms = Vec::new();
    let mut clear_arms = Vec::new();

    for field in fields {
        let field_ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
        let field_name_str = field_ident.unraw().to_string();
        let field_ty = &field.ty;

        let attrs = parse_field_attrs(&field.attrs)?;
        let nested = attrs.nested;
        let nilable = attrs.nilable || type_ident_name(field_ty).as_deref() == Some("Option");
        let type_str = type_display(field_ty);

        let wire_expr = match &attrs.wire_name {
            Some(wire) => quote! { ::core::option::Option::Some(#wire) },
            None => quote! { ::core::option::Option::None },
        };

        table_tokens.push(quote! {
            ::model_projection::FieldInfo {
                name: #field_name_str,
                wire_name: #wire_expr,
                type_name: #type_str,
                nilable: #nilable,
                nested: #nested,
            }
        });

        read_arms.push(if nested {
            quote! {
                #field_name_str => ::core::option::Option::Some(
                    ::model_projection::FieldRef::Nested(
                        ::model_projection::NestedField::nested(&self.#field_ident)
                    )
                )
            }
        } else {
            quote! {
                #field_name_str => ::core::option::Option::Some(
                    ::model_projection::FieldRef::Value(
                        ::model_projection::ToValue::to_value(&self.#field_ident)
                    )
                )
            }
        });

        if nilable {
            clear_arms.push(quote! {
                #field_name_str => self.#field_ident.take().is_some()
            });
        }
    }

    let expanded = quote! {
        impl ::model_projection::Record for #name {
            fn record_name(&self) -> &'static str {
                #name_str
            }

            fn field_table(&self) -> &'static [::model_projection::FieldInfo] {
                const FIELDS: &[::model_projection::FieldInfo] = &[
                    #(#table_tokens),*
                ];
                FIELDS
            }

            fn read_field(
                &self,
                __name: &str,
            ) -> ::core::option::Option<::model_projection::FieldRef<'_>> {
                match __name {
                    #(#read_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            fn clear_field(&mut self, __name: &str) -> bool {
                match __name {
                    #(#clear_arms,)*
                    _ => false,
                }
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }
        }

        impl ::model_projection::AsRecord for #name {
            fn as_record(&self) -> ::core::option::Option<&dyn ::model_projection::Record> {
                ::core::option::Option::Some(self)
            }
        }

        impl ::model_projection::NestedField for #name {
            fn nested(&self) -> ::model_projection::NestedRef<'_> {
                ::model_projection::NestedRef::Record(self)
            }
        }
    };

    Ok(TokenStream::from(expanded))
}

/// Parse `#[json(name = "...", nested, nilable)]`, falling back to
/// `#[serde(rename = "...")]` for the wire name.
fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttrs, syn::Error> {
    let mut wire_name: Option<String> = None;
    let mut serde_rename: Option<String> = None;
    let mut nested = false;
    let mut nilable = false;

    for attr in attrs {
        if attr.path().is_ident("json") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    wire_name = Some(value.value());
                } else if meta.path.is_ident("nested") {
                    nested = true;
                } else if meta.path.is_ident("nilable") {
                    nilable = true;
                } else {
                    return Err(meta.error(
                        "unknown json attribute (expected `name`, `nested` or `nilable`)",
                    ));
                }
                Ok(())
            })?;
        } else if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    serde_rename = Some(value.value());
                } else if meta.input.peek(syn::Token![=]) {
                    // Other serde options are not ours; consume and ignore them.
                    let _: syn::Expr = meta.value()?.parse()?;
                } else if meta.input.peek(syn::token::Paren) {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    let _: proc_macro2::TokenStream = content.parse()?;
                }
                Ok(())
            })?;
        }
    }

    Ok(FieldAttrs {
        wire_name: wire_name.or(serde_rename),
        nested,
        nilable,
    })
}

/// Extract the last path segment ident name from a type (e.g. `Option`, `Vec`).
fn type_ident_name(ty: &Type) -> Option<String> {
    if let Type::Path(type_path) = ty {
        type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string())
    } else {
        None
    }
}

/// Declared type as source-like text, e.g. `HashMap<String, String>`.
fn type_display(ty: &Type) -> String {
    let mut text = ty.to_token_stream().to_string();
    for (from, to) in [
        (" <", "<"),
        ("< ", "<"),
        (" >", ">"),
        (" ,", ","),
        (" ::", "::"),
        (":: ", "::"),
        ("& ", "&"),
        ("[ ", "["),
        (" ]", "]"),
        (" ;", ";"),
    ] {
        text = text.replace(from, to);
    }
    text
}
