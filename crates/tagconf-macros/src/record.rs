//! `#[derive(Record)]` expansion.

use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields};

use crate::parse::{FieldAttrs, RecordAttrs};

/// Expands `#[derive(Record)]` for a struct with named fields.
///
/// Generates:
/// 1. `Record`, with a static descriptor table and a `field_mut` accessor
/// 2. `Field`, so the record can be nested in other records
/// 3. `Element`, so `Vec<Self>` fields are filled element by element
pub fn expand_record(input: &DeriveInput) -> syn::Result<TokenStream> {
    let RecordAttrs { krate } = RecordAttrs::from_attrs(&input.attrs)?;
    let ident = &input.ident;
    let record_name = ident.unraw().to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &data.fields,
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span,
                "Record cannot be derived for enums",
            ))
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span,
                "Record cannot be derived for unions",
            ))
        }
    };

    let mut descriptors = Vec::new();
    let mut accessors = Vec::new();

    for field in fields {
        let Some(attrs) = FieldAttrs::from_attrs(&field.attrs)? else {
            continue;
        };
        let Some(field_ident) = &field.ident else {
            continue;
        };

        let ty = &field.ty;
        let name = field_ident.unraw().to_string();
        let type_name = ty.to_token_stream().to_string().replace(' ', "");

        let keys = attrs.keys.iter().map(|(tag, value)| quote!((#tag, #value)));
        let mut descriptor = quote! {
            #krate::FieldDescriptor::new::<#ty>(#name, #type_name).with_keys(&[#(#keys),*])
        };
        if let Some(validate) = &attrs.validate {
            descriptor = quote!(#descriptor.with_validate(#validate));
        }
        if let Some(default) = &attrs.default {
            descriptor = quote!(#descriptor.with_default(#default));
        }

        let index = descriptors.len();
        accessors.push(quote! {
            #index => ::core::option::Option::Some(
                <#ty as #krate::Field>::as_field_mut(&mut self.#field_ident)
            )
        });
        descriptors.push(descriptor);
    }

    Ok(quote! {
        #[automatically_derived]
        impl #krate::Record for #ident {
            const NAME: &'static str = #record_name;

            fn descriptors() -> &'static [#krate::FieldDescriptor] {
                static FIELDS: &[#krate::FieldDescriptor] = &[#(#descriptors),*];
                FIELDS
            }

            fn field_mut<L: #krate::LazyValue>(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<#krate::FieldMut<'_, L>> {
                match index {
                    #(#accessors,)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        #[automatically_derived]
        impl #krate::Field for #ident {
            const SHAPE: #krate::FieldShape = #krate::FieldShape::Record;
            const KIND: #krate::ValueKind = #krate::ValueKind::Record;

            fn as_field_mut<L: #krate::LazyValue>(&mut self) -> #krate::FieldMut<'_, L> {
                #krate::FieldMut::Record(self)
            }
        }

        #[automatically_derived]
        impl #krate::Element for #ident {
            const SEQ_SHAPE: #krate::FieldShape = #krate::FieldShape::RecordSeq;

            fn vec_field_mut<L: #krate::LazyValue>(
                vec: &mut ::std::vec::Vec<Self>,
            ) -> #krate::FieldMut<'_, L> {
                #krate::FieldMut::RecordSeq(vec)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(input: DeriveInput) -> String {
        expand_record(&input).unwrap().to_string()
    }

    #[test]
    fn test_expand_descriptors() {
        let out = expand(parse_quote! {
            #[config(crate = "my_crate")]
            struct Server {
                #[config(yaml = "port", validate = "required,>0", default = "8080")]
                port: u16,
                #[config(key = "peers")]
                peers: Vec<String>,
                cache: u8,
            }
        });

        assert!(out.contains("impl my_crate :: Record for Server"));
        assert!(out.contains("\"Server\""));
        assert!(out.contains("FieldDescriptor :: new :: < u16 > (\"port\" , \"u16\")"));
        assert!(out.contains("(\"yaml\" , \"port\")"));
        assert!(out.contains("with_validate (\"required,>0\")"));
        assert!(out.contains("with_default (\"8080\")"));
        assert!(out.contains("\"Vec<String>\""));
        assert!(out.contains("1usize =>"));
        assert!(!out.contains("\"cache\""));
        assert!(!out.contains("2usize"));
    }

    #[test]
    fn test_expand_nesting_impls() {
        let out = expand(parse_quote! {
            struct Address {
                #[config(yaml = "street")]
                street: String,
            }
        });

        assert!(out.contains("impl :: tagconf :: Field for Address"));
        assert!(out.contains("FieldShape :: Record"));
        assert!(out.contains("impl :: tagconf :: Element for Address"));
        assert!(out.contains("FieldMut :: RecordSeq (vec)"));
    }

    #[test]
    fn test_raw_identifiers_are_unraw() {
        let out = expand(parse_quote! {
            struct Rule {
                #[config(yaml = "type")]
                r#type: String,
            }
        });

        assert!(out.contains("(\"type\" , \"String\")"));
        assert!(out.contains("self . r#type"));
    }

    #[test]
    fn test_rejects_unsupported_inputs() {
        let inputs: Vec<DeriveInput> = vec![
            parse_quote!(struct Tuple(u8);),
            parse_quote!(struct Unit;),
            parse_quote!(enum Mode { A, B }),
            parse_quote!(union Bits { a: u8, b: i8 }),
            parse_quote!(struct Generic<T> { #[config(yaml = "v")] v: T }),
        ];

        for input in inputs {
            assert!(expand_record(&input).is_err());
        }
    }

    #[test]
    fn test_rejects_bad_field_attribute() {
        let input: DeriveInput = parse_quote! {
            struct Bad {
                #[config(yaml = 1)]
                value: u8,
            }
        };
        assert!(expand_record(&input).is_err());
    }
}
