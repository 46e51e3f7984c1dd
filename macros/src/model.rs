use crate::accessors;
use crate::field_parser::{self, FieldDefs, StructAttrs};
use crate::macro_utils;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ItemStruct;

pub fn new(item_struct: &ItemStruct) -> Result<TokenStream, syn::Error> {
    let named_fields = field_parser::get_named_fields(item_struct)?;
    let struct_attrs = field_parser::get_struct_attrs(item_struct)?;
    let field_defs = field_parser::get_field_macros(&named_fields, item_struct)?;

    let struct_ident = &item_struct.ident;
    let model_impl = attr_model_impl(item_struct, &struct_attrs, &field_defs);
    let accessor_impl = accessors::impls(struct_ident, &field_defs.attrs);
    let model_name = model_name(item_struct, &struct_attrs);

    Ok(quote! {
        #model_impl
        #accessor_impl
        ::kvattr::inventory::submit! {
            ::kvattr::ModelInfo {
                name: #model_name,
                binding_fn: <#struct_ident as ::kvattr::AttrModel>::attr_binding,
            }
        }
    })
}

fn model_name(item_struct: &ItemStruct, struct_attrs: &StructAttrs) -> String {
    struct_attrs.name.as_ref().map(|name| name.value()).unwrap_or_else(|| item_struct.ident.to_string())
}

fn attr_model_impl(item_struct: &ItemStruct, struct_attrs: &StructAttrs, field_defs: &FieldDefs) -> TokenStream {
    let struct_ident = &item_struct.ident;
    let model_name = model_name(item_struct, struct_attrs);
    let identity_ident = &field_defs.identity.name;
    let identity_name = macro_utils::unraw(identity_ident);

    let pool = struct_attrs.pool.as_ref().map(|pool| quote! { .pool(#pool) });
    let namespace = struct_attrs.namespace.as_ref().map(|ns| quote! { .namespace(#ns) });

    let declarations = field_defs.attrs.iter().map(|attr| {
        let name = macro_utils::unraw(&attr.field.name);
        let value_type = &attr.value_type;
        let default = match &attr.default {
            Some(expr) => quote! { ::core::option::Option::Some(::kvattr::Scalar::from(#expr)) },
            None => quote! { ::core::option::Option::None },
        };
        quote! { let builder = builder.declare::<#value_type>(#name, #default)?; }
    });

    let slot_arms = field_defs.attrs.iter().map(|attr| {
        let ident = &attr.field.name;
        let name = macro_utils::unraw(ident);
        quote! { #name => ::core::option::Option::Some(&self.#ident), }
    });
    let slot_mut_arms = field_defs.attrs.iter().map(|attr| {
        let ident = &attr.field.name;
        let name = macro_utils::unraw(ident);
        quote! { #name => ::core::option::Option::Some(&mut self.#ident), }
    });

    quote! {
        impl ::kvattr::AttrModel for #struct_ident {
            fn attr_binding() -> ::core::result::Result<&'static ::kvattr::ClassBinding, ::kvattr::AttrError> {
                static BINDING: ::kvattr::once_cell::sync::OnceCell<::kvattr::ClassBinding> = ::kvattr::once_cell::sync::OnceCell::new();
                BINDING.get_or_try_init(|| {
                    let builder = ::kvattr::ClassBinding::builder(#model_name)
                        .identity_field(#identity_name)
                        #pool
                        #namespace;
                    #(#declarations)*
                    ::core::result::Result::Ok(builder.build())
                })
            }

            fn attr_identity(&self) -> ::core::option::Option<::std::string::String> {
                ::kvattr::IdentityValue::identity_value(&self.#identity_ident)
            }

            fn attr_slot(&self, name: &str) -> ::core::option::Option<&dyn ::kvattr::AttrSlot> {
                match name {
                    #(#slot_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn attr_slot_mut(&mut self, name: &str) -> ::core::option::Option<&mut dyn ::kvattr::AttrSlot> {
                match name {
                    #(#slot_mut_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    }
}
