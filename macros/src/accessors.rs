use crate::field_parser::AttrDef;
use crate::macro_utils;
use proc_macro2::{Ident, TokenStream};
use quote::quote;

pub fn impls(struct_ident: &Ident, attrs: &[AttrDef]) -> TokenStream {
    let methods = attrs.iter().map(field_methods);
    quote! {
        impl #struct_ident {
            #(#methods)*
        }
    }
}

fn field_methods(attr: &AttrDef) -> TokenStream {
    let field = &attr.field.name;
    let name = macro_utils::unraw(field);
    let value_type = &attr.value_type;

    let setter = macro_utils::prefixed("set", field);
    let was = macro_utils::suffixed(field, "was");
    let change = macro_utils::suffixed(field, "change");
    let changed = macro_utils::suffixed(field, "changed");
    let restore = macro_utils::prefixed("restore", field);
    let will_change = macro_utils::suffixed(field, "will_change");

    quote! {
        pub fn #field(&mut self, sync: &::kvattr::SyncEngine) -> ::core::result::Result<#value_type, ::kvattr::AttrError> {
            let loader = sync.loader(&*self, #name)?;
            self.#field.get_or_load(|| loader.load())
        }

        pub fn #setter(&mut self, value: impl ::core::convert::Into<::kvattr::Scalar>, sync: &::kvattr::SyncEngine) -> ::core::result::Result<(), ::kvattr::AttrError> {
            let loader = sync.loader(&*self, #name)?;
            self.#field.set_with(value, || loader.load())
        }

        pub fn #was(&self) -> ::core::option::Option<#value_type> {
            self.#field.was()
        }

        pub fn #change(&self) -> ::core::option::Option<(#value_type, #value_type)> {
            self.#field.change()
        }

        pub fn #changed(&self) -> bool {
            self.#field.is_changed()
        }

        pub fn #restore(&mut self) {
            self.#field.restore()
        }

        pub fn #will_change(&mut self, sync: &::kvattr::SyncEngine) -> ::core::result::Result<(), ::kvattr::AttrError> {
            let loader = sync.loader(&*self, #name)?;
            self.#field.will_change_with(|| loader.load())
        }
    }
}
