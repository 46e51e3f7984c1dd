extern crate proc_macro;
mod accessors;
mod field_parser;
mod macro_utils;
mod model;

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;
use syn::{parse_macro_input, ItemStruct};

/// Binds `#[kv_attr]` fields of a struct to the key-value store.
///
/// ```ignore
/// #[derive(KvAttrs)]
/// #[kv_attrs(pool = "foo_pool")]
/// struct Post {
///     #[attr_id] id: Option<i64>,
///     #[kv_attr] title: Attr<String>,
///     #[kv_attr(default = 1)] version: Attr<i64>,
/// }
/// ```
#[proc_macro_derive(KvAttrs, attributes(kv_attrs, attr_id, kv_attr))]
#[proc_macro_error]
pub fn derive_kv_attrs(input: TokenStream) -> TokenStream {
    let item_struct = parse_macro_input!(input as ItemStruct);
    let struct_ident = &item_struct.ident;
    let stream = match model::new(&item_struct) {
        Ok(stream) => stream,
        Err(e) => return e.to_compile_error().into(),
    };
    macro_utils::submit_struct_to_stream(stream, "kv_attrs", struct_ident, "_derive.rs")
}
