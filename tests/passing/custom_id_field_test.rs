#![allow(warnings)]

use kvattr::*;

#[derive(KvAttrs, Default)]
struct CustomIdField {
    id: Option<u64>,
    #[attr_id]
    uuid: String,
    #[kv_attr]
    content: kvattr::Attr<String>,
}

fn main() {
    let binding = CustomIdField::attr_binding().unwrap();
    assert_eq!(binding.identity_field(), "uuid");
    assert_eq!(binding.namespace(), "custom_id_fields");
}
