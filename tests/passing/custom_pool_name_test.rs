#![allow(warnings)]

use kvattr::*;

#[derive(KvAttrs, Default)]
#[kv_attrs(pool = "foo_pool", name = "Note", namespace = "notes_v2")]
struct CustomPoolName {
    #[attr_id]
    id: u32,
    #[kv_attr]
    r#type: Attr<String>,
}

fn main() {
    let binding = CustomPoolName::attr_binding().unwrap();
    assert_eq!(binding.pool_name(), Some("foo_pool"));
    assert_eq!(binding.model(), "Note");
    assert_eq!(binding.key(Some("3"), "type").unwrap(), "notes_v2:3:type");
    let mut note = CustomPoolName::default();
    note.restore_type();
    assert!(!note.type_changed());
}
