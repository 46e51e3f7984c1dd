#![allow(warnings)]

use kvattr::*;

#[derive(KvAttrs, Default)]
pub struct Post {
    #[attr_id]
    pub id: Option<u64>,
    pub name: String,
    #[kv_attr]
    pub title: Attr<String>,
    #[kv_attr(default = "Untitled")]
    pub default_title: Attr<String>,
    #[kv_attr]
    pub version: Attr<i64>,
    #[kv_attr(default = 100)]
    pub default_version: Attr<i64>,
}

fn main() -> Result<(), AttrError> {
    let sync = SyncEngine::new(std::sync::Arc::new(PoolRegistry::new()));
    let mut post = Post::default();
    let title: String = post.title(&sync)?;
    post.set_version("4", &sync)?;
    let _: Option<i64> = post.version_was();
    let _: Option<(i64, i64)> = post.version_change();
    let _: bool = post.version_changed();
    post.restore_version();
    post.title_will_change(&sync)?;
    let binding = Post::attr_binding()?;
    assert_eq!(binding.names(), vec!["title", "default_title", "version", "default_version"]);
    Ok(())
}
