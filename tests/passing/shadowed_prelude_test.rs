#![allow(warnings)]

mod models {
    use kvattr::{Attr, KvAttrs};

    pub type Result<T> = ::std::result::Result<T, &'static str>;
    pub struct Option;
    pub struct String;
    pub struct Some;
    pub struct None;
    pub struct Ok;
    pub trait Into {}

    #[derive(KvAttrs, Default)]
    pub struct Post {
        #[attr_id]
        pub id: ::std::option::Option<u64>,
        #[kv_attr(default = "Untitled")]
        pub title: Attr<::std::string::String>,
        #[kv_attr]
        pub version: Attr<i64>,
    }
}

use kvattr::{AttrError, AttrModel, PoolRegistry, SyncEngine};
use models::Post;

fn main() -> Result<(), AttrError> {
    let sync = SyncEngine::new(std::sync::Arc::new(PoolRegistry::new()));
    let mut post = Post::default();
    assert_eq!(post.title(&sync)?, "Untitled");
    post.set_version(3, &sync)?;
    assert_eq!(post.version_change(), Some((0, 3)));
    assert!(post.version_changed());
    post.restore_version();
    assert_eq!(post.version_was(), Some(0));
    assert!(post.attr_slot("title").is_some());
    assert_eq!(Post::attr_binding()?.names(), vec!["title", "version"]);
    Ok(())
}
