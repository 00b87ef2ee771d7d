#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use cf_engine as engine;
pub use cf_utils as utils;

pub use cf_engine::{
    Classify, ClassifyError, ClassifyHooks, Deferred, KeyValue, Shared, Typed, classify, declassify,
    declassify_with_parent, from_reader, to_writer,
};

/// The items most programs need.
pub mod prelude {
    #[cfg(feature = "json")]
    pub use cf_engine::format::JsonFormat;
    pub use cf_engine::format::FormatAdapter;
    pub use cf_engine::options::{ClassifyOptions, TypeOptions};
    pub use cf_engine::registry::TypeRegistry;
    pub use cf_engine::{Classify, ClassifyError, ClassifyHooks, Deferred, Shared, Typed};
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use core::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use crate::prelude::*;

    #[derive(Classify, Default)]
    #[classify(default)]
    struct Folder {
        name: String,
        children: Vec<Shared<Folder>>,
    }

    #[test]
    fn facade_round_trip() {
        let format = JsonFormat::new();
        let options = ClassifyOptions::default();

        let leaf = Rc::new(RefCell::new(Folder {
            name: String::from("leaf"),
            children: Vec::new(),
        }));
        let root = Folder {
            name: String::from("root"),
            children: Vec::from([Rc::clone(&leaf), leaf]),
        };

        let element = crate::classify(&root, &format, &options).unwrap();
        assert_eq!(
            element,
            json!({
                "name": "root",
                "children": [
                    { ":id": "1", "name": "leaf", "children": [] },
                    { ":ref": "1" },
                ],
            })
        );

        let back: Folder = crate::declassify(&element, &format, &options).unwrap();
        assert!(Rc::ptr_eq(&back.children[0], &back.children[1]));
    }
}
