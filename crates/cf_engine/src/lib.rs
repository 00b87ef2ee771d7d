//! Format-agnostic object graph (de)serialization.
//!
//! Values describe themselves through [`Typed`], usually generated by
//! `#[derive(Classify)]`. A [`FormatAdapter`](format::FormatAdapter)
//! turns the engine's shapes into a concrete tree, such as the JSON
//! adapter behind the `json` feature.
//!
//! Shared handles ([`Shared`]) keep their identity: a handle reachable
//! twice is written once and referenced afterwards, so cycles round-trip.
//!
//! ```
//! use cf_engine::format::JsonFormat;
//! use cf_engine::options::ClassifyOptions;
//! use cf_engine::{Classify, classify, declassify};
//! use serde_json::json;
//!
//! #[derive(Classify, Default, Debug, PartialEq)]
//! #[classify(default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let format = JsonFormat::new();
//! let options = ClassifyOptions::default();
//!
//! let element = classify(&Point { x: 1, y: 2 }, &format, &options).unwrap();
//! assert_eq!(element, json!({ "x": 1, "y": 2 }));
//!
//! let point: Point = declassify(&element, &format, &options).unwrap();
//! assert_eq!(point, Point { x: 1, y: 2 });
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// The derive refers to `cf_engine`, in this crate too.
extern crate self as cf_engine;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod deferred;
mod error;
mod impls;
mod track;

pub mod de;
pub mod format;
pub mod info;
pub mod introspect;
pub mod options;
pub mod registry;
pub mod scalar;
pub mod ser;
pub mod store;
pub mod value;

#[doc(hidden)]
pub mod __macro_exports;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use cf_engine_derive::Classify;
pub use deferred::Deferred;
pub use error::ClassifyError;
pub use impls::{KeyValue, Shared};
pub use value::{Classify, ClassifyHooks, Typed};

// -----------------------------------------------------------------------------
// Entry points

use alloc::rc::Rc;
use core::any::Any;
use std::io::{Read, Write};

use crate::de::Declassifier;
use crate::format::FormatAdapter;
use crate::options::ClassifyOptions;
use crate::ser::Classifier;

/// Classify `value` into an element of `format`.
pub fn classify<T, F>(
    value: &T,
    format: &F,
    options: &ClassifyOptions<F::Element>,
) -> Result<F::Element, ClassifyError>
where
    T: Typed,
    F: FormatAdapter,
{
    Classifier::new(format, options).classify_dyn(value, T::type_info())
}

/// Rebuild a `T` from `element`.
pub fn declassify<T, F>(
    element: &F::Element,
    format: &F,
    options: &ClassifyOptions<F::Element>,
) -> Result<T, ClassifyError>
where
    T: Typed,
    F: FormatAdapter,
{
    let value = Declassifier::new(format, options).declassify_dyn(T::type_info(), element, None)?;
    T::from_boxed(value)
}

/// Rebuild a `T` whose parent fields point to `parent`.
///
/// For elements split off a larger graph, where the enclosing shared
/// object already exists.
pub fn declassify_with_parent<T, P, F>(
    element: &F::Element,
    parent: &Shared<P>,
    format: &F,
    options: &ClassifyOptions<F::Element>,
) -> Result<T, ClassifyError>
where
    T: Typed,
    P: Typed,
    F: FormatAdapter,
{
    let parent: Rc<dyn Any> = Rc::clone(parent) as Rc<dyn Any>;
    let value =
        Declassifier::new(format, options).declassify_dyn(T::type_info(), element, Some(&parent))?;
    T::from_boxed(value)
}

/// Classify `value` and write the element to `writer`.
pub fn to_writer<T, F>(
    writer: &mut dyn Write,
    value: &T,
    format: &F,
    options: &ClassifyOptions<F::Element>,
) -> Result<(), ClassifyError>
where
    T: Typed,
    F: FormatAdapter,
{
    let element = classify(value, format, options)?;
    format.write_element(&element, writer)
}

/// Read an element from `reader` and rebuild a `T` from it.
pub fn from_reader<T, F>(
    reader: &mut dyn Read,
    format: &F,
    options: &ClassifyOptions<F::Element>,
) -> Result<T, ClassifyError>
where
    T: Typed,
    F: FormatAdapter,
{
    let element = format.read_element(reader)?;
    declassify(&element, format, options)
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use alloc::boxed::Box;
    use alloc::collections::BTreeMap;
    use alloc::rc::{Rc, Weak};
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use serde_json::{Value, json};

    use crate::format::JsonFormat;
    use crate::options::{ClassifyOptions, TypeOptions};
    use crate::{Classify, ClassifyError, ClassifyHooks, Deferred, Shared};

    fn json_classify<T: crate::Typed>(value: &T) -> Result<Value, ClassifyError> {
        super::classify(value, &JsonFormat::new(), &ClassifyOptions::default())
    }

    fn json_declassify<T: crate::Typed>(element: &Value) -> Result<T, ClassifyError> {
        super::declassify(element, &JsonFormat::new(), &ClassifyOptions::default())
    }

    fn shared<T>(value: T) -> Shared<T> {
        Rc::new(RefCell::new(value))
    }

    // -------------------------------------------------------------------------
    // Identity

    #[derive(Classify, Default, Debug)]
    #[classify(default)]
    struct Node {
        value: i32,
        next: Option<Shared<Node>>,
    }

    #[test]
    fn plain_node() {
        let node = Node { value: 5, next: None };
        assert_eq!(json_classify(&node).unwrap(), json!({ "value": 5, "next": null }));
    }

    #[test]
    fn two_node_cycle() {
        let a = shared(Node { value: 1, next: None });
        let b = shared(Node {
            value: 2,
            next: Some(Rc::clone(&a)),
        });
        a.borrow_mut().next = Some(Rc::clone(&b));

        let element = json_classify(&a).unwrap();
        assert_eq!(
            element,
            json!({
                ":id": "1",
                "value": 1,
                "next": { "value": 2, "next": { ":ref": "1" } },
            })
        );

        let a2: Shared<Node> = json_declassify(&element).unwrap();
        let b2 = Rc::clone(a2.borrow().next.as_ref().unwrap());
        assert_eq!(b2.borrow().value, 2);
        assert!(Rc::ptr_eq(b2.borrow().next.as_ref().unwrap(), &a2));

        // Break the cycles.
        a.borrow_mut().next = None;
        a2.borrow_mut().next = None;
    }

    #[test]
    fn self_cycle() {
        let a = shared(Node { value: 1, next: None });
        a.borrow_mut().next = Some(Rc::clone(&a));

        let element = json_classify(&a).unwrap();
        assert_eq!(element, json!({ ":id": "1", "value": 1, "next": { ":ref": "1" } }));

        let a2: Shared<Node> = json_declassify(&element).unwrap();
        assert!(Rc::ptr_eq(a2.borrow().next.as_ref().unwrap(), &a2));

        a.borrow_mut().next = None;
        a2.borrow_mut().next = None;
    }

    #[test]
    fn shared_identity_round_trip() {
        let x = shared(Node { value: 1, next: None });
        let y = shared(Node { value: 2, next: None });
        let list = Vec::from([Rc::clone(&x), Rc::clone(&y), Rc::clone(&x)]);

        let element = json_classify(&list).unwrap();
        // Singly referenced values are inlined.
        assert_eq!(
            element,
            json!([
                { ":id": "1", "value": 1, "next": null },
                { "value": 2, "next": null },
                { ":ref": "1" },
            ])
        );

        let back: Vec<Shared<Node>> = json_declassify(&element).unwrap();
        assert_eq!(back.len(), 3);
        assert!(Rc::ptr_eq(&back[0], &back[2]));
        assert!(!Rc::ptr_eq(&back[0], &back[1]));
        assert_eq!(back[1].borrow().value, 2);
    }

    #[test]
    fn forward_reference() {
        let element = json!([{ ":ref": "a" }, { ":id": "a", "value": 3, "next": null }]);
        let back: Vec<Shared<Node>> = json_declassify(&element).unwrap();
        assert!(Rc::ptr_eq(&back[0], &back[1]));
        assert_eq!(back[0].borrow().value, 3);
    }

    #[test]
    fn unresolved_reference() {
        let element = json!({ "value": 1, "next": { ":ref": "9" } });
        let err = json_declassify::<Shared<Node>>(&element).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            ClassifyError::UnresolvedReference { id } if id == "9"
        ));
    }

    #[test]
    fn shared_tuple_round_trip() {
        let pair = shared((1_u8, 2_u8));
        let list = Vec::from([Rc::clone(&pair), pair]);

        let element = json_classify(&list).unwrap();
        let back: Vec<Shared<(u8, u8)>> = json_declassify(&element).unwrap();
        assert!(Rc::ptr_eq(&back[0], &back[1]));
        assert_eq!(*back[0].borrow(), (1, 2));

        let element = json_classify(&shared((3_u8, 4_u8))).unwrap();
        let single: Shared<(u8, u8)> = json_declassify(&element).unwrap();
        assert_eq!(*single.borrow(), (3, 4));
    }

    // -------------------------------------------------------------------------
    // Nulls

    #[derive(Classify, Default, Debug)]
    #[classify(default)]
    struct Envelope {
        kind: String,
        body: Value,
    }

    #[test]
    fn element_fields_are_read_verbatim() {
        let envelope = Envelope {
            kind: String::from("empty"),
            body: Value::Null,
        };
        let element = json_classify(&envelope).unwrap();
        assert_eq!(element, json!({ "kind": "empty", "body": null }));
        let back: Envelope = json_declassify(&element).unwrap();
        assert_eq!(back.body, Value::Null);

        let element = json!({ "kind": "link", "body": { ":ref": "x" } });
        let back: Envelope = json_declassify(&element).unwrap();
        assert_eq!(back.body, json!({ ":ref": "x" }));
    }

    #[test]
    fn shared_none() {
        let value: Shared<Option<u8>> = shared(None);
        let element = json_classify(&value).unwrap();
        assert_eq!(element, Value::Null);

        let back: Shared<Option<u8>> = json_declassify(&element).unwrap();
        assert_eq!(*back.borrow(), None);
    }

    #[derive(Classify, Default, Debug, PartialEq)]
    #[classify(default)]
    struct Limit {
        max: u64,
    }

    #[derive(Classify, Default, Debug)]
    #[classify(default)]
    struct Quota {
        name: String,
        limit: Limit,
    }

    #[test]
    fn substituted_by_option() {
        let options = ClassifyOptions::<Value>::builder()
            .type_options::<Limit>(TypeOptions::new().substitute(
                |limit: &Limit| (limit.max > 0).then_some(limit.max),
                |max: Option<u64>| Ok(Limit { max: max.unwrap_or(0) }),
            ))
            .build()
            .unwrap();
        let format = JsonFormat::new();

        let quota = Quota {
            name: String::from("disk"),
            limit: Limit { max: 0 },
        };
        let element = super::classify(&quota, &format, &options).unwrap();
        assert_eq!(element, json!({ "name": "disk", "limit": null }));
        let back: Quota = super::declassify(&element, &format, &options).unwrap();
        assert_eq!(back.limit, Limit { max: 0 });

        let back: Limit = super::declassify(&json!(7), &format, &options).unwrap();
        assert_eq!(back, Limit { max: 7 });
    }

    #[test]
    fn null_for_required_value() {
        let err = json_declassify::<(u8, u8)>(&Value::Null).unwrap_err();
        assert!(matches!(err.root_cause(), ClassifyError::Malformed(_)));
    }

    // -------------------------------------------------------------------------
    // Schema

    #[derive(Classify, Debug)]
    #[classify(default)]
    struct Settings {
        volume: u8,
        name: String,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                volume: 7,
                name: String::new(),
            }
        }
    }

    #[test]
    fn schema_evolution() {
        let element = json!({ "name": "main", "legacy": true });
        let settings: Settings = json_declassify(&element).unwrap();
        assert_eq!(settings.volume, 7);
        assert_eq!(settings.name, "main");
    }

    #[derive(Classify, Debug)]
    struct NoConstructor {
        value: u8,
    }

    #[test]
    fn uninstantiable() {
        let value = NoConstructor { value: 1 };
        assert_eq!(json_classify(&value).unwrap(), json!({ "value": 1 }));

        let err = json_declassify::<NoConstructor>(&json!({ "value": 1 })).unwrap_err();
        assert!(matches!(err, ClassifyError::Uninstantiable { .. }));
    }

    #[test]
    fn malformed_and_lossy() {
        let err = json_declassify::<Settings>(&json!({ "volume": 300 })).unwrap_err();
        assert!(matches!(err.root_cause(), ClassifyError::Conversion { .. }));

        let err = json_declassify::<Settings>(&json!({ "volume": null })).unwrap_err();
        assert!(matches!(err.root_cause(), ClassifyError::Malformed(_)));

        let err = json_declassify::<[u8; 2]>(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ClassifyError::Malformed(_)));
    }

    #[test]
    fn derived_field_setter() {
        let mut node = Node::default();
        let object = node.as_object_mut().unwrap();
        object.set_field("value", Box::new(7_i32)).unwrap();

        let err = object.set_field("missing", Box::new(1_u8)).unwrap_err();
        assert!(matches!(err, ClassifyError::Malformed(ref m) if m.contains("missing")));
        let err = object.set_field("value", Box::new(1_u8)).unwrap_err();
        assert!(matches!(err, ClassifyError::TypeMismatch { .. }));
        assert_eq!(node.value, 7);
    }

    #[derive(Classify, Default)]
    #[classify(default, ignore_if_empty)]
    struct Sparse {
        #[classify(ignore_if_default)]
        count: u32,
        #[classify(ignore_if_eq = 1.0)]
        scale: f64,
        tags: Vec<String>,
        note: Option<String>,
        #[classify(ignore)]
        cache: u64,
        #[classify(rename = "kind")]
        _kind: String,
    }

    #[test]
    fn ignore_policies() {
        let value = Sparse {
            count: 0,
            scale: 1.0,
            tags: Vec::new(),
            note: None,
            cache: 99,
            _kind: String::from("a"),
        };
        assert_eq!(json_classify(&value).unwrap(), json!({ "kind": "a" }));

        let value = Sparse {
            count: 2,
            scale: 0.5,
            tags: Vec::from([String::from("t")]),
            note: Some(String::new()),
            cache: 99,
            _kind: String::new(),
        };
        assert_eq!(
            json_classify(&value).unwrap(),
            json!({ "count": 2, "scale": 0.5, "tags": ["t"], "note": "" })
        );

        let back: Sparse = json_declassify(&json!({ "count": 2, "cache": 5 })).unwrap();
        assert_eq!(back.count, 2);
        assert_eq!(back.cache, 0);
    }

    #[derive(Classify, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
    #[classify(default)]
    enum Suit {
        #[default]
        Hearts,
        #[classify(rename = "pique")]
        Spades,
    }

    #[test]
    fn enum_keys() {
        let map = BTreeMap::from([(Suit::Hearts, 1_u8), (Suit::Spades, 2)]);
        let element = json_classify(&map).unwrap();
        assert_eq!(element, json!({ "Hearts": 1, "pique": 2 }));

        let back: BTreeMap<Suit, u8> = json_declassify(&element).unwrap();
        assert_eq!(back, map);

        let err = json_declassify::<Suit>(&json!("Clubs")).unwrap_err();
        assert!(matches!(err, ClassifyError::Conversion { .. }));
    }

    // -------------------------------------------------------------------------
    // Polymorphism

    #[derive(Classify, Default)]
    #[classify(default)]
    struct Disc {
        radius: f64,
    }

    #[derive(Classify, Default)]
    #[classify(default)]
    struct Tile {
        side: u32,
    }

    #[derive(Classify, Default, Debug)]
    #[classify(default)]
    struct Drawing {
        shapes: Vec<Box<dyn Classify>>,
    }

    #[test]
    fn polymorphic_fields() {
        let drawing = Drawing {
            shapes: Vec::from([
                Box::new(Disc { radius: 1.5 }) as Box<dyn Classify>,
                Box::new(Tile { side: 2 }),
            ]),
        };
        let element = json_classify(&drawing).unwrap();
        assert_eq!(
            element,
            json!({
                "shapes": [
                    { ":type": "Disc", "radius": 1.5 },
                    { ":type": "Tile", "side": 2 },
                ]
            })
        );

        let back: Drawing = json_declassify(&element).unwrap();
        assert_eq!((*back.shapes[0]).downcast_ref::<Disc>().map(|d| d.radius), Some(1.5));
        assert_eq!((*back.shapes[1]).downcast_ref::<Tile>().map(|t| t.side), Some(2));
    }

    #[test]
    fn unknown_type_tags() {
        // A concrete declared type ignores the tag.
        let disc: Disc = json_declassify(&json!({ ":type": "Nope", "radius": 2.0 })).unwrap();
        assert_eq!(disc.radius, 2.0);

        // A dynamic one has nothing to fall back to.
        let element = json!({ "shapes": [{ ":type": "Nope", "radius": 2.0 }] });
        let err = json_declassify::<Drawing>(&element).unwrap_err();
        assert!(matches!(err.root_cause(), ClassifyError::Uninstantiable { .. }));
    }

    #[test]
    fn scalars_in_dynamic_fields() {
        let value: Box<dyn Classify> = Box::new(7_u16);
        let element = json_classify(&value).unwrap();
        assert_eq!(element, json!({ ":type": "u16", ":value": 7 }));

        let back: Box<dyn Classify> = json_declassify(&element).unwrap();
        assert_eq!((*back).downcast_ref::<u16>(), Some(&7));
    }

    // -------------------------------------------------------------------------
    // Options

    #[derive(Classify, Default, Debug, PartialEq)]
    #[classify(default)]
    struct Timeout {
        millis: u64,
    }

    #[derive(Classify, Default)]
    #[classify(default)]
    struct Request {
        url: String,
        timeout: Timeout,
    }

    #[test]
    fn substitution_round_trip() {
        let options = ClassifyOptions::<Value>::builder()
            .type_options::<Timeout>(TypeOptions::new().substitute(
                |t: &Timeout| t.millis,
                |millis: u64| Ok(Timeout { millis }),
            ))
            .build()
            .unwrap();
        let format = JsonFormat::new();

        let request = Request {
            url: String::from("/"),
            timeout: Timeout { millis: 250 },
        };
        let element = super::classify(&request, &format, &options).unwrap();
        assert_eq!(element, json!({ "url": "/", "timeout": 250 }));

        let back: Request = super::declassify(&element, &format, &options).unwrap();
        assert_eq!(back.timeout, Timeout { millis: 250 });
    }

    #[derive(Classify, Default)]
    #[classify(default, hooks)]
    struct Counter {
        value: u32,
        #[classify(ignore)]
        loaded: bool,
        #[classify(ignore)]
        stamped: bool,
    }

    impl ClassifyHooks for Counter {
        fn after_declassify(&mut self) {
            self.loaded = true;
        }
    }

    #[test]
    fn hooks() {
        let options = ClassifyOptions::<Value>::builder()
            .type_options::<Counter>(
                TypeOptions::new()
                    .after_classify(|element: &mut Value| element["version"] = json!(2))
                    .after_declassify(|value, element: &Value| {
                        if let Some(counter) = value.downcast_mut::<Counter>() {
                            counter.stamped = element.get("version").is_some();
                        }
                    }),
            )
            .build()
            .unwrap();
        let format = JsonFormat::new();

        let element = super::classify(&Counter::default(), &format, &options).unwrap();
        assert_eq!(element, json!({ "value": 0, "version": 2 }));

        let back: Counter = super::declassify(&element, &format, &options).unwrap();
        assert!(back.loaded);
        assert!(back.stamped);
    }

    // -------------------------------------------------------------------------
    // Follow-id

    #[derive(Classify, Default, Debug)]
    #[classify(default)]
    struct Chapter {
        title: String,
    }

    #[derive(Classify, Default, Debug)]
    #[classify(default)]
    struct Book {
        name: String,
        #[classify(follow_id)]
        first: Deferred<Chapter>,
    }

    #[test]
    fn follow_id_units() {
        let dir = tempfile::tempdir().unwrap();
        let format = JsonFormat::new();
        let options = ClassifyOptions::<Value>::builder()
            .base_directory(dir.path(), format)
            .build()
            .unwrap();

        let book = Book {
            name: String::from("b"),
            first: Deferred::with_id("intro", Chapter {
                title: String::from("One"),
            }),
        };
        let element = super::classify(&book, &format, &options).unwrap();
        assert_eq!(element, json!({ "name": "b", "first": { ":follow": "intro" } }));
        assert!(dir.path().join("Chapter").join("intro.json").is_file());

        let back: Book = super::declassify(&element, &format, &options).unwrap();
        assert_eq!(back.first.id(), Some("intro"));
        assert!(!back.first.is_evaluated());
        assert_eq!(back.first.get().unwrap().title, "One");
        assert!(back.first.is_evaluated());
    }

    #[test]
    fn follow_id_needs_a_store() {
        let book = Book {
            name: String::new(),
            first: Deferred::with_id("intro", Chapter::default()),
        };
        let err = json_classify(&book).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            ClassifyError::MissingBaseDirectory { field } if field == "first"
        ));

        let element = json!({ "name": "b", "first": { ":follow": "intro" } });
        let err = json_declassify::<Book>(&element).unwrap_err();
        assert!(matches!(err.root_cause(), ClassifyError::MissingBaseDirectory { .. }));
    }

    // -------------------------------------------------------------------------
    // Parents

    #[derive(Classify, Default)]
    #[classify(default)]
    struct Tree {
        name: String,
        leaves: Vec<Shared<Leaf>>,
    }

    #[derive(Classify, Default)]
    #[classify(default)]
    struct Leaf {
        size: u8,
        #[classify(parent)]
        tree: Option<Weak<RefCell<Tree>>>,
    }

    #[test]
    fn parent_injection() {
        let element = json!({ "name": "oak", "leaves": [{ "size": 1 }, { "size": 2 }] });
        let tree: Shared<Tree> = json_declassify(&element).unwrap();

        let tree_ref = tree.borrow();
        assert_eq!(tree_ref.leaves.len(), 2);
        for leaf in &tree_ref.leaves {
            let parent = leaf.borrow().tree.as_ref().and_then(Weak::upgrade).unwrap();
            assert!(Rc::ptr_eq(&parent, &tree));
        }
        drop(tree_ref);

        // Parent fields are not written.
        assert_eq!(json_classify(&tree).unwrap(), element);
    }

    #[test]
    fn parent_of_a_detached_element() {
        let tree = shared(Tree::default());
        let leaf: Leaf = super::declassify_with_parent(
            &json!({ "size": 3 }),
            &tree,
            &JsonFormat::new(),
            &ClassifyOptions::default(),
        )
        .unwrap();
        assert_eq!(leaf.size, 3);
        assert!(Rc::ptr_eq(&leaf.tree.and_then(|t| t.upgrade()).unwrap(), &tree));
    }

    // -------------------------------------------------------------------------
    // Streams

    #[test]
    fn streams() {
        let format = JsonFormat::compact();
        let options = ClassifyOptions::default();

        let mut buffer = Vec::new();
        super::to_writer(&mut buffer, &Node { value: 4, next: None }, &format, &options).unwrap();
        assert_eq!(buffer, br#"{"value":4,"next":null}"#);

        let node: Node = super::from_reader(&mut buffer.as_slice(), &format, &options).unwrap();
        assert_eq!(node.value, 4);
        assert!(node.next.is_none());
    }
}
