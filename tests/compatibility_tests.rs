//! Tests for reading data written by an earlier version of a type.
//!
//! Each module below is one program version. They register their types
//! under the same names and share a metadata store, the way two builds of
//! the same program would:
//! - Removed members: read and dropped
//! - Added members: missing from old data, filled from defaults
//! - Removed union variants: read and turned into null
//! - Changed member encodings: rejected when the schema is built

use flexbit::error::{DecodeError, EncodeError, FlexError, SchemaError};
use flexbit::schema::{MemoryMetaStore, SchemaBuilder, TypeScope};
use flexbit::{FlexData, FlexValue, Schema};
use pretty_assertions::assert_eq;

mod v1 {
    use flexbit::FlexData;

    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Player")]
    pub struct Player {
        pub name: String,
        #[flex(range(min = 0, max = 99))]
        pub level: i32,
        pub guild: String,
        pub inventory: Vec<Item>,
    }

    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Item")]
    pub struct Item {
        pub id: u32,
        pub count: u16,
    }

    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Circle")]
    pub struct Circle {
        #[flex(lossy)]
        pub radius: f32,
    }

    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Square")]
    pub struct Square {
        pub side: i32,
    }

    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Shape")]
    pub enum Shape {
        Circle(Circle),
        Square(Square),
    }

    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Canvas")]
    pub struct Canvas {
        pub shapes: Vec<Shape>,
    }
}

mod v2 {
    use flexbit::FlexData;

    /// `guild` is gone and `score` is new.
    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Player")]
    pub struct Player {
        #[flex(range(min = 0, max = 99))]
        pub level: i32,
        pub name: String,
        pub inventory: Vec<Item>,
        pub score: u16,
        #[flex(default)]
        pub title: Option<Box<Item>>,
    }

    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Item")]
    pub struct Item {
        pub id: u32,
        pub count: u16,
    }

    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Circle")]
    pub struct Circle {
        #[flex(lossy)]
        pub radius: f32,
    }

    /// Squares are no longer supported.
    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Shape")]
    pub enum Shape {
        Circle(Circle),
    }

    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Canvas")]
    pub struct Canvas {
        pub shapes: Vec<Option<Shape>>,
    }
}

mod v3 {
    use flexbit::FlexData;

    /// `level` changed its encoding.
    #[derive(Debug, Clone, PartialEq, FlexData)]
    #[flex(name = "Player")]
    pub struct Player {
        pub level: i64,
        pub name: String,
    }
}

fn build<T: FlexData>(store: &mut MemoryMetaStore) -> Schema {
    let mut scope = TypeScope::new();
    scope.register::<T>();
    SchemaBuilder::new(&scope).build_strict(store).unwrap()
}

fn old_player() -> v1::Player {
    v1::Player {
        name: "Bremm".into(),
        level: 42,
        guild: "Kworb Knights".into(),
        inventory: vec![
            v1::Item { id: 7, count: 3 },
            v1::Item { id: 1000, count: 0 },
        ],
    }
}

// =============================================================================
// Removed and added members
// =============================================================================

#[test]
fn test_new_version_reads_old_data() {
    let mut store = MemoryMetaStore::new();
    let old_schema = build::<v1::Player>(&mut store);
    let bytes = old_schema.serialize(&old_player()).unwrap();

    let new_schema = build::<v2::Player>(&mut store);
    let player: v2::Player = new_schema.deserialize(&bytes).unwrap();

    assert_eq!(
        player,
        v2::Player {
            level: 42,
            name: "Bremm".into(),
            inventory: vec![
                v2::Item { id: 7, count: 3 },
                v2::Item { id: 1000, count: 0 },
            ],
            score: 0,
            title: None,
        }
    );
}

#[test]
fn test_old_version_rejects_unknown_members() {
    let mut store = MemoryMetaStore::new();
    let old_schema = build::<v1::Player>(&mut store);
    let new_schema = build::<v2::Player>(&mut store);

    let player = v2::Player {
        level: 1,
        name: "Kworb".into(),
        inventory: Vec::new(),
        score: 500,
        title: None,
    };
    let bytes = new_schema.serialize(&player).unwrap();

    let err = old_schema.deserialize::<v1::Player>(&bytes).unwrap_err();
    assert!(matches!(
        err,
        FlexError::Decode(DecodeError::UnknownMember { ref type_name, .. }) if type_name == "Player"
    ));
}

#[test]
fn test_dead_member_is_not_written() {
    let mut store = MemoryMetaStore::new();
    build::<v1::Player>(&mut store);
    let schema = build::<v2::Player>(&mut store);

    let value = FlexValue::object(
        "Player",
        vec![
            ("name", FlexValue::from("Bloorb")),
            ("guild", FlexValue::from("ignored")),
        ],
    );
    let bytes = schema.encode_value("Player", &value).unwrap();
    let decoded = schema.decode_value("Player", &bytes).unwrap();
    assert_eq!(decoded.get("name"), Some(&FlexValue::from("Bloorb")));
    assert_eq!(decoded.get("guild"), None);
}

// =============================================================================
// Polymorphic members
// =============================================================================

#[test]
fn test_removed_variant_reads_as_null() {
    let mut store = MemoryMetaStore::new();
    let old_schema = build::<v1::Canvas>(&mut store);
    let canvas = v1::Canvas {
        shapes: vec![
            v1::Shape::Circle(v1::Circle { radius: 2.5 }),
            v1::Shape::Square(v1::Square { side: 4 }),
            v1::Shape::Circle(v1::Circle { radius: 0.5 }),
        ],
    };
    let bytes = old_schema.serialize(&canvas).unwrap();

    let new_schema = build::<v2::Canvas>(&mut store);
    // Square survives only as stale metadata.
    assert!(!new_schema.class("Square").unwrap().live);

    let decoded: v2::Canvas = new_schema.deserialize(&bytes).unwrap();
    assert_eq!(
        decoded.shapes,
        vec![
            Some(v2::Shape::Circle(v2::Circle { radius: 2.5 })),
            None,
            Some(v2::Shape::Circle(v2::Circle { radius: 0.5 })),
        ]
    );
}

#[test]
fn test_union_root_round_trip_across_versions() {
    let mut store = MemoryMetaStore::new();
    let old_schema = build::<v1::Shape>(&mut store);
    let bytes = old_schema
        .serialize(&v1::Shape::Circle(v1::Circle { radius: 8.0 }))
        .unwrap();

    let new_schema = build::<v2::Shape>(&mut store);
    let shape: v2::Shape = new_schema.deserialize(&bytes).unwrap();
    assert_eq!(shape, v2::Shape::Circle(v2::Circle { radius: 8.0 }));

    let square = old_schema
        .serialize(&v1::Shape::Square(v1::Square { side: 2 }))
        .unwrap();
    assert!(new_schema.deserialize::<v2::Shape>(&square).is_err());
}

#[test]
fn test_dynamic_list_of_mixed_variants() {
    let mut store = MemoryMetaStore::new();
    let old_schema = build::<v1::Shape>(&mut store);

    let values = vec![
        FlexValue::object("Circle", vec![("radius", FlexValue::Float(1.0))]),
        FlexValue::object("Square", vec![("side", FlexValue::Int(3))]),
        FlexValue::object("Circle", vec![("radius", FlexValue::Float(4.0))]),
    ];
    let bytes = old_schema.encode_list("Shape", &values).unwrap();
    let decoded = old_schema.decode_list("Shape", &bytes).unwrap();
    assert_eq!(decoded.len(), 3);
    assert_eq!(decoded[1].object_type(), Some("Square"));
    assert_eq!(decoded[1].get("side"), Some(&FlexValue::Int(3)));

    let err = old_schema.encode_list("Circle", &values).unwrap_err();
    assert!(matches!(err, EncodeError::NotAssignable { .. }));

    // Squares are gone from the union, so the whole batch is rejected.
    let new_schema = build::<v2::Shape>(&mut store);
    assert!(new_schema.decode_list("Shape", &bytes).is_err());
}

// =============================================================================
// Breaking changes
// =============================================================================

#[test]
fn test_changed_encoding_is_rejected() {
    let mut store = MemoryMetaStore::new();
    build::<v1::Player>(&mut store);

    let mut scope = TypeScope::new();
    scope.register::<v3::Player>();
    let err = SchemaBuilder::new(&scope).build_strict(&mut store).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::BreakingChange { ref member, .. } if member == "level"
    ));

    // The old metadata still decodes old data.
    let schema = build::<v1::Player>(&mut store);
    let bytes = schema.serialize(&old_player()).unwrap();
    assert_eq!(schema.deserialize::<v1::Player>(&bytes).unwrap(), old_player());
}
