//! Tests for the process-wide schema.
//!
//! The global schema can be installed once per process, so everything that
//! touches it lives in this one test.

use flexbit::error::FlexError;
use flexbit::registry;
use flexbit::schema::{MemoryMetaStore, SchemaBuilder, TypeScope};
use flexbit::FlexData;
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq, FlexData)]
struct Score {
    player: String,
    #[flex(varint)]
    points: i32,
}

#[test]
fn test_global_schema_lifecycle() {
    let score = Score {
        player: "ada".into(),
        points: 1200,
    };
    assert!(matches!(
        flexbit::serialize(&score).unwrap_err(),
        FlexError::NotInitialized
    ));

    let mut scope = TypeScope::new();
    scope.register::<Score>();
    let schema = SchemaBuilder::new(&scope)
        .build_strict(&mut MemoryMetaStore::new())
        .unwrap();
    let installed = registry::init(schema.clone()).unwrap();
    assert!(installed.class("Score").is_some());
    assert!(matches!(
        registry::init(schema).unwrap_err(),
        FlexError::AlreadyInitialized
    ));

    let bytes = flexbit::serialize(&score).unwrap();
    assert_eq!(flexbit::deserialize::<Score>(&bytes).unwrap(), score);

    let scores = vec![score.clone(), Score { player: "bob".into(), points: -3 }];
    let bytes = flexbit::serialize_list(&scores).unwrap();
    assert_eq!(flexbit::deserialize_list::<Score>(&bytes).unwrap(), scores);
}
