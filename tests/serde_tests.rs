//! Tests for the optional serde support on values and metadata.

#![cfg(feature = "serde")]

use flexbit::schema::{
    FlexClassInfo, FlexDetail, FlexMemberInfo, MemberKind, ObjectDetail, ScalarDetail, ScalarKind,
};
use flexbit::FlexValue;
use pretty_assertions::assert_eq;

#[test]
fn test_value_to_json_and_back() {
    let value = FlexValue::object(
        "Player",
        vec![
            ("name", FlexValue::from("ada")),
            ("level", FlexValue::Int(-3)),
            ("speed", FlexValue::Float(1.5)),
            (
                "tags",
                FlexValue::Map(vec![(FlexValue::from("hp"), FlexValue::UInt(20))]),
            ),
            ("friend", FlexValue::Null),
        ],
    );

    let json = serde_json::to_string(&value).unwrap();
    let back: FlexValue = serde_json::from_str(&json).unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_class_info_to_json() {
    let mut info = FlexClassInfo::new("Canvas");
    info.type_id = Some(4);
    info.members = vec![
        FlexMemberInfo::new(
            "width",
            MemberKind::Simple(FlexDetail::Scalar(ScalarDetail::explicit(ScalarKind::UInt, 12))),
        )
        .with_id(1),
        FlexMemberInfo::new(
            "shapes",
            MemberKind::Array {
                element: FlexDetail::Object(ObjectDetail::new(["Circle", "Square"])),
                is_list: true,
            },
        )
        .with_id(2),
    ];

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["type_name"], "Canvas");
    assert_eq!(json["members"][1]["name"], "shapes");

    let back: FlexClassInfo = serde_json::from_value(json).unwrap();
    assert_eq!(back, info);
}
