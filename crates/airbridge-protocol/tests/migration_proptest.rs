use airbridge_protocol::{AirbyteMessageMigrator, AirbyteMessageSerDe, VersionedMessage};
use airbridge_types::protocol::v1;
use airbridge_types::version::PROTOCOL_V0;
use proptest::prelude::*;
use serde_json::{json, Value};

fn payload() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9 ]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn record_round_trips_without_catalog(
        stream in "[a-z_]{1,10}",
        namespace in proptest::option::of("[a-z]{1,6}"),
        data in payload(),
        emitted_at in 0_i64..4_000_000_000_000,
    ) {
        let migrator = AirbyteMessageMigrator::standard().expect("standard chain");
        let original = v1::AirbyteMessage::record(v1::AirbyteRecordMessage::new(
            stream,
            namespace.as_deref(),
            data,
            emitted_at,
        ));
        let down = migrator.downgrade(original.clone(), &PROTOCOL_V0, None).expect("downgrade");
        prop_assert_eq!(down.protocol_major(), 0);

        let line = AirbyteMessageSerDe::serialize(&down).expect("serialize");
        let reread = AirbyteMessageSerDe::deserialize(&line, &PROTOCOL_V0).expect("deserialize");
        let up = migrator.upgrade_to_canonical(reread, &PROTOCOL_V0, None).expect("upgrade");
        prop_assert_eq!(up, original);
    }

    #[test]
    fn catalog_schemas_survive_upgrade(names in prop::collection::vec("[a-z]{1,8}", 0..5), schema in payload()) {
        let migrator = AirbyteMessageMigrator::standard().expect("standard chain");
        let streams: Vec<Value> = names
            .iter()
            .map(|name| json!({"name": name, "json_schema": schema, "supported_sync_modes": ["full_refresh"]}))
            .collect();
        let raw = json!({"type": "CATALOG", "catalog": {"streams": streams}});
        let v0_msg = AirbyteMessageSerDe::deserialize(&raw.to_string(), &PROTOCOL_V0).expect("v0 catalog");
        let up = migrator.upgrade(v0_msg, &PROTOCOL_V0, None).expect("upgrade");
        let VersionedMessage::V1(up) = up else {
            panic!("expected canonical message");
        };
        prop_assert_eq!(serde_json::to_value(&up).expect("to_value"), raw);
    }
}
