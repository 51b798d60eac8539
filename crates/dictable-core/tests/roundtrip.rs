use chrono::{TimeZone, Utc};
use dictable_core::{Field, Init, Registry, Schema, Value};
use indexmap::IndexMap;
use proptest::prelude::*;

fn registry() -> Registry {
    let mut builder = Registry::builder();
    builder
        .register(
            Schema::builder("Reading")
                .field("label", Field::str().required())
                .field("value", Field::float())
                .build()
                .unwrap(),
        )
        .unwrap();
    builder
        .register(
            Schema::builder("Sensor")
                .field("name", Field::str().required().key("sensor_name"))
                .field("serial", Field::int_range(Some(0), None).required())
                .field("active", Field::bool())
                .field("installed", Field::datetime())
                .field("readings", Field::list(Field::object("Reading")))
                .field("counters", Field::dict_of(Field::str(), Field::int()))
                .field("note", Field::union(vec![Field::int(), Field::str()]))
                .build()
                .unwrap(),
        )
        .unwrap();
    builder.build().unwrap()
}

fn arb_note() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Int),
        "[a-z ]{0,12}".prop_map(Value::Str),
    ]
}

proptest! {
    #[test]
    fn entity_survives_mapping_round_trip(
        name in "[A-Za-z0-9_-]{1,16}",
        serial in 0i64..i64::MAX,
        active in proptest::option::of(any::<bool>()),
        installed in proptest::option::of(0i64..4_102_444_800_000),
        readings in proptest::collection::vec(("[a-z]{1,8}", -1.0e9f64..1.0e9), 0..4),
        counters in proptest::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..4),
        note in arb_note(),
    ) {
        let registry = registry();
        let readings = readings
            .into_iter()
            .map(|(label, value)| {
                registry
                    .construct("Reading", Init::new().with("label", label).with("value", value))
                    .map(Value::Object)
            })
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let counters: IndexMap<String, Value> = counters
            .into_iter()
            .map(|(key, count)| (key, Value::Int(count)))
            .collect();
        let installed = installed.map(|ms| Utc.timestamp_millis_opt(ms).single().unwrap());

        let sensor = registry
            .construct(
                "Sensor",
                Init::new()
                    .with("name", name)
                    .with("serial", serial)
                    .with("active", active)
                    .with("installed", installed)
                    .with("readings", readings)
                    .with("counters", counters)
                    .with("note", note),
            )
            .unwrap();

        let restored = registry.from_raw("Sensor", &sensor.to_external()).unwrap();
        prop_assert_eq!(&restored, &sensor);
        prop_assert_eq!(restored.to_external(), sensor.to_external());
    }
}
