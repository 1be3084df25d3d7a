use proptest::prelude::*;
use tessera::{prelude::*, schema::types::Primitive};

// one asset per primitive, each field defaulted to the same literal
fn registry(literal: &str) -> ModelManager {
    let mut decl = ClassDeclaration::asset("Sample")
        .identified_by("id")
        .property(Property::field("id", "String"));
    for primitive in Primitive::ALL {
        decl = decl.property(
            Property::field(primitive.to_string().to_lowercase(), primitive.to_string())
                .with_default(literal),
        );
    }

    ModelManager::builder()
        .add_model_file(ModelFileDef::new("test").declare(decl))
        .build()
        .unwrap()
}

fn defaults_for(literal: &str) -> Vec<(String, Option<Value>)> {
    let mm = registry(literal);
    let sample = Factory::new(&mm)
        .new_instance("test", "Sample", "S-1", InstanceOptions::unchecked())
        .unwrap();

    Primitive::ALL
        .iter()
        .map(|p| {
            let name = p.to_string().to_lowercase();
            let value = sample.get(&name).cloned();
            (name, value)
        })
        .collect()
}

#[test]
fn literals_are_typed_per_primitive() {
    let five = defaults_for("5");
    assert!(five.contains(&("integer".into(), Some(Value::Integer(5)))));
    assert!(five.contains(&("long".into(), Some(Value::Long(5)))));
    assert!(five.contains(&("double".into(), Some(Value::Double(5.0)))));
    assert!(five.contains(&("string".into(), Some(Value::from("5")))));
    assert!(five.contains(&("boolean".into(), None)));
    assert!(five.contains(&("datetime".into(), None)));

    let yes = defaults_for("true");
    assert!(yes.contains(&("boolean".into(), Some(Value::Boolean(true)))));
    assert!(yes.contains(&("integer".into(), None)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn integer_literals_round_trip(n in any::<i32>()) {
        prop_assert_eq!(
            Value::from_default(Primitive::Integer, &n.to_string()),
            Some(Value::Integer(n))
        );
        prop_assert_eq!(
            Value::from_default(Primitive::Long, &n.to_string()),
            Some(Value::Long(i64::from(n)))
        );
    }

    #[test]
    fn alphabetic_literals_never_become_numbers(s in "[a-zA-Z]{1,12}") {
        prop_assert_eq!(Value::from_default(Primitive::Integer, &s), None);
        prop_assert_eq!(Value::from_default(Primitive::Long, &s), None);
    }

    #[test]
    fn only_exact_booleans_parse(s in "[a-z]{1,6}") {
        let parsed = Value::from_default(Primitive::Boolean, &s);
        match s.as_str() {
            "true" => prop_assert_eq!(parsed, Some(Value::Boolean(true))),
            "false" => prop_assert_eq!(parsed, Some(Value::Boolean(false))),
            _ => prop_assert_eq!(parsed, None),
        }
    }
}
