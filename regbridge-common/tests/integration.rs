//! Integration tests for regbridge-common library.

use regbridge_common::{MeasurementBatch, RegisterDescriptor, decode, parse_config};

#[test]
fn test_decode_into_batch_line() {
    let registers = [
        RegisterDescriptor::new(25207, "Vac").with_scale(0.1),
        RegisterDescriptor::new(25208, "Iac").with_scale(0.1),
    ];
    let raw = [2315u16, 42u16];

    let mut batch = MeasurementBatch::at(1700000000);
    for (reg, value) in registers.iter().zip(raw) {
        batch.insert(reg.name.clone(), decode(value, reg));
    }

    assert_eq!(batch.get("Vac"), Some(231.5));
    assert_eq!(batch.get("Iac"), Some(4.2));

    let line = batch.to_line();
    assert!(line.starts_with("1700000000|"));
    assert!(line.contains("|Vac:231.5"));
    assert!(line.contains("|Iac:4.2"));
    assert!(!line.contains('\n'));
}

#[test]
fn test_register_list_from_json5() {
    let json = r#"[
        { address: 25207, name: "Vac", scale: 0.1 },
        { address: 25233, name: "Ibat", scale: 0.1, signed: true },
        { address: 25213, name: "Pac" },
    ]"#;

    let registers: Vec<RegisterDescriptor> = parse_config(json).unwrap();
    assert_eq!(registers.len(), 3);
    assert_eq!(registers[1].name, "Ibat");
    assert_eq!(decode(0xFF9C, &registers[1]), -10.0);
    assert_eq!(decode(1500, &registers[2]), 1500.0);
}

#[test]
fn test_line_field_order_is_by_name() {
    let batch = MeasurementBatch::at(1)
        .with_value("b", 2.0)
        .with_value("c", 3.0)
        .with_value("a", 1.0);

    let line = batch.to_line();
    let fields: Vec<&str> = line.split('|').skip(1).collect();
    assert_eq!(fields, vec!["a:1", "b:2", "c:3"]);
}
