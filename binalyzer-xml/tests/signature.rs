use binalyzer_xml::{parse, parse_with_data, Error};

#[test]
fn optional_node_dropped_on_signature_mismatch() {
    let binalyzer = parse_with_data(
        r#"<template>
            <header signature="0xDEADBEEF" hint="optional" size="4"></header>
            <tail sizing="fix" size="2"></tail>
        </template>"#,
        vec![0x00, 0x00, 0x00, 0x00, 0xAA, 0xBB],
    )
    .unwrap();

    let root = binalyzer.template();
    assert_eq!(root.children().len(), 1);
    let tail = root.path("tail").unwrap();
    assert_eq!(tail.offset().unwrap(), 0);
    assert_eq!(tail.value().unwrap(), vec![0x00, 0x00]);
}

#[test]
fn hint_without_signature_is_a_schema_error() {
    let err = parse(r#"<template hint="optional"></template>"#).unwrap_err();
    assert!(matches!(err, Error::HintWithoutSignature { .. }));
}
