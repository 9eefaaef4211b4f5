use binalyzer_xml::parse_with_data;

#[test]
fn stretch_sizing_fills_remaining_stream() {
    let binalyzer = parse_with_data(
        r#"<template boundary="0x100">
            <header sizing="fix" size="4"></header>
            <payload sizing="stretch"></payload>
        </template>"#,
        vec![0u8; 256],
    )
    .unwrap();

    let root = binalyzer.template();
    let header = root.path("header").unwrap();
    let payload = root.path("payload").unwrap();
    assert_eq!(header.size().unwrap(), 4);
    assert_eq!(payload.size().unwrap(), 252);
    assert_eq!(root.size().unwrap(), 256);
}

#[test]
fn leb128_converter_decodes_referenced_field() {
    let binalyzer = parse_with_data(
        r#"<template>
            <field name="field1_size" size="3"></field>
            <field name="field1" size="{field1_size, converter=leb128u}"></field>
        </template>"#,
        vec![0xE5, 0x8E, 0x26],
    )
    .unwrap();

    let field1 = binalyzer.template().path("field1").unwrap();
    assert_eq!(field1.size().unwrap(), 624485);
}
