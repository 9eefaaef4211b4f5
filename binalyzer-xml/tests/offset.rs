use std::cell::RefCell;
use std::rc::Rc;

use binalyzer_core::{Binalyzer, DataStream, ByteStream};
use binalyzer_xml::{parse, parse_with_data};

#[test]
fn four_fixed_fields_under_an_auto_root() {
    let template = parse(
        r#"<template>
            <field name="field0" size="32"></field>
            <field name="field1" size="32"></field>
            <field name="field2" size="32"></field>
            <field name="field3" size="32"></field>
        </template>"#,
    )
    .unwrap();

    let mut data = Vec::new();
    data.extend(std::iter::repeat(0u8).take(32));
    data.extend(std::iter::repeat(1u8).take(32));
    data.extend(std::iter::repeat(2u8).take(32));
    data.extend(std::iter::repeat(3u8).take(32));
    let stream: Rc<RefCell<dyn DataStream>> = Rc::new(RefCell::new(ByteStream::backed(data.clone())));
    let binalyzer = Binalyzer::new(template, stream);

    assert_eq!(binalyzer.template().size().unwrap(), 128);
    let children = binalyzer.template().children();
    assert_eq!(children[0].value().unwrap(), vec![0; 32]);
    assert_eq!(children[3].value().unwrap(), vec![3; 32]);
}

#[test]
fn cross_reference_with_byte_order() {
    let binalyzer = parse_with_data(
        r#"<template>
            <field name="field1_size" size="4"></field>
            <field name="field1" size="{field1_size, byteorder=little}"></field>
            <field name="field2" size="{field1_size, byteorder=big}"></field>
        </template>"#,
        vec![0x04, 0x00, 0x00, 0x00],
    )
    .unwrap();

    let root = binalyzer.template();
    let field1 = root.path("field1").unwrap();
    let field2 = root.path("field2").unwrap();
    assert_eq!(field1.size().unwrap(), 0x4);
    assert_eq!(field2.size().unwrap(), 0x4000000);
}
