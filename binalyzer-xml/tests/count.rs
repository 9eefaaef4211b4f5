use std::cell::RefCell;
use std::rc::Rc;

use binalyzer_core::{Binalyzer, DataStream, ByteStream};
use binalyzer_xml::parse;

#[test]
fn count_materializes_sibling_clones() {
    let template = parse(
        r#"<template>
            <field name="data" size="1" count="2"></field>
        </template>"#,
    )
    .unwrap();
    let stream: Rc<RefCell<dyn DataStream>> =
        Rc::new(RefCell::new(ByteStream::backed(vec![0x01, 0x02])));
    let binalyzer = Binalyzer::new(template, stream);

    let children = binalyzer.template().children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].value().unwrap(), vec![0x01]);
    assert_eq!(children[1].value().unwrap(), vec![0x02]);
}

/// A counted node's prototype subtree carries its own children (spec
/// §4.3 "Count attribute"); each clone must carry a structurally distinct
/// copy of them rather than sharing one, mirroring
/// `test_count.py::test_count_attribute_with_children`.
#[test]
fn count_materializes_clones_with_their_own_nested_children() {
    let template = parse(
        r#"<template>
            <field name="data" count="2">
                <field name="field" size="1"></field>
            </field>
        </template>"#,
    )
    .unwrap();
    let stream: Rc<RefCell<dyn DataStream>> =
        Rc::new(RefCell::new(ByteStream::backed(vec![0x01, 0x02])));
    let binalyzer = Binalyzer::new(template, stream);

    let children = binalyzer.template().children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].child("field").unwrap().value().unwrap(), vec![0x01]);
    assert_eq!(children[1].child("field").unwrap().value().unwrap(), vec![0x02]);
}
