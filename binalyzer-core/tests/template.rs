use std::cell::RefCell;
use std::rc::Rc;

use binalyzer_core::{AddressingMode, Binalyzer, ByteStream, Property, Sizing, Template};

#[test]
fn dotted_path_walks_from_the_root() {
    let root = Template::new();
    root.set_name("root");
    root.set_sizing(Sizing::Auto);

    let layout0 = Template::new();
    layout0.set_name("layout0");
    layout0.set_sizing(Sizing::Auto);

    let area0 = Template::new();
    area0.set_name("area0");
    area0.set_sizing(Sizing::Fix);
    area0.set_size_property(Property::Literal(4));

    layout0.add_child(&area0);
    root.add_child(&layout0);

    assert_eq!(root.path("layout0.area0").unwrap(), area0);
    assert_eq!(root.find_by_name("area0").unwrap(), area0);
}

#[test]
fn absolute_addressing_ignores_parent_and_boundary() {
    let root = Template::new();
    root.set_sizing(Sizing::Auto);
    root.set_boundary_property(Property::Literal(0x100));

    let fixed = Template::new();
    fixed.set_addressing_mode(AddressingMode::Absolute);
    fixed.set_offset_property(Property::Literal(0x20));
    fixed.set_sizing(Sizing::Fix);
    fixed.set_size_property(Property::Literal(4));

    root.add_child(&fixed);

    let _binalyzer = Binalyzer::new(
        root,
        Rc::new(RefCell::new(ByteStream::backed(vec![0; 64]))),
    );

    assert_eq!(fixed.absolute_address().unwrap(), 0x20);
}

#[test]
fn set_value_pads_short_writes_with_zero() {
    let node = Template::new();
    node.set_sizing(Sizing::Fix);
    node.set_size_property(Property::Literal(4));

    let _binalyzer = Binalyzer::new(
        node.clone(),
        Rc::new(RefCell::new(ByteStream::backed(vec![0xff; 4]))),
    );

    node.set_value(&[1, 2]).unwrap();
    assert_eq!(node.value().unwrap(), vec![1, 2, 0, 0]);
}
