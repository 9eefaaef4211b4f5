use binalyzer_core::Property;
use binalyzer_xml::parse;

#[test]
fn text_between_tags_sets_size_by_default() {
    let template = parse(
        r#"<template>
            55 66 77 88
        </template>"#,
    )
    .unwrap();
    assert_eq!(template.text().unwrap(), vec![0x55, 0x66, 0x77, 0x88]);
    assert_eq!(template.size_property(), Property::Literal(4));
}

#[test]
fn explicit_size_overrides_text_length() {
    let template = parse(r#"<template size="2" text="0x55667788"></template>"#).unwrap();
    assert_eq!(template.text().unwrap(), vec![0x55, 0x66, 0x77, 0x88]);
    assert_eq!(template.size_property(), Property::Literal(2));
}
