use std::cell::RefCell;
use std::rc::Rc;

use binalyzer_core::{Binalyzer, ByteStream, Property, ProviderKind, Sizing, Target, Template};

/// Extension provider registry (spec §4.1 "Custom provider", §4.6):
/// a closure registered under a name is reachable from a node whose size
/// property is `Property::Provider { kind: ProviderKind::Custom(name), .. }`.
#[test]
fn custom_provider_resolves_from_the_registry() {
    let root = Template::new();
    root.set_sizing(Sizing::Fix);
    root.set_size_property(Property::Provider {
        target: Target::SelfNode,
        kind: ProviderKind::Custom("fixed_four".to_string()),
    });

    let mut binalyzer = Binalyzer::new(
        root.clone(),
        Rc::new(RefCell::new(ByteStream::backed(vec![0; 8]))),
    );
    binalyzer.register_provider("fixed_four", |_node| Ok(4));

    assert_eq!(root.size().unwrap(), 4);
}

#[test]
fn reassigning_the_template_carries_the_stream_and_registry_over() {
    let first_root = Template::new();
    let mut binalyzer = Binalyzer::new(
        first_root,
        Rc::new(RefCell::new(ByteStream::backed(vec![7; 4]))),
    );
    binalyzer.register_provider("four", |_node| Ok(4));

    let second_root = Template::new();
    second_root.set_sizing(Sizing::Fix);
    second_root.set_size_property(Property::Provider {
        target: Target::SelfNode,
        kind: ProviderKind::Custom("four".to_string()),
    });
    binalyzer.set_template(second_root.clone());

    assert_eq!(second_root.size().unwrap(), 4);
    assert_eq!(second_root.value().unwrap(), vec![7, 7, 7, 7]);
}
