//! Command-line tool for inspecting a binary blob against a declarative
//! layout template.
//!
//! Loads a template XML document (and an optional data file), resolves
//! the whole tree, and prints each node's name, offset, absolute address
//! and size the way `dtb-tool` prints a device tree.

use binalyzer_core::Template;
use clap::Parser;

/// Command-line arguments for the binalyzer inspection tool.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the XML layout template
    #[arg(short, long)]
    template: String,

    /// Path to the binary data file the template is resolved against
    #[arg(short, long)]
    data: Option<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let binalyzer = match binalyzer_xml::load_from(&args.template, args.data.as_deref()) {
        Ok(binalyzer) => binalyzer,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    print_node(&binalyzer.template(), 0);
}

fn print_node(node: &Template, depth: usize) {
    let indent = "  ".repeat(depth);
    let name = node.name().unwrap_or_else(|| "<anonymous>".to_string());

    match (node.offset(), node.absolute_address(), node.size()) {
        (Ok(offset), Ok(address), Ok(size)) => {
            println!(
                "{indent}{name} offset=0x{offset:x} address=0x{address:x} size=0x{size:x}"
            );
        }
        (offset, address, size) => {
            log::debug!(
                "failed to resolve {name:?}: offset={offset:?} address={address:?} size={size:?}"
            );
            println!("{indent}{name} <unresolved>");
        }
    }

    for child in node.children() {
        print_node(&child, depth + 1);
    }
}
