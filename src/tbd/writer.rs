//! tbd (text-based dylib) v1 serializer.
//!
//! Renders a [`LibraryDescriptor`] as YAML in the layout produced by Apple's
//! tools: keys padded to a fixed column, flow lists wrapped at a fixed line
//! width. Lists are written in the order they are given.

use std::fmt::Write;

use super::model::{ArchitectureRecord, LibraryDescriptor};

/// Width of the key column, including the colon.
const KEY_WIDTH: usize = 17;

/// Lines are wrapped before they exceed this width.
const LINE_WIDTH: usize = 85;

/// Top-level entries start at column zero.
const TOP: &str = "";
/// First key of an export entry.
const ITEM: &str = "  - ";
/// Remaining keys of an export entry.
const ITEM_CONT: &str = "    ";

/// Renders the descriptor as a tbd document.
pub fn render_tbd(desc: &LibraryDescriptor) -> String {
    let mut out = String::new();
    out.push_str("---\n");

    let archs: Vec<&str> = desc.arch_names().collect();
    write_list(&mut out, TOP, "archs", &archs);
    write_scalar(&mut out, TOP, "platform", desc.platform.as_str());
    write_scalar(&mut out, TOP, "install-name", &desc.install_name);
    write_scalar(&mut out, TOP, "current-version", &desc.current_version);
    if !desc.compatibility_version.is_empty() {
        write_scalar(
            &mut out,
            TOP,
            "compatibility-version",
            &desc.compatibility_version,
        );
    }

    if !desc.archs.is_empty() {
        out.push_str("exports:\n");
        for record in &desc.archs {
            write_export(&mut out, record);
        }
    }

    out.push_str("...\n");
    out
}

fn write_export(out: &mut String, record: &ArchitectureRecord) {
    write_list(out, ITEM, "archs", &[record.name.as_str()]);

    let sections: [(&str, &[String]); 5] = [
        ("re-exports", record.reexports.as_slice()),
        ("symbols", record.symbols.as_slice()),
        ("objc-classes", record.classes.as_slice()),
        ("objc-ivars", record.ivars.as_slice()),
        ("weak-def-symbols", record.weak.as_slice()),
    ];
    for (key, items) in sections {
        if !items.is_empty() {
            write_list(out, ITEM_CONT, key, items);
        }
    }
}

/// Writes `key:` padded to the key column and returns the column reached.
fn write_key(out: &mut String, lead: &str, key: &str) -> usize {
    let label = format!("{}:", key);
    let _ = write!(out, "{}{:<width$}", lead, label, width = KEY_WIDTH);
    if label.len() >= KEY_WIDTH {
        out.push(' ');
        lead.len() + label.len() + 1
    } else {
        lead.len() + KEY_WIDTH
    }
}

fn write_scalar(out: &mut String, lead: &str, key: &str, value: &str) {
    write_key(out, lead, key);
    out.push_str(&quote(value));
    out.push('\n');
}

fn write_list<S: AsRef<str>>(out: &mut String, lead: &str, key: &str, items: &[S]) {
    let start = write_key(out, lead, key);
    out.push_str("[ ");

    let indent = start + 2;
    let mut column = indent;
    for (i, item) in items.iter().enumerate() {
        let item = quote(item.as_ref());
        if i > 0 {
            // Room for the item plus its trailing ", " or " ]".
            if column + 2 + item.len() + 2 > LINE_WIDTH {
                out.push_str(",\n");
                out.extend(std::iter::repeat(' ').take(indent));
                column = indent;
            } else {
                out.push_str(", ");
                column += 2;
            }
        }
        out.push_str(&item);
        column += item.len();
    }

    if items.is_empty() {
        out.push_str("]\n");
    } else {
        out.push_str(" ]\n");
    }
}

/// Single-quotes a scalar when YAML would not read it back as plain text.
fn quote(value: &str) -> String {
    if needs_quotes(value) {
        format!("'{}'", value.replace('\'', "''"))
    } else {
        value.to_string()
    }
}

fn needs_quotes(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return true;
    };

    if matches!(
        first,
        '-' | '?' | ':' | ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\''
            | '"' | '%' | '@' | '`'
    ) {
        return true;
    }

    value.ends_with(' ')
        || value.contains(": ")
        || value.contains(" #")
        || value
            .chars()
            .any(|c| matches!(c, ',' | '[' | ']' | '{' | '}' | '\t' | '\n' | '\r'))
}
