//! JSON format.
//!
//! Each node becomes an object with `tag`, `content`, `attributes` and
//! `children`. Content is an array whose items are strings, or nested arrays
//! for text blocks. Strings are escaped by `serde_json`.

use serde_json::Value;

use crate::table::{FormatTable, Slot};

fn quote(text: &str) -> String {
    Value::from(text).to_string()
}

fn array(items: &[String]) -> String {
    format!("[{}]", items.join(","))
}

/// The built-in JSON format table.
pub fn table() -> FormatTable {
    FormatTable {
        tag: Slot::join(|items, _| quote(&items.concat())),
        content_text: Slot::text(|text, _| quote(text)),
        content: Slot::join(|items, _| array(items)),
        attribute_tag: Slot::join(|items, _| quote(&items.concat())),
        attribute_content: Slot::join(|items, _| quote(&items.concat())),
        attribute: Slot::template(r#"{{"tag":{attribute_tag},"content":{attribute_content}}}"#)
            .expect("attribute template is valid"),
        attributes: Slot::join(|items, _| array(items)),
        children: Slot::join(|items, _| array(items)),
        element: Slot::template(
            r#"{{"tag":{tag},"content":{content},"attributes":{attributes},"children":{children}}}"#,
        )
        .expect("element template is valid"),
        ..FormatTable::default()
    }
}
