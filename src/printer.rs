use crate::ast::{DocumentNode, LionDocument, NodeKind};
use crate::schema::{Schema, SchemaComponent};

const INDENT: &str = "    ";

/// Renders a document back to Lion text. A document carrying a schema is
/// written as an `@schema { ... }` block followed by `@doc { ... }`.
pub fn stringify_document(document: &LionDocument) -> String {
    let mut printer = Printer::default();
    if let Some(schema) = document.schema.as_ref().filter(|_| document.has_schema) {
        printer.push("@schema {\n");
        printer.schema(schema, 1);
        printer.push("}\n@doc ");
    }
    printer.node(&document.root, 0);
    printer.push("\n");
    printer.out
}

/// Renders a schema as its `@definition` block followed by its `@subschema` blocks.
pub fn stringify_schema(schema: &Schema) -> String {
    let mut printer = Printer::default();
    printer.schema(schema, 0);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
}

impl Printer {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn indent(&mut self, level: usize) {
        for _ in 0..level {
            self.out.push_str(INDENT);
        }
    }

    fn schema(&mut self, schema: &Schema, level: usize) {
        self.block("@definition", &schema.components, level);
        for (name, sub_schema) in &schema.sub_schemas {
            self.block(&format!("@subschema {name}"), &sub_schema.components, level);
        }
    }

    fn block(&mut self, header: &str, components: &[(String, SchemaComponent)], level: usize) {
        self.indent(level);
        self.push(header);
        if components.is_empty() {
            self.push(" {}\n");
            return;
        }
        self.push(" {\n");
        for (i, (name, component)) in components.iter().enumerate() {
            self.indent(level + 1);
            self.push(name);
            if component.is_optional {
                self.push("?");
            }
            self.push(": ");
            self.push(&component.type_expr);
            self.push(if i + 1 < components.len() { ",\n" } else { "\n" });
        }
        self.indent(level);
        self.push("}\n");
    }

    fn node(&mut self, node: &DocumentNode, level: usize) {
        let (entries, is_array) = match &node.kind {
            NodeKind::Leaf(value) => {
                self.push(&value.to_string());
                return;
            }
            NodeKind::Container { entries, is_array } => (entries, *is_array),
        };
        let (open, close) = if is_array { ("[", "]") } else { ("{", "}") };

        if entries.is_empty() {
            self.push(open);
            self.push(close);
            return;
        }

        // Arrays of scalars stay on one line.
        if is_array && entries.iter().all(|e| e.value.is_single_value()) {
            self.push(open);
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.node(&entry.value, level);
            }
            self.push(close);
            return;
        }

        self.push(open);
        self.push("\n");
        for (i, entry) in entries.iter().enumerate() {
            self.indent(level + 1);
            if !is_array {
                self.push(&entry.key);
                self.push(": ");
            }
            self.node(&entry.value, level + 1);
            self.push(if i + 1 < entries.len() { ",\n" } else { "\n" });
        }
        self.indent(level);
        self.push(close);
    }
}
