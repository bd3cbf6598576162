// Integration tests for lion-core using test fixtures
use lion_core::{analyze_text, parse_text, parse_text_with_name, stringify_document, ErrorKind};
use std::fs;
use std::path::PathBuf;

fn get_test_file_path(subdir: &str, filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join(subdir)
        .join(filename)
}

fn read_test_file(subdir: &str, filename: &str) -> String {
    let path = get_test_file_path(subdir, filename);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read test file: {:?}", path))
}

// Tests for valid Lion files that should parse and validate successfully
mod ok_tests {
    use super::*;
    use lion_core::{DocumentNode, Primitive};

    #[test]
    fn test_primitives() {
        let content = read_test_file("ok", "primitives.lion");
        let result = parse_text_with_name(&content, "primitives.lion");
        assert!(
            result.is_ok(),
            "Should parse successfully: {:?}",
            result.err()
        );

        let document = result.unwrap();
        let value = |key: &str| document.get(key).and_then(DocumentNode::value).cloned();
        assert_eq!(value("flags"), Some(Primitive::Integer(10)));
        assert_eq!(value("mode"), Some(Primitive::Integer(493)));
        assert_eq!(value("mask"), Some(Primitive::Integer(16)));
        assert_eq!(value("ratio"), Some(Primitive::Float(0.75)));
        assert!(document.to_json().is_ok(), "Should serialize to JSON");
    }

    #[test]
    fn test_collections() {
        let content = read_test_file("ok", "collections.lion");
        let document = parse_text(&content).unwrap();
        assert_eq!(document.get("tags").map(DocumentNode::len), Some(3));
        assert!(document.get("empty").is_some_and(DocumentNode::is_array));

        let json: serde_json::Value = serde_json::from_str(&document.to_json().unwrap()).unwrap();
        assert_eq!(json["matrix"], serde_json::json!([[1, 2, 3], [4, 5, 6]]));
        assert_eq!(json["nested"]["inner"]["deep"], "value");
    }

    #[test]
    fn test_schema() {
        let content = read_test_file("ok", "schema.lion");
        let document = parse_text(&content).unwrap();
        assert!(document.has_schema);
        let schema = document.schema.as_ref().unwrap();
        assert_eq!(schema.required_count(), 3);
        assert_eq!(schema.sub_schemas[0].0, "Env");
    }

    #[test]
    fn test_nested_subschemas() {
        let content = read_test_file("ok", "nested_subschemas.lion");
        let result = parse_text(&content);
        assert!(
            result.is_ok(),
            "Should parse successfully: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_fixtures_round_trip() {
        for name in [
            "primitives.lion",
            "collections.lion",
            "schema.lion",
            "nested_subschemas.lion",
        ] {
            let document = parse_text(&read_test_file("ok", name)).unwrap();
            let reparsed = parse_text(&stringify_document(&document))
                .unwrap_or_else(|e| panic!("{name} did not round trip: {e}"));
            assert_eq!(reparsed, document, "{name} changed after a round trip");
        }
    }

    #[test]
    fn test_round_trip_through_file() {
        let document = parse_text(&read_test_file("ok", "schema.lion")).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("written.lion");
        fs::write(&path, stringify_document(&document)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let reparsed = parse_text_with_name(&content, &path.to_string_lossy()).unwrap();
        assert_eq!(reparsed.root, document.root);
        assert_eq!(reparsed.schema, document.schema);
    }
}

// Tests for invalid Lion files that should produce errors
mod bad_tests {
    use super::*;

    fn kinds(subdir: &str, filename: &str) -> Vec<ErrorKind> {
        analyze_text(&read_test_file(subdir, filename))
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn test_unclosed_object() {
        let content = read_test_file("bad", "unclosed_object.lion");
        assert!(parse_text(&content).is_err(), "Should fail with unexpected end of input");
        assert_eq!(kinds("bad", "unclosed_object.lion"), vec![ErrorKind::Syntax]);
    }

    #[test]
    fn test_missing_colon() {
        let content = read_test_file("bad", "missing_colon.lion");
        let err = parse_text(&content).unwrap_err();
        assert_eq!(
            err.errors[0].message,
            "Expected token type to be COLON (got STRING)"
        );
    }

    #[test]
    fn test_invalid_float() {
        assert_eq!(kinds("bad", "invalid_float.lion"), vec![ErrorKind::Lex]);
    }

    #[test]
    fn test_unterminated_string() {
        let errors = analyze_text(&read_test_file("bad", "unterminated_string.lion"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Unterminated string.");
    }

    #[test]
    fn test_schema_violation() {
        let errors = analyze_text(&read_test_file("bad", "schema_violation.lion"));
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert!(messages.contains(&"Unexpected key 'extra'."));
        assert!(messages.contains(&"Expected key 'port' to be present."));
        assert!(messages.contains(&"Expected key 'name' to satisfy the constraints of type 'String'."));
        assert!(errors.iter().all(|e| e.kind == ErrorKind::Schema));
    }

    #[test]
    fn test_unknown_type() {
        let errors = analyze_text(&read_test_file("bad", "unknown_type.lion"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Type 'Bogus' does not exist.");
        assert_eq!(errors[0].region.start_line, 7);
    }
}
