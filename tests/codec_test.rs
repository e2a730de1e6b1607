//! Decoder / encoder behaviour over parsed fixtures

mod common;

use common::fixture;
use dynconf::{
    decode, decode_from, decode_with, encode, encode_container, ConfigError, Container, Field,
    Format, Value,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;

fn parse_fixture(name: &str) -> Value {
    let path = fixture(name);
    let format = Format::from_path(&path).unwrap();
    format.parse(&fs::read_to_string(&path).unwrap()).unwrap()
}

#[test]
fn test_fixture_round_trip() {
    for name in ["cfg.toml", "cfg.json"] {
        let tree = decode(parse_fixture(name));
        let again = decode(encode(&tree));
        assert_eq!(again, tree, "{} did not survive encode/decode", name);
    }
}

#[test]
fn test_every_mapping_becomes_a_container() {
    let tree = decode(parse_fixture("cfg.toml"));
    let root = tree.as_container().unwrap();

    for (name, field) in root.container("project").unwrap().iter() {
        if name == "dependencies" || name == "test" {
            assert!(field.is_container(), "{} should be a container", name);
        }
    }
    let servers = root.get("servers").and_then(Field::as_list).unwrap();
    assert!(servers.iter().all(Field::is_container));
}

#[test]
fn test_processor_rewrites_only_scalars() {
    let mut seen = Vec::new();
    let tree = decode_with(parse_fixture("cfg.toml"), |key: &str, field: Field| {
        seen.push(key.to_string());
        match field {
            Field::String(s) => Field::String(s.to_uppercase()),
            other => other,
        }
    });

    let root = tree.as_container().unwrap();
    assert_eq!(root.get_path("build.type"), Some(&Field::from("DEBUG")));
    assert_eq!(root.get_path("project.test.third_level.number"), Some(&Field::Integer(10)));
    // shape is unchanged
    assert_eq!(
        root.get_path("generator.exclude"),
        Some(&Field::from(vec![".GIT", "ASSETS"]))
    );
    assert!(seen.iter().any(|k| k == "exclude"));
    assert!(!seen.iter().any(|k| k == "project" || k == "servers"));
}

#[test]
fn test_encode_output_is_stable() {
    let tree = decode(parse_fixture("cfg.json"));
    let first = Format::Json.serialize(&encode(&tree)).unwrap();
    let second = Format::Json.serialize(&encode(&tree)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_json_and_toml_agree_on_shared_content() {
    let from_toml = decode(parse_fixture("cfg.toml"));
    let from_json = decode(parse_fixture("cfg.json"));
    assert_eq!(
        from_toml
            .as_container()
            .and_then(|c| c.get_path("project.dependencies.pytomlpp")),
        from_json
            .as_container()
            .and_then(|c| c.get_path("project.dependencies.pytomlpp")),
    );
}

#[test]
fn test_update_with_mapping_materializes_containers() {
    let mut root = Container::new();
    let nested = parse_fixture("cfg.json");
    root.update([("imported", Field::from(nested))]);

    let imported = root.container("imported").unwrap();
    assert!(imported.container("project").is_some());

    // untouched fields survive a later update
    root.update([("extra", 1)]);
    assert!(root.contains("imported"));
    assert_eq!(root.len(), 2);
}

#[test]
fn test_decode_from_struct() {
    #[derive(Serialize)]
    struct Server {
        host: String,
        port: u16,
        tags: Vec<&'static str>,
    }

    let field = decode_from(
        &Server {
            host: "alpha".into(),
            port: 8001,
            tags: vec!["edge"],
        },
        dynconf::processor::identity,
    )
    .unwrap();

    let server = field.as_container().unwrap();
    assert_eq!(server.get("port"), Some(&Field::Integer(8001)));
    assert_eq!(server.get("tags"), Some(&Field::from(vec!["edge"])));
    assert_eq!(encode_container(server), encode(&field));
}

#[test]
fn test_non_string_keys_are_rejected() {
    let mut table = HashMap::new();
    table.insert(1u8, "one");

    let err = decode_from(&table, dynconf::processor::identity).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidKeyKind(_)), "got {:?}", err);
}

#[test]
fn test_rows_cover_every_leaf() {
    let tree = decode(parse_fixture("cfg.toml"));
    let root = tree.as_container().unwrap();
    let rows = root.rows();

    let build_type = rows
        .iter()
        .find(|row| row.path == ["build", "type"])
        .unwrap();
    assert_eq!(build_type.value, &Field::from("Debug"));

    let excluded: Vec<_> = rows
        .iter()
        .filter(|row| row.path == ["generator", "exclude"])
        .map(|row| row.value)
        .collect();
    assert_eq!(excluded.len(), 2);
}
