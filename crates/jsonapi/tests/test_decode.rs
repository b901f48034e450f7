//! Decoding JSON:API documents into resource graphs.

mod common;

use common::{Article, Person, blog_registry};
use helios_jsonapi::{
    DecodeOptions, Decoded, Document, DuplicatePolicy, GraphDecoder, JsonApiError, Primary,
    RelationshipValue, TypeRegistry, decode, from_jsonapi_generic,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn document(value: Value) -> Document {
    Document::from_value(value).unwrap()
}

fn decode_with(value: Value, options: DecodeOptions) -> helios_jsonapi::Result<Decoded> {
    let registry = TypeRegistry::generic();
    GraphDecoder::with_options(
        &registry,
        DecodeOptions {
            allow_generic: true,
            ..options
        },
    )
    .decode(&document(value))
}

fn cyclic_document() -> Value {
    json!({
        "data": {
            "type": "articles",
            "id": "1",
            "attributes": {"title": "Rails is Omakase"},
            "relationships": {"author": {"data": {"type": "people", "id": "9"}}}
        },
        "included": [{
            "type": "people",
            "id": "9",
            "attributes": {"name": "Dan Gebhardt"},
            "relationships": {"articles": {"data": [{"type": "articles", "id": "1"}]}}
        }]
    })
}

#[test]
fn test_cycle_closes_on_the_same_node() {
    let decoded = decode(&document(cyclic_document()), &blog_registry()).unwrap();
    let article = decoded.one().unwrap();
    let author = decoded.graph.to_one(article, "author").unwrap();

    assert_eq!(decoded.graph.to_many(author, "articles"), &[article]);
    assert_eq!(decoded.graph.len(), 2);
    assert!(decoded.issues.is_empty());
}

#[test]
fn test_registered_kinds_construct_nodes() {
    let decoded = decode(&document(cyclic_document()), &blog_registry()).unwrap();
    let article = decoded.one().unwrap();
    let author = decoded.graph.to_one(article, "author").unwrap();

    assert!(decoded.graph[article].is_kind::<Article>());
    let person = decoded.graph[author].kind_as::<Person>().unwrap();
    assert_eq!(person.display_name(&decoded.graph[author]), "Dan Gebhardt");
}

#[test]
fn test_unknown_type_without_generic_fails() {
    let registry = TypeRegistry::builder().register(Article).build().unwrap();
    let err = decode(&document(cyclic_document()), &registry).unwrap_err();
    match err {
        JsonApiError::UnknownType { type_name, path } => {
            assert_eq!(type_name, "people");
            assert_eq!(path, "/data/relationships/author/data");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_type_with_generic_keeps_members() {
    let registry = TypeRegistry::builder()
        .register(Article)
        .allow_generic(true)
        .build()
        .unwrap();
    let decoded = decode(&document(cyclic_document()), &registry).unwrap();
    let article = decoded.one().unwrap();
    let author = decoded.graph.to_one(article, "author").unwrap();

    let node = &decoded.graph[author];
    assert_eq!(node.type_name(), "people");
    assert!(node.kind().is_none());
    assert_eq!(node.attribute("name"), Some(&json!("Dan Gebhardt")));
    assert_eq!(decoded.graph.to_many(author, "articles"), &[article]);
}

#[test]
fn test_generic_helper_decodes_any_type() {
    let decoded = from_jsonapi_generic(json!({
        "data": {"type": "spaceships", "id": "ncc-1701", "attributes": {"crew": 430}}
    }))
    .unwrap();
    let ship = decoded.one().unwrap();
    assert_eq!(decoded.graph[ship].type_name(), "spaceships");
    assert_eq!(decoded.graph[ship].attribute("crew"), Some(&json!(430)));
}

#[test]
fn test_data_shapes_are_preserved() {
    let decoded = decode_with(json!({"data": []}), DecodeOptions::default()).unwrap();
    assert_eq!(decoded.primary, Primary::Many(vec![]));

    let decoded = decode_with(
        json!({"data": [{"type": "tags", "id": "1"}]}),
        DecodeOptions::default(),
    )
    .unwrap();
    assert_eq!(decoded.nodes().len(), 1);
    assert!(decoded.one().is_none());

    let decoded = decode_with(json!({"meta": {"total": 0}}), DecodeOptions::default()).unwrap();
    assert_eq!(decoded.primary, Primary::Null);
}

#[test]
fn test_integer_ids_become_strings() {
    let decoded = decode_with(
        json!({
            "data": {
                "type": "articles", "id": 1,
                "relationships": {"author": {"data": {"type": "people", "id": 9}}}
            }
        }),
        DecodeOptions::default(),
    )
    .unwrap();
    let article = decoded.one().unwrap();
    let author = decoded.graph.to_one(article, "author").unwrap();
    assert_eq!(decoded.graph[article].id.as_deref(), Some("1"));
    assert_eq!(decoded.graph[author].id.as_deref(), Some("9"));
}

#[test]
fn test_identifier_only_linkage_builds_empty_node() {
    let decoded = decode_with(
        json!({
            "data": {
                "type": "articles", "id": "1",
                "relationships": {"author": {"data": {"type": "people", "id": "9"}}}
            }
        }),
        DecodeOptions::default(),
    )
    .unwrap();
    let article = decoded.one().unwrap();
    let author = &decoded.graph[decoded.graph.to_one(article, "author").unwrap()];
    assert_eq!(author.id.as_deref(), Some("9"));
    assert!(author.attributes.is_empty());
    assert!(author.relationships.is_empty());
}

#[test]
fn test_relationship_data_variants() {
    let decoded = decode_with(
        json!({
            "data": {
                "type": "articles", "id": "1",
                "relationships": {
                    "author": {"data": null},
                    "comments": {"data": []},
                    "tags": {"links": {"related": "/articles/1/tags"}},
                    "editor": {"meta": {"pending": true}}
                }
            }
        }),
        DecodeOptions::default(),
    )
    .unwrap();
    let node = &decoded.graph[decoded.one().unwrap()];
    assert_eq!(node.relationship("author"), Some(&RelationshipValue::ToOne(None)));
    assert_eq!(
        node.relationship("comments"),
        Some(&RelationshipValue::ToMany(vec![]))
    );
    assert!(node.relationship("tags").is_none());
    assert!(node.relationship("editor").is_none());
}

#[test]
fn test_unsupported_members_are_ignored() {
    let decoded = decode_with(
        json!({
            "jsonapi": {"version": "1.1"},
            "links": {"self": "/articles/1"},
            "meta": {"copyright": "Helios"},
            "data": {
                "type": "articles", "id": "1",
                "links": {"self": "/articles/1"},
                "meta": {"views": 10},
                "attributes": {"title": "Rails is Omakase"}
            }
        }),
        DecodeOptions::default(),
    )
    .unwrap();
    let node = &decoded.graph[decoded.one().unwrap()];
    assert_eq!(node.attributes.len(), 1);
    assert!(node.relationships.is_empty());
}

#[test]
fn test_duplicates_merge_with_later_members_winning() {
    let decoded = decode_with(
        json!({
            "data": {
                "type": "articles", "id": "1",
                "relationships": {"author": {"data": {"type": "people", "id": "9"}}}
            },
            "included": [
                {"type": "people", "id": "9", "attributes": {"name": "Dan", "twitter": "dgeb"}},
                {"type": "people", "id": "9", "attributes": {"name": "Dan Gebhardt"}}
            ]
        }),
        DecodeOptions::default(),
    )
    .unwrap();
    let article = decoded.one().unwrap();
    let author = &decoded.graph[decoded.graph.to_one(article, "author").unwrap()];
    assert_eq!(author.attribute("name"), Some(&json!("Dan Gebhardt")));
    assert_eq!(author.attribute("twitter"), Some(&json!("dgeb")));
    assert!(decoded.issues.is_empty());
}

#[test]
fn test_duplicates_rejected_by_policy() {
    let decoded = decode_with(
        json!({
            "data": {"type": "people", "id": "9", "attributes": {"name": "Dan"}},
            "included": [{"type": "people", "id": "9", "attributes": {"name": "Impostor"}}]
        }),
        DecodeOptions {
            duplicate_policy: DuplicatePolicy::Reject,
            ..Default::default()
        },
    )
    .unwrap();
    let person = decoded.one().unwrap();
    assert_eq!(decoded.graph[person].attribute("name"), Some(&json!("Dan")));
    match &decoded.issues[..] {
        [JsonApiError::DuplicateIdentity { identity, path, first_path }] => {
            assert_eq!(identity, "people/9");
            assert_eq!(path, "/included/0");
            assert_eq!(first_path, "/data");
        }
        other => panic!("unexpected issues: {other:?}"),
    }
    assert!(matches!(
        decoded.into_clean(),
        Err(JsonApiError::InvalidDocument(issues)) if issues.len() == 1
    ));
}

#[test]
fn test_rejected_duplicates_keep_data_positions() {
    let decoded = decode_with(
        json!({
            "data": [
                {"type": "tags", "id": "1", "attributes": {"label": "first"}},
                {"type": "tags", "id": "1", "attributes": {"label": "second"}},
                {"type": "tags", "id": "2", "attributes": {"label": "other"}}
            ]
        }),
        DecodeOptions {
            duplicate_policy: DuplicatePolicy::Reject,
            ..Default::default()
        },
    )
    .unwrap();

    let nodes = decoded.nodes();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0], nodes[1]);
    assert_ne!(nodes[1], nodes[2]);
    assert_eq!(decoded.graph[nodes[1]].attribute("label"), Some(&json!("first")));
    assert_eq!(decoded.issues.len(), 1);
    assert_eq!(decoded.issues[0].path(), Some("/data/1"));
}

#[test]
fn test_resources_sharing_a_lid_keep_their_ids() {
    let decoded = decode_with(
        json!({
            "data": [
                {"type": "people", "id": "5", "lid": "x", "attributes": {"name": "Ann"}},
                {"type": "people", "id": "6", "lid": "x", "attributes": {"name": "Bob"}},
                {
                    "type": "articles", "id": "1",
                    "relationships": {"author": {"data": {"type": "people", "lid": "x"}}}
                }
            ]
        }),
        DecodeOptions::default(),
    )
    .unwrap();

    let nodes = decoded.nodes();
    assert_eq!(nodes.len(), 3);
    assert_ne!(nodes[0], nodes[1]);
    assert_eq!(decoded.graph[nodes[1]].attribute("name"), Some(&json!("Bob")));
    // A bare lid resolves to the first resource that carried it.
    assert_eq!(decoded.graph.to_one(nodes[2], "author"), Some(nodes[0]));
    assert!(decoded.issues.is_empty());
}

fn malformed_document() -> Value {
    json!({
        "data": {
            "type": "articles", "id": "1",
            "relationships": {
                "comments": {"data": [
                    {"type": "comments", "id": "5"},
                    {"type": "comments"},
                    {"id": "12"},
                    {"type": "comments", "id": "13", "attributes": {"body": "inline"}}
                ]}
            }
        },
        "included": [
            {"id": "orphan"},
            {"type": "comments", "attributes": {"body": "no identity"}}
        ]
    })
}

#[test]
fn test_malformed_resources_are_reported_with_paths() {
    let decoded = decode_with(malformed_document(), DecodeOptions::default()).unwrap();
    let article = decoded.one().unwrap();
    assert_eq!(decoded.graph.to_many(article, "comments").len(), 1);

    let mut paths: Vec<_> = decoded.issues.iter().filter_map(|issue| issue.path()).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "/data/relationships/comments/data/1",
            "/data/relationships/comments/data/2",
            "/data/relationships/comments/data/3",
            "/included/0",
            "/included/1",
        ]
    );
    assert!(
        decoded
            .issues
            .iter()
            .all(|issue| matches!(issue, JsonApiError::MalformedLinkage { .. }))
    );
}

#[test]
fn test_wrongly_typed_identity_members_spare_siblings() {
    let decoded = decode_with(
        json!({
            "data": {
                "type": "articles", "id": "1",
                "attributes": {"title": "JSON:API"},
                "relationships": {
                    "author": {"data": {"type": ["people"], "id": "9"}},
                    "comments": {"data": [
                        {"type": "comments", "id": "5"},
                        {"type": 5, "id": "1"},
                        {"type": "people", "id": true},
                        {"type": "comments", "id": 12}
                    ]}
                }
            },
            "included": [
                {"type": "comments", "id": "5", "attributes": {"body": "First!"}},
                {"type": 7, "id": "3", "attributes": {"body": "lost"}}
            ]
        }),
        DecodeOptions::default(),
    )
    .unwrap();

    let article = decoded.one().unwrap();
    assert_eq!(decoded.graph[article].attribute("title"), Some(&json!("JSON:API")));
    assert!(decoded.graph[article].relationship("author").is_none());

    let comments = decoded.graph.to_many(article, "comments");
    assert_eq!(comments.len(), 2);
    assert_eq!(decoded.graph[comments[0]].attribute("body"), Some(&json!("First!")));
    assert_eq!(decoded.graph[comments[1]].id.as_deref(), Some("12"));

    let mut paths: Vec<_> = decoded.issues.iter().filter_map(|issue| issue.path()).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "/data/relationships/author/data",
            "/data/relationships/comments/data/1",
            "/data/relationships/comments/data/2",
            "/included/1",
        ]
    );
    assert!(
        decoded
            .issues
            .iter()
            .all(|issue| matches!(issue, JsonApiError::MalformedLinkage { .. }))
    );
}

#[test]
fn test_fail_fast_stops_at_first_issue() {
    let err = decode_with(
        malformed_document(),
        DecodeOptions {
            fail_fast: true,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.path(), Some("/included/0"));
}

#[test]
fn test_strict_includes_reports_orphans_and_unresolved_lids() {
    let value = json!({
        "data": {
            "type": "articles", "id": "1",
            "relationships": {
                "author": {"data": {"type": "people", "lid": "new-author"}},
                "editor": {"data": {"type": "people", "lid": "known"}}
            }
        },
        "included": [
            {"type": "people", "lid": "known", "attributes": {"name": "Ann"}},
            {"type": "tags", "id": "7", "attributes": {"label": "unused"}}
        ]
    });

    let lenient = decode_with(value.clone(), DecodeOptions::default()).unwrap();
    assert!(lenient.issues.is_empty());

    let strict = decode_with(
        value,
        DecodeOptions {
            strict_includes: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(strict.issues.len(), 2);
    assert!(matches!(
        &strict.issues[0],
        JsonApiError::UnresolvedLocalId { lid, path, .. }
            if lid == "new-author" && path == "/data/relationships/author/data"
    ));
    assert!(matches!(
        &strict.issues[1],
        JsonApiError::OrphanedInclude { identity, path }
            if identity == "tags/7" && path == "/included/1"
    ));
}

#[test]
fn test_primary_without_identity_is_decoded() {
    let decoded = decode_with(
        json!({
            "data": {
                "type": "articles",
                "attributes": {"title": "Draft"},
                "relationships": {"author": {"data": {"type": "people", "lid": "me"}}}
            },
            "included": [{"type": "people", "lid": "me", "attributes": {"name": "Ann"}}]
        }),
        DecodeOptions::default(),
    )
    .unwrap();
    let draft = decoded.one().unwrap();
    assert!(decoded.graph[draft].identity().is_none());
    let author = decoded.graph.to_one(draft, "author").unwrap();
    assert_eq!(decoded.graph[author].attribute("name"), Some(&json!("Ann")));
}

#[test]
fn test_long_chains_do_not_recurse() {
    const LENGTH: usize = 20_000;
    let included: Vec<Value> = (1..LENGTH)
        .map(|i| {
            json!({
                "type": "links", "id": i.to_string(),
                "relationships": {"next": {"data": {"type": "links", "id": (i + 1).to_string()}}}
            })
        })
        .collect();
    let value = json!({
        "data": {
            "type": "links", "id": "0",
            "relationships": {"next": {"data": {"type": "links", "id": "1"}}}
        },
        "included": included
    });

    let decoded = decode_with(value, DecodeOptions::default()).unwrap();
    assert_eq!(decoded.graph.len(), LENGTH + 1);
    assert_eq!(decoded.graph.reachable(decoded.one().unwrap()).len(), LENGTH + 1);
}
