//! Shared fixtures for codec integration tests.
//!
//! Resource kinds for a small blog domain (articles, people, comments) and
//! builders for the graphs most tests start from.

#![allow(dead_code)]

use helios_jsonapi::{
    Attributes, NodeId, ResourceGraph, ResourceKind, ResourceNode, TypeRegistry,
};
use serde_json::json;

pub struct Article;

impl ResourceKind for Article {
    fn type_name(&self) -> &str {
        "articles"
    }
}

pub struct Person;

impl ResourceKind for Person {
    fn type_name(&self) -> &str {
        "people"
    }

    fn default_attributes(&self) -> Attributes {
        let mut defaults = Attributes::new();
        defaults.insert("role".to_string(), json!("reader"));
        defaults
    }
}

impl Person {
    /// Business accessor available on nodes built by this kind.
    pub fn display_name(&self, node: &ResourceNode) -> String {
        match node.attribute("name").and_then(|name| name.as_str()) {
            Some(name) => name.to_string(),
            None => format!("person {}", node.id.as_deref().unwrap_or("?")),
        }
    }
}

pub struct Comment;

impl ResourceKind for Comment {
    fn type_name(&self) -> &str {
        "comments"
    }
}

/// Registry with every blog kind and no generic fallback.
pub fn blog_registry() -> TypeRegistry {
    TypeRegistry::builder()
        .register(Article)
        .register(Person)
        .register(Comment)
        .build()
        .expect("blog registry")
}

/// `articles/1` "Rails is Omakase" with `author` -> `people/9`.
///
/// The author has attributes only when `author_name` is given.
pub fn omakase(author_name: Option<&str>) -> (ResourceGraph, NodeId, NodeId) {
    let mut graph = ResourceGraph::new();
    let mut author = ResourceNode::new("people").with_id("9");
    if let Some(name) = author_name {
        author = author.with_attribute("name", name);
    }
    let author = graph.insert(author);
    let article = graph.insert(
        ResourceNode::new("articles")
            .with_id("1")
            .with_attribute("title", "Rails is Omakase"),
    );
    graph.set_to_one(article, "author", Some(author));
    (graph, article, author)
}

/// `articles/1` and `people/9` referring to each other.
pub fn article_author_cycle() -> (ResourceGraph, NodeId, NodeId) {
    let (mut graph, article, author) = omakase(Some("Dan Gebhardt"));
    graph.push_to_many(author, "articles", article);
    (graph, article, author)
}
