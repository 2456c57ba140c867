/// Traversal tests: ordering, significance filters and scoping
use crate::{Document, NodeId};

fn tagnames(doc: &Document, ids: impl IntoIterator<Item = NodeId>) -> Vec<String> {
    ids.into_iter()
        .filter_map(|id| doc.node(id).and_then(|node| node.tagname()).map(str::to_string))
        .collect()
}

#[test]
fn test_each_is_depth_first_in_document_order() {
    let doc = Document::parse(
        r#"<div binding="a"><p binding="b"><em binding="c"></em></p><i binding="d"></i></div><span binding="e"></span>"#,
    );

    assert_eq!(tagnames(&doc, doc.each()), vec!["div", "p", "em", "i", "span"]);
}

#[test]
fn test_each_includes_literals() {
    let doc = Document::parse(r#"<div binding="a"><p>one</p>two</div>"#);

    // div + "<p>one</p>" + "two"
    assert_eq!(doc.each().count(), 3);
}

#[test]
fn test_without_descending_skips_nested_matches() {
    let doc = Document::parse(r#"<div binding="foo"><div binding="foo"></div></div>"#);

    assert_eq!(doc.each_significant_node("binding").count(), 2);
    assert_eq!(doc.each_significant_node_without_descending("binding").count(), 1);
    assert_eq!(doc.find_significant_nodes("binding").len(), 2);
    assert_eq!(doc.find_significant_nodes_without_descending("binding").len(), 1);
}

#[test]
fn test_without_descending_still_descends_through_other_nodes() {
    let doc = Document::parse(
        r#"<section><div binding="a"><p binding="x"></p></div></section><div binding="b"></div>"#,
    );

    let found = doc.find_significant_nodes_without_descending("binding");
    assert_eq!(found.len(), 2);
    assert_eq!(tagnames(&doc, found), vec!["div", "div"]);
}

#[test]
fn test_with_name() {
    let doc = Document::parse(
        r#"<div binding="post"><h1 binding="title"></h1></div><p binding="title"></p>"#,
    );

    assert_eq!(doc.find_significant_nodes_with_name("binding", "title").len(), 2);
    assert_eq!(
        doc.find_significant_nodes_with_name_without_descending("binding", "title").len(),
        1
    );
    assert_eq!(
        doc.find_significant_nodes_with_name_without_descending("binding", "post").len(),
        1
    );
    assert_eq!(
        doc.each_significant_node_with_name("binding", "missing").count(),
        0
    );
}

#[test]
fn test_find_first() {
    let doc = Document::parse(
        r#"<div binding="outer"><span binding="inner"></span></div><p binding="last"></p>"#,
    );

    let first = doc.find_first_significant_node("prop").unwrap();
    assert_eq!(doc.node(first).unwrap().tagname(), Some("span"));

    let first = doc
        .find_first_significant_node_without_descending("binding")
        .unwrap();
    assert_eq!(doc.node(first).unwrap().tagname(), Some("div"));

    assert!(doc.find_first_significant_node("form").is_none());
}

#[test]
fn test_component_and_container_by_name() {
    let doc = Document::parse(
        r#"<div ui="modal"></div><div ui="menu"></div><!-- @container sidebar --><!-- @container -->"#,
    );

    assert_eq!(doc.find_significant_nodes_with_name("component", "menu").len(), 1);
    assert_eq!(doc.find_significant_nodes_with_name("container", "default").len(), 1);
    assert_eq!(doc.find_significant_nodes_with_name("container", "sidebar").len(), 1);
}

#[test]
fn test_node_scoped_queries() {
    let doc = Document::parse(
        r#"<div binding="post"><h1 binding="title"></h1><div binding="author"><span binding="name"></span></div></div><p binding="title"></p>"#,
    );
    let post = doc.find_first_significant_node("scope").unwrap();

    assert_eq!(
        tagnames(&doc, doc.significant_descendants(post, "binding")),
        vec!["h1", "div", "span"]
    );
    assert_eq!(
        tagnames(&doc, doc.significant_descendants_without_descending(post, "binding")),
        vec!["h1", "div"]
    );
    assert_eq!(doc.descendants(post).count(), 3);
}

#[test]
fn test_parent_and_children() {
    let doc = Document::parse(r#"<article binding="post"><h1 binding="title">x</h1></article>"#);
    let post = doc.find_first_significant_node("scope").unwrap();
    let title = doc.find_first_significant_node("prop").unwrap();

    assert_eq!(doc.roots(), &[post][..]);
    assert_eq!(doc.children_of(post), &[title][..]);
    assert_eq!(doc.parent_of(title), Some(post));
    assert_eq!(doc.parent_of(post), None);
    assert_eq!(doc.children_of(title).len(), 1);
    assert!(doc.contains(title));
}

#[test]
fn test_traversal_skips_removed_nodes() {
    let mut doc = Document::parse(r#"<div binding="a"></div><div binding="b"></div>"#);
    let a = doc.find_first_significant_node("binding").unwrap();
    doc.remove_node(a);

    assert_eq!(doc.find_significant_nodes("binding").len(), 1);
    assert!(!doc.contains(a));
    // The value is still readable through the old id.
    assert!(doc.node(a).is_some());
}
