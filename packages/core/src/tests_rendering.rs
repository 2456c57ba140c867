/// Rendering tests: transformation outcomes, priorities, error recovery,
/// settled results and collapsing
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;

use crate::{Document, Mode, NodeId, ParseOptions, Priority, RenderOptions, Transformed};

const POST: &str = r#"<article binding="post"><h1 binding="title">x</h1></article>"#;

fn post() -> (Document, NodeId, NodeId) {
    let doc = Document::parse(POST);
    let post = doc.find_first_significant_node("scope").unwrap();
    let title = doc.find_first_significant_node("prop").unwrap();
    (doc, post, title)
}

#[test]
fn test_delete_transformation() {
    let (mut doc, _, title) = post();
    doc.transform(title, Priority::Default, |_, _| Ok(Transformed::Delete));

    assert_eq!(doc.render(), r#"<article data-b="post" data-c="article"></article>"#);
}

#[test]
fn test_raw_transformation_stops_the_queue() {
    let (mut doc, _, title) = post();
    let later = Arc::new(AtomicUsize::new(0));
    let counter = later.clone();

    doc.transform(title, Priority::Default, |_, _| Ok("<p>raw</p>".into()))
        .transform(title, Priority::Default, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Transformed::Keep)
        });

    assert_eq!(
        doc.render(),
        r#"<article data-b="post" data-c="article"><p>raw</p></article>"#
    );
    assert_eq!(later.load(Ordering::SeqCst), 0);
}

#[test]
fn test_keep_renders_the_edited_subject() {
    let (mut doc, _, title) = post();
    doc.transform(title, Priority::Default, |subject, _| {
        let root = subject.roots()[0];
        subject
            .set_node_attribute(root, "class", "big")
            .set_node_html(root, "changed");
        Ok(Transformed::Keep)
    });

    assert_eq!(
        doc.render(),
        r#"<article data-b="post" data-c="article"><h1 data-b="title" data-c="article" class="big">changed</h1></article>"#
    );
}

#[test]
fn test_replace_continues_with_new_subject() {
    let (mut doc, _, title) = post();
    doc.transform(title, Priority::Default, |_, _| {
        Ok(Document::parse(r#"<h2 binding="heading">new</h2>"#).into())
    })
    .transform(title, Priority::Low, |subject, _| {
        let root = subject.roots()[0];
        assert_eq!(subject.node(root).unwrap().tagname(), Some("h2"));
        subject.set_node_attribute(root, "class", "after");
        Ok(Transformed::Keep)
    });

    assert_eq!(
        doc.render(),
        r#"<article data-b="post" data-c="article"><h2 data-b="heading" class="after">new</h2></article>"#
    );
}

#[test]
fn test_priority_order() {
    let (mut doc, _, title) = post();
    let log = Arc::new(Mutex::new(Vec::new()));

    for (priority, name) in [
        (Priority::Low, "low"),
        (Priority::Default, "default-1"),
        (Priority::High, "high"),
        (Priority::Default, "default-2"),
    ] {
        let log = log.clone();
        doc.transform(title, priority, move |_, _| {
            log.lock().unwrap().push(name);
            Ok(Transformed::Keep)
        });
    }

    doc.render();
    assert_eq!(
        *log.lock().unwrap(),
        vec!["high", "default-1", "default-2", "low"]
    );
}

#[test]
fn test_transformations_fire_once_and_stay_rendered() {
    let (mut doc, _, title) = post();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    doc.transform(title, Priority::Default, move |_, _| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Ok(Transformed::Raw(format!("<b>{n}</b>")))
    });

    let first = doc.render();
    let second = doc.render();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!(doc.to_string(), first);
    assert!(!doc.has_pending_transformations());
}

#[test]
fn test_edits_after_render_keep_transformation_results() {
    let html = r#"<article binding="post"><h1 binding="title">x</h1><p binding="body">b</p></article>"#;

    for mode in [Mode::Mutable, Mode::Immutable] {
        let mut doc = Document::parse_with(
            html,
            ParseOptions {
                mode,
                ..ParseOptions::default()
            },
        );
        let post = doc.find_first_significant_node("scope").unwrap();
        let title = doc.find_significant_nodes_with_name("binding", "title")[0];
        let body = doc.find_significant_nodes_with_name("binding", "body")[0];
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        doc.transform(title, Priority::Default, |_, _| Ok(Transformed::Delete))
            .transform(post, Priority::Default, move |subject, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                let root = subject.roots()[0];
                subject.set_node_attribute(root, "class", "hi");
                Ok(Transformed::Keep)
            });

        assert_eq!(
            doc.render(),
            r#"<article data-b="post" data-c="article" class="hi"><p data-b="body" data-c="article">b</p></article>"#,
            "{mode:?}"
        );

        doc.set_node_attribute(body, "class", "b");
        let expected = r#"<article data-b="post" data-c="article" class="hi"><p data-b="body" data-c="article" class="b">b</p></article>"#;
        assert_eq!(doc.render(), expected, "{mode:?}");
        assert_eq!(doc.to_string(), expected, "{mode:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!doc.contains(title));
    }
}

#[test]
fn test_display_does_not_run_pending_transformations() {
    let (mut doc, _, title) = post();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    doc.transform(title, Priority::Default, move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Transformed::Delete)
    });

    assert_eq!(doc.to_string(), POST_RENDERED);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(doc.has_pending_transformations());
    assert_eq!(doc.pending_transformations(title), 1);
}

const POST_RENDERED: &str =
    r#"<article data-b="post" data-c="article"><h1 data-b="title" data-c="article">x</h1></article>"#;

#[test]
fn test_failure_without_handler_drops_only_that_node() {
    let (mut doc, post, title) = post();
    doc.transform(title, Priority::Default, |_, _| Err(anyhow!("boom")));
    doc.append_to_node(post, "<p>still here</p>");

    assert_eq!(
        doc.render(),
        r#"<article data-b="post" data-c="article"><p>still here</p></article>"#
    );
}

#[test]
fn test_failure_with_handler() {
    let (mut doc, _, title) = post();
    doc.transform(title, Priority::Default, |_, _| Err(anyhow!("boom")));

    let handler = |error: &anyhow::Error, subject: &Document| {
        assert_eq!(subject.roots().len(), 1);
        Transformed::Raw(format!("<!-- {error} -->"))
    };
    let options = RenderOptions::new().on_error(&handler);

    assert_eq!(
        doc.render_with(&options),
        r#"<article data-b="post" data-c="article"><!-- boom --></article>"#
    );
}

#[test]
fn test_handler_keep_continues_the_queue() {
    let (mut doc, _, title) = post();
    doc.transform(title, Priority::High, |_, _| Err(anyhow!("boom")))
        .transform(title, Priority::Low, |subject, _| {
            let root = subject.roots()[0];
            subject.set_node_attribute(root, "class", "recovered");
            Ok(Transformed::Keep)
        });

    let handler = |_: &anyhow::Error, _: &Document| Transformed::Keep;

    assert_eq!(
        doc.render_with(&RenderOptions::new().on_error(&handler)),
        r#"<article data-b="post" data-c="article"><h1 data-b="title" data-c="article" class="recovered">x</h1></article>"#
    );
}

#[test]
fn test_attributes_transformation() {
    let (mut doc, _, title) = post();
    doc.transform_attributes(title, Priority::Default, |attributes, _| {
        attributes.set("class", "big");
        attributes.delete("data-c");
        Ok(())
    });

    assert_eq!(
        doc.render(),
        r#"<article data-b="post" data-c="article"><h1 data-b="title" class="big">x</h1></article>"#
    );
}

#[test]
fn test_attributes_transformation_failure_drops_the_node() {
    let (mut doc, _, title) = post();
    doc.transform_attributes(title, Priority::Default, |_, _| Err(anyhow!("bad attribute")));

    assert_eq!(doc.render(), r#"<article data-b="post" data-c="article"></article>"#);
}

#[test]
fn test_attributes_transformation_failure_with_handler() {
    let (mut doc, _, title) = post();
    doc.transform_attributes(title, Priority::Default, |attributes, _| {
        attributes.set("class", "partial");
        Err(anyhow!("bad attribute"))
    });

    let handler = |_: &anyhow::Error, _: &Document| Transformed::Keep;

    assert_eq!(
        doc.render_with(&RenderOptions::new().on_error(&handler)),
        r#"<article data-b="post" data-c="article"><h1 data-b="title" data-c="article" class="partial">x</h1></article>"#
    );
}

#[test]
fn test_node_and_attributes_transformations_together() {
    let (mut doc, _, title) = post();
    doc.transform_attributes(title, Priority::Default, |attributes, _| {
        attributes.set("id", "t");
        Ok(())
    })
    .transform(title, Priority::Default, |subject, _| {
        let root = subject.roots()[0];
        subject.set_node_html(root, "y");
        Ok(Transformed::Keep)
    });

    assert_eq!(
        doc.render(),
        r#"<article data-b="post" data-c="article"><h1 data-b="title" data-c="article" id="t">y</h1></article>"#
    );
}

#[test]
fn test_nested_transformations() {
    let (mut doc, post, title) = post();
    doc.transform(post, Priority::Default, |subject, _| {
        let root = subject.roots()[0];
        subject.set_node_attribute(root, "class", "outer");
        Ok(Transformed::Keep)
    })
    .transform(title, Priority::Default, |_, _| Ok(Transformed::Raw("<h1>inner</h1>".into())));

    assert_eq!(
        doc.render(),
        r#"<article data-b="post" data-c="article" class="outer"><h1>inner</h1></article>"#
    );
}

#[test]
fn test_context_is_passed_to_transformations() {
    let (mut doc, _, title) = post();
    doc.transform(title, Priority::Default, |subject, env| {
        let greeting = env.context::<String>().cloned().unwrap_or_default();
        let root = subject.roots()[0];
        subject.set_node_html(root, greeting);
        Ok(Transformed::Keep)
    });

    let context = "hello".to_string();
    let html = doc.render_with(&RenderOptions::new().with_context(&context));

    assert!(html.contains(">hello</h1>"));
}

#[test]
fn test_document_is_the_default_context() {
    let (mut doc, _, title) = post();
    doc.transform(title, Priority::Default, |_, env| {
        let document = env.context::<Document>().expect("document context");
        assert!(env.context::<String>().is_none());
        Ok(Transformed::Raw(format!("{}", document.roots().len())))
    });

    assert_eq!(doc.render(), r#"<article data-b="post" data-c="article">1</article>"#);
}

#[test]
fn test_document_transformation() {
    let (mut doc, _, _) = post();
    doc.transform_document(Priority::Default, |subject, _| {
        subject.append("<footer>f</footer>");
        Ok(Transformed::Keep)
    });

    assert_eq!(doc.render(), format!("{POST_RENDERED}<footer>f</footer>"));
    assert_eq!(doc.render(), format!("{POST_RENDERED}<footer>f</footer>"));
}

#[test]
fn test_document_transformation_runs_node_transformations_too() {
    let (mut doc, _, title) = post();
    doc.transform(title, Priority::Default, |_, _| Ok(Transformed::Delete))
        .transform_document(Priority::Default, |_, _| Ok(Transformed::Keep));

    assert_eq!(doc.render(), r#"<article data-b="post" data-c="article"></article>"#);
}

#[test]
fn test_transform_on_missing_node_is_noop() {
    let (mut doc, _, title) = post();
    doc.remove_node(title);
    doc.transform(title, Priority::Default, |_, _| Ok(Transformed::Raw("x".into())));

    assert!(!doc.has_pending_transformations());
}

#[test]
fn test_collapse_is_idempotent() {
    let html = r#"<div><p>a</p><section binding="s"><b>x</b><i binding="name">n</i><em>e</em></section><p>z</p></div>"#;

    let mut plain = Document::parse(html);
    let expected = plain.render();

    let mut collapsed = Document::parse(html);
    collapsed.collapse(&["prop"]);

    assert_eq!(collapsed.render(), expected);
    assert!(collapsed.find_first_significant_node("prop").is_some());
}

#[test]
fn test_collapse_merges_insignificant_siblings() {
    let mut doc = Document::parse(
        r#"<div binding="list"><p binding="a">a</p><p binding="b">b</p><span binding="keep">k</span></div>"#,
    );
    let list = doc.find_first_significant_node("scope").unwrap();
    doc.collapse(&["scope"]);

    // The three props are folded into a single literal.
    let children = doc.children_of(list);
    assert_eq!(children.len(), 1);
    assert!(doc.node(children[0]).unwrap().is_literal());
    assert!(doc.find_first_significant_node("prop").is_none());
    assert_eq!(
        doc.render(),
        r#"<div data-b="list"><p data-b="a">a</p><p data-b="b">b</p><span data-b="keep">k</span></div>"#
    );
}

#[test]
fn test_collapse_whole_document() {
    let mut doc = Document::parse(POST);
    doc.collapse(&["form"]);

    assert!(doc.roots().is_empty());
    assert_eq!(doc.collapsed(), Some(POST_RENDERED));
    assert!(!doc.is_empty());
    assert_eq!(doc.render(), POST_RENDERED);
}

#[test]
fn test_collapse_keeps_pending_transformations() {
    let (mut doc, _, title) = post();
    doc.transform(title, Priority::Default, |_, _| Ok(Transformed::Delete));
    doc.collapse(&["form"]);

    assert!(doc.contains(title));
    assert_eq!(doc.render(), r#"<article data-b="post" data-c="article"></article>"#);
}

#[test]
fn test_appending_to_collapsed_document() {
    let mut doc = Document::parse("<p>a</p>");
    doc.collapse(&["binding"]).append("<p>b</p>");

    assert_eq!(doc.render(), "<p>a</p><p>b</p>");
}

#[test]
fn test_node_html_and_text() {
    let (doc, post, title) = post();

    assert_eq!(doc.node_html(title), "x");
    assert_eq!(doc.node_text(post), "x");
    assert_eq!(
        doc.node_html(post),
        r#"<h1 data-b="title" data-c="article">x</h1>"#
    );
    assert_eq!(doc.node_to_html(post), POST_RENDERED);
}
