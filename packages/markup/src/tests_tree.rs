use crate::{parse, MarkupKind, Whitespace};

#[test]
fn test_fragment_is_not_wrapped() {
    let markup = parse("<div>foo</div>");

    let roots: Vec<_> = markup.roots().collect();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].name(), Some("div"));
    assert_eq!(markup.to_html(Whitespace::Preserve), "<div>foo</div>");
}

#[test]
fn test_attributes_keep_source_order() {
    let markup = parse(r#"<div id="main" class="container" binding="post">Test</div>"#);
    let div = markup.roots().next().unwrap();

    let names: Vec<_> = div.attributes().iter().map(|attr| attr.name.as_str()).collect();
    assert_eq!(names, vec!["id", "class", "binding"]);
    assert_eq!(div.attribute("binding"), Some("post"));
    assert!(!div.has_attribute("missing"));
}

#[test]
fn test_parent_lookup() {
    let markup = parse("<article><div><h1 binding=\"title\">x</h1></div></article>");
    let h1 = markup
        .roots()
        .next()
        .unwrap()
        .descendants()
        .find(|node| node.name() == Some("h1"))
        .unwrap();

    let ancestors: Vec<_> = h1.ancestors().filter_map(|node| node.name()).collect();
    assert_eq!(ancestors, vec!["div", "article"]);
}

#[test]
fn test_void_elements_do_not_nest() {
    let markup = parse("<div><br><img src=\"a.png\"><span>x</span></div>");
    let div = markup.roots().next().unwrap();

    let children: Vec<_> = div.children().filter_map(|node| node.name()).collect();
    assert_eq!(children, vec!["br", "img", "span"]);
    assert_eq!(
        markup.to_html(Whitespace::Preserve),
        "<div><br><img src=\"a.png\"><span>x</span></div>"
    );
}

#[test]
fn test_stray_end_tags_are_ignored() {
    let markup = parse("<div>foo</span></div><p>bar</p>");
    assert_eq!(markup.to_html(Whitespace::Preserve), "<div>foo</div><p>bar</p>");
}

#[test]
fn test_unclosed_elements_stay_unclosed() {
    let markup = parse("<div><p>foo");
    let p = markup.roots().next().unwrap().children().next().unwrap();

    assert_eq!(p.name(), Some("p"));
    assert_eq!(p.raw_close(), None);
    assert_eq!(markup.to_html(Whitespace::Preserve), "<div><p>foo");
}

#[test]
fn test_stray_end_tag_inside_text_is_kept() {
    let source = "<div>a</span>b</div>";
    let markup = parse(source);
    let div = markup.roots().next().unwrap();

    assert_eq!(div.children().count(), 1);
    assert_eq!(div.children().next().unwrap().text(), Some("ab"));
    assert_eq!(markup.to_html(Whitespace::Preserve), source);
}

#[test]
fn test_doctype_and_comments() {
    let markup = parse("<!DOCTYPE html><!-- @container main --><html></html>");

    assert_eq!(markup.doctype(), Some("html"));
    let kinds: Vec<_> = markup.roots().map(|node| node.kind().clone()).collect();
    assert!(matches!(kinds[1], MarkupKind::Comment(ref text) if text == " @container main "));
    assert_eq!(
        markup.to_html(Whitespace::Preserve),
        "<!DOCTYPE html><!-- @container main --><html></html>"
    );
}

#[test]
fn test_script_content_is_raw() {
    let source = "<script>if (a < b && c) { run(\"<div>\"); }</script>";
    let markup = parse(source);

    let script = markup.roots().next().unwrap();
    assert_eq!(script.children().count(), 1);
    assert_eq!(markup.to_html(Whitespace::Preserve), source);
}

#[test]
fn test_character_references_keep_their_source() {
    let source = "<p>a&nbsp;b &copy; &#169; &amp;</p>";
    let markup = parse(source);
    let p = markup.roots().next().unwrap();

    assert_eq!(
        p.children().next().unwrap().text(),
        Some("a\u{a0}b \u{a9} \u{a9} &")
    );
    assert_eq!(markup.to_html(Whitespace::Preserve), source);
    assert_eq!(markup.to_html(Whitespace::DropBlank), source);
}

#[test]
fn test_valueless_attributes_stay_bare() {
    let source = r#"<input disabled><input checked="" value=""><img alt="">"#;
    let markup = parse(source);
    let inputs: Vec<_> = markup.roots().collect();

    let disabled = &inputs[0].attributes()[0];
    assert!(disabled.valueless);
    assert_eq!(disabled.value, "");
    assert!(!inputs[1].attributes()[0].valueless);
    assert_eq!(markup.to_html(Whitespace::Preserve), source);
}

#[test]
fn test_quotes_and_casing_survive() {
    let source = concat!(
        r#"<div onclick="f('x')" data-q='say "hi"'>x</div>"#,
        r#"<svg viewBox="0 0 10 10"><clipPath id="c"></clipPath><path d="M0 0"/></svg>"#,
        "<DIV Class=plain>y</DIV>",
    );
    let markup = parse(source);
    let svg = markup.roots().nth(1).unwrap();

    assert_eq!(svg.name(), Some("svg"));
    assert_eq!(svg.attributes()[0].name, "viewBox");
    assert_eq!(svg.attribute("viewbox"), Some("0 0 10 10"));
    assert_eq!(markup.to_html(Whitespace::Preserve), source);
}

#[test]
fn test_synthesized_markup_is_escaped() {
    let mut markup = parse(r#"<p title="it's">x</p>"#);
    // Dropping the source forces serialization from decoded values.
    markup.source.clear();

    assert_eq!(markup.to_html(Whitespace::Preserve), r#"<p title="it's">x</p>"#);
}

#[test]
fn test_text_is_reescaped() {
    let markup = parse("<p>fish &amp; chips &lt;3</p>");
    let p = markup.roots().next().unwrap();

    assert_eq!(p.children().next().unwrap().text(), Some("fish & chips <3"));
    assert_eq!(markup.to_html(Whitespace::Preserve), "<p>fish &amp; chips &lt;3</p>");
}

#[test]
fn test_blank_text_is_dropped_outside_pre() {
    let markup = parse("<div>\n  <span>a b</span>\n</div><pre>  </pre>");

    assert_eq!(
        markup.to_html(Whitespace::DropBlank),
        "<div><span>a b</span></div><pre>  </pre>"
    );
    assert_eq!(
        markup.to_html(Whitespace::Preserve),
        "<div>\n  <span>a b</span>\n</div><pre>  </pre>"
    );
}

#[test]
fn test_bogus_comments_round_trip() {
    let source = "<?xml version=\"1.0\"?><!--><p>x</p><![CDATA[y]]>";
    let markup = parse(source);

    assert_eq!(markup.to_html(Whitespace::Preserve), source);
}

#[test]
fn test_raw_text_may_look_like_markup() {
    let source = "<title>a <b> &amp; c</title><style>p > a { }</style><textarea><p></textarea>";
    let markup = parse(source);

    let title = markup.roots().next().unwrap();
    assert_eq!(title.children().next().unwrap().text(), Some("a <b> & c"));
    assert_eq!(markup.to_html(Whitespace::Preserve), source);
}

#[test]
fn test_split_character_tokens_are_merged() {
    let markup = parse("<p>a&amp;b\0c</p>");
    let p = markup.roots().next().unwrap();

    assert_eq!(p.children().count(), 1);
}
