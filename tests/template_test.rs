use std::thread;

use wiseguy::actions::{from_key, insert, node_from_key, set_attr, set_text};
use wiseguy::{Context, Element, SubTemplate, Template, Transform, Value};

fn base() -> Template {
    Template::new(Element::new("div").with_attr("id", "main"))
        .with_transform(Transform::new(["title"], set_text("#main", from_key("title"))))
}

fn page() -> Template {
    let root = Element::new("html")
        .with_child(Element::new("head").with_child(Element::new("title")))
        .with_child(
            Element::new("body")
                .with_child(Element::new("h1").with_attr("id", "title"))
                .with_child(Element::new("div").with_attr("id", "body")),
        );
    Template::new(root)
        .with_transform(Transform::new(
            ["title"],
            set_text("title, #title", from_key("title")),
        ))
        .with_transform(Transform::new(["body"], insert("#body", node_from_key("body"))))
}

#[test]
fn test_render_base_template() {
    let template = base();
    let html = template
        .render(&Context::new().with("title", "Hello"))
        .unwrap();
    assert_eq!(html.trim(), r#"<div id="main">Hello</div>"#);

    let html = template.render(&Context::new()).unwrap();
    assert_eq!(html.trim(), r#"<div id="main"></div>"#);
}

#[test]
fn test_extend_resolves_from_child() {
    let child = SubTemplate::new().value("title", "Hello Mr Flibble");
    let extended = base().extend(&child).unwrap();

    assert!(extended.transforms().is_empty());
    let html = extended.render(&Context::new()).unwrap();
    assert_eq!(html.trim(), r#"<div id="main">Hello Mr Flibble</div>"#);
}

#[test_log::test]
fn test_extend_leaves_unknown_slots_pending() {
    let child = SubTemplate::new().value("title", "Wiki");
    let extended = page().extend(&child).unwrap();

    assert_eq!(extended.keys().into_iter().collect::<Vec<_>>(), vec!["body"]);

    let body = Element::new("p").with_text("Front page");
    let tree = extended
        .render_tree(&Context::new().with("body", body).with("title", "ignored"))
        .unwrap();
    assert_eq!(tree.select("h1").unwrap()[0].text(), Some("Wiki"));
    assert_eq!(tree.select("#body > p").unwrap()[0].text(), Some("Front page"));
}

#[test]
fn test_extend_does_not_mutate_inputs() {
    let template = page();
    let child = SubTemplate::new()
        .value("title", "Wiki")
        .with_transform(Transform::new(["title"], set_attr("h1", "class", from_key("title"))));

    let _ = template.extend(&child).unwrap();

    assert_eq!(template.transforms().len(), 2);
    assert!(template.root().select("h1").unwrap()[0].text().is_none());
    assert_eq!(child.transforms().len(), 1);
    assert!(!child.transforms()[0].is_fired());
}

#[test]
fn test_child_transform_wins_on_overlap() {
    let child = SubTemplate::new()
        .value("title", "Base title")
        .with_transform(Transform::new(
            ["heading"],
            set_text("#main", |ctx: &Context| Ok(format!("<{}>", ctx.text("heading")?))),
        ));
    let extended = base().extend(&child).unwrap();

    // The base transform already ran at extend time; the child's runs at render.
    let html = extended
        .render(&Context::new().with("heading", "Child"))
        .unwrap();
    assert_eq!(html.trim(), r#"<div id="main">&lt;Child&gt;</div>"#);

    // Both resolved in the same pass: the child's transform runs last.
    let child = SubTemplate::new().with_transform(Transform::new(
        ["title"],
        set_text("#main", |ctx: &Context| Ok(ctx.text("title")?.to_uppercase())),
    ));
    let extended = base().extend(&child).unwrap();
    let html = extended
        .render(&Context::new().with("title", "shout"))
        .unwrap();
    assert_eq!(html.trim(), r#"<div id="main">SHOUT</div>"#);
}

#[test]
fn test_extend_keeps_partial_resolution() {
    let base = Template::new(Element::new("title")).with_transform(Transform::new(
        ["page", "site"],
        set_text("title", |ctx: &Context| {
            Ok(format!("{} - {}", ctx.text("page")?, ctx.text("site")?))
        }),
    ));
    let child = SubTemplate::new().value("site", "My Wiki");
    let extended = base.extend(&child).unwrap();

    assert_eq!(extended.keys().into_iter().collect::<Vec<_>>(), vec!["page"]);
    for name in ["Home", "About"] {
        let html = extended.render(&Context::new().with("page", name)).unwrap();
        assert_eq!(html.trim(), format!("<title>{} - My Wiki</title>", name));
    }
}

#[test]
fn test_renders_do_not_cross_contaminate() {
    let template = page();
    let first = Context::new()
        .with("title", "One")
        .with("body", Element::new("p").with_text("first"));
    let second = Context::new().with("title", "Two");

    let a = template.render(&first).unwrap();
    let b = template.render(&second).unwrap();
    let a_again = template.render(&first).unwrap();

    assert_eq!(a, a_again);
    assert!(!b.contains("first"));
    assert!(b.contains("<div id=\"body\"></div>"));
    assert_eq!(b, page().render(&second).unwrap());
}

#[test]
fn test_copy_isolation() {
    let template = page();
    let before = template.root().serialize(false);

    let mut copy = template.copy();
    copy.apply(&Context::new().with("title", "changed")).unwrap();

    assert_eq!(template.root().serialize(false), before);
    assert_eq!(template.transforms().len(), 2);
    assert_eq!(copy.transforms().len(), 1);
}

#[test]
fn test_nested_template_as_input() {
    let nav = Template::new(Element::new("a").with_attr("class", "home"))
        .with_transform(Transform::new(["url"], set_attr("a", "href", from_key("url"))));
    let nav_tree = nav.render_tree(&Context::new().with("url", "/")).unwrap();

    let html = page()
        .render(&Context::new().with("title", "T").with("body", nav_tree))
        .unwrap();
    assert!(html.contains("    <div id=\"body\">\n      <a class=\"home\" href=\"/\"></a>\n    </div>"));
}

#[test]
fn test_nested_template_slot_in_extend() {
    let sidebar = Template::new(Element::new("ul").with_attr("class", "tags"));
    let child = SubTemplate::new()
        .value("title", "Tagged")
        .template("body", sidebar);
    let extended = page().extend(&child).unwrap();

    assert!(extended.transforms().is_empty());
    let tree = extended.render_tree(&Context::new()).unwrap();
    assert_eq!(tree.select("#body > ul.tags").unwrap().len(), 1);
}

#[test]
fn test_concurrent_renders_share_definition() {
    let template = page();
    let outputs: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let template = &template;
                scope.spawn(move || {
                    template
                        .render(&Context::new().with("title", format!("Page {}", i)))
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, html) in outputs.iter().enumerate() {
        assert!(html.contains(&format!("<title>Page {}</title>", i)));
    }
    assert_eq!(template.transforms().len(), 2);
}

#[test]
fn test_render_report_flags_incomplete_render() {
    let report = page()
        .render_report(&Context::new().with("title", "Only title"))
        .unwrap();
    assert!(!report.is_complete());
    assert_eq!(report.pending.len(), 1);
    assert_eq!(report.pending[0].missing, vec!["body".to_string()]);
    assert!(report.markup(false).contains("Only title"));
}

#[test]
fn test_subtemplate_value_in_context() {
    let header = SubTemplate::new().value("site", "Wiki");
    let value = wiseguy::Slot::produce(&header, &Context::new()).unwrap();
    match value {
        Value::Map(map) => assert_eq!(map.text("site").unwrap(), "Wiki"),
        other => panic!("expected a map, got {:?}", other),
    }
}
