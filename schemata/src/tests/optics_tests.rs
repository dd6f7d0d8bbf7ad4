use crate::{optics_for, Ast, Element, Field, Interpreter, Lens, Step, Value};

fn order() -> Ast {
    let line = Ast::tuple(vec![
        Element::required(Ast::string()),
        Element::required(Ast::number()),
    ])
    .unwrap();
    Ast::struct_(vec![
        Field::required("id", Ast::string().min_length(1)),
        Field::required(
            "customer",
            Ast::struct_(vec![Field::required("name", Ast::string())]).unwrap(),
        ),
        Field::required("line", line),
        Field::optional("note", Ast::union(vec![Ast::string(), Ast::null()])),
    ])
    .unwrap()
    .identified("Order")
}

fn sample() -> Value {
    Value::object([
        ("id", Value::from("o-1")),
        ("customer", Value::object([("name", Value::from("Ada"))])),
        ("line", Value::Array(vec![Value::from("widget"), Value::from(2)])),
    ])
}

#[test]
fn test_tree_mirrors_structure() {
    let optics = optics_for(&order());
    let keys: Vec<&Step> = optics.children().keys().collect();
    assert_eq!(keys.len(), 4);
    assert!(optics.field("id").unwrap().is_leaf());
    assert!(optics.field("note").unwrap().is_leaf());
    assert!(optics.field("customer").unwrap().field("name").is_some());
    assert!(optics.field("line").unwrap().element(1).is_some());
}

#[test]
fn test_nested_lenses_focus_from_root() {
    let optics = Interpreter::new().optics_for(&order());
    let name = optics.field("customer").and_then(|c| c.field("name")).unwrap().lens();
    assert_eq!(name.get(&sample()), Some(&Value::from("Ada")));

    let quantity = optics.field("line").and_then(|l| l.element(1)).unwrap().lens();
    let updated = quantity.modify(&sample(), |_| Value::from(3)).unwrap();
    assert_eq!(quantity.get(&updated), Some(&Value::from(3)));
    assert_eq!(name.get(&updated), Some(&Value::from("Ada")));
}

#[test]
fn test_set_keeps_the_value_decodable() {
    let ast = order();
    let decoder = crate::decoder_for(&ast).unwrap();
    let note = optics_for(&ast).field("note").unwrap().lens().clone();
    let updated = note.set(&sample(), Value::Null).unwrap();
    assert!(decoder.decode(&updated).is_success());
}

#[test]
fn test_lazy_nodes_are_leaves() {
    let lazy = Ast::lazy(|this| {
        Ast::struct_(vec![Field::optional("next", this.clone())]).unwrap_or_else(|_| Ast::never())
    });
    assert!(optics_for(&lazy).is_leaf());
}

#[test]
fn test_nested_lens_is_composition_of_parent_and_child() {
    let ast = Ast::struct_(vec![
        Field::required("a", Ast::string()),
        Field::required(
            "b",
            Ast::struct_(vec![Field::required("c", Ast::number())]).unwrap(),
        ),
    ])
    .unwrap();
    let value = Value::object([
        ("a", Value::from("x")),
        ("b", Value::object([("c", Value::from(1))])),
    ]);
    let optics = optics_for(&ast);
    let b = optics.field("b").unwrap().lens();
    let bc = optics.field("b").unwrap().field("c").unwrap().lens();
    let c = Lens::key("c");

    assert_eq!(bc.get(&value), Some(&Value::from(1)));
    assert_eq!(bc.get(&value), b.get(&value).and_then(|inner| c.get(inner)));

    let composed = b.compose(&c);
    assert_eq!(composed.steps(), bc.steps());
    assert_eq!(composed.get(&value), bc.get(&value));
    assert_eq!(
        composed.set(&value, Value::from(2)),
        bc.set(&value, Value::from(2))
    );
    assert_eq!(
        bc.set(&value, Value::from(2)),
        Some(Value::object([
            ("a", Value::from("x")),
            ("b", Value::object([("c", Value::from(2))])),
        ]))
    );
}
