//! Nested snapshot export

use serde_json::{json, Value};

use bktree::{Bits, ExportNode, Point, Tree, TreeError, Word};

fn count_nodes(node: &ExportNode) -> usize {
    1 + node.children.values().map(count_nodes).sum::<usize>()
}

#[test]
fn given_word_tree_when_exporting_then_nests_children_by_distance() {
    let tree: Tree<Word> = ["book", "books", "cake", "boo", "cape"]
        .into_iter()
        .map(Word::from)
        .collect();

    let value: Value = serde_json::from_str(&tree.to_json().unwrap()).unwrap();

    assert_eq!(
        value,
        json!(["book", {
            "1": ["books", {"2": ["boo", {}]}],
            "4": ["cake", {"1": ["cape", {}]}]
        }])
    );
}

#[test]
fn given_tree_when_exporting_then_snapshot_holds_every_node() {
    let tree: Tree<Point> = (-20..20).map(|i| Point(i * 3)).collect();
    let exported = tree.export().unwrap();
    assert_eq!(count_nodes(&exported), tree.len());
}

#[test]
fn given_children_when_exporting_then_keys_are_in_ascending_order() {
    let tree: Tree<Point> = [0, 9, 1, 5, 3].into_iter().map(Point).collect();

    let json = tree.to_json().unwrap();

    assert_eq!(
        json,
        r#"["0",{"1":["1",{}],"3":["3",{}],"5":["5",{}],"9":["9",{}]}]"#
    );
}

#[test]
fn given_custom_describe_when_exporting_then_uses_description() {
    let tree: Tree<Bits> = [Bits(0), Bits(3)].into_iter().collect();
    assert_eq!(
        tree.to_json().unwrap(),
        r#"["0x0000000000000000",{"2":["0x0000000000000003",{}]}]"#
    );
}

#[test]
fn given_pretty_flag_when_exporting_then_same_document() {
    let tree: Tree<Word> = ["a", "ab", "abc"].into_iter().map(Word::from).collect();
    let compact: Value = serde_json::from_str(&tree.to_json().unwrap()).unwrap();
    let pretty_text = tree.to_json_pretty().unwrap();
    let pretty: Value = serde_json::from_str(&pretty_text).unwrap();

    assert!(pretty_text.contains('\n'));
    assert_eq!(compact, pretty);
}

#[test]
fn given_empty_tree_when_exporting_then_empty_tree_error() {
    let tree: Tree<Word> = Tree::new();
    assert!(matches!(tree.to_json_pretty(), Err(TreeError::EmptyTree)));
}

#[test]
fn given_word_tree_when_rendering_text_then_lines_follow_structure() {
    let tree: Tree<Word> = ["book", "books", "boo"].into_iter().map(Word::from).collect();

    let rendered = tree.to_text_tree().unwrap().to_string();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "book");
    assert!(lines[1].ends_with("[1] books"));
    assert!(lines[2].ends_with("[2] boo"));
}
