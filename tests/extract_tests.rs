#![allow(clippy::panic_in_result_fn)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use std::fs::{self, File};
use std::io::BufReader;

use xmlharvest::{extract_str, ErrorKind, Fragment, Selector, XmlReader};

const CATALOG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/input/catalog.xml");
const CATALOG_EXPECTED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/input/catalog.expected");

const ENTRIES: [&str; 3] = [
    "<entry name='orange' id='entry_1'><title>ORANGE</title><description>みかんみかんみかんみかん\n\
     オレンジオレンジオレンジ\n\
     ORANGEORANGEORANGE</description><img src='http://www.example.com/orange.jpg'></img></entry>",
    "<entry name='apple' id='entry_2'><title>APPLE</title><description>りんごりんごりんごりんご\n\
     アップルアップルアップル\n\
     APPLEAPPLEAPPLE</description><img src='http://www.example.com/apple.jpg'></img></entry>",
    "<entry name='strawberry' id='entry_1'><title>STRAWBERRY</title><description>いちごいちごいちご\n\
     ストロベリーストロベリーストロベリー\n\
     STRAWBERRY</description><img src='http://www.example.com/strawberry.jpg'></img></entry>",
];

const JAPANESE_FOODS: [&str; 4] = [
    "<food genre='japanese'>蕎麦</food>",
    "<food genre='japanese'>寿司</food>",
    "<food genre='japanese'>しゃぶしゃぶ</food>",
    "<food genre='japanese'>天ぷら</food>",
];

fn read_test_file(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|_| panic!("Failed to read file: {}", path))
}

fn extract(expression: &str) -> Vec<String> {
    let xml = read_test_file(CATALOG);
    extract_str(&xml, expression)
        .unwrap_or_else(|e| panic!("{expression}: {e}"))
        .into_iter()
        .map(Fragment::into_string)
        .collect()
}

fn data(kind: &str, prefix: &str) -> String {
    format!(
        "<data type='{kind}'><header>{prefix}-header</header><body>{prefix}-body</body>\
         <footer>{prefix}-footer</footer></data>"
    )
}

fn content(class: &str, a: &str, b: &str) -> String {
    format!("<content class='{class}'>{}{}</content>", data("A", a), data("B", b))
}

#[test]
fn test_unknown_root_yields_nothing() {
    assert!(extract("/unknonw").is_empty());
}

#[test]
fn test_exact_and_descendant_entries() {
    assert_eq!(extract("/test/entries/entry"), ENTRIES);
    assert_eq!(extract("//entry"), ENTRIES);
}

#[test]
fn test_items_in_document_order() {
    assert_eq!(
        extract("//item"),
        vec![
            "<item color='green'><title>ITEM-1</title></item>",
            "<item color='red'><title>ITEM-2</title></item>",
            "<item color='blue'></item>",
        ]
    );
}

#[test]
fn test_food_predicate_under_every_path_form() {
    for expression in [
        "/test/data/foods/food[@genre='japanese']",
        "/test//foods/food[@genre='japanese']",
        "/test//food[@genre='japanese']",
        "//food[@genre='japanese']",
    ] {
        assert_eq!(extract(expression), JAPANESE_FOODS, "{expression}");
    }
}

#[test]
fn test_content_class_bar() {
    assert_eq!(
        extract("//content[@class='bar']"),
        vec![
            content("bar", "bar-A-1", "bar-B-1"),
            content("bar", "yyy:bar-A", "yyy:bar-B"),
            content("bar", "zzz:bar-A", "zzz:bar-B"),
            content("bar", "bar-A-2", "bar-B-2"),
        ]
    );
}

#[test]
fn test_nested_gaps_with_predicates() {
    assert_eq!(
        extract("//contents//data[@type='A']"),
        vec![
            data("A", "foo-A-1"),
            data("A", "xxx:foo-A"),
            data("A", "bar-A-1"),
            data("A", "yyy:bar-A"),
            data("A", "foo-A-2"),
            data("A", "zzz:bar-A"),
            data("A", "bar-A-2"),
        ]
    );

    let yyy = vec![data("B", "yyy:bar-B")];
    assert_eq!(
        extract("//contents/group[@domain='yyy']/content/data[@type='B']"),
        yyy
    );
    assert_eq!(
        extract("//contents/group[@domain='yyy']//data[@type='B']"),
        yyy
    );
}

#[test]
fn test_predicate_value_with_slashes() {
    assert_eq!(
        extract("//ref[@src='http://www.example.com/ref2']"),
        vec!["<ref src='http://www.example.com/ref2' title='REF2'></ref>"]
    );
}

#[test]
fn test_whole_document() {
    let expected = read_test_file(CATALOG_EXPECTED);
    let expected = expected.trim_end();
    for expression in ["/test", "/", "//", "/*"] {
        assert_eq!(extract(expression), vec![expected], "{expression}");
    }
}

#[test]
fn test_streams_from_file_reader() -> Result<(), Box<dyn std::error::Error>> {
    let selector = Selector::compile("/test/data/venus/venu/name")?;
    let reader = XmlReader::from_reader(BufReader::new(File::open(CATALOG)?));
    let names = selector
        .extract(reader)
        .collect::<xmlharvest::Result<Vec<_>>>()?;

    assert_eq!(
        names,
        vec![
            "<name>ZEPP Tokyo</name>",
            "<name>STUDIO COAST</name>",
            "<name>WWW</name>",
            "<name>O-EAST</name>",
        ]
    );
    Ok(())
}

#[test]
fn test_truncated_document_yields_prefix_then_error() {
    let xml = read_test_file(CATALOG);
    let cut = xml.find("<item color=\"red\">").unwrap();
    let truncated = &xml[..cut];

    let selector = Selector::compile("//item").unwrap();
    let mut fragments = selector.extract(XmlReader::from_str(truncated));

    assert_eq!(
        fragments.next().map(|r| r.map(Fragment::into_string)),
        Some(Ok("<item color='green'><title>ITEM-1</title></item>".to_string()))
    );
    let err = fragments.next().unwrap().unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::TruncatedInput);
    assert!(err.is_fatal());
    assert!(fragments.next().is_none());
}

#[test]
fn test_syntax_error_ends_sequence() {
    let selector = Selector::compile("//v").unwrap();
    let mut fragments = selector.extract(XmlReader::from_str("<r><v>1</v><v>2</w></r>"));

    assert!(matches!(fragments.next(), Some(Ok(_))));
    let err = fragments.next().unwrap().unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Syntax);
    assert!(err.position().is_some());
    assert!(fragments.next().is_none());
}

#[test]
fn test_default_has_no_depth_limit() {
    let xml = format!("{}<leaf>x</leaf>{}", "<n>".repeat(200), "</n>".repeat(200));
    assert_eq!(extract_str(&xml, "//leaf").unwrap(), vec!["<leaf>x</leaf>"]);
}

#[test]
fn test_default_has_no_fragment_size_limit() {
    let body = "x".repeat(11 * 1024 * 1024);
    let xml = format!("<r><big>{body}</big></r>");
    let fragments = extract_str(&xml, "/r/big").unwrap();
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].as_str().len(), body.len() + "<big></big>".len());
}
