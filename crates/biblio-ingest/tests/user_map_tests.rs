//! User mapping configuration applied across the whole mapping pipeline.

use biblio_ingest::{DriverConfig, SourceMapper, UserMap, Wanted};
use biblio_model::{EntryStore, Value, Warnings};

fn map_with(user_json: &str, xml: &str) -> (EntryStore, Warnings) {
    let driver = DriverConfig::rdfxml();
    let user = UserMap::from_json(user_json).unwrap();
    let mapper = SourceMapper::new(&driver, Some(&user));
    let doc = biblio_xml::parse(xml).unwrap();
    let mut store = EntryStore::new();
    let mut warnings = Warnings::new();
    mapper.extract(&doc, Wanted::All, &mut store, &mut warnings);
    (store, warnings)
}

#[test]
fn test_global_rule_redirects_target_keeping_handler() {
    let (store, _) = map_with(
        r#"{ "globalfield": { "pages": "pagetotal" } }"#,
        r#"<collection>
             <entry about="k" type="book"><pages>1-10</pages></entry>
           </collection>"#,
    );

    let entry = store.get("k").unwrap();
    assert!(!entry.has_field("pages"));
    // Still parsed by the range handler, not rendered down to a literal.
    let ranges = entry.field("pagetotal").and_then(Value::as_ranges).unwrap();
    assert_eq!(ranges.len(), 1);
}

#[test]
fn test_user_entrytype_rule_beats_driver_alias() {
    let (store, _) = map_with(
        r#"{ "entrytype": { "webpage": "electronic" } }"#,
        r#"<collection>
             <entry about="k" type="webpage"><title>T</title></entry>
           </collection>"#,
    );
    assert_eq!(store.get("k").unwrap().entrytype(), "electronic");
}

#[test]
fn test_occupied_destination_skip_keeps_first_value() {
    let (store, warnings) = map_with(
        r#"{
            "globalfield": {
                "shorttitle": { "also_set": [{ "field": "note", "value": "first" }] },
                "edition": { "also_set": [{ "field": "note", "value": "second" }] }
            }
        }"#,
        r#"<collection>
             <entry about="k" type="book">
               <shortTitle>S</shortTitle>
               <edition>2</edition>
             </entry>
           </collection>"#,
    );

    let entry = store.get("k").unwrap();
    assert_eq!(
        entry.field("note").and_then(Value::as_literal),
        Some("first")
    );
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_occupied_destination_overwrite_takes_last_value() {
    let (store, warnings) = map_with(
        r#"{
            "globalfield": {
                "shorttitle": { "also_set": [{ "field": "note", "value": "first" }] },
                "edition": { "also_set": [{ "field": "note", "value": "second" }] }
            },
            "overwrite": true
        }"#,
        r#"<collection>
             <entry about="k" type="book">
               <shortTitle>S</shortTitle>
               <edition>2</edition>
             </entry>
           </collection>"#,
    );

    let entry = store.get("k").unwrap();
    assert_eq!(
        entry.field("note").and_then(Value::as_literal),
        Some("second")
    );
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_origfield_sentinel_records_raw_tag() {
    let (store, _) = map_with(
        r#"{
            "globalfield": {
                "librarycatalog": { "also_set": [{ "field": "note", "value": "ORIGFIELD" }] }
            }
        }"#,
        r#"<collection>
             <entry about="k" type="book">
               <libraryCatalog>Some OPAC</libraryCatalog>
             </entry>
           </collection>"#,
    );

    let entry = store.get("k").unwrap();
    assert_eq!(
        entry.field("note").and_then(Value::as_literal),
        Some("librarycatalog")
    );
}

#[test]
fn test_null_on_container_tag_suppresses_synthesis() {
    let (store, _) = map_with(
        r#"{ "globalfield": { "ispartof": "NULL" } }"#,
        r#"<collection>
             <entry about="k" type="book">
               <title>T</title>
               <isPartOf>
                 <entry type="series"><title>S</title></entry>
               </isPartOf>
             </entry>
           </collection>"#,
    );

    // No pointer and no orphaned synthetic entry.
    assert_eq!(store.len(), 1);
    assert!(!store.get("k").unwrap().has_field("crossref"));
}

#[test]
fn test_blocked_crossref_field_suppresses_synthesis() {
    let (store, _) = map_with(
        r#"{
            "globalfield": {
                "title": { "also_set": [{ "field": "crossref", "value": "NULL" }] }
            }
        }"#,
        r#"<collection>
             <entry about="k" type="book">
               <title>T</title>
               <isPartOf>
                 <entry type="series"><title>S</title></entry>
               </isPartOf>
             </entry>
           </collection>"#,
    );

    assert_eq!(store.len(), 1);
    assert!(!store.get("k").unwrap().has_field("crossref"));
}

#[test]
fn test_null_blocks_later_also_set_writes() {
    let (store, _) = map_with(
        r#"{
            "globalfield": {
                "shorttitle": "NULL",
                "edition": { "also_set": [{ "field": "shorttitle", "value": "sneaky" }] }
            }
        }"#,
        r#"<collection>
             <entry about="k" type="book">
               <shortTitle>S</shortTitle>
               <edition>2</edition>
             </entry>
           </collection>"#,
    );

    assert!(!store.get("k").unwrap().has_field("shorttitle"));
}
