mod common;

use common::{annotate, declare, page, property, store};
use semwiki_store::ObjectCollector;
use semwiki_types::{DataItem, SemanticData};

fn usage(store: &semwiki_store::SqlStore, key: &str) -> u64 {
    let id = store
        .id_table()
        .property_id(&property(key))
        .unwrap()
        .unwrap();
    store.statistics_table().usage_count(id).unwrap()
}

#[test]
fn test_update_replaces_previous_statements() {
    let store = store();
    annotate(&store, "Berlin", &[("Located_in", "Germany"), ("Twinned_with", "Paris")]);
    assert_eq!(usage(&store, "Twinned_with"), 1);

    annotate(&store, "Berlin", &[("Located_in", "Europe")]);

    assert_eq!(usage(&store, "Located_in"), 1);
    assert_eq!(usage(&store, "Twinned_with"), 0);
    assert_eq!(
        store
            .property_values(&page("Berlin"), &property("Located_in"))
            .unwrap(),
        vec![DataItem::WikiPage(page("Europe"))]
    );
}

#[test]
fn test_property_values_by_type() {
    let store = store();
    let long_text = "lorem ipsum ".repeat(20);
    let data = SemanticData::new(page("Berlin"))
        .with(property("Has_population"), DataItem::Number(3_800_000.0))
        .with(property("Has_motto"), DataItem::Blob(long_text.clone()))
        .with(property("Is_capital"), DataItem::Boolean(true))
        .with(property("Homepage"), DataItem::Uri("https://berlin.de".into()))
        .with(property("Located_in"), DataItem::WikiPage(page("Germany")))
        .with(property("Located_in"), DataItem::WikiPage(page("Europe")));
    store.update_data(&data).unwrap();

    let berlin = page("Berlin");
    let values = |key: &str| store.property_values(&berlin, &property(key)).unwrap();

    assert_eq!(values("Has_population"), vec![DataItem::Number(3_800_000.0)]);
    assert_eq!(values("Has_motto"), vec![DataItem::Blob(long_text)]);
    assert_eq!(values("Is_capital"), vec![DataItem::Boolean(true)]);
    assert_eq!(values("Homepage"), vec![DataItem::Uri("https://berlin.de".into())]);
    assert_eq!(
        values("Located_in"),
        vec![
            DataItem::WikiPage(page("Germany")),
            DataItem::WikiPage(page("Europe"))
        ]
    );
    assert!(values("Unknown_property").is_empty());
    assert_eq!(usage(&store, "Located_in"), 2);
}

#[test]
fn test_subobjects_are_linked_and_replaced() {
    let store = store();
    let mut data = SemanticData::new(page("Berlin"));
    data.subobject("district1")
        .add(property("Has_name"), DataItem::Blob("Mitte".into()));
    data.subobject("district2")
        .add(property("Has_name"), DataItem::Blob("Pankow".into()));
    store.update_data(&data).unwrap();

    assert_eq!(usage(&store, "_SOBJ"), 2);
    assert_eq!(usage(&store, "Has_name"), 2);
    assert_eq!(
        store
            .property_values(&page("Berlin").with_subobject("district2"), &property("Has_name"))
            .unwrap(),
        vec![DataItem::Blob("Pankow".into())]
    );

    let mut data = SemanticData::new(page("Berlin"));
    data.subobject("district1")
        .add(property("Has_name"), DataItem::Blob("Mitte".into()));
    store.update_data(&data).unwrap();

    assert_eq!(usage(&store, "_SOBJ"), 1);
    assert_eq!(usage(&store, "Has_name"), 1);
    assert_eq!(
        store.id_table().find_id(&page("Berlin").with_subobject("district2")).unwrap(),
        None
    );
    let stats = store.statistics_collector(true).do_collect().unwrap();
    assert_eq!(stats.subobjects, 1);
}

#[test]
fn test_delete_subject() {
    let store = store();
    annotate(&store, "Berlin", &[("Located_in", "Germany")]);
    annotate(&store, "Paris", &[("Located_in", "France")]);

    assert!(store.delete_subject(&page("Berlin")).unwrap());
    assert!(!store.delete_subject(&page("Atlantis")).unwrap());

    assert_eq!(usage(&store, "Located_in"), 1);
    assert!(store
        .property_values(&page("Berlin"), &property("Located_in"))
        .unwrap()
        .is_empty());
}

#[test]
fn test_predefined_type_mismatch_is_an_error() {
    let store = store();
    let data = SemanticData::new(page("Berlin"))
        .with(property("_ASKSI"), DataItem::Blob("four".into()));

    assert!(store.update_data(&data).is_err());
    // Rolled back with the failed transaction
    assert_eq!(store.id_table().find_id(&page("Berlin")).unwrap(), None);
}

#[test]
fn test_rebuild_restores_usage_counts() {
    let store = store();
    declare(&store, "Has_area", "_num");
    annotate(&store, "Berlin", &[("Located_in", "Germany"), ("Located_in", "Europe")]);
    annotate(&store, "Paris", &[("Located_in", "France")]);

    let stats_table = store.statistics_table();
    stats_table.delete_all().unwrap();
    let located_in = store.id_table().property_id(&property("Located_in")).unwrap().unwrap();
    stats_table.set_usage_count(located_in, 42).unwrap();

    let report = store.rebuild_property_statistics().unwrap();

    assert_eq!(usage(&store, "Located_in"), 3);
    assert_eq!(usage(&store, "_TYPE"), 1);
    assert_eq!(usage(&store, "Has_area"), 0);
    assert_eq!(report.uses, 4);
    // Located_in, Has_area and _TYPE
    assert_eq!(report.properties, 3);

    let unused = store.unused_properties_collector(true).get_results().unwrap();
    assert_eq!(unused.len(), 1);
}
