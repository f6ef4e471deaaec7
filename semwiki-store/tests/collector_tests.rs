mod common;

use common::{annotate, declare, page, property, recorded_store, sqlite, store};
use semwiki_cache::{CacheBackend, CacheError, CacheFactory, CacheKey, CacheStats};
use semwiki_store::property_tables::PropertyTableDefinition;
use semwiki_store::schema::ID_TABLE;
use semwiki_store::{
    CollectorCacheSettings, ObjectCollector, PropertyTables, Settings, SqlStore,
};
use semwiki_types::{
    ConceptDescription, DataItem, DataItemType, EntityDescriptor, PropertyOrError,
    PropertyUsage, RequestOptions, SemanticData, SortOrder, StringConditionKind, NS_CONCEPT,
    NS_PROPERTY,
};
use std::sync::Arc;
use std::time::Duration;

fn keys(results: &[PropertyUsage]) -> Vec<(String, u64)> {
    results
        .iter()
        .map(|usage| {
            let key = match &usage.property {
                PropertyOrError::Property(p) => p.key().to_string(),
                PropertyOrError::Error(e) => format!("!{}", e.title),
            };
            (key, usage.usage_count)
        })
        .collect()
}

fn find<'a>(results: &'a [PropertyUsage], key: &str) -> Option<&'a PropertyUsage> {
    results
        .iter()
        .find(|usage| usage.property.property().map(|p| p.key()) == Some(key))
}

/// A backend whose every operation fails
struct UnreachableCache;

impl CacheBackend for UnreachableCache {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn get(&self, _key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn set(&self, _key: CacheKey, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn delete(&self, _key: &CacheKey) -> Result<bool, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn clear(&self) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

fn with_statistics_cache(enabled: bool) -> Settings {
    Settings {
        statistics_cache: if enabled {
            CollectorCacheSettings::enabled()
        } else {
            CollectorCacheSettings::disabled()
        },
        ..Settings::default()
    }
}

#[test]
fn test_properties_lists_unused_property_with_zero() {
    let store = store();
    store
        .id_table()
        .make_property_id(&property("Has_nothing"))
        .unwrap();
    annotate(&store, "Berlin", &[("Located_in", "Germany")]);

    let results = store.properties_collector(false).get_results().unwrap();

    assert_eq!(find(&results, "Has_nothing").unwrap().usage_count, 0);
    assert_eq!(find(&results, "Located_in").unwrap().usage_count, 1);
}

#[test]
fn test_properties_skips_subobjects_of_property_pages() {
    let store = store();
    let id_table = store.id_table();
    id_table.make_property_id(&property("Has_area")).unwrap();
    id_table
        .make_id(&EntityDescriptor::new("Has_area", NS_PROPERTY, "", "unit"))
        .unwrap();

    let results = store.properties_collector(false).get_results().unwrap();

    let listed = results
        .iter()
        .filter(|usage| usage.property.property().map(|p| p.key()) == Some("Has_area"))
        .count();
    assert_eq!(listed, 1);
}

#[test]
fn test_properties_invalid_title_becomes_placeholder() {
    let store = store();
    store
        .connections()
        .primary()
        .insert(
            ID_TABLE,
            &[
                ("smw_namespace", NS_PROPERTY.into()),
                ("smw_title", "Broken[title".into()),
                ("smw_sortkey", "Broken[title".into()),
            ],
        )
        .unwrap();
    annotate(&store, "Berlin", &[("Located_in", "Germany")]);

    let results = store.properties_collector(false).get_results().unwrap();

    let placeholder = results
        .iter()
        .find(|usage| usage.property.is_error())
        .unwrap();
    assert_eq!(placeholder.usage_count, 0);
    match &placeholder.property {
        PropertyOrError::Error(error) => {
            assert_eq!(error.title, "Broken[title");
            assert_eq!(error.message.key, "smw_noproperty");
        }
        other => panic!("Expected placeholder, got {:?}", other),
    }
    assert!(find(&results, "Located_in").is_some());
}

#[test]
fn test_properties_ordered_by_sort_key_with_paging() {
    let store = store();
    for key in ["Zz_c", "Zz_a", "Zz_b"] {
        store.id_table().make_property_id(&property(key)).unwrap();
    }

    let mut collector = store.properties_collector(false);
    collector.set_request_options(
        RequestOptions::new().with_string_condition("Zz ", StringConditionKind::Prefix),
    );
    assert_eq!(
        keys(&collector.get_results().unwrap()),
        vec![("Zz_a".into(), 0), ("Zz_b".into(), 0), ("Zz_c".into(), 0)]
    );

    collector.set_request_options(
        RequestOptions::new()
            .with_string_condition("Zz", StringConditionKind::Prefix)
            .with_limit(2)
            .with_offset(1),
    );
    assert_eq!(
        keys(&collector.get_results().unwrap()),
        vec![("Zz_b".into(), 0), ("Zz_c".into(), 0)]
    );

    collector.set_request_options(
        RequestOptions::new()
            .with_string_condition("Zz", StringConditionKind::Prefix)
            .with_sort(SortOrder::Descending),
    );
    assert_eq!(
        keys(&collector.get_results().unwrap()),
        vec![("Zz_c".into(), 0), ("Zz_b".into(), 0), ("Zz_a".into(), 0)]
    );
}

#[test]
fn test_properties_cache_keyed_by_options() {
    let settings = Settings {
        properties_cache: CollectorCacheSettings::enabled(),
        ..Settings::default()
    };
    let store = SqlStore::open_in_memory(settings).unwrap();
    store.id_table().make_property_id(&property("Zz_a")).unwrap();

    let mut collector = store.properties_collector(false);
    let all = collector.get_results().unwrap();
    assert!(!collector.is_cached());

    collector.set_request_options(RequestOptions::new().with_limit(1));
    let first = collector.get_results().unwrap();
    assert!(!collector.is_cached());
    assert_eq!(first.len(), 1);
    assert!(all.len() > 1);

    assert_eq!(collector.get_results().unwrap(), first);
    assert!(collector.is_cached());
}

#[test]
fn test_wanted_counts_undeclared_properties() {
    let store = store();
    annotate(&store, "Berlin", &[("Located_in", "Germany"), ("Twinned_with", "Paris")]);
    annotate(&store, "Hamburg", &[("Located_in", "Germany"), ("Capital_of", "Hamburg")]);
    annotate(&store, "Paris", &[("Capital_of", "France")]);
    declare(&store, "Capital_of", "_wpg");

    let results = store.wanted_properties_collector(false).get_results().unwrap();

    assert_eq!(
        keys(&results),
        vec![("Located_in".into(), 2), ("Twinned_with".into(), 1)]
    );
}

#[test]
fn test_wanted_paging_follows_usage_order() {
    let store = store();
    annotate(
        &store,
        "Berlin",
        &[("Located_in", "Germany"), ("Twinned_with", "Paris"), ("Borders", "Poland")],
    );
    annotate(&store, "Hamburg", &[("Located_in", "Germany"), ("Borders", "Denmark")]);
    annotate(&store, "Munich", &[("Located_in", "Germany"), ("Adjacent_to", "Austria")]);

    let mut collector = store.wanted_properties_collector(false);
    assert_eq!(
        keys(&collector.get_results().unwrap()),
        vec![
            ("Located_in".into(), 3),
            ("Borders".into(), 2),
            ("Adjacent_to".into(), 1),
            ("Twinned_with".into(), 1),
        ]
    );

    collector.set_request_options(RequestOptions::new().with_limit(2).with_offset(1));
    assert_eq!(
        keys(&collector.get_results().unwrap()),
        vec![("Borders".into(), 2), ("Adjacent_to".into(), 1)]
    );

    collector.set_request_options(RequestOptions::new().with_limit(2).with_offset(3));
    assert_eq!(
        keys(&collector.get_results().unwrap()),
        vec![("Twinned_with".into(), 1)]
    );
}

#[test]
fn test_wanted_on_fixed_default_table_issues_no_query() {
    let tables = PropertyTables::new(vec![
        PropertyTableDefinition::fixed("smw_fpt_sobj", DataItemType::WikiPage, "_SOBJ"),
        PropertyTableDefinition::new("smw_di_blob", DataItemType::Blob),
    ]);
    let recorder = common::RecordingDatabase::new(sqlite());
    let store = SqlStore::builder(recorder.clone())
        .property_tables(tables)
        .build();
    store.install().unwrap();
    recorder.reset();

    let results = store.wanted_properties_collector(false).get_results().unwrap();

    assert!(results.is_empty());
    assert_eq!(recorder.select_count(), 0);
}

#[test]
fn test_wanted_on_shared_default_table_uses_join() {
    let (store, recorder) = recorded_store(Settings::default());
    annotate(&store, "Berlin", &[("Located_in", "Germany")]);
    recorder.reset();

    store.wanted_properties_collector(false).get_results().unwrap();

    assert_eq!(recorder.select_count(), 1);
    assert_eq!(recorder.joins(), 1);
}

#[test]
fn test_unused_lists_declared_properties_without_uses() {
    let store = store();
    declare(&store, "Capital_of", "_wpg");
    declare(&store, "Has_area", "_num");
    store.id_table().make_property_id(&property("Has_nothing")).unwrap();
    annotate(&store, "Paris", &[("Capital_of", "France")]);

    let results = store.unused_properties_collector(false).get_results().unwrap();
    let keys: Vec<_> = results
        .iter()
        .filter_map(|p| p.property().map(|p| p.key().to_string()))
        .collect();

    assert_eq!(keys, vec!["Has_area", "Has_nothing"]);
}

#[test]
fn test_unused_excludes_predefined_properties() {
    let store = store();
    let results = store.unused_properties_collector(false).get_results().unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_statistics_counters() {
    let store = store();
    declare(&store, "Has_population", "_num");

    let berlin = page("Berlin");
    let query = berlin.with_subobject("_QUERYa1");
    let mut data = SemanticData::new(berlin)
        .with(property("Has_population"), DataItem::Number(3_800_000.0))
        .with(property("_ASK"), DataItem::WikiPage(query));
    let sub = data.subobject("_QUERYa1");
    sub.add(property("_ASKSI"), DataItem::Number(4.0));
    sub.add(property("_ASKFO"), DataItem::Blob("table".into()));
    store.update_data(&data).unwrap();

    let concept = SemanticData::new(EntityDescriptor::page("Big_cities", NS_CONCEPT)).with(
        property("_CONC"),
        DataItem::Concept(ConceptDescription {
            description: "[[Has population::>1000000]]".into(),
            documentation: String::new(),
            features: 1,
            size: 1,
            depth: 1,
        }),
    );
    store.update_data(&concept).unwrap();

    let collector = store.statistics_collector(false);
    let stats = collector.get_results().unwrap();

    assert_eq!(stats.property_pages, 1);
    assert_eq!(stats.queries, 1);
    assert_eq!(stats.query_size, 4);
    assert_eq!(stats.query_formats.get("table"), Some(&1));
    assert_eq!(stats.concepts, 1);
    assert_eq!(stats.subobjects, 1);
    assert_eq!(stats.declared_properties, 1);
    // _TYPE, Has_population, _ASK, _SOBJ, _ASKSI, _ASKFO, _CONC
    assert_eq!(stats.used_properties, 7);
    assert_eq!(stats.property_uses, 7);

    assert_eq!(collector.used_properties_count().unwrap(), stats.used_properties);
    assert_eq!(collector.property_usage_count().unwrap(), stats.property_uses);
    assert_eq!(collector.query_formats_count().unwrap(), stats.query_formats);
}

#[test]
fn test_statistics_cache_enabled_returns_first_snapshot() {
    let store = SqlStore::open_in_memory(with_statistics_cache(true)).unwrap();
    let id = store.id_table().make_property_id(&property("Has_count")).unwrap();
    let stats_table = store.statistics_table();

    stats_table.set_usage_count(id, 1001).unwrap();
    let collector = store.statistics_collector(false);
    assert_eq!(collector.get_results().unwrap().property_uses, 1001);
    assert!(!collector.is_cached());

    stats_table.set_usage_count(id, 9001).unwrap();
    assert_eq!(collector.get_results().unwrap().property_uses, 1001);
    assert!(collector.is_cached());

    // Direct accessors bypass the cache
    assert_eq!(collector.property_usage_count().unwrap(), 9001);
}

#[test]
fn test_statistics_cache_disabled_recomputes() {
    let store = SqlStore::open_in_memory(with_statistics_cache(false)).unwrap();
    let id = store.id_table().make_property_id(&property("Has_count")).unwrap();
    let stats_table = store.statistics_table();

    stats_table.set_usage_count(id, 1001).unwrap();
    let collector = store.statistics_collector(false);
    assert_eq!(collector.get_results().unwrap().property_uses, 1001);

    stats_table.set_usage_count(id, 9001).unwrap();
    assert_eq!(collector.get_results().unwrap().property_uses, 9001);
    assert!(!collector.is_cached());
}

#[test]
fn test_statistics_shared_cache_across_stores() {
    for enabled in [true, false] {
        let caches = Arc::new(CacheFactory::new());
        let build = |count: u64| {
            let store = SqlStore::builder(sqlite())
                .settings(with_statistics_cache(enabled))
                .cache_factory(caches.clone())
                .build();
            let id = store.id_table().make_property_id(&property("Has_count")).unwrap();
            store.statistics_table().set_usage_count(id, count).unwrap();
            store
        };

        let a = build(1001);
        let b = build(9001);

        let first = a.statistics_collector(false);
        assert_eq!(first.get_results().unwrap().property_uses, 1001);

        let second = b.statistics_collector(false);
        let expected = if enabled { 1001 } else { 9001 };
        assert_eq!(second.get_results().unwrap().property_uses, expected);
        assert_eq!(second.is_cached(), enabled);
    }
}

#[test]
fn test_repeated_results_are_identical_without_cache() {
    let store = SqlStore::open_in_memory(with_statistics_cache(false)).unwrap();
    declare(&store, "Capital_of", "_wpg");
    annotate(&store, "Paris", &[("Capital_of", "France"), ("Located_in", "Europe")]);

    let statistics = store.statistics_collector(false);
    assert_eq!(statistics.get_results().unwrap(), statistics.get_results().unwrap());

    let properties = store.properties_collector(false);
    assert_eq!(properties.get_results().unwrap(), properties.get_results().unwrap());

    let wanted = store.wanted_properties_collector(false);
    assert_eq!(wanted.get_results().unwrap(), wanted.get_results().unwrap());
}

#[test]
fn test_clear_cache_forces_recompute() {
    let store = SqlStore::open_in_memory(with_statistics_cache(true)).unwrap();
    let collector = store.statistics_collector(false);

    collector.get_results().unwrap();
    collector.get_results().unwrap();
    assert!(collector.is_cached());

    assert!(collector.clear_cache());
    collector.get_results().unwrap();
    assert!(!collector.is_cached());

    let metrics = store
        .metrics()
        .snapshots()
        .into_iter()
        .find(|snapshot| snapshot.collector == "statistics")
        .unwrap();
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.misses, 2);
    assert_eq!(metrics.executions, 2);
}

#[test]
fn test_unknown_cache_type_degrades_to_recompute() {
    let settings = Settings {
        cache_type: "memcached".into(),
        ..with_statistics_cache(true)
    };
    let store = SqlStore::open_in_memory(settings).unwrap();
    let collector = store.statistics_collector(false);

    collector.get_results().unwrap();
    collector.get_results().unwrap();
    assert!(!collector.is_cached());
}

#[test]
fn test_failing_cache_backend_degrades_to_recompute() {
    let settings = Settings {
        cache_type: "unreachable".into(),
        ..with_statistics_cache(true)
    };
    let store = SqlStore::builder(sqlite()).settings(settings).build();
    store
        .cache_factory()
        .register("unreachable", Arc::new(UnreachableCache));
    let id = store.id_table().make_property_id(&property("Has_count")).unwrap();
    store.statistics_table().set_usage_count(id, 12).unwrap();

    let collector = store.statistics_collector(false);
    assert_eq!(collector.get_results().unwrap().property_uses, 12);
    assert!(!collector.is_cached());
    assert_eq!(collector.get_results().unwrap().property_uses, 12);
    assert!(!collector.is_cached());
    assert!(!collector.clear_cache());

    let metrics = store
        .metrics()
        .snapshots()
        .into_iter()
        .find(|snapshot| snapshot.collector == "statistics")
        .unwrap();
    // A failed read and a failed write per call
    assert_eq!(metrics.cache_failures, 4);
    assert_eq!(metrics.hits, 0);
    assert_eq!(metrics.executions, 2);
}

#[test]
fn test_prefixed_tables() {
    let settings = Settings {
        table_prefix: "wiki1_".into(),
        ..Settings::default()
    };
    let store = SqlStore::open_in_memory(settings).unwrap();
    annotate(&store, "Berlin", &[("Located_in", "Germany")]);

    let wanted = store.wanted_properties_collector(false).get_results().unwrap();
    assert_eq!(keys(&wanted), vec![("Located_in".into(), 1)]);

    let unused = store.unused_properties_collector(false).get_results().unwrap();
    assert!(unused.is_empty());
}
