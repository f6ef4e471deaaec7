mod common;

use common::{sqlite, RecordingDatabase};
use semwiki_cache::CacheStats;
use semwiki_store::schema::ID_TABLE;
use semwiki_store::{Condition, Database, EntityIdCache};
use semwiki_types::{EntityDescriptor, NS_MAIN};
use std::sync::Arc;

fn insert_entity(db: &dyn Database, id: i64, title: &str) {
    db.insert(
        ID_TABLE,
        &[
            ("smw_id", id.into()),
            ("smw_namespace", NS_MAIN.into()),
            ("smw_title", title.into()),
            ("smw_sortkey", title.into()),
        ],
    )
    .unwrap();
}

fn cache_over(db: Arc<dyn Database>) -> (EntityIdCache, Arc<RecordingDatabase>) {
    let recorder = RecordingDatabase::new(db);
    (EntityIdCache::new(recorder.clone(), 100), recorder)
}

#[test]
fn test_saved_entity_is_served_from_cache() {
    let (cache, recorder) = cache_over(sqlite());
    cache.save_to_cache(1234, "Foo#0##");

    for _ in 0..3 {
        let entity = cache.get_entity_for_id(1234).unwrap();
        assert_eq!(entity, Some(EntityDescriptor::page("Foo", NS_MAIN)));
    }

    let stats = cache.stats();
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 0);
    assert_eq!(recorder.select_count(), 0);
}

#[test]
fn test_unknown_id_queries_store_once_per_call() {
    let (cache, recorder) = cache_over(sqlite());

    assert_eq!(cache.get_entity_for_id(4242).unwrap(), None);
    assert_eq!(recorder.select_count(), 1);

    // Not negatively cached
    assert_eq!(cache.get_entity_for_id(4242).unwrap(), None);
    assert_eq!(recorder.select_count(), 2);
}

#[test]
fn test_batch_lookup_from_store() {
    let db = sqlite();
    insert_entity(db.as_ref(), 42, "Foo");
    let (cache, recorder) = cache_over(db);

    assert_eq!(cache.get_entities_for_ids(&[42]).unwrap(), vec!["Foo#0##"]);
    assert_eq!(recorder.select_count(), 1);

    // Now cached
    assert_eq!(cache.get_entities_for_ids(&[42]).unwrap(), vec!["Foo#0##"]);
    assert_eq!(recorder.select_count(), 1);
}

#[test]
fn test_batch_lookup_single_query_keeps_order() {
    let db = sqlite();
    insert_entity(db.as_ref(), 60, "Bar");
    insert_entity(db.as_ref(), 61, "Baz");
    let (cache, recorder) = cache_over(db);
    cache.save_to_cache(7, "Cached#0##");

    let encoded = cache.get_entities_for_ids(&[61, 999, 7, 60, 61]).unwrap();

    assert_eq!(
        encoded,
        vec!["Baz#0##", "Cached#0##", "Bar#0##", "Baz#0##"]
    );
    assert_eq!(recorder.select_count(), 1);
}

#[test]
fn test_batch_lookup_all_cached_issues_no_query() {
    let (cache, recorder) = cache_over(sqlite());
    cache.save_to_cache(1, "A#0##");
    cache.save_to_cache(2, "B#0##");

    assert_eq!(cache.get_entities_for_ids(&[2, 1]).unwrap(), vec!["B#0##", "A#0##"]);
    assert_eq!(cache.get_entities_for_ids(&[]).unwrap(), Vec::<String>::new());
    assert_eq!(recorder.select_count(), 0);
}

#[test]
fn test_delete_from_cache_unmasks_deletion() {
    let db = sqlite();
    insert_entity(db.as_ref(), 70, "Gone");
    let (cache, _recorder) = cache_over(db.clone());

    assert!(cache.get_entity_for_id(70).unwrap().is_some());

    db.delete(ID_TABLE, &[Condition::eq("smw_id", 70)]).unwrap();
    assert!(cache.get_entity_for_id(70).unwrap().is_some());

    cache.delete_from_cache(70);
    cache.delete_from_cache(70);
    assert_eq!(cache.get_entity_for_id(70).unwrap(), None);
}

#[test]
fn test_clear_resets_stats_and_requeries() {
    let db = sqlite();
    insert_entity(db.as_ref(), 80, "Foo");
    let (cache, recorder) = cache_over(db);

    cache.get_entity_for_id(80).unwrap();
    cache.get_entity_for_id(80).unwrap();
    assert_eq!(recorder.select_count(), 1);

    cache.clear();
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.count), (0, 0, 0));
    assert_eq!(stats, CacheStats { max: Some(100), ..CacheStats::default() });

    cache.get_entity_for_id(80).unwrap();
    assert_eq!(recorder.select_count(), 2);
}

#[test]
fn test_malformed_cached_entry_falls_back_to_store() {
    let db = sqlite();
    insert_entity(db.as_ref(), 90, "Real");
    let (cache, recorder) = cache_over(db);
    cache.save_to_cache(90, "garbage");

    let entity = cache.get_entity_for_id(90).unwrap();
    assert_eq!(entity, Some(EntityDescriptor::page("Real", NS_MAIN)));
    assert_eq!(recorder.select_count(), 1);
}
