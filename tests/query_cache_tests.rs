//! Integration Tests for the Query Cache
//!
//! Put/get scenarios against a recording region: write ordering, cancellation
//! on failed writes, cache modes, usage errors, staleness and object graph
//! reconstruction.

use std::collections::BTreeMap;
use std::sync::Arc;

use l2cache::cache::{
    current_timestamp_ms, CacheEntry, CacheKey, CacheMode, CollectionCacheKey, EntityCacheEntry,
    Identifier, QueryCacheEntry, QueryCacheKey, QueryRow, TimestampCacheKey,
};
use l2cache::orm::{
    AssociationMetadata, CacheMetadata, CacheUsage, ClassMetadata, ManagedEntity,
    MetadataRegistry, ResultSetMapping, UnitOfWork,
};
use l2cache::query::{QueryCache, QueryResult};
use l2cache::region::{MemoryBackend, RecordedCall, RecordingRegion, Region, RegionOp, Regions};
use l2cache::{CacheConfig, CacheError, SecondLevelCache};
use serde_json::{json, Value};

// == Fixtures ==

fn metadata() -> Arc<MetadataRegistry> {
    let cached = |usage| CacheMetadata::new(usage);
    Arc::new(
        MetadataRegistry::new()
            .with(
                ClassMetadata::new("Country")
                    .with_field("name")
                    .with_association(AssociationMetadata::one_to_many(
                        "travelers",
                        "Traveler",
                        "country",
                    ))
                    .cached(cached(CacheUsage::ReadOnly)),
            )
            .with(
                ClassMetadata::new("State")
                    .with_field("name")
                    .with_association(AssociationMetadata::many_to_one("country", "Country"))
                    .with_association(AssociationMetadata::one_to_many("cities", "City", "state"))
                    .cached(cached(CacheUsage::NonstrictReadWrite)),
            )
            .with(
                ClassMetadata::new("City")
                    .with_field("name")
                    .with_association(AssociationMetadata::many_to_one("state", "State"))
                    .with_association(AssociationMetadata::one_to_many(
                        "attractions",
                        "Attraction",
                        "city",
                    ))
                    .cached(cached(CacheUsage::NonstrictReadWrite)),
            )
            .with(
                ClassMetadata::new("Attraction")
                    .with_field("name")
                    .with_association(AssociationMetadata::many_to_one("city", "City"))
                    .cached(cached(CacheUsage::NonstrictReadWrite)),
            )
            .with(
                ClassMetadata::new("Traveler")
                    .with_field("name")
                    .with_association(AssociationMetadata::many_to_one("country", "Country")),
            ),
    )
}

struct Fixture {
    uow: UnitOfWork,
    region: Arc<RecordingRegion>,
    regions: Arc<Regions>,
    query_cache: QueryCache,
}

fn fixture() -> Fixture {
    let metadata = metadata();
    let region = Arc::new(RecordingRegion::new("query_cache_region"));
    let regions = Arc::new(Regions::shared(
        region.clone(),
        Arc::new(RecordingRegion::new("timestamp_cache_region")),
    ));
    Fixture {
        uow: UnitOfWork::new(metadata.clone()),
        query_cache: QueryCache::new(region.clone(), regions.clone(), metadata),
        region,
        regions,
    }
}

fn fields(id: i64, name: &str) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("id".to_string(), json!(id)),
        ("name".to_string(), json!(name)),
    ])
}

fn id(value: i64) -> Identifier {
    BTreeMap::from([("id".to_string(), json!(value))])
}

fn countries(uow: &UnitOfWork, count: i64) -> Vec<ManagedEntity> {
    (1..=count)
        .map(|i| uow.create("Country", fields(i, &format!("Country {}", i))))
        .collect()
}

/// States 11.. each in their own country 1..
fn states_with_countries(uow: &UnitOfWork, count: i64) -> Vec<ManagedEntity> {
    (1..=count)
        .map(|i| {
            let country = uow.create("Country", fields(i, &format!("Country {}", i)));
            let state = uow.create("State", fields(10 + i, &format!("State {}", i)));
            state.set_reference("country", Some(country));
            state
        })
        .collect()
}

/// Bavaria with Munich (two attractions) and Wurzburg (one).
fn bavaria(uow: &UnitOfWork) -> ManagedEntity {
    let bavaria = uow.create("State", fields(2, "Bavaria"));
    let munich = uow.create("City", fields(3, "Munich"));
    let wurzburg = uow.create("City", fields(4, "Wurzburg"));
    for city in [&munich, &wurzburg] {
        city.set_reference("state", Some(bavaria.clone()));
        bavaria.add_to_collection("cities", city.clone());
    }
    for (id, name) in [(5, "Reinstoff"), (6, "Schneider Weisse")] {
        let attraction = uow.create("Attraction", fields(id, name));
        attraction.set_reference("city", Some(munich.clone()));
        munich.add_to_collection("attractions", attraction);
    }
    let fritz = uow.create("Attraction", fields(7, "Fischers Fritz"));
    fritz.set_reference("city", Some(wurzburg.clone()));
    wurzburg.add_to_collection("attractions", fritz);
    bavaria
}

fn put_calls(region: &RecordingRegion) -> Vec<RecordedCall> {
    region.calls_of(RegionOp::Put)
}

fn entity_class(call: &RecordedCall) -> Option<String> {
    match call.key() {
        Some(CacheKey::Entity(key)) => Some(key.entity_class().to_string()),
        _ => None,
    }
}

fn names(entities: &[ManagedEntity]) -> Vec<Value> {
    entities.iter().filter_map(|e| e.field("name")).collect()
}

// == Put ==

#[test]
fn test_put_basic_query_result() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    let result = countries(&f.uow, 4);

    assert_eq!(f.query_cache.put(&f.uow, &key, &rsm, &result), Ok(true));

    let puts = put_calls(&f.region);
    assert_eq!(puts.len(), 5);
    for call in &puts[..4] {
        assert_eq!(entity_class(call).as_deref(), Some("Country"));
        assert!(matches!(call.entry, Some(CacheEntry::Entity(_))));
    }
    assert_eq!(puts[4].key(), Some(&CacheKey::from(key.clone())));
    assert!(matches!(puts[4].entry, Some(CacheEntry::Query(_))));
    assert!(f.query_cache.contains(&key));
}

#[test]
fn test_put_to_one_association_query_result() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("State", "s")
        .add_joined_entity("Country", "c", "s", "country");
    let result = states_with_countries(&f.uow, 4);

    assert_eq!(f.query_cache.put(&f.uow, &key, &rsm, &result), Ok(true));

    let classes: Vec<Option<String>> = put_calls(&f.region).iter().map(entity_class).collect();
    let expected: Vec<Option<String>> = ["State", "Country"]
        .iter()
        .cycle()
        .take(8)
        .map(|c| Some(c.to_string()))
        .chain(std::iter::once(None))
        .collect();
    assert_eq!(classes, expected);
}

#[test]
fn test_put_skips_null_to_one_association() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("State", "s")
        .add_joined_entity("Country", "c", "s", "country");
    let result: Vec<_> = (1..=4)
        .map(|i| f.uow.create("State", fields(i, "Nowhere")))
        .collect();

    assert_eq!(f.query_cache.put(&f.uow, &key, &rsm, &result), Ok(true));
    assert_eq!(put_calls(&f.region).len(), 5);
}

#[test]
fn test_put_two_level_to_one_association() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("City", "c")
        .add_joined_entity("State", "s", "c", "state")
        .add_joined_entity("Country", "co", "s", "country");
    let result: Vec<_> = states_with_countries(&f.uow, 4)
        .into_iter()
        .enumerate()
        .map(|(i, state)| {
            let city = f.uow.create("City", fields(100 + i as i64, "City"));
            city.set_reference("state", Some(state));
            city
        })
        .collect();

    assert_eq!(f.query_cache.put(&f.uow, &key, &rsm, &result), Ok(true));

    let classes: Vec<Option<String>> = put_calls(&f.region).iter().map(entity_class).collect();
    assert_eq!(classes.len(), 13);
    assert_eq!(classes[0].as_deref(), Some("City"));
    assert_eq!(classes[1].as_deref(), Some("State"));
    assert_eq!(classes[2].as_deref(), Some("Country"));
    assert_eq!(classes[12], None);
}

#[test]
fn test_put_to_many_association() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("State", "s")
        .add_joined_entity("City", "c", "s", "cities");
    let result = vec![bavaria(&f.uow)];

    assert_eq!(f.query_cache.put(&f.uow, &key, &rsm, &result), Ok(true));

    let puts = put_calls(&f.region);
    let kinds: Vec<&str> = puts
        .iter()
        .map(|call| match call.key() {
            Some(CacheKey::Entity(_)) => "entity",
            Some(CacheKey::Collection(_)) => "collection",
            Some(CacheKey::Query(_)) => "query",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["entity", "entity", "entity", "collection", "query"]);
    assert_eq!(
        puts[3].key(),
        Some(&CacheKey::from(CollectionCacheKey::new("State", "cities", id(2))))
    );
}

#[test]
fn test_put_cancels_when_root_put_fails() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    let result = countries(&f.uow, 1);
    f.region.push_put_result(false);

    assert_eq!(f.query_cache.put(&f.uow, &key, &rsm, &result), Ok(false));
    assert_eq!(put_calls(&f.region).len(), 1);
    assert!(!f.query_cache.contains(&key));
}

#[test]
fn test_put_cancels_when_association_put_fails() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("State", "s")
        .add_joined_entity("Country", "c", "s", "country");
    let result = states_with_countries(&f.uow, 1);
    f.region.push_put_result(true);
    f.region.push_put_result(false);

    assert_eq!(f.query_cache.put(&f.uow, &key, &rsm, &result), Ok(false));
    assert_eq!(put_calls(&f.region).len(), 2);
    assert!(!f.query_cache.contains(&key));
}

#[test]
fn test_put_with_get_mode_is_skipped() {
    let f = fixture();
    let key = QueryCacheKey::with_mode("query.key1", 0, CacheMode::Get);
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");

    assert_eq!(f.query_cache.put(&f.uow, &key, &rsm, &countries(&f.uow, 2)), Ok(false));
    assert!(f.region.calls().is_empty());
}

#[test]
fn test_put_scalar_result_is_a_usage_error() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("Country", "c")
        .add_scalar_result("total");

    let result = f.query_cache.put(&f.uow, &key, &rsm, &countries(&f.uow, 1));
    assert_eq!(result, Err(CacheError::ScalarResults));
    assert_eq!(
        result.unwrap_err().to_string(),
        "Second level cache does not support scalar results."
    );
    assert!(put_calls(&f.region).is_empty());
}

#[test]
fn test_put_multiple_roots_is_a_usage_error() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("Country", "c")
        .add_root_entity("State", "s");

    let result = f.query_cache.put(&f.uow, &key, &rsm, &countries(&f.uow, 1));
    assert_eq!(result, Err(CacheError::MultipleRootEntities));
    assert!(put_calls(&f.region).is_empty());
}

#[test]
fn test_put_non_cacheable_root_is_a_usage_error() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new().add_root_entity("Traveler", "t");
    let result: Vec<_> = (0..4)
        .map(|i| f.uow.create("Traveler", fields(i, "Ada")))
        .collect();

    let outcome = f.query_cache.put(&f.uow, &key, &rsm, &result);
    assert_eq!(outcome, Err(CacheError::NonCacheableEntity("Traveler".to_string())));
    assert_eq!(
        outcome.unwrap_err().to_string(),
        "Entity \"Traveler\" not configured as part of the second-level cache."
    );
    assert!(f.region.calls().is_empty());
}

#[test]
fn test_put_non_cacheable_association_is_a_usage_error() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("Country", "c")
        .add_joined_entity("Traveler", "t", "c", "travelers");
    let result = countries(&f.uow, 1);
    result[0].add_to_collection("travelers", f.uow.create("Traveler", fields(1, "Ada")));

    assert_eq!(
        f.query_cache.put(&f.uow, &key, &rsm, &result),
        Err(CacheError::NonCacheableAssociation {
            class: "Country".to_string(),
            field: "travelers".to_string(),
        })
    );
    assert!(f.region.calls().is_empty());
}

#[test]
fn test_keys_scoped_to_their_mapping() {
    let f = fixture();
    let countries_only = ResultSetMapping::new().add_root_entity("Country", "c");
    let indexed = countries_only.clone().set_index_by("name");
    let plain_key = QueryCacheKey::new("query.key1", 0).with_mapping(&countries_only);
    let indexed_key = QueryCacheKey::new("query.key1", 0).with_mapping(&indexed);

    f.query_cache
        .put(&f.uow, &plain_key, &countries_only, &countries(&f.uow, 2))
        .unwrap();

    assert!(f.query_cache.contains(&plain_key));
    assert!(!f.query_cache.contains(&indexed_key));
    assert_eq!(f.query_cache.get(&f.uow, &indexed_key, &indexed), None);
    assert_eq!(
        f.query_cache.get(&f.uow, &plain_key, &countries_only).map(|r| r.len()),
        Some(2)
    );
}

#[test]
fn test_put_skips_cached_entities_unless_refresh() {
    let f = fixture();
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    let result = countries(&f.uow, 4);

    f.query_cache
        .put(&f.uow, &QueryCacheKey::new("query.key1", 0), &rsm, &result)
        .unwrap();
    f.region.clear_calls();

    f.query_cache
        .put(&f.uow, &QueryCacheKey::new("query.key2", 0), &rsm, &result)
        .unwrap();
    assert_eq!(put_calls(&f.region).len(), 1);
    f.region.clear_calls();

    let refresh = QueryCacheKey::with_mode("query.key3", 0, CacheMode::Refresh);
    f.query_cache.put(&f.uow, &refresh, &rsm, &result).unwrap();
    assert_eq!(put_calls(&f.region).len(), 5);
}

// == Get ==

#[test]
fn test_get_basic_query_result() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    let original = countries(&f.uow, 2);
    f.query_cache.put(&f.uow, &key, &rsm, &original).unwrap();

    f.uow.clear();
    let result = f.query_cache.get(&f.uow, &key, &rsm).unwrap().into_vec();

    assert_eq!(names(&result), vec![json!("Country 1"), json!("Country 2")]);
    assert_eq!(result[0].identifier(), id(1));
    assert_ne!(result[0], original[0]);
    assert_eq!(f.uow.try_get("Country", &id(1)), Some(result[0].clone()));
}

#[test]
fn test_get_reuses_managed_instances() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    let original = countries(&f.uow, 2);
    f.query_cache.put(&f.uow, &key, &rsm, &original).unwrap();

    let result = f.query_cache.get(&f.uow, &key, &rsm).unwrap().into_vec();
    assert_eq!(result, original);
}

#[test]
fn test_get_with_put_mode_is_a_miss() {
    let f = fixture();
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    f.query_cache
        .put(&f.uow, &QueryCacheKey::new("query.key1", 0), &rsm, &countries(&f.uow, 1))
        .unwrap();
    f.region.clear_calls();

    let key = QueryCacheKey::with_mode("query.key1", 0, CacheMode::Put);
    assert_eq!(f.query_cache.get(&f.uow, &key, &rsm), None);
    assert!(f.region.calls().is_empty());
}

#[test]
fn test_get_expired_entry_is_evicted() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 50);
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    let entry = QueryCacheEntry::at(vec![QueryRow::new(id(1))], current_timestamp_ms() - 100_000);
    f.region.put(&key.clone().into(), entry.into());

    assert_eq!(f.query_cache.get(&f.uow, &key, &rsm), None);

    let evictions = f.region.calls_of(RegionOp::Evict);
    assert_eq!(evictions.len(), 1);
    assert_eq!(evictions[0].key(), Some(&CacheKey::from(key.clone())));
    assert!(!f.query_cache.contains(&key));
}

#[test]
fn test_get_stale_after_type_write() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    f.query_cache.put(&f.uow, &key, &rsm, &countries(&f.uow, 1)).unwrap();

    let built_earlier = QueryCacheEntry::at(vec![QueryRow::new(id(1))], current_timestamp_ms() - 1_000);
    f.region.put(&key.clone().into(), built_earlier.into());
    assert!(f.query_cache.get(&f.uow, &key, &rsm).is_some());

    f.regions.timestamp_region().update(&TimestampCacheKey::new("Country"));
    assert_eq!(f.query_cache.get(&f.uow, &key, &rsm), None);
    assert!(!f.query_cache.contains(&key));
}

#[test]
fn test_get_wrong_entry_type_is_a_miss() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    f.region.push_get_result(Some(
        EntityCacheEntry::from_scalars("Country", fields(1, "Germany")).into(),
    ));

    assert_eq!(f.query_cache.get(&f.uow, &key, &rsm), None);
}

#[test]
fn test_get_with_unresolved_root_is_a_miss() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    f.region.put(
        &key.clone().into(),
        QueryCacheEntry::new(vec![QueryRow::new(id(1))]).into(),
    );
    f.region.push_get_multiple_result(vec![None]);

    assert_eq!(f.query_cache.get(&f.uow, &key, &rsm), None);
}

#[test]
fn test_get_with_one_evicted_entity_is_a_miss() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    f.query_cache.put(&f.uow, &key, &rsm, &countries(&f.uow, 3)).unwrap();

    f.region.evict(&l2cache::cache::EntityCacheKey::new("Country", id(2)).into());
    assert_eq!(f.query_cache.get(&f.uow, &key, &rsm), None);
}

#[test]
fn test_get_to_one_association() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("State", "s")
        .add_joined_entity("Country", "c", "s", "country");
    f.query_cache
        .put(&f.uow, &key, &rsm, &states_with_countries(&f.uow, 2))
        .unwrap();

    f.uow.clear();
    let result = f.query_cache.get(&f.uow, &key, &rsm).unwrap().into_vec();

    assert_eq!(names(&result), vec![json!("State 1"), json!("State 2")]);
    let country = result[1].reference("country").unwrap();
    assert!(country.is_initialized());
    assert_eq!(country.field("name"), Some(json!("Country 2")));
}

#[test]
fn test_get_null_to_one_association() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("State", "s")
        .add_joined_entity("Country", "c", "s", "country");
    let result = vec![f.uow.create("State", fields(1, "Nowhere"))];
    f.query_cache.put(&f.uow, &key, &rsm, &result).unwrap();

    f.uow.clear();
    let result = f.query_cache.get(&f.uow, &key, &rsm).unwrap().into_vec();
    assert_eq!(result[0].reference("country"), None);
}

#[test]
fn test_get_to_many_association() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("State", "s")
        .add_joined_entity("City", "c", "s", "cities");
    f.query_cache.put(&f.uow, &key, &rsm, &[bavaria(&f.uow)]).unwrap();

    f.uow.clear();
    let result = f.query_cache.get(&f.uow, &key, &rsm).unwrap().into_vec();
    let cities = result[0].collection("cities");
    assert_eq!(names(&cities), vec![json!("Munich"), json!("Wurzburg")]);
}

#[test]
fn test_get_with_evicted_collection_is_a_miss() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("State", "s")
        .add_joined_entity("City", "c", "s", "cities");
    f.query_cache.put(&f.uow, &key, &rsm, &[bavaria(&f.uow)]).unwrap();

    f.region
        .evict(&CollectionCacheKey::new("State", "cities", id(2)).into());
    assert_eq!(f.query_cache.get(&f.uow, &key, &rsm), None);
}

#[test]
fn test_nested_to_many_round_trip() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("State", "s")
        .add_joined_entity("City", "c", "s", "cities")
        .add_joined_entity("Attraction", "a", "c", "attractions");
    f.query_cache.put(&f.uow, &key, &rsm, &[bavaria(&f.uow)]).unwrap();
    assert_eq!(put_calls(&f.region).len(), 10);

    f.uow.clear();
    let result = f.query_cache.get(&f.uow, &key, &rsm).unwrap().into_vec();
    let cities = result[0].collection("cities");
    let counts: Vec<usize> = cities.iter().map(|c| c.collection("attractions").len()).collect();
    assert_eq!(counts, vec![2, 1]);
    assert_eq!(
        names(&cities[0].collection("attractions")),
        vec![json!("Reinstoff"), json!("Schneider Weisse")]
    );
}

#[test]
fn test_get_indexed_result() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("Country", "c")
        .set_index_by("name");
    f.query_cache.put(&f.uow, &key, &rsm, &countries(&f.uow, 2)).unwrap();

    let Some(QueryResult::Indexed(result)) = f.query_cache.get(&f.uow, &key, &rsm) else {
        panic!("expected an indexed result");
    };
    let index: Vec<Value> = result.iter().map(|(index, _)| index.clone()).collect();
    assert_eq!(index, vec![json!("Country 1"), json!("Country 2")]);
    assert_eq!(result[1].1.identifier(), id(2));
}

#[test]
fn test_clear_evicts_query_region() {
    let f = fixture();
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new().add_root_entity("Country", "c");
    f.query_cache.put(&f.uow, &key, &rsm, &countries(&f.uow, 1)).unwrap();

    f.query_cache.clear().unwrap();
    assert!(!f.query_cache.contains(&key));
}

// == Shared Backend ==

#[test]
fn test_round_trip_through_memory_backend() {
    let metadata = metadata();
    let cache = SecondLevelCache::with_backend(
        CacheConfig::default(),
        metadata.clone(),
        Arc::new(MemoryBackend::new(1_000, 1024 * 1024)),
    );
    let uow = UnitOfWork::new(metadata);
    let query_cache = cache.query_cache(None);
    let key = QueryCacheKey::new("query.key1", 0);
    let rsm = ResultSetMapping::new()
        .add_root_entity("State", "s")
        .add_joined_entity("Country", "c", "s", "country")
        .add_joined_entity("City", "ci", "s", "cities");

    let states = states_with_countries(&uow, 2);
    states[0].add_to_collection("cities", uow.create("City", fields(30, "Munich")));
    assert_eq!(query_cache.put(&uow, &key, &rsm, &states), Ok(true));

    assert_eq!(cache.contains_entity("State", id(11)), Ok(true));
    assert_eq!(cache.contains_entity("Country", id(2)), Ok(true));
    assert_eq!(cache.contains_collection("State", "cities", id(11)), Ok(true));
    assert!(cache.contains_query(&key, None));

    uow.clear();
    let result = query_cache.get(&uow, &key, &rsm).unwrap().into_vec();
    assert_eq!(names(&result), vec![json!("State 1"), json!("State 2")]);
    assert_eq!(
        result[0].reference("country").and_then(|c| c.field("name")),
        Some(json!("Country 1"))
    );
    assert_eq!(names(&result[0].collection("cities")), vec![json!("Munich")]);
    assert!(result[1].collection("cities").is_empty());

    let stats = cache.statistics().region("query_cache_region");
    assert_eq!((stats.hits, stats.puts), (1, 1));
}
