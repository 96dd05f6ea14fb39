use serde_json::json;

use super::*;
use crate::backend::local::LocalStore;
use crate::backend::test_helpers::RecordingStore;
use crate::model::{Period, PlaceType};
use crate::seed;

fn store_over(backend: &Arc<RecordingStore>) -> CollectionStore {
    let backend: Arc<dyn BackingStore> = backend.clone();
    CollectionStore::new(backend)
}

async fn ready_store(backend: &Arc<RecordingStore>) -> CollectionStore {
    let store = store_over(backend);
    for pending in store.initialize().await {
        pending.outcome().await;
    }
    store
}

fn test_hero() -> Hero {
    Hero {
        id: "1700000000000".into(),
        name: "Test".into(),
        years: "1500-1560".into(),
        title: "X".into(),
        description: "Y".into(),
        image: "z.jpg".into(),
        period: Period::Early,
    }
}

fn hero_with_id(id: &str) -> Hero {
    Hero { id: id.into(), name: format!("Hero {id}"), ..test_hero() }
}

fn event(id: i64, year: i32) -> HistoricalEvent {
    HistoricalEvent { id, title: format!("Event {year}"), year, description: String::new(), image: None }
}

fn question(id: i64, correct_answer: u8) -> QuizQuestion {
    QuizQuestion {
        id,
        question: "Which?".into(),
        options: ["a".into(), "b".into(), "c".into(), "d".into()],
        correct_answer,
        explanation: String::new(),
        image: None,
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn new_store_holds_seed_data_uninitialized() {
    let backend = RecordingStore::new();
    let store = store_over(&backend);

    assert_eq!(store.status(), StoreStatus::Uninitialized);
    assert_eq!(store.snapshot(), Collections::seeded());
    assert!(backend.saves().is_empty());
}

#[tokio::test]
async fn empty_backend_installs_seed_and_persists_each_collection() {
    let backend = RecordingStore::new();
    let store = store_over(&backend);

    let pending = store.initialize().await;
    assert_eq!(pending.len(), 5);
    for save in pending {
        assert_eq!(save.outcome().await, SaveOutcome::Persisted);
    }

    assert_eq!(store.status(), StoreStatus::Ready);
    assert_eq!(store.snapshot(), Collections::seeded());
    let seeded = Collections::seeded();
    for collection in Collection::ALL {
        assert_eq!(backend.saves_for(collection), vec![seeded.encode(collection).unwrap()]);
    }
}

#[tokio::test]
async fn stored_records_replace_seed_without_saving() {
    let stored_hero = serde_json::to_value(test_hero()).unwrap();
    let backend = RecordingStore::new()
        .with(Collection::Heroes, vec![stored_hero])
        .with(Collection::Quiz, vec![serde_json::to_value(question(9, 3)).unwrap()]);
    let store = store_over(&backend);

    let pending = store.initialize().await;
    let seeded: Vec<Collection> = pending.iter().map(PendingSave::collection).collect();
    assert_eq!(seeded, [Collection::WarHeroes, Collection::Places, Collection::Timeline]);
    for save in pending {
        save.outcome().await;
    }

    assert_eq!(store.all::<Hero>(), vec![test_hero()]);
    assert_eq!(store.all::<QuizQuestion>(), vec![question(9, 3)]);
    assert!(backend.saves_for(Collection::Heroes).is_empty());
    assert!(backend.saves_for(Collection::Quiz).is_empty());
}

#[tokio::test]
async fn invalid_stored_records_are_dropped() {
    let backend = RecordingStore::new().with(
        Collection::Quiz,
        vec![
            serde_json::to_value(question(1, 0)).unwrap(),
            json!({ "id": 2, "question": "bad index", "options": ["a", "b", "c", "d"], "correctAnswer": 7, "explanation": "" }),
            json!({ "id": 3, "question": "too few", "options": ["a", "b"], "correctAnswer": 0, "explanation": "" }),
            json!("not a record"),
        ],
    );
    let store = ready_store(&backend).await;

    assert_eq!(store.all::<QuizQuestion>(), vec![question(1, 0)]);
}

#[tokio::test]
async fn all_invalid_records_fall_back_to_seed() {
    let backend = RecordingStore::new().with(Collection::Heroes, vec![json!({ "id": "1" })]);
    let store = store_over(&backend);

    let pending = store.initialize().await;

    assert!(pending.iter().any(|p| p.collection() == Collection::Heroes));
    assert_eq!(store.all::<Hero>(), seed::heroes());
}

#[tokio::test]
async fn failed_loads_degrade_to_seed_and_still_become_ready() {
    let backend = RecordingStore::new();
    backend.fail_loads(|| StoreError::Request("connection refused".into()));
    let store = ready_store(&backend).await;

    assert_eq!(store.status(), StoreStatus::Ready);
    assert_eq!(store.all::<QuizQuestion>(), seed::quiz());
    assert_eq!(backend.saves().len(), 5);
}

#[tokio::test]
async fn initialize_runs_once() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    store.add(test_hero()).unwrap().outcome().await;

    assert!(store.initialize().await.is_empty());
    assert_eq!(store.all::<Hero>(), vec![test_hero()]);
    assert_eq!(backend.saves().len(), 6);
}

#[tokio::test]
async fn mutation_before_ready_is_deferred_and_replaced_by_load() {
    let backend = RecordingStore::new();
    let store = store_over(&backend);

    let outcome = store.add(test_hero()).unwrap().outcome().await;
    assert_eq!(outcome, SaveOutcome::Deferred);
    assert_eq!(store.all::<Hero>(), vec![test_hero()]);

    for pending in store.initialize().await {
        pending.outcome().await;
    }
    assert_eq!(store.all::<Hero>(), seed::heroes());
}

// =============================================================================
// add / update / delete
// =============================================================================

#[tokio::test]
async fn add_is_visible_without_awaiting_the_save() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;

    let pending = store.add(test_hero()).unwrap();
    assert_eq!(store.all::<Hero>(), vec![test_hero()]);
    assert_eq!(store.find::<Hero>(&"1700000000000".to_owned()), Some(test_hero()));

    assert_eq!(pending.outcome().await, SaveOutcome::Persisted);
    assert_eq!(backend.stored(Collection::Heroes), Some(vec![serde_json::to_value(test_hero()).unwrap()]));
}

#[tokio::test]
async fn add_does_not_check_uniqueness() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;

    store.add(test_hero()).unwrap();
    store.add(test_hero()).unwrap();

    assert_eq!(store.count::<Hero>(), 2);
}

#[tokio::test]
async fn add_invalid_record_is_rejected() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    let before = store.all::<QuizQuestion>();

    let err = store.add(question(5, 4)).unwrap_err();

    assert!(matches!(err, StoreError::Invalid(_)));
    assert_eq!(store.all::<QuizQuestion>(), before);
}

#[tokio::test]
async fn update_replaces_exactly_one_record() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    store.add(hero_with_id("1")).unwrap();
    store.add(hero_with_id("2")).unwrap();
    store.add(hero_with_id("3")).unwrap();

    let mut renamed = hero_with_id("2");
    renamed.name = "Renamed".into();
    store.update(&hero_with_id("2"), renamed.clone()).unwrap().outcome().await;

    let heroes = store.all::<Hero>();
    assert_eq!(heroes.len(), 3);
    assert_eq!(heroes[1], renamed);
    assert_eq!(heroes[0], hero_with_id("1"));
    assert_eq!(heroes[2], hero_with_id("3"));
}

#[tokio::test]
async fn update_missing_id_leaves_collection_unchanged() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    store.add(hero_with_id("1")).unwrap().outcome().await;
    let saves_before = backend.saves().len();
    let before = store.all::<Hero>();

    let err = store.update(&hero_with_id("missing"), hero_with_id("other")).unwrap_err();

    assert!(matches!(err, StoreError::NotFound { collection: Collection::Heroes, ref id } if id == "missing"));
    assert_eq!(store.all::<Hero>(), before);
    assert_eq!(backend.saves().len(), saves_before);
}

#[tokio::test]
async fn update_with_invalid_replacement_is_rejected() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    let original = store.all::<QuizQuestion>()[0].clone();

    let mut broken = original.clone();
    broken.correct_answer = 9;
    assert!(store.update(&original, broken).is_err());
    assert_eq!(store.all::<QuizQuestion>()[0], original);
}

#[tokio::test]
async fn delete_removes_one_and_repeat_is_noop() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    store.add(hero_with_id("1")).unwrap();
    store.add(hero_with_id("2")).unwrap();

    store.delete(&hero_with_id("1")).outcome().await;
    assert_eq!(store.all::<Hero>(), vec![hero_with_id("2")]);

    let outcome = store.delete(&hero_with_id("1")).outcome().await;
    assert_eq!(outcome, SaveOutcome::Persisted);
    assert_eq!(store.all::<Hero>(), vec![hero_with_id("2")]);
}

#[tokio::test]
async fn delete_by_numeric_id() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;

    store.delete_by_id::<QuizQuestion>(&1).outcome().await;

    let ids: Vec<i64> = store.all::<QuizQuestion>().iter().map(|q| q.id).collect();
    assert_eq!(ids, [2]);
    assert_eq!(backend.stored(Collection::Quiz).unwrap().len(), 1);
}

#[tokio::test]
async fn mutation_saves_only_the_affected_collection() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    let before = backend.saves().len();

    store.add(event(1, 1410)).unwrap().outcome().await;

    let after = backend.saves();
    assert_eq!(after.len(), before + 1);
    assert_eq!(after.last().unwrap().0, Collection::Timeline);
}

// =============================================================================
// reset
// =============================================================================

#[tokio::test]
async fn reset_restores_seed_and_writes_all_five() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    store.add(test_hero()).unwrap();
    store.add(event(1, 1517)).unwrap();
    store.delete_by_id::<QuizQuestion>(&2);
    let place = Place {
        id: "p1".into(),
        name: "Nesvizh".into(),
        description: String::new(),
        location: String::new(),
        url: String::new(),
        image_url: String::new(),
        x: 1.0,
        y: 2.0,
        kind: PlaceType::Castle,
    };
    store.add(place).unwrap();

    let pending = store.reset();
    assert_eq!(store.snapshot(), Collections::seeded());

    assert_eq!(pending.len(), 5);
    for save in pending {
        assert!(save.outcome().await.is_persisted());
    }
    let seeded = Collections::seeded();
    for collection in Collection::ALL {
        assert_eq!(backend.stored(collection), Some(seeded.encode(collection).unwrap()));
    }
}

#[tokio::test]
async fn reset_before_ready_still_persists() {
    let backend = RecordingStore::new();
    let store = store_over(&backend);

    for save in store.reset() {
        assert!(save.outcome().await.is_persisted());
    }
    assert_eq!(backend.saves().len(), 5);
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn save_failure_keeps_in_memory_mutation() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    backend.fail_saves(|| StoreError::Status { status: 500 });

    let outcome = store.add(test_hero()).unwrap().outcome().await;

    assert!(matches!(outcome, SaveOutcome::RetryableFailure(_)));
    assert_eq!(store.all::<Hero>(), vec![test_hero()]);
}

#[tokio::test]
async fn later_save_converges_after_failure() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    backend.fail_saves(|| StoreError::Request("offline".into()));
    store.add(hero_with_id("1")).unwrap().outcome().await;

    backend.heal();
    store.add(hero_with_id("2")).unwrap().outcome().await;

    let stored = backend.stored(Collection::Heroes).unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn rapid_mutations_persist_final_state() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;

    let mut pending = Vec::new();
    for i in 0..10 {
        pending.push(store.add(hero_with_id(&i.to_string())).unwrap());
    }
    pending.push(store.delete(&hero_with_id("3")));
    for save in pending {
        assert!(save.outcome().await.is_persisted());
    }

    let expected = store.snapshot().encode(Collection::Heroes).unwrap();
    assert_eq!(backend.stored(Collection::Heroes), Some(expected));
    assert_eq!(store.count::<Hero>(), 9);
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn hero_add_then_update_period() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    let hero = test_hero();

    store.add(hero.clone()).unwrap();
    let modern = Hero { period: Period::Modern, ..hero.clone() };
    store.update(&hero, modern).unwrap().outcome().await;

    let heroes = store.all::<Hero>();
    assert_eq!(heroes.len(), 1);
    let stored = &heroes[0];
    assert_eq!(stored.period, Period::Modern);
    assert_eq!(stored.id, "1700000000000");
    assert_eq!(stored.name, "Test");
    assert_eq!(stored.years, "1500-1560");
    assert_eq!(stored.title, "X");
    assert_eq!(stored.description, "Y");
    assert_eq!(stored.image, "z.jpg");
}

#[tokio::test]
async fn events_read_back_sorted_by_year() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;

    store.add(event(1, 1945)).unwrap();
    store.add(event(2, 1517)).unwrap();
    store.add(event(3, 1569)).unwrap();

    let years: Vec<i32> = crate::views::events_by_year(&store.all::<HistoricalEvent>())
        .iter()
        .map(|e| e.year)
        .collect();
    assert_eq!(years, [1517, 1569, 1945]);
}

#[tokio::test]
async fn persisted_collections_reload_into_fresh_store() {
    let backend = RecordingStore::new();
    let store = ready_store(&backend).await;
    store.add(test_hero()).unwrap().outcome().await;
    store.add(event(7, 1569)).unwrap().outcome().await;
    let expected = store.snapshot();
    drop(store);

    let reloaded = ready_store(&backend).await;
    assert_eq!(reloaded.snapshot(), expected);
}

#[tokio::test]
async fn every_record_type_round_trips_through_local_entries() {
    let dir = tempfile::tempdir().unwrap();
    let open = || -> Arc<dyn BackingStore> { Arc::new(LocalStore::open(dir.path()).unwrap()) };

    let store = CollectionStore::new(open());
    for pending in store.initialize().await {
        pending.outcome().await;
    }
    let saves = vec![
        store.add(test_hero()).unwrap(),
        store
            .add(WarHero {
                id: "w1".into(),
                name: "Мікалай Гастэла".into(),
                years: "1907-1941".into(),
                title: "Pilot".into(),
                description: "Hero of the Soviet Union".into(),
                image: "gastello.jpg".into(),
            })
            .unwrap(),
        store
            .add(Place {
                id: "p1".into(),
                name: "Mir Castle".into(),
                description: "16th-century castle".into(),
                location: "Mir".into(),
                url: "https://example.org/mir".into(),
                image_url: "mir.jpg".into(),
                x: 123.45,
                y: 67.8,
                kind: PlaceType::Castle,
            })
            .unwrap(),
        store
            .add(QuizQuestion { image: Some("sash.jpg".into()), explanation: "Slutsk".into(), ..question(3, 2) })
            .unwrap(),
        store.add(HistoricalEvent { image: Some("grunwald.jpg".into()), ..event(4, 1410) }).unwrap(),
    ];
    for pending in saves {
        assert_eq!(pending.outcome().await, SaveOutcome::Persisted);
    }
    let expected = store.snapshot();
    assert!(Collection::ALL.into_iter().all(|c| expected.len_of(c) > 0));
    drop(store);

    let reloaded = CollectionStore::new(open());
    assert!(reloaded.initialize().await.is_empty());
    assert_eq!(reloaded.snapshot(), expected);
    assert_eq!(reloaded.find::<Place>(&"p1".to_owned()).map(|p| (p.x, p.y)), Some((123.45, 67.8)));
}

#[test]
fn decode_records_keeps_valid_entries_in_order() {
    let raw = vec![
        serde_json::to_value(event(2, 1600)).unwrap(),
        json!({ "id": "not a number", "title": "x", "year": 1, "description": "" }),
        serde_json::to_value(event(1, 1500)).unwrap(),
    ];
    let decoded = decode_records::<HistoricalEvent>(raw);
    assert_eq!(decoded, vec![event(2, 1600), event(1, 1500)]);
}
