//! Patient service integration tests.
//!
//! Uses recording doubles around the SQLite store and a canned rapport client
//! to check call counts as well as outcomes.

use std::cell::{Cell, RefCell};

use chrono::NaiveDate;
use proptest::prelude::*;

use mediscreen_core::db::{Database, DbResult, PatientStore};
use mediscreen_core::models::{Assessment, Patient, PatientId, Rapport, Sex, ValidationError};
use mediscreen_core::service::{
    PatientKey, PatientService, RapportClient, RapportError, ServiceError,
};

/// Store wrapper that counts reads and writes.
struct RecordingStore {
    inner: Database,
    reads: Cell<usize>,
    saves: Cell<usize>,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: Database::open_in_memory().unwrap(),
            reads: Cell::new(0),
            saves: Cell::new(0),
        }
    }

    fn read(&self) {
        self.reads.set(self.reads.get() + 1);
    }
}

impl PatientStore for RecordingStore {
    fn get(&self, id: PatientId) -> DbResult<Option<Patient>> {
        self.read();
        self.inner.get(id)
    }

    fn get_by_name(&self, last_name: &str, first_name: &str) -> DbResult<Option<Patient>> {
        self.read();
        self.inner.get_by_name(last_name, first_name)
    }

    fn get_by_last_name(&self, last_name: &str) -> DbResult<Vec<Patient>> {
        self.read();
        self.inner.get_by_last_name(last_name)
    }

    fn get_all(&self) -> DbResult<Vec<Patient>> {
        self.read();
        self.inner.get_all()
    }

    fn save(&self, patient: &Patient) -> DbResult<Patient> {
        self.saves.set(self.saves.get() + 1);
        self.inner.save(patient)
    }
}

/// Rapport client returning a fixed report and recording requested ids.
struct MockRapport {
    rapport: Rapport,
    calls: RefCell<Vec<PatientId>>,
}

impl MockRapport {
    fn new() -> Self {
        Self {
            rapport: Rapport {
                last_name: "TestEarlyOnset".into(),
                first_name: "Test".into(),
                sex: Sex::Female,
                age: 22,
                assessment: Assessment::EarlyOnset,
            },
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl RapportClient for MockRapport {
    fn get_report_by_id(&self, id: PatientId) -> Result<Rapport, RapportError> {
        self.calls.borrow_mut().push(id);
        if id == 7 {
            Ok(self.rapport.clone())
        } else {
            Err(RapportError::NotFound(id))
        }
    }
}

fn setup() -> PatientService<RecordingStore, MockRapport> {
    PatientService::new(RecordingStore::new(), MockRapport::new())
}

fn make_patient(last: &str, first: &str) -> Patient {
    Patient::new(
        last.into(),
        first.into(),
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        Sex::Male,
    )
    .with_home_address("PatientTestHomeAddress")
    .with_phone_number("111-222-3333")
}

#[test]
fn test_create_writes_once() {
    let service = setup();
    service.create(make_patient("Doe", "Jane")).unwrap();

    assert_eq!(service.store().saves.get(), 1);
    assert_eq!(service.store().reads.get(), 1);
}

#[test]
fn test_rejected_create_leaves_store_unchanged() {
    let service = setup();
    let original = service.create(make_patient("Doe", "Jane")).unwrap();

    let mut conflicting = make_patient("Doe", "Jane");
    conflicting.sex = Sex::Female;
    conflicting.home_address = Some("Somewhere else".into());
    let result = service.create(conflicting);

    assert!(matches!(result, Err(ServiceError::AlreadyExists { .. })));
    assert_eq!(service.store().saves.get(), 1);

    let all = service.find_all().unwrap();
    assert_eq!(all, vec![original]);
}

#[test]
fn test_self_update_with_new_address() {
    let service = setup();
    let mut jane = service.create(make_patient("Doe", "Jane")).unwrap();

    jane.home_address = Some("5 Harbour Road".into());
    let updated = service.update(jane.clone()).unwrap();

    assert_eq!(updated, jane);
    assert_eq!(service.store().saves.get(), 2);
    assert_eq!(
        service.find_by_id(jane.id.unwrap()).unwrap().home_address,
        Some("5 Harbour Road".into())
    );
}

#[test]
fn test_cross_collision_update_rejected() {
    let service = setup();
    service.create(make_patient("Doe", "Jane")).unwrap();
    let amy = service.create(make_patient("Lee", "Amy")).unwrap();

    let mut renamed = amy.clone();
    renamed.last_name = "Doe".into();
    renamed.first_name = "Jane".into();
    renamed.phone_number = Some("999-999-9999".into());

    let result = service.update(renamed);
    assert!(matches!(
        result,
        Err(ServiceError::AlreadyExists { last_name, first_name })
            if last_name == "Doe" && first_name == "Jane"
    ));
    assert_eq!(service.store().saves.get(), 2);
    assert_eq!(service.find_by_id(amy.id.unwrap()).unwrap(), amy);
}

#[test]
fn test_update_rejects_field_rule_violations() {
    let service = setup();
    let jane = service.create(make_patient("Doe", "Jane")).unwrap();

    let mut blank_first = jane.clone();
    blank_first.first_name = "   ".into();
    assert!(matches!(
        service.update(blank_first),
        Err(ServiceError::Invalid(ValidationError::Blank("first name")))
    ));

    let mut long_address = jane.clone();
    long_address.home_address = Some("a".repeat(256));
    assert!(matches!(
        service.update(long_address),
        Err(ServiceError::Invalid(ValidationError::TooLong {
            field: "home address",
            max: 255
        }))
    ));

    assert_eq!(service.store().saves.get(), 1);
    assert_eq!(service.find_by_id(jane.id.unwrap()).unwrap(), jane);
}

#[test]
fn test_update_keeping_name_skips_name_lookup() {
    let service = setup();
    let mut jane = service.create(make_patient("Doe", "Jane")).unwrap();
    let reads_before = service.store().reads.get();

    jane.phone_number = Some("222-333-4444".into());
    service.update(jane).unwrap();

    // Only the existence check by id
    assert_eq!(service.store().reads.get(), reads_before + 1);
}

#[test]
fn test_lookup_miss_taxonomy() {
    let service = setup();

    match service.find_by_id(999) {
        Err(ServiceError::NotFound(PatientKey::Id(999))) => {}
        other => panic!("unexpected: {:?}", other),
    }

    match service.find_by_last_and_first_name("Nobody", "Here") {
        Err(ServiceError::NotFound(PatientKey::Name {
            last_name,
            first_name,
        })) => {
            assert_eq!(last_name, "Nobody");
            assert_eq!(first_name, "Here");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_report_passthrough() {
    let service = setup();

    let rapport = service.get_patient_report(7).unwrap();

    assert_eq!(rapport, service.rapport_client().rapport);
    assert_eq!(*service.rapport_client().calls.borrow(), vec![7]);
    // No local existence check
    assert_eq!(service.store().reads.get(), 0);
}

#[test]
fn test_report_absent_patient() {
    let service = setup();

    assert!(matches!(
        service.get_patient_report(8),
        Err(ServiceError::NotFound(PatientKey::Id(8)))
    ));
    assert_eq!(*service.rapport_client().calls.borrow(), vec![8]);
}

#[test]
fn test_find_all_complete() {
    let service = setup();
    let names = ["Ferguson", "Rees", "Arnold", "Sharp", "Ince"];

    let created: Vec<Patient> = names
        .iter()
        .map(|last| service.create(make_patient(last, "Test")).unwrap())
        .collect();

    let all = service.find_all().unwrap();
    assert_eq!(all.len(), names.len());
    for patient in &created {
        assert_eq!(&service.find_by_id(patient.id.unwrap()).unwrap(), patient);
    }
}

#[test]
fn test_store_duplicate_maps_to_already_exists() {
    // Simulate a concurrent writer: the row appears after the service pre-check
    // would have passed, so only the unique index catches it.
    let db = Database::open_in_memory().unwrap();
    db.save(&make_patient("Doe", "Jane")).unwrap();

    struct BlindStore(Database);

    impl PatientStore for BlindStore {
        fn get(&self, id: PatientId) -> DbResult<Option<Patient>> {
            self.0.get(id)
        }
        fn get_by_name(&self, _last: &str, _first: &str) -> DbResult<Option<Patient>> {
            Ok(None)
        }
        fn get_by_last_name(&self, last_name: &str) -> DbResult<Vec<Patient>> {
            self.0.get_by_last_name(last_name)
        }
        fn get_all(&self) -> DbResult<Vec<Patient>> {
            self.0.get_all()
        }
        fn save(&self, patient: &Patient) -> DbResult<Patient> {
            self.0.save(patient)
        }
    }

    let service = PatientService::new(BlindStore(db), MockRapport::new());
    assert!(matches!(
        service.create(make_patient("Doe", "Jane")),
        Err(ServiceError::AlreadyExists { .. })
    ));
    assert_eq!(service.find_all().unwrap().len(), 1);
}

#[test]
fn test_on_disk_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patients.db");

    let id = {
        let service = PatientService::new(Database::open(&path).unwrap(), MockRapport::new());
        service.create(make_patient("Doe", "Jane")).unwrap().id.unwrap()
    };

    let service = PatientService::new(Database::open(&path).unwrap(), MockRapport::new());
    let jane = service.find_by_id(id).unwrap();
    assert!(jane.has_name("Doe", "Jane"));

    assert!(matches!(
        service.create(make_patient("Doe", "Jane")),
        Err(ServiceError::AlreadyExists { .. })
    ));
}

// =========================================================================
// Uniqueness invariant over random operation sequences
// =========================================================================

#[derive(Debug, Clone)]
enum Op {
    Create { last: usize, first: usize },
    Rename { target: usize, last: usize, first: usize },
}

const LAST_NAMES: [&str; 3] = ["Doe", "Lee", "Sharp"];
const FIRST_NAMES: [&str; 3] = ["Jane", "Amy", "Tim"];

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..LAST_NAMES.len(), 0..FIRST_NAMES.len())
            .prop_map(|(last, first)| Op::Create { last, first }),
        (0..8usize, 0..LAST_NAMES.len(), 0..FIRST_NAMES.len())
            .prop_map(|(target, last, first)| Op::Rename { target, last, first }),
    ]
}

proptest! {
    #[test]
    fn property_no_two_records_share_a_name(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let service = PatientService::new(Database::open_in_memory().unwrap(), MockRapport::new());

        for op in ops {
            match op {
                Op::Create { last, first } => {
                    let taken = service
                        .find_by_last_and_first_name(LAST_NAMES[last], FIRST_NAMES[first])
                        .is_ok();
                    let result = service.create(make_patient(LAST_NAMES[last], FIRST_NAMES[first]));
                    prop_assert_eq!(result.is_err(), taken);
                }
                Op::Rename { target, last, first } => {
                    let all = service.find_all().unwrap();
                    if all.is_empty() {
                        continue;
                    }
                    let mut patient = all[target % all.len()].clone();
                    let before = patient.clone();
                    patient.last_name = LAST_NAMES[last].to_string();
                    patient.first_name = FIRST_NAMES[first].to_string();

                    if service.update(patient).is_err() {
                        prop_assert_eq!(service.find_by_id(before.id.unwrap()).unwrap(), before);
                    }
                }
            }

            let all = service.find_all().unwrap();
            let mut names: Vec<(String, String)> = all
                .iter()
                .map(|p| (p.last_name.clone(), p.first_name.clone()))
                .collect();
            names.sort();
            names.dedup();
            prop_assert_eq!(names.len(), all.len());
        }
    }
}
