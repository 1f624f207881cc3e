//! End-to-end tests of the clinic operations through the public facade.

use otoclinic_core::{
    open_store_in_memory, Caller, ClinicCore, CreateTreatment, ErrorKind, ListRequest, Person,
    Role, TreatmentFilter, TreatmentStatus, UpdateTreatment,
};

fn caller_for(person: &Person) -> Caller {
    Caller::new(person.id.clone(), person.roles.clone())
}

fn seed() -> (ClinicCore, Person, Person, Person) {
    let core = open_store_in_memory().unwrap();

    let mut doctor = Person::new("Dr. Jane Smith".into(), vec![Role::Doctor]);
    doctor.str_number = Some("STR123456".into());
    let mut patient = Person::new("John Doe".into(), vec![Role::Patient]);
    patient.date_of_birth = Some("1990-05-15".into());
    patient.phone = Some("081234567890".into());
    let other_patient = Person::new("Mary Major".into(), vec![Role::Patient]);

    for person in [&doctor, &patient, &other_patient] {
        assert!(core.add_person(person).success);
    }
    (core, doctor, patient, other_patient)
}

fn create_input(patient_id: &str, date: &str) -> CreateTreatment {
    CreateTreatment {
        patient_id: Some(patient_id.into()),
        treatment_date: Some(date.into()),
        complaint: Some("Ear pain and ringing".into()),
        ear_affected: Some("left".into()),
        ..Default::default()
    }
}

#[test]
fn test_create_sets_doctor_and_default_status() {
    let (core, doctor, patient, _) = seed();

    let resp = core.create_treatment(&caller_for(&doctor), &create_input(&patient.id, "2025-06-15"));
    assert!(resp.success);
    assert_eq!(resp.message, "Treatment record created successfully");

    let detail = resp.data.unwrap();
    assert_eq!(detail.record.doctor_id, doctor.id);
    assert_eq!(detail.record.status, TreatmentStatus::Pending);
    assert_eq!(detail.doctor.str_number.as_deref(), Some("STR123456"));
    assert_eq!(detail.patient.name, "John Doe");
    // Age is computed from the stored date of birth
    assert!(detail.patient.age.is_some());
}

#[test]
fn test_create_rejects_non_patient_reference() {
    let (core, doctor, _, _) = seed();
    let other_doctor = Person::new("Dr. Sam".into(), vec![Role::Doctor]);
    assert!(core.add_person(&other_doctor).success);

    let resp = core.create_treatment(
        &caller_for(&doctor),
        &create_input(&other_doctor.id, "2025-06-15"),
    );
    assert!(!resp.success);
    assert_eq!(resp.error, Some(ErrorKind::ReferenceError));
    assert!(resp.data.is_none());
}

#[test]
fn test_create_validation_failure_reports_all_fields() {
    let (core, doctor, _, _) = seed();

    let resp = core.create_treatment(&caller_for(&doctor), &CreateTreatment::default());
    assert!(!resp.success);
    assert_eq!(resp.error, Some(ErrorKind::ValidationFailed));

    let errors = resp.errors.unwrap();
    for field in ["patient_id", "treatment_date", "complaint", "ear_affected"] {
        assert!(errors.contains_key(field), "missing violation for {field}");
    }
}

#[test]
fn test_patient_only_sees_own_records() {
    let (core, doctor, patient, other_patient) = seed();
    let doctor_caller = caller_for(&doctor);

    core.create_treatment(&doctor_caller, &create_input(&patient.id, "2025-06-15"));
    core.create_treatment(&doctor_caller, &create_input(&other_patient.id, "2025-06-16"));

    let patient_caller = caller_for(&patient);
    let resp = core.list_treatments(&patient_caller, &ListRequest::default());
    let items = resp.data.unwrap();
    assert_eq!(items.len(), 1);
    assert!(items.iter().all(|d| d.record.patient_id == patient.id));

    // Filters cannot widen a patient's scope
    let resp = core.list_treatments(
        &patient_caller,
        &ListRequest {
            mine_only: true,
            filter: TreatmentFilter {
                status: Some(TreatmentStatus::Pending),
                ..Default::default()
            },
            ..Default::default()
        },
    );
    assert!(resp
        .data
        .unwrap()
        .iter()
        .all(|d| d.record.patient_id == patient.id));
}

#[test]
fn test_show_outside_scope_is_not_found() {
    let (core, doctor, patient, other_patient) = seed();
    let created = core
        .create_treatment(&caller_for(&doctor), &create_input(&patient.id, "2025-06-15"))
        .data
        .unwrap();

    let resp = core.show_treatment(&caller_for(&other_patient), &created.record.id);
    assert!(!resp.success);
    assert_eq!(resp.error, Some(ErrorKind::NotFound));

    // Identical to a genuinely missing record
    let resp = core.show_treatment(&caller_for(&other_patient), "no-such-id");
    assert_eq!(resp.error, Some(ErrorKind::NotFound));

    let resp = core.show_treatment(&caller_for(&patient), &created.record.id);
    assert!(resp.success);
}

#[test]
fn test_write_operations_require_doctor() {
    let (core, doctor, patient, _) = seed();
    let created = core
        .create_treatment(&caller_for(&doctor), &create_input(&patient.id, "2025-06-15"))
        .data
        .unwrap();

    let patient_caller = caller_for(&patient);
    let forbidden = [
        core.create_treatment(&patient_caller, &create_input(&patient.id, "2025-06-15"))
            .error,
        core.update_treatment(&patient_caller, &created.record.id, &UpdateTreatment::default())
            .error,
        core.delete_treatment(&patient_caller, &created.record.id).error,
        core.treatment_statistics(&patient_caller, false).error,
        core.list_patients(&patient_caller).error,
    ];
    assert!(forbidden.iter().all(|e| *e == Some(ErrorKind::Forbidden)));

    let admin = Caller::new("admin-1", vec![Role::Admin]);
    let resp = core.list_treatments(&admin, &ListRequest::default());
    assert_eq!(resp.error, Some(ErrorKind::Forbidden));
}

#[test]
fn test_update_partial_leaves_other_fields() {
    let (core, doctor, patient, _) = seed();
    let doctor_caller = caller_for(&doctor);
    let mut input = create_input(&patient.id, "2025-06-15");
    input.diagnosis = Some("Acute otitis media".into());
    let created = core.create_treatment(&doctor_caller, &input).data.unwrap();

    let patch = UpdateTreatment {
        status: Some("completed".into()),
        ..Default::default()
    };
    let resp = core.update_treatment(&doctor_caller, &created.record.id, &patch);
    assert!(resp.success);

    let updated = resp.data.unwrap();
    assert_eq!(updated.record.status, TreatmentStatus::Completed);
    assert_eq!(updated.record.complaint, created.record.complaint);
    assert_eq!(updated.record.diagnosis, created.record.diagnosis);
    assert_eq!(updated.record.treatment_date, created.record.treatment_date);
    assert_eq!(updated.record.doctor_id, created.record.doctor_id);
    assert_ne!(updated.record.updated_at, created.record.updated_at);
}

#[test]
fn test_status_transitions_unrestricted() {
    let (core, doctor, patient, _) = seed();
    let doctor_caller = caller_for(&doctor);
    let created = core
        .create_treatment(&doctor_caller, &create_input(&patient.id, "2025-06-15"))
        .data
        .unwrap();

    // Cancelled back to pending is allowed; no transition table is enforced
    for status in ["cancelled", "pending", "completed"] {
        let patch = UpdateTreatment {
            status: Some(status.into()),
            ..Default::default()
        };
        let resp = core.update_treatment(&doctor_caller, &created.record.id, &patch);
        assert!(resp.success);
        assert_eq!(resp.data.unwrap().record.status.as_str(), status);
    }
}

#[test]
fn test_soft_delete_hides_everywhere() {
    let (core, doctor, patient, _) = seed();
    let doctor_caller = caller_for(&doctor);
    let created = core
        .create_treatment(&doctor_caller, &create_input(&patient.id, "2025-06-15"))
        .data
        .unwrap();

    let resp = core.delete_treatment(&doctor_caller, &created.record.id);
    assert!(resp.success);
    assert_eq!(resp.message, "Treatment record deleted successfully");

    // Excluded from list, show, and statistics - without any distinct error
    let listed = core
        .list_treatments(&doctor_caller, &ListRequest::default())
        .data
        .unwrap();
    assert!(listed.is_empty());

    let resp = core.show_treatment(&doctor_caller, &created.record.id);
    assert_eq!(resp.error, Some(ErrorKind::NotFound));

    let stats = core
        .treatment_statistics(&doctor_caller, false)
        .data
        .unwrap();
    assert_eq!(stats.total, 0);

    // Deleting again reports not-found
    let resp = core.delete_treatment(&doctor_caller, &created.record.id);
    assert_eq!(resp.error, Some(ErrorKind::NotFound));
}

#[test]
fn test_pagination_fixed_page_size() {
    let (core, doctor, patient, _) = seed();
    let doctor_caller = caller_for(&doctor);
    for day in 1..=16 {
        let resp = core.create_treatment(
            &doctor_caller,
            &create_input(&patient.id, &format!("2025-06-{day:02}")),
        );
        assert!(resp.success);
    }

    let first = core.list_treatments(&doctor_caller, &ListRequest::default());
    let pagination = first.pagination.unwrap();
    assert_eq!(first.data.unwrap().len(), 15);
    assert_eq!(pagination.per_page, 15);
    assert_eq!(pagination.total, 16);
    assert_eq!(pagination.total_pages, 2);

    let second = core.list_treatments(
        &doctor_caller,
        &ListRequest {
            page: 2,
            ..Default::default()
        },
    );
    assert_eq!(second.data.unwrap().len(), 1);
    assert_eq!(second.pagination.unwrap().current_page, 2);
}

#[test]
fn test_date_range_filter_inclusive() {
    let (core, doctor, patient, _) = seed();
    let doctor_caller = caller_for(&doctor);
    for date in ["2025-05-31", "2025-06-01", "2025-06-15", "2025-06-30", "2025-07-01"] {
        assert!(core
            .create_treatment(&doctor_caller, &create_input(&patient.id, date))
            .success);
    }

    let request = ListRequest {
        filter: TreatmentFilter {
            date_from: chrono::NaiveDate::from_ymd_opt(2025, 6, 1),
            date_to: chrono::NaiveDate::from_ymd_opt(2025, 6, 30),
            ..Default::default()
        },
        ..Default::default()
    };
    let items = core.list_treatments(&doctor_caller, &request).data.unwrap();
    let dates: Vec<String> = items
        .iter()
        .map(|d| d.record.treatment_date.to_string())
        .collect();
    assert_eq!(dates, vec!["2025-06-30", "2025-06-15", "2025-06-01"]);
}

#[test]
fn test_statistics_partition_and_mine_only() {
    let (core, doctor, patient, _) = seed();
    let other_doctor = Person::new("Dr. Sam".into(), vec![Role::Doctor]);
    assert!(core.add_person(&other_doctor).success);

    let doctor_caller = caller_for(&doctor);
    let other_caller = caller_for(&other_doctor);

    for (caller, status) in [
        (&doctor_caller, None),
        (&doctor_caller, Some("completed")),
        (&doctor_caller, Some("cancelled")),
        (&other_caller, Some("completed")),
    ] {
        let mut input = create_input(&patient.id, "2025-06-15");
        input.status = status.map(String::from);
        assert!(core.create_treatment(caller, &input).success);
    }

    let stats = core
        .treatment_statistics(&doctor_caller, false)
        .data
        .unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.total, stats.pending + stats.completed + stats.cancelled);

    let own = core.treatment_statistics(&doctor_caller, true).data.unwrap();
    assert_eq!(own.total, 3);
    assert_eq!(own.total, own.pending + own.completed + own.cancelled);
}

#[test]
fn test_patient_directory() {
    let (core, doctor, patient, other_patient) = seed();

    let resp = core.list_patients(&caller_for(&doctor));
    assert!(resp.success);

    let entries = resp.data.unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["John Doe", "Mary Major"]);
    assert!(entries.iter().any(|e| e.id == patient.id));
    assert!(entries.iter().any(|e| e.id == other_patient.id));
    // Doctors are not in the directory
    assert!(!entries.iter().any(|e| e.id == doctor.id));
}

#[test]
fn test_mine_only_narrows_doctor_listing() {
    let (core, doctor, patient, _) = seed();
    let other_doctor = Person::new("Dr. Sam".into(), vec![Role::Doctor]);
    assert!(core.add_person(&other_doctor).success);

    let doctor_caller = caller_for(&doctor);
    let other_caller = caller_for(&other_doctor);
    core.create_treatment(&doctor_caller, &create_input(&patient.id, "2025-06-15"));
    core.create_treatment(&other_caller, &create_input(&patient.id, "2025-06-16"));

    let all = core
        .list_treatments(&doctor_caller, &ListRequest::default())
        .data
        .unwrap();
    assert_eq!(all.len(), 2);

    let mine = core
        .list_treatments(
            &doctor_caller,
            &ListRequest {
                mine_only: true,
                ..Default::default()
            },
        )
        .data
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].record.doctor_id, doctor.id);
}
