//! Registration and appointment booking, and how they feed the queue

mod common;

use clinic_core::types::{CreateAppointmentRequest, PatientFilter};
use clinic_core::{AppointmentService, Error, PatientRegistrationService};

use common::{patient_request, setup, today, tomorrow};

#[tokio::test]
async fn test_registration_puts_patient_first_today() {
    let clinic = setup().await;
    let waiting = clinic.add_patient("Already Waiting").await;
    clinic
        .engine
        .enqueue_append(waiting.id, clinic.doctor.id, None)
        .await
        .unwrap();

    let service = PatientRegistrationService::new(clinic.engine.clone());
    let registered = service
        .register_patient(
            &clinic.reception_caller(),
            patient_request("Walk In", clinic.doctor.id),
        )
        .await
        .unwrap();

    assert_eq!(registered.queue_position, Some(1));
    assert_eq!(registered.patient.full_name, "Walk In");
    assert!(!registered.patient.patient_uid.is_nil());
    assert_eq!(
        clinic.line(clinic.doctor.id, today()).await,
        vec![registered.patient.id, waiting.id]
    );
}

#[tokio::test]
async fn test_registration_is_reception_only() {
    let clinic = setup().await;
    let service = PatientRegistrationService::new(clinic.engine.clone());

    for caller in [clinic.doctor_caller(), clinic.admin_caller()] {
        let err = service
            .register_patient(&caller, patient_request("Nobody", clinic.doctor.id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    let (_, total) = clinic
        .db
        .search_patients(&PatientFilter::default(), today())
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_registration_rejects_duplicates_and_unknown_doctor() {
    let clinic = setup().await;
    let service = PatientRegistrationService::new(clinic.engine.clone());
    let reception = clinic.reception_caller();

    service
        .register_patient(&reception, patient_request("Twice Over", clinic.doctor.id))
        .await
        .unwrap();
    let err = service
        .register_patient(&reception, patient_request("Twice Over", clinic.doctor.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PatientAlreadyExists(_)));

    let err = service
        .register_patient(&reception, patient_request("Lost Soul", 4_242))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DoctorNotFound(4_242)));

    let (_, total) = clinic
        .db
        .search_patients(&PatientFilter::default(), today())
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_registration_rejects_invalid_input() {
    let clinic = setup().await;
    let service = PatientRegistrationService::new(clinic.engine.clone());

    let mut request = patient_request("Bad Phone", clinic.doctor.id);
    request.phone = "not a phone".to_string();

    let err = service
        .register_patient(&clinic.reception_caller(), request)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_registration_survives_queue_failure() {
    let clinic = setup().await;
    sqlx::query("DROP TABLE queue_entries")
        .execute(clinic.db.pool())
        .await
        .unwrap();

    let service = PatientRegistrationService::new(clinic.engine.clone());
    let registered = service
        .register_patient(
            &clinic.reception_caller(),
            patient_request("Unqueued", clinic.doctor.id),
        )
        .await
        .unwrap();

    assert_eq!(registered.queue_position, None);
    assert!(clinic.db.get_patient(registered.patient.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_appointment_appends_to_todays_line() {
    let clinic = setup().await;
    let first = clinic.add_patient("First Booked").await;
    let second = clinic.add_patient("Second Booked").await;
    let service = AppointmentService::new(clinic.engine.clone());
    let reception = clinic.reception_caller();

    let next_week = (today() + chrono::Duration::days(7))
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc();

    let appointment = service
        .create_appointment(
            &reception,
            CreateAppointmentRequest {
                doctor_id: clinic.doctor.id,
                patient_id: first.id,
                date: next_week,
                notes: Some("follow-up".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(appointment.patient_id, first.id);
    assert_eq!(
        clinic.db.get_appointment(appointment.id).await.unwrap().notes.as_deref(),
        Some("follow-up")
    );

    service
        .create_appointment(
            &reception,
            CreateAppointmentRequest {
                doctor_id: clinic.doctor.id,
                patient_id: second.id,
                date: tomorrow().and_hms_opt(12, 30, 0).unwrap().and_utc(),
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(
        clinic.line(clinic.doctor.id, today()).await,
        vec![first.id, second.id]
    );
    assert!(clinic.line(clinic.doctor.id, tomorrow()).await.is_empty());
    assert!(clinic
        .line(clinic.doctor.id, today() + chrono::Duration::days(7))
        .await
        .is_empty());
}

#[tokio::test]
async fn test_appointment_queues_on_the_clock_date() {
    let clinic = setup().await;
    let patient = clinic.add_patient("Late Booker").await;
    let service = AppointmentService::new(clinic.engine.clone());

    clinic.clock.advance(chrono::Duration::days(1));
    service
        .create_appointment(
            &clinic.reception_caller(),
            CreateAppointmentRequest {
                doctor_id: clinic.doctor.id,
                patient_id: patient.id,
                date: today().and_hms_opt(9, 0, 0).unwrap().and_utc(),
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(clinic.line(clinic.doctor.id, tomorrow()).await, vec![patient.id]);
    assert!(clinic.line(clinic.doctor.id, today()).await.is_empty());
}

#[tokio::test]
async fn test_second_appointment_same_day_keeps_one_entry() {
    let clinic = setup().await;
    let patient = clinic.add_patient("Frequent Visitor").await;
    let service = AppointmentService::new(clinic.engine.clone());
    let morning = today().and_hms_opt(11, 0, 0).unwrap().and_utc();

    for offset in [0, 2] {
        service
            .create_appointment(
                &clinic.reception_caller(),
                CreateAppointmentRequest {
                    doctor_id: clinic.doctor.id,
                    patient_id: patient.id,
                    date: morning + chrono::Duration::hours(offset),
                    notes: None,
                },
            )
            .await
            .unwrap();
    }

    assert_eq!(clinic.line(clinic.doctor.id, today()).await, vec![patient.id]);
}

#[tokio::test]
async fn test_appointment_slot_and_reference_checks() {
    let clinic = setup().await;
    let patient = clinic.add_patient("Slot Seeker").await;
    let service = AppointmentService::new(clinic.engine.clone());
    let reception = clinic.reception_caller();
    let at = today().and_hms_opt(10, 0, 0).unwrap().and_utc();

    let request = |patient_id, doctor_id| CreateAppointmentRequest {
        doctor_id,
        patient_id,
        date: at,
        notes: None,
    };

    service
        .create_appointment(&reception, request(patient.id, clinic.doctor.id))
        .await
        .unwrap();

    let err = service
        .create_appointment(&reception, request(patient.id, clinic.doctor.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SlotTaken { .. }));

    let err = service
        .create_appointment(&reception, request(patient.id, clinic.admin.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DoctorNotFound(_)));

    let err = service
        .create_appointment(&reception, request(77_777, clinic.doctor.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PatientNotFound(77_777)));

    let err = service
        .create_appointment(&clinic.doctor_caller(), request(patient.id, clinic.doctor.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

#[tokio::test]
async fn test_appointment_survives_queue_failure() {
    let clinic = setup().await;
    let patient = clinic.add_patient("Booked Anyway").await;
    sqlx::query("DROP TABLE queue_entries")
        .execute(clinic.db.pool())
        .await
        .unwrap();

    let service = AppointmentService::new(clinic.engine.clone());
    let appointment = service
        .create_appointment(
            &clinic.reception_caller(),
            CreateAppointmentRequest {
                doctor_id: clinic.doctor.id,
                patient_id: patient.id,
                date: today().and_hms_opt(15, 0, 0).unwrap().and_utc(),
                notes: None,
            },
        )
        .await
        .unwrap();

    assert!(clinic.db.get_appointment(appointment.id).await.is_ok());
}

#[tokio::test]
async fn test_patient_search_with_queue_numbers() {
    let clinic = setup().await;
    let patients = clinic.add_patients(5).await;
    let ada = clinic.add_patient("Ada Byron").await;

    clinic
        .engine
        .enqueue_append(patients[1].id, clinic.doctor.id, None)
        .await
        .unwrap();
    clinic
        .engine
        .enqueue_append(ada.id, clinic.doctor.id, None)
        .await
        .unwrap();

    let filter = PatientFilter {
        search: Some("patient".to_string()),
        doctor_id: Some(clinic.doctor.id),
        limit: Some(2),
        ..PatientFilter::default()
    };
    let (page, total) = clinic.db.search_patients(&filter, today()).await.unwrap();
    assert_eq!(total, 5);
    // newest first
    assert_eq!(
        page.iter().map(|s| s.patient.id).collect::<Vec<_>>(),
        vec![patients[4].id, patients[3].id]
    );
    assert!(page.iter().all(|s| s.queue_number.is_none()));

    let filter = PatientFilter {
        search: Some("BYRON".to_string()),
        doctor_id: Some(clinic.doctor.id),
        ..PatientFilter::default()
    };
    let (page, total) = clinic.db.search_patients(&filter, today()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(page[0].queue_number, Some(2));

    let filter = PatientFilter {
        search: Some("patient".to_string()),
        doctor_id: Some(clinic.doctor.id),
        skip: Some(3),
        ..PatientFilter::default()
    };
    let (page, _) = clinic.db.search_patients(&filter, today()).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].queue_number, Some(1));
}

#[tokio::test]
async fn test_patient_search_folds_case_in_any_alphabet() {
    let clinic = setup().await;
    let ivanov = clinic.add_patient("Иванов Иван").await;
    let latin = clinic.add_patient("Ivanov Ivan").await;

    let search = |term: &str| PatientFilter {
        search: Some(term.to_string()),
        ..PatientFilter::default()
    };

    for term in ["иванов", "ИВАНОВ", "ива"] {
        let (page, total) = clinic.db.search_patients(&search(term), today()).await.unwrap();
        assert_eq!(total, 1, "search {term:?}");
        assert_eq!(page[0].patient.id, ivanov.id);
        assert_eq!(page[0].patient.full_name, "Иванов Иван");
    }

    let (page, total) = clinic.db.search_patients(&search("IVANOV"), today()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(page[0].patient.id, latin.id);
}
