mod common;

use duebook_core::{
    core::{
        services::{
            BusinessService, ClassService, CustomerService, HistoryService, MonthState,
            NewClass, NewCustomer, NewStudent, StudentService,
        },
        Clock, Distribution,
    },
    ledger::{Balance, BusinessKind, Money, PaymentKind},
    storage::{
        transfer::{export_all, import_from_path},
        BusinessStore,
    },
    sync::{JsonLedgerFeed, LedgerEvent, LedgerFeed, LedgerSync},
};

use common::{clock_at, date, setup_test_env};

#[test]
fn institute_course_flow_survives_reload() {
    let (storage, _config, _base) = setup_test_env();
    let clock = clock_at(2024, 6, 10);

    let mut institute = BusinessService::create(
        BusinessKind::TeacherStudent,
        "Bright Academy",
        Some("Meera".into()),
    )
    .unwrap();
    let mut course = NewClass::new("10", 500, date(2024, 4, 1));
    course.total_course_fee = Some(6500);
    course.course_duration = Some(12);
    let class_id = ClassService::add(&mut institute, course, &Distribution::Even).unwrap();

    let class = institute.class(class_id).unwrap();
    assert_eq!(class.fee_for_month(0), 542);
    assert_eq!(class.fee_for_month(11), 541);
    let scheduled: Money = (0..12).map(|index| class.fee_for_month(index)).sum();
    assert_eq!(scheduled, 6500);

    let mut enrolment = NewStudent::new("Asha", "98765-43210", date(2024, 4, 1));
    enrolment.initial_due = 1500;
    let student_id = StudentService::add(&mut institute, class_id, enrolment).unwrap();

    let paid = StudentService::pay_months(&mut institute, class_id, student_id, 2, &clock).unwrap();
    assert_eq!(paid.current, Balance::new(500, 0));
    assert_eq!(paid.record.as_ref().unwrap().description, "Cleared 2 Months");

    let charged =
        StudentService::add_charge(&mut institute, class_id, student_id, 300, "Books", &clock)
            .unwrap();
    assert_eq!(charged.current, Balance::new(800, 0));

    let edited = StudentService::edit_due(&mut institute, class_id, student_id, 200).unwrap();
    assert_eq!(edited.current, Balance::new(200, 0));
    assert!(edited.record.is_none());

    let overpaid =
        StudentService::record_payment(&mut institute, class_id, student_id, 500, None, &clock)
            .unwrap();
    assert_eq!(overpaid.current, Balance::new(0, 300));
    assert_eq!(overpaid.record.as_ref().unwrap().description, "Manual Payment");

    storage.save_all(std::slice::from_ref(&institute)).unwrap();
    let loaded = storage.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    let class = loaded[0].class(class_id).unwrap();
    let student = StudentService::find(&loaded[0], class_id, student_id).unwrap();
    assert_eq!(student.balance, Balance::new(0, 300));
    assert_eq!(student.payment_history.len(), 3);
    assert_eq!(student.total_paid(), 1500);

    let summary = HistoryService::student_summary(class, student, clock.today());
    assert_eq!(summary.total_paid, 1500);
    assert_eq!(summary.total_course_fee, Some(6500));
    assert!(!summary.fully_paid);
    assert_eq!(summary.months.len(), 12);
    assert_eq!(summary.months[0].state, MonthState::Cleared);
    assert_eq!(summary.months[1].state, MonthState::Cleared);
    assert_eq!(summary.months[11].state, MonthState::Future);
}

#[test]
fn shop_credit_flow_is_mirrored_to_the_ledger_feed() {
    let (storage, _config, base) = setup_test_env();
    let clock = clock_at(2024, 6, 10);
    let mut feed = JsonLedgerFeed::new(base.join("ledger_feed.json"));

    let mut shop = BusinessService::create(BusinessKind::Shop, "Corner Store", None).unwrap();
    let regulars = CustomerService::add_group(&mut shop, "Regulars").unwrap();
    let mut input = NewCustomer::new("Ravi", "98765-00001");
    input.group_id = Some(regulars.clone());
    let customer_id = CustomerService::add(&mut shop, input, &clock).unwrap();

    let due = CustomerService::add_due(&mut shop, customer_id, 450, Some("Rice"), &clock).unwrap();
    let customer = shop.customer(customer_id).unwrap();
    let synced = LedgerSync::publish(
        &mut feed,
        &shop,
        customer,
        &LedgerEvent::from_change(&due),
        clock.now(),
    );
    assert!(synced.is_some());

    let paid = CustomerService::clear_due(&mut shop, customer_id, 200, None, &clock).unwrap();
    assert_eq!(paid.current, Balance::new(250, 0));
    let customer = shop.customer(customer_id).unwrap();
    LedgerSync::publish(
        &mut feed,
        &shop,
        customer,
        &LedgerEvent::from_change(&paid),
        clock.now(),
    );

    let entries = feed.entries_for_phone("9876500001").unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.total_due, 250);
    assert_eq!(entry.unread_count, 2);
    assert_eq!(entry.admin_name, "Admin");
    assert_eq!(entry.timeline.len(), 2);
    assert_eq!(entry.timeline[0].amount, Some(200));
    assert_eq!(entry.timeline[1].amount, Some(450));

    feed.mark_read(&entry.id).unwrap();
    assert_eq!(feed.load(&entry.id).unwrap().unwrap().unread_count, 0);

    let stats = HistoryService::shop_stats(&shop, clock.today());
    assert_eq!(stats.total_due, 250);
    assert_eq!(stats.collected_today, 200);
    assert_eq!(CustomerService::in_group(&shop, &regulars).len(), 1);

    storage.upsert(&shop).unwrap();
    let history = HistoryService::all_transactions(&storage.load_all().unwrap());
    assert_eq!(history.len(), 2);
    assert_eq!(
        history
            .iter()
            .filter(|entry| entry.record.kind == PaymentKind::Payment)
            .count(),
        1
    );
}

#[test]
fn export_then_import_creates_independent_copies() {
    let (storage, _config, base) = setup_test_env();
    let institute =
        BusinessService::create(BusinessKind::TeacherStudent, "Bright Academy", None).unwrap();
    let shop = BusinessService::create(BusinessKind::Shop, "Corner Store", None).unwrap();
    let originals = vec![institute, shop];
    storage.save_all(&originals).unwrap();

    let path = base.join("exports").join("everything.json");
    export_all(&originals, &path).unwrap();
    let imported = import_from_path(&path).unwrap();
    assert_eq!(imported.len(), 2);
    for (copy, original) in imported.iter().zip(&originals) {
        assert_eq!(copy.name, original.name);
        assert_ne!(copy.id, original.id);
        assert!(copy.is_new);
    }

    assert!(storage.delete(originals[0].id).unwrap());
    assert!(!storage.delete(originals[0].id).unwrap());
    assert_eq!(storage.load_all().unwrap().len(), 1);
}

#[test]
fn saving_twice_leaves_a_backup_that_restores() {
    let (storage, _config, _base) = setup_test_env();
    let shop = BusinessService::create(BusinessKind::Shop, "Corner Store", None).unwrap();
    storage.save_all(std::slice::from_ref(&shop)).unwrap();
    storage.save_all(&[]).unwrap();
    assert!(storage.load_all().unwrap().is_empty());

    let backups = storage.list_backups().unwrap();
    assert!(!backups.is_empty());
    let restored = storage.restore(&backups[0]).unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(storage.load_all().unwrap()[0].name, "Corner Store");
}
